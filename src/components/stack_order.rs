//! Keeps the legend above whatever surfaces the graph engine inserts.

use std::rc::Rc;

use js_sys::Array;
use log::warn;
use wasm_bindgen::prelude::*;
use web_sys::{
	CssStyleDeclaration, Element, HtmlElement, MutationObserver, MutationObserverInit, MutationRecord,
};

use crate::error::MapError;
use crate::watch::{ChangeSource, PollBudget, observe_or_poll};

use super::overlay::OVERLAY_CLASS;

pub const LEGEND_Z_INDEX: &str = "9999";
pub const SURFACE_Z_INDEX: &str = "1";

/// Engine drawing surfaces inside the graph container. The overlay keeps its own level.
const SURFACE_SELECTOR: &str = "canvas, svg";

/// Child-list mutations anywhere under an element.
pub struct SubtreeMutations {
	target: Element,
}

impl ChangeSource for SubtreeMutations {
	fn watch(&self, on_change: Rc<dyn Fn()>) -> Result<(), MapError> {
		let callback = Closure::<dyn FnMut(Array, MutationObserver)>::new(
			move |records: Array, _: MutationObserver| {
				let added = records.iter().any(|r| {
					r.dyn_into::<MutationRecord>()
						.is_ok_and(|r| r.added_nodes().length() > 0)
				});
				if added {
					on_change();
				}
			},
		);
		let observer = MutationObserver::new(callback.as_ref().unchecked_ref())
			.map_err(|e| MapError::Dom(format!("MutationObserver: {}", MapError::js_message(&e))))?;
		let init = MutationObserverInit::new();
		init.set_child_list(true);
		init.set_subtree(true);
		observer
			.observe_with_options(&self.target, &init)
			.map_err(|e| MapError::Dom(format!("observe: {}", MapError::js_message(&e))))?;
		// Lives as long as the page; the observer is kept alive by its target.
		callback.forget();
		Ok(())
	}
}

/// Inline style of any element, HTML or SVG.
fn inline_style(el: &Element) -> Option<CssStyleDeclaration> {
	js_sys::Reflect::get(el, &JsValue::from_str("style"))
		.ok()?
		.dyn_into()
		.ok()
}

fn set_if_unset(style: &CssStyleDeclaration, name: &str, value: &str) {
	if style.get_property_value(name).map(|v| v.is_empty()).unwrap_or(true) {
		let _ = style.set_property(name, value);
	}
}

/// Push every engine surface under `container` below the legend.
pub fn lower_surfaces(container: &Element) {
	let surfaces = match container.query_selector_all(SURFACE_SELECTOR) {
		Ok(list) => list,
		Err(e) => {
			warn!("Failed to lower canvases: {}", MapError::js_message(&e));
			return;
		}
	};
	for i in 0..surfaces.length() {
		let Some(el) = surfaces.item(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
			continue;
		};
		if el.class_list().contains(OVERLAY_CLASS) {
			continue;
		}
		let Some(style) = inline_style(&el) else {
			continue;
		};
		let _ = style.set_property("z-index", SURFACE_Z_INDEX);
		set_if_unset(&style, "position", "relative");
	}
}

/// Style the legend once, then re-lower engine surfaces on every structural
/// change of `container` (or by bounded polling when observation is unavailable).
pub fn guard_stack_order(container: Element, legend: HtmlElement, budget: PollBudget) {
	let style = legend.style();
	let _ = style.set_property("z-index", LEGEND_Z_INDEX);
	let _ = style.set_property("pointer-events", "auto");
	set_if_unset(&style, "position", "absolute");

	let target = container.clone();
	observe_or_poll(
		&SubtreeMutations { target },
		Rc::new(move || lower_surfaces(&container)),
		budget,
	);
}
