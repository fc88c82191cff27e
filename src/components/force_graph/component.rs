use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::debug;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent};

use super::render;
use super::state::{CLICK_TOLERANCE, ForceGraphState};
use super::types::{GraphData, GraphEvent, NodeAppearance};

type Shared<T> = Rc<RefCell<Option<T>>>;

fn parent_size(canvas: &HtmlCanvasElement) -> (f64, f64) {
	canvas
		.parent_element()
		.map(|p| (p.client_width() as f64, p.client_height() as f64))
		.filter(|(w, h)| *w > 0.0 && *h > 0.0)
		.unwrap_or((800.0, 600.0))
}

fn pointer(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Force-directed canvas for the asset graph.
///
/// `data` fixes the topology; `appearance` carries display updates that are applied
/// in place without restarting the layout.
#[component]
pub fn ForceGraphCanvas(
	#[prop(into)] data: Signal<GraphData>,
	#[prop(into)] appearance: Signal<Vec<(String, NodeAppearance)>>,
	on_select: impl Fn(String) + 'static,
	on_event: impl Fn(GraphEvent) + 'static,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: Shared<ForceGraphState> = Rc::new(RefCell::new(None));
	let animate: Shared<Closure<dyn FnMut()>> = Rc::new(RefCell::new(None));
	let resize_cb: Shared<Closure<dyn FnMut()>> = Rc::new(RefCell::new(None));
	let on_select: Rc<dyn Fn(String)> = Rc::new(on_select);
	let on_event: Rc<dyn Fn(GraphEvent)> = Rc::new(on_event);
	let (state_init, animate_init, resize_cb_init, event_init) =
		(state.clone(), animate.clone(), resize_cb.clone(), on_event.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};
		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			return;
		};

		let (w, h) = parent_size(&canvas);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let graph = data.get();
		debug!("Laying out {} nodes, {} links", graph.nodes.len(), graph.links.len());
		let mut fresh = ForceGraphState::new(&graph, w, h);
		fresh.apply_appearances(&appearance.get_untracked());
		*state_init.borrow_mut() = Some(fresh);

		if resize_cb_init.borrow().is_none() {
			let (state_resize, canvas_resize, event_resize) =
				(state_init.clone(), canvas.clone(), event_init.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let (nw, nh) = parent_size(&canvas_resize);
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut s) = *state_resize.borrow_mut() {
					s.resize(nw, nh);
				}
				event_resize(GraphEvent::Resize);
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		if animate_init.borrow().is_none() {
			let (state_anim, animate_inner, event_anim) =
				(state_init.clone(), animate_init.clone(), event_init.clone());
			*animate_init.borrow_mut() = Some(Closure::new(move || {
				let event = match *state_anim.borrow_mut() {
					Some(ref mut s) => {
						let event = s.tick(0.016);
						render::render(s, &ctx);
						event
					}
					None => None,
				};
				if let Some(event) = event {
					event_anim(event);
				}
				if let (Some(cb), Some(win)) = (&*animate_inner.borrow(), web_sys::window()) {
					let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
				}
			}));
			if let Some(ref cb) = *animate_init.borrow() {
				let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}
	});

	let state_style = state.clone();
	Effect::new(move |_| {
		let updates = appearance.get();
		if let Some(ref mut s) = *state_style.borrow_mut() {
			s.apply_appearances(&updates);
		}
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_md.borrow_mut() {
			if let Some(idx) = s.node_at_position(x, y) {
				s.drag.active = true;
				s.drag.moved = false;
				s.drag.node_idx = Some(idx);
				s.drag.start_x = x;
				s.drag.start_y = y;
				s.graph.visit_nodes(|node| {
					if node.index() == idx {
						s.drag.node_start_x = node.x();
						s.drag.node_start_y = node.y();
					}
				});
			} else {
				s.pan.active = true;
				s.pan.start_x = x;
				s.pan.start_y = y;
				s.pan.transform_start_x = s.transform.x;
				s.pan.transform_start_y = s.transform.y;
			}
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			if !s.drag.active {
				let hovered = s.node_at_position(x, y);
				s.set_hover(hovered);
			}

			if s.drag.active {
				let (sdx, sdy) = (x - s.drag.start_x, y - s.drag.start_y);
				if (sdx * sdx + sdy * sdy).sqrt() > CLICK_TOLERANCE {
					s.drag.moved = true;
				}
				if let (Some(idx), true) = (s.drag.node_idx, s.drag.moved) {
					let (nx, ny) = (
						s.drag.node_start_x + (sdx / s.transform.k) as f32,
						s.drag.node_start_y + (sdy / s.transform.k) as f32,
					);
					s.graph.visit_nodes_mut(|node| {
						if node.index() == idx {
							node.data.x = nx;
							node.data.y = ny;
							node.data.is_anchor = true;
						}
					});
				}
			} else if s.pan.active {
				s.transform.x = s.pan.transform_start_x + (x - s.pan.start_x);
				s.transform.y = s.pan.transform_start_y + (y - s.pan.start_y);
			}
		}
	};

	let (state_mu, select_mu, event_mu) = (state.clone(), on_select.clone(), on_event.clone());
	let on_mouseup = move |_: MouseEvent| {
		let mut selected = None;
		let mut dragged = false;
		if let Some(ref mut s) = *state_mu.borrow_mut() {
			if let (true, Some(idx)) = (s.drag.active, s.drag.node_idx) {
				if s.drag.moved {
					dragged = true;
				} else {
					selected = s.node_id(idx);
				}
			}
			s.drag.active = false;
			s.drag.moved = false;
			s.drag.node_idx = None;
			s.pan.active = false;
		}
		if dragged {
			event_mu(GraphEvent::DragEnd);
		}
		if let Some(id) = selected {
			select_mu(id);
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.drag.active = false;
			s.drag.node_idx = None;
			s.pan.active = false;
			s.set_hover(None);
		}
	};

	let (state_wh, event_wh) = (state.clone(), on_event.clone());
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			let new_k = (s.transform.k * factor).clamp(0.1, 10.0);
			let ratio = new_k / s.transform.k;
			s.transform.x = x - (x - s.transform.x) * ratio;
			s.transform.y = y - (y - s.transform.y) * ratio;
			s.transform.k = new_k;
		}
		event_wh(GraphEvent::Zoom);
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="force-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}
