//! Transparent decoration canvas layered over the graph.
//!
//! Peripheral hosts are currently shown by node color alone, so redraws only clear
//! the surface; the sizing is kept exact so decorations can be added later.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;
use std::time::Duration;

use leptos::prelude::set_timeout;
use log::debug;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, Element, HtmlCanvasElement};

/// Stacking level of the overlay: above engine surfaces, below the legend.
pub const OVERLAY_Z_INDEX: &str = "5";
pub const OVERLAY_CLASS: &str = "overlay-canvas";

/// Backing-store and CSS dimensions for a container at a device pixel ratio.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayGeometry {
	pub css_width: f64,
	pub css_height: f64,
	pub pixel_width: u32,
	pub pixel_height: u32,
	pub scale: f64,
}

impl OverlayGeometry {
	pub fn new(css_width: f64, css_height: f64, device_pixel_ratio: f64) -> Self {
		let scale = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
			device_pixel_ratio
		} else {
			1.0
		};
		let (css_width, css_height) = (css_width.max(0.0), css_height.max(0.0));
		Self {
			css_width,
			css_height,
			pixel_width: (css_width * scale) as u32,
			pixel_height: (css_height * scale) as u32,
			scale,
		}
	}
}

/// Owns the overlay canvas and keeps it matched to its container.
#[derive(Clone)]
pub struct OverlayManager {
	container: Element,
	canvas: HtmlCanvasElement,
	decorated: Rc<RefCell<BTreeSet<String>>>,
}

impl OverlayManager {
	pub fn new(container: Element, canvas: HtmlCanvasElement) -> Self {
		let style = canvas.style();
		for (name, value) in [
			("position", "absolute"),
			("top", "0"),
			("left", "0"),
			("pointer-events", "none"),
			("z-index", OVERLAY_Z_INDEX),
		] {
			let _ = style.set_property(name, value);
		}
		Self {
			container,
			canvas,
			decorated: Rc::new(RefCell::new(BTreeSet::new())),
		}
	}

	fn context(&self) -> Option<CanvasRenderingContext2d> {
		self.canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into().ok())
	}

	pub fn geometry(&self) -> OverlayGeometry {
		let rect = self.container.get_bounding_client_rect();
		let dpr = web_sys::window().map(|w| w.device_pixel_ratio()).unwrap_or(1.0);
		OverlayGeometry::new(rect.width(), rect.height(), dpr)
	}

	pub fn resize(&self) {
		let g = self.geometry();
		self.canvas.set_width(g.pixel_width);
		self.canvas.set_height(g.pixel_height);
		let style = self.canvas.style();
		let _ = style.set_property("width", &format!("{}px", g.css_width));
		let _ = style.set_property("height", &format!("{}px", g.css_height));
		if let Some(ctx) = self.context() {
			let _ = ctx.set_transform(g.scale, 0.0, 0.0, g.scale, 0.0, 0.0);
		}
	}

	/// Nodes the overlay would decorate.
	pub fn set_decorated(&self, ids: impl IntoIterator<Item = String>) {
		self.decorated.borrow_mut().extend(ids);
	}

	pub fn redraw(&self) {
		let Some(ctx) = self.context() else {
			return;
		};
		ctx.clear_rect(0.0, 0.0, self.canvas.width() as f64, self.canvas.height() as f64);
		debug!("Overlay redraw, decorated count={}", self.decorated.borrow().len());
	}

	pub fn sync(&self) {
		self.resize();
		self.redraw();
	}

	/// Re-sync now and again after each delay, for layouts that settle late.
	pub fn sync_with_rechecks(&self, delays: impl IntoIterator<Item = Duration>) {
		self.sync();
		for delay in delays {
			let overlay = self.clone();
			set_timeout(move || overlay.sync(), delay);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn backing_store_scales_with_pixel_ratio() {
		let g = OverlayGeometry::new(640.0, 480.5, 2.0);
		assert_eq!((g.pixel_width, g.pixel_height), (1280, 961));
		assert_eq!((g.css_width, g.css_height), (640.0, 480.5));
		assert_eq!(g.scale, 2.0);
	}

	#[test]
	fn invalid_pixel_ratio_falls_back_to_one() {
		for dpr in [0.0, -1.0, f64::NAN, f64::INFINITY] {
			let g = OverlayGeometry::new(100.0, 50.0, dpr);
			assert_eq!((g.pixel_width, g.pixel_height, g.scale), (100, 50, 1.0));
		}
	}

	#[test]
	fn fractional_ratio_truncates() {
		let g = OverlayGeometry::new(333.0, 10.0, 1.5);
		assert_eq!(g.pixel_width, 499);
		assert_eq!(g.pixel_height, 15);
	}
}
