use std::collections::HashMap;
use std::f64::consts::PI;

use force_graph::DefaultNodeIdx;
use web_sys::CanvasRenderingContext2d;

use super::state::{ForceGraphState, node_radius};
use super::types::NodeAppearance;
use crate::map::model::NodeShape;

const BACKGROUND: &str = "#ffffff";
const LABEL_COLOR: &str = "#111";
const LABEL_SIZE: f64 = 12.0;
const DIMMED: f64 = 0.25;

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

pub fn render(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);

	let mut placed: HashMap<DefaultNodeIdx, (f64, f64, f64)> = HashMap::new();
	state.graph.visit_nodes(|node| {
		let radius = node_radius(node.data.user_data.appearance.size);
		placed.insert(node.index(), (node.x() as f64, node.y() as f64, radius));
	});

	draw_edges(state, ctx, &placed);
	draw_nodes(state, ctx);
	ctx.restore();
}

/// Alpha for an element given whether it belongs to the hovered neighbourhood.
fn emphasis(state: &ForceGraphState, highlighted: bool) -> f64 {
	if state.hover.node.is_none() && state.hover.highlight_t == 0.0 {
		return 1.0;
	}
	let t = ease_out_cubic(state.hover.highlight_t);
	if highlighted { 1.0 } else { 1.0 - (1.0 - DIMMED) * t }
}

fn draw_edges(
	state: &ForceGraphState,
	ctx: &CanvasRenderingContext2d,
	placed: &HashMap<DefaultNodeIdx, (f64, f64, f64)>,
) {
	let k = state.transform.k;
	let (line_width, arrow_size) = (2.0 / k.max(0.5), 8.0 / k.max(0.5));

	for edge in &state.edges {
		let (Some(&(x1, y1, r1)), Some(&(x2, y2, r2))) =
			(placed.get(&edge.source), placed.get(&edge.target))
		else {
			continue;
		};
		let (dx, dy) = (x2 - x1, y2 - y1);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < r1 + r2 + 0.001 {
			continue;
		}

		let highlighted = state.is_highlighted(edge.source) && state.is_highlighted(edge.target);
		ctx.set_global_alpha(emphasis(state, highlighted));
		ctx.set_stroke_style_str(edge.color);
		ctx.set_fill_style_str(edge.color);
		ctx.set_line_width(line_width);

		let (ux, uy) = (dx / dist, dy / dist);
		let (tip_x, tip_y) = (x2 - ux * r2, y2 - uy * r2);
		ctx.begin_path();
		ctx.move_to(x1 + ux * r1, y1 + uy * r1);
		ctx.line_to(tip_x - ux * arrow_size, tip_y - uy * arrow_size);
		ctx.stroke();

		let (back_x, back_y) = (tip_x - ux * arrow_size, tip_y - uy * arrow_size);
		let (px, py) = (-uy * arrow_size * 0.5, ux * arrow_size * 0.5);
		ctx.begin_path();
		ctx.move_to(tip_x, tip_y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();
	}
	ctx.set_global_alpha(1.0);
}

fn trace_shape(ctx: &CanvasRenderingContext2d, shape: NodeShape, x: f64, y: f64, r: f64) {
	ctx.begin_path();
	match shape {
		NodeShape::Dot => {
			let _ = ctx.arc(x, y, r, 0.0, 2.0 * PI);
		}
		NodeShape::Diamond => {
			ctx.move_to(x, y - r);
			ctx.line_to(x + r, y);
			ctx.line_to(x, y + r);
			ctx.line_to(x - r, y);
			ctx.close_path();
		}
		NodeShape::Hexagon => {
			for i in 0..6 {
				let a = PI / 3.0 * i as f64;
				let (px, py) = (x + r * a.cos(), y + r * a.sin());
				if i == 0 {
					ctx.move_to(px, py);
				} else {
					ctx.line_to(px, py);
				}
			}
			ctx.close_path();
		}
	}
}

fn draw_node(ctx: &CanvasRenderingContext2d, a: &NodeAppearance, x: f64, y: f64, r: f64, k: f64) {
	trace_shape(ctx, a.shape, x, y, r);
	ctx.set_fill_style_str(a.color.background);
	ctx.fill();
	ctx.set_stroke_style_str(a.color.border);
	ctx.set_line_width(1.0 / k.max(0.5));
	ctx.stroke();

	let font = LABEL_SIZE / k.max(0.5);
	ctx.set_fill_style_str(LABEL_COLOR);
	ctx.set_font(&format!("{font}px sans-serif"));
	ctx.set_text_align("center");
	for (line, text) in a.label.lines().enumerate() {
		let _ = ctx.fill_text(text, x, y + r + font * (line as f64 + 1.0));
	}
}

fn draw_nodes(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	// Dimmed nodes first so the highlighted neighbourhood is drawn on top.
	for pass_highlighted in [false, true] {
		state.graph.visit_nodes(|node| {
			let highlighted = state.is_highlighted(node.index());
			if highlighted != pass_highlighted {
				return;
			}
			let a = &node.data.user_data.appearance;
			let hovered = state.hover.node == Some(node.index());
			let grow = if hovered { 1.0 + 0.25 * ease_out_cubic(state.hover.highlight_t) } else { 1.0 };
			ctx.set_global_alpha(emphasis(state, highlighted));
			draw_node(ctx, a, node.x() as f64, node.y() as f64, node_radius(a.size) * grow, k);
		});
	}
	ctx.set_global_alpha(1.0);
}
