use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};

use super::types::{GraphData, GraphEvent, NodeAppearance};

/// World units per unit of node `size`.
pub const NODE_SCALE: f64 = 0.5;
/// Extra pick tolerance around a node, in world units.
pub const HIT_SLOP: f64 = 4.0;
/// Pointer travel (screen px) after which a press counts as a drag.
pub const CLICK_TOLERANCE: f64 = 3.0;

const SETTLE_SPEED: f32 = 0.05;
const MAX_SETTLE_TICKS: u32 = 600;

pub fn node_radius(size: u32) -> f64 {
	size as f64 * NODE_SCALE
}

#[derive(Clone, Debug)]
pub struct NodeInfo {
	pub id: String,
	pub appearance: NodeAppearance,
}

#[derive(Clone, Debug, Default)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub moved: bool,
	pub node_idx: Option<DefaultNodeIdx>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f32,
	pub node_start_y: f32,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<DefaultNodeIdx>,
	pub neighbors: HashSet<DefaultNodeIdx>,
	pub highlight_t: f64,
}

/// Directed edge between two simulation nodes.
#[derive(Clone, Debug)]
pub struct EdgeInfo {
	pub source: DefaultNodeIdx,
	pub target: DefaultNodeIdx,
	pub color: &'static str,
}

pub struct ForceGraphState {
	pub graph: ForceGraph<NodeInfo, ()>,
	pub edges: Vec<EdgeInfo>,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: HoverState,
	pub width: f64,
	pub height: f64,
	id_to_idx: HashMap<String, DefaultNodeIdx>,
	settle_ticks: u32,
	settled: bool,
}

impl ForceGraphState {
	pub fn new(data: &GraphData, width: f64, height: f64) -> Self {
		let mut graph = ForceGraph::new(SimulationParameters {
			force_charge: 600.0,
			force_spring: 0.05,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
		});
		let mut id_to_idx = HashMap::new();
		let mut edges = Vec::new();
		let ring = 40.0 + 6.0 * data.nodes.len() as f64;

		for (i, node) in data.nodes.iter().enumerate() {
			let angle = (i as f64) * 2.0 * PI / data.nodes.len().max(1) as f64;
			let idx = graph.add_node(NodeData {
				x: (ring * angle.cos()) as f32,
				y: (ring * angle.sin()) as f32,
				mass: 10.0,
				is_anchor: false,
				user_data: NodeInfo {
					id: node.id.clone(),
					appearance: node.appearance.clone(),
				},
			});
			id_to_idx.insert(node.id.clone(), idx);
		}

		for link in &data.links {
			if let (Some(&source), Some(&target)) =
				(id_to_idx.get(&link.source), id_to_idx.get(&link.target))
			{
				graph.add_edge(source, target, EdgeData::default());
				edges.push(EdgeInfo {
					source,
					target,
					color: link.color,
				});
			}
		}

		Self {
			graph,
			edges,
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			hover: HoverState::default(),
			width,
			height,
			id_to_idx,
			settle_ticks: 0,
			settled: false,
		}
	}

	/// Overwrite display fields of the listed nodes; positions are untouched.
	pub fn apply_appearances(&mut self, appearances: &[(String, NodeAppearance)]) {
		let by_idx: HashMap<DefaultNodeIdx, &NodeAppearance> = appearances
			.iter()
			.filter_map(|(id, a)| self.id_to_idx.get(id).map(|&idx| (idx, a)))
			.collect();
		if by_idx.is_empty() {
			return;
		}
		self.graph.visit_nodes_mut(|node| {
			if let Some(a) = by_idx.get(&node.index()) {
				node.data.user_data.appearance = (*a).clone();
			}
		});
	}

	pub fn node_id(&self, idx: DefaultNodeIdx) -> Option<String> {
		let mut found = None;
		self.graph.visit_nodes(|node| {
			if node.index() == idx {
				found = Some(node.data.user_data.id.clone());
			}
		});
		found
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<DefaultNodeIdx> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let mut found = None;
		self.graph.visit_nodes(|node| {
			let (dx, dy) = (node.x() as f64 - gx, node.y() as f64 - gy);
			let reach = node_radius(node.data.user_data.appearance.size) + HIT_SLOP;
			if (dx * dx + dy * dy).sqrt() < reach {
				found = Some(node.index());
			}
		});
		found
	}

	pub fn set_hover(&mut self, node: Option<DefaultNodeIdx>) {
		if self.hover.node == node {
			return;
		}
		self.hover.node = node;
		self.hover.neighbors.clear();
		if let Some(idx) = node {
			for edge in &self.edges {
				if edge.source == idx {
					self.hover.neighbors.insert(edge.target);
				} else if edge.target == idx {
					self.hover.neighbors.insert(edge.source);
				}
			}
		}
	}

	pub fn is_highlighted(&self, idx: DefaultNodeIdx) -> bool {
		self.hover.node == Some(idx) || self.hover.neighbors.contains(&idx)
	}

	fn positions(&self) -> Vec<(f32, f32)> {
		let mut out = Vec::new();
		self.graph.visit_nodes(|node| out.push((node.x(), node.y())));
		out
	}

	/// Advance the simulation. Returns [`GraphEvent::Stabilized`] once, on the
	/// first frame where no node moves faster than the settle threshold (or the
	/// tick cap is reached).
	pub fn tick(&mut self, dt: f32) -> Option<GraphEvent> {
		let before = if self.settled { Vec::new() } else { self.positions() };
		self.graph.update(dt);

		let target = if self.hover.node.is_some() { 1.0 } else { 0.0 };
		self.hover.highlight_t += (target - self.hover.highlight_t) * 1.5 * dt as f64;
		if self.hover.node.is_none() && self.hover.highlight_t < 0.01 {
			self.hover.highlight_t = 0.0;
		}

		if self.settled {
			return None;
		}
		self.settle_ticks += 1;
		let fastest = before
			.iter()
			.zip(self.positions())
			.map(|((x0, y0), (x1, y1))| ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt())
			.fold(0.0f32, f32::max);
		if fastest < SETTLE_SPEED || self.settle_ticks >= MAX_SETTLE_TICKS {
			self.settled = true;
			return Some(GraphEvent::Stabilized);
		}
		None
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}
