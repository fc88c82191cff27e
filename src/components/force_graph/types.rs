use crate::map::AssetMap;
use crate::map::model::{NodeColor, NodeShape};

/// Everything the canvas needs to draw one node.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeAppearance {
	pub label: String,
	pub color: NodeColor,
	pub shape: NodeShape,
	pub size: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
	pub id: String,
	pub appearance: NodeAppearance,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphLink {
	pub source: String,
	pub target: String,
	pub color: &'static str,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphData {
	pub nodes: Vec<GraphNode>,
	pub links: Vec<GraphLink>,
}

/// Engine notifications the page can react to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraphEvent {
	Resize,
	Zoom,
	DragEnd,
	Stabilized,
}

impl GraphData {
	pub fn from_map(map: &AssetMap) -> Self {
		Self {
			nodes: map
				.nodes()
				.iter()
				.map(|n| GraphNode {
					id: n.id.clone(),
					appearance: appearance_of(n),
				})
				.collect(),
			links: map
				.edges()
				.iter()
				.map(|e| GraphLink {
					source: e.from.clone(),
					target: e.to.clone(),
					color: e.color,
				})
				.collect(),
		}
	}
}

fn appearance_of(node: &crate::map::model::VisualNode) -> NodeAppearance {
	NodeAppearance {
		label: node.label.clone(),
		color: node.color,
		shape: node.shape,
		size: node.size,
	}
}

/// Current display fields of every node, keyed by id.
pub fn appearances(map: &AssetMap) -> Vec<(String, NodeAppearance)> {
	map.nodes()
		.iter()
		.map(|n| (n.id.clone(), appearance_of(n)))
		.collect()
}
