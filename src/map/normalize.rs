use super::model::{AssetGraph, NodeColor, NodeKind, NodeShape, RawEdge, RawNode, VisualEdge, VisualNode};

/// Outline color of every node.
pub const DEFAULT_BORDER: &str = "#111";
/// Color of edges whose relation is not in [`RELATION_COLORS`].
pub const DEFAULT_EDGE_COLOR: &str = "#999";

/// Edge colors by relation name. Lookup is exact and case-sensitive.
pub const RELATION_COLORS: &[(&str, &str)] = &[
	("dmz_exposed", "#ef4444"),
	("app_backend", "#3b82f6"),
	("db_backend", "#10b981"),
	("admin_on", "#f59e0b"),
	("local_admin_on", "#6366f1"),
	("member_of", "#8b5c00"),
	("interactive_logon", "#14b8a6"),
	("data_access", "#f43f5e"),
];

/// Default shape, size and fill per node kind. Unknown kinds are styled as hosts.
pub fn kind_style(kind: &NodeKind) -> (NodeShape, u32, &'static str) {
	match kind {
		NodeKind::User => (NodeShape::Diamond, 16, "#9e9e9e"),
		NodeKind::Group => (NodeShape::Hexagon, 20, "#8b8b8b"),
		NodeKind::Host | NodeKind::Other(_) => (NodeShape::Dot, 18, "#bdbdbd"),
	}
}

/// Dictionary color for `relation`, or [`DEFAULT_EDGE_COLOR`].
pub fn relation_color(relation: &str) -> &'static str {
	RELATION_COLORS
		.iter()
		.find(|(name, _)| *name == relation)
		.map(|(_, color)| *color)
		.unwrap_or(DEFAULT_EDGE_COLOR)
}

/// Name (or id), plus the IP line for hosts and the account line for users.
pub fn node_label(raw: &RawNode) -> String {
	let mut label = raw.name.clone().unwrap_or_else(|| raw.id.clone());
	match (&raw.kind, &raw.ip, &raw.sam_account_name) {
		(NodeKind::Host, Some(ip), _) => {
			label.push('\n');
			label.push_str(ip);
		}
		(NodeKind::User, _, Some(sam)) => {
			label.push_str(&format!("\n({sam})"));
		}
		_ => {}
	}
	label
}

/// Default display state for one node.
pub fn normalize_node(raw: &RawNode) -> VisualNode {
	let (shape, size, background) = kind_style(&raw.kind);
	VisualNode {
		id: raw.id.clone(),
		label: node_label(raw),
		color: NodeColor {
			background,
			border: DEFAULT_BORDER,
		},
		shape,
		size,
		raw: raw.clone(),
	}
}

/// Display state for the edge at `position`.
pub fn normalize_edge(position: usize, raw: &RawEdge) -> VisualEdge {
	let relation = raw.relation.clone().unwrap_or_default();
	VisualEdge {
		id: format!("e-{position}"),
		from: raw.source.clone().unwrap_or_default(),
		to: raw.target.clone().unwrap_or_default(),
		color: relation_color(&relation),
		relation,
	}
}

/// Build the display collections for a snapshot.
pub fn normalize(graph: &AssetGraph) -> (Vec<VisualNode>, Vec<VisualEdge>) {
	let nodes = graph.nodes.iter().map(normalize_node).collect();
	let edges = graph
		.edges
		.iter()
		.enumerate()
		.map(|(i, e)| normalize_edge(i, e))
		.collect();
	(nodes, edges)
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn raw(value: serde_json::Value) -> RawNode {
		RawNode::from_attributes(serde_json::from_value(value).unwrap()).unwrap()
	}

	#[test]
	fn host_label_carries_ip_line() {
		let node = normalize_node(&raw(json!({"id": "h1", "type": "host", "name": "web01", "ip": "10.0.0.5"})));
		assert_eq!(node.label, "web01\n10.0.0.5");
		assert_eq!(node.shape, NodeShape::Dot);
		assert_eq!(node.size, 18);
		assert_eq!(node.color.background, "#bdbdbd");
		assert_eq!(node.color.border, DEFAULT_BORDER);
	}

	#[test]
	fn only_hosts_get_ip_suffix() {
		for kind in ["user", "group", "printer"] {
			let node = normalize_node(&raw(json!({"id": "n", "type": kind, "ip": "10.0.0.7"})));
			assert!(!node.label.contains("10.0.0.7"), "{kind} label leaked ip");
		}
		let bare = normalize_node(&raw(json!({"id": "h2", "type": "host", "ip": ""})));
		assert_eq!(bare.label, "h2");
	}

	#[test]
	fn user_label_carries_account_name() {
		let node = normalize_node(&raw(json!({
			"id": "u1", "type": "user", "name": "Alice", "sam_account_name": "CORP\\alice",
		})));
		assert_eq!(node.label, "Alice\n(CORP\\alice)");
		assert_eq!((node.shape, node.size, node.color.background), (NodeShape::Diamond, 16, "#9e9e9e"));
	}

	#[test]
	fn unknown_kinds_use_host_styling() {
		let group = normalize_node(&raw(json!({"id": "g", "type": "group"})));
		assert_eq!((group.shape, group.size), (NodeShape::Hexagon, 20));
		let other = normalize_node(&raw(json!({"id": "s", "type": "service", "name": ""})));
		assert_eq!((other.shape, other.size, other.color.background), (NodeShape::Dot, 18, "#bdbdbd"));
		assert_eq!(other.label, "s");
	}

	#[test]
	fn edge_colors_follow_dictionary() {
		for (relation, color) in RELATION_COLORS {
			assert_eq!(relation_color(relation), *color);
		}
		for unknown in ["", "Admin_On", "member-of", "allows_rdp"] {
			assert_eq!(relation_color(unknown), DEFAULT_EDGE_COLOR);
		}
	}

	#[test]
	fn edges_get_positional_ids() {
		let graph = AssetGraph {
			nodes: vec![],
			edges: vec![
				RawEdge {
					source: Some("a".into()),
					target: Some("b".into()),
					relation: Some("db_backend".into()),
				},
				RawEdge {
					source: Some("b".into()),
					target: Some("c".into()),
					relation: None,
				},
			],
		};
		let (_, edges) = normalize(&graph);
		assert_eq!(edges[0].id, "e-0");
		assert_eq!((edges[0].from.as_str(), edges[0].to.as_str()), ("a", "b"));
		assert_eq!(edges[0].color, "#10b981");
		assert_eq!(edges[1].id, "e-1");
		assert_eq!(edges[1].color, DEFAULT_EDGE_COLOR);
	}
}
