//! Asset graph enrichment pipeline: normalization, identity indexing, findings
//! correlation and detail rendering.

/// Findings correlation passes.
pub mod correlate;
/// Info panel markup.
pub mod detail;
/// Identity lookups.
pub mod index;
/// Wire and display records.
pub mod model;
/// Default display state.
pub mod normalize;

use std::collections::HashMap;

use log::{debug, info};

use correlate::{Annotation, PERIPHERAL_COLOR, UpdateBatch, mark_label};
use detail::DetailRenderer;
use index::IdentityIndex;
use model::{AssetGraph, Finding, NodeAnnotations, NodeId, PeripheralPayload, VisualEdge, VisualNode};

/// In-memory visual state for one page load.
///
/// Finding data is kept in a separate annotation map keyed by node id; the node
/// records themselves only change through their display fields.
#[derive(Clone, Debug, Default)]
pub struct AssetMap {
	nodes: Vec<VisualNode>,
	edges: Vec<VisualEdge>,
	positions: HashMap<NodeId, usize>,
	annotations: HashMap<NodeId, NodeAnnotations>,
	index: IdentityIndex,
}

impl AssetMap {
	/// Normalize and index a graph snapshot.
	pub fn new(graph: &AssetGraph) -> Self {
		let (nodes, edges) = normalize::normalize(graph);
		let positions = nodes
			.iter()
			.enumerate()
			.map(|(i, n)| (n.id.clone(), i))
			.collect();
		let index = IdentityIndex::build(&nodes);
		let (ips, names) = index.key_counts();
		info!(
			"Asset map built: {} nodes, {} edges, {ips} ip keys, {names} name keys",
			nodes.len(),
			edges.len()
		);
		Self {
			nodes,
			edges,
			positions,
			annotations: HashMap::new(),
			index,
		}
	}

	/// Nodes in snapshot order.
	pub fn nodes(&self) -> &[VisualNode] {
		&self.nodes
	}

	/// Edges in snapshot order.
	pub fn edges(&self) -> &[VisualEdge] {
		&self.edges
	}

	/// Identity lookups over the nodes.
	pub fn index(&self) -> &IdentityIndex {
		&self.index
	}

	/// Node by id.
	pub fn node(&self, id: &str) -> Option<&VisualNode> {
		self.positions.get(id).map(|&i| &self.nodes[i])
	}

	/// Finding data attached to a node so far.
	pub fn annotations(&self, id: &str) -> Option<&NodeAnnotations> {
		self.annotations.get(id)
	}

	/// Ids of nodes marked by a perimeter pass, in node order.
	pub fn peripheral_ids(&self) -> Vec<NodeId> {
		self.nodes
			.iter()
			.filter(|n| self.annotations.get(&n.id).is_some_and(|a| a.peripheral))
			.map(|n| n.id.clone())
			.collect()
	}

	/// Correlate vulnerability findings and apply the result. Returns the number of
	/// node updates applied.
	pub fn apply_vulnerabilities(&mut self, findings: &[Finding]) -> usize {
		let batch = correlate::correlate_vulnerabilities(&self.index, findings);
		self.apply(batch)
	}

	/// Correlate perimeter records and apply the result.
	pub fn apply_peripherals(&mut self, payload: &PeripheralPayload) -> usize {
		let batch = correlate::correlate_peripherals(&self.nodes, payload);
		self.apply(batch)
	}

	/// Apply one correlation batch. Later updates to the same node overwrite
	/// earlier display state, except that a node marked peripheral keeps the
	/// peripheral color whatever vulnerability tier arrives afterwards.
	pub fn apply(&mut self, batch: UpdateBatch) -> usize {
		if batch.is_empty() {
			debug!("Nothing to apply, {} findings unmatched", batch.unmatched);
			return 0;
		}
		let mut applied = 0;
		for update in batch.updates {
			let Some(&pos) = self.positions.get(&update.id) else {
				debug!("Dropping update for unknown node {}", update.id);
				continue;
			};
			let entry = self.annotations.entry(update.id).or_default();
			match update.annotation {
				Annotation::Vulnerability(finding) => entry.vuln = Some(finding),
				Annotation::Peripheral(record) => {
					entry.peripheral = true;
					if record.is_some() {
						entry.peripheral_data = record;
					}
				}
			}
			let node = &mut self.nodes[pos];
			node.color = if entry.peripheral { PERIPHERAL_COLOR } else { update.color };
			if update.append_marker {
				node.label = mark_label(&node.label);
			}
			applied += 1;
		}
		applied
	}

	/// Info panel markup for `id` using the annotations attached so far.
	pub fn detail_html(&self, id: Option<&str>, renderer: &DetailRenderer) -> String {
		let node = id.and_then(|id| self.node(id));
		renderer.render_node(node.map(|n| (&n.raw, self.annotations(&n.id))))
	}
}
