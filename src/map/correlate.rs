//! Matching of external findings to graph nodes.
//!
//! Each pass turns a finding list into an [`UpdateBatch`] without touching the map;
//! the batch is applied in one step by [`AssetMap::apply`](super::AssetMap::apply).
//! Passes can arrive in any order and any number of times. A node marked peripheral
//! stays purple once marked, and the peripheral label marker is only ever added once.

use std::collections::HashSet;

use log::debug;

use super::index::{IdentityIndex, normalize_ip};
use super::model::{Finding, NodeColor, NodeId, PeripheralPayload, PeripheralRecord, VisualNode};
use super::normalize::DEFAULT_BORDER;

/// Colors of a node marked peripheral.
pub const PERIPHERAL_COLOR: NodeColor = NodeColor {
	background: "#8b5cf6",
	border: "#4c1d95",
};

/// Suffix appended to the label of a peripheral node.
pub const PERIPHERAL_MARKER: &str = " !";

/// Coarse risk classification, highest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskTier {
	/// "critical" or "compromised".
	Critical,
	/// "high".
	High,
	/// "medium", "at risk" or "warning".
	Medium,
	/// Any other finding.
	Default,
}

impl RiskTier {
	/// Every tier, highest first.
	pub const ALL: [RiskTier; 4] = [Self::Critical, Self::High, Self::Medium, Self::Default];

	/// Classify a free-form risk/status string. The first tier whose keyword
	/// appears (case-insensitively) wins.
	pub fn classify(risk: &str) -> Self {
		let risk = risk.to_lowercase();
		let has = |keywords: &[&str]| keywords.iter().any(|k| risk.contains(k));
		if has(&["critical", "compromised"]) {
			Self::Critical
		} else if has(&["high"]) {
			Self::High
		} else if has(&["medium", "at risk", "warning"]) {
			Self::Medium
		} else {
			Self::Default
		}
	}

	/// Fill color of the tier.
	pub fn background(self) -> &'static str {
		match self {
			Self::Critical => "#ef4444",
			Self::High => "#f59e0b",
			Self::Medium => "#fbbf24",
			Self::Default => "#f97316",
		}
	}

	/// Node colors for the tier.
	pub fn color(self) -> NodeColor {
		NodeColor {
			background: self.background(),
			border: DEFAULT_BORDER,
		}
	}

	/// Legend text.
	pub fn label(self) -> &'static str {
		match self {
			Self::Critical => "Critical / compromised",
			Self::High => "High",
			Self::Medium => "Medium / at risk",
			Self::Default => "Other finding",
		}
	}
}

/// Finding data to attach to a node.
#[derive(Clone, Debug, PartialEq)]
pub enum Annotation {
	/// Replaces the node's vulnerability finding.
	Vulnerability(Finding),
	/// Marks the node peripheral. A record, when present, replaces earlier data.
	Peripheral(Option<PeripheralRecord>),
}

/// Display and annotation change for one node.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeUpdate {
	/// Target node.
	pub id: NodeId,
	/// New colors.
	pub color: NodeColor,
	/// Append the peripheral marker to the label.
	pub append_marker: bool,
	/// Data to attach.
	pub annotation: Annotation,
}

/// All node changes produced by one correlation pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateBatch {
	/// Changes, in match order.
	pub updates: Vec<NodeUpdate>,
	/// Inputs that matched no node.
	pub unmatched: usize,
}

impl UpdateBatch {
	/// True when no node matched.
	pub fn is_empty(&self) -> bool {
		self.updates.is_empty()
	}

	/// Ids of the updated nodes, in update order.
	pub fn matched_ids(&self) -> Vec<&str> {
		self.updates.iter().map(|u| u.id.as_str()).collect()
	}
}

/// Resolve each finding by IP, then hostname, and color its node by risk tier.
/// Findings that resolve to no node are counted and otherwise ignored.
pub fn correlate_vulnerabilities(index: &IdentityIndex, findings: &[Finding]) -> UpdateBatch {
	let mut batch = UpdateBatch::default();
	for finding in findings {
		let Some(id) = index.resolve(finding.ip.as_deref(), finding.hostname.as_deref()) else {
			batch.unmatched += 1;
			continue;
		};
		let tier = RiskTier::classify(finding.risk().unwrap_or_default());
		batch.updates.push(NodeUpdate {
			id: id.clone(),
			color: tier.color(),
			append_marker: false,
			annotation: Annotation::Vulnerability(finding.clone()),
		});
	}
	debug!(
		"Vulnerability pass: {} matched, {} unmatched",
		batch.updates.len(),
		batch.unmatched
	);
	batch
}

/// Trimmed IPs from `primary_compromised` and `affected_hosts`, first occurrence order.
pub fn peripheral_ips(payload: &PeripheralPayload) -> Vec<String> {
	let explicit = payload.primary_compromised.iter().map(String::as_str);
	let recorded = payload.affected_hosts.iter().filter_map(|h| h.ip.as_deref());
	let mut seen = HashSet::new();
	explicit
		.chain(recorded)
		.map(normalize_ip)
		.filter(|ip| !ip.is_empty() && seen.insert(ip.to_string()))
		.map(str::to_string)
		.collect()
}

/// Mark every node whose IP is in the peripheral set and recolor it purple.
/// Nodes sharing an IP are all marked.
pub fn correlate_peripherals(nodes: &[VisualNode], payload: &PeripheralPayload) -> UpdateBatch {
	let ips = peripheral_ips(payload);
	debug!("Perimeter peripheral ips={ips:?}");
	let mut batch = UpdateBatch::default();
	let mut hit: HashSet<&str> = HashSet::new();
	for node in nodes {
		let Some(ip) = node.raw.ip.as_deref().map(normalize_ip) else {
			continue;
		};
		let Some(ip) = ips.iter().find(|p| p.as_str() == ip) else {
			continue;
		};
		hit.insert(ip.as_str());
		let record = payload
			.affected_hosts
			.iter()
			.find(|h| h.ip.as_deref().map(normalize_ip) == Some(ip.as_str()))
			.cloned();
		batch.updates.push(NodeUpdate {
			id: node.id.clone(),
			color: PERIPHERAL_COLOR,
			append_marker: true,
			annotation: Annotation::Peripheral(record),
		});
	}
	batch.unmatched = ips.len() - hit.len();
	debug!("Matched peripheral node ids={:?}", batch.matched_ids());
	batch
}

/// Append the peripheral marker unless the label already ends with it.
pub fn mark_label(label: &str) -> String {
	if label.ends_with(PERIPHERAL_MARKER) {
		label.to_string()
	} else {
		format!("{label}{PERIPHERAL_MARKER}")
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::map::model::RawNode;
	use crate::map::normalize::normalize_node;

	fn nodes() -> Vec<VisualNode> {
		[
			json!({"id": "h1", "type": "host", "name": "web01", "ip": "10.0.0.5"}),
			json!({"id": "h2", "type": "host", "name": "DB01", "ip": "10.0.0.6"}),
		]
		.into_iter()
		.map(|v| normalize_node(&RawNode::from_attributes(serde_json::from_value(v).unwrap()).unwrap()))
		.collect()
	}

	fn index() -> IdentityIndex {
		IdentityIndex::build(&nodes())
	}

	fn finding(value: serde_json::Value) -> Finding {
		serde_json::from_value(value).unwrap()
	}

	#[test]
	fn risk_tiers_follow_priority() {
		assert_eq!(RiskTier::classify("Compromised host"), RiskTier::Critical);
		assert_eq!(RiskTier::classify("HIGH"), RiskTier::High);
		assert_eq!(RiskTier::classify("medium risk, at risk"), RiskTier::Medium);
		assert_eq!(RiskTier::classify("unspecified"), RiskTier::Default);
		assert_eq!(RiskTier::classify("high, then medium"), RiskTier::High);
		assert_eq!(RiskTier::classify("warning: critical"), RiskTier::Critical);
		assert_eq!(RiskTier::classify(""), RiskTier::Default);
		assert_eq!(RiskTier::Critical.background(), "#ef4444");
		assert_eq!(RiskTier::High.background(), "#f59e0b");
		assert_eq!(RiskTier::Medium.background(), "#fbbf24");
		assert_eq!(RiskTier::Default.background(), "#f97316");
	}

	#[test]
	fn vulnerability_resolves_by_ip_then_hostname() {
		let batch = correlate_vulnerabilities(
			&index(),
			&[
				finding(json!({"ip": " 10.0.0.5", "risk_level": "Critical"})),
				finding(json!({"ip": "192.168.1.1", "hostname": "db01", "status": "at risk"})),
				finding(json!({"hostname": "printer", "risk_level": "high"})),
				finding(json!({"reason": "no identity"})),
			],
		);
		assert_eq!(batch.matched_ids(), ["h1", "h2"]);
		assert_eq!(batch.unmatched, 2);
		assert_eq!(batch.updates[0].color, RiskTier::Critical.color());
		assert_eq!(batch.updates[1].color.background, "#fbbf24");
		assert!(batch.updates.iter().all(|u| !u.append_marker));
	}

	#[test]
	fn risk_level_takes_precedence_over_status() {
		let batch = correlate_vulnerabilities(
			&index(),
			&[finding(json!({"ip": "10.0.0.5", "risk_level": "medium", "status": "compromised"}))],
		);
		assert_eq!(batch.updates[0].color.background, RiskTier::Medium.background());
	}

	#[test]
	fn peripheral_set_merges_both_lists() {
		let payload: PeripheralPayload = serde_json::from_value(json!({
			"primary_compromised": ["10.0.0.5", " 10.0.0.6"],
			"affected_hosts": [{"ip": "10.0.0.6 ", "reason": "shares admin"}, {"ip": "10.0.0.99"}, {"reason": "no ip"}],
		}))
		.unwrap();
		assert_eq!(peripheral_ips(&payload), ["10.0.0.5", "10.0.0.6", "10.0.0.99"]);

		let batch = correlate_peripherals(&nodes(), &payload);
		assert_eq!(batch.matched_ids(), ["h1", "h2"]);
		assert_eq!(batch.unmatched, 1);
		assert!(batch.updates.iter().all(|u| u.append_marker && u.color == PERIPHERAL_COLOR));
		assert_eq!(batch.updates[0].annotation, Annotation::Peripheral(None));
		match &batch.updates[1].annotation {
			Annotation::Peripheral(Some(record)) => assert_eq!(record.reason.as_deref(), Some("shares admin")),
			other => panic!("unexpected annotation {other:?}"),
		}
	}

	#[test]
	fn nodes_sharing_an_ip_are_all_marked() {
		let mut shared = nodes();
		shared.push(normalize_node(
			&RawNode::from_attributes(
				serde_json::from_value(json!({"id": "h3", "type": "host", "name": "web-vip", "ip": "10.0.0.5 "}))
					.unwrap(),
			)
			.unwrap(),
		));
		let payload: PeripheralPayload =
			serde_json::from_value(json!({"primary_compromised": ["10.0.0.5"]})).unwrap();
		let batch = correlate_peripherals(&shared, &payload);
		assert_eq!(batch.matched_ids(), ["h1", "h3"]);
		assert_eq!(batch.unmatched, 0);
	}

	#[test]
	fn marker_is_appended_once() {
		let once = mark_label("web01\n10.0.0.5");
		assert_eq!(once, "web01\n10.0.0.5 !");
		assert_eq!(mark_label(&once), once);
	}
}
