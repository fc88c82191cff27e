//! Wire records for the asset map endpoints and the display model derived from them.
//!
//! Payloads are decoded leniently: absent lists become empty, numeric ids, IPs and
//! ports are coerced to text, and malformed entries are skipped at this boundary so
//! the rest of the pipeline only sees well-formed records.

use log::warn;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Node identifier, unique within one graph snapshot.
pub type NodeId = String;

/// Text form of a scalar JSON value. Containers and null have none.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
	match value {
		Value::String(s) => Some(s.clone()),
		Value::Number(n) => Some(n.to_string()),
		Value::Bool(b) => Some(b.to_string()),
		_ => None,
	}
}

fn non_empty(text: Option<String>) -> Option<String> {
	text.filter(|s| !s.is_empty())
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
	D: Deserializer<'de>,
{
	let value = Option::<Value>::deserialize(deserializer)?;
	Ok(value.as_ref().and_then(scalar_text))
}

fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
	D: Deserializer<'de>,
{
	Ok(match Option::<Value>::deserialize(deserializer)? {
		Some(Value::Array(items)) => items.iter().filter_map(scalar_text).collect(),
		Some(other) => scalar_text(&other).into_iter().collect(),
		None => Vec::new(),
	})
}

fn lenient_records<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
	D: Deserializer<'de>,
	T: serde::de::DeserializeOwned,
{
	let items = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
	Ok(items
		.into_iter()
		.filter_map(|item| match serde_json::from_value(item) {
			Ok(record) => Some(record),
			Err(e) => {
				warn!("Skipping malformed record: {e}");
				None
			}
		})
		.collect())
}

/// Node category, driving default styling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
	/// Machine with an optional IP.
	Host,
	/// Account, optionally with a SAM account name.
	User,
	/// Security group.
	Group,
	/// Any other `type` value, kept verbatim.
	Other(String),
}

impl NodeKind {
	/// Map a `type` field to a kind. Matching is exact.
	pub fn parse(value: &str) -> Self {
		match value {
			"host" => Self::Host,
			"user" => Self::User,
			"group" => Self::Group,
			other => Self::Other(other.to_string()),
		}
	}
}

/// A graph node as delivered by the backend. `attributes` keeps every field,
/// including the ones lifted into typed fields, in document order.
#[derive(Clone, Debug, PartialEq)]
pub struct RawNode {
	/// Node id.
	pub id: NodeId,
	/// Parsed `type` field.
	pub kind: NodeKind,
	/// Display name.
	pub name: Option<String>,
	/// IP address as delivered.
	pub ip: Option<String>,
	/// SAM account name of a user.
	pub sam_account_name: Option<String>,
	/// All fields of the node object.
	pub attributes: Map<String, Value>,
}

impl RawNode {
	/// Lift the typed fields out of a node object. Nodes without an id are rejected.
	pub fn from_attributes(attributes: Map<String, Value>) -> Option<Self> {
		let text = |key: &str| non_empty(attributes.get(key).and_then(scalar_text));
		let id = text("id")?;
		let kind = NodeKind::parse(&text("type").unwrap_or_default());
		Some(Self {
			id,
			kind,
			name: text("name"),
			ip: text("ip"),
			sam_account_name: text("sam_account_name"),
			attributes,
		})
	}
}

/// A directed relation between two nodes.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RawEdge {
	/// Origin node id.
	#[serde(deserialize_with = "lenient_string")]
	pub source: Option<NodeId>,
	/// Destination node id.
	#[serde(deserialize_with = "lenient_string")]
	pub target: Option<NodeId>,
	/// Relation name used for the edge color.
	#[serde(default, deserialize_with = "lenient_string")]
	pub relation: Option<String>,
}

/// Body of the graph endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct GraphPayload {
	/// Node objects; non-objects are skipped.
	#[serde(default)]
	pub nodes: Option<Vec<Value>>,
	/// Edge objects; entries without endpoints are skipped.
	#[serde(default)]
	pub edges: Option<Vec<Value>>,
}

/// Validated graph snapshot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssetGraph {
	/// Nodes with an id.
	pub nodes: Vec<RawNode>,
	/// Edges with both endpoints.
	pub edges: Vec<RawEdge>,
}

impl From<GraphPayload> for AssetGraph {
	fn from(payload: GraphPayload) -> Self {
		let nodes = payload
			.nodes
			.unwrap_or_default()
			.into_iter()
			.filter_map(|value| match value {
				Value::Object(map) => RawNode::from_attributes(map),
				_ => None,
			})
			.collect();
		let edges = payload
			.edges
			.unwrap_or_default()
			.into_iter()
			.filter_map(|value| serde_json::from_value::<RawEdge>(value).ok())
			.filter(|e| e.source.is_some() && e.target.is_some())
			.collect();
		Self { nodes, edges }
	}
}

/// Incident header fields shared by the findings payloads.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct IncidentSummary {
	/// Incident identifier.
	#[serde(default, deserialize_with = "lenient_string")]
	pub incident_id: Option<String>,
	/// Free-text incident summary.
	#[serde(default, deserialize_with = "lenient_string")]
	pub summary: Option<String>,
	/// Incident severity.
	#[serde(default, deserialize_with = "lenient_string")]
	pub severity: Option<String>,
	/// Detection timestamp, as delivered.
	#[serde(default, deserialize_with = "lenient_string")]
	pub detected_at: Option<String>,
}

impl IncidentSummary {
	/// True when no field is set.
	pub fn is_empty(&self) -> bool {
		self.incident_id.is_none()
			&& self.summary.is_none()
			&& self.severity.is_none()
			&& self.detected_at.is_none()
	}

	/// Fill fields still missing here from `other`.
	pub fn merge(&mut self, other: &IncidentSummary) {
		for (mine, theirs) in [
			(&mut self.incident_id, &other.incident_id),
			(&mut self.summary, &other.summary),
			(&mut self.severity, &other.severity),
			(&mut self.detected_at, &other.detected_at),
		] {
			if mine.is_none() {
				mine.clone_from(theirs);
			}
		}
	}
}

/// A vulnerability result for one host.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Finding {
	/// IP of the target host.
	#[serde(default, deserialize_with = "lenient_string")]
	pub ip: Option<String>,
	/// Host name, matched case-insensitively.
	#[serde(default, deserialize_with = "lenient_string")]
	pub hostname: Option<String>,
	/// Status text, used when `risk_level` is empty.
	#[serde(default, deserialize_with = "lenient_string")]
	pub status: Option<String>,
	/// Risk text.
	#[serde(default, deserialize_with = "lenient_string")]
	pub risk_level: Option<String>,
	/// Why the host was flagged.
	#[serde(default, deserialize_with = "lenient_string")]
	pub reason: Option<String>,
	/// Fallback for `reason`.
	#[serde(default, deserialize_with = "lenient_string")]
	pub summary: Option<String>,
	/// Classification tags.
	#[serde(default, deserialize_with = "lenient_list")]
	pub tags: Vec<String>,
	/// Supporting evidence: text, a list or an object.
	#[serde(default)]
	pub evidence: Option<Value>,
}

impl Finding {
	/// First non-empty of `risk_level` and `status`.
	pub fn risk(&self) -> Option<&str> {
		first_non_empty(&[&self.risk_level, &self.status])
	}
}

/// A perimeter exposure record for one host.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct PeripheralRecord {
	/// IP of the exposed host.
	#[serde(default, deserialize_with = "lenient_string")]
	pub ip: Option<String>,
	/// Risk text.
	#[serde(default, deserialize_with = "lenient_string")]
	pub risk_level: Option<String>,
	/// Status text, used when `risk_level` is empty.
	#[serde(default, deserialize_with = "lenient_string")]
	pub status: Option<String>,
	/// Why the host is exposed.
	#[serde(default, deserialize_with = "lenient_string")]
	pub reason: Option<String>,
	/// Classification tags.
	#[serde(default, deserialize_with = "lenient_list")]
	pub tags: Vec<String>,
	/// Exposed ports.
	#[serde(default, deserialize_with = "lenient_list")]
	pub affected_ports: Vec<String>,
	/// Likely attack vectors.
	#[serde(default, deserialize_with = "lenient_list")]
	pub likely_vectors: Vec<String>,
}

impl PeripheralRecord {
	/// First non-empty of `risk_level` and `status`.
	pub fn risk(&self) -> Option<&str> {
		first_non_empty(&[&self.risk_level, &self.status])
	}
}

fn first_non_empty<'a>(candidates: &[&'a Option<String>]) -> Option<&'a str> {
	candidates
		.iter()
		.filter_map(|c| c.as_deref())
		.find(|s| !s.is_empty())
}

/// Body of the vulnerability endpoint.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct LogsPayload {
	/// Preferred finding list.
	#[serde(default)]
	pub affected_hosts: Option<Vec<Value>>,
	/// Older name of the finding list.
	#[serde(default)]
	pub affected: Option<Vec<Value>>,
	/// Incident header fields.
	#[serde(flatten)]
	pub incident: IncidentSummary,
}

impl LogsPayload {
	/// `affected_hosts` when present, otherwise `affected`.
	pub fn findings(&self) -> Vec<Finding> {
		self.affected_hosts
			.as_ref()
			.or(self.affected.as_ref())
			.map(|items| {
				items
					.iter()
					.filter_map(|item| serde_json::from_value(item.clone()).ok())
					.collect()
			})
			.unwrap_or_default()
	}
}

/// Body of the perimeter endpoint.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct PeripheralPayload {
	/// IPs of hosts known to be compromised.
	#[serde(default, deserialize_with = "lenient_list")]
	pub primary_compromised: Vec<String>,
	/// Detailed exposure records.
	#[serde(default, deserialize_with = "lenient_records")]
	pub affected_hosts: Vec<PeripheralRecord>,
	/// Incident header fields.
	#[serde(flatten)]
	pub incident: IncidentSummary,
}

/// Body of the remediation endpoint.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct RemediationPayload {
	/// Playbook markup.
	#[serde(default, deserialize_with = "lenient_string")]
	pub remediation: Option<String>,
}

/// Canvas shape of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeShape {
	/// Circle.
	Dot,
	/// Square rotated by 45 degrees.
	Diamond,
	/// Flat-sided hexagon.
	Hexagon,
}

/// Fill and outline of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeColor {
	/// Fill color.
	pub background: &'static str,
	/// Outline color.
	pub border: &'static str,
}

/// Display-ready node. The display fields are rewritten by correlation passes.
#[derive(Clone, Debug, PartialEq)]
pub struct VisualNode {
	/// Node id.
	pub id: NodeId,
	/// Canvas label; may span several lines.
	pub label: String,
	/// Current colors.
	pub color: NodeColor,
	/// Shape by kind.
	pub shape: NodeShape,
	/// Size by kind.
	pub size: u32,
	/// Source record.
	pub raw: RawNode,
}

/// Display-ready edge, always drawn directed from `from` to `to`.
#[derive(Clone, Debug, PartialEq)]
pub struct VisualEdge {
	/// Positional id, `e-<index>`.
	pub id: String,
	/// Origin node id.
	pub from: NodeId,
	/// Destination node id.
	pub to: NodeId,
	/// Relation name, empty when absent.
	pub relation: String,
	/// Stroke color.
	pub color: &'static str,
}

/// Finding data attached to a node after correlation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeAnnotations {
	/// Latest vulnerability finding.
	pub vuln: Option<Finding>,
	/// Set by a perimeter pass.
	pub peripheral: bool,
	/// Exposure record, when the perimeter data had one.
	pub peripheral_data: Option<PeripheralRecord>,
}

impl NodeAnnotations {
	/// True when nothing is attached.
	pub fn is_empty(&self) -> bool {
		self.vuln.is_none() && !self.peripheral && self.peripheral_data.is_none()
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn graph_payload_tolerates_missing_lists_and_bad_entries() {
		let payload: GraphPayload = serde_json::from_value(json!({
			"nodes": [{"id": 7, "type": "host", "ip": "10.0.0.1"}, {"name": "no id"}, "junk"],
		}))
		.unwrap();
		let graph = AssetGraph::from(payload);
		assert_eq!(graph.nodes.len(), 1);
		assert_eq!(graph.nodes[0].id, "7");
		assert_eq!(graph.nodes[0].kind, NodeKind::Host);
		assert!(graph.edges.is_empty());

		let graph = AssetGraph::from(serde_json::from_value::<GraphPayload>(json!({"nodes": null})).unwrap());
		assert!(graph.nodes.is_empty());
	}

	#[test]
	fn node_attributes_keep_document_order() {
		let node = RawNode::from_attributes(
			serde_json::from_value(json!({"zone": "dmz", "id": "h1", "name": "web", "role": "app"})).unwrap(),
		)
		.unwrap();
		let keys: Vec<_> = node.attributes.keys().map(String::as_str).collect();
		assert_eq!(keys, ["zone", "id", "name", "role"]);
		assert_eq!(node.kind, NodeKind::Other(String::new()));
	}

	#[test]
	fn finding_coerces_scalars() {
		let finding: Finding = serde_json::from_value(json!({
			"ip": "10.0.0.9", "risk_level": "", "status": "Compromised", "tags": ["c2", 4444],
		}))
		.unwrap();
		assert_eq!(finding.risk(), Some("Compromised"));
		assert_eq!(finding.tags, ["c2", "4444"]);
		assert!(finding.evidence.is_none());
	}

	#[test]
	fn logs_prefer_affected_hosts() {
		let logs: LogsPayload = serde_json::from_value(json!({
			"affected_hosts": [{"ip": "1.1.1.1"}],
			"affected": [{"ip": "2.2.2.2"}],
			"severity": "high",
		}))
		.unwrap();
		let findings = logs.findings();
		assert_eq!(findings.len(), 1);
		assert_eq!(findings[0].ip.as_deref(), Some("1.1.1.1"));
		assert_eq!(logs.incident.severity.as_deref(), Some("high"));

		let logs: LogsPayload = serde_json::from_value(json!({"affected": [{"hostname": "db"}]})).unwrap();
		assert_eq!(logs.findings()[0].hostname.as_deref(), Some("db"));
	}

	#[test]
	fn peripheral_payload_parses_ports_as_text() {
		let payload: PeripheralPayload = serde_json::from_value(json!({
			"primary_compromised": ["10.0.0.5 "],
			"affected_hosts": [{"ip": "10.0.0.6", "affected_ports": [445, 3389]}, 12],
		}))
		.unwrap();
		assert_eq!(payload.primary_compromised, ["10.0.0.5 "]);
		assert_eq!(payload.affected_hosts.len(), 1);
		assert_eq!(payload.affected_hosts[0].affected_ports, ["445", "3389"]);
		assert!(payload.incident.is_empty());
	}

	#[test]
	fn incident_merge_keeps_first_values() {
		let mut incident = IncidentSummary {
			severity: Some("critical".into()),
			..IncidentSummary::default()
		};
		incident.merge(&IncidentSummary {
			severity: Some("low".into()),
			incident_id: Some("INC-7".into()),
			..IncidentSummary::default()
		});
		assert_eq!(incident.severity.as_deref(), Some("critical"));
		assert_eq!(incident.incident_id.as_deref(), Some("INC-7"));
		assert!(incident.summary.is_none());
	}
}
