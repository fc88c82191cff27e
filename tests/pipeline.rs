//! End-to-end checks of the graph enrichment pipeline through the public API.

use asset_risk_map::map::AssetMap;
use asset_risk_map::map::correlate::{PERIPHERAL_COLOR, PERIPHERAL_MARKER, RiskTier};
use asset_risk_map::map::detail::DetailRenderer;
use asset_risk_map::map::model::{AssetGraph, GraphPayload, LogsPayload, NodeKind, PeripheralPayload};
use asset_risk_map::map::normalize::{DEFAULT_EDGE_COLOR, RELATION_COLORS};
use serde_json::{Value, json};

fn snapshot() -> Value {
	json!({
		"nodes": [
			{"id": "h1", "type": "host", "name": "web01", "ip": "10.0.0.5", "os": "Ubuntu 22.04"},
			{"id": "h2", "type": "host", "name": "DC01", "ip": "10.0.0.10"},
			{"id": "h3", "type": "host", "name": "files"},
			{"id": "u1", "type": "user", "name": "Alice", "sam_account_name": "alice", "ip": "10.0.0.99"},
			{"id": "g1", "type": "group", "name": "Domain Admins"},
			{"id": "s1", "type": "service", "ip": "10.0.0.77"},
		],
		"edges": [
			{"source": "u1", "target": "h1", "relation": "interactive_logon"},
			{"source": "u1", "target": "g1", "relation": "member_of"},
			{"source": "g1", "target": "h2", "relation": "admin_on"},
			{"source": "h1", "target": "h3", "relation": "Data_Access"},
			{"source": "h1", "target": "s1"},
		],
	})
}

fn load(value: Value) -> AssetMap {
	let payload: GraphPayload = serde_json::from_value(value).unwrap();
	AssetMap::new(&AssetGraph::from(payload))
}

fn logs(value: Value) -> LogsPayload {
	serde_json::from_value(value).unwrap()
}

fn peripherals(value: Value) -> PeripheralPayload {
	serde_json::from_value(value).unwrap()
}

#[test]
fn only_hosts_with_ip_get_ip_line() {
	let map = load(snapshot());
	for node in map.nodes() {
		let ip = node.raw.ip.as_deref().unwrap_or_default();
		let has_ip_line = !ip.is_empty() && node.label.ends_with(&format!("\n{ip}"));
		assert_eq!(
			has_ip_line,
			node.raw.kind == NodeKind::Host && !ip.is_empty(),
			"label {:?} of {}",
			node.label,
			node.id
		);
	}
	assert_eq!(map.node("u1").unwrap().label, "Alice\n(alice)");
	assert_eq!(map.node("s1").unwrap().label, "s1");
}

#[test]
fn edge_colors_cover_every_relation() {
	let map = load(snapshot());
	for edge in map.edges() {
		let expected = RELATION_COLORS
			.iter()
			.find(|(name, _)| *name == edge.relation)
			.map(|(_, color)| *color)
			.unwrap_or(DEFAULT_EDGE_COLOR);
		assert_eq!(edge.color, expected, "edge {}", edge.id);
	}
	let ids: Vec<_> = map.edges().iter().map(|e| e.id.as_str()).collect();
	assert_eq!(ids, ["e-0", "e-1", "e-2", "e-3", "e-4"]);
	assert_eq!(map.edges()[3].color, DEFAULT_EDGE_COLOR);
}

#[test]
fn risk_tiers_from_examples() {
	assert_eq!(RiskTier::classify("Compromised host").background(), "#ef4444");
	assert_eq!(RiskTier::classify("HIGH").background(), "#f59e0b");
	assert_eq!(RiskTier::classify("medium risk, at risk").background(), "#fbbf24");
	assert_eq!(RiskTier::classify("unspecified").background(), "#f97316");
	assert_eq!(RiskTier::classify("medium or high"), RiskTier::High);
}

#[test]
fn unresolvable_findings_are_ignored() {
	let mut map = load(snapshot());
	let before = map.nodes().to_vec();
	let payload = logs(json!({
		"affected_hosts": [
			{"ip": "192.0.2.1", "risk_level": "critical"},
			{"hostname": "nowhere", "status": "compromised"},
			{"reason": "orphan"},
		],
	}));
	assert_eq!(map.apply_vulnerabilities(&payload.findings()), 0);
	assert_eq!(map.nodes(), before.as_slice());
}

#[test]
fn critical_finding_then_peripheral_record() {
	let mut map = load(json!({"nodes": [{"id": "h1", "type": "host", "ip": "10.0.0.5"}]}));
	let payload = logs(json!({"affected_hosts": [{"ip": "10.0.0.5", "risk_level": "Critical"}]}));
	map.apply_vulnerabilities(&payload.findings());

	let node = map.node("h1").unwrap();
	assert_eq!(node.color.background, "#ef4444");
	let vuln = map.annotations("h1").and_then(|a| a.vuln.as_ref()).unwrap();
	assert_eq!(vuln.risk_level.as_deref(), Some("Critical"));

	map.apply_peripherals(&peripherals(json!({"affected_hosts": [{"ip": "10.0.0.5"}]})));
	let node = map.node("h1").unwrap();
	assert_eq!(node.color, PERIPHERAL_COLOR);
	assert_eq!(node.color.background, "#8b5cf6");
}

#[test]
fn late_vulnerability_pass_keeps_peripheral_purple() {
	let mut map = load(snapshot());
	map.apply_peripherals(&peripherals(json!({"primary_compromised": ["10.0.0.5"]})));
	let critical = logs(json!({"affected_hosts": [{"ip": "10.0.0.5", "risk_level": "Critical"}]}));
	map.apply_vulnerabilities(&critical.findings());

	let node = map.node("h1").unwrap();
	assert_eq!(node.color, PERIPHERAL_COLOR);
	let annotations = map.annotations("h1").unwrap();
	assert_eq!(annotations.vuln.as_ref().unwrap().risk_level.as_deref(), Some("Critical"));
	let detail = map.detail_html(Some("h1"), &DetailRenderer::default());
	assert!(detail.contains("<strong>Risk:</strong> Critical"));
}

#[test]
fn repeated_passes_in_any_order_keep_one_marker() {
	let mut map = load(snapshot());
	let perimeter = peripherals(json!({
		"primary_compromised": ["10.0.0.10"],
		"affected_hosts": [{"ip": " 10.0.0.5 ", "affected_ports": [22]}],
	}));
	let vulns = logs(json!({"affected": [{"hostname": "dc01", "status": "warning"}]}));

	map.apply_peripherals(&perimeter);
	map.apply_vulnerabilities(&vulns.findings());
	map.apply_peripherals(&perimeter);
	map.apply_peripherals(&perimeter);

	for id in ["h1", "h2"] {
		let node = map.node(id).unwrap();
		assert_eq!(node.label.matches(PERIPHERAL_MARKER).count(), 1, "{id}");
		assert_eq!(node.color, PERIPHERAL_COLOR);
	}
	assert_eq!(map.peripheral_ids(), ["h1", "h2"]);
	assert!(map.annotations("h2").unwrap().vuln.is_some());
	assert!(map.annotations("h2").unwrap().peripheral_data.is_none());
	assert_eq!(
		map.annotations("h1").unwrap().peripheral_data.as_ref().unwrap().affected_ports,
		["22"]
	);
}

#[test]
fn render_value_placeholders_and_nesting() {
	let renderer = DetailRenderer::default();
	assert!(renderer.render_value(&json!([]), 0).contains("None"));
	assert!(renderer.render_value(&Value::Null, 0).contains("N/A"));

	let nested = renderer.render_value(&json!({"a": {"b": 1}}), 0);
	let (a, b, one) = (
		nested.find("<strong>A:</strong>").unwrap(),
		nested.find("<strong>B:</strong>").unwrap(),
		nested.rfind("1<br>").unwrap(),
	);
	assert!(a < b && b < one);
}

#[test]
fn detail_panel_reflects_annotations_so_far() {
	let mut map = load(snapshot());
	let renderer = DetailRenderer::default();

	let early = map.detail_html(Some("h1"), &renderer);
	assert!(early.contains("Os:"));
	assert!(!early.contains("Vulnerability"));

	map.apply_vulnerabilities(
		&logs(json!({
			"affected_hosts": [{
				"ip": "10.0.0.5",
				"status": "compromised",
				"summary": "beacon to <evil>",
				"tags": ["c2", "persistence"],
				"evidence": [{"EventID": 4688}],
			}],
		}))
		.findings(),
	);
	let late = map.detail_html(Some("h1"), &renderer);
	assert!(late.contains("<strong>Risk:</strong> compromised"));
	assert!(late.contains("beacon to &lt;evil&gt;"));
	assert!(late.contains("c2, persistence"));
	assert!(late.contains("&quot;EventID&quot;: 4688"));

	assert!(map.detail_html(Some("missing"), &renderer).contains("Click a node"));
	assert!(map.detail_html(None, &renderer).contains("Click a node"));
}
