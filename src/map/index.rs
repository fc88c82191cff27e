use std::collections::HashMap;

use super::model::{NodeId, VisualNode};

/// IP key: surrounding whitespace removed.
pub fn normalize_ip(ip: &str) -> &str {
	ip.trim()
}

/// Name key: trimmed and lowercased.
pub fn normalize_name(name: &str) -> String {
	name.trim().to_lowercase()
}

/// Exact-match lookup from node identity fields to node ids.
///
/// Keys go through [`normalize_ip`] / [`normalize_name`] on both insert and lookup.
/// When two nodes share a key the one processed last wins.
#[derive(Clone, Debug, Default)]
pub struct IdentityIndex {
	by_ip: HashMap<String, NodeId>,
	by_name: HashMap<String, NodeId>,
}

impl IdentityIndex {
	/// Index every node with a non-empty IP or name.
	pub fn build(nodes: &[VisualNode]) -> Self {
		let mut index = Self::default();
		for node in nodes {
			if let Some(ip) = node.raw.ip.as_deref().map(normalize_ip).filter(|ip| !ip.is_empty()) {
				index.by_ip.insert(ip.to_string(), node.id.clone());
			}
			if let Some(name) = node.raw.name.as_deref().map(normalize_name).filter(|n| !n.is_empty()) {
				index.by_name.insert(name, node.id.clone());
			}
		}
		index
	}

	/// Node with this IP.
	pub fn by_ip(&self, ip: &str) -> Option<&NodeId> {
		self.by_ip.get(normalize_ip(ip))
	}

	/// Node with this name, ignoring case.
	pub fn by_name(&self, name: &str) -> Option<&NodeId> {
		self.by_name.get(&normalize_name(name))
	}

	/// IP first, hostname as fallback.
	pub fn resolve(&self, ip: Option<&str>, hostname: Option<&str>) -> Option<&NodeId> {
		ip.and_then(|ip| self.by_ip(ip))
			.or_else(|| hostname.and_then(|h| self.by_name(h)))
	}

	/// Number of IP keys and name keys.
	pub fn key_counts(&self) -> (usize, usize) {
		(self.by_ip.len(), self.by_name.len())
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::map::model::RawNode;
	use crate::map::normalize::normalize_node;

	fn node(value: serde_json::Value) -> VisualNode {
		normalize_node(&RawNode::from_attributes(serde_json::from_value(value).unwrap()).unwrap())
	}

	#[test]
	fn keys_are_normalized_on_both_sides() {
		let index = IdentityIndex::build(&[node(json!({"id": "h1", "name": " DC01 ", "ip": " 10.0.0.1 "}))]);
		assert_eq!(index.by_ip("10.0.0.1").map(String::as_str), Some("h1"));
		assert_eq!(index.by_ip("\t10.0.0.1").map(String::as_str), Some("h1"));
		assert_eq!(index.by_name("dc01").map(String::as_str), Some("h1"));
		assert_eq!(index.by_name("Dc01 ").map(String::as_str), Some("h1"));
		assert!(index.by_name("dc0").is_none());
	}

	#[test]
	fn last_node_wins_on_collision() {
		let index = IdentityIndex::build(&[
			node(json!({"id": "a", "ip": "10.0.0.2", "name": "dup"})),
			node(json!({"id": "b", "ip": "10.0.0.2", "name": "DUP"})),
		]);
		assert_eq!(index.by_ip("10.0.0.2").map(String::as_str), Some("b"));
		assert_eq!(index.by_name("dup").map(String::as_str), Some("b"));
		assert_eq!(index.key_counts(), (1, 1));
	}

	#[test]
	fn resolve_falls_back_to_hostname() {
		let index = IdentityIndex::build(&[
			node(json!({"id": "h1", "ip": "10.0.0.1", "name": "web"})),
			node(json!({"id": "h2", "name": "db"})),
		]);
		assert_eq!(index.resolve(Some("10.0.0.1"), Some("db")).map(String::as_str), Some("h1"));
		assert_eq!(index.resolve(Some("10.9.9.9"), Some("DB")).map(String::as_str), Some("h2"));
		assert_eq!(index.resolve(None, Some("web")).map(String::as_str), Some("h1"));
		assert!(index.resolve(None, None).is_none());
	}
}
