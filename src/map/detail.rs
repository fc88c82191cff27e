//! HTML rendering of node attributes and attached findings for the info panel.
//!
//! Every piece of text taken from the data, keys included, is escaped before it is
//! embedded: finding reasons, tags and evidence come from upstream analysis of
//! attacker-influenced logs.

use serde_json::Value;

use super::model::{Finding, NodeAnnotations, PeripheralRecord, RawNode};

/// Nesting depth beyond which values are elided.
pub const DEFAULT_MAX_DEPTH: usize = 16;

const MUTED: &str = "color:#999";
const BOX_STYLE: &str = "margin:4px 0;padding:6px;background:#f0f0f0;border-radius:4px";
const EMPTY_PANEL: &str = "<h3>Node Info</h3><p>Click a node in the graph to pin its details here.</p>";

/// Keys hidden from the generic attribute walk.
const ALWAYS_SKIPPED: &[&str] = &["id"];
const SKIPPED_WHEN_ANNOTATED: &[&str] = &["vuln", "peripheral", "peripheralData"];

/// Escape text for use in element content and quoted attributes.
pub fn escape_html(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	for c in text.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&#39;"),
			c => out.push(c),
		}
	}
	out
}

/// `sam_account_name` -> `Sam Account Name`.
pub fn humanize_key(key: &str) -> String {
	let mut out = String::with_capacity(key.len());
	let mut prev_word = false;
	for c in key.chars().map(|c| if c == '_' { ' ' } else { c }) {
		let word = c.is_ascii_alphanumeric();
		out.push(if word && !prev_word { c.to_ascii_uppercase() } else { c });
		prev_word = word;
	}
	out
}

/// Number text as a browser would print it: integral floats drop the `.0`.
fn number_text(n: &serde_json::Number) -> String {
	match n.as_f64() {
		Some(f) if n.is_f64() && f.is_finite() && f.fract() == 0.0 && f.abs() < 1e21 => {
			// Adding zero turns -0 into 0.
			format!("{:.0}", f + 0.0)
		}
		_ => n.to_string(),
	}
}

fn primitive_text(value: &Value) -> String {
	match value {
		Value::Null => "null".to_string(),
		Value::String(s) => s.clone(),
		Value::Number(n) => number_text(n),
		other => other.to_string(),
	}
}

fn pretty(value: &Value) -> String {
	serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn truthy(value: &Value) -> bool {
	match value {
		Value::Null => false,
		Value::Bool(b) => *b,
		Value::String(s) => !s.is_empty(),
		Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
		Value::Array(_) | Value::Object(_) => true,
	}
}

fn joined(items: &[String]) -> String {
	escape_html(&items.join(", "))
}

/// Renders node details with a nesting limit.
#[derive(Clone, Copy, Debug)]
pub struct DetailRenderer {
	max_depth: usize,
}

impl Default for DetailRenderer {
	fn default() -> Self {
		Self::new(DEFAULT_MAX_DEPTH)
	}
}

impl DetailRenderer {
	/// Renderer that elides values nested deeper than `max_depth`.
	pub fn new(max_depth: usize) -> Self {
		Self { max_depth }
	}

	/// Render any JSON value as nested markup, indented by `indent` levels.
	pub fn render_value(&self, value: &Value, indent: usize) -> String {
		let mut html = String::new();
		self.render_into(&mut html, value, indent, 0);
		html
	}

	fn render_into(&self, html: &mut String, value: &Value, indent: usize, depth: usize) {
		let spacing = "&nbsp;".repeat(indent * 4);
		if depth > self.max_depth {
			html.push_str(&format!("{spacing}<span style=\"{MUTED}\">&hellip;</span><br>"));
			return;
		}
		match value {
			Value::Null => html.push_str(&format!("{spacing}<span style=\"{MUTED}\">N/A</span><br>")),
			Value::Object(map) => {
				for (key, val) in map {
					html.push_str(&format!(
						"{spacing}<strong>{}:</strong><br>",
						escape_html(&humanize_key(key))
					));
					self.render_into(html, val, indent + 1, depth + 1);
				}
			}
			Value::Array(items) if items.is_empty() => {
				html.push_str(&format!("{spacing}<span style=\"{MUTED}\">None</span><br>"));
			}
			Value::Array(items) => {
				for item in items {
					if item.is_object() || item.is_array() {
						html.push_str(&format!("{spacing}<div style=\"{BOX_STYLE}\">"));
						self.render_into(html, item, indent, depth + 1);
						html.push_str(&format!("{spacing}</div>"));
					} else {
						html.push_str(&format!("{spacing}&bull; {}<br>", escape_html(&primitive_text(item))));
					}
				}
			}
			primitive => {
				html.push_str(&format!("{spacing}{}<br>", escape_html(&primitive_text(primitive))));
			}
		}
	}

	/// Full info panel for a node, or the selection prompt when there is none.
	pub fn render_node(&self, node: Option<(&RawNode, Option<&NodeAnnotations>)>) -> String {
		let Some((raw, annotations)) = node else {
			return EMPTY_PANEL.to_string();
		};
		let annotated = annotations.is_some_and(|a| !a.is_empty());

		let mut html = String::from("<h3>Node Info</h3><div style=\"line-height:1.6\">");
		for (key, value) in &raw.attributes {
			let skip = ALWAYS_SKIPPED.contains(&key.as_str())
				|| (annotated && SKIPPED_WHEN_ANNOTATED.contains(&key.as_str()));
			if skip {
				continue;
			}
			html.push_str("<div style=\"margin-bottom:12px\">");
			html.push_str(&format!(
				"<strong style=\"color:#2563eb\">{}:</strong><br>",
				escape_html(&humanize_key(key))
			));
			html.push_str(&self.render_value(value, 0));
			html.push_str("</div>");
		}
		html.push_str("</div>");

		if let Some(annotations) = annotations {
			if let Some(vuln) = &annotations.vuln {
				html.push_str(&vulnerability_section(vuln));
			}
			if let Some(record) = &annotations.peripheral_data {
				html.push_str(&perimeter_section(record));
			}
		}
		html
	}
}

fn evidence_html(evidence: Option<&Value>) -> String {
	match evidence.filter(|e| truthy(e)) {
		None => String::new(),
		Some(Value::Array(entries)) => {
			let items: String = entries
				.iter()
				.map(|e| {
					format!(
						"<li><pre style=\"white-space:pre-wrap;margin:0\">{}</pre></li>",
						escape_html(&pretty(e))
					)
				})
				.collect();
			format!("<ul>{items}</ul>")
		}
		Some(Value::String(text)) => {
			format!("<pre style=\"white-space:pre-wrap;\">{}</pre>", escape_html(text))
		}
		Some(other) => format!("<pre style=\"white-space:pre-wrap;\">{}</pre>", escape_html(&pretty(other))),
	}
}

/// Fixed-layout block for a vulnerability finding.
pub fn vulnerability_section(vuln: &Finding) -> String {
	let reason = [&vuln.reason, &vuln.summary]
		.into_iter()
		.filter_map(|r| r.as_deref())
		.find(|r| !r.is_empty())
		.unwrap_or_default();
	format!(
		"<hr/><h4>Vulnerability</h4><ul>\
		<li><strong>Risk:</strong> {}</li>\
		<li><strong>Reason:</strong> {}</li>\
		<li><strong>Tags:</strong> {}</li>\
		</ul><div><strong>Evidence:</strong>{}</div>",
		escape_html(vuln.risk().unwrap_or("unknown")),
		escape_html(reason),
		joined(&vuln.tags),
		evidence_html(vuln.evidence.as_ref()),
	)
}

/// Fixed-layout block for a perimeter exposure record.
pub fn perimeter_section(record: &PeripheralRecord) -> String {
	format!(
		"<hr/><h4>Perimeter / Peripheral Details</h4><ul>\
		<li><strong>Risk Level:</strong> {}</li>\
		<li><strong>Reason:</strong> {}</li>\
		<li><strong>Tags:</strong> {}</li>\
		<li><strong>Affected Ports:</strong> {}</li>\
		<li><strong>Vectors:</strong> {}</li>\
		</ul>",
		escape_html(record.risk().unwrap_or("unknown")),
		escape_html(record.reason.as_deref().unwrap_or_default()),
		joined(&record.tags),
		joined(&record.affected_ports),
		joined(&record.likely_vectors),
	)
}
