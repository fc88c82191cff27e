//! Runtime settings for the map page.
//!
//! Defaults cover the standard deployment. A page may override any field by
//! embedding `<script type="application/json" id="asset-map-config">{...}</script>`.

use std::time::Duration;

use log::warn;
use serde::Deserialize;

/// Element id of the optional JSON override block.
pub const CONFIG_ELEMENT_ID: &str = "asset-map-config";

/// Endpoint locations, timings and rendering limits.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct MapConfig {
	/// Prefix for every endpoint path; empty for same-origin requests.
	pub base_url: String,
	/// Asset graph endpoint.
	pub graph_path: String,
	/// Vulnerability findings endpoint.
	pub logs_path: String,
	/// Perimeter findings endpoint.
	pub peripherals_path: String,
	/// Remediation playbook endpoint.
	pub remediation_path: String,
	/// Delay before the playbook is requested.
	pub remediation_delay_ms: u64,
	/// Delays of the overlay re-syncs after perimeter data arrives.
	pub overlay_recheck_ms: Vec<u64>,
	/// Legend guard polling interval when change observation is unavailable.
	pub guard_poll_interval_ms: u64,
	/// How long the legend guard keeps polling.
	pub guard_poll_timeout_ms: u64,
	/// Nesting depth shown in the info panel.
	pub detail_max_depth: usize,
}

impl Default for MapConfig {
	fn default() -> Self {
		Self {
			base_url: String::new(),
			graph_path: "/api/assetmap".into(),
			logs_path: "/api/logs".into(),
			peripherals_path: "/api/peripherals".into(),
			remediation_path: "/api/remediation".into(),
			remediation_delay_ms: 500,
			overlay_recheck_ms: vec![250, 1000],
			guard_poll_interval_ms: 500,
			guard_poll_timeout_ms: 10_000,
			detail_max_depth: crate::map::detail::DEFAULT_MAX_DEPTH,
		}
	}
}

impl MapConfig {
	/// Parse an override document. Missing fields keep their defaults.
	pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(text)
	}

	/// Read the override block from the current document, if any.
	pub fn from_page() -> Self {
		let text = web_sys::window()
			.and_then(|w| w.document())
			.and_then(|d| d.get_element_by_id(CONFIG_ELEMENT_ID))
			.and_then(|el| el.text_content());
		let Some(text) = text else {
			return Self::default();
		};
		Self::from_json(&text).unwrap_or_else(|e| {
			warn!("Ignoring invalid #{CONFIG_ELEMENT_ID} block: {e}");
			Self::default()
		})
	}

	/// Absolute or same-origin URL of `path`.
	pub fn url(&self, path: &str) -> String {
		format!("{}{}", self.base_url.trim_end_matches('/'), path)
	}

	/// [`Self::remediation_delay_ms`] as a duration.
	pub fn remediation_delay(&self) -> Duration {
		Duration::from_millis(self.remediation_delay_ms)
	}

	/// [`Self::overlay_recheck_ms`] as durations.
	pub fn overlay_rechecks(&self) -> impl Iterator<Item = Duration> + '_ {
		self.overlay_recheck_ms.iter().map(|ms| Duration::from_millis(*ms))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_override_keeps_defaults() {
		let cfg = MapConfig::from_json(r#"{"base_url": "https://map.local/", "remediation_delay_ms": 0}"#)
			.unwrap();
		assert_eq!(cfg.url(&cfg.graph_path), "https://map.local/api/assetmap");
		assert_eq!(cfg.remediation_delay(), Duration::ZERO);
		assert_eq!(cfg.guard_poll_timeout_ms, 10_000);
		assert_eq!(cfg.overlay_recheck_ms, vec![250, 1000]);
	}

	#[test]
	fn empty_base_url_yields_relative_paths() {
		let cfg = MapConfig::default();
		assert_eq!(cfg.url(&cfg.logs_path), "/api/logs");
	}
}
