//! Backend client for the map endpoints.
//!
//! Uses `web-sys` fetch; bodies are read as text and decoded with `serde_json` so
//! object key order survives into the detail panel.

use serde::de::DeserializeOwned;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

use crate::config::MapConfig;
use crate::error::MapError;
use crate::map::model::{AssetGraph, GraphPayload, LogsPayload, PeripheralPayload, RemediationPayload};

#[derive(Clone, Debug)]
pub struct ApiClient {
	config: MapConfig,
}

impl ApiClient {
	pub fn new(config: MapConfig) -> Self {
		Self { config }
	}

	async fn text(&self, path: &str) -> Result<String, MapError> {
		let url = self.config.url(path);

		let opts = RequestInit::new();
		opts.set_method("GET");
		opts.set_mode(RequestMode::Cors);

		let request = Request::new_with_str_and_init(&url, &opts).map_err(|e| MapError::Request {
			url: url.clone(),
			message: MapError::js_message(&e),
		})?;

		let window = web_sys::window().ok_or_else(|| MapError::Dom("window".into()))?;
		let resp_value = JsFuture::from(window.fetch_with_request(&request))
			.await
			.map_err(|e| MapError::Transport {
				url: url.clone(),
				message: MapError::js_message(&e),
			})?;

		let resp: Response = resp_value.dyn_into().map_err(|_| MapError::Transport {
			url: url.clone(),
			message: "response is not a Response".into(),
		})?;

		if !resp.ok() {
			return Err(MapError::Status {
				url,
				status: resp.status(),
			});
		}

		let body = resp.text().map_err(|e| MapError::Transport {
			url: url.clone(),
			message: MapError::js_message(&e),
		})?;
		let body = JsFuture::from(body).await.map_err(|e| MapError::Transport {
			url: url.clone(),
			message: MapError::js_message(&e),
		})?;
		body.as_string().ok_or(MapError::Body(url))
	}

	pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, MapError> {
		let text = self.text(path).await?;
		Ok(serde_json::from_str(&text)?)
	}

	/// Fetch and validate the asset graph.
	pub async fn asset_graph(&self) -> Result<AssetGraph, MapError> {
		let payload: GraphPayload = self.get(&self.config.graph_path).await?;
		Ok(AssetGraph::from(payload))
	}

	pub async fn vulnerabilities(&self) -> Result<LogsPayload, MapError> {
		self.get(&self.config.logs_path).await
	}

	pub async fn peripherals(&self) -> Result<PeripheralPayload, MapError> {
		self.get(&self.config.peripherals_path).await
	}

	pub async fn remediation(&self) -> Result<RemediationPayload, MapError> {
		self.get(&self.config.remediation_path).await
	}
}
