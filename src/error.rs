//! Error type for data loading and page binding.

use thiserror::Error;

/// Errors raised while loading map data or binding to the host page.
#[derive(Error, Debug)]
pub enum MapError {
	/// The request could not be built.
	#[error("request error for {url}: {message}")]
	Request {
		/// Requested URL.
		url: String,
		/// Browser error text.
		message: String,
	},

	/// The fetch or body read failed.
	#[error("fetch error for {url}: {message}")]
	Transport {
		/// Requested URL.
		url: String,
		/// Browser error text.
		message: String,
	},

	/// The server answered with a non-success status.
	#[error("HTTP {status} from {url}")]
	Status {
		/// Requested URL.
		url: String,
		/// HTTP status code.
		status: u16,
	},

	/// The body was not text.
	#[error("response body from {0} is not text")]
	Body(String),

	/// The body was not the expected JSON.
	#[error("deserialize error: {0}")]
	Decode(#[from] serde_json::Error),

	/// A required page object was missing or refused an operation.
	#[error("missing page element: {0}")]
	Dom(String),
}

impl MapError {
	/// Collapse a JS exception value into a printable message.
	pub(crate) fn js_message(value: &wasm_bindgen::JsValue) -> String {
		value.as_string().unwrap_or_else(|| format!("{value:?}"))
	}
}
