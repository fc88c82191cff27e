use leptos::prelude::*;
use leptos::task::spawn_local;
use log::warn;

use crate::api::ApiClient;
use crate::config::MapConfig;
use crate::error::MapError;

/// Remove literal `\n` escape sequences, except those directly followed by `>`.
pub fn strip_escaped_newlines(html: &str) -> String {
	let mut out = String::with_capacity(html.len());
	let mut chars = html.chars().peekable();
	while let Some(c) = chars.next() {
		if c == '\\' && chars.peek() == Some(&'n') {
			let mut ahead = chars.clone();
			ahead.next();
			if ahead.peek() != Some(&'>') {
				chars.next();
				continue;
			}
		}
		out.push(c);
	}
	out
}

#[derive(Clone, Debug, PartialEq)]
pub enum PlaybookState {
	Loading,
	Ready(String),
	Empty,
	Unavailable,
	Failed(String),
}

impl PlaybookState {
	pub fn from_result(result: Result<Option<String>, MapError>) -> Self {
		match result {
			Ok(Some(html)) if !html.is_empty() => Self::Ready(strip_escaped_newlines(&html)),
			Ok(_) => {
				warn!("No remediation content available");
				Self::Empty
			}
			Err(e @ MapError::Status { .. }) => {
				warn!("Failed to fetch remediation playbook: {e}");
				Self::Unavailable
			}
			Err(e) => {
				warn!("Error loading remediation playbook: {e}");
				Self::Failed(e.to_string())
			}
		}
	}
}

/// Remediation playbook panel. The fetch starts after the configured delay; the
/// backend markup is inserted as delivered.
#[component]
pub fn RemediationPanel(config: MapConfig) -> impl IntoView {
	let state = RwSignal::new(PlaybookState::Loading);
	let delay = config.remediation_delay();
	let client = ApiClient::new(config);

	set_timeout(
		move || {
			spawn_local(async move {
				let result = client.remediation().await.map(|p| p.remediation);
				state.set(PlaybookState::from_result(result));
			});
		},
		delay,
	);

	move || match state.get() {
		PlaybookState::Loading => view! {
			<div id="remediation-loading" class="remediation">
				<div class="card"><div class="card-body text-center py-5">
					<div class="spinner-border text-primary mb-3" role="status">
						<span class="visually-hidden">"Loading..."</span>
					</div>
					<h5>"Generating Remediation Playbook..."</h5>
					<p class="text-muted">"Analyzing incident data and creating response plan"</p>
				</div></div>
			</div>
		}
		.into_any(),
		PlaybookState::Ready(html) => {
			view! { <div id="remediation-playbook" class="remediation" inner_html=html></div> }.into_any()
		}
		PlaybookState::Empty => view! {
			<div class="remediation alert alert-info">
				<strong>"Info:"</strong>" No remediation content available at this time."
			</div>
		}
		.into_any(),
		PlaybookState::Unavailable => view! {
			<div class="remediation alert alert-warning">
				<strong>"Warning:"</strong>" Unable to load remediation playbook. Please try again later."
			</div>
		}
		.into_any(),
		PlaybookState::Failed(message) => view! {
			<div class="remediation alert alert-danger">
				<strong>"Error:"</strong>" Failed to load remediation playbook. "{message}
			</div>
		}
		.into_any(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn strips_escaped_newlines_outside_tag_ends() {
		assert_eq!(strip_escaped_newlines(r"<h2>Plan</h2>\n<p>Isolate\nhost</p>"), "<h2>Plan</h2><p>Isolatehost</p>");
		assert_eq!(strip_escaped_newlines(r"<br\n>"), r"<br\n>");
		assert_eq!(strip_escaped_newlines(r"\n\n>"), r"\n>");
		assert_eq!(strip_escaped_newlines("real\nnewline"), "real\nnewline");
		assert_eq!(strip_escaped_newlines(r"trailing\"), r"trailing\");
	}

	#[test]
	fn states_from_results() {
		assert_eq!(
			PlaybookState::from_result(Ok(Some(r"<p>a\nb</p>".into()))),
			PlaybookState::Ready("<p>ab</p>".into())
		);
		assert_eq!(PlaybookState::from_result(Ok(Some(String::new()))), PlaybookState::Empty);
		assert_eq!(PlaybookState::from_result(Ok(None)), PlaybookState::Empty);
		assert_eq!(
			PlaybookState::from_result(Err(MapError::Status {
				url: "/api/remediation".into(),
				status: 503
			})),
			PlaybookState::Unavailable
		);
		assert!(matches!(
			PlaybookState::from_result(Err(MapError::Body("/api/remediation".into()))),
			PlaybookState::Failed(m) if m.contains("not text")
		));
	}
}
