use leptos::prelude::*;

/// 404 Not Found Page
#[component]
pub fn NotFound() -> impl IntoView {
	view! {
		<div class="not-found">
			<h1>"Page not found"</h1>
			<p>
				"The asset map lives at "<a href="/">"/"</a>"."
			</p>
		</div>
	}
}
