use leptos::prelude::*;

use crate::map::correlate::{PERIPHERAL_COLOR, RiskTier};
use crate::map::model::{IncidentSummary, NodeKind, NodeShape};
use crate::map::normalize::{DEFAULT_EDGE_COLOR, RELATION_COLORS, kind_style};

fn shape_glyph(shape: NodeShape) -> &'static str {
	match shape {
		NodeShape::Dot => "\u{25CF}",
		NodeShape::Diamond => "\u{25C6}",
		NodeShape::Hexagon => "\u{2B22}",
	}
}

#[component]
fn Swatch(color: &'static str, #[prop(default = "\u{25A0}")] glyph: &'static str, label: String) -> impl IntoView {
	view! {
		<li class="legend-item">
			<span class="legend-swatch" style=format!("color:{color}")>{glyph}</span>
			" "{label}
		</li>
	}
}

/// Key for node kinds, relation colors and finding colors.
#[component]
pub fn Legend(legend_ref: NodeRef<leptos::html::Div>) -> impl IntoView {
	let kinds = [("Host", NodeKind::Host), ("User", NodeKind::User), ("Group", NodeKind::Group)]
		.into_iter()
		.map(|(label, kind)| {
			let (shape, _, color) = kind_style(&kind);
			view! { <Swatch color=color glyph=shape_glyph(shape) label=label.to_string() /> }
		})
		.collect_view();

	let relations = RELATION_COLORS
		.iter()
		.map(|(relation, color)| view! { <Swatch color=*color glyph="\u{2192}" label=relation.replace('_', " ") /> })
		.collect_view();

	let tiers = RiskTier::ALL
		.into_iter()
		.map(|tier| view! { <Swatch color=tier.background() label=tier.label().to_string() /> })
		.collect_view();

	view! {
		<div id="legend" class="legend" node_ref=legend_ref>
			<h4>"Assets"</h4>
			<ul>{kinds}</ul>
			<h4>"Relations"</h4>
			<ul>
				{relations}
				<Swatch color=DEFAULT_EDGE_COLOR glyph="\u{2192}" label="other".to_string() />
			</ul>
			<h4>"Findings"</h4>
			<ul>
				{tiers}
				<Swatch color=PERIPHERAL_COLOR.background label="Perimeter / peripheral !".to_string() />
			</ul>
		</div>
	}
}

/// Incident header from the findings payloads, hidden until one carries data.
#[component]
pub fn IncidentBanner(#[prop(into)] incident: Signal<IncidentSummary>) -> impl IntoView {
	move || {
		let i = incident.get();
		(!i.is_empty()).then(|| {
			let severity = i.severity.clone().unwrap_or_else(|| "unknown".into());
			view! {
				<div class="incident-banner">
					<strong>"Incident "{i.incident_id.clone().unwrap_or_default()}</strong>
					" | severity: "{severity}
					{i.detected_at.clone().map(|t| view! { <span class="text-muted">" (detected "{t}")"</span> })}
					{i.summary.clone().map(|s| view! { <p>{s}</p> })}
				</div>
			}
		})
	}
}
