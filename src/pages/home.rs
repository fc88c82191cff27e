use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{error, info, warn};

use crate::api::ApiClient;
use crate::components::force_graph::{ForceGraphCanvas, GraphData, GraphEvent, appearances};
use crate::components::legend::{IncidentBanner, Legend};
use crate::components::overlay::{OVERLAY_CLASS, OverlayManager};
use crate::components::remediation::RemediationPanel;
use crate::components::stack_order::guard_stack_order;
use crate::config::MapConfig;
use crate::map::AssetMap;
use crate::map::detail::DetailRenderer;
use crate::map::model::IncidentSummary;
use crate::watch::PollBudget;

type SharedOverlay = Rc<RefCell<Option<OverlayManager>>>;

fn with_overlay(overlay: &SharedOverlay, f: impl FnOnce(&OverlayManager)) {
	if let Some(o) = overlay.borrow().as_ref() {
		f(o);
	}
}

/// Fetch findings once the graph is in place and fold them into the map. Both
/// passes run concurrently; [`AssetMap::apply`] keeps peripheral nodes purple.
fn load_findings(
	client: ApiClient,
	map: RwSignal<Option<AssetMap>>,
	incident: RwSignal<IncidentSummary>,
	overlay: SharedOverlay,
	rechecks: Vec<Duration>,
) {
	let (vuln_client, vuln_overlay) = (client.clone(), overlay.clone());
	spawn_local(async move {
		let logs = match vuln_client.vulnerabilities().await {
			Ok(logs) => logs,
			Err(e) => {
				warn!("Failed to fetch vulnerability findings: {e}");
				return;
			}
		};
		incident.update(|i| i.merge(&logs.incident));
		let findings = logs.findings();
		map.update(|m| {
			if let Some(m) = m {
				let applied = m.apply_vulnerabilities(&findings);
				info!("Vulnerability findings applied to {applied} nodes");
			}
		});
		with_overlay(&vuln_overlay, OverlayManager::sync);
	});

	spawn_local(async move {
		let payload = match client.peripherals().await {
			Ok(p) => p,
			Err(e) => {
				warn!("Failed to fetch perimeter findings: {e}");
				return;
			}
		};
		incident.update(|i| i.merge(&payload.incident));
		let mut marked = Vec::new();
		map.update(|m| {
			if let Some(m) = m {
				let applied = m.apply_peripherals(&payload);
				info!("Perimeter findings applied to {applied} nodes");
				marked = m.peripheral_ids();
			}
		});
		with_overlay(&overlay, |o| {
			o.set_decorated(marked);
			o.sync_with_rechecks(rechecks);
		});
	});
}

/// Asset map page: graph, legend, node details and remediation playbook.
#[component]
pub fn Home() -> impl IntoView {
	let config = MapConfig::from_page();
	let client = ApiClient::new(config.clone());
	let renderer = DetailRenderer::new(config.detail_max_depth);
	let rechecks: Vec<Duration> = config.overlay_rechecks().collect();
	let budget = PollBudget::from_millis(config.guard_poll_interval_ms, config.guard_poll_timeout_ms);

	let map = RwSignal::new(None::<AssetMap>);
	let topology = RwSignal::new(GraphData::default());
	let load_error = RwSignal::new(None::<String>);
	let incident = RwSignal::new(IncidentSummary::default());
	let info_html = RwSignal::new(renderer.render_node(None));
	let appearance = Memo::new(move |_| map.with(|m| m.as_ref().map(appearances).unwrap_or_default()));

	let container_ref = NodeRef::<leptos::html::Div>::new();
	let overlay_ref = NodeRef::<leptos::html::Canvas>::new();
	let legend_ref = NodeRef::<leptos::html::Div>::new();
	let overlay: SharedOverlay = Rc::new(RefCell::new(None));

	let overlay_init = overlay.clone();
	Effect::new(move |_| {
		let (Some(container), Some(canvas), Some(legend)) =
			(container_ref.get(), overlay_ref.get(), legend_ref.get())
		else {
			return;
		};
		if overlay_init.borrow().is_some() {
			return;
		}
		let container: web_sys::Element = container.into();
		let manager = OverlayManager::new(container.clone(), canvas);
		manager.sync();
		*overlay_init.borrow_mut() = Some(manager);
		guard_stack_order(container, legend.into(), budget);
	});

	let overlay_load = overlay.clone();
	spawn_local(async move {
		let graph = match client.asset_graph().await {
			Ok(graph) => graph,
			Err(e) => {
				error!("Failed to load asset map: {e}");
				load_error.set(Some(e.to_string()));
				return;
			}
		};
		let asset_map = AssetMap::new(&graph);
		topology.set(GraphData::from_map(&asset_map));
		map.set(Some(asset_map));
		load_findings(client, map, incident, overlay_load, rechecks);
	});

	let on_select = move |id: String| {
		let html = map.with_untracked(|m| m.as_ref().map(|m| m.detail_html(Some(&id), &renderer)));
		if let Some(html) = html {
			info_html.set(html);
		}
	};

	let overlay_events = overlay.clone();
	let on_event = move |event: GraphEvent| {
		with_overlay(&overlay_events, |o| match event {
			GraphEvent::Zoom | GraphEvent::DragEnd => o.redraw(),
			GraphEvent::Resize | GraphEvent::Stabilized => o.sync(),
		});
	};

	view! {
		<div class="asset-map-page">
			<IncidentBanner incident=incident />
			<div id="map-container" class="map-container">
				<div id="network" class="graph-container" node_ref=container_ref>
					<ForceGraphCanvas
						data=topology
						appearance=appearance
						on_select=on_select
						on_event=on_event
					/>
					<canvas class=OVERLAY_CLASS node_ref=overlay_ref></canvas>
					<Legend legend_ref=legend_ref />
					{move || {
						load_error
							.get()
							.map(|e| {
								view! {
									<div class="alert alert-danger graph-error">
										<strong>"Error:"</strong>
										" Unable to load the asset map. "
										{e}
									</div>
								}
							})
					}}
				</div>
				<div id="node-info" class="node-info" inner_html=move || info_html.get()></div>
			</div>
			<RemediationPanel config=config />
		</div>
	}
}
