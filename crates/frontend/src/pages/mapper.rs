use dioxus::logger::tracing;
use dioxus::prelude::*;
use mapmark_shared::config::MapConfig;
use mapmark_shared::session::MapSession;

use crate::api;
use crate::components::io_panel::IoPanel;
use crate::components::jump_form::JumpForm;
use crate::components::legend::Legend;
use crate::components::map_view::MapView;
use crate::components::marker_editor::MarkerEditor;
use crate::components::report;
use crate::components::view_controls::ViewControls;

/// Fresh session for the fetched config, keeping the measured container.
fn seeded_session(config: MapConfig, previous: &MapSession) -> MapSession {
    let mut next = MapSession::new(config);
    next.set_container(previous.container());
    next
}

#[component]
pub fn Mapper(set_id: Option<String>) -> Element {
    // The map is usable with defaults while the initial fetch is pending
    let mut session = use_signal(MapSession::default);
    let status = use_signal(|| None::<String>);

    let loader_set_id = set_id.clone();
    let _loader = use_resource(move || {
        let set_id = loader_set_id.clone();
        async move {
            let config = match api::fetch_map_config().await {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(error = %e, "Using default map config");
                    MapConfig::default()
                }
            };
            let fetched = api::fetch_markers(set_id.as_deref()).await;
            if let Err(e) = &fetched {
                tracing::warn!(error = %e, "Initial marker fetch failed");
            }

            let mut next = seeded_session(config, &session.peek());
            let effects = next.load_initial(fetched);
            session.set(next);
            report(status, effects);
        }
    });

    let title = match &set_id {
        Some(id) => format!("Mapmark · set {}", id),
        None => "Mapmark".to_string(),
    };

    rsx! {
        div { class: "app",
            div { class: "header",
                h1 { "{title}" }
                if let Some(message) = &*status.read() {
                    span { class: "status", "{message}" }
                }
            }

            div { class: "sidebar",
                ViewControls { session: session, status: status }
                MarkerEditor { session: session, status: status }
                JumpForm { session: session, status: status }
                Legend { session: session, status: status }
                IoPanel { session: session, status: status, set_id: set_id.clone() }
            }

            MapView { session: session, status: status }
        }
    }
}
