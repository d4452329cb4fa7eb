use dioxus::prelude::*;
use mapmark_shared::grid::format_coord;
use mapmark_shared::models::{category, CATEGORIES};
use mapmark_shared::session::MapSession;

use crate::components::report;

/// Type options for the select; an unknown current type is kept selectable.
fn type_options(current: &str) -> Vec<String> {
    let mut options: Vec<String> = CATEGORIES.iter().map(|c| c.key.to_string()).collect();
    if category(current).is_none() && !current.is_empty() {
        options.push(current.to_string());
    }
    options
}

/// Edits the draft values used for new markers and for "Apply" on the
/// selected one.
#[component]
pub fn MarkerEditor(session: Signal<MapSession>, status: Signal<Option<String>>) -> Element {
    let s = session.read();
    let draft = s.draft().clone();
    let selected = s
        .selected_marker()
        .map(|m| (m.id.to_string(), format_coord(m.x, m.y)));
    let edit_mode = s.edit_mode();
    drop(s);

    let options = type_options(&draft.kind);

    rsx! {
        div { class: "panel",
            h3 { "Marker" }
            if !edit_mode {
                p { class: "hint", "Turn on edit mode, then click the map to add markers." }
            }
            div { class: "field",
                span { "Type" }
                select {
                    "aria-label": "Marker type",
                    value: "{draft.kind}",
                    onchange: move |evt: Event<FormData>| session.write().set_draft_kind(evt.value()),
                    for key in options {
                        option {
                            value: "{key}",
                            selected: key == draft.kind,
                            "{key}"
                        }
                    }
                }
            }
            div { class: "field",
                span { "Number" }
                input {
                    r#type: "number",
                    min: "0",
                    value: "{draft.number}",
                    oninput: move |evt: Event<FormData>| {
                        if let Ok(n) = evt.value().trim().parse::<u32>() {
                            session.write().set_draft_number(n);
                        }
                    },
                }
            }
            div { class: "field",
                span { "Label" }
                input {
                    r#type: "text",
                    placeholder: "Optional label...",
                    value: "{draft.label}",
                    oninput: move |evt: Event<FormData>| session.write().set_draft_label(evt.value()),
                }
            }
            if let Some((id, coord)) = selected {
                div { class: "selection",
                    span { "Selected {id} at {coord}" }
                    div { class: "button-row",
                        button {
                            onclick: move |_| {
                                let effects = session.write().apply_to_selected();
                                report(status, effects);
                            },
                            "Apply"
                        }
                        button {
                            class: "danger",
                            onclick: move |_| {
                                let effects = session.write().delete_selected();
                                report(status, effects);
                            },
                            "Delete"
                        }
                    }
                    p { class: "hint", "Click the selected marker again to delete it." }
                }
            }
        }
    }
}
