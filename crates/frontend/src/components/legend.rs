use dioxus::prelude::*;
use mapmark_shared::models::{category, BadgeColor, MarkerFilter};
use mapmark_shared::session::MapSession;

use crate::components::report;

/// Clicking the active filter again clears it.
fn toggled_filter(current: Option<&MarkerFilter>, kind: &str, number: u32) -> Option<MarkerFilter> {
    let next = MarkerFilter {
        kind: kind.to_string(),
        number,
    };
    if current == Some(&next) {
        None
    } else {
        Some(next)
    }
}

#[component]
pub fn Legend(session: Signal<MapSession>, status: Signal<Option<String>>) -> Element {
    let s = session.read();
    let entries: Vec<(String, Vec<u32>, &'static str)> = s
        .legend()
        .into_iter()
        .map(|e| {
            let fill = category(&e.kind).map(|c| c.color).unwrap_or(BadgeColor::Gray).fill();
            (e.kind, e.numbers, fill)
        })
        .collect();
    let filter = s.filter().cloned();
    let total = s.store().len();
    let shown = s.visible_markers().len();
    drop(s);

    rsx! {
        div { class: "panel legend",
            h3 { "Legend" }
            if entries.is_empty() {
                p { class: "hint", "No markers yet." }
            }
            for (kind, numbers, fill) in entries {
                div { class: "legend-row", key: "{kind}",
                    span { class: "swatch", style: "background: {fill};" }
                    span { class: "legend-kind", "{kind}" }
                    for number in numbers {
                        button {
                            class: if filter.as_ref().is_some_and(|f| f.kind == kind && f.number == number) { "chip active" } else { "chip" },
                            onclick: {
                                let kind = kind.clone();
                                move |_| {
                                    let next = toggled_filter(session.peek().filter(), &kind, number);
                                    let effects = session.write().set_filter(next);
                                    report(status, effects);
                                }
                            },
                            "{number}"
                        }
                    }
                }
            }
            if filter.is_some() {
                div { class: "button-row",
                    span { class: "hint", "Showing {shown} of {total}" }
                    button {
                        class: "secondary",
                        onclick: move |_| {
                            let effects = session.write().set_filter(None);
                            report(status, effects);
                        },
                        "Show all"
                    }
                }
            }
        }
    }
}
