use dioxus::prelude::*;
use mapmark_shared::config::GRID_STEPS;
use mapmark_shared::overlap::LayoutStrategy;
use mapmark_shared::session::MapSession;

use crate::components::report;

const STRATEGIES: [(LayoutStrategy, &str, &str); 4] = [
    (LayoutStrategy::Combined, "combined", "Shrink + rings"),
    (LayoutStrategy::ClusterRing, "rings", "Rings"),
    (LayoutStrategy::DensityShrink, "shrink", "Shrink"),
    (LayoutStrategy::Plain, "plain", "Plain"),
];

fn strategy_key(strategy: LayoutStrategy) -> &'static str {
    STRATEGIES
        .iter()
        .find(|(s, _, _)| *s == strategy)
        .map(|(_, key, _)| *key)
        .unwrap_or("combined")
}

fn strategy_from_key(key: &str) -> Option<LayoutStrategy> {
    STRATEGIES.iter().find(|(_, k, _)| *k == key).map(|(s, _, _)| *s)
}

/// Explains the zoom limit when it is on, louder when it blocks zooming in.
fn ceiling_hint(dynamic_ceiling: bool, ceiling: f64, zoom_min: f64) -> Option<(&'static str, &'static str)> {
    if !dynamic_ceiling {
        None
    } else if ceiling <= zoom_min {
        Some((
            "hint warning",
            "Some markers are too close together to zoom in at all. Turn this off to zoom freely.",
        ))
    } else {
        Some(("hint", "Zoom stops before any two markers overlap."))
    }
}

#[component]
pub fn ViewControls(session: Signal<MapSession>, status: Signal<Option<String>>) -> Element {
    let s = session.read();
    let scale = s.view().scale;
    let ceiling = s.bounds().max;
    let config = s.config();
    let size = config.marker_base_diameter_at_scale1;
    let min_size = config.min_diameter;
    let max_size = config.max_diameter;
    let dynamic_ceiling = config.dynamic_ceiling;
    let hint = ceiling_hint(dynamic_ceiling, ceiling, config.zoom_min);
    let edit_mode = s.edit_mode();
    let pan_mode = s.pan_mode();
    let show_grid = s.show_grid();
    let show_crosshair = s.show_crosshair();
    let snap = s.snap_enabled();
    let grid_step = s.grid_step();
    let strategy = strategy_key(s.strategy());
    drop(s);

    rsx! {
        div { class: "panel",
            h3 { "View" }
            div { class: "button-row",
                button {
                    onclick: move |_| {
                        let effects = session.write().zoom_out();
                        report(status, effects);
                    },
                    "−"
                }
                span { class: "scale-readout", "{scale:.2}× / {ceiling:.2}×" }
                button {
                    onclick: move |_| {
                        let effects = session.write().zoom_in();
                        report(status, effects);
                    },
                    "+"
                }
                button {
                    class: "secondary",
                    onclick: move |_| {
                        let effects = session.write().reset_view();
                        report(status, effects);
                    },
                    "Reset"
                }
            }

            label { class: "toggle",
                input {
                    r#type: "checkbox",
                    checked: edit_mode,
                    onchange: move |evt: Event<FormData>| session.write().set_edit_mode(evt.checked()),
                }
                "Edit markers"
            }
            label { class: "toggle",
                input {
                    r#type: "checkbox",
                    checked: pan_mode,
                    onchange: move |evt: Event<FormData>| session.write().set_pan_mode(evt.checked()),
                }
                "Pan (drag to move)"
            }
            label { class: "toggle",
                input {
                    r#type: "checkbox",
                    checked: show_grid,
                    onchange: move |evt: Event<FormData>| session.write().set_show_grid(evt.checked()),
                }
                "Grid"
            }
            label { class: "toggle",
                input {
                    r#type: "checkbox",
                    checked: show_crosshair,
                    onchange: move |evt: Event<FormData>| session.write().set_show_crosshair(evt.checked()),
                }
                "Crosshair"
            }
            label { class: "toggle",
                input {
                    r#type: "checkbox",
                    checked: snap,
                    onchange: move |evt: Event<FormData>| session.write().set_snap(evt.checked()),
                }
                "Snap to grid"
            }

            div { class: "field",
                span { "Grid step" }
                select {
                    value: "{grid_step}",
                    onchange: move |evt: Event<FormData>| {
                        if let Ok(step) = evt.value().parse::<f64>() {
                            session.write().set_grid_step(step);
                        }
                    },
                    for step in GRID_STEPS {
                        option {
                            value: "{step}",
                            selected: grid_step == step as f64,
                            "{step}"
                        }
                    }
                }
            }

            h3 { "Markers" }
            div { class: "field",
                span { "Layout" }
                select {
                    value: "{strategy}",
                    onchange: move |evt: Event<FormData>| {
                        if let Some(next) = strategy_from_key(&evt.value()) {
                            session.write().set_strategy(next);
                        }
                    },
                    for (_, key, name) in STRATEGIES {
                        option { value: "{key}", selected: strategy == key, "{name}" }
                    }
                }
            }
            div { class: "field",
                span { "Size {size:.0}px" }
                input {
                    r#type: "range",
                    min: "{min_size}",
                    max: "{max_size}",
                    step: "1",
                    value: "{size}",
                    oninput: move |evt: Event<FormData>| {
                        if let Ok(d) = evt.value().parse::<f64>() {
                            let effects = session.write().set_base_diameter(d);
                            report(status, effects);
                        }
                    },
                }
            }
            label { class: "toggle",
                input {
                    r#type: "checkbox",
                    checked: dynamic_ceiling,
                    onchange: move |evt: Event<FormData>| {
                        let effects = session.write().set_dynamic_ceiling(evt.checked());
                        report(status, effects);
                    },
                }
                "Limit zoom to keep markers apart"
            }
            if let Some((hint_class, text)) = hint {
                p { class: hint_class, "{text}" }
            }
        }
    }
}
