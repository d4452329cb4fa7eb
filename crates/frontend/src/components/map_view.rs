use dioxus::html::input_data::MouseButton;
use dioxus::prelude::*;
use gloo_timers::future::TimeoutFuture;
use mapmark_shared::grid::{format_coord, GridAxis, GridLine};
use mapmark_shared::models::MarkerId;
use mapmark_shared::session::MapSession;
use mapmark_shared::viewport::ScreenPoint;

use crate::components::report;
use crate::coords;

pub const MAP_CONTAINER_ID: &str = "mapmark-map-container";

/// Drag threshold in pixels; movement below this is treated as a click.
const DRAG_THRESHOLD: f64 = 3.0;

/// How often the container size is re-measured.
const RESIZE_POLL_MS: u32 = 250;

/// Badge label size relative to its diameter.
const LABEL_RATIO: f64 = 0.45;

// ---------------------------------------------------------------------------
// DOM helpers
// ---------------------------------------------------------------------------

/// Push the live container size into the session when it changed.
fn sync_container(mut session: Signal<MapSession>, status: Signal<Option<String>>) {
    let Some(rect) = coords::container_rect(MAP_CONTAINER_ID) else {
        return;
    };
    if rect == session.peek().container() {
        return;
    }
    let effects = session.write().set_container(rect);
    report(status, effects);
}

fn pointer(client_x: f64, client_y: f64) -> Option<ScreenPoint> {
    coords::pointer_in_container(client_x, client_y, MAP_CONTAINER_ID)
}

// ---------------------------------------------------------------------------
// Render helpers (pure, easily testable)
// ---------------------------------------------------------------------------

/// Grid overlay drawn into a 0..100 viewBox that stretches over the content.
fn build_grid_svg(lines: &[GridLine]) -> String {
    let mut svg = String::with_capacity(lines.len() * 140);
    for line in lines {
        let pos = line.fraction * 100.0;
        let (x1, y1, x2, y2) = match line.axis {
            GridAxis::Vertical => (pos, 0.0, pos, 100.0),
            GridAxis::Horizontal => (0.0, pos, 100.0, pos),
        };
        let stroke = line.weight.stroke();
        let sw = line.weight.stroke_width();
        svg.push_str(&format!(
            r#"<line x1="{x1}" y1="{y1}" x2="{x2}" y2="{y2}" stroke="{stroke}" stroke-width="{sw}" vector-effect="non-scaling-stroke"/>"#
        ));
    }
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100" preserveAspectRatio="none" class="grid-layer">{svg}</svg>"#
    )
}

/// World point to container pixels under the current view.
fn project(session: &MapSession, (x, y): (f64, f64)) -> ScreenPoint {
    let (fx, fy) = session.extent().world_to_fraction(x, y);
    session.view().fraction_to_screen(session.container(), fx, fy)
}

/// Everything needed to draw one marker badge.
#[derive(Debug, Clone, PartialEq)]
struct BadgeView {
    id: MarkerId,
    left: f64,
    top: f64,
    diameter: f64,
    fill: &'static str,
    text_color: &'static str,
    number: u32,
    title: String,
    selected: bool,
    displaced: bool,
}

impl BadgeView {
    fn style(&self) -> String {
        let d = self.diameter;
        let half = d / 2.0;
        let fs = d * LABEL_RATIO;
        format!(
            "left: {}px; top: {}px; width: {d}px; height: {d}px; margin-left: -{half}px; margin-top: -{half}px; background: {}; color: {}; font-size: {fs}px;",
            self.left, self.top, self.fill, self.text_color
        )
    }

    fn class(&self) -> &'static str {
        match (self.selected, self.displaced) {
            (true, _) => "marker selected",
            (false, true) => "marker displaced",
            (false, false) => "marker",
        }
    }
}

fn badge_views(session: &MapSession) -> Vec<BadgeView> {
    let selected = session.selection();
    session
        .layout()
        .into_iter()
        .filter_map(|geom| {
            let marker = session.store().get(&geom.id)?;
            let color = marker.color();
            let pos = geom.position();
            let mut title = format!("{} #{}", marker.kind, marker.number);
            if !marker.label.is_empty() {
                title.push(' ');
                title.push_str(&marker.label);
            }
            title.push(' ');
            title.push_str(&format_coord(marker.x, marker.y));
            Some(BadgeView {
                selected: selected == Some(&geom.id),
                displaced: geom.is_displaced(),
                id: geom.id,
                left: pos.x,
                top: pos.y,
                diameter: geom.diameter,
                fill: color.fill(),
                text_color: color.text(),
                number: marker.number,
                title,
            })
        })
        .collect()
}

fn container_class(pan_mode: bool, edit_mode: bool, dragging: bool) -> &'static str {
    if dragging {
        "map-container dragging"
    } else if pan_mode {
        "map-container pan-mode"
    } else if edit_mode {
        "map-container edit-mode"
    } else {
        "map-container"
    }
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

#[component]
pub fn MapView(session: Signal<MapSession>, status: Signal<Option<String>>) -> Element {
    // Mouse-down position, used to tell clicks from drags
    let mut drag_origin = use_signal(|| None::<ScreenPoint>);
    let mut did_drag = use_signal(|| false);

    use_future(move || async move {
        loop {
            sync_container(session, status);
            TimeoutFuture::new(RESIZE_POLL_MS).await;
        }
    });

    let grid_svg = use_memo(move || {
        let s = session.read();
        if s.show_grid() {
            build_grid_svg(&s.grid_lines())
        } else {
            String::new()
        }
    });

    let (transform_style, class, background, badges, crosshair, click_badge) = {
        let s = session.read();
        let view = s.view();
        let transform_style = format!(
            "transform: translate({}px, {}px) scale({}); transform-origin: 0 0;",
            view.translate_x, view.translate_y, view.scale
        );
        let crosshair = s
            .hover()
            .filter(|_| s.show_crosshair())
            .map(|pt| (project(&s, pt), format_coord(pt.0, pt.1)));
        let click_badge = s.badge().map(|pt| (project(&s, pt), format_coord(pt.0, pt.1)));
        (
            transform_style,
            container_class(s.pan_mode(), s.edit_mode(), s.is_dragging()),
            s.background_url().map(str::to_string),
            badge_views(&s),
            crosshair,
            click_badge,
        )
    };

    rsx! {
        div {
            id: MAP_CONTAINER_ID,
            class: "{class}",

            onmounted: move |_| sync_container(session, status),

            onwheel: move |evt: Event<WheelData>| {
                evt.prevent_default();
                let delta_y = coords::wheel_delta_y(evt.data().delta());
                let client = evt.data().client_coordinates();
                let Some(p) = pointer(client.x, client.y) else { return };
                let effects = session.write().on_wheel(p, delta_y);
                report(status, effects);
            },

            onmousedown: move |evt: Event<MouseData>| {
                if evt.trigger_button() != Some(MouseButton::Primary) {
                    return;
                }
                let client = evt.client_coordinates();
                let Some(p) = pointer(client.x, client.y) else { return };
                drag_origin.set(Some(p));
                did_drag.set(false);
                let effects = session.write().on_pointer_down(p);
                report(status, effects);
            },

            onmousemove: move |evt: Event<MouseData>| {
                let client = evt.client_coordinates();
                let Some(p) = pointer(client.x, client.y) else { return };
                if let Some(origin) = *drag_origin.peek() {
                    let moved = (p.x - origin.x).abs() > DRAG_THRESHOLD
                        || (p.y - origin.y).abs() > DRAG_THRESHOLD;
                    if moved && !*did_drag.peek() {
                        did_drag.set(true);
                    }
                }
                let effects = session.write().on_pointer_move(p);
                report(status, effects);
            },

            onmouseup: move |_| {
                drag_origin.set(None);
                let effects = session.write().on_pointer_up();
                report(status, effects);
            },

            onmouseleave: move |_| {
                drag_origin.set(None);
                let effects = session.write().on_pointer_leave();
                report(status, effects);
            },

            onclick: move |evt: Event<MouseData>| {
                // The click that ends a drag is not a map click
                if *did_drag.peek() {
                    did_drag.set(false);
                    return;
                }
                let client = evt.client_coordinates();
                let Some(p) = pointer(client.x, client.y) else { return };
                let effects = session.write().on_map_click(p);
                report(status, effects);
            },

            // Content layer: background and grid share the view transform
            div {
                class: "map-content",
                style: "{transform_style}",
                if let Some(src) = background {
                    img {
                        class: "map-image",
                        src: "{src}",
                        alt: "",
                        draggable: "false",
                    }
                }
                div {
                    class: "grid-host",
                    dangerous_inner_html: "{grid_svg}",
                }
            }

            if let Some((p, text)) = crosshair {
                div { class: "crosshair-v", style: "left: {p.x}px;" }
                div { class: "crosshair-h", style: "top: {p.y}px;" }
                div { class: "crosshair-label", style: "left: {p.x}px; top: {p.y}px;", "{text}" }
            }

            if let Some((p, text)) = click_badge {
                div { class: "click-badge", style: "left: {p.x}px; top: {p.y}px;", "{text}" }
            }

            for badge in badges {
                div {
                    key: "{badge.id}",
                    class: badge.class(),
                    style: badge.style(),
                    title: "{badge.title}",
                    onclick: {
                        let id = badge.id.clone();
                        move |evt: Event<MouseData>| {
                            evt.stop_propagation();
                            let effects = session.write().on_marker_click(&id);
                            report(status, effects);
                        }
                    },
                    "{badge.number}"
                }
            }
        }
    }
}
