use dioxus::prelude::*;
use mapmark_shared::session::{JumpRequest, MapSession};

use crate::components::report;

#[component]
pub fn JumpForm(session: Signal<MapSession>, status: Signal<Option<String>>) -> Element {
    let mut request = use_signal(JumpRequest::default);
    let world_max = session.read().extent().max();
    let req = request.read().clone();

    rsx! {
        div { class: "panel",
            h3 { "Jump to" }
            div { class: "coord-inputs",
                input {
                    r#type: "text",
                    placeholder: "x (0-{world_max})",
                    value: "{req.x}",
                    oninput: move |evt: Event<FormData>| request.write().x = evt.value(),
                }
                input {
                    r#type: "text",
                    placeholder: "y (0-{world_max})",
                    value: "{req.y}",
                    oninput: move |evt: Event<FormData>| request.write().y = evt.value(),
                }
                input {
                    r#type: "text",
                    placeholder: "zoom",
                    value: "{req.zoom}",
                    oninput: move |evt: Event<FormData>| request.write().zoom = evt.value(),
                }
            }
            label { class: "toggle",
                input {
                    r#type: "checkbox",
                    checked: req.mark,
                    onchange: move |evt: Event<FormData>| request.write().mark = evt.checked(),
                }
                "Drop a marker there"
            }
            button {
                onclick: move |_| {
                    let req = request.read().clone();
                    let effects = session.write().jump_to(&req);
                    report(status, effects);
                },
                "Go"
            }
        }
    }
}
