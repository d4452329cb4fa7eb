use dioxus::html::FileData;
use dioxus::prelude::*;
use gloo_timers::future::TimeoutFuture;
use mapmark_shared::exchange::EXPORT_FILE_NAME;
use mapmark_shared::session::MapSession;
use wasm_bindgen::{JsCast, JsValue};

use crate::api;
use crate::components::{flash, report};

const JSON_MIME: &str = "application/json";

/// Delay before a download's object URL is released.
const REVOKE_DELAY_MS: u32 = 1_000;

/// Wrap `part` (a string or byte array) in a `Blob` and return an object URL
/// for it. The caller owns the URL and must revoke it.
fn object_url(part: &JsValue, mime: &str) -> Result<String, String> {
    let parts = js_sys::Array::of1(part);
    let options = web_sys::BlobPropertyBag::new();
    options.set_type(mime);
    let blob = web_sys::Blob::new_with_blob_sequence_and_options(&parts, &options)
        .map_err(|_| "Could not create blob".to_string())?;
    web_sys::Url::create_object_url_with_blob(&blob)
        .map_err(|_| "Could not create object URL".to_string())
}

fn revoke_object_url(url: &str) {
    if is_object_url(url) {
        let _ = web_sys::Url::revoke_object_url(url);
    }
}

/// URLs made by `object_url`, as opposed to configured static paths.
fn is_object_url(url: &str) -> bool {
    url.starts_with("blob:")
}

/// Trigger a browser download of `json` as `file_name`.
fn download_json(file_name: &str, json: &str) -> Result<(), String> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| "No document".to_string())?;
    let anchor = document
        .create_element("a")
        .map_err(|_| "Could not create link".to_string())?
        .dyn_into::<web_sys::HtmlAnchorElement>()
        .map_err(|_| "Could not create link".to_string())?;
    let url = object_url(&JsValue::from_str(json), JSON_MIME)?;
    anchor.set_href(&url);
    anchor.set_download(file_name);
    anchor.click();
    wasm_bindgen_futures::spawn_local(async move {
        TimeoutFuture::new(REVOKE_DELAY_MS).await;
        revoke_object_url(&url);
    });
    Ok(())
}

/// Apply imported marker JSON and report the outcome.
fn apply_import(mut session: Signal<MapSession>, status: Signal<Option<String>>, text: &str) -> bool {
    let result = session.write().import_json(text);
    match result {
        Ok(effects) => {
            let count = session.peek().store().len();
            flash(status, format!("Imported {} markers", count));
            report(status, effects);
            true
        }
        Err(e) => {
            flash(status, format!("Import failed: {}", e));
            false
        }
    }
}

/// Show a picked image file as the map background.
async fn load_background(
    mut session: Signal<MapSession>,
    status: Signal<Option<String>>,
    file: FileData,
) {
    let bytes = match file.read_bytes().await {
        Ok(bytes) => bytes,
        Err(e) => {
            flash(status, format!("Could not read {}: {}", file.name(), e));
            return;
        }
    };
    let mime = file.content_type().unwrap_or_else(|| "image/*".to_string());
    let data = js_sys::Uint8Array::from(&bytes[..]);
    match object_url(&data, &mime) {
        Ok(url) => {
            if let Some(old) = session.write().set_background_url(Some(url)) {
                revoke_object_url(&old);
            }
            flash(status, format!("Map image: {}", file.name()));
        }
        Err(e) => flash(status, e),
    }
}

fn copy_to_clipboard(text: String) {
    wasm_bindgen_futures::spawn_local(async move {
        if let Some(window) = web_sys::window() {
            let clipboard = window.navigator().clipboard();
            let _ = wasm_bindgen_futures::JsFuture::from(clipboard.write_text(&text)).await;
        }
    });
}

/// Export, import and server-side saving of the marker list.
#[component]
pub fn IoPanel(
    session: Signal<MapSession>,
    status: Signal<Option<String>>,
    set_id: Option<String>,
) -> Element {
    let mut import_text = use_signal(String::new);
    let mut set_name = use_signal(|| "Markers".to_string());
    let mut share_url = use_signal(|| None::<String>);
    let mut saving = use_signal(|| false);

    let marker_count = session.read().store().len();
    let has_background = session.read().background_url().is_some();
    let update_id = set_id.clone();

    rsx! {
        div { class: "panel",
            h3 { "Data" }
            div { class: "button-row",
                button {
                    onclick: move |_| {
                        match session.read().export_json() {
                            Ok(json) => match download_json(EXPORT_FILE_NAME, &json) {
                                Ok(()) => flash(status, format!("Exported {} markers", marker_count)),
                                Err(e) => flash(status, format!("Export failed: {}", e)),
                            },
                            Err(e) => flash(status, format!("Export failed: {}", e)),
                        }
                    },
                    "Export JSON"
                }
                button {
                    class: "secondary",
                    onclick: move |_| {
                        match session.read().export_json() {
                            Ok(json) => {
                                copy_to_clipboard(json);
                                flash(status, "Copied marker JSON".to_string());
                            }
                            Err(e) => flash(status, format!("Export failed: {}", e)),
                        }
                    },
                    "Copy JSON"
                }
            }

            textarea {
                class: "import-box",
                rows: "4",
                placeholder: "Paste a marker JSON array...",
                value: "{import_text}",
                oninput: move |evt: Event<FormData>| import_text.set(evt.value()),
            }
            button {
                disabled: import_text.read().trim().is_empty(),
                onclick: move |_| {
                    let text = import_text.read().clone();
                    if apply_import(session, status, &text) {
                        import_text.set(String::new());
                    }
                },
                "Import"
            }
            input {
                class: "file-input",
                r#type: "file",
                accept: ".json,application/json",
                onchange: move |evt: Event<FormData>| {
                    let Some(file) = evt.files().into_iter().next() else { return };
                    spawn(async move {
                        match file.read_string().await {
                            Ok(text) => {
                                apply_import(session, status, &text);
                            }
                            Err(e) => flash(status, format!("Could not read {}: {}", file.name(), e)),
                        }
                    });
                },
            }

            h3 { "Map image" }
            input {
                class: "file-input",
                r#type: "file",
                accept: "image/*",
                onchange: move |evt: Event<FormData>| {
                    let Some(file) = evt.files().into_iter().next() else { return };
                    spawn(load_background(session, status, file));
                },
            }
            button {
                class: "secondary",
                disabled: !has_background,
                onclick: move |_| {
                    if let Some(old) = session.write().set_background_url(None) {
                        revoke_object_url(&old);
                    }
                },
                "Blank grid"
            }

            h3 { "Share" }
            input {
                r#type: "text",
                placeholder: "Set name...",
                value: "{set_name}",
                oninput: move |evt: Event<FormData>| set_name.set(evt.value()),
            }
            div { class: "button-row",
                button {
                    disabled: *saving.read(),
                    onclick: move |_| {
                        let name = set_name.read().clone();
                        let markers = session.read().store().as_slice().to_vec();
                        saving.set(true);
                        spawn(async move {
                            match api::save_marker_set(&name, &markers).await {
                                Ok(saved) => match api::origin() {
                                    Ok(origin) => {
                                        share_url.set(Some(api::build_set_url(&origin, &saved.id)));
                                        flash(status, format!("Saved \"{}\"", saved.name));
                                    }
                                    Err(e) => flash(status, e),
                                },
                                Err(e) => flash(status, format!("Failed to save: {}", e)),
                            }
                            saving.set(false);
                        });
                    },
                    "Save & Share"
                }
                if let Some(id) = update_id {
                    button {
                        class: "secondary",
                        disabled: *saving.read(),
                        onclick: move |_| {
                            let id = id.clone();
                            let markers = session.read().store().as_slice().to_vec();
                            saving.set(true);
                            spawn(async move {
                                match api::update_marker_set(&id, &markers).await {
                                    Ok(saved) => flash(status, format!("Updated \"{}\"", saved.name)),
                                    Err(e) => flash(status, format!("Failed to update: {}", e)),
                                }
                                saving.set(false);
                            });
                        },
                        "Update this set"
                    }
                }
            }
            if let Some(url) = &*share_url.read() {
                div { class: "share-url",
                    input {
                        r#type: "text",
                        readonly: true,
                        value: "{url}",
                    }
                    button {
                        class: "secondary",
                        onclick: {
                            let url = url.clone();
                            move |_| copy_to_clipboard(url.clone())
                        },
                        "Copy"
                    }
                }
            }
        }
    }
}
