pub mod io_panel;
pub mod jump_form;
pub mod legend;
pub mod map_view;
pub mod marker_editor;
pub mod view_controls;

use dioxus::prelude::*;
use gloo_timers::future::TimeoutFuture;
use mapmark_shared::session::Effect;

const STATUS_MS: u32 = 3000;

/// Show a transient status line; it clears itself unless replaced meanwhile.
pub fn flash(mut status: Signal<Option<String>>, message: String) {
    status.set(Some(message.clone()));
    spawn(async move {
        TimeoutFuture::new(STATUS_MS).await;
        if status.peek().as_deref() == Some(message.as_str()) {
            status.set(None);
        }
    });
}

/// Message for effects the user should be told about.
pub fn effect_notice(effects: &[Effect]) -> Option<String> {
    effects.iter().rev().find_map(|e| match e {
        Effect::Recentered { scale } => Some(format!("Zoom limited to {:.2}× to keep markers apart", scale)),
        _ => None,
    })
}

/// Surface command effects in the status line.
pub fn report(status: Signal<Option<String>>, effects: Vec<Effect>) {
    if let Some(message) = effect_notice(&effects) {
        flash(status, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effect_notice_only_for_recenter() {
        assert_eq!(effect_notice(&[Effect::MarkersChanged]), None);
        let notice = effect_notice(&[Effect::MarkersChanged, Effect::Recentered { scale: 2.5 }]);
        assert_eq!(notice.as_deref(), Some("Zoom limited to 2.50× to keep markers apart"));
    }
}
