//! Property-based invariant tests for the coordinate mapper and view transform.
//!
//! 1. World -> fraction -> world round-trips integer coordinates.
//! 2. Pan clamp keeps the content covering the container above scale 1.
//! 3. Pan clamp centers the content at or below scale 1.
//! 4. Anchored zoom keeps the content point under the focus fixed.
//! 5. Every view operation stays inside the zoom bounds.
//! 6. Reset is idempotent.

use mapmark_shared::grid::WorldExtent;
use mapmark_shared::viewport::{
    clamp_pan, zoom_pan_at_cursor, ContainerRect, ScreenPoint, ViewState, ZoomBounds,
};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn rect_strategy() -> impl Strategy<Value = ContainerRect> {
    (50.0f64..2000.0, 50.0f64..2000.0).prop_map(|(w, h)| ContainerRect::new(w, h))
}

fn bounds() -> ZoomBounds {
    ZoomBounds::new(0.5, 6.0)
}

fn view_strategy() -> impl Strategy<Value = (ContainerRect, ViewState)> {
    (rect_strategy(), 0.5f64..6.0, -4000.0f64..4000.0, -4000.0f64..4000.0).prop_map(
        |(rect, scale, tx, ty)| {
            let (tx, ty) = clamp_pan(rect, tx, ty, scale);
            (
                rect,
                ViewState {
                    scale,
                    translate_x: tx,
                    translate_y: ty,
                },
            )
        },
    )
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Mapper round-trip
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn world_fraction_roundtrip(x in 0u32..=1199, y in 0u32..=1199) {
        let e = WorldExtent::default();
        let (fx, fy) = e.world_to_fraction(x as f64, y as f64);
        let (rx, ry) = e.fraction_to_world(fx, fy);
        prop_assert_eq!((rx, ry), (x as f64, y as f64));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2-3. Pan clamp
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn pan_clamp_covers_container(
        rect in rect_strategy(),
        scale in 1.0001f64..6.0,
        tx in -1e5f64..1e5,
        ty in -1e5f64..1e5,
    ) {
        let (cx, cy) = clamp_pan(rect, tx, ty, scale);
        prop_assert!(cx <= 0.0 && cy <= 0.0);
        prop_assert!(cx >= rect.width - rect.width * scale - 1e-9);
        prop_assert!(cy >= rect.height - rect.height * scale - 1e-9);
    }
}

proptest! {
    #[test]
    fn pan_clamp_centers_when_small(
        rect in rect_strategy(),
        scale in 0.5f64..=1.0,
        tx in -1e5f64..1e5,
        ty in -1e5f64..1e5,
    ) {
        let (cx, cy) = clamp_pan(rect, tx, ty, scale);
        prop_assert!((cx - (rect.width - rect.width * scale) / 2.0).abs() < 1e-9);
        prop_assert!((cy - (rect.height - rect.height * scale) / 2.0).abs() < 1e-9);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Zoom focus
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn zoom_keeps_focus_before_clamp(
        (rect, view) in view_strategy(),
        fx in 0.0f64..1.0,
        fy in 0.0f64..1.0,
        target in 0.5f64..6.0,
    ) {
        let focus = ScreenPoint::new(fx * rect.width, fy * rect.height);
        let before = view.screen_to_fraction(rect, focus).unwrap();
        let (tx, ty) = zoom_pan_at_cursor(focus, view.scale, target, view.translate_x, view.translate_y);
        let zoomed = ViewState { scale: target, translate_x: tx, translate_y: ty };
        let after = zoomed.screen_to_fraction(rect, focus).unwrap();
        prop_assert!((before.0 - after.0).abs() < 1e-9);
        prop_assert!((before.1 - after.1).abs() < 1e-9);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Bounds
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn wheel_stays_in_bounds(
        (rect, view) in view_strategy(),
        delta in -5000.0f64..5000.0,
        fx in 0.0f64..1.0,
        fy in 0.0f64..1.0,
    ) {
        let focus = ScreenPoint::new(fx * rect.width, fy * rect.height);
        let next = view.wheel_zoom(rect, focus, delta, 0.0015, bounds());
        prop_assert!(next.scale >= 0.5 && next.scale <= 6.0);
        prop_assert_eq!(next.clamped(rect), next);
    }
}

proptest! {
    #[test]
    fn center_on_stays_in_bounds(
        (rect, view) in view_strategy(),
        x in -500.0f64..1700.0,
        y in -500.0f64..1700.0,
        scale in proptest::option::of(0.0f64..20.0),
    ) {
        let next = view.center_on(rect, &WorldExtent::default(), x, y, scale, bounds());
        prop_assert!(next.scale >= 0.5 && next.scale <= 6.0);
        prop_assert_eq!(next.clamped(rect), next);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. Reset
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn reset_idempotent(rect in rect_strategy()) {
        let once = ViewState::reset(rect, bounds());
        let twice = ViewState::reset(rect, bounds());
        prop_assert_eq!(once, twice);
        prop_assert_eq!(once.clamped(rect), once);
        prop_assert_eq!(once.scale, 1.0);
    }
}
