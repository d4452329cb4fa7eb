//! Pan/zoom state of the map view.
//!
//! The content layer is the container-sized map, transformed with
//! `translate(tx, ty) scale(scale)` and `transform-origin: 0 0`. A content point
//! at fraction `(fx, fy)` therefore lands on screen at
//! `(tx + fx * width * scale, ty + fy * height * scale)`.
use serde::{Deserialize, Serialize};

use crate::grid::WorldExtent;

/// Size of the map container in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ContainerRect {
    pub width: f64,
    pub height: f64,
}

impl ContainerRect {
    pub fn new(width: f64, height: f64) -> Self {
        ContainerRect { width, height }
    }

    /// False until layout has produced a real, non-empty size.
    pub fn is_measured(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    pub fn center(&self) -> ScreenPoint {
        ScreenPoint::new(self.width / 2.0, self.height / 2.0)
    }
}

/// A point relative to the container's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        ScreenPoint { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomBounds {
    pub min: f64,
    pub max: f64,
}

impl ZoomBounds {
    pub fn new(min: f64, max: f64) -> Self {
        if min <= max {
            ZoomBounds { min, max }
        } else {
            ZoomBounds { min: max, max: min }
        }
    }

    pub fn clamp(&self, scale: f64) -> f64 {
        scale.clamp(self.min, self.max)
    }

    /// Tighten the upper bound to a dynamic ceiling, never below `min`.
    pub fn with_ceiling(&self, ceiling: f64) -> Self {
        if !ceiling.is_finite() {
            return *self;
        }
        ZoomBounds {
            min: self.min,
            max: ceiling.clamp(self.min, self.max),
        }
    }
}

/// Clamp a candidate translation so the content never exposes background.
///
/// At `scale <= 1` the content fits inside the container and is centered.
/// Above 1 the content must cover the container, so `tx` is restricted to
/// `[width - content_width, 0]` (same for `ty`). Unmeasured containers return
/// the candidate untouched.
pub fn clamp_pan(rect: ContainerRect, tx: f64, ty: f64, scale: f64) -> (f64, f64) {
    if !rect.is_measured() || !scale.is_finite() {
        return (tx, ty);
    }
    let content_w = rect.width * scale;
    let content_h = rect.height * scale;
    if scale <= 1.0 {
        return ((rect.width - content_w) / 2.0, (rect.height - content_h) / 2.0);
    }
    let min_tx = rect.width - content_w;
    let min_ty = rect.height - content_h;
    (tx.clamp(min_tx, 0.0), ty.clamp(min_ty, 0.0))
}

/// Compute new translation so that `focus` stays over the same content point
/// when zooming from `old_scale` to `new_scale`.
pub fn zoom_pan_at_cursor(
    focus: ScreenPoint,
    old_scale: f64,
    new_scale: f64,
    old_tx: f64,
    old_ty: f64,
) -> (f64, f64) {
    let s = new_scale / old_scale;
    (
        focus.x - s * (focus.x - old_tx),
        focus.y - s * (focus.y - old_ty),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub scale: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            scale: 1.0,
            translate_x: 0.0,
            translate_y: 0.0,
        }
    }
}

impl ViewState {
    pub fn is_finite(&self) -> bool {
        self.scale.is_finite()
            && self.scale > 0.0
            && self.translate_x.is_finite()
            && self.translate_y.is_finite()
    }

    /// Re-apply the pan clamp for `rect`.
    pub fn clamped(&self, rect: ContainerRect) -> ViewState {
        let (tx, ty) = clamp_pan(rect, self.translate_x, self.translate_y, self.scale);
        ViewState {
            scale: self.scale,
            translate_x: tx,
            translate_y: ty,
        }
    }

    /// Zoom to `target_scale` keeping the content under `focus` in place.
    pub fn zoom_at(
        &self,
        rect: ContainerRect,
        focus: ScreenPoint,
        target_scale: f64,
        bounds: ZoomBounds,
    ) -> ViewState {
        if !rect.is_measured() || !focus.is_finite() || !target_scale.is_finite() || !self.is_finite() {
            return *self;
        }
        let scale = bounds.clamp(target_scale);
        let (tx, ty) = zoom_pan_at_cursor(focus, self.scale, scale, self.translate_x, self.translate_y);
        let (tx, ty) = clamp_pan(rect, tx, ty, scale);
        ViewState {
            scale,
            translate_x: tx,
            translate_y: ty,
        }
    }

    /// Exponential wheel response: `scale * exp(-delta_y * k)`.
    pub fn wheel_zoom(
        &self,
        rect: ContainerRect,
        focus: ScreenPoint,
        delta_y: f64,
        k: f64,
        bounds: ZoomBounds,
    ) -> ViewState {
        if !delta_y.is_finite() {
            return *self;
        }
        let factor = (-delta_y * k).exp();
        self.zoom_at(rect, focus, self.scale * factor, bounds)
    }

    /// Translate by a drag delta measured from the view at drag start.
    pub fn panned_from(&self, anchor: &ViewState, dx: f64, dy: f64, rect: ContainerRect) -> ViewState {
        if !rect.is_measured() || !dx.is_finite() || !dy.is_finite() {
            return *self;
        }
        let (tx, ty) = clamp_pan(
            rect,
            anchor.translate_x + dx,
            anchor.translate_y + dy,
            self.scale,
        );
        ViewState {
            scale: self.scale,
            translate_x: tx,
            translate_y: ty,
        }
    }

    /// Place world point `(x, y)` at the container center, optionally at a new scale.
    pub fn center_on(
        &self,
        rect: ContainerRect,
        extent: &WorldExtent,
        x: f64,
        y: f64,
        scale: Option<f64>,
        bounds: ZoomBounds,
    ) -> ViewState {
        if !rect.is_measured() || !x.is_finite() || !y.is_finite() {
            return *self;
        }
        let s = match scale {
            Some(s) if s.is_finite() => bounds.clamp(s),
            _ => bounds.clamp(self.scale),
        };
        let (fx, fy) = extent.world_to_fraction(x, y);
        let (tx, ty) = clamp_pan(
            rect,
            rect.width / 2.0 - s * fx * rect.width,
            rect.height / 2.0 - s * fy * rect.height,
            s,
        );
        ViewState {
            scale: s,
            translate_x: tx,
            translate_y: ty,
        }
    }

    /// Canonical view: scale 1 (inside bounds), centered.
    pub fn reset(rect: ContainerRect, bounds: ZoomBounds) -> ViewState {
        let scale = bounds.clamp(1.0);
        let (tx, ty) = clamp_pan(rect, 0.0, 0.0, scale);
        ViewState {
            scale,
            translate_x: tx,
            translate_y: ty,
        }
    }

    /// Content fraction under a container point (y from the top). `None` until
    /// the container is measured.
    pub fn screen_to_fraction(&self, rect: ContainerRect, p: ScreenPoint) -> Option<(f64, f64)> {
        if !rect.is_measured() || !self.is_finite() || !p.is_finite() {
            return None;
        }
        let lx = (p.x - self.translate_x) / self.scale;
        let ly = (p.y - self.translate_y) / self.scale;
        Some((lx / rect.width, ly / rect.height))
    }

    /// Container point for a content fraction.
    pub fn fraction_to_screen(&self, rect: ContainerRect, fx: f64, fy: f64) -> ScreenPoint {
        ScreenPoint::new(
            self.translate_x + fx * rect.width * self.scale,
            self.translate_y + fy * rect.height * self.scale,
        )
    }

    /// World point currently under the container center.
    pub fn center_world(&self, rect: ContainerRect, extent: &WorldExtent) -> Option<(f64, f64)> {
        let (fx, fy) = self.screen_to_fraction(rect, rect.center())?;
        let m = extent.max();
        Some((fx * m, (1.0 - fy) * m))
    }
}
