//! World coordinate system.
//!
//! The world is a square grid `[0, max]` on both axes with the origin at the
//! bottom-left. Screen-side code works in viewport fractions instead, where
//! `(0, 0)` is the top-left corner of the content and `(1, 1)` the bottom-right.

/// Default world edge (coordinates run 0..=1199).
pub const DEFAULT_WORLD_MAX: f64 = 1199.0;

/// Grid lines on multiples of this are drawn heavier.
pub const MAJOR_LINE_EVERY: f64 = 100.0;

/// World coordinate of the emphasized center cross.
pub const CENTER_LINE: f64 = 600.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldExtent {
    max: f64,
}

impl Default for WorldExtent {
    fn default() -> Self {
        Self {
            max: DEFAULT_WORLD_MAX,
        }
    }
}

impl WorldExtent {
    /// Returns `None` unless `max` is finite and strictly positive.
    pub fn new(max: f64) -> Option<Self> {
        if max.is_finite() && max > 0.0 {
            Some(Self { max })
        } else {
            None
        }
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Convert world coordinates to viewport fractions (y flipped).
    pub fn world_to_fraction(&self, x: f64, y: f64) -> (f64, f64) {
        (x / self.max, (self.max - y) / self.max)
    }

    /// Convert viewport fractions (y measured from the top) to world coordinates,
    /// rounded to whole units.
    pub fn fraction_to_world(&self, fx: f64, fy_from_top: f64) -> (f64, f64) {
        (
            (fx * self.max).round(),
            ((1.0 - fy_from_top) * self.max).round(),
        )
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        (0.0..=self.max).contains(&x) && (0.0..=self.max).contains(&y)
    }

    /// Clamp a point into `[0, max]` on both axes.
    pub fn clamp_point(&self, x: f64, y: f64) -> (f64, f64) {
        (x.clamp(0.0, self.max), y.clamp(0.0, self.max))
    }

    /// Vertical and horizontal grid lines for a given step.
    ///
    /// Lines are emitted for `0, step, 2*step, ..` up to `max`, followed by the
    /// two center lines. Positions are viewport fractions so the renderer can
    /// draw them straight into a `0..100` viewBox.
    pub fn grid_lines(&self, step: f64) -> Vec<GridLine> {
        let mut lines = Vec::new();
        if !(step.is_finite() && step > 0.0) {
            return lines;
        }

        let count = (self.max / step).floor() as usize;
        for i in 0..=count {
            let w = i as f64 * step;
            let major = w % MAJOR_LINE_EVERY == 0.0;
            let (fx, _) = self.world_to_fraction(w, 0.0);
            lines.push(GridLine {
                axis: GridAxis::Vertical,
                world: w,
                fraction: fx,
                weight: if major { LineWeight::Major } else { LineWeight::Minor },
            });
        }
        for i in 0..=count {
            let w = i as f64 * step;
            let major = w % MAJOR_LINE_EVERY == 0.0;
            let (_, fy) = self.world_to_fraction(0.0, w);
            lines.push(GridLine {
                axis: GridAxis::Horizontal,
                world: w,
                fraction: fy,
                weight: if major { LineWeight::Major } else { LineWeight::Minor },
            });
        }

        if CENTER_LINE <= self.max {
            let (fx, fy) = self.world_to_fraction(CENTER_LINE, CENTER_LINE);
            lines.push(GridLine {
                axis: GridAxis::Vertical,
                world: CENTER_LINE,
                fraction: fx,
                weight: LineWeight::Center,
            });
            lines.push(GridLine {
                axis: GridAxis::Horizontal,
                world: CENTER_LINE,
                fraction: fy,
                weight: LineWeight::Center,
            });
        }

        lines
    }
}

/// Round `value` to the nearest multiple of `step`. Non-positive steps disable snapping.
pub fn snap(value: f64, step: f64) -> f64 {
    if step.is_finite() && step > 0.0 {
        (value / step).round() * step
    } else {
        value
    }
}

/// Format a world point the way badges and the crosshair display it, e.g. "(597, 597)".
pub fn format_coord(x: f64, y: f64) -> String {
    format!("({}, {})", x.round() as i64, y.round() as i64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridAxis {
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineWeight {
    Minor,
    Major,
    Center,
}

impl LineWeight {
    pub fn stroke_width(&self) -> f64 {
        match self {
            LineWeight::Minor => 1.0,
            LineWeight::Major => 1.5,
            LineWeight::Center => 2.0,
        }
    }

    pub fn stroke(&self) -> &'static str {
        match self {
            LineWeight::Minor | LineWeight::Major => "rgba(255,255,255,0.25)",
            LineWeight::Center => "rgba(255,255,255,0.55)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLine {
    pub axis: GridAxis,
    pub world: f64,
    /// Position as a viewport fraction (x for vertical lines, y-from-top for horizontal).
    pub fraction: f64,
    pub weight: LineWeight,
}
