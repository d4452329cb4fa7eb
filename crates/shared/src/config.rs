use serde::{Deserialize, Serialize};

use crate::grid::{WorldExtent, DEFAULT_WORLD_MAX};
use crate::viewport::ZoomBounds;

pub const ZOOM_MIN: f64 = 0.5;
pub const ZOOM_MAX: f64 = 6.0;

/// Wheel sensitivity: `scale *= exp(-delta_y * WHEEL_K)`.
pub const WHEEL_K: f64 = 0.0015;

/// Factor applied by the zoom-in / zoom-out buttons.
pub const ZOOM_STEP: f64 = 1.2;

/// Grid spacings offered in the sidebar.
pub const GRID_STEPS: [u32; 5] = [10, 20, 25, 50, 100];

/// Smallest accepted grid spacing in world units.
pub const MIN_GRID_STEP: f64 = 1.0;

/// Tunable map behavior. Every field has a default, so a partial JSON object
/// (or an empty one) is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapConfig {
    pub world_max: f64,
    pub zoom_min: f64,
    pub zoom_max: f64,
    pub grid_step: f64,
    pub snap_enabled: bool,
    pub marker_base_diameter_at_scale1: f64,
    pub min_diameter: f64,
    pub max_diameter: f64,
    /// Screen radius used by the density shrink heuristic.
    pub neighbor_radius_px: f64,
    /// Markers closer than `max(size) * cluster_k` belong to the same cluster.
    pub cluster_k: f64,
    /// Cap the zoom at the largest scale where no badges overlap.
    pub dynamic_ceiling: bool,
    /// Extra screen gap required between markers by the zoom ceiling.
    pub ceiling_padding: f64,
    pub wheel_k: f64,
    pub zoom_step: f64,
    /// Map image drawn under the grid. `None` shows the blank grid.
    pub background_url: Option<String>,
}

impl Default for MapConfig {
    fn default() -> Self {
        MapConfig {
            world_max: DEFAULT_WORLD_MAX,
            zoom_min: ZOOM_MIN,
            zoom_max: ZOOM_MAX,
            grid_step: 50.0,
            snap_enabled: true,
            marker_base_diameter_at_scale1: 36.0,
            min_diameter: 14.0,
            max_diameter: 48.0,
            neighbor_radius_px: 40.0,
            cluster_k: 0.8,
            dynamic_ceiling: false,
            ceiling_padding: 4.0,
            wheel_k: WHEEL_K,
            zoom_step: ZOOM_STEP,
            background_url: None,
        }
    }
}

fn positive_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        fallback
    }
}

/// Grid spacing usable for line generation and snapping.
pub fn is_grid_step(step: f64) -> bool {
    step.is_finite() && step >= MIN_GRID_STEP
}

impl MapConfig {
    /// Repair values that would break the transform math: non-positive or
    /// non-finite sizes fall back to defaults and inverted ranges are swapped.
    pub fn validated(mut self) -> Self {
        let d = MapConfig::default();
        self.world_max = positive_or(self.world_max, d.world_max);
        self.zoom_min = positive_or(self.zoom_min, d.zoom_min);
        self.zoom_max = positive_or(self.zoom_max, d.zoom_max);
        if self.zoom_min > self.zoom_max {
            std::mem::swap(&mut self.zoom_min, &mut self.zoom_max);
        }
        if !is_grid_step(self.grid_step) {
            self.grid_step = d.grid_step;
        }
        self.marker_base_diameter_at_scale1 =
            positive_or(self.marker_base_diameter_at_scale1, d.marker_base_diameter_at_scale1);
        self.min_diameter = positive_or(self.min_diameter, d.min_diameter);
        self.max_diameter = positive_or(self.max_diameter, d.max_diameter);
        if self.min_diameter > self.max_diameter {
            std::mem::swap(&mut self.min_diameter, &mut self.max_diameter);
        }
        if !(self.neighbor_radius_px.is_finite() && self.neighbor_radius_px >= 0.0) {
            self.neighbor_radius_px = d.neighbor_radius_px;
        }
        self.cluster_k = positive_or(self.cluster_k, d.cluster_k);
        if !(self.ceiling_padding.is_finite() && self.ceiling_padding >= 0.0) {
            self.ceiling_padding = d.ceiling_padding;
        }
        self.wheel_k = positive_or(self.wheel_k, d.wheel_k);
        if !(self.zoom_step.is_finite() && self.zoom_step > 1.0) {
            self.zoom_step = d.zoom_step;
        }
        self.background_url = self
            .background_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        self
    }

    pub fn extent(&self) -> WorldExtent {
        WorldExtent::new(self.world_max).unwrap_or_default()
    }

    pub fn bounds(&self) -> ZoomBounds {
        ZoomBounds::new(self.zoom_min, self.zoom_max)
    }

    /// Parse a configuration document, applying defaults and validation.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let config: MapConfig =
            serde_json::from_str(json).map_err(|e| format!("Failed to parse map config: {}", e))?;
        Ok(config.validated())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_is_default() {
        let c = MapConfig::from_json("{}").unwrap();
        assert_eq!(c, MapConfig::default());
    }

    #[test]
    fn test_partial_override_camel_case() {
        let c = MapConfig::from_json(r#"{"worldMax": 999, "zoomMax": 4, "snapEnabled": false}"#)
            .unwrap();
        assert_eq!(c.world_max, 999.0);
        assert_eq!(c.zoom_max, 4.0);
        assert!(!c.snap_enabled);
        assert!(!c.dynamic_ceiling);
        assert_eq!(c.zoom_min, ZOOM_MIN);
        assert_eq!(c.extent().max(), 999.0);
    }

    #[test]
    fn test_validated_swaps_inverted_zoom() {
        let c = MapConfig {
            zoom_min: 8.0,
            zoom_max: 2.0,
            ..Default::default()
        }
        .validated();
        assert_eq!(c.zoom_min, 2.0);
        assert_eq!(c.zoom_max, 8.0);
    }

    #[test]
    fn test_validated_repairs_non_positive() {
        let c = MapConfig {
            world_max: 0.0,
            zoom_min: -1.0,
            wheel_k: f64::NAN,
            zoom_step: 0.9,
            ..Default::default()
        }
        .validated();
        assert_eq!(c.world_max, DEFAULT_WORLD_MAX);
        assert_eq!(c.zoom_min, ZOOM_MIN);
        assert_eq!(c.wheel_k, WHEEL_K);
        assert_eq!(c.zoom_step, ZOOM_STEP);
    }

    #[test]
    fn test_validated_floors_grid_step() {
        let c = MapConfig::from_json(r#"{"gridStep": 0.001}"#).unwrap();
        assert_eq!(c.grid_step, 50.0);
        assert_eq!(MapConfig::from_json(r#"{"gridStep": 0}"#).unwrap().grid_step, 50.0);
        assert_eq!(MapConfig::from_json(r#"{"gridStep": 1}"#).unwrap().grid_step, 1.0);
        assert!(c.extent().grid_lines(c.grid_step).len() < 100);
    }

    #[test]
    fn test_background_url() {
        let c = MapConfig::from_json(r#"{"backgroundUrl": "/static/images/map.svg"}"#).unwrap();
        assert_eq!(c.background_url.as_deref(), Some("/static/images/map.svg"));
        assert_eq!(MapConfig::from_json("{}").unwrap().background_url, None);
        assert_eq!(MapConfig::from_json(r#"{"backgroundUrl": "  "}"#).unwrap().background_url, None);
        assert_eq!(MapConfig::from_json(r#"{"backgroundUrl": null}"#).unwrap().background_url, None);
    }

    #[test]
    fn test_malformed_json_is_error() {
        assert!(MapConfig::from_json("42").is_err());
        assert!(MapConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_bounds_from_config() {
        let b = MapConfig::default().bounds();
        assert_eq!(b.min, ZOOM_MIN);
        assert_eq!(b.max, ZOOM_MAX);
    }
}
