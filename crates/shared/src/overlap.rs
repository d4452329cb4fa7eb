//! Keeps markers legible as density and zoom change.
//!
//! Three strategies are available and can be combined:
//!
//! * dynamic size: the badge diameter follows the zoom level, shrunk further
//!   where neighbors are crowded,
//! * cluster ring: markers that visually touch are grouped and spread evenly
//!   on a ring around the group centroid,
//! * dynamic zoom ceiling: the largest scale at which no two badges overlap.
//!
//! All distances are measured in container pixels. World offsets are projected
//! per axis (`dx / max * width * scale`, `dy / max * height * scale`), so a
//! non-square container is handled correctly.
use std::f64::consts::PI;

use crate::config::MapConfig;
use crate::grid::WorldExtent;
use crate::models::{Marker, MarkerId};
use crate::viewport::{ContainerRect, ScreenPoint, ViewState};

/// Iterations for the ceiling search. Enough to pin `f64` scales well below
/// anything visible.
pub const CEILING_SEARCH_STEPS: usize = 24;

/// Ring radius relative to the largest member diameter.
const RING_RADIUS_FACTOR: f64 = 0.75;

const SHRINK_ONE_NEIGHBOR: f64 = 0.85;
const SHRINK_CROWDED: f64 = 0.7;
const CROWDED_NEIGHBORS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutStrategy {
    /// Base size, no offsets.
    Plain,
    DensityShrink,
    ClusterRing,
    /// Density shrink followed by ring layout.
    #[default]
    Combined,
}

impl LayoutStrategy {
    fn shrinks(&self) -> bool {
        matches!(self, LayoutStrategy::DensityShrink | LayoutStrategy::Combined)
    }

    fn rings(&self) -> bool {
        matches!(self, LayoutStrategy::ClusterRing | LayoutStrategy::Combined)
    }
}

/// Where and how large to draw one marker, in container pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderGeometry {
    pub id: MarkerId,
    /// Projected marker position before any offset.
    pub center_x: f64,
    pub center_y: f64,
    pub diameter: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl RenderGeometry {
    /// Final drawing position (center plus offset).
    pub fn position(&self) -> ScreenPoint {
        ScreenPoint::new(self.center_x + self.offset_x, self.center_y + self.offset_y)
    }

    pub fn is_displaced(&self) -> bool {
        self.offset_x != 0.0 || self.offset_y != 0.0
    }
}

fn distance(a: ScreenPoint, b: ScreenPoint) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

/// Union-find over marker indices.
struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        DisjointSet {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, i: usize) -> usize {
        let mut root = i;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut cur = i;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}

pub struct OverlapResolver<'a> {
    config: &'a MapConfig,
    extent: WorldExtent,
    strategy: LayoutStrategy,
}

impl<'a> OverlapResolver<'a> {
    pub fn new(config: &'a MapConfig, strategy: LayoutStrategy) -> Self {
        OverlapResolver {
            config,
            extent: config.extent(),
            strategy,
        }
    }

    /// Badge diameter at `scale`: grows with the square root of the zoom,
    /// clamped to the configured range.
    pub fn diameter(&self, scale: f64) -> f64 {
        let c = self.config;
        (c.marker_base_diameter_at_scale1 * scale.max(0.0).sqrt()).clamp(c.min_diameter, c.max_diameter)
    }

    /// Markers are near when their badges would visibly touch.
    pub fn min_separation(&self, size_a: f64, size_b: f64) -> f64 {
        size_a.max(size_b) * self.config.cluster_k
    }

    fn project(&self, view: &ViewState, rect: ContainerRect, m: &Marker) -> ScreenPoint {
        let (fx, fy) = self.extent.world_to_fraction(m.x, m.y);
        view.fraction_to_screen(rect, fx, fy)
    }

    /// Screen distance between two world points at `scale`, projected per axis.
    fn projected_distance(&self, rect: ContainerRect, scale: f64, a: &Marker, b: &Marker) -> f64 {
        let max = self.extent.max();
        let dx = (a.x - b.x).abs() / max * rect.width * scale;
        let dy = (a.y - b.y).abs() / max * rect.height * scale;
        (dx * dx + dy * dy).sqrt()
    }

    /// Compute per-marker size and offset for the current view.
    ///
    /// Clusters that contain `pinned` keep their true positions so the most
    /// recent interaction stays where the user put it.
    pub fn resolve_layout(
        &self,
        markers: &[&Marker],
        view: &ViewState,
        rect: ContainerRect,
        pinned: Option<&MarkerId>,
    ) -> Vec<RenderGeometry> {
        let base = self.diameter(view.scale);
        let centers: Vec<ScreenPoint> = markers
            .iter()
            .map(|m| self.project(view, rect, m))
            .collect();

        let mut out: Vec<RenderGeometry> = markers
            .iter()
            .zip(&centers)
            .map(|(m, c)| RenderGeometry {
                id: m.id.clone(),
                center_x: c.x,
                center_y: c.y,
                diameter: base,
                offset_x: 0.0,
                offset_y: 0.0,
            })
            .collect();

        if markers.len() < 2 || !rect.is_measured() || !view.is_finite() {
            return out;
        }

        if self.strategy.shrinks() {
            self.apply_density_shrink(&centers, &mut out);
        }
        if self.strategy.rings() {
            self.apply_rings(&centers, &mut out, pinned);
        }
        out
    }

    fn apply_density_shrink(&self, centers: &[ScreenPoint], out: &mut [RenderGeometry]) {
        let radius = self.config.neighbor_radius_px;
        for (i, geom) in out.iter_mut().enumerate() {
            let neighbors = centers
                .iter()
                .enumerate()
                .filter(|(j, c)| *j != i && distance(centers[i], **c) < radius)
                .count();
            let factor = if neighbors >= CROWDED_NEIGHBORS {
                SHRINK_CROWDED
            } else if neighbors >= 1 {
                SHRINK_ONE_NEIGHBOR
            } else {
                1.0
            };
            geom.diameter *= factor;
        }
    }

    /// Group markers into clusters of visually touching badges.
    ///
    /// Returned clusters keep input order, both across and within clusters.
    pub fn clusters(&self, centers: &[ScreenPoint], sizes: &[f64]) -> Vec<Vec<usize>> {
        let n = centers.len();
        let mut set = DisjointSet::new(n);
        for i in 0..n {
            for j in (i + 1)..n {
                if distance(centers[i], centers[j]) < self.min_separation(sizes[i], sizes[j]) {
                    set.union(i, j);
                }
            }
        }

        let mut roots: Vec<usize> = Vec::new();
        let mut groups: Vec<Vec<usize>> = Vec::new();
        for i in 0..n {
            let root = set.find(i);
            match roots.iter().position(|&r| r == root) {
                Some(g) => groups[g].push(i),
                None => {
                    roots.push(root);
                    groups.push(vec![i]);
                }
            }
        }
        groups
    }

    fn apply_rings(
        &self,
        centers: &[ScreenPoint],
        out: &mut [RenderGeometry],
        pinned: Option<&MarkerId>,
    ) {
        let sizes: Vec<f64> = out.iter().map(|g| g.diameter).collect();
        for cluster in self.clusters(centers, &sizes) {
            let n = cluster.len();
            if n < 2 {
                continue;
            }
            if let Some(pin) = pinned {
                if cluster.iter().any(|&i| &out[i].id == pin) {
                    continue;
                }
            }

            let cx = cluster.iter().map(|&i| centers[i].x).sum::<f64>() / n as f64;
            let cy = cluster.iter().map(|&i| centers[i].y).sum::<f64>() / n as f64;
            let max_d = cluster.iter().map(|&i| sizes[i]).fold(0.0, f64::max);
            let radius = ring_radius(max_d, n, self.config.cluster_k);

            for (slot, &i) in cluster.iter().enumerate() {
                let angle = 2.0 * PI * slot as f64 / n as f64;
                out[i].offset_x = cx + radius * angle.cos() - centers[i].x;
                out[i].offset_y = cy + radius * angle.sin() - centers[i].y;
            }
        }
    }

    /// True when every marker pair is at least `diameter(scale) + padding`
    /// apart on screen at `scale`.
    pub fn is_scale_non_overlapping(&self, markers: &[&Marker], rect: ContainerRect, scale: f64) -> bool {
        if markers.len() < 2 || !rect.is_measured() {
            return true;
        }
        let needed = self.diameter(scale) + self.config.ceiling_padding;
        for i in 0..markers.len() {
            for j in (i + 1)..markers.len() {
                if self.projected_distance(rect, scale, markers[i], markers[j]) < needed {
                    return false;
                }
            }
        }
        true
    }

    /// Largest scale in `[zoom_min, zoom_max]` at which no badges overlap,
    /// found by bisection.
    ///
    /// Returns `zoom_max` when the check passes there (always the case with
    /// fewer than two markers) and `zoom_min` when it fails even at the lower
    /// bound, e.g. for coincident markers.
    pub fn compute_dynamic_max_scale(&self, markers: &[&Marker], rect: ContainerRect) -> f64 {
        let bounds = self.config.bounds();
        if self.is_scale_non_overlapping(markers, rect, bounds.max) {
            return bounds.max;
        }
        if !self.is_scale_non_overlapping(markers, rect, bounds.min) {
            return bounds.min;
        }
        let mut lo = bounds.min;
        let mut hi = bounds.max;
        for _ in 0..CEILING_SEARCH_STEPS {
            let mid = (lo + hi) / 2.0;
            if self.is_scale_non_overlapping(markers, rect, mid) {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        lo
    }
}

/// Ring radius for `n` members: `0.75 * max_d`, widened when needed so that
/// neighboring slots stay at least `max_d * cluster_k` apart.
pub fn ring_radius(max_d: f64, n: usize, cluster_k: f64) -> f64 {
    let base = max_d * RING_RADIUS_FACTOR;
    if n < 2 {
        return base;
    }
    let chord_factor = 2.0 * (PI / n as f64).sin();
    base.max(max_d * cluster_k / chord_factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(id: u64, x: f64, y: f64) -> Marker {
        Marker {
            id: MarkerId::Num(id),
            x,
            y,
            kind: "堡壘".to_string(),
            number: 1,
            label: String::new(),
        }
    }

    fn rect() -> ContainerRect {
        ContainerRect::new(800.0, 800.0)
    }

    fn view() -> ViewState {
        ViewState::reset(rect(), MapConfig::default().bounds())
    }

    #[test]
    fn test_diameter_clamped() {
        let config = MapConfig::default();
        let r = OverlapResolver::new(&config, LayoutStrategy::Plain);
        assert_eq!(r.diameter(1.0), 36.0);
        assert_eq!(r.diameter(0.1), 14.0);
        assert_eq!(r.diameter(6.0), 48.0);
    }

    #[test]
    fn test_single_marker_plain_geometry() {
        let config = MapConfig::default();
        let r = OverlapResolver::new(&config, LayoutStrategy::Combined);
        let m = marker(1, 599.5, 599.5);
        let out = r.resolve_layout(&[&m], &view(), rect(), None);
        assert_eq!(out.len(), 1);
        assert!((out[0].center_x - 400.0).abs() < 1e-9);
        assert!((out[0].center_y - 400.0).abs() < 1e-9);
        assert_eq!(out[0].diameter, 36.0);
        assert!(!out[0].is_displaced());
    }

    #[test]
    fn test_unmeasured_rect_degrades() {
        let config = MapConfig::default();
        let r = OverlapResolver::new(&config, LayoutStrategy::Combined);
        let a = marker(1, 100.0, 100.0);
        let b = marker(2, 100.0, 100.0);
        let out = r.resolve_layout(&[&a, &b], &ViewState::default(), ContainerRect::default(), None);
        assert!(out.iter().all(|g| !g.is_displaced() && g.diameter == 36.0));
    }

    #[test]
    fn test_density_shrink_thresholds() {
        let config = MapConfig::default();
        let r = OverlapResolver::new(&config, LayoutStrategy::DensityShrink);
        // 1199 world units over 800 px: 30 units ~ 20 px
        let lone = marker(1, 1000.0, 1000.0);
        let pair_a = marker(2, 100.0, 100.0);
        let pair_b = marker(3, 130.0, 100.0);
        let crowd: Vec<Marker> = (0..4).map(|i| marker(10 + i, 500.0 + i as f64 * 5.0, 500.0)).collect();
        let mut all: Vec<&Marker> = vec![&lone, &pair_a, &pair_b];
        all.extend(crowd.iter());
        let out = r.resolve_layout(&all, &view(), rect(), None);
        assert_eq!(out[0].diameter, 36.0);
        assert!((out[1].diameter - 36.0 * 0.85).abs() < 1e-9);
        assert!((out[3].diameter - 36.0 * 0.7).abs() < 1e-9);
        assert!(out.iter().all(|g| !g.is_displaced()));
    }

    #[test]
    fn test_coincident_markers_form_ring() {
        let config = MapConfig::default();
        let r = OverlapResolver::new(&config, LayoutStrategy::ClusterRing);
        let ms: Vec<Marker> = (0..4).map(|i| marker(i, 300.0, 300.0)).collect();
        let refs: Vec<&Marker> = ms.iter().collect();
        let out = r.resolve_layout(&refs, &view(), rect(), None);

        let radius = ring_radius(36.0, 4, config.cluster_k);
        for g in &out {
            let len = (g.offset_x * g.offset_x + g.offset_y * g.offset_y).sqrt();
            assert!((len - radius).abs() < 1e-9);
        }
        // equal angular spacing
        for (i, g) in out.iter().enumerate() {
            let angle = 2.0 * PI * i as f64 / 4.0;
            assert!((g.offset_x - radius * angle.cos()).abs() < 1e-9);
            assert!((g.offset_y - radius * angle.sin()).abs() < 1e-9);
        }
    }

    #[test]
    fn test_ring_separation_for_large_cluster() {
        let config = MapConfig::default();
        let r = OverlapResolver::new(&config, LayoutStrategy::ClusterRing);
        let ms: Vec<Marker> = (0..9).map(|i| marker(i, 700.0, 200.0)).collect();
        let refs: Vec<&Marker> = ms.iter().collect();
        let out = r.resolve_layout(&refs, &view(), rect(), None);
        let min_sep = r.min_separation(36.0, 36.0);
        for i in 0..out.len() {
            for j in (i + 1)..out.len() {
                let d = distance(out[i].position(), out[j].position());
                assert!(d >= min_sep - 1e-9, "slots {} and {} too close: {}", i, j, d);
            }
        }
    }

    #[test]
    fn test_pinned_cluster_not_displaced() {
        let config = MapConfig::default();
        let r = OverlapResolver::new(&config, LayoutStrategy::ClusterRing);
        let a = marker(1, 300.0, 300.0);
        let b = marker(2, 300.0, 300.0);
        let c = marker(3, 900.0, 900.0);
        let d = marker(4, 900.0, 900.0);
        let out = r.resolve_layout(&[&a, &b, &c, &d], &view(), rect(), Some(&MarkerId::Num(2)));
        assert!(!out[0].is_displaced());
        assert!(!out[1].is_displaced());
        assert!(out[2].is_displaced());
        assert!(out[3].is_displaced());
    }

    #[test]
    fn test_far_markers_untouched() {
        let config = MapConfig::default();
        let r = OverlapResolver::new(&config, LayoutStrategy::Combined);
        let a = marker(1, 0.0, 0.0);
        let b = marker(2, 1199.0, 1199.0);
        let out = r.resolve_layout(&[&a, &b], &view(), rect(), None);
        assert!(out.iter().all(|g| !g.is_displaced() && g.diameter == 36.0));
    }

    #[test]
    fn test_clusters_are_transitive() {
        let config = MapConfig::default();
        let r = OverlapResolver::new(&config, LayoutStrategy::ClusterRing);
        let centers = [
            ScreenPoint::new(0.0, 0.0),
            ScreenPoint::new(20.0, 0.0),
            ScreenPoint::new(40.0, 0.0),
            ScreenPoint::new(400.0, 0.0),
        ];
        let sizes = [36.0; 4];
        let groups = r.clusters(&centers, &sizes);
        assert_eq!(groups, vec![vec![0, 1, 2], vec![3]]);
    }

    #[test]
    fn test_non_square_projection_per_axis() {
        let config = MapConfig::default();
        let r = OverlapResolver::new(&config, LayoutStrategy::Plain);
        let wide = ContainerRect::new(1600.0, 400.0);
        let a = marker(1, 0.0, 0.0);
        let b = marker(2, 0.0, 1199.0);
        let c = marker(3, 1199.0, 0.0);
        assert!((r.projected_distance(wide, 1.0, &a, &b) - 400.0).abs() < 1e-9);
        assert!((r.projected_distance(wide, 1.0, &a, &c) - 1600.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_marker_ceiling_is_zoom_max() {
        let config = MapConfig::default();
        let r = OverlapResolver::new(&config, LayoutStrategy::Combined);
        let m = marker(1, 10.0, 10.0);
        for s in [0.5, 1.0, 2.5, 6.0] {
            assert!(r.is_scale_non_overlapping(&[&m], rect(), s));
        }
        assert_eq!(r.compute_dynamic_max_scale(&[&m], rect()), config.zoom_max);
        assert_eq!(r.compute_dynamic_max_scale(&[], rect()), config.zoom_max);
    }

    #[test]
    fn test_ceiling_drops_for_close_markers() {
        let config = MapConfig::default();
        let r = OverlapResolver::new(&config, LayoutStrategy::Combined);
        let a = marker(1, 0.0, 0.0);
        let b = marker(2, 1199.0, 1199.0);
        let far = r.compute_dynamic_max_scale(&[&a, &b], rect());
        assert_eq!(far, config.zoom_max);

        let c = marker(3, 0.0, 0.0);
        let close = r.compute_dynamic_max_scale(&[&a, &b, &c], rect());
        assert!(close <= far);
        assert_eq!(close, config.zoom_min);

        // removing down to one marker restores the hard max
        assert_eq!(r.compute_dynamic_max_scale(&[&b], rect()), config.zoom_max);
    }

    #[test]
    fn test_ceiling_unmeasured_is_zoom_max() {
        let config = MapConfig::default();
        let r = OverlapResolver::new(&config, LayoutStrategy::Combined);
        let a = marker(1, 0.0, 0.0);
        let b = marker(2, 0.0, 0.0);
        assert_eq!(
            r.compute_dynamic_max_scale(&[&a, &b], ContainerRect::default()),
            config.zoom_max
        );
    }

    #[test]
    fn test_ring_radius_widens_for_many_members() {
        assert!((ring_radius(40.0, 2, 0.8) - 30.0).abs() < 1e-9);
        let r = ring_radius(40.0, 12, 0.8);
        assert!(r > 30.0);
        assert!((2.0 * r * (PI / 12.0).sin() - 32.0).abs() < 1e-9);
    }
}
