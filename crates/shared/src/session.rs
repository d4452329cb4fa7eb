//! Map interaction state and its command handlers.
//!
//! `MapSession` owns everything the map view needs: configuration, view
//! transform, markers, selection, draft values and UI toggles. Each handler
//! takes the latest committed state and returns the list of things that
//! changed, so the caller only re-renders what it has to.
use tracing::{debug, warn};

use crate::config::{is_grid_step, MapConfig};
use crate::exchange::{export_markers, initial_markers, parse_markers};
use crate::grid::{snap, GridLine, WorldExtent};
use crate::models::{Marker, MarkerDraft, MarkerFilter, MarkerId, MarkerPatch};
use crate::overlap::{LayoutStrategy, OverlapResolver, RenderGeometry};
use crate::store::{IdSource, LegendEntry, MarkerStore};
use crate::viewport::{ContainerRect, ScreenPoint, ViewState, ZoomBounds};

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    ViewChanged(ViewState),
    MarkersChanged,
    SelectionChanged(Option<MarkerId>),
    BadgeMoved((f64, f64)),
    HoverMoved((f64, f64)),
    /// The zoom ceiling dropped below the current scale and the view was
    /// re-centered at the ceiling.
    Recentered { scale: f64 },
}

/// Raw "jump to coordinate" form input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JumpRequest {
    pub x: String,
    pub y: String,
    /// Empty for "keep the current zoom".
    pub zoom: String,
    /// Also drop a marker at the target.
    pub mark: bool,
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[derive(Debug, Clone, Copy)]
struct DragAnchor {
    pointer: ScreenPoint,
    view: ViewState,
}

pub struct MapSession {
    config: MapConfig,
    extent: WorldExtent,
    view: ViewState,
    rect: ContainerRect,
    ceiling: f64,
    strategy: LayoutStrategy,
    store: MarkerStore,
    selected: Option<MarkerId>,
    last_added: Option<MarkerId>,
    draft: MarkerDraft,
    filter: Option<MarkerFilter>,
    edit_mode: bool,
    pan_mode: bool,
    show_grid: bool,
    show_crosshair: bool,
    snap_enabled: bool,
    grid_step: f64,
    background_url: Option<String>,
    hover: Option<(f64, f64)>,
    badge: Option<(f64, f64)>,
    anchor: Option<DragAnchor>,
}

impl Default for MapSession {
    fn default() -> Self {
        MapSession::new(MapConfig::default())
    }
}

impl MapSession {
    pub fn new(config: MapConfig) -> Self {
        let config = config.validated();
        let store = MarkerStore::new(config.extent());
        Self::build(config, store)
    }

    /// Session whose new markers get their ids from `ids`.
    pub fn with_ids(config: MapConfig, ids: Box<dyn IdSource>) -> Self {
        let config = config.validated();
        let store = MarkerStore::with_ids(config.extent(), ids);
        Self::build(config, store)
    }

    fn build(config: MapConfig, store: MarkerStore) -> Self {
        let rect = ContainerRect::default();
        MapSession {
            extent: config.extent(),
            view: ViewState::reset(rect, config.bounds()),
            rect,
            ceiling: config.zoom_max,
            strategy: LayoutStrategy::default(),
            store,
            selected: None,
            last_added: None,
            draft: MarkerDraft::default(),
            filter: None,
            edit_mode: false,
            pan_mode: false,
            show_grid: true,
            show_crosshair: true,
            snap_enabled: config.snap_enabled,
            grid_step: config.grid_step,
            background_url: config.background_url.clone(),
            hover: None,
            badge: None,
            anchor: None,
            config,
        }
    }

    // --- state accessors ---

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn extent(&self) -> WorldExtent {
        self.extent
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn container(&self) -> ContainerRect {
        self.rect
    }

    /// Current zoom ceiling (the configured maximum unless the dynamic
    /// ceiling is enabled and tighter).
    pub fn ceiling(&self) -> f64 {
        self.ceiling
    }

    pub fn bounds(&self) -> ZoomBounds {
        self.config.bounds().with_ceiling(self.ceiling)
    }

    pub fn store(&self) -> &MarkerStore {
        &self.store
    }

    /// The selected marker id, if it still exists.
    pub fn selection(&self) -> Option<&MarkerId> {
        self.selected.as_ref().filter(|id| self.store.contains(id))
    }

    pub fn selected_marker(&self) -> Option<&Marker> {
        self.selection().and_then(|id| self.store.get(id))
    }

    pub fn draft(&self) -> &MarkerDraft {
        &self.draft
    }

    pub fn filter(&self) -> Option<&MarkerFilter> {
        self.filter.as_ref()
    }

    pub fn edit_mode(&self) -> bool {
        self.edit_mode
    }

    pub fn pan_mode(&self) -> bool {
        self.pan_mode
    }

    pub fn show_grid(&self) -> bool {
        self.show_grid
    }

    pub fn show_crosshair(&self) -> bool {
        self.show_crosshair
    }

    pub fn snap_enabled(&self) -> bool {
        self.snap_enabled
    }

    pub fn grid_step(&self) -> f64 {
        self.grid_step
    }

    /// Image drawn under the grid, if any.
    pub fn background_url(&self) -> Option<&str> {
        self.background_url.as_deref()
    }

    pub fn hover(&self) -> Option<(f64, f64)> {
        self.hover
    }

    pub fn badge(&self) -> Option<(f64, f64)> {
        self.badge
    }

    pub fn is_dragging(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn strategy(&self) -> LayoutStrategy {
        self.strategy
    }

    pub fn grid_lines(&self) -> Vec<GridLine> {
        self.extent.grid_lines(self.grid_step)
    }

    pub fn legend(&self) -> Vec<LegendEntry> {
        self.store.legend()
    }

    // --- derived rendering data ---

    pub fn visible_markers(&self) -> Vec<&Marker> {
        self.store.filtered(self.filter.as_ref())
    }

    /// Marker keeping its true position during layout: the selection, or the
    /// most recently added marker.
    pub fn pinned(&self) -> Option<&MarkerId> {
        self.selection()
            .or_else(|| self.last_added.as_ref().filter(|id| self.store.contains(id)))
    }

    pub fn layout(&self) -> Vec<RenderGeometry> {
        let resolver = OverlapResolver::new(&self.config, self.strategy);
        resolver.resolve_layout(&self.visible_markers(), &self.view, self.rect, self.pinned())
    }

    // --- internal helpers ---

    fn commit_view(&mut self, next: ViewState, effects: &mut Vec<Effect>) {
        if next != self.view {
            self.view = next;
            effects.push(Effect::ViewChanged(next));
        }
    }

    fn world_at(&self, p: ScreenPoint) -> Option<((f64, f64), bool)> {
        let (fx, fy) = self.view.screen_to_fraction(self.rect, p)?;
        let inside = (0.0..=1.0).contains(&fx) && (0.0..=1.0).contains(&fy);
        Some((self.extent.fraction_to_world(fx, fy), inside))
    }

    fn snapped(&self, (x, y): (f64, f64)) -> (f64, f64) {
        if self.snap_enabled {
            (snap(x, self.grid_step), snap(y, self.grid_step))
        } else {
            (x, y)
        }
    }

    /// Recompute the zoom ceiling and pull the view back under it.
    fn refresh_ceiling(&mut self, effects: &mut Vec<Effect>) {
        let ceiling = if self.config.dynamic_ceiling {
            let resolver = OverlapResolver::new(&self.config, self.strategy);
            resolver.compute_dynamic_max_scale(&self.visible_markers(), self.rect)
        } else {
            self.config.zoom_max
        };
        if ceiling != self.ceiling {
            debug!(from = self.ceiling, to = ceiling, "zoom ceiling changed");
            self.ceiling = ceiling;
        }

        let bounds = self.bounds();
        if self.view.scale > bounds.max {
            let (cx, cy) = self
                .view
                .center_world(self.rect, &self.extent)
                .unwrap_or((self.extent.max() / 2.0, self.extent.max() / 2.0));
            let next = self
                .view
                .center_on(self.rect, &self.extent, cx, cy, Some(bounds.max), bounds);
            if next != self.view {
                debug!(scale = next.scale, "view re-centered under zoom ceiling");
                self.commit_view(next, effects);
                effects.push(Effect::Recentered { scale: next.scale });
            }
        }
    }

    fn add_marker(&mut self, x: f64, y: f64, effects: &mut Vec<Effect>) {
        let id = self.store.add(&self.draft, x, y);
        self.last_added = Some(id);
        effects.push(Effect::MarkersChanged);
        self.refresh_ceiling(effects);
    }

    fn clear_selection(&mut self, effects: &mut Vec<Effect>) {
        if self.selected.take().is_some() {
            effects.push(Effect::SelectionChanged(None));
        }
    }

    // --- pointer handlers ---

    pub fn on_pointer_down(&mut self, p: ScreenPoint) -> Vec<Effect> {
        if self.pan_mode && p.is_finite() {
            self.anchor = Some(DragAnchor {
                pointer: p,
                view: self.view,
            });
        }
        Vec::new()
    }

    pub fn on_pointer_move(&mut self, p: ScreenPoint) -> Vec<Effect> {
        let mut effects = Vec::new();
        if let Some(anchor) = self.anchor {
            let next = self.view.panned_from(
                &anchor.view,
                p.x - anchor.pointer.x,
                p.y - anchor.pointer.y,
                self.rect,
            );
            self.commit_view(next, &mut effects);
            return effects;
        }

        if let Some((world, _)) = self.world_at(p) {
            let hover = self.snapped(world);
            if self.hover != Some(hover) {
                self.hover = Some(hover);
                effects.push(Effect::HoverMoved(hover));
            }
        }
        effects
    }

    pub fn on_pointer_up(&mut self) -> Vec<Effect> {
        self.anchor = None;
        Vec::new()
    }

    pub fn on_pointer_leave(&mut self) -> Vec<Effect> {
        self.anchor = None;
        Vec::new()
    }

    /// Wheel zoom anchored at `p`. `delta_y` must already be in pixels.
    pub fn on_wheel(&mut self, p: ScreenPoint, delta_y: f64) -> Vec<Effect> {
        let mut effects = Vec::new();
        let next = self
            .view
            .wheel_zoom(self.rect, p, delta_y, self.config.wheel_k, self.bounds());
        self.commit_view(next, &mut effects);
        effects
    }

    /// Click on the map background: move the badge and, in edit mode, add a
    /// marker with the draft values.
    pub fn on_map_click(&mut self, p: ScreenPoint) -> Vec<Effect> {
        let mut effects = Vec::new();
        let Some((world, inside)) = self.world_at(p) else {
            return effects;
        };
        let (x, y) = if self.snap_enabled {
            let (sx, sy) = self.snapped(world);
            self.extent.clamp_point(sx, sy)
        } else {
            world
        };
        self.badge = Some((x, y));
        effects.push(Effect::BadgeMoved((x, y)));

        if self.pan_mode || !self.edit_mode {
            return effects;
        }
        self.clear_selection(&mut effects);
        if !inside {
            return effects;
        }
        self.add_marker(x, y, &mut effects);
        effects
    }

    /// Edit mode only. Clicking the selected marker again deletes it.
    pub fn on_marker_click(&mut self, id: &MarkerId) -> Vec<Effect> {
        let mut effects = Vec::new();
        if !self.edit_mode {
            return effects;
        }
        if self.selection() == Some(id) {
            self.store.remove(id);
            self.selected = None;
            effects.push(Effect::MarkersChanged);
            effects.push(Effect::SelectionChanged(None));
            self.refresh_ceiling(&mut effects);
            return effects;
        }
        if let Some(m) = self.store.get(id) {
            self.draft = MarkerDraft::from(m);
            self.selected = Some(id.clone());
            effects.push(Effect::SelectionChanged(Some(id.clone())));
        }
        effects
    }

    // --- editing ---

    pub fn apply_to_selected(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        let Some(id) = self.selection().cloned() else {
            return effects;
        };
        if self.store.update(&id, &MarkerPatch::from(&self.draft)) {
            effects.push(Effect::MarkersChanged);
        }
        effects
    }

    pub fn delete_selected(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        let Some(id) = self.selection().cloned() else {
            return effects;
        };
        self.store.remove(&id);
        self.selected = None;
        effects.push(Effect::MarkersChanged);
        effects.push(Effect::SelectionChanged(None));
        self.refresh_ceiling(&mut effects);
        effects
    }

    pub fn set_draft_kind(&mut self, kind: impl Into<String>) {
        self.draft.kind = kind.into();
    }

    pub fn set_draft_number(&mut self, number: u32) {
        self.draft.number = number;
    }

    pub fn set_draft_label(&mut self, label: impl Into<String>) {
        self.draft.label = label.into();
    }

    pub fn set_filter(&mut self, filter: Option<MarkerFilter>) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.filter == filter {
            return effects;
        }
        self.filter = filter;
        effects.push(Effect::MarkersChanged);
        self.refresh_ceiling(&mut effects);
        effects
    }

    pub fn set_edit_mode(&mut self, on: bool) {
        self.edit_mode = on;
    }

    pub fn set_pan_mode(&mut self, on: bool) {
        self.pan_mode = on;
        if !on {
            self.anchor = None;
        }
    }

    pub fn set_show_grid(&mut self, on: bool) {
        self.show_grid = on;
    }

    pub fn set_show_crosshair(&mut self, on: bool) {
        self.show_crosshair = on;
    }

    pub fn set_snap(&mut self, on: bool) {
        self.snap_enabled = on;
    }

    /// Ignored unless `step` is at least `MIN_GRID_STEP`.
    pub fn set_grid_step(&mut self, step: f64) {
        if is_grid_step(step) {
            self.grid_step = step;
        }
    }

    /// Swap the map image. Returns the replaced URL so the caller can
    /// release it.
    pub fn set_background_url(&mut self, url: Option<String>) -> Option<String> {
        let url = url.filter(|u| !u.trim().is_empty());
        std::mem::replace(&mut self.background_url, url)
    }

    pub fn set_strategy(&mut self, strategy: LayoutStrategy) {
        self.strategy = strategy;
    }

    // --- view commands ---

    /// Center on a typed coordinate. Non-numeric x or y does nothing; an
    /// empty or non-numeric zoom keeps the current scale.
    pub fn jump_to(&mut self, req: &JumpRequest) -> Vec<Effect> {
        let mut effects = Vec::new();
        let (Some(x), Some(y)) = (parse_number(&req.x), parse_number(&req.y)) else {
            return effects;
        };
        let (x, y) = self.extent.clamp_point(x, y);
        let zoom = parse_number(&req.zoom);
        let next = self
            .view
            .center_on(self.rect, &self.extent, x, y, zoom, self.bounds());
        self.commit_view(next, &mut effects);
        self.badge = Some((x, y));
        effects.push(Effect::BadgeMoved((x, y)));
        if req.mark {
            self.add_marker(x, y, &mut effects);
        }
        effects
    }

    fn step_zoom(&mut self, target: f64) -> Vec<Effect> {
        let mut effects = Vec::new();
        let mid = self.extent.max() / 2.0;
        let next = self
            .view
            .center_on(self.rect, &self.extent, mid, mid, Some(target), self.bounds());
        self.commit_view(next, &mut effects);
        effects
    }

    pub fn zoom_in(&mut self) -> Vec<Effect> {
        self.step_zoom(self.view.scale * self.config.zoom_step)
    }

    pub fn zoom_out(&mut self) -> Vec<Effect> {
        self.step_zoom(self.view.scale / self.config.zoom_step)
    }

    pub fn reset_view(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        let next = ViewState::reset(self.rect, self.bounds());
        self.commit_view(next, &mut effects);
        effects
    }

    /// New container size from layout. Re-clamps the view and recomputes the
    /// ceiling.
    pub fn set_container(&mut self, rect: ContainerRect) -> Vec<Effect> {
        let mut effects = Vec::new();
        if rect == self.rect {
            return effects;
        }
        let first_measure = !self.rect.is_measured() && rect.is_measured();
        self.rect = rect;
        let next = if first_measure {
            ViewState::reset(rect, self.bounds())
        } else {
            self.view.clamped(rect)
        };
        self.commit_view(next, &mut effects);
        self.refresh_ceiling(&mut effects);
        effects
    }

    pub fn set_base_diameter(&mut self, diameter: f64) -> Vec<Effect> {
        let mut effects = Vec::new();
        if !(diameter.is_finite() && diameter > 0.0) {
            return effects;
        }
        self.config.marker_base_diameter_at_scale1 = diameter;
        effects.push(Effect::MarkersChanged);
        self.refresh_ceiling(&mut effects);
        effects
    }

    pub fn set_dynamic_ceiling(&mut self, on: bool) -> Vec<Effect> {
        let mut effects = Vec::new();
        self.config.dynamic_ceiling = on;
        self.refresh_ceiling(&mut effects);
        effects
    }

    // --- data ---

    /// Replace all markers from an imported JSON text. On error nothing changes.
    pub fn import_json(&mut self, text: &str) -> Result<Vec<Effect>, String> {
        let markers = parse_markers(text).map_err(|e| {
            warn!(error = %e, "marker import rejected");
            e
        })?;
        Ok(self.replace_markers(markers))
    }

    pub fn export_json(&self) -> Result<String, String> {
        export_markers(self.store.as_slice())
    }

    /// Seed the store from the initial fetch, falling back to the built-in marker.
    pub fn load_initial(&mut self, fetched: Result<Vec<Marker>, String>) -> Vec<Effect> {
        self.replace_markers(initial_markers(fetched))
    }

    pub fn replace_markers(&mut self, markers: Vec<Marker>) -> Vec<Effect> {
        let mut effects = Vec::new();
        let count = self.store.replace_all(markers);
        debug!(count, "markers replaced");
        self.last_added = None;
        effects.push(Effect::MarkersChanged);
        self.clear_selection(&mut effects);
        self.refresh_ceiling(&mut effects);
        effects
    }
}
