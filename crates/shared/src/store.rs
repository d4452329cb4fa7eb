use tracing::warn;

use crate::grid::WorldExtent;
use crate::models::{Marker, MarkerDraft, MarkerFilter, MarkerId, MarkerPatch};

/// Source of fresh marker ids.
pub trait IdSource {
    fn next_id(&mut self) -> MarkerId;

    /// Tell the source about an id that entered the store from elsewhere, so
    /// it is never handed out again.
    fn observe(&mut self, _id: &MarkerId) {}
}

/// Monotonic numeric ids starting at 1.
#[derive(Debug, Clone)]
pub struct CounterIds {
    next: u64,
}

impl Default for CounterIds {
    fn default() -> Self {
        CounterIds { next: 1 }
    }
}

impl IdSource for CounterIds {
    fn next_id(&mut self) -> MarkerId {
        let id = self.next;
        self.next += 1;
        MarkerId::Num(id)
    }

    fn observe(&mut self, id: &MarkerId) {
        if let MarkerId::Num(n) = id {
            if *n >= self.next {
                self.next = n.saturating_add(1);
            }
        }
    }
}

#[cfg(feature = "uuid-support")]
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIds;

#[cfg(feature = "uuid-support")]
impl IdSource for UuidIds {
    fn next_id(&mut self) -> MarkerId {
        MarkerId::Text(uuid::Uuid::new_v4().to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub kind: String,
    pub numbers: Vec<u32>,
}

/// Ordered marker collection keyed by id. Insertion order is render order.
pub struct MarkerStore {
    markers: Vec<Marker>,
    extent: WorldExtent,
    ids: Box<dyn IdSource>,
}

impl Default for MarkerStore {
    fn default() -> Self {
        MarkerStore::new(WorldExtent::default())
    }
}

impl MarkerStore {
    pub fn new(extent: WorldExtent) -> Self {
        MarkerStore::with_ids(extent, Box::new(CounterIds::default()))
    }

    pub fn with_ids(extent: WorldExtent, ids: Box<dyn IdSource>) -> Self {
        MarkerStore {
            markers: Vec::new(),
            extent,
            ids,
        }
    }

    pub fn extent(&self) -> WorldExtent {
        self.extent
    }

    fn fresh_id(&mut self) -> MarkerId {
        loop {
            let id = self.ids.next_id();
            if !self.contains(&id) {
                return id;
            }
        }
    }

    /// Append a marker built from `draft` at `(x, y)`, clamped into the world.
    pub fn add(&mut self, draft: &MarkerDraft, x: f64, y: f64) -> MarkerId {
        let (x, y) = self.extent.clamp_point(x, y);
        let id = self.fresh_id();
        self.markers.push(Marker {
            id: id.clone(),
            x,
            y,
            kind: draft.kind.clone(),
            number: draft.number,
            label: draft.label.clone(),
        });
        id
    }

    /// Apply `patch` to the marker with `id`. Returns false when it does not exist.
    pub fn update(&mut self, id: &MarkerId, patch: &MarkerPatch) -> bool {
        let Some(m) = self.markers.iter_mut().find(|m| &m.id == id) else {
            return false;
        };
        if let Some(kind) = &patch.kind {
            m.kind = kind.clone();
        }
        if let Some(number) = patch.number {
            m.number = number;
        }
        if let Some(label) = &patch.label {
            m.label = label.clone();
        }
        true
    }

    pub fn remove(&mut self, id: &MarkerId) -> Option<Marker> {
        let idx = self.markers.iter().position(|m| &m.id == id)?;
        Some(self.markers.remove(idx))
    }

    /// Replace the whole collection. Coordinates are clamped into the world
    /// and only the first marker of each id is kept. Returns the stored count.
    pub fn replace_all(&mut self, markers: Vec<Marker>) -> usize {
        let mut kept: Vec<Marker> = Vec::with_capacity(markers.len());
        let mut dropped = 0usize;
        for mut m in markers {
            if kept.iter().any(|k| k.id == m.id) {
                dropped += 1;
                continue;
            }
            let (x, y) = self.extent.clamp_point(m.x, m.y);
            m.x = x;
            m.y = y;
            self.ids.observe(&m.id);
            kept.push(m);
        }
        if dropped > 0 {
            warn!(dropped, "duplicate marker ids dropped");
        }
        self.markers = kept;
        self.markers.len()
    }

    pub fn get(&self, id: &MarkerId) -> Option<&Marker> {
        self.markers.iter().find(|m| &m.id == id)
    }

    pub fn contains(&self, id: &MarkerId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Marker> {
        self.markers.iter()
    }

    pub fn as_slice(&self) -> &[Marker] {
        &self.markers
    }

    pub fn last(&self) -> Option<&Marker> {
        self.markers.last()
    }

    pub fn filter<F>(&self, predicate: F) -> Vec<&Marker>
    where
        F: Fn(&Marker) -> bool,
    {
        self.markers.iter().filter(|m| predicate(m)).collect()
    }

    /// Markers matching `filter`, or all of them when there is none.
    pub fn filtered(&self, filter: Option<&MarkerFilter>) -> Vec<&Marker> {
        match filter {
            Some(f) => self.filter(|m| f.matches(m)),
            None => self.markers.iter().collect(),
        }
    }

    /// Types in first-seen order, each with its distinct numbers sorted.
    pub fn legend(&self) -> Vec<LegendEntry> {
        let mut entries: Vec<LegendEntry> = Vec::new();
        for m in &self.markers {
            match entries.iter_mut().find(|e| e.kind == m.kind) {
                Some(e) => {
                    if !e.numbers.contains(&m.number) {
                        e.numbers.push(m.number);
                    }
                }
                None => entries.push(LegendEntry {
                    kind: m.kind.clone(),
                    numbers: vec![m.number],
                }),
            }
        }
        for e in &mut entries {
            e.numbers.sort_unstable();
        }
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(kind: &str, number: u32) -> MarkerDraft {
        MarkerDraft {
            kind: kind.to_string(),
            number,
            label: String::new(),
        }
    }

    fn marker(id: MarkerId, x: f64, y: f64, kind: &str, number: u32) -> Marker {
        Marker {
            id,
            x,
            y,
            kind: kind.to_string(),
            number,
            label: String::new(),
        }
    }

    #[test]
    fn test_add_assigns_increasing_ids() {
        let mut store = MarkerStore::default();
        let a = store.add(&draft("堡壘", 1), 10.0, 10.0);
        let b = store.add(&draft("堡壘", 2), 20.0, 20.0);
        assert_eq!(a, MarkerId::Num(1));
        assert_eq!(b, MarkerId::Num(2));
        assert_eq!(store.len(), 2);
        assert_eq!(store.last().unwrap().id, b);
    }

    #[test]
    fn test_add_clamps_into_world() {
        let mut store = MarkerStore::default();
        let id = store.add(&MarkerDraft::default(), -30.0, 5000.0);
        let m = store.get(&id).unwrap();
        assert_eq!((m.x, m.y), (0.0, 1199.0));
    }

    #[test]
    fn test_ids_never_reused_after_remove() {
        let mut store = MarkerStore::default();
        let a = store.add(&MarkerDraft::default(), 1.0, 1.0);
        assert!(store.remove(&a).is_some());
        let b = store.add(&MarkerDraft::default(), 1.0, 1.0);
        assert_ne!(a, b);
    }

    #[test]
    fn test_update_missing_is_noop() {
        let mut store = MarkerStore::default();
        let patch = MarkerPatch {
            number: Some(9),
            ..Default::default()
        };
        assert!(!store.update(&MarkerId::Num(42), &patch));
        assert!(store.is_empty());
    }

    #[test]
    fn test_update_applies_only_given_fields() {
        let mut store = MarkerStore::default();
        let mut d = draft("要塞", 3);
        d.label = "north".to_string();
        let id = store.add(&d, 100.0, 100.0);
        let patch = MarkerPatch {
            number: Some(7),
            ..Default::default()
        };
        assert!(store.update(&id, &patch));
        let m = store.get(&id).unwrap();
        assert_eq!(m.number, 7);
        assert_eq!(m.kind, "要塞");
        assert_eq!(m.label, "north");
    }

    #[test]
    fn test_remove_missing_returns_none() {
        let mut store = MarkerStore::default();
        assert!(store.remove(&MarkerId::from("nope")).is_none());
    }

    #[test]
    fn test_replace_all_dedups_and_clamps() {
        let mut store = MarkerStore::default();
        let n = store.replace_all(vec![
            marker(MarkerId::Num(5), 2000.0, -1.0, "堡壘", 1),
            marker(MarkerId::Num(5), 10.0, 10.0, "要塞", 2),
            marker(MarkerId::from("sun_city"), 597.0, 597.0, "雪原總部", 1),
        ]);
        assert_eq!(n, 2);
        let first = store.get(&MarkerId::Num(5)).unwrap();
        assert_eq!((first.x, first.y), (1199.0, 0.0));
        assert_eq!(first.kind, "堡壘");
    }

    #[test]
    fn test_replace_all_advances_counter() {
        let mut store = MarkerStore::default();
        store.replace_all(vec![marker(MarkerId::Num(1717), 1.0, 1.0, "堡壘", 1)]);
        let id = store.add(&MarkerDraft::default(), 1.0, 1.0);
        assert_eq!(id, MarkerId::Num(1718));
    }

    #[test]
    fn test_signed_ids_leave_counter_alone() {
        let mut store = MarkerStore::default();
        let neg: MarkerId = serde_json::from_str("-3").unwrap();
        let frac: MarkerId = serde_json::from_str("1.5").unwrap();
        store.replace_all(vec![
            marker(neg.clone(), 1.0, 1.0, "堡壘", 1),
            marker(frac.clone(), 2.0, 2.0, "堡壘", 1),
        ]);
        assert!(store.contains(&neg));
        assert!(store.contains(&frac));
        let id = store.add(&MarkerDraft::default(), 1.0, 1.0);
        assert_eq!(id, MarkerId::Num(1));
    }

    #[test]
    fn test_filtered() {
        let mut store = MarkerStore::default();
        store.add(&draft("堡壘", 1), 1.0, 1.0);
        store.add(&draft("堡壘", 2), 1.0, 1.0);
        store.add(&draft("要塞", 1), 1.0, 1.0);
        let f = MarkerFilter {
            kind: "堡壘".to_string(),
            number: 2,
        };
        assert_eq!(store.filtered(Some(&f)).len(), 1);
        assert_eq!(store.filtered(None).len(), 3);
        assert_eq!(store.filter(|m| m.number == 1).len(), 2);
    }

    #[test]
    fn test_legend_first_seen_order_sorted_numbers() {
        let mut store = MarkerStore::default();
        store.add(&draft("要塞", 3), 1.0, 1.0);
        store.add(&draft("堡壘", 2), 1.0, 1.0);
        store.add(&draft("要塞", 1), 1.0, 1.0);
        store.add(&draft("要塞", 3), 1.0, 1.0);
        let legend = store.legend();
        assert_eq!(
            legend,
            vec![
                LegendEntry {
                    kind: "要塞".to_string(),
                    numbers: vec![1, 3],
                },
                LegendEntry {
                    kind: "堡壘".to_string(),
                    numbers: vec![2],
                },
            ]
        );
    }

    #[cfg(feature = "uuid-support")]
    #[test]
    fn test_uuid_ids() {
        let mut store = MarkerStore::with_ids(WorldExtent::default(), Box::new(UuidIds));
        let a = store.add(&MarkerDraft::default(), 1.0, 1.0);
        let b = store.add(&MarkerDraft::default(), 1.0, 1.0);
        assert_ne!(a, b);
        assert!(matches!(a, MarkerId::Text(ref s) if s.len() == 36));
    }
}
