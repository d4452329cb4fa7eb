use serde::{Deserialize, Serialize};
#[cfg(feature = "uuid-support")]
use uuid::Uuid;

/// Marker identifier. Imported files carry either numeric or string ids.
/// Generated ids are always `Num`; negative or fractional numbers from
/// imported files are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MarkerId {
    Num(u64),
    Other(serde_json::Number),
    Text(String),
}

impl std::fmt::Display for MarkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarkerId::Num(n) => write!(f, "{}", n),
            MarkerId::Other(n) => write!(f, "{}", n),
            MarkerId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<u64> for MarkerId {
    fn from(n: u64) -> Self {
        MarkerId::Num(n)
    }
}

impl From<&str> for MarkerId {
    fn from(s: &str) -> Self {
        MarkerId::Text(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: MarkerId,
    pub x: f64,
    pub y: f64,
    #[serde(rename = "type")]
    pub kind: String,
    pub number: u32,
    #[serde(default)]
    pub label: String,
}

impl Marker {
    /// The marker shown when no initial data could be loaded.
    pub fn fallback() -> Self {
        Marker {
            id: MarkerId::Text("sun_city".to_string()),
            x: 597.0,
            y: 597.0,
            kind: "雪原總部".to_string(),
            number: 1,
            label: "太陽城".to_string(),
        }
    }

    pub fn category(&self) -> Option<&'static MarkerCategory> {
        category(&self.kind)
    }

    pub fn color(&self) -> BadgeColor {
        self.category().map(|c| c.color).unwrap_or(BadgeColor::Gray)
    }
}

/// Pending values used for the next add or apply.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerDraft {
    pub kind: String,
    pub number: u32,
    pub label: String,
}

impl Default for MarkerDraft {
    fn default() -> Self {
        MarkerDraft {
            kind: CATEGORIES[0].key.to_string(),
            number: 1,
            label: String::new(),
        }
    }
}

impl From<&Marker> for MarkerDraft {
    fn from(m: &Marker) -> Self {
        MarkerDraft {
            kind: m.kind.clone(),
            number: m.number,
            label: m.label.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerPatch {
    pub kind: Option<String>,
    pub number: Option<u32>,
    pub label: Option<String>,
}

impl From<&MarkerDraft> for MarkerPatch {
    fn from(d: &MarkerDraft) -> Self {
        MarkerPatch {
            kind: Some(d.kind.clone()),
            number: Some(d.number),
            label: Some(d.label.clone()),
        }
    }
}

/// Show only markers of one `(type, number)` combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerFilter {
    #[serde(rename = "type")]
    pub kind: String,
    pub number: u32,
}

impl MarkerFilter {
    pub fn matches(&self, marker: &Marker) -> bool {
        marker.kind == self.kind && marker.number == self.number
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeColor {
    Blue,
    Green,
    Yellow,
    Purple,
    Orange,
    Pink,
    Red,
    Teal,
    Indigo,
    Slate,
    Cyan,
    Gray,
}

impl BadgeColor {
    pub fn name(&self) -> &'static str {
        match self {
            BadgeColor::Blue => "blue",
            BadgeColor::Green => "green",
            BadgeColor::Yellow => "yellow",
            BadgeColor::Purple => "purple",
            BadgeColor::Orange => "orange",
            BadgeColor::Pink => "pink",
            BadgeColor::Red => "red",
            BadgeColor::Teal => "teal",
            BadgeColor::Indigo => "indigo",
            BadgeColor::Slate => "slate",
            BadgeColor::Cyan => "cyan",
            BadgeColor::Gray => "gray",
        }
    }

    pub fn fill(&self) -> &'static str {
        match self {
            BadgeColor::Blue => "#3b82f6",
            BadgeColor::Green => "#22c55e",
            BadgeColor::Yellow => "#facc15",
            BadgeColor::Purple => "#a855f7",
            BadgeColor::Orange => "#f97316",
            BadgeColor::Pink => "#ec4899",
            BadgeColor::Red => "#ef4444",
            BadgeColor::Teal => "#14b8a6",
            BadgeColor::Indigo => "#6366f1",
            BadgeColor::Slate => "#64748b",
            BadgeColor::Cyan => "#06b6d4",
            BadgeColor::Gray => "#6b7280",
        }
    }

    /// Text color with enough contrast against `fill()`.
    pub fn text(&self) -> &'static str {
        match self {
            BadgeColor::Yellow | BadgeColor::Cyan => "#000000",
            _ => "#ffffff",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerCategory {
    pub key: &'static str,
    pub code: &'static str,
    pub color: BadgeColor,
}

pub const CATEGORIES: [MarkerCategory; 11] = [
    MarkerCategory { key: "建築工程站", code: "build", color: BadgeColor::Blue },
    MarkerCategory { key: "採集工程站", code: "gather", color: BadgeColor::Green },
    MarkerCategory { key: "生產工程站", code: "produce", color: BadgeColor::Yellow },
    MarkerCategory { key: "研究工程站", code: "research", color: BadgeColor::Purple },
    MarkerCategory { key: "都政工程站", code: "gov", color: BadgeColor::Orange },
    MarkerCategory { key: "訓練工程站", code: "train", color: BadgeColor::Pink },
    MarkerCategory { key: "防禦工程站", code: "defense", color: BadgeColor::Red },
    MarkerCategory { key: "遠征工程站", code: "expedition", color: BadgeColor::Teal },
    MarkerCategory { key: "堡壘", code: "fort", color: BadgeColor::Indigo },
    MarkerCategory { key: "要塞", code: "citadel", color: BadgeColor::Slate },
    MarkerCategory { key: "雪原總部", code: "hq", color: BadgeColor::Cyan },
];

/// Look up a category by its key. Unknown types are allowed on markers; they
/// simply have no category and render gray.
pub fn category(key: &str) -> Option<&'static MarkerCategory> {
    CATEGORIES.iter().find(|c| c.key == key)
}

/// A saved, shareable marker list.
#[cfg(feature = "uuid-support")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerSet {
    pub id: Uuid,
    pub name: String,
    pub markers: Vec<Marker>,
    pub created_at: String,
    pub updated_at: String,
}
