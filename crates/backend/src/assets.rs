use mapmark_shared::config::MapConfig;
use mapmark_shared::exchange::parse_markers;
use mapmark_shared::models::Marker;
use mapmark_shared::store::MarkerStore;
use std::path::Path;

pub const CONFIG_FILE: &str = "map_config.json";
pub const MARKERS_FILE: &str = "markers.json";

/// Map configuration and the default marker list served to new sessions.
#[derive(Debug, Clone, Default)]
pub struct Assets {
    pub config: MapConfig,
    pub markers: Vec<Marker>,
}

/// `Ok(None)` when the file does not exist.
fn read_optional(path: &Path) -> Result<Option<String>, String> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(format!("Failed to read {}: {}", path.display(), e)),
    }
}

impl Assets {
    /// Load both files from `assets_dir`. Missing or broken files fall back to
    /// the default configuration and an empty marker list.
    pub fn load(assets_dir: &Path) -> Self {
        let config = match Self::load_config(assets_dir) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(error = %e, "Using default map config");
                MapConfig::default()
            }
        };
        let markers = match Self::load_markers(assets_dir, &config) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(error = %e, "No initial markers");
                Vec::new()
            }
        };

        tracing::info!(
            world_max = config.world_max,
            markers = markers.len(),
            "Loaded map assets"
        );

        Assets { config, markers }
    }

    fn load_config(assets_dir: &Path) -> Result<MapConfig, String> {
        match read_optional(&assets_dir.join(CONFIG_FILE))? {
            Some(text) => MapConfig::from_json(&text),
            None => Ok(MapConfig::default()),
        }
    }

    fn load_markers(assets_dir: &Path, config: &MapConfig) -> Result<Vec<Marker>, String> {
        let Some(text) = read_optional(&assets_dir.join(MARKERS_FILE))? else {
            return Ok(Vec::new());
        };
        let markers =
            parse_markers(&text).map_err(|e| format!("Failed to parse {}: {}", MARKERS_FILE, e))?;
        Ok(normalize_markers(markers, config))
    }
}

/// Clamp coordinates into the configured world and drop duplicate ids.
pub fn normalize_markers(markers: Vec<Marker>, config: &MapConfig) -> Vec<Marker> {
    let mut store = MarkerStore::new(config.extent());
    store.replace_all(markers);
    store.as_slice().to_vec()
}
