use std::sync::Arc;

use async_graphql::{Context, InputObject, Json, Object, SimpleObject, ID};
use mapmark_shared::{
    config::MapConfig,
    models::{self, Marker, MarkerId, CATEGORIES},
};

use crate::assets::{normalize_markers, Assets};
use crate::storage::Storage;

// GraphQL output types

#[derive(SimpleObject)]
pub struct GqlMapConfig {
    pub world_max: f64,
    pub zoom_min: f64,
    pub zoom_max: f64,
    pub grid_step: f64,
    pub snap_enabled: bool,
    pub marker_base_diameter_at_scale1: f64,
    pub min_diameter: f64,
    pub max_diameter: f64,
    pub neighbor_radius_px: f64,
    pub cluster_k: f64,
    pub dynamic_ceiling: bool,
    pub ceiling_padding: f64,
    pub wheel_k: f64,
    pub zoom_step: f64,
    pub background_url: Option<String>,
}

impl From<&MapConfig> for GqlMapConfig {
    fn from(c: &MapConfig) -> Self {
        GqlMapConfig {
            world_max: c.world_max,
            zoom_min: c.zoom_min,
            zoom_max: c.zoom_max,
            grid_step: c.grid_step,
            snap_enabled: c.snap_enabled,
            marker_base_diameter_at_scale1: c.marker_base_diameter_at_scale1,
            min_diameter: c.min_diameter,
            max_diameter: c.max_diameter,
            neighbor_radius_px: c.neighbor_radius_px,
            cluster_k: c.cluster_k,
            dynamic_ceiling: c.dynamic_ceiling,
            ceiling_padding: c.ceiling_padding,
            wheel_k: c.wheel_k,
            zoom_step: c.zoom_step,
            background_url: c.background_url.clone(),
        }
    }
}

#[derive(SimpleObject)]
pub struct GqlCategory {
    pub key: String,
    pub code: String,
    pub color: String,
    pub fill: String,
    pub text: String,
}

/// Marker ids are numbers or strings, so they travel as raw JSON.
#[derive(SimpleObject)]
pub struct GqlMarker {
    pub id: Json<MarkerId>,
    pub x: f64,
    pub y: f64,
    #[graphql(name = "type")]
    pub kind: String,
    pub number: u32,
    pub label: String,
}

impl From<Marker> for GqlMarker {
    fn from(m: Marker) -> Self {
        GqlMarker {
            id: Json(m.id),
            x: m.x,
            y: m.y,
            kind: m.kind,
            number: m.number,
            label: m.label,
        }
    }
}

#[derive(SimpleObject)]
pub struct GqlMarkerSet {
    pub id: ID,
    pub name: String,
    pub markers: Vec<GqlMarker>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<models::MarkerSet> for GqlMarkerSet {
    fn from(s: models::MarkerSet) -> Self {
        GqlMarkerSet {
            id: ID(s.id.to_string()),
            name: s.name,
            markers: s.markers.into_iter().map(GqlMarker::from).collect(),
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

// Input types

#[derive(InputObject)]
pub struct MarkerInput {
    pub id: Json<MarkerId>,
    pub x: f64,
    pub y: f64,
    #[graphql(name = "type")]
    pub kind: String,
    pub number: u32,
    pub label: Option<String>,
}

impl From<MarkerInput> for Marker {
    fn from(m: MarkerInput) -> Self {
        Marker {
            id: m.id.0,
            x: m.x,
            y: m.y,
            kind: m.kind,
            number: m.number,
            label: m.label.unwrap_or_default(),
        }
    }
}

#[derive(InputObject)]
pub struct SaveMarkerSetInput {
    pub name: String,
    pub markers: Vec<MarkerInput>,
}

#[derive(InputObject)]
pub struct UpdateMarkerSetInput {
    pub id: ID,
    pub name: Option<String>,
    pub markers: Option<Vec<MarkerInput>>,
}

fn to_markers(input: Vec<MarkerInput>, config: &MapConfig) -> Vec<Marker> {
    normalize_markers(input.into_iter().map(Marker::from).collect(), config)
}

// Query root

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn map_config(&self, ctx: &Context<'_>) -> async_graphql::Result<GqlMapConfig> {
        let assets = ctx.data::<Arc<Assets>>()?;
        Ok(GqlMapConfig::from(&assets.config))
    }

    async fn categories(&self) -> Vec<GqlCategory> {
        CATEGORIES
            .iter()
            .map(|c| GqlCategory {
                key: c.key.to_string(),
                code: c.code.to_string(),
                color: c.color.name().to_string(),
                fill: c.color.fill().to_string(),
                text: c.color.text().to_string(),
            })
            .collect()
    }

    /// Markers of a saved set, or the default list when no set is given.
    async fn markers(
        &self,
        ctx: &Context<'_>,
        set_id: Option<ID>,
    ) -> async_graphql::Result<Vec<GqlMarker>> {
        let Some(set_id) = set_id else {
            let assets = ctx.data::<Arc<Assets>>()?;
            return Ok(assets.markers.iter().cloned().map(GqlMarker::from).collect());
        };
        let storage = ctx.data::<Arc<Storage>>()?;
        let set = storage
            .get_set(&set_id)
            .map_err(async_graphql::Error::new)?
            .ok_or_else(|| async_graphql::Error::new("Marker set not found"))?;
        Ok(set.markers.into_iter().map(GqlMarker::from).collect())
    }

    async fn marker_set(
        &self,
        ctx: &Context<'_>,
        id: ID,
    ) -> async_graphql::Result<Option<GqlMarkerSet>> {
        let storage = ctx.data::<Arc<Storage>>()?;
        let set = storage.get_set(&id).map_err(async_graphql::Error::new)?;
        Ok(set.map(GqlMarkerSet::from))
    }
}

// Mutation root

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn save_marker_set(
        &self,
        ctx: &Context<'_>,
        input: SaveMarkerSetInput,
    ) -> async_graphql::Result<GqlMarkerSet> {
        let storage = ctx.data::<Arc<Storage>>()?;
        let assets = ctx.data::<Arc<Assets>>()?;
        let now = chrono::Utc::now().to_rfc3339();

        let set = models::MarkerSet {
            id: uuid::Uuid::new_v4(),
            name: input.name,
            markers: to_markers(input.markers, &assets.config),
            created_at: now.clone(),
            updated_at: now,
        };

        storage.save_set(&set).map_err(async_graphql::Error::new)?;
        tracing::info!(id = %set.id, markers = set.markers.len(), "Saved marker set");

        Ok(GqlMarkerSet::from(set))
    }

    async fn update_marker_set(
        &self,
        ctx: &Context<'_>,
        input: UpdateMarkerSetInput,
    ) -> async_graphql::Result<GqlMarkerSet> {
        let storage = ctx.data::<Arc<Storage>>()?;
        let assets = ctx.data::<Arc<Assets>>()?;

        let mut set = storage
            .get_set(&input.id)
            .map_err(async_graphql::Error::new)?
            .ok_or_else(|| async_graphql::Error::new("Marker set not found"))?;

        if let Some(name) = input.name {
            set.name = name;
        }
        if let Some(markers) = input.markers {
            set.markers = to_markers(markers, &assets.config);
        }
        set.updated_at = chrono::Utc::now().to_rfc3339();

        storage.save_set(&set).map_err(async_graphql::Error::new)?;

        Ok(GqlMarkerSet::from(set))
    }

    async fn delete_marker_set(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<bool> {
        let storage = ctx.data::<Arc<Storage>>()?;
        storage.delete_set(&id).map_err(async_graphql::Error::new)
    }
}

pub type Schema = async_graphql::Schema<QueryRoot, MutationRoot, async_graphql::EmptySubscription>;

pub fn build_schema(assets: Arc<Assets>, storage: Arc<Storage>) -> Schema {
    async_graphql::Schema::build(QueryRoot, MutationRoot, async_graphql::EmptySubscription)
        .data(assets)
        .data(storage)
        .finish()
}
