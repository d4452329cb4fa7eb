use mapmark_shared::config::MapConfig;
use mapmark_shared::models::Marker;
use serde::{Deserialize, Serialize};

const MARKER_FIELDS: &str = "id x y type number label";

/// Build the variables JSON for the markers query. `None` asks for the
/// server's default list.
pub fn build_markers_variables(set_id: Option<&str>) -> serde_json::Value {
    serde_json::json!({ "setId": set_id })
}

/// Build the variables JSON for a save marker set mutation.
pub fn build_save_set_variables(name: &str, markers: &[Marker]) -> serde_json::Value {
    serde_json::json!({
        "input": {
            "name": name,
            "markers": markers,
        }
    })
}

/// Build the variables JSON for an update marker set mutation.
pub fn build_update_set_variables(id: &str, markers: &[Marker]) -> serde_json::Value {
    serde_json::json!({
        "input": {
            "id": id,
            "markers": markers,
        }
    })
}

/// Build a shareable set URL from origin and set ID.
pub fn build_set_url(origin: &str, set_id: &str) -> String {
    format!("{}/set/{}", origin, set_id)
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphQLRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQLResponse<T> {
    pub data: Option<T>,
    pub errors: Option<Vec<GraphQLError>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQLError {
    pub message: String,
}

/// Page origin, e.g. `http://localhost:3000`.
pub fn origin() -> Result<String, String> {
    let window = web_sys::window().ok_or_else(|| "No window".to_string())?;
    window
        .location()
        .origin()
        .map_err(|_| "Could not read page origin".to_string())
}

fn api_url() -> Result<String, String> {
    Ok(format!("{}/graphql", origin()?))
}

async fn query<T: for<'de> Deserialize<'de>>(
    query_str: &str,
    variables: Option<serde_json::Value>,
) -> Result<T, String> {
    let req = GraphQLRequest {
        query: query_str.to_string(),
        variables,
    };

    let resp = reqwest::Client::new()
        .post(api_url()?)
        .json(&req)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    let gql_resp: GraphQLResponse<T> = resp.json().await.map_err(|e| e.to_string())?;

    if let Some(errors) = gql_resp.errors {
        if let Some(first) = errors.into_iter().next() {
            return Err(first.message);
        }
    }

    gql_resp.data.ok_or_else(|| "No data returned".to_string())
}

// Types mirroring the GraphQL schema

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSet {
    pub id: String,
    pub name: String,
    pub updated_at: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapConfigResponse {
    pub map_config: MapConfig,
}

pub async fn fetch_map_config() -> Result<MapConfig, String> {
    let resp: MapConfigResponse = query(
        r#"query {
            mapConfig {
                worldMax zoomMin zoomMax gridStep snapEnabled
                markerBaseDiameterAtScale1 minDiameter maxDiameter
                neighborRadiusPx clusterK dynamicCeiling ceilingPadding
                wheelK zoomStep backgroundUrl
            }
        }"#,
        None,
    )
    .await?;
    Ok(resp.map_config.validated())
}

#[derive(Deserialize)]
pub struct MarkersResponse {
    pub markers: Vec<Marker>,
}

pub async fn fetch_markers(set_id: Option<&str>) -> Result<Vec<Marker>, String> {
    let resp: MarkersResponse = query(
        &format!(
            "query Markers($setId: ID) {{ markers(setId: $setId) {{ {} }} }}",
            MARKER_FIELDS
        ),
        Some(build_markers_variables(set_id)),
    )
    .await?;
    Ok(resp.markers)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSetResponse {
    pub save_marker_set: SavedSet,
}

pub async fn save_marker_set(name: &str, markers: &[Marker]) -> Result<SavedSet, String> {
    let resp: SaveSetResponse = query(
        r#"mutation SaveMarkerSet($input: SaveMarkerSetInput!) {
            saveMarkerSet(input: $input) { id name updatedAt }
        }"#,
        Some(build_save_set_variables(name, markers)),
    )
    .await?;
    Ok(resp.save_marker_set)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSetResponse {
    pub update_marker_set: SavedSet,
}

pub async fn update_marker_set(id: &str, markers: &[Marker]) -> Result<SavedSet, String> {
    let resp: UpdateSetResponse = query(
        r#"mutation UpdateMarkerSet($input: UpdateMarkerSetInput!) {
            updateMarkerSet(input: $input) { id name updatedAt }
        }"#,
        Some(build_update_set_variables(id, markers)),
    )
    .await?;
    Ok(resp.update_marker_set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapmark_shared::models::MarkerId;

    fn sample_markers() -> Vec<Marker> {
        vec![
            Marker {
                id: MarkerId::Num(3),
                x: 120.0,
                y: 640.0,
                kind: "堡壘".to_string(),
                number: 2,
                label: String::new(),
            },
            Marker::fallback(),
        ]
    }

    // --- GraphQL request serialization ---

    #[test]
    fn test_graphql_request_serializes_with_variables() {
        let req = GraphQLRequest {
            query: "query { mapConfig { worldMax } }".to_string(),
            variables: Some(serde_json::json!({"setId": "abc"})),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["query"], "query { mapConfig { worldMax } }");
        assert_eq!(json["variables"]["setId"], "abc");
    }

    #[test]
    fn test_graphql_request_omits_null_variables() {
        let req = GraphQLRequest {
            query: "query { categories { key } }".to_string(),
            variables: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("variables"));
    }

    // --- Response deserialization ---

    #[test]
    fn test_map_config_response_deserializes() {
        let json = r#"{"mapConfig": {"worldMax": 999, "zoomMin": 1, "zoomMax": 4, "gridStep": 25, "dynamicCeiling": true}}"#;
        let resp: MapConfigResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.map_config.world_max, 999.0);
        assert_eq!(resp.map_config.grid_step, 25.0);
        assert!(resp.map_config.dynamic_ceiling);
        // Missing fields fall back to defaults
        assert_eq!(resp.map_config.wheel_k, MapConfig::default().wheel_k);
        assert_eq!(resp.map_config.background_url, None);
    }

    #[test]
    fn test_map_config_response_background() {
        let json = r#"{"mapConfig": {"backgroundUrl": "/static/images/map.svg"}}"#;
        let resp: MapConfigResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.map_config.background_url.as_deref(), Some("/static/images/map.svg"));
    }

    #[test]
    fn test_markers_response_mixed_ids() {
        let json = r#"{"markers": [
            {"id": 7, "x": 10, "y": 20, "type": "要塞", "number": 1, "label": ""},
            {"id": "sun_city", "x": 597, "y": 597, "type": "雪原總部", "number": 1, "label": "太陽城"}
        ]}"#;
        let resp: MarkersResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.markers.len(), 2);
        assert_eq!(resp.markers[0].id, MarkerId::Num(7));
        assert_eq!(resp.markers[1], Marker::fallback());
    }

    #[test]
    fn test_save_set_response_deserializes() {
        let json = r#"{"saveMarkerSet": {"id": "0b7c3c1e", "name": "north", "updatedAt": "2024-01-01T00:00:00Z"}}"#;
        let resp: SaveSetResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.save_marker_set.id, "0b7c3c1e");
        assert_eq!(resp.save_marker_set.name, "north");
    }

    #[test]
    fn test_graphql_error_response() {
        let json = r#"{"data": null, "errors": [{"message": "Marker set not found"}]}"#;
        let resp: GraphQLResponse<MarkersResponse> = serde_json::from_str(json).unwrap();
        assert!(resp.data.is_none());
        assert_eq!(resp.errors.unwrap()[0].message, "Marker set not found");
    }

    // --- Variable builders ---

    #[test]
    fn test_build_markers_variables_without_set() {
        let vars = build_markers_variables(None);
        assert!(vars["setId"].is_null());
    }

    #[test]
    fn test_build_markers_variables_with_set() {
        let vars = build_markers_variables(Some("abc"));
        assert_eq!(vars["setId"], "abc");
    }

    #[test]
    fn test_build_save_set_variables() {
        let vars = build_save_set_variables("north", &sample_markers());
        let input = &vars["input"];
        assert_eq!(input["name"], "north");
        assert_eq!(input["markers"][0]["id"], 3);
        assert_eq!(input["markers"][0]["type"], "堡壘");
        assert_eq!(input["markers"][0]["number"], 2);
        assert_eq!(input["markers"][1]["id"], "sun_city");
        assert_eq!(input["markers"][1]["label"], "太陽城");
    }

    #[test]
    fn test_build_update_set_variables() {
        let vars = build_update_set_variables("abc", &[]);
        assert_eq!(vars["input"]["id"], "abc");
        assert_eq!(vars["input"]["markers"], serde_json::json!([]));
        assert!(vars["input"].get("name").is_none());
    }

    #[test]
    fn test_build_set_url() {
        assert_eq!(
            build_set_url("http://localhost:3000", "abc-123"),
            "http://localhost:3000/set/abc-123"
        );
    }
}
