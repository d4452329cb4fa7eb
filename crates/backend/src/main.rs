mod assets;
mod graphql;
mod storage;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::http::HeaderValue;
use axum::{extract::State, response::Html, routing::get, Router};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing_subscriber::EnvFilter;

use graphql::Schema;

/// Server settings taken from the environment.
#[derive(Debug, Clone, PartialEq)]
struct ServerConfig {
    assets_dir: PathBuf,
    db_path: PathBuf,
    port: u16,
}

impl ServerConfig {
    fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let assets_dir = lookup("ASSETS_DIR").unwrap_or_else(|| "assets".to_string());
        let db_path = lookup("DB_PATH").unwrap_or_else(|| "data/markers.redb".to_string());
        let port = match lookup("PORT") {
            Some(p) => p
                .parse::<u16>()
                .map_err(|e| format!("Invalid PORT {:?}: {}", p, e))?,
            None => 3000,
        };
        Ok(ServerConfig {
            assets_dir: PathBuf::from(assets_dir),
            db_path: PathBuf::from(db_path),
            port,
        })
    }
}

async fn graphql_handler(State(schema): State<Schema>, req: GraphQLRequest) -> GraphQLResponse {
    schema.execute(req.into_inner()).await.into()
}

async fn graphiql() -> Html<String> {
    Html(
        async_graphql::http::GraphiQLSource::build()
            .endpoint("/graphql")
            .finish(),
    )
}

/// Static file router with a fixed `Cache-Control` header.
fn cached_static_router(dir: &Path, cache_header: &'static str) -> Router {
    let layer = SetResponseHeaderLayer::overriding(
        axum::http::header::CACHE_CONTROL,
        HeaderValue::from_static(cache_header),
    );
    Router::new()
        .fallback_service(ServeDir::new(dir))
        .layer(layer)
}

const CACHE_1DAY: &str = "public, max-age=86400, must-revalidate";
const CACHE_IMMUTABLE: &str = "public, max-age=31536000, immutable";

fn build_app(schema: Schema, assets_dir: &Path) -> Router {
    // Stateless static routers are merged after the state is attached
    let static_files = Router::new()
        .nest("/static", cached_static_router(assets_dir, CACHE_1DAY))
        .nest(
            "/dist",
            cached_static_router(Path::new("dist"), CACHE_IMMUTABLE),
        )
        .nest(
            "/assets",
            cached_static_router(Path::new("dist/assets"), CACHE_IMMUTABLE),
        );

    Router::new()
        .route("/graphql", get(graphiql).post(graphql_handler))
        .route("/", get(serve_index))
        .route("/set/{id}", get(serve_index))
        .with_state(schema)
        .merge(static_files)
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}

#[tokio::main]
async fn main() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;
    let loaded_assets = Arc::new(assets::Assets::load(&config.assets_dir));

    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create database directory: {}", e))?;
    }
    let storage = storage::Storage::open(&config.db_path)?;
    let sets = storage.count_sets()?;

    let schema = graphql::build_schema(loaded_assets, storage);
    let app = build_app(schema, &config.assets_dir);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!(port = config.port, saved_sets = sets, "Server running at http://localhost:{}", config.port);
    tracing::info!("GraphiQL playground at http://localhost:{}/graphql", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| format!("Failed to bind {}: {}", addr, e))?;
    axum::serve(listener, app).await.map_err(|e| e.to_string())
}

async fn serve_index() -> Html<String> {
    // Built frontend if present, otherwise a pointer to the API
    match std::fs::read_to_string("dist/index.html") {
        Ok(html) => Html(html),
        Err(_) => Html(
            r#"<!DOCTYPE html>
<html>
<head><title>Mapmark</title></head>
<body>
<h1>Mapmark</h1>
<p>Frontend not built yet. Visit <a href="/graphql">GraphiQL</a> to explore the API.</p>
</body>
</html>"#
                .to_string(),
        ),
    }
}
