mod assets;
mod graphql;
mod storage;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{
    extract::{Query, State},
    response::Html,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing_subscriber::EnvFilter;
use wayfinder_shared::models::Bounds;

use graphql::Schema;
use storage::Storage;

#[derive(Clone)]
struct AppState {
    schema: Schema,
    storage: Arc<Storage>,
    assets: Arc<assets::Assets>,
}

async fn graphql_handler(State(state): State<AppState>, req: GraphQLRequest) -> GraphQLResponse {
    state.schema.execute(req.into_inner()).await.into()
}

async fn graphiql() -> Html<String> {
    Html(
        async_graphql::http::GraphiQLSource::build()
            .endpoint("/graphql")
            .finish(),
    )
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

fn server_error(message: String) -> Response {
    tracing::error!(error = %message, "request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": message }))).into_response()
}

/// Query string of `GET /pois`. Fields stay strings so that missing and
/// malformed values get distinct messages.
#[derive(Deserialize)]
struct PoiParams {
    #[serde(rename = "type")]
    category: Option<String>,
    south: Option<String>,
    west: Option<String>,
    north: Option<String>,
    east: Option<String>,
}

async fn pois_handler(State(state): State<AppState>, Query(params): Query<PoiParams>) -> Response {
    let (Some(category), Some(south), Some(west), Some(north), Some(east)) = (
        params.category.filter(|s| !s.is_empty()),
        params.south,
        params.west,
        params.north,
        params.east,
    ) else {
        return bad_request("Missing required parameters");
    };
    let (Some(south), Some(west), Some(north), Some(east)) =
        (parse_number(&south), parse_number(&west), parse_number(&north), parse_number(&east))
    else {
        return bad_request("Invalid coordinate format. Must be numbers.");
    };
    let bounds = Bounds {
        south,
        west,
        north,
        east,
    };
    match state.storage.query_pois(&category, &bounds) {
        Ok(pois) => {
            tracing::debug!(%category, count = pois.len(), "POI query");
            Json(pois).into_response()
        }
        Err(e) => server_error(e),
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

async fn categories_handler(State(state): State<AppState>) -> Response {
    Json(state.assets.categories.clone()).into_response()
}

#[derive(Deserialize)]
struct CheckPoiParams {
    lat: Option<String>,
    lng: Option<String>,
    name: Option<String>,
}

async fn check_poi_handler(State(state): State<AppState>, Query(params): Query<CheckPoiParams>) -> Response {
    let (Some(lat), Some(lng), Some(name)) = (params.lat, params.lng, params.name.filter(|s| !s.is_empty())) else {
        return bad_request("Missing required parameters");
    };
    let (Some(lat), Some(lng)) = (parse_number(&lat), parse_number(&lng)) else {
        return bad_request("Invalid latitude or longitude format. Must be numbers.");
    };
    match state.storage.check_poi(lat, lng, &name) {
        Ok(Some(poi)) => Json(json!({ "isPoi": true, "poi": poi })).into_response(),
        Ok(None) => Json(json!({ "isPoi": false })).into_response(),
        Err(e) => server_error(e),
    }
}

#[derive(Deserialize)]
struct LogSearchBody {
    keyword: String,
}

async fn log_search_handler(State(state): State<AppState>, Json(body): Json<LogSearchBody>) -> Response {
    match state.storage.log_search(&body.keyword) {
        Ok(entry) => Json(entry).into_response(),
        Err(e) if body.keyword.trim().is_empty() => bad_request(&e),
        Err(e) => server_error(e),
    }
}

#[derive(Deserialize)]
struct HistoryParams {
    limit: Option<usize>,
}

async fn search_history_handler(State(state): State<AppState>, Query(params): Query<HistoryParams>) -> Response {
    match state.storage.recent_searches(params.limit.unwrap_or(10)) {
        Ok(history) => Json(json!({ "history": history })).into_response(),
        Err(e) => server_error(e),
    }
}

/// Build a cache-controlled static file router.
///
/// Separated so tests can exercise the caching layer with arbitrary directories.
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

/// API routes, without static files.
fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/graphql", get(graphiql).post(graphql_handler))
        .route("/categories", get(categories_handler))
        .route("/pois", get(pois_handler))
        .route("/check_poi", get(check_poi_handler))
        .route("/search_history", get(search_history_handler).post(log_search_handler))
        .with_state(state)
}

/// Build the full application router.
fn build_app(state: AppState, assets_dir: &Path) -> Router {
    // Static file routers are stateless, merge them before the fallback index
    let static_files = Router::new()
        .nest(
            "/poi-images",
            cached_static_router(&assets_dir.join("images"), CACHE_1DAY),
        )
        .nest(
            "/dist",
            cached_static_router(Path::new("dist"), CACHE_IMMUTABLE),
        )
        .nest(
            "/assets",
            cached_static_router(Path::new("dist/assets"), CACHE_IMMUTABLE),
        );

    api_router(state)
        .route("/", get(serve_index))
        .merge(static_files)
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let assets_dir =
        PathBuf::from(std::env::var("ASSETS_DIR").unwrap_or_else(|_| "assets".to_string()));
    let loaded_assets = match assets::Assets::load(&assets_dir) {
        Ok(a) => Arc::new(a),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load assets");
            std::process::exit(1);
        }
    };

    let db_path =
        PathBuf::from(std::env::var("DB_PATH").unwrap_or_else(|_| "data/pois.redb".to_string()));
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create database directory");
    }
    let storage = match Storage::open(&db_path) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to open database");
            std::process::exit(1);
        }
    };
    match storage.seed_if_empty(&loaded_assets.seed_pois) {
        Ok(0) => {}
        Ok(n) => tracing::info!(count = n, "Seeded POI table"),
        Err(e) => tracing::warn!(error = %e, "Failed to seed POI table"),
    }

    let schema = graphql::build_schema(loaded_assets.clone(), storage.clone());
    let state = AppState {
        schema,
        storage,
        assets: loaded_assets,
    };
    let app = build_app(state, &assets_dir);

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("0.0.0.0:{}", port);
    tracing::info!("Server running at http://localhost:{}", port);
    tracing::info!("GraphiQL playground at http://localhost:{}/graphql", port);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app).await.expect("Server error");
}

async fn serve_index() -> Html<String> {
    // Try to serve the built frontend, fall back to a simple message
    match std::fs::read_to_string("dist/index.html") {
        Ok(html) => Html(html),
        Err(_) => Html(
            r#"<!DOCTYPE html>
<html>
<head><title>Wayfinder</title></head>
<body>
<h1>Wayfinder</h1>
<p>Frontend not built yet. Visit <a href="/graphql">GraphiQL</a> to explore the API.</p>
</body>
</html>"#
                .to_string(),
        ),
    }
}
