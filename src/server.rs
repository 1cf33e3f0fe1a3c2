use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::debug;

use crate::cost::StartKind;
use crate::graph::GraphStore;
use crate::postprocess::{assemble_reply, Poi, RouteReply};
use crate::search::{find_path, SearchRequest};
use crate::spatial::NodeIndex;

/// How many nearby junctions a destination coordinate fans out to. The
/// route may legitimately end at any of them, whichever is settled first.
const END_CANDIDATES: usize = 5;

struct AppState {
    graph: GraphStore,
    index: NodeIndex,
    pois: Vec<Poi>,
}

#[derive(Debug, Deserialize)]
pub struct RouteRequest {
    /// Starting point as [longitude, latitude]
    pub from: [f64; 2],

    /// Destination as [longitude, latitude]
    pub to: [f64; 2],

    /// Truck compass heading at the start in degrees, 0 = north
    #[serde(default)]
    pub heading: Option<f64>,

    /// Start context, "road" (default) or "yard"
    #[serde(default, rename = "startType")]
    pub start_type: StartKind,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

async fn route_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RouteRequest>,
) -> Result<Json<RouteReply>, (StatusCode, Json<ErrorResponse>)> {
    let Some(start) = state.index.snap(req.from) else {
        return Err(not_found("no routable node near the start coordinate"));
    };
    let ends = state.index.nearest(req.to, END_CANDIDATES);
    if ends.is_empty() {
        return Err(not_found("no routable node near the destination coordinate"));
    }
    debug!(start, end_candidates = ends.len(), "routing request");

    let request = SearchRequest {
        start,
        ends,
        start_heading: req.heading,
        start_kind: req.start_type,
        target: Some(req.to),
        max_iterations: None,
    };

    match find_path(&state.graph, &request) {
        // The raw position goes ahead of the first snapped node, so the
        // drawn route starts where the truck actually is.
        Some(found) => Ok(Json(assemble_reply(found, Some(req.from), &state.pois))),
        None => Err(not_found("no route between the given coordinates")),
    }
}

async fn health_handler() -> &'static str {
    "ok"
}

fn not_found(message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

pub async fn run_server(graph: GraphStore, pois: Vec<Poi>, port: u16) -> anyhow::Result<()> {
    let index = NodeIndex::build(&graph);
    let state = Arc::new(AppState { graph, index, pois });

    let app = Router::new()
        .route("/route", post(route_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", port);
    println!("🚀 Server starting on http://{}", addr);
    println!("   POST /route   {{\"from\": [lng, lat], \"to\": [lng, lat]}}");
    println!("   GET  /health");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
