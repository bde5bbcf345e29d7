//! API Server module
//!
//! Exposes a [`TreeDataProvider`] over HTTP so a host view living in another
//! process can query the tree and follow its change notifications.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::broadcast::{self, error::RecvError};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::models::{Node, TreeChange};
use crate::provider::{ProviderError, TreeDataProvider};

/// Query naming an optional node; absent means the root
#[derive(Serialize, Deserialize, Default)]
pub struct NodeQuery {
    pub id: Option<String>,
}

/// Query naming a node that must exist
#[derive(Serialize, Deserialize)]
pub struct RequiredNodeQuery {
    pub id: String,
}

/// Request to refresh one node, or everything when `id` is absent
#[derive(Serialize, Deserialize, Default)]
pub struct RefreshRequest {
    pub id: Option<String>,
}

/// Server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub address: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: ([127, 0, 0, 1], 3000).into(),
        }
    }
}

/// API responses
#[derive(Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self::optional(Some(data))
    }

    /// A successful response whose payload may legitimately be absent
    pub fn optional(data: Option<T>) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

fn ok<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
}

fn node_not_found(id: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::error(format!("Node '{}' not found", id))),
    )
        .into_response()
}

/// Helper function to map provider results to Axum responses
fn map_provider_result<T: Serialize>(result: Result<T, ProviderError>) -> Response {
    match result {
        Ok(data) => ok(data),
        Err(e) => {
            let status = match &e {
                ProviderError::UnregisteredService(_) => StatusCode::INTERNAL_SERVER_ERROR,
                ProviderError::Resolve { .. } | ProviderError::Refresh { .. } => {
                    StatusCode::BAD_GATEWAY
                }
            };
            tracing::error!("Request failed: {}", e);
            (status, Json(ApiResponse::<T>::error(e.to_string()))).into_response()
        }
    }
}

/// Builds the application router
pub fn router(provider: TreeDataProvider) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/tree", get(get_tree))
        .route("/api/children", get(get_children))
        .route("/api/parent", get(get_parent))
        .route("/api/item", get(get_item))
        .route("/api/resolve", get(resolve_item))
        .route("/api/refresh", post(refresh))
        .route("/api/events", get(events_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(provider)
}

/// Starts the API server
pub async fn serve(
    provider: TreeDataProvider,
    config: ServerConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    let _ = tracing_subscriber::fmt().try_init();

    let app = router(provider);

    tracing::info!("Starting server on {}", config.address);
    let listener = TcpListener::bind(config.address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn get_tree(State(provider): State<TreeDataProvider>) -> impl IntoResponse {
    ok(provider.store().root().clone())
}

async fn get_children(
    State(provider): State<TreeDataProvider>,
    Query(query): Query<NodeQuery>,
) -> impl IntoResponse {
    ok(provider.get_children(query.id.as_deref()).to_vec())
}

async fn get_parent(
    State(provider): State<TreeDataProvider>,
    Query(query): Query<RequiredNodeQuery>,
) -> impl IntoResponse {
    let parent = provider.get_parent(&query.id).cloned();
    (StatusCode::OK, Json(ApiResponse::<Node>::optional(parent))).into_response()
}

async fn get_item(
    State(provider): State<TreeDataProvider>,
    Query(query): Query<RequiredNodeQuery>,
) -> impl IntoResponse {
    match provider.find(&query.id) {
        Some(node) => map_provider_result(provider.get_tree_item(node)),
        None => node_not_found(&query.id),
    }
}

async fn resolve_item(
    State(provider): State<TreeDataProvider>,
    Query(query): Query<RequiredNodeQuery>,
) -> impl IntoResponse {
    let Some(node) = provider.find(&query.id).cloned() else {
        return node_not_found(&query.id);
    };
    map_provider_result(provider.resolve_tree_item(&node).await)
}

async fn refresh(State(provider): State<TreeDataProvider>, body: Bytes) -> impl IntoResponse {
    // Only an empty body means "refresh everything".
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        RefreshRequest::default()
    } else {
        match serde_json::from_slice::<RefreshRequest>(&body) {
            Ok(request) => request,
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ApiResponse::<()>::error(format!(
                        "Invalid refresh request: {}",
                        e
                    ))),
                )
                    .into_response();
            }
        }
    };
    map_provider_result(provider.refresh(request.id.as_deref()).await)
}

async fn events_handler(State(provider): State<TreeDataProvider>) -> impl IntoResponse {
    let stream = change_stream(provider.subscribe());

    let headers = [
        (
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/event-stream"),
        ),
        (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
    ];

    (headers, axum::body::Body::from_stream(stream))
}

fn sse_frame(change: &TreeChange) -> String {
    let data = serde_json::to_string(change).unwrap_or_else(|_| "{}".to_string());
    format!("event: change\ndata: {}\n\n", data)
}

/// Turns change notifications into server-sent event frames
fn change_stream(
    receiver: broadcast::Receiver<TreeChange>,
) -> impl Stream<Item = Result<String, Infallible>> {
    futures::stream::unfold(receiver, |mut receiver| async move {
        let frame = match receiver.recv().await {
            Ok(change) => sse_frame(&change),
            // Missed changes collapse into a whole-tree change.
            Err(RecvError::Lagged(_)) => sse_frame(&TreeChange::new(None)),
            Err(RecvError::Closed) => return None,
        };
        Some((Ok(frame), receiver))
    })
}
