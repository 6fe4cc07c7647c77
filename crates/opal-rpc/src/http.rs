//! HTTP transport for the protocol router.

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::Serialize;
use serde_json::Value;

use crate::error::RpcError;
use crate::protocol::Protocol;
use crate::router::ProtocolRouter;

/// Response wrapper for consistent API format.
#[derive(Serialize)]
struct ApiResponse<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<&'static str>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
            kind: None,
        })
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            Json(ApiResponse::<()> {
                success: false,
                data: None,
                error: Some(self.to_string()),
                kind: Some(self.kind()),
            }),
        )
            .into_response()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Health {
    status: &'static str,
    protocols: Vec<&'static str>,
    live_attempts: usize,
    cluster_nodes: usize,
    events_applied: u64,
}

/// Build the RPC endpoint.
///
/// | Method | Path | Description |
/// |---|---|---|
/// | POST | `/rpc/{protocol}/{method}` | Call `method` on `protocol` with a JSON body |
/// | GET | `/healthz` | Liveness and served protocols |
pub fn build_router(router: Arc<ProtocolRouter>) -> Router {
    Router::new()
        .route("/rpc/{protocol}/{method}", post(rpc_call))
        .route("/healthz", get(healthz))
        .with_state(router)
}

/// POST /rpc/{protocol}/{method}
async fn rpc_call(
    State(router): State<Arc<ProtocolRouter>>,
    Path((protocol, method)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<ApiResponse<Value>>, RpcError> {
    let payload: Value = if body.is_empty() {
        Value::Object(Default::default())
    } else {
        serde_json::from_slice(&body).map_err(RpcError::Decode)?
    };
    let response = router.dispatch(&protocol, &method, payload)?;
    Ok(ApiResponse::ok(response))
}

/// GET /healthz
async fn healthz(State(router): State<Arc<ProtocolRouter>>) -> impl IntoResponse {
    let registry = router.service().registry();
    let health = Health {
        status: "ok",
        protocols: Protocol::ALL
            .into_iter()
            .filter(|p| router.serves(*p))
            .map(|p| p.as_str())
            .collect(),
        live_attempts: registry.live_attempts().len(),
        cluster_nodes: registry.cluster_nodes().len(),
        events_applied: registry.events_applied(),
    };
    (StatusCode::OK, ApiResponse::ok(health))
}
