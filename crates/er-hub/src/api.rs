//! # API Handlers
//!
//! Thin axum adapters over the shared [`Database`]: decode the request,
//! make one bounded storage call, encode JSON.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use er_core::{
    decode_filter_parameters, Database, Error, Event, MultipleEventsRequest, SingleEventRequest,
};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

pub struct AppState {
    pub database: Arc<dyn Database>,
    pub request_timeout: Duration,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1alpha1/events", get(read_events))
        .route("/v1alpha1/events/:id", get(read_event))
        .route(
            "/v1alpha1/search/:id",
            get(search_event).post(upstream_downstream_search),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// Errors
// =============================================================================

/// JSON error response: `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match &err {
            _ if err.is_client_error() => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            Error::Cancelled => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("{}: {}", self.status, self.message);
        }
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

/// Run a storage call under the request deadline.
async fn bounded<T>(
    state: &AppState,
    call: impl Future<Output = er_core::Result<T>>,
) -> er_core::Result<T> {
    tokio::time::timeout(state.request_timeout, call)
        .await
        .unwrap_or_else(|_| Err(Error::Cancelled))
}

// =============================================================================
// Events
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiResponse {
    pub page_no: u32,
    pub page_size: u32,
    /// Number of items in this response, not across all pages.
    pub total_number_items: usize,
    pub items: Vec<Event>,
}

pub async fn read_events(
    State(state): State<Arc<AppState>>,
    request: Result<Query<MultipleEventsRequest>, QueryRejection>,
    RawQuery(raw_query): RawQuery,
) -> Result<Json<MultiResponse>, ApiError> {
    let Query(mut request) = request?;
    request.params = decode_filter_parameters(
        raw_query.as_deref().unwrap_or_default(),
        MultipleEventsRequest::QUERY_KEYS,
    )
    .into_result()?;

    let events = bounded(&state, state.database.get_events(&request)).await?;
    Ok(Json(MultiResponse {
        page_no: request.page_no,
        page_size: request.page_size,
        total_number_items: events.len(),
        items: events,
    }))
}

pub async fn read_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    request: Result<Query<SingleEventRequest>, QueryRejection>,
) -> Result<Json<Event>, ApiError> {
    let Query(_request) = request?;
    let event = bounded(&state, state.database.get_event_by_id(&id)).await?;
    Ok(Json(event))
}

// =============================================================================
// Search
// =============================================================================

pub async fn search_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Event>, ApiError> {
    let event = bounded(&state, state.database.search_event(&id)).await?;
    Ok(Json(event))
}

pub async fn upstream_downstream_search(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Event>>, ApiError> {
    let events = bounded(&state, state.database.upstream_downstream_search(&id)).await?;
    Ok(Json(events))
}
