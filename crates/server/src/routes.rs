use std::sync::Arc;

use axum::{
    routing::{get, patch},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;

use common::types::Health;
use service::tickets::TicketService;

use crate::identity::IdentityConfig;
use crate::openapi::ApiDoc;

pub mod tickets;

#[derive(Clone)]
pub struct ServerState {
    pub tickets: Arc<TicketService>,
    pub identity: IdentityConfig,
}

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the full application router.
///
/// Reads are `GET`; mutations are `POST`/`PATCH`/`DELETE` so a front proxy can
/// route the two classes differently.
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/api-docs/openapi.json", get(openapi_json));

    let reads = Router::new()
        .route("/tickets/first", get(tickets::list_first))
        .route("/tickets/page", get(tickets::list_page))
        .route("/tickets/search", get(tickets::search))
        .route("/tickets/search/first", get(tickets::search_first))
        .route("/tickets/status/:status", get(tickets::filter_by_status))
        .route("/tickets/priority/:priority", get(tickets::filter_by_priority));

    let records = Router::new()
        .route("/tickets", get(tickets::list_all).post(tickets::create))
        .route(
            "/tickets/:id",
            get(tickets::get).patch(tickets::update_as_author).delete(tickets::delete),
        )
        .route("/tickets/:id/assignee", patch(tickets::update_as_assignee));

    public
        .merge(reads)
        .merge(records)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
