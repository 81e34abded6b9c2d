use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use serde::Deserialize;
use service::pagination::Page;
use service::tickets::{AssigneeUpdate, AuthorUpdate, NewTicketInput, Ticket};
use tracing::info;

use crate::errors::JsonApiError;
use crate::identity::Caller;
use crate::routes::ServerState;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct KeywordQuery {
    #[serde(default)]
    pub keyword: String,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    #[serde(default)]
    pub offset: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl PageQuery {
    fn page(&self) -> Page {
        let d = Page::default();
        Page::new(self.offset.unwrap_or(d.offset), self.limit.unwrap_or(d.limit))
    }
}

type ApiResult<T> = Result<Json<T>, JsonApiError>;

#[utoipa::path(
    post, path = "/tickets", tag = "tickets",
    request_body = crate::openapi::NewTicketDoc,
    responses(
        (status = 200, description = "Created", body = crate::openapi::TicketDoc),
        (status = 400, description = "Validation Error"),
        (status = 401, description = "Missing caller")
    )
)]
pub async fn create(
    State(state): State<ServerState>,
    caller: Caller,
    payload: Result<Json<NewTicketInput>, JsonRejection>,
) -> ApiResult<Ticket> {
    let Json(input) = payload?;
    let ticket = state.tickets.create(&caller.context(), input).await?;
    Ok(Json(ticket))
}

#[utoipa::path(get, path = "/tickets/first", tag = "tickets", responses((status = 200, description = "Up to five tickets")))]
pub async fn list_first(State(state): State<ServerState>) -> ApiResult<Vec<Ticket>> {
    Ok(Json(state.tickets.list_first().await?))
}

#[utoipa::path(get, path = "/tickets", tag = "tickets", responses((status = 200, description = "All tickets")))]
pub async fn list_all(State(state): State<ServerState>) -> ApiResult<Vec<Ticket>> {
    let all = state.tickets.list_all().await?;
    info!(count = all.len(), "list tickets");
    Ok(Json(all))
}

#[utoipa::path(get, path = "/tickets/page", tag = "tickets", params(PageQuery), responses((status = 200, description = "Ticket window")))]
pub async fn list_page(State(state): State<ServerState>, Query(q): Query<PageQuery>) -> ApiResult<Vec<Ticket>> {
    Ok(Json(state.tickets.list_page(q.page()).await?))
}

#[utoipa::path(
    get, path = "/tickets/{id}", tag = "tickets",
    params(("id" = String, Path, description = "Ticket ID")),
    responses(
        (status = 200, description = "OK", body = crate::openapi::TicketDoc),
        (status = 403, description = "Caller is neither author nor assignee"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get(State(state): State<ServerState>, caller: Caller, Path(id): Path<String>) -> ApiResult<Ticket> {
    Ok(Json(state.tickets.get(&caller.context(), &id).await?))
}

#[utoipa::path(get, path = "/tickets/search", tag = "tickets", params(KeywordQuery), responses((status = 200, description = "Matching tickets")))]
pub async fn search(State(state): State<ServerState>, Query(q): Query<KeywordQuery>) -> ApiResult<Vec<Ticket>> {
    Ok(Json(state.tickets.search(&q.keyword).await?))
}

#[utoipa::path(
    get, path = "/tickets/search/first", tag = "tickets", params(KeywordQuery),
    responses((status = 200, description = "First match"), (status = 404, description = "No ticket matched"))
)]
pub async fn search_first(State(state): State<ServerState>, Query(q): Query<KeywordQuery>) -> ApiResult<Ticket> {
    state
        .tickets
        .search_first(&q.keyword)
        .await?
        .map(Json)
        .ok_or_else(|| service::errors::ServiceError::not_found("matching ticket").into())
}

#[utoipa::path(
    get, path = "/tickets/status/{status}", tag = "tickets",
    params(("status" = String, Path, description = "in_progress | completed | in_review | assigned | deferred | rejected")),
    responses((status = 200, description = "Tickets with the status"), (status = 400, description = "Validation Error"))
)]
pub async fn filter_by_status(State(state): State<ServerState>, Path(status): Path<String>) -> ApiResult<Vec<Ticket>> {
    Ok(Json(state.tickets.filter_by_status(&status).await?))
}

#[utoipa::path(
    get, path = "/tickets/priority/{priority}", tag = "tickets",
    params(("priority" = String, Path, description = "high | medium | low")),
    responses((status = 200, description = "Tickets with the priority"), (status = 400, description = "Validation Error"))
)]
pub async fn filter_by_priority(State(state): State<ServerState>, Path(priority): Path<String>) -> ApiResult<Vec<Ticket>> {
    Ok(Json(state.tickets.filter_by_priority(&priority).await?))
}

#[utoipa::path(
    patch, path = "/tickets/{id}", tag = "tickets",
    params(("id" = String, Path, description = "Ticket ID")),
    request_body = crate::openapi::AuthorUpdateDoc,
    responses(
        (status = 200, description = "Updated", body = crate::openapi::TicketDoc),
        (status = 400, description = "Validation Error"),
        (status = 403, description = "Caller is not the author"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_as_author(
    State(state): State<ServerState>,
    caller: Caller,
    Path(id): Path<String>,
    payload: Result<Json<AuthorUpdate>, JsonRejection>,
) -> ApiResult<Ticket> {
    let Json(update) = payload?;
    Ok(Json(state.tickets.update_as_author(&caller.context(), &id, update).await?))
}

#[utoipa::path(
    patch, path = "/tickets/{id}/assignee", tag = "tickets",
    params(("id" = String, Path, description = "Ticket ID")),
    request_body = crate::openapi::AssigneeUpdateDoc,
    responses(
        (status = 200, description = "Updated", body = crate::openapi::TicketDoc),
        (status = 403, description = "Caller is not the assignee"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_as_assignee(
    State(state): State<ServerState>,
    caller: Caller,
    Path(id): Path<String>,
    payload: Result<Json<AssigneeUpdate>, JsonRejection>,
) -> ApiResult<Ticket> {
    let Json(update) = payload?;
    Ok(Json(state.tickets.update_as_assignee(&caller.context(), &id, update).await?))
}

#[utoipa::path(
    delete, path = "/tickets/{id}", tag = "tickets",
    params(("id" = String, Path, description = "Ticket ID")),
    responses(
        (status = 200, description = "Deleted; body is the removed ticket", body = crate::openapi::TicketDoc),
        (status = 403, description = "Caller is not the author"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete(State(state): State<ServerState>, caller: Caller, Path(id): Path<String>) -> ApiResult<Ticket> {
    Ok(Json(state.tickets.delete(&caller.context(), &id).await?))
}
