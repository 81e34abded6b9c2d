use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct TicketDoc {
    pub id: String,
    pub title: String,
    pub description: String,
    /// in_progress | completed | in_review | assigned | deferred | rejected
    pub status: Option<String>,
    /// high | medium | low
    pub priority: String,
    pub assigned_to: String,
    pub author: String,
    pub created_at: String,
    pub updated_at: Option<String>,
    pub comments: Option<String>,
    pub due_date: String,
}

#[derive(ToSchema)]
pub struct NewTicketDoc {
    pub title: String,
    pub description: String,
    pub priority: String,
    pub assigned_to: String,
    /// `YYYY-MM-DD` or RFC 3339
    pub due_date: String,
    pub comments: Option<String>,
    pub status: Option<String>,
}

/// Omitted fields are kept; `null` clears `status` or `comments`.
#[derive(ToSchema)]
pub struct AuthorUpdateDoc {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub comments: Option<String>,
    pub due_date: Option<String>,
}

#[derive(ToSchema)]
pub struct AssigneeUpdateDoc {
    pub status: Option<String>,
    pub comments: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::tickets::create,
        crate::routes::tickets::list_first,
        crate::routes::tickets::list_all,
        crate::routes::tickets::list_page,
        crate::routes::tickets::get,
        crate::routes::tickets::search,
        crate::routes::tickets::search_first,
        crate::routes::tickets::filter_by_status,
        crate::routes::tickets::filter_by_priority,
        crate::routes::tickets::update_as_author,
        crate::routes::tickets::update_as_assignee,
        crate::routes::tickets::delete,
    ),
    components(
        schemas(
            HealthResponse,
            TicketDoc,
            NewTicketDoc,
            AuthorUpdateDoc,
            AssigneeUpdateDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "tickets")
    )
)]
pub struct ApiDoc;
