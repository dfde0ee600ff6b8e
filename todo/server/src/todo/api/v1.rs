use crate::entities::sea_orm_active_enums::{Priority, RecurrenceType};
use crate::todo::query::{self, TodoFilter};
use crate::todo::{Comment, Todo, TodoDraft, TodoServiceError, TodoState};
use crate::web::api::ErrorResponse;
use axum::{
    Router,
    extract::{
        FromRequest, FromRequestParts, Path, Query, Request, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderName, StatusCode, header, request::Parts},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

/// Response header carrying the number of todos matching the listing filters.
pub const TOTAL_COUNT_HEADER: HeaderName = HeaderName::from_static("x-total-count");
/// Response header carrying the number of pages for the listing filters.
pub const TOTAL_PAGES_HEADER: HeaderName = HeaderName::from_static("x-total-pages");

/// [`Json`] extractor that reports unreadable bodies as validation errors.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = TodoServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// [`Query`] extractor that reports unparsable query strings as validation errors.
#[derive(Debug)]
pub struct QueryParams<T>(pub T);

impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    Query<T>: FromRequestParts<S, Rejection = QueryRejection>,
    S: Send + Sync,
{
    type Rejection = TodoServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

impl From<JsonRejection> for TodoServiceError {
    fn from(rejection: JsonRejection) -> Self {
        TodoServiceError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for TodoServiceError {
    fn from(rejection: QueryRejection) -> Self {
        TodoServiceError::Validation(rejection.body_text())
    }
}

/// JSON representation of a comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentJson {
    id: i32,
    content: String,
    created_date: DateTime<Utc>,
    todo_id: i32,
}

impl From<Comment> for CommentJson {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            content: comment.content,
            created_date: comment.created_date,
            todo_id: comment.todo_id,
        }
    }
}

/// JSON representation of a todo for API responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TodoJson {
    id: i32,
    title: String,
    description: String,
    is_completed: bool,
    created_date: DateTime<Utc>,
    /// 0 = Low, 1 = Medium, 2 = High
    #[schema(value_type = i32)]
    priority: Priority,
    category: String,
    /// 0 = Daily, 1 = Weekly, 2 = Monthly, 3 = Yearly
    #[schema(value_type = Option<i32>)]
    recurrence_type: Option<RecurrenceType>,
    recurrence_interval: Option<i32>,
    next_due_date: Option<DateTime<Utc>>,
    last_completed_date: Option<DateTime<Utc>>,
    comments: Vec<CommentJson>,
}

impl From<Todo> for TodoJson {
    fn from(todo: Todo) -> Self {
        Self {
            id: todo.id,
            title: todo.title,
            description: todo.description,
            is_completed: todo.is_completed,
            created_date: todo.created_date,
            priority: todo.priority,
            category: todo.category,
            recurrence_type: todo.recurrence_type,
            recurrence_interval: todo.recurrence_interval,
            next_due_date: todo.next_due_date,
            last_completed_date: todo.last_completed_date,
            comments: todo.comments.into_iter().map(CommentJson::from).collect(),
        }
    }
}

/// Nested comment accepted on import. Only the content is kept.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CommentPayload {
    content: String,
}

/// Todo fields accepted by create, update and import.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TodoPayload {
    /// Required on update, ignored on create and import.
    #[serde(default)]
    id: Option<i32>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    is_completed: bool,
    #[serde(default)]
    #[schema(value_type = Option<i32>)]
    priority: Option<Priority>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<i32>)]
    recurrence_type: Option<RecurrenceType>,
    #[serde(default)]
    recurrence_interval: Option<i32>,
    #[serde(default)]
    next_due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    last_completed_date: Option<DateTime<Utc>>,
    #[serde(default)]
    comments: Vec<CommentPayload>,
}

impl From<TodoPayload> for TodoDraft {
    fn from(payload: TodoPayload) -> Self {
        Self {
            id: payload.id,
            title: payload.title,
            description: payload.description,
            is_completed: payload.is_completed,
            priority: payload.priority,
            category: payload.category,
            recurrence_type: payload.recurrence_type,
            recurrence_interval: payload.recurrence_interval,
            next_due_date: payload.next_due_date,
            last_completed_date: payload.last_completed_date,
            comments: payload
                .comments
                .into_iter()
                .map(|comment| comment.content)
                .collect(),
        }
    }
}

/// Query parameters for listing todos. Empty values are treated as absent.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TodosQuery {
    /// 1-based page number, defaults to 1
    #[serde(default, deserialize_with = "empty_string_as_none")]
    page: Option<i64>,
    /// Case-sensitive substring matched against title or description
    #[serde(default, deserialize_with = "empty_string_as_none")]
    search: Option<String>,
    /// Exact category
    #[serde(default, deserialize_with = "empty_string_as_none")]
    category: Option<String>,
    /// Priority code (0-2) or name
    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[param(value_type = Option<i32>)]
    priority: Option<Priority>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    is_completed: Option<bool>,
}

impl TodosQuery {
    fn filter(&self) -> TodoFilter {
        TodoFilter {
            search: self.search.clone(),
            category: self.category.clone(),
            priority: self.priority,
            is_completed: self.is_completed,
        }
    }
}

fn empty_string_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let value = Option::<String>::deserialize(deserializer)?;
    match value.as_deref() {
        None | Some("") => Ok(None),
        Some(value) => T::from_str(value).map(Some).map_err(de::Error::custom),
    }
}

impl IntoResponse for TodoServiceError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            TodoServiceError::Validation(message) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                message.clone(),
            ),
            TodoServiceError::IdMismatch { .. } => {
                (StatusCode::BAD_REQUEST, "ID_MISMATCH", self.to_string())
            }
            TodoServiceError::TodoNotFound(_) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", self.to_string())
            }
            TodoServiceError::Database(err) => {
                tracing::error!("Todo request failed: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An unexpected error occurred while processing your request".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse::new(error, message))).into_response()
    }
}

/// Handler for GET /todos - Returns one page of todos with pagination headers.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/todos",
    params(TodosQuery),
    responses(
        (status = 200, description = "One page of todos", body = Vec<TodoJson>,
            headers(
                ("X-Total-Count" = usize, description = "Number of matching todos"),
                ("X-Total-Pages" = usize, description = "Number of pages")
            )),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn list_todos_handler(
    State(state): State<Arc<TodoState>>,
    QueryParams(params): QueryParams<TodosQuery>,
) -> Result<impl IntoResponse, TodoServiceError> {
    let page = query::normalize_page(params.page);
    let todos = state.service().list_todos(&params.filter(), page).await?;

    let headers = [
        (TOTAL_COUNT_HEADER, todos.total_count.to_string()),
        (TOTAL_PAGES_HEADER, todos.total_pages.to_string()),
    ];
    let body: Vec<TodoJson> = todos.items.into_iter().map(TodoJson::from).collect();
    Ok((headers, Json(body)))
}

/// Handler for GET /todos/categories - Returns the categories in use.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/todos/categories",
    responses(
        (status = 200, description = "Distinct categories, or the default set when none exist", body = Vec<String>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn categories_handler(
    State(state): State<Arc<TodoState>>,
) -> Result<Json<Vec<String>>, TodoServiceError> {
    let categories = state.service().get_categories().await?;
    Ok(Json(categories))
}

/// Handler for GET /todos/{id}.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/todos/{id}",
    params(("id" = i32, Path, description = "Todo ID")),
    responses(
        (status = 200, description = "The todo with its comments", body = TodoJson),
        (status = 404, description = "Todo not found", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn get_todo_handler(
    State(state): State<Arc<TodoState>>,
    Path(id): Path<i32>,
) -> Result<Json<TodoJson>, TodoServiceError> {
    let todo = state.service().get_todo_by_id(id).await?;
    Ok(Json(TodoJson::from(todo)))
}

/// Handler for POST /todos.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    post,
    path = "/todos",
    request_body = TodoPayload,
    responses(
        (status = 201, description = "Todo created", body = TodoJson,
            headers(("Location" = String, description = "URL of the created todo"))),
        (status = 400, description = "Missing or unreadable body, or blank title", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn create_todo_handler(
    State(state): State<Arc<TodoState>>,
    JsonBody(payload): JsonBody<Option<TodoPayload>>,
) -> Result<impl IntoResponse, TodoServiceError> {
    let payload = payload.ok_or_else(|| {
        TodoServiceError::Validation("A todo is required in the request body".to_string())
    })?;
    let todo = state.service().create_todo(payload.into()).await?;
    let location = format!("/todos/{}", todo.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(TodoJson::from(todo)),
    ))
}

/// Handler for PUT /todos/{id} - Replaces the todo.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    put,
    path = "/todos/{id}",
    params(("id" = i32, Path, description = "Todo ID")),
    request_body = TodoPayload,
    responses(
        (status = 204, description = "Todo updated"),
        (status = 400, description = "ID mismatch or blank title", body = ErrorResponse),
        (status = 404, description = "Todo not found", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn update_todo_handler(
    State(state): State<Arc<TodoState>>,
    Path(id): Path<i32>,
    JsonBody(payload): JsonBody<TodoPayload>,
) -> Result<StatusCode, TodoServiceError> {
    state.service().update_todo(id, payload.into()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for DELETE /todos/{id} - Deletes the todo and its comments.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/todos/{id}",
    params(("id" = i32, Path, description = "Todo ID")),
    responses(
        (status = 204, description = "Todo deleted"),
        (status = 404, description = "Todo not found", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn delete_todo_handler(
    State(state): State<Arc<TodoState>>,
    Path(id): Path<i32>,
) -> Result<StatusCode, TodoServiceError> {
    state.service().delete_todo_by_id(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for POST /todos/{id}/comments - Body is the comment text as a JSON string.
#[tracing::instrument(skip(state, content))]
#[utoipa::path(
    post,
    path = "/todos/{id}/comments",
    params(("id" = i32, Path, description = "Todo ID")),
    request_body = String,
    responses(
        (status = 201, description = "Comment created", body = CommentJson),
        (status = 400, description = "Blank comment", body = ErrorResponse),
        (status = 404, description = "Todo not found", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn add_comment_handler(
    State(state): State<Arc<TodoState>>,
    Path(id): Path<i32>,
    JsonBody(content): JsonBody<String>,
) -> Result<(StatusCode, Json<CommentJson>), TodoServiceError> {
    let comment = state.service().add_comment(id, content).await?;
    Ok((StatusCode::CREATED, Json(CommentJson::from(comment))))
}

/// Handler for POST /todos/import - Stores every todo in the body as a new record.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    post,
    path = "/todos/import",
    request_body = Vec<TodoPayload>,
    responses(
        (status = 200, description = "The persisted todos", body = Vec<TodoJson>),
        (status = 400, description = "A todo has a blank title", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn import_todos_handler(
    State(state): State<Arc<TodoState>>,
    JsonBody(payload): JsonBody<Vec<TodoPayload>>,
) -> Result<Json<Vec<TodoJson>>, TodoServiceError> {
    let drafts = payload.into_iter().map(TodoDraft::from).collect();
    let imported = state.service().import_todos(drafts).await?;
    Ok(Json(imported.into_iter().map(TodoJson::from).collect()))
}

/// Handler for GET /todos/export - Returns every todo with comments.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/todos/export",
    responses(
        (status = 200, description = "All todos", body = Vec<TodoJson>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn export_todos_handler(
    State(state): State<Arc<TodoState>>,
) -> Result<Json<Vec<TodoJson>>, TodoServiceError> {
    let todos = state.service().export_todos().await?;
    Ok(Json(todos.into_iter().map(TodoJson::from).collect()))
}

/// Creates and returns the todos API router.
pub fn create_api_router(state: Arc<TodoState>) -> Router {
    Router::new()
        .route("/todos", get(list_todos_handler).post(create_todo_handler))
        .route("/todos/categories", get(categories_handler))
        .route("/todos/export", get(export_todos_handler))
        .route("/todos/import", post(import_todos_handler))
        .route(
            "/todos/{id}",
            get(get_todo_handler)
                .put(update_todo_handler)
                .delete(delete_todo_handler),
        )
        .route("/todos/{id}/comments", post(add_comment_handler))
        .with_state(state)
}
