use crate::todo::api::v1 as todos_v1;
use axum::Router;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use crate::todo::TodoState;

/// JSON response for API errors
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: String) -> Self {
        Self {
            error: error.to_string(),
            message,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        todos_v1::list_todos_handler,
        todos_v1::categories_handler,
        todos_v1::get_todo_handler,
        todos_v1::create_todo_handler,
        todos_v1::update_todo_handler,
        todos_v1::delete_todo_handler,
        todos_v1::add_comment_handler,
        todos_v1::import_todos_handler,
        todos_v1::export_todos_handler,
    ),
    components(schemas(
        todos_v1::TodoJson,
        todos_v1::CommentJson,
        todos_v1::TodoPayload,
        todos_v1::CommentPayload,
        ErrorResponse
    )),
    tags((name = "Todos", description = "Todo tracking"))
)]
pub struct ApiDoc;

/// Creates the JSON API routes together with the OpenAPI document and Swagger UI.
pub fn create_api_router(todo_state: Arc<TodoState>) -> Router {
    let todos_router = todos_v1::create_api_router(todo_state);
    Router::new()
        .merge(todos_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
