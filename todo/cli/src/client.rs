//! HTTP access to the todo server.
//!
//! [`TodoApi`] is the seam the command layer talks to; [`HttpTodoApi`] implements it
//! over `reqwest`, one request per call.

use crate::model::{Comment, ListQuery, Todo, TodoInput, TodoPage};
use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use thiserror::Error;

pub const TOTAL_COUNT_HEADER: &str = "x-total-count";
pub const TOTAL_PAGES_HEADER: &str = "x-total-pages";

/// Errors that can occur while talking to the todo server.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The request could not be sent or the response body could not be read
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The server rejected the request with a JSON error body
    #[error("{message} ({status})")]
    Api {
        status: StatusCode,
        error: String,
        message: String,
    },
    /// The server rejected the request without a readable error body
    #[error("Server responded with {0}")]
    Status(StatusCode),
    /// A pagination header was missing or not a number
    #[error("Missing or invalid {0} header")]
    Header(&'static str),
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
    message: String,
}

/// Operations the client performs against the todo server.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TodoApi: Send + Sync {
    /// Fetches one page of todos along with the pagination totals.
    async fn list(&self, query: ListQuery) -> Result<TodoPage, ClientError>;

    async fn categories(&self) -> Result<Vec<String>, ClientError>;

    async fn get(&self, id: i32) -> Result<Todo, ClientError>;

    async fn create(&self, todo: TodoInput) -> Result<Todo, ClientError>;

    /// Replaces every field of the todo. The server answers with no body.
    async fn update(&self, id: i32, todo: TodoInput) -> Result<(), ClientError>;

    async fn delete(&self, id: i32) -> Result<(), ClientError>;

    async fn add_comment(&self, id: i32, content: String) -> Result<Comment, ClientError>;

    async fn import(&self, todos: Vec<TodoInput>) -> Result<Vec<Todo>, ClientError>;

    async fn export(&self) -> Result<Vec<Todo>, ClientError>;
}

/// [`TodoApi`] backed by a running todo server.
#[derive(Debug, Clone)]
pub struct HttpTodoApi {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTodoApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn list_request(&self, query: &ListQuery) -> reqwest::RequestBuilder {
        self.client.get(self.url("/todos")).query(&query.to_pairs())
    }
}

/// Passes successful responses through and turns failures into [`ClientError`]s.
async fn checked(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    match response.json::<ErrorBody>().await {
        Ok(body) => Err(ClientError::Api {
            status,
            error: body.error,
            message: body.message,
        }),
        Err(_) => Err(ClientError::Status(status)),
    }
}

fn header_number(response: &Response, name: &'static str) -> Result<u32, ClientError> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
        .ok_or(ClientError::Header(name))
}

#[async_trait]
impl TodoApi for HttpTodoApi {
    #[tracing::instrument(skip(self))]
    async fn list(&self, query: ListQuery) -> Result<TodoPage, ClientError> {
        let response = checked(self.list_request(&query).send().await?).await?;
        let total_count = header_number(&response, TOTAL_COUNT_HEADER)?;
        let total_pages = header_number(&response, TOTAL_PAGES_HEADER)?;
        let items = response.json().await?;
        Ok(TodoPage {
            items,
            total_count,
            total_pages,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn categories(&self) -> Result<Vec<String>, ClientError> {
        let response = self.client.get(self.url("/todos/categories")).send().await?;
        Ok(checked(response).await?.json().await?)
    }

    #[tracing::instrument(skip(self))]
    async fn get(&self, id: i32) -> Result<Todo, ClientError> {
        let response = self.client.get(self.url(&format!("/todos/{id}"))).send().await?;
        Ok(checked(response).await?.json().await?)
    }

    #[tracing::instrument(skip(self))]
    async fn create(&self, todo: TodoInput) -> Result<Todo, ClientError> {
        let response = self
            .client
            .post(self.url("/todos"))
            .json(&todo)
            .send()
            .await?;
        Ok(checked(response).await?.json().await?)
    }

    #[tracing::instrument(skip(self))]
    async fn update(&self, id: i32, todo: TodoInput) -> Result<(), ClientError> {
        let response = self
            .client
            .put(self.url(&format!("/todos/{id}")))
            .json(&todo)
            .send()
            .await?;
        checked(response).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: i32) -> Result<(), ClientError> {
        let response = self
            .client
            .delete(self.url(&format!("/todos/{id}")))
            .send()
            .await?;
        checked(response).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn add_comment(&self, id: i32, content: String) -> Result<Comment, ClientError> {
        let response = self
            .client
            .post(self.url(&format!("/todos/{id}/comments")))
            .json(&content)
            .send()
            .await?;
        Ok(checked(response).await?.json().await?)
    }

    #[tracing::instrument(skip(self, todos), fields(count = todos.len()))]
    async fn import(&self, todos: Vec<TodoInput>) -> Result<Vec<Todo>, ClientError> {
        let response = self
            .client
            .post(self.url("/todos/import"))
            .json(&todos)
            .send()
            .await?;
        Ok(checked(response).await?.json().await?)
    }

    #[tracing::instrument(skip(self))]
    async fn export(&self) -> Result<Vec<Todo>, ClientError> {
        let response = self.client.get(self.url("/todos/export")).send().await?;
        Ok(checked(response).await?.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Priority;

    #[test]
    fn can_build_list_url_with_filters() {
        let api = HttpTodoApi::new("http://localhost:8080/");
        let query = ListQuery {
            page: 2,
            search: Some("milk run".to_string()),
            priority: Some(Priority::Medium),
            ..Default::default()
        };

        let request = api.list_request(&query).build().unwrap();

        assert_eq!(
            request.url().as_str(),
            "http://localhost:8080/todos?page=2&search=milk+run&priority=1"
        );
    }

    #[test]
    fn can_join_paths_without_double_slash() {
        let api = HttpTodoApi::new("http://example.test/");

        assert_eq!(api.url("/todos/4"), "http://example.test/todos/4");
    }

    #[test]
    fn can_describe_api_errors_with_server_message() {
        let error = ClientError::Api {
            status: StatusCode::NOT_FOUND,
            error: "NOT_FOUND".to_string(),
            message: "Todo with ID 4 not found".to_string(),
        };

        assert_eq!(error.to_string(), "Todo with ID 4 not found (404 Not Found)");
    }
}
