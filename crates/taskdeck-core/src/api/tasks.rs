//! Task CRUD operations.
//!
//! Thin wrappers: build a request, send it through the authenticated client,
//! map the status, parse the body. Task fields pass through unmodified; all
//! validation is the server's.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::client::{ApiClient, read_json};
use super::error::ApiResult;
use super::request::ApiRequest;

/// A task as returned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub deadline: NaiveDateTime,
    pub is_done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
}

/// Payload for creating a task (no id; the server assigns one).
#[derive(Debug, Clone, Serialize)]
pub struct NewTask {
    pub title: String,
    pub content: String,
    pub deadline: NaiveDateTime,
    pub is_done: bool,
}

/// Partial update. Unset fields are left out of the payload so the server
/// only touches what the caller changed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_done: Option<bool>,
}

impl TaskPatch {
    /// Returns true when no field is set.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.deadline.is_none()
            && self.is_done.is_none()
    }
}

/// Confirmation envelope returned by the delete endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskReceipt {
    pub id: i64,
    pub message: String,
}

/// Fetches all tasks for the current user.
///
/// # Errors
/// Returns an error on transport failure, expired session, or a rejected
/// request.
pub async fn list_tasks(client: &ApiClient) -> ApiResult<Vec<Task>> {
    let response = client
        .send_authenticated(ApiRequest::get(client.tasks_url()))
        .await?;
    read_json(response).await
}

/// Fetches a single task by id.
///
/// # Errors
/// Returns an error if the operation fails.
pub async fn get_task(client: &ApiClient, id: i64) -> ApiResult<Task> {
    let url = format!("{}/{id}", client.tasks_url());
    let response = client.send_authenticated(ApiRequest::get(url)).await?;
    read_json(response).await
}

/// Creates a task and returns the server's version of it.
///
/// # Errors
/// Returns an error if the operation fails.
pub async fn create_task(client: &ApiClient, task: &NewTask) -> ApiResult<Task> {
    let url = format!("{}/create", client.tasks_url());
    let request = ApiRequest::post(url).json(task)?;
    let response = client.send_authenticated(request).await?;
    read_json(response).await
}

/// Applies a partial update and returns the updated task.
///
/// # Errors
/// Returns an error if the operation fails.
pub async fn update_task(client: &ApiClient, id: i64, patch: &TaskPatch) -> ApiResult<Task> {
    let url = format!("{}/{id}", client.tasks_url());
    let request = ApiRequest::patch(url).json(patch)?;
    let response = client.send_authenticated(request).await?;
    read_json(response).await
}

/// Deletes a task.
///
/// # Errors
/// Returns an error if the operation fails.
pub async fn delete_task(client: &ApiClient, id: i64) -> ApiResult<TaskReceipt> {
    let url = format!("{}/{id}", client.tasks_url());
    let response = client.send_authenticated(ApiRequest::delete(url)).await?;
    read_json(response).await
}
