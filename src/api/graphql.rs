use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CACHE_CONTROL};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::{BoardApi, TaskStatusEcho};
use crate::error::ApiError;
use crate::types::{ActivityEvent, ProjectBoard, ProjectId, TaskId, TaskStatus};

const GET_PROJECT: &str = "query GetProject($id: Int!) { project(id: $id) { id name description tasks { id title status assignees { id email firstName } } } }";
const UPDATE_TASK_STATUS: &str = "mutation UpdateTaskStatus($id: Int!, $status: String!) { updateTask(id: $id, status: $status) { task { id status } } }";
const GET_PROJECT_ACTIVITY: &str = "query GetProjectActivity($projectId: Int!, $limit: Int) { projectActivity(projectId: $projectId, limit: $limit) { id action description userName createdAt task { id title } } }";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: String,
    pub token: Option<String>,
    pub auth_scheme: String,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000/graphql/".to_string(),
            token: None,
            auth_scheme: "JWT".to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GraphqlClient {
    http: reqwest::Client,
    config: ClientConfig,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ProjectData {
    project: Option<ProjectBoard>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateTaskData {
    update_task: Option<UpdateTaskPayload>,
}

#[derive(Debug, Deserialize)]
struct UpdateTaskPayload {
    task: Option<TaskStatusEcho>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActivityData {
    #[serde(default)]
    project_activity: Option<Vec<ActivityEvent>>,
}

impl GraphqlClient {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| ApiError::Network(format!("failed to build HTTP client: {err}")))?;
        Ok(Self { http, config })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &str,
        query: &str,
        variables: Value,
        bypass_cache: bool,
    ) -> Result<T, ApiError> {
        let mut request = self.http.post(&self.config.endpoint).json(&json!({
            "operationName": operation,
            "query": query,
            "variables": variables,
        }));
        if let Some(token) = self.config.token.as_deref().filter(|t| !t.is_empty()) {
            request = request.header(
                AUTHORIZATION,
                format!("{} {}", self.config.auth_scheme, token),
            );
        }
        if bypass_cache {
            request = request.header(CACHE_CONTROL, "no-cache");
        }

        let response = request.send().await.map_err(|err| {
            warn!(operation, error = %err, "graphql request failed");
            ApiError::Network(err.to_string())
        })?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Unauthorized);
        }
        let body = response
            .bytes()
            .await
            .map_err(|err| ApiError::Network(err.to_string()))?;
        debug!(operation, status = status.as_u16(), bytes = body.len(), "graphql response");

        let envelope = serde_json::from_slice::<Envelope<T>>(&body);
        if !status.is_success() {
            // Validation failures come back as 400 with a regular error list.
            return match envelope {
                Ok(envelope) if !envelope.errors.is_empty() => Err(classify(envelope.errors)),
                _ => Err(ApiError::Http(status.as_u16())),
            };
        }

        let envelope = envelope.map_err(|err| ApiError::Decode(err.to_string()))?;
        if !envelope.errors.is_empty() {
            return Err(classify(envelope.errors));
        }
        envelope
            .data
            .ok_or_else(|| ApiError::Decode(format!("{operation} returned no data")))
    }
}

fn classify(errors: Vec<GraphqlError>) -> ApiError {
    if errors
        .iter()
        .any(|err| err.message.contains("Not authenticated"))
    {
        return ApiError::Unauthorized;
    }
    let message = errors
        .into_iter()
        .map(|err| err.message)
        .collect::<Vec<_>>()
        .join("; ");
    ApiError::Rejected(message)
}

impl BoardApi for GraphqlClient {
    async fn fetch_project_tasks(&self, project_id: ProjectId) -> Result<ProjectBoard, ApiError> {
        let data: ProjectData = self
            .execute("GetProject", GET_PROJECT, json!({ "id": project_id.0 }), false)
            .await?;
        data.project
            .ok_or_else(|| ApiError::Rejected("project not found".to_string()))
    }

    async fn update_task_status(
        &self,
        task_id: TaskId,
        status: TaskStatus,
    ) -> Result<TaskStatusEcho, ApiError> {
        let data: UpdateTaskData = self
            .execute(
                "UpdateTaskStatus",
                UPDATE_TASK_STATUS,
                json!({ "id": task_id.0, "status": status.as_str() }),
                false,
            )
            .await?;
        data.update_task
            .and_then(|payload| payload.task)
            .ok_or_else(|| ApiError::Decode("updateTask returned no task".to_string()))
    }

    async fn fetch_activity(
        &self,
        project_id: ProjectId,
        limit: usize,
    ) -> Result<Vec<ActivityEvent>, ApiError> {
        let data: ActivityData = self
            .execute(
                "GetProjectActivity",
                GET_PROJECT_ACTIVITY,
                json!({ "projectId": project_id.0, "limit": limit }),
                true,
            )
            .await?;
        Ok(data.project_activity.unwrap_or_default())
    }
}
