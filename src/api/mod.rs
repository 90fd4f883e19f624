//! Remote operations the board depends on.
//!
//! The engine only sees [`BoardApi`]; the GraphQL client is one
//! implementation and tests substitute scripted fakes.

mod graphql;

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::types::{ActivityEvent, ProjectBoard, ProjectId, TaskId, TaskStatus};

pub use graphql::{ClientConfig, GraphqlClient};

/// What the server reports back after a status update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatusEcho {
    pub id: TaskId,
    #[serde(
        deserialize_with = "crate::types::deserialize_lenient_status",
        default
    )]
    pub status: Option<TaskStatus>,
}

pub trait BoardApi: Send + Sync + 'static {
    fn fetch_project_tasks(
        &self,
        project_id: ProjectId,
    ) -> impl Future<Output = Result<ProjectBoard, ApiError>> + Send;

    fn update_task_status(
        &self,
        task_id: TaskId,
        status: TaskStatus,
    ) -> impl Future<Output = Result<TaskStatusEcho, ApiError>> + Send;

    /// Newest first, bypassing any response cache.
    fn fetch_activity(
        &self,
        project_id: ProjectId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<ActivityEvent>, ApiError>> + Send;
}
