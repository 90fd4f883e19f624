use thiserror::Error;

use crate::types::TaskId;

/// Failure of one remote call, classified from the transport, the HTTP status
/// and the GraphQL `errors` array.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("network unavailable: {0}")]
    Network(String),
    #[error("Not authenticated")]
    Unauthorized,
    #[error("server responded with HTTP {0}")]
    Http(u16),
    #[error("{0}")]
    Rejected(String),
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("task {0} already has a move in flight")]
    MutationInFlight(TaskId),
    #[error("move of task {task_id} was rejected: {cause}")]
    RemoteRejected { task_id: TaskId, cause: ApiError },
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),
    #[error("failed to load board: {0}")]
    FetchFailed(ApiError),
    #[error("task {0} is not on this board")]
    UnknownTask(TaskId),
}

impl BoardError {
    /// Board fetch failures keep network trouble apart from everything else.
    pub fn from_fetch(err: ApiError) -> Self {
        match err {
            ApiError::Network(message) => Self::NetworkUnavailable(message),
            other => Self::FetchFailed(other),
        }
    }
}
