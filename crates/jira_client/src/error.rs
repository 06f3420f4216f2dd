use http::StatusCode;
use thiserror::Error;

/// Non-success response from the source API. Carries the status and response
/// body so a failed run can be diagnosed without replaying it.
#[derive(Debug, Error)]
#[error("jira api error: {status} for {endpoint}: {body}")]
pub struct JiraApiError {
    pub status: StatusCode,
    pub endpoint: String,
    pub body: String,
}

impl JiraApiError {
    pub fn new(status: StatusCode, endpoint: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            status,
            endpoint: endpoint.into(),
            body: body.into(),
        }
    }

    /// Transient statuses are worth retrying with backoff; everything else
    /// fails the fetch immediately.
    pub fn is_transient(&self) -> bool {
        self.status == StatusCode::TOO_MANY_REQUESTS || self.status.is_server_error()
    }
}
