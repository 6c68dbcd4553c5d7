//! Error taxonomy for network teardown

use thiserror::Error;

/// Errors surfaced by a network provider or the teardown orchestrator.
///
/// The orchestrator only inspects two properties of an error: whether the
/// resource was already gone (`is_not_found`) and whether re-running the
/// teardown sequence is likely to help (`is_retryable`). Everything else is
/// logged and carried in the run report.
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Resource not found: {resource_type} '{resource_id}'")]
    NotFound {
        resource_type: &'static str,
        resource_id: String,
    },

    /// The provider refused a delete because a child still references the
    /// resource. Usually transient during teardown: the child delete has not
    /// propagated yet.
    #[error("Dependency violation: {0}")]
    DependencyViolation(String),

    #[error("Rate limit exceeded: {0}")]
    Throttled(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Network '{network_id}' still not deletable after {attempts} teardown passes")]
    RetriesExhausted { network_id: String, attempts: u32 },
}

impl CloudError {
    /// Check if this is a "not found / already deleted" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, CloudError::NotFound { .. })
    }

    /// Check if re-running the teardown sequence may recover from this error
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CloudError::DependencyViolation(_) | CloudError::Throttled(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
