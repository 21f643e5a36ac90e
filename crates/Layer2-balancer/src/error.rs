//! Balancer-specific error types
//!
//! BalancerError는 레지스트리/선택/재시도 계층의 세부 에러를 관리합니다.
//! dispatch_foundation::Error와의 변환을 지원합니다.

use dispatch_foundation::Error as FoundationError;
use thiserror::Error;

/// Error type returned by endpoints, factories and releasers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type alias
pub type Result<T> = std::result::Result<T, BalancerError>;

/// Errors that can occur while resolving, selecting or invoking endpoints
#[derive(Error, Debug)]
pub enum BalancerError {
    /// Factory could not turn an instance into an endpoint
    #[error("Failed to resolve instance '{instance}': {source}")]
    InstanceResolution {
        instance: String,
        #[source]
        source: BoxError,
    },

    /// Releaser failed while dropping a removed binding
    #[error("Failed to release instance '{instance}': {source}")]
    Release {
        instance: String,
        #[source]
        source: BoxError,
    },

    /// Selection against an empty endpoint set
    #[error("No endpoints available")]
    NoEndpoints,

    /// The shared call deadline elapsed
    #[error("Deadline exceeded")]
    DeadlineExceeded,

    /// The caller cancelled its context
    #[error("Cancelled")]
    Cancelled,

    /// The endpoint reported a failure
    #[error(transparent)]
    Endpoint(BoxError),

    /// The invocation task panicked
    #[error("Endpoint panicked: {0}")]
    Panicked(String),
}

impl BalancerError {
    /// Whether another attempt may still succeed.
    ///
    /// Deadline and cancellation end the whole call; everything the
    /// selection+invocation cycle reports is an attempt failure.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BalancerError::NoEndpoints | BalancerError::Endpoint(_) | BalancerError::Panicked(_)
        )
    }

    pub fn is_deadline(&self) -> bool {
        matches!(self, BalancerError::DeadlineExceeded)
    }

    /// Wrap an endpoint failure. A `BalancerError` reported by a nested
    /// balancer (such as an inner `Retry`) is kept as it is.
    pub fn endpoint(err: impl Into<BoxError>) -> Self {
        let err: BoxError = err.into();
        match err.downcast::<BalancerError>() {
            Ok(inner) => *inner,
            Err(err) => BalancerError::Endpoint(err),
        }
    }
}

// ============================================================================
// dispatch_foundation::Error 변환
// ============================================================================

impl From<BalancerError> for FoundationError {
    fn from(err: BalancerError) -> Self {
        match err {
            BalancerError::NoEndpoints => FoundationError::NoEndpoints,
            BalancerError::DeadlineExceeded => FoundationError::DeadlineExceeded,
            BalancerError::Cancelled => FoundationError::Cancelled,
            BalancerError::Endpoint(source) => FoundationError::Endpoint(source.to_string()),
            BalancerError::Panicked(msg) => FoundationError::Endpoint(format!("panicked: {}", msg)),
            other @ (BalancerError::InstanceResolution { .. } | BalancerError::Release { .. }) => {
                FoundationError::Internal(other.to_string())
            }
        }
    }
}
