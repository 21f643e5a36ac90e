//! Error types for Dispatch
//!
//! 모든 에러를 중앙에서 관리

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Dispatch 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 설정 관련
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // 호출 관련
    // ========================================================================
    #[error("No endpoints available")]
    NoEndpoints,

    #[error("Deadline exceeded")]
    DeadlineExceeded,

    #[error("Cancelled")]
    Cancelled,

    #[error("Endpoint error: {0}")]
    Endpoint(String),

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    // ========================================================================
    // 기타
    // ========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// 재시도 가능한 에러인지 확인
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::NoEndpoints | Error::Endpoint(_) | Error::Io(_))
    }

    /// 호출 예산(데드라인/취소) 소진으로 끝난 에러인지 확인
    pub fn is_terminal(&self) -> bool {
        matches!(self, Error::DeadlineExceeded | Error::Cancelled)
    }
}

// ============================================================================
// From 구현 (추가 변환)
// ============================================================================

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Internal(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Internal(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(Error::NoEndpoints.is_retryable());
        assert!(Error::Endpoint("boom".into()).is_retryable());
        assert!(!Error::DeadlineExceeded.is_retryable());
        assert!(Error::DeadlineExceeded.is_terminal());
        assert!(Error::Cancelled.is_terminal());
        assert!(!Error::Config("bad".into()).is_terminal());
    }

    #[test]
    fn test_display() {
        assert_eq!(Error::NoEndpoints.to_string(), "No endpoints available");
        assert_eq!(
            Error::Config("max_attempts must be positive".into()).to_string(),
            "Configuration error: max_attempts must be positive"
        );
        let err: Error = "oops".into();
        assert!(matches!(err, Error::Internal(ref m) if m == "oops"));
    }
}
