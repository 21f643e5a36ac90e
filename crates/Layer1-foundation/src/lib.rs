//! # dispatch-foundation
//!
//! Foundation layer for Dispatch:
//! - Error: 워크스페이스 공통 에러 타입
//! - Config: 디스패치 설정 (인스턴스 목록, 선택 전략, 재시도 정책)
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Service Discovery / Config                             │
//! │                     │ instance ids                      │
//! │                     ▼                                   │
//! │          FixedPublisher (replace / endpoints)           │
//! │                     │ snapshot                          │
//! │          ┌─────────┴─────────┐                          │
//! │          ▼                   ▼                          │
//! │     RoundRobin            Random                        │
//! │          └─────────┬─────────┘                          │
//! │                    ▼                                    │
//! │           Retry (attempts + deadline)                   │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Config
// ============================================================================
pub use config::{DispatchConfig, RetrySettings, StrategyConfig};
