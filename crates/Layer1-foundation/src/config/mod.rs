//! Config - 디스패치 설정 관리
//!
//! - `dispatch.rs` - DispatchConfig (인스턴스, 전략, 재시도)

mod dispatch;

pub use dispatch::{DispatchConfig, RetrySettings, StrategyConfig};
