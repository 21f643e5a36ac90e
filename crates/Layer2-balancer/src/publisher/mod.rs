//! Publishers - 현재 살아있는 엔드포인트 집합을 제공
//!
//! - `fixed.rs` - FixedPublisher: `replace`로 집합을 재조정하는 레지스트리
//! - `static.rs` - StaticPublisher: 정적 목록으로 미리 채운 FixedPublisher

pub mod fixed;
pub mod r#static;

use crate::endpoint::SharedEndpoint;
use crate::error::Result;

pub use fixed::FixedPublisher;
pub use r#static::StaticPublisher;

/// Source of the current endpoint set.
///
/// Each call returns an independent, ordered snapshot; mutating the
/// publisher afterwards never changes a snapshot already handed out.
pub trait Publisher<Req, Resp>: Send + Sync {
    fn endpoints(&self) -> Result<Vec<SharedEndpoint<Req, Resp>>>;
}
