//! Call context - cancellation and deadline for one logical call
//!
//! A `CallContext` carries a cancellation token and an optional deadline.
//! Children inherit cancellation from their parent and never outlive the
//! parent's deadline. Cancellation is cooperative: endpoints observe
//! [`CallContext::done`] or [`CallContext::check`], nothing is aborted.

use crate::error::{BalancerError, Result};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Cancellation token plus optional deadline, cheap to clone
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// A root context expiring `timeout` from now. A timeout too large to
    /// represent as an instant means no deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    /// A root context expiring at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// Derive a child whose deadline is the earlier of the parent's and
    /// `now + timeout`. Cancelling the parent cancels the child.
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let deadline = match (self.deadline, Instant::now().checked_add(timeout)) {
            (Some(parent), Some(candidate)) => Some(parent.min(candidate)),
            (parent, candidate) => parent.or(candidate),
        };

        Self {
            token: self.token.child_token(),
            deadline,
        }
    }

    /// Derive a child with the same deadline.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `None` when there is no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancels this context when the guard is dropped.
    pub fn drop_guard(&self) -> DropGuard {
        self.token.clone().drop_guard()
    }

    /// `Err` if the context is already cancelled or past its deadline.
    pub fn check(&self) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(BalancerError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(BalancerError::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Resolves once the context is cancelled or its deadline passes,
    /// yielding the reason.
    pub async fn done(&self) -> BalancerError {
        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                _ = self.token.cancelled() => BalancerError::Cancelled,
                _ = tokio::time::sleep_until(deadline) => BalancerError::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                BalancerError::Cancelled
            }
        }
    }
}
