//! Per-call cancellation and deadline context
//!
//! Every store operation receives an [`OpContext`]. The statement future is
//! raced against the context's cancellation token and deadline; when either
//! fires first the future is dropped, which releases (or discards) its pooled
//! connection, and the call returns immediately.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{KeeperError, Result};

#[derive(Debug, Clone, Default)]
pub struct OpContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl OpContext {
    /// Context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// Context expiring `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::background().timeout(timeout)
    }

    /// Context driven by an externally owned token.
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Tighten the deadline to `deadline`; an earlier existing deadline wins.
    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    /// Tighten the deadline to `timeout` from now. A timeout too large to
    /// represent leaves the deadline unchanged.
    pub fn timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.deadline(deadline),
            None => self,
        }
    }

    /// Child context: cancelled with its parent, cancellable on its own.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Fail fast if the context already ended.
    pub(crate) fn check(&self, op: &'static str) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(KeeperError::Cancelled { op });
        }
        if matches!(self.deadline, Some(d) if d <= Instant::now()) {
            return Err(KeeperError::DeadlineExceeded { op });
        }
        Ok(())
    }

    /// Drive `fut` unless the context ends first.
    pub(crate) async fn run<T, F>(&self, op: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check(op)?;

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(KeeperError::Cancelled { op }),
            _ = sleep_until(self.deadline) => Err(KeeperError::DeadlineExceeded { op }),
            res = fut => res,
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn completes_when_context_is_live() {
        let ctx = OpContext::background();
        let out = ctx.run("op", async { Ok(7) }).await.unwrap();
        assert_eq!(out, 7);
    }

    #[tokio::test]
    async fn cancelled_context_never_polls_future() {
        let ctx = OpContext::background();
        ctx.cancel();

        let polled = Arc::new(AtomicBool::new(false));
        let flag = polled.clone();
        let err = ctx
            .run("add record", async move {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, KeeperError::Cancelled { op: "add record" }));
        assert!(!polled.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_interrupts_pending_work() {
        let ctx = OpContext::with_timeout(Duration::from_millis(50));
        let err = ctx
            .run("get all records", std::future::pending::<Result<()>>())
            .await
            .unwrap_err();
        assert!(matches!(err, KeeperError::DeadlineExceeded { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_in_flight_work() {
        let ctx = OpContext::background();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });

        let err = ctx
            .run("update record", std::future::pending::<Result<()>>())
            .await
            .unwrap_err();
        assert!(matches!(err, KeeperError::Cancelled { .. }));
    }

    #[tokio::test]
    async fn child_follows_parent() {
        let parent = OpContext::background();
        let child = parent.child();
        parent.cancel();
        assert!(child.is_cancelled());

        let parent = OpContext::background();
        let child = parent.child();
        child.cancel();
        assert!(!parent.is_cancelled());
    }

    #[tokio::test]
    async fn unbounded_timeout_means_no_deadline() {
        let ctx = OpContext::with_timeout(Duration::MAX);
        assert!(ctx.remaining().is_none());
        ctx.check("op").unwrap();

        let ctx = OpContext::with_timeout(Duration::from_secs(1)).timeout(Duration::MAX);
        assert!(ctx.remaining().unwrap() <= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn earlier_deadline_wins() {
        let ctx = OpContext::with_timeout(Duration::from_secs(1)).timeout(Duration::from_secs(10));
        assert!(ctx.remaining().unwrap() <= Duration::from_secs(1));
    }
}
