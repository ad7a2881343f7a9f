// SPDX-FileCopyrightText: 2026 Lull Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fire-and-forget summary dispatch.
//!
//! Each completed chunk becomes its own task on a [`TaskTracker`], gated by a
//! semaphore so at most `max_concurrent` summaries run at once. Failures are
//! logged and the chunk is dropped.

use std::sync::Arc;
use std::time::Duration;

use lull_core::{Chunk, Summarizer};
use tokio::sync::Semaphore;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

/// Hands chunks to the summarizer without waiting for the result.
pub struct SummaryDispatcher {
    summarizer: Arc<dyn Summarizer>,
    permits: Arc<Semaphore>,
    tasks: TaskTracker,
}

impl SummaryDispatcher {
    pub fn new(summarizer: Arc<dyn Summarizer>, max_concurrent: usize) -> Self {
        Self {
            summarizer,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            tasks: TaskTracker::new(),
        }
    }

    /// Spawns a summarization task for `chunk`. Must be called from within a
    /// Tokio runtime.
    pub fn dispatch(&self, chunk: Chunk) {
        let summarizer = Arc::clone(&self.summarizer);
        let permits = Arc::clone(&self.permits);
        debug!(
            server = %chunk.server_name,
            channel = %chunk.channel_name,
            count = chunk.messages.len(),
            "dispatching conversation for summarization"
        );

        self.tasks.spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            let server = chunk.server_name.clone();
            let channel = chunk.channel_name.clone();
            if let Err(e) = summarizer.summarize(chunk).await {
                error!(server = %server, channel = %channel, error = %e, "summarization failed, dropping conversation");
            }
        });
    }

    /// Number of summaries queued or running.
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Waits until every dispatched summary has finished. Dispatching stays
    /// possible afterwards.
    pub async fn wait_idle(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }

    /// Waits up to `timeout` for in-flight summaries. Returns `false` if some
    /// were still running when the timeout elapsed.
    pub async fn drain(&self, timeout: Duration) -> bool {
        let pending = self.in_flight();
        if pending == 0 {
            info!("no in-flight summaries to drain");
            return true;
        }

        info!(count = pending, "waiting for in-flight summaries to complete");
        self.tasks.close();
        match tokio::time::timeout(timeout, self.tasks.wait()).await {
            Ok(()) => {
                info!("all summaries completed");
                true
            }
            Err(_) => {
                warn!(
                    remaining = self.in_flight(),
                    timeout_secs = timeout.as_secs(),
                    "summary drain timed out, abandoning remaining work"
                );
                false
            }
        }
    }
}

impl std::fmt::Debug for SummaryDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummaryDispatcher")
            .field("available_permits", &self.permits.available_permits())
            .field("in_flight", &self.tasks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use lull_core::LullError;

    use super::*;

    fn chunk(len: usize) -> Chunk {
        Chunk {
            channel_name: "general".into(),
            server_name: "Guild".into(),
            messages: Vec::with_capacity(len),
        }
    }

    #[derive(Default)]
    struct Gauge {
        running: AtomicUsize,
        peak: AtomicUsize,
        done: AtomicUsize,
    }

    #[async_trait]
    impl Summarizer for Gauge {
        async fn summarize(&self, _chunk: Chunk) -> Result<(), LullError> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.running.fetch_sub(1, Ordering::SeqCst);
            self.done.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl Summarizer for AlwaysFails {
        async fn summarize(&self, _chunk: Chunk) -> Result<(), LullError> {
            Err(LullError::Summarization {
                message: "backend down".into(),
                source: None,
            })
        }
    }

    struct Stuck;

    #[async_trait]
    impl Summarizer for Stuck {
        async fn summarize(&self, _chunk: Chunk) -> Result<(), LullError> {
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrency_is_bounded() {
        let gauge = Arc::new(Gauge::default());
        let dispatcher = SummaryDispatcher::new(gauge.clone(), 2);

        for _ in 0..8 {
            dispatcher.dispatch(chunk(1));
        }
        dispatcher.wait_idle().await;

        assert_eq!(gauge.done.load(Ordering::SeqCst), 8);
        assert!(gauge.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn failures_are_not_propagated() {
        let dispatcher = SummaryDispatcher::new(Arc::new(AlwaysFails), 1);
        dispatcher.dispatch(chunk(1));
        dispatcher.dispatch(chunk(1));
        dispatcher.wait_idle().await;

        assert_eq!(dispatcher.in_flight(), 0);
    }

    #[tokio::test]
    async fn dispatch_still_works_after_wait_idle() {
        let gauge = Arc::new(Gauge::default());
        let dispatcher = SummaryDispatcher::new(gauge.clone(), 1);
        dispatcher.wait_idle().await;
        dispatcher.dispatch(chunk(1));
        dispatcher.wait_idle().await;
        assert_eq!(gauge.done.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn drain_gives_up_after_timeout() {
        let dispatcher = SummaryDispatcher::new(Arc::new(Stuck), 1);
        dispatcher.dispatch(chunk(1));
        assert!(!dispatcher.drain(Duration::from_millis(20)).await);
    }

    #[tokio::test]
    async fn drain_with_nothing_pending_is_immediate() {
        let dispatcher = SummaryDispatcher::new(Arc::new(Stuck), 1);
        assert!(dispatcher.drain(Duration::from_millis(1)).await);
    }
}
