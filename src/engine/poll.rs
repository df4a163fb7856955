//! Polling scanner
//!
//! Cooperative sample-until-deadline loops. A sample is always taken at least
//! once; sleeps are clipped to the remaining deadline so a poll never runs
//! past it by more than one sample.

use std::future::Future;
use std::time::{Duration, Instant};

/// Outcome of a polling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollResult {
    pub matched: bool,
    pub elapsed: Duration,
    pub sample_count: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub timeout: Duration,
    pub interval: Duration,
}

impl PollConfig {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }
}

/// Sample until `sample` yields a value or the deadline passes
pub async fn poll_value<T, F, Fut>(mut sample: F, config: PollConfig) -> (Option<T>, PollResult)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let start = Instant::now();
    let mut sample_count = 0;

    loop {
        sample_count += 1;
        if let Some(value) = sample().await {
            return (
                Some(value),
                PollResult {
                    matched: true,
                    elapsed: start.elapsed(),
                    sample_count,
                },
            );
        }

        let elapsed = start.elapsed();
        if elapsed >= config.timeout {
            return (
                None,
                PollResult {
                    matched: false,
                    elapsed,
                    sample_count,
                },
            );
        }

        tokio::time::sleep(config.interval.min(config.timeout - elapsed)).await;
    }
}

/// Sample until `check` returns true or the deadline passes
pub async fn wait_until<F, Fut>(mut check: F, config: PollConfig) -> PollResult
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let (_, result) = poll_value(
        || {
            let fut = check();
            async move { fut.await.then_some(()) }
        },
        config,
    )
    .await;
    result
}
