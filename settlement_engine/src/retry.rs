use std::{future::Future, time::Duration};

use log::*;

/// A bounded-retry policy: up to `max_attempts` tries with a fixed `delay` between them.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts, delay }
    }
}

/// Runs `op` until it succeeds, the predicate rejects the error, or the attempt budget runs out. Only errors the
/// predicate accepts are retried; anything else aborts immediately and the error propagates unchanged.
pub async fn retry<T, E, F, Fut, P>(policy: RetryPolicy, should_retry: P, mut op: F) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let mut attempt = 1u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.max_attempts && should_retry(&e) => {
                warn!("⏳️ Attempt {attempt}/{} failed ({e}). Retrying in {:?}", policy.max_attempts, policy.delay);
                attempt += 1;
                tokio::time::sleep(policy.delay).await;
            },
            Err(e) => return Err(e),
        }
    }
}
