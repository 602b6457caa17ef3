// ABOUTME: Fixed-interval poll routine with an optional attempt ceiling.
// ABOUTME: Used by the gateway to wait for a remote run to reach a terminal state.

use std::future::Future;
use std::time::Duration;

/// How often to re-check, and how many checks to allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// `None` polls until a terminal state, however long that takes.
    pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_attempts: Some(600),
        }
    }
}

/// Result of a poll that did not error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Polled<T> {
    Terminal(T),
    Exhausted { attempts: u32, last: T },
}

/// Re-fetch `current` every `policy.interval` until `is_terminal` holds.
///
/// An already-terminal `current` returns without sleeping. Fetch errors end the
/// poll immediately.
pub async fn poll_until<T, E, F, Fut>(
    policy: &PollPolicy,
    mut current: T,
    mut fetch: F,
    is_terminal: impl Fn(&T) -> bool,
) -> Result<Polled<T>, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempts: u32 = 0;
    while !is_terminal(&current) {
        if policy.max_attempts.is_some_and(|max| attempts >= max) {
            return Ok(Polled::Exhausted {
                attempts,
                last: current,
            });
        }
        tokio::time::sleep(policy.interval).await;
        current = fetch().await?;
        attempts += 1;
        tracing::trace!(attempts, "polled");
    }
    Ok(Polled::Terminal(current))
}
