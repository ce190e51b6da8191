/// Bounded wait for content that is still propagating through the network
use crate::error::GatewayResult;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Shortest sleep between probes, whatever the policy says
pub const MIN_DELAY: Duration = Duration::from_millis(1);

/// Polling schedule for "wait until present" lookups
///
/// Delays double from `initial_delay` up to `max_delay`; the whole wait never
/// exceeds `timeout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(4),
        }
    }
}

impl WaitPolicy {
    /// Delay that follows `current` in the backoff schedule
    pub fn next_delay(&self, current: Duration) -> Duration {
        current.saturating_mul(2).min(self.max_delay).max(MIN_DELAY)
    }
}

/// Call `probe` until it yields a value or the policy's deadline passes
///
/// Returns `Ok(None)` on timeout. A probe error ends the wait immediately.
pub async fn poll_until_present<T, F, Fut>(policy: WaitPolicy, mut probe: F) -> GatewayResult<Option<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = GatewayResult<Option<T>>>,
{
    let deadline = Instant::now() + policy.timeout;
    let mut delay = policy.initial_delay.max(MIN_DELAY);

    loop {
        if let Some(value) = probe().await? {
            return Ok(Some(value));
        }

        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }

        tokio::time::sleep(delay.min(deadline - now)).await;
        delay = policy.next_delay(delay);
    }
}
