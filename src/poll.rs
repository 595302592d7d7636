use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Outcome of a single probe attempt
///
/// A probe reports whether the awaited condition holds yet. A failed attempt
/// is retried exactly like a pending one, but the error is kept so that a
/// later timeout can explain what kept going wrong.
#[derive(Debug)]
pub enum Probe {
    /// The condition holds
    Ready,
    /// The condition does not hold yet
    Pending,
    /// This attempt failed; retried, and recorded as the last observed error
    Failed(anyhow::Error),
}

impl From<bool> for Probe {
    fn from(ready: bool) -> Self {
        if ready {
            Self::Ready
        } else {
            Self::Pending
        }
    }
}

impl<E> From<Result<bool, E>> for Probe
where
    E: Into<anyhow::Error>,
{
    fn from(result: Result<bool, E>) -> Self {
        match result {
            Ok(ready) => Self::from(ready),
            Err(err) => Self::Failed(err.into()),
        }
    }
}

/// Error returned when a poll deadline elapses without the probe reporting ready
///
/// Carries the caller's description of what was being waited for, plus the
/// last failure the probe reported (if any attempt failed).
#[derive(Debug)]
pub struct PollTimeout {
    message: String,
    last_error: Option<anyhow::Error>,
}

impl PollTimeout {
    /// The caller-supplied description of the awaited condition
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The last failure a probe attempt reported, if any
    pub fn last_error(&self) -> Option<&anyhow::Error> {
        self.last_error.as_ref()
    }
}

impl fmt::Display for PollTimeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.last_error {
            Some(err) => write!(f, "{}: last error {}", self.message, err),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for PollTimeout {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.last_error {
            Some(err) => Some(err.as_ref()),
            None => None,
        }
    }
}

/// Repeatedly evaluates a probe until it reports ready or a deadline elapses
///
/// The poller owns the timing policy: a total timeout, a polling interval,
/// and an optional exponential backoff capped at a maximum interval. One
/// `wait_until` call owns all of its timing state; nothing carries over
/// between calls.
#[derive(Debug, Clone)]
pub struct Poller {
    timeout: Duration,
    interval: Duration,
    backoff_factor: f64,
    max_interval: Duration,
}

impl Poller {
    /// Create a poller with the given total timeout and a fixed 1s interval
    pub fn new(timeout: Duration) -> Self {
        let interval = Duration::from_secs(1);
        Self {
            timeout,
            interval,
            backoff_factor: 1.0,
            max_interval: interval,
        }
    }

    /// Set the delay between probe attempts
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        if self.max_interval < interval {
            self.max_interval = interval;
        }
        self
    }

    /// Grow the delay by `factor` after every attempt, up to `max_interval`
    ///
    /// A factor of 1.0 keeps the interval fixed.
    pub fn with_backoff(mut self, factor: f64, max_interval: Duration) -> Self {
        self.backoff_factor = factor;
        self.max_interval = max_interval.max(self.interval);
        self
    }

    /// Poll `probe` until it reports ready or the timeout elapses
    ///
    /// This function:
    /// 1. Computes the deadline once, before the first attempt
    /// 2. Invokes the probe; a `Ready` outcome returns immediately with no
    ///    trailing sleep
    /// 3. Sleeps the current interval after a `Pending` or `Failed` outcome,
    ///    recording the failure for diagnostics
    /// 4. Fails with [`PollTimeout`] once the deadline has passed, embedding
    ///    `what` and the last recorded failure
    ///
    /// A timeout of zero fails immediately without invoking the probe.
    /// Dropping the returned future abandons the wait; no state survives it.
    pub async fn wait_until<F, Fut>(&self, mut probe: F, what: &str) -> Result<(), PollTimeout>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Probe>,
    {
        let deadline = Instant::now() + self.timeout;
        let mut delay = self.interval;
        let mut last_error: Option<anyhow::Error> = None;

        while Instant::now() < deadline {
            match probe().await {
                Probe::Ready => return Ok(()),
                Probe::Pending => {}
                Probe::Failed(err) => {
                    tracing::debug!(what, error = %err, "probe attempt failed");
                    last_error = Some(err);
                }
            }

            tokio::time::sleep(delay).await;
            delay = next_delay(delay, self.backoff_factor, self.max_interval);
        }

        Err(PollTimeout {
            message: what.to_string(),
            last_error,
        })
    }
}

/// Compute the delay for the next attempt
fn next_delay(current: Duration, factor: f64, max: Duration) -> Duration {
    if factor <= 1.0 {
        return current.min(max);
    }
    let scaled = current.as_secs_f64() * factor;
    Duration::from_secs_f64(scaled.min(max.as_secs_f64()))
}
