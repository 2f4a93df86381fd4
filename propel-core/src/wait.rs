//! Wait - Poll a remote resource until its status settles
//!
//! A [`Waiter`] drives a refresh function on a fixed schedule. Two modes exist:
//!
//! - [`Waiter::until_status`] blocks until the reported status has been in the
//!   target set for `stability` consecutive polls. Any status outside the
//!   pending and target sets aborts the wait immediately.
//! - [`Waiter::until_absent`] blocks until the refresh reports the resource as
//!   gone.
//!
//! Both stop as soon as the cancellation token fires, and neither retries a
//! failed refresh.

use std::future::Future;
use std::time::Duration;

use log::debug;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

use crate::provider::{ErrorKind, ProviderError, ProviderResult};

/// Observed progress of a status wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitState {
    /// Still waiting; `target_hits` counts consecutive target observations
    Pending { target_hits: usize },
    Target,
    Failed { status: String },
    TimedOut,
}

/// Pending and target status sets of a resource kind
#[derive(Debug, Clone)]
pub struct StatusSets {
    pub pending: Vec<String>,
    pub target: Vec<String>,
    /// Consecutive target observations required before succeeding
    pub stability: usize,
}

impl StatusSets {
    pub fn new(pending: &[&str], target: &[&str]) -> Self {
        Self {
            pending: pending.iter().map(|s| s.to_string()).collect(),
            target: target.iter().map(|s| s.to_string()).collect(),
            stability: 1,
        }
    }

    pub fn with_stability(mut self, stability: usize) -> Self {
        self.stability = stability.max(1);
        self
    }

    pub fn tracker(&self) -> StatusTracker<'_> {
        StatusTracker {
            sets: self,
            state: WaitState::Pending { target_hits: 0 },
        }
    }
}

/// Time-free state machine fed with one status per poll
#[derive(Debug)]
pub struct StatusTracker<'a> {
    sets: &'a StatusSets,
    state: WaitState,
}

impl StatusTracker<'_> {
    pub fn state(&self) -> &WaitState {
        &self.state
    }

    pub fn observe(&mut self, status: &str) -> &WaitState {
        let hits = match self.state {
            WaitState::Pending { target_hits } => target_hits,
            // Terminal states do not move
            _ => return &self.state,
        };

        self.state = if self.sets.target.iter().any(|t| t == status) {
            if hits + 1 >= self.sets.stability {
                WaitState::Target
            } else {
                WaitState::Pending {
                    target_hits: hits + 1,
                }
            }
        } else if self.sets.pending.iter().any(|p| p == status) {
            WaitState::Pending { target_hits: 0 }
        } else {
            WaitState::Failed {
                status: status.to_string(),
            }
        };
        &self.state
    }

    pub fn expire(&mut self) -> &WaitState {
        if matches!(self.state, WaitState::Pending { .. }) {
            self.state = WaitState::TimedOut;
        }
        &self.state
    }
}

/// Error returned by a wait
#[derive(Debug, thiserror::Error)]
pub enum WaitError {
    /// The refresh call itself failed
    #[error(transparent)]
    Refresh(ProviderError),

    #[error("unexpected state '{status}', wanted target '{}'", expected.join(", "))]
    UnexpectedStatus {
        status: String,
        expected: Vec<String>,
    },

    #[error(
        "timeout while waiting for state to become '{}' (last state: '{}', timeout: {})",
        target.join(", "),
        last_status.as_deref().unwrap_or(""),
        format_duration(*timeout)
    )]
    Timeout {
        target: Vec<String>,
        last_status: Option<String>,
        timeout: Duration,
    },

    #[error(
        "timeout while waiting for resource to be removed (last state: '{}', timeout: {})",
        last_status.as_deref().unwrap_or(""),
        format_duration(*timeout)
    )]
    StillPresent {
        last_status: Option<String>,
        timeout: Duration,
    },

    #[error("operation cancelled")]
    Cancelled,
}

impl From<WaitError> for ProviderError {
    fn from(err: WaitError) -> Self {
        let kind = match err {
            WaitError::Refresh(inner) => return inner,
            WaitError::UnexpectedStatus { .. } => ErrorKind::Provisioning,
            WaitError::Timeout { .. } | WaitError::StillPresent { .. } => ErrorKind::Timeout,
            WaitError::Cancelled => ErrorKind::Cancelled,
        };
        ProviderError::new(err.to_string()).with_kind(kind)
    }
}

/// Poll schedule shared by both wait modes
#[derive(Debug, Clone)]
pub struct Waiter {
    /// Deadline measured from the start of the wait
    pub timeout: Duration,
    /// Wait before the first refresh
    pub delay: Duration,
    pub interval: Duration,
    /// Lower bound for `interval`
    pub min_interval: Duration,
}

impl Waiter {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            delay: Duration::from_secs(10),
            interval: Duration::from_secs(10),
            min_interval: Duration::from_secs(5),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    fn effective_interval(&self) -> Duration {
        self.interval.max(self.min_interval)
    }

    /// Wait until the refreshed status settles in `sets.target`
    ///
    /// Returns the final status.
    pub async fn until_status<F, Fut>(
        &self,
        sets: &StatusSets,
        cancel: &CancellationToken,
        mut refresh: F,
    ) -> Result<String, WaitError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ProviderResult<String>>,
    {
        let start = Instant::now();
        let deadline = start + self.timeout;
        let mut next = start + self.delay;
        let mut tracker = sets.tracker();
        let mut last_status = None;

        loop {
            if next > deadline {
                tracker.expire();
                return Err(WaitError::Timeout {
                    target: sets.target.clone(),
                    last_status,
                    timeout: self.timeout,
                });
            }
            tick(cancel, next).await?;

            let status = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(WaitError::Cancelled),
                result = refresh() => result.map_err(WaitError::Refresh)?,
            };

            match tracker.observe(&status) {
                WaitState::Target => {
                    debug!("status '{}' reached after {:?}", status, start.elapsed());
                    return Ok(status);
                }
                WaitState::Failed { .. } => {
                    return Err(WaitError::UnexpectedStatus {
                        status,
                        expected: sets.target.clone(),
                    });
                }
                WaitState::Pending { target_hits } => {
                    debug!("status '{}' (target hits: {})", status, target_hits);
                }
                WaitState::TimedOut => {}
            }

            last_status = Some(status);
            next += self.effective_interval();
        }
    }

    /// Wait until the refresh reports the resource as gone (`Ok(None)`)
    ///
    /// `Ok(Some(status))` means the resource is still present.
    pub async fn until_absent<F, Fut>(
        &self,
        cancel: &CancellationToken,
        mut refresh: F,
    ) -> Result<(), WaitError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ProviderResult<Option<String>>>,
    {
        let start = Instant::now();
        let deadline = start + self.timeout;
        let mut next = start + self.delay;
        let mut last_status = None;

        loop {
            if next > deadline {
                return Err(WaitError::StillPresent {
                    last_status,
                    timeout: self.timeout,
                });
            }
            tick(cancel, next).await?;

            let present = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(WaitError::Cancelled),
                result = refresh() => result.map_err(WaitError::Refresh)?,
            };

            match present {
                None => {
                    debug!("resource gone after {:?}", start.elapsed());
                    return Ok(());
                }
                Some(status) => {
                    debug!("resource still present with status '{}'", status);
                    last_status = Some(status);
                }
            }

            next += self.effective_interval();
        }
    }
}

async fn tick(cancel: &CancellationToken, at: Instant) -> Result<(), WaitError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(WaitError::Cancelled),
        _ = sleep_until(at) => Ok(()),
    }
}

/// Render a duration as e.g. "29m0s"
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{}h{}m{}s", h, m, s)
    } else if m > 0 {
        format!("{}m{}s", m, s)
    } else {
        format!("{}s", s)
    }
}
