//! Poll schedule - interval, overall timeout and service key refresh rule

use std::fmt;
use std::time::Duration;

/// Service keys expire after ~20 minutes; refresh when a single sleep exceeds this
pub const KEY_REFRESH_THRESHOLD: Duration = Duration::from_secs(18 * 60);

/// How long to wait for the triggered task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    /// Trigger and return without polling
    FireAndForget,
    Bounded(Duration),
    Indefinite,
}

impl Timeout {
    /// Negative minutes wait forever, zero does not wait at all
    pub fn from_minutes(minutes: i64) -> Self {
        match minutes {
            m if m < 0 => Self::Indefinite,
            0 => Self::FireAndForget,
            m => Self::Bounded(Duration::from_secs((m as u64).saturating_mul(60))),
        }
    }
}

impl fmt::Display for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FireAndForget => write!(f, "0 minutes"),
            Self::Bounded(d) => write!(f, "{} minutes", d.as_secs() / 60),
            Self::Indefinite => write!(f, "Indefinitely"),
        }
    }
}

/// Status polling cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    pub interval: Duration,
    pub timeout: Timeout,
}

impl PollSchedule {
    pub fn new(interval: Duration, timeout: Timeout) -> Self {
        Self { interval, timeout }
    }

    /// Whether polling happens at all
    pub fn waits(&self) -> bool {
        self.timeout != Timeout::FireAndForget
    }

    /// Refresh the service key before every status query
    pub fn needs_key_refresh(&self) -> bool {
        self.interval > KEY_REFRESH_THRESHOLD
    }

    /// Whether polling should stop after `elapsed`
    pub fn is_expired(&self, elapsed: Duration) -> bool {
        match self.timeout {
            Timeout::FireAndForget => true,
            Timeout::Bounded(limit) => elapsed >= limit,
            Timeout::Indefinite => false,
        }
    }
}
