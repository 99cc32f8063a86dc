//! Redelivery policy for failed deliveries.
//!
//! A task carries its own delivery budget (`max_retry`). Each failed
//! delivery either schedules another one after an exponential backoff or
//! abandons the task to the archive table.

use crate::error::Error;

/// Longest delay between two deliveries of the same task.
pub const MAX_BACKOFF_SECS: i32 = 300;

/// What the runtime does with a delivery once its handler returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Handled; remove the message.
    Complete,
    /// Failed; make the message visible again after `delay_secs`.
    Retry { delay_secs: i32 },
    /// Give up; move the message to the archive.
    Abandon { reason: String },
}

impl Disposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Complete => "completed",
            Disposition::Retry { .. } => "retry",
            Disposition::Abandon { .. } => "abandoned",
        }
    }
}

/// Decide the fate of delivery number `attempt` (1-based) that failed
/// with `err`.
pub fn disposition_for(attempt: i32, max_retry: u32, err: &Error) -> Disposition {
    if !err.is_retryable() {
        return Disposition::Abandon {
            reason: format!("non-retryable failure: {err}"),
        };
    }
    let max = i64::from(max_retry);
    if i64::from(attempt) >= max {
        return Disposition::Abandon {
            reason: format!("exhausted {attempt}/{max} attempts: {err}"),
        };
    }
    Disposition::Retry {
        delay_secs: backoff_secs(attempt),
    }
}

/// `2^attempt` seconds, capped at [`MAX_BACKOFF_SECS`].
pub fn backoff_secs(attempt: i32) -> i32 {
    let exp = attempt.clamp(0, 16) as u32;
    2i32.saturating_pow(exp).min(MAX_BACKOFF_SECS)
}
