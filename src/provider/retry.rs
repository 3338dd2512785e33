//! Retry Policy and Countdown State
//!
//! The retry policy (delay schedule, retryable classification) is a pure
//! function with no UI coupling; the countdown state machine is polled by
//! whatever presentation layer wants to show "retrying in Ns".

use std::time::Duration;

use crate::constants::retry;
use crate::types::CardforgeError;

/// Delay schedule and retry classification for whole-request retries.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    schedule_secs: &'static [u64],
    max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            schedule_secs: retry::DELAY_SCHEDULE_SECS,
            max_retries: retry::MAX_RETRIES,
        }
    }
}

impl RetryPolicy {
    pub fn new(schedule_secs: &'static [u64], max_retries: u32) -> Self {
        Self {
            schedule_secs,
            max_retries,
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before the given retry attempt (0-based). Attempts beyond the
    /// schedule reuse the final entry.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let secs = self
            .schedule_secs
            .get(attempt as usize)
            .or(self.schedule_secs.last())
            .copied()
            .unwrap_or(0);
        Duration::from_secs(secs)
    }

    /// Whether the error is worth retrying at all. Only quota exhaustion is;
    /// fatal provider errors and malformed output are not.
    pub fn should_retry(&self, error: &CardforgeError, attempt: u32) -> bool {
        attempt < self.max_retries && error.is_retry_later()
    }
}

/// Observable phase of a retry cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryPhase {
    #[default]
    Idle,
    Waiting,
    Retrying,
}

/// Pure countdown state machine: `{phase, remaining, attempt_count}`.
/// The owner drives it with [`RetryState::begin_wait`] / [`RetryState::tick`] /
/// [`RetryState::retrying`]; a presentation layer only ever reads it.
#[derive(Debug, Clone, Default)]
pub struct RetryState {
    pub phase: RetryPhase,
    pub remaining: Duration,
    pub attempt_count: u32,
}

impl RetryState {
    pub fn idle() -> Self {
        Self::default()
    }

    /// Enter the waiting phase with a full countdown.
    pub fn begin_wait(&mut self, delay: Duration) {
        self.phase = RetryPhase::Waiting;
        self.remaining = delay;
    }

    /// Advance the countdown. Reaching zero flips the phase to Retrying.
    pub fn tick(&mut self, elapsed: Duration) {
        if self.phase != RetryPhase::Waiting {
            return;
        }
        self.remaining = self.remaining.saturating_sub(elapsed);
        if self.remaining.is_zero() {
            self.retrying();
        }
    }

    /// Mark the retry attempt as started.
    pub fn retrying(&mut self) {
        self.phase = RetryPhase::Retrying;
        self.remaining = Duration::ZERO;
        self.attempt_count += 1;
    }

    /// Return to idle after a terminal outcome.
    pub fn settle(&mut self) {
        self.phase = RetryPhase::Idle;
        self.remaining = Duration::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ProviderError, ProviderErrorKind};

    #[test]
    fn test_delay_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_secs(2));
        assert_eq!(policy.delay_for(1), Duration::from_secs(5));
        assert_eq!(policy.delay_for(4), Duration::from_secs(20));
        // Past the schedule, the last entry repeats
        assert_eq!(policy.delay_for(9), Duration::from_secs(20));
    }

    #[test]
    fn test_should_retry_classification() {
        let policy = RetryPolicy::default();
        let exhausted = CardforgeError::ProviderExhausted {
            last: ProviderError::new(ProviderErrorKind::RateLimit, "429", "m"),
        };
        assert!(policy.should_retry(&exhausted, 0));
        assert!(!policy.should_retry(&exhausted, policy.max_retries()));

        let fatal = CardforgeError::Provider(ProviderError::new(
            ProviderErrorKind::Other,
            "bad key",
            "m",
        ));
        assert!(!policy.should_retry(&fatal, 0));

        let malformed = CardforgeError::MalformedOutput("trailing garbage".into());
        assert!(!policy.should_retry(&malformed, 0));
    }

    #[test]
    fn test_state_machine_cycle() {
        let mut state = RetryState::idle();
        assert_eq!(state.phase, RetryPhase::Idle);

        state.begin_wait(Duration::from_secs(3));
        assert_eq!(state.phase, RetryPhase::Waiting);
        assert_eq!(state.remaining, Duration::from_secs(3));

        state.tick(Duration::from_secs(1));
        assert_eq!(state.remaining, Duration::from_secs(2));
        assert_eq!(state.phase, RetryPhase::Waiting);

        state.tick(Duration::from_secs(5));
        assert_eq!(state.phase, RetryPhase::Retrying);
        assert_eq!(state.attempt_count, 1);

        state.settle();
        assert_eq!(state.phase, RetryPhase::Idle);
        assert_eq!(state.attempt_count, 1);
    }

    #[test]
    fn test_tick_outside_waiting_is_noop() {
        let mut state = RetryState::idle();
        state.tick(Duration::from_secs(1));
        assert_eq!(state.phase, RetryPhase::Idle);
        assert_eq!(state.attempt_count, 0);
    }
}
