//! Reschedule policy and run ownership for the preview polling loop.

use std::cell::Cell;

/// How the last preview poll settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Success,
    Failure,
}

/// Fixed-delay schedule: a short delay after a successful poll, a longer one
/// after a failure so a dead device is not flooded with retries.
#[derive(Debug, Clone, Copy)]
pub struct PollSchedule {
    success_delay_ms: u32,
    failure_delay_ms: u32,
}

impl PollSchedule {
    pub const DEFAULT_SUCCESS_DELAY_MS: u32 = 500;
    pub const DEFAULT_FAILURE_DELAY_MS: u32 = 1000;

    pub fn new(success_delay_ms: u32, failure_delay_ms: u32) -> Self {
        Self {
            success_delay_ms,
            failure_delay_ms,
        }
    }

    pub fn next_delay_ms(&self, outcome: PollOutcome) -> u32 {
        match outcome {
            PollOutcome::Success => self.success_delay_ms,
            PollOutcome::Failure => self.failure_delay_ms,
        }
    }
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_SUCCESS_DELAY_MS,
            Self::DEFAULT_FAILURE_DELAY_MS,
        )
    }
}

/// Identifies which run of the loop a tick belongs to.
///
/// Every `begin` opens a new run and every `invalidate` closes the current
/// one; a tick holds the token it was spawned under and must not reschedule
/// once that token is stale. This is what keeps a stopped-and-restarted loop
/// down to a single timer chain even while an old poll is still in flight.
#[derive(Debug, Default)]
pub struct LoopEpoch {
    current: Cell<u64>,
}

impl LoopEpoch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new run, staling every token handed out before.
    pub fn begin(&self) -> u64 {
        let next = self.current.get().wrapping_add(1);
        self.current.set(next);
        next
    }

    /// Close the current run without opening a new one.
    pub fn invalidate(&self) {
        self.current.set(self.current.get().wrapping_add(1));
    }

    pub fn is_current(&self, token: u64) -> bool {
        self.current.get() == token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_backs_off_longer_than_success() {
        let schedule = PollSchedule::default();
        assert_eq!(schedule.next_delay_ms(PollOutcome::Success), 500);
        assert_eq!(schedule.next_delay_ms(PollOutcome::Failure), 1000);
        assert!(
            schedule.next_delay_ms(PollOutcome::Failure)
                > schedule.next_delay_ms(PollOutcome::Success)
        );
    }

    #[test]
    fn delays_are_injectable() {
        let schedule = PollSchedule::new(10, 20);
        assert_eq!(schedule.next_delay_ms(PollOutcome::Success), 10);
        assert_eq!(schedule.next_delay_ms(PollOutcome::Failure), 20);
    }

    #[test]
    fn restart_stales_ticks_from_the_previous_run() {
        let epoch = LoopEpoch::new();

        // A tick spawned in the first run holds this token across its fetch.
        let first_run = epoch.begin();
        assert!(epoch.is_current(first_run));

        // Stop, then start again while that tick is still in flight: the old
        // token must be stale so only the new run's chain may reschedule.
        epoch.invalidate();
        let second_run = epoch.begin();
        assert!(!epoch.is_current(first_run));
        assert!(epoch.is_current(second_run));
    }

    #[test]
    fn invalidate_closes_the_current_run() {
        let epoch = LoopEpoch::new();
        let token = epoch.begin();
        epoch.invalidate();
        assert!(!epoch.is_current(token));
    }
}
