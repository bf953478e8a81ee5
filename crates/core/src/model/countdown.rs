//! Authoritative remaining-time state for one attempt.
//!
//! `Countdown` holds no timer of its own; a driver feeds it ticks. It guarantees that
//! `TickOutcome::Expired` is produced at most once per instance and that no tick is
//! honoured after `stop` or `cancel`.

/// Lifecycle of a countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownState {
    /// Created but not started.
    Idle,
    /// Started and accepting ticks.
    Ticking,
    /// Reached zero; the expiration has been reported.
    Expired,
    /// Stopped by a manual submission.
    Stopped,
    /// Cancelled because the attempt was abandoned.
    Cancelled,
}

/// Result of feeding one tick into the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The countdown is not ticking; the tick was dropped.
    Ignored,
    /// One second elapsed; time remains.
    Remaining(u32),
    /// The final second elapsed. Reported exactly once.
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    duration_secs: u32,
    remaining_secs: u32,
    state: CountdownState,
}

impl Countdown {
    #[must_use]
    pub fn new(duration_secs: u32) -> Self {
        Self {
            duration_secs,
            remaining_secs: duration_secs,
            state: CountdownState::Idle,
        }
    }

    /// Arms the countdown at its full duration. Returns false unless it was idle.
    pub fn start(&mut self) -> bool {
        if self.state != CountdownState::Idle {
            return false;
        }
        self.remaining_secs = self.duration_secs;
        self.state = CountdownState::Ticking;
        true
    }

    pub fn tick(&mut self) -> TickOutcome {
        if self.state != CountdownState::Ticking {
            return TickOutcome::Ignored;
        }

        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.state = CountdownState::Expired;
            TickOutcome::Expired
        } else {
            TickOutcome::Remaining(self.remaining_secs)
        }
    }

    /// Stops ticking without expiring. No-op once the countdown has terminated.
    pub fn stop(&mut self) {
        if matches!(self.state, CountdownState::Idle | CountdownState::Ticking) {
            self.state = CountdownState::Stopped;
        }
    }

    /// Abandons the countdown. No-op once the countdown has terminated.
    pub fn cancel(&mut self) {
        if matches!(self.state, CountdownState::Idle | CountdownState::Ticking) {
            self.state = CountdownState::Cancelled;
        }
    }

    #[must_use]
    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    #[must_use]
    pub fn state(&self) -> CountdownState {
        self.state
    }

    #[must_use]
    pub fn is_ticking(&self) -> bool {
        self.state == CountdownState::Ticking
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expires_exactly_once() {
        let mut countdown = Countdown::new(3);
        assert!(countdown.start());

        assert_eq!(countdown.tick(), TickOutcome::Remaining(2));
        assert_eq!(countdown.tick(), TickOutcome::Remaining(1));
        assert_eq!(countdown.tick(), TickOutcome::Expired);

        for _ in 0..10 {
            assert_eq!(countdown.tick(), TickOutcome::Ignored);
        }
        assert_eq!(countdown.remaining_secs(), 0);
        assert_eq!(countdown.state(), CountdownState::Expired);
    }

    #[test]
    fn idle_countdown_ignores_ticks() {
        let mut countdown = Countdown::new(5);
        assert_eq!(countdown.tick(), TickOutcome::Ignored);
        assert_eq!(countdown.remaining_secs(), 5);
    }

    #[test]
    fn stop_blocks_expiration_and_is_idempotent() {
        let mut countdown = Countdown::new(2);
        countdown.start();
        countdown.tick();
        countdown.stop();
        countdown.stop();
        assert_eq!(countdown.tick(), TickOutcome::Ignored);
        assert_eq!(countdown.state(), CountdownState::Stopped);
        assert_eq!(countdown.remaining_secs(), 1);
    }

    #[test]
    fn stop_after_expiry_keeps_expired_state() {
        let mut countdown = Countdown::new(1);
        countdown.start();
        assert_eq!(countdown.tick(), TickOutcome::Expired);
        countdown.stop();
        countdown.cancel();
        assert_eq!(countdown.state(), CountdownState::Expired);
    }

    #[test]
    fn cannot_restart_after_cancel() {
        let mut countdown = Countdown::new(4);
        countdown.start();
        countdown.cancel();
        assert!(!countdown.start());
        assert_eq!(countdown.tick(), TickOutcome::Ignored);
    }
}
