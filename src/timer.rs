use crate::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerKind {
    OneShot,
    Repeating,
}

/// Deadline based timer on the poll loop clock.
///
/// A one-shot timer fires once and then stays idle until [`Timer::reset`].
/// A repeating timer re-arms with `deadline += duration` after each firing, so
/// missed periods are caught up at most one per tick.
#[derive(Clone, Copy, Debug)]
pub struct Timer {
    kind: TimerKind,
    duration: Duration,
    deadline: Instant,
    armed: bool,
}

impl Timer {
    pub fn one_shot(now: Instant, duration: Duration) -> Self {
        Self::new(TimerKind::OneShot, now, duration)
    }

    pub fn repeating(now: Instant, duration: Duration) -> Self {
        Self::new(TimerKind::Repeating, now, duration)
    }

    fn new(kind: TimerKind, now: Instant, duration: Duration) -> Self {
        Self {
            kind,
            duration,
            deadline: now + duration,
            armed: true,
        }
    }

    /// Returns true when the deadline has been reached or passed.
    pub fn check(&mut self, now: Instant) -> bool {
        if !self.armed || now < self.deadline {
            return false;
        }
        match self.kind {
            TimerKind::OneShot => self.armed = false,
            TimerKind::Repeating => self.deadline = self.deadline + self.duration,
        }
        true
    }

    /// Re-arms the timer relative to `now`, dropping the pending deadline.
    pub fn reset(&mut self, now: Instant) {
        self.deadline = now + self.duration;
        self.armed = true;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }
}
