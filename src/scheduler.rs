//! Tick pacing for hosts
//!
//! The interpreter never reads a clock. A host owns a [`Scheduler`] and
//! polls it from its own event loop; the scheduler decides whether enough
//! time has passed for the next tick.

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::RuntimeError;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Scheduler {
    pub interval: Duration,
    last_tick: Option<Instant>,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Self {
        Scheduler {
            interval,
            last_tick: None,
        }
    }

    pub fn from_millis(interval_ms: u64) -> Self {
        Self::new(Duration::from_millis(interval_ms))
    }

    /// Tick the interpreter if an interval has elapsed since the last tick.
    ///
    /// Runs at most one tick per call; returns whether it ticked.
    pub fn poll(&mut self, interpreter: &mut Interpreter, now: Instant) -> Result<bool, RuntimeError> {
        if !self.is_due(now) {
            return Ok(false);
        }
        self.last_tick = Some(now);
        interpreter.tick()?;
        Ok(true)
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.last_tick
            .map_or(true, |last| now.saturating_duration_since(last) >= self.interval)
    }

    /// Time left until the next tick is due
    pub fn remaining(&self, now: Instant) -> Duration {
        self.last_tick.map_or(Duration::ZERO, |last| {
            self.interval
                .saturating_sub(now.saturating_duration_since(last))
        })
    }

    pub fn reset(&mut self) {
        self.last_tick = None;
    }
}
