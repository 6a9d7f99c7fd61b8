//! Countdown with an optional periodic sub-countdown.
//!
//! A [`Duration`] tracks how much of a total span has elapsed and, if a
//! period span is configured, how many whole periods have passed. It is a
//! pure function of the elapsed deltas it is fed: nothing in here reads a
//! clock.
//!
//! # States
//!
//! ```text
//!            pause()             elapsed >= total
//! Tracking <---------> Paused    Tracking ---------> Completed
//!            unpause()
//! ```
//!
//! `Completed` is terminal until [`Duration::reset`] (or [`Duration::restart`])
//! re-initialises every counter and returns to `Tracking`.
//!
//! # Signals
//!
//! - total elapsed: fired exactly once per reset cycle, when the duration completes
//! - period elapsed: fired once per crossed period boundary, with the new period count.
//!   A single large advance can cross several boundaries; each fires in order.
//!
//! A duration is normally owned by an
//! [`Updatable`](crate::components::updatable::Updatable), which advances it
//! after its own update and expires once it completes.

use crate::error::{SchedulerError, SchedulerResult};
use crate::events::signal::{Signal, SubscriptionId};

/// Lifecycle of a [`Duration`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DurationState {
    /// Counting elapsed time.
    Tracking,
    /// Ignoring elapsed time until unpaused.
    Paused,
    /// Total span reached; terminal until reset.
    Completed,
}

/// Total countdown plus optional periodic boundaries, in milliseconds.
#[derive(Debug)]
pub struct Duration {
    state: DurationState,
    total_span: f64,
    total_elapsed: f64,
    total_remaining: f64,
    remaining_ratio: f64,
    period_span: Option<f64>,
    period_elapsed: f64,
    period_remaining: f64,
    period_count: u32,
    on_total_elapsed: Signal<()>,
    on_period_elapsed: Signal<u32>,
}

impl Duration {
    /// Creates a tracking duration.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::InvalidArgument`] if `total_span <= 0` or a given
    /// `period_span <= 0`.
    pub fn new(total_span: f64, period_span: Option<f64>) -> SchedulerResult<Self> {
        let mut duration = Duration {
            state: DurationState::Tracking,
            total_span: 0.0,
            total_elapsed: 0.0,
            total_remaining: 0.0,
            remaining_ratio: 1.0,
            period_span: None,
            period_elapsed: 0.0,
            period_remaining: 0.0,
            period_count: 0,
            on_total_elapsed: Signal::new(),
            on_period_elapsed: Signal::new(),
        };
        duration.reset(total_span, period_span)?;
        Ok(duration)
    }

    /// Creates a duration that does not start counting until [`Duration::unpause`].
    pub fn paused(total_span: f64, period_span: Option<f64>) -> SchedulerResult<Self> {
        let mut duration = Self::new(total_span, period_span)?;
        duration.pause();
        Ok(duration)
    }

    /// Re-initialises all counters with new spans and returns to `Tracking`.
    ///
    /// Subscribers are kept. The period counter restarts at zero.
    pub fn reset(&mut self, total_span: f64, period_span: Option<f64>) -> SchedulerResult<()> {
        if !(total_span > 0.0) {
            return Err(SchedulerError::invalid(format!(
                "total span must be positive, got {total_span}"
            )));
        }
        if let Some(period) = period_span {
            if !(period > 0.0) {
                return Err(SchedulerError::invalid(format!(
                    "period span must be positive, got {period}"
                )));
            }
        }

        self.total_span = total_span;
        self.total_elapsed = 0.0;
        self.total_remaining = total_span;
        self.remaining_ratio = 1.0;

        self.period_span = period_span;
        self.period_elapsed = 0.0;
        self.period_remaining = period_span.unwrap_or(0.0);
        self.period_count = 0;

        self.state = DurationState::Tracking;
        Ok(())
    }

    /// Resets with the spans currently configured.
    pub fn restart(&mut self) {
        self.total_elapsed = 0.0;
        self.total_remaining = self.total_span;
        self.remaining_ratio = 1.0;
        self.period_elapsed = 0.0;
        self.period_remaining = self.period_span.unwrap_or(0.0);
        self.period_count = 0;
        self.state = DurationState::Tracking;
    }

    pub fn pause(&mut self) {
        if self.state == DurationState::Tracking {
            self.state = DurationState::Paused;
        }
    }

    pub fn unpause(&mut self) {
        if self.state == DurationState::Paused {
            self.state = DurationState::Tracking;
        }
    }

    /// Feeds `elapsed` milliseconds into the state machine.
    ///
    /// Only has an effect while `Tracking`.
    pub fn advance(&mut self, elapsed: f64) {
        if self.state != DurationState::Tracking {
            return;
        }

        self.total_elapsed += elapsed;
        self.total_remaining -= elapsed;

        if let Some(period) = self.period_span {
            self.period_elapsed += elapsed;

            let elapsed_periods = (self.total_elapsed / period).floor() as u32;
            while self.period_count < elapsed_periods {
                self.period_count += 1;
                self.period_elapsed -= period;
                self.on_period_elapsed.emit(self.period_count);
            }

            self.period_remaining = period - self.period_elapsed;
        }

        if self.total_elapsed >= self.total_span {
            self.on_total_elapsed.emit(());
            self.state = DurationState::Completed;
            self.total_remaining = 0.0;
        }

        self.remaining_ratio = self.total_remaining / self.total_span;
    }

    /// Calls `callback` each time the total span elapses.
    pub fn on_total_elapsed(&mut self, callback: impl FnMut(()) + 'static) -> SubscriptionId {
        self.on_total_elapsed.subscribe(callback)
    }

    /// Calls `callback` with the new period count at every period boundary.
    pub fn on_period_elapsed(&mut self, callback: impl FnMut(u32) + 'static) -> SubscriptionId {
        self.on_period_elapsed.subscribe(callback)
    }

    /// Removes a subscription made through either `on_*` method.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.on_total_elapsed.unsubscribe(id) || self.on_period_elapsed.unsubscribe(id)
    }

    pub fn state(&self) -> DurationState {
        self.state
    }
    pub fn is_completed(&self) -> bool {
        self.state == DurationState::Completed
    }
    pub fn total_span(&self) -> f64 {
        self.total_span
    }
    pub fn total_elapsed(&self) -> f64 {
        self.total_elapsed
    }
    pub fn total_remaining(&self) -> f64 {
        self.total_remaining
    }
    /// `total_remaining / total_span`; 1.0 when fresh, 0.0 when completed.
    pub fn remaining_ratio(&self) -> f64 {
        self.remaining_ratio
    }
    pub fn period_span(&self) -> Option<f64> {
        self.period_span
    }
    pub fn period_elapsed(&self) -> f64 {
        self.period_elapsed
    }
    pub fn period_remaining(&self) -> f64 {
        self.period_remaining
    }
    pub fn period_count(&self) -> u32 {
        self.period_count
    }
}
