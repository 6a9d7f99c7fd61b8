//! Scalar property animation driven by ticks.
//!
//! A [`PropertyAnimation`] pushes eased values into a setter closure until its
//! duration has passed, then pushes the exact target once and expires.
//!
//! # How It Works
//!
//! 1. The first tick received fixes the start time (`tick.total`), so any
//!    delay between creating the animation and its first advance is not
//!    counted against it.
//! 2. Every tick computes `elapsed = tick.total - start`.
//! 3. While `elapsed <= duration` the setter gets
//!    `easing(elapsed, from, to, duration)`.
//! 4. The first tick with `elapsed > duration` sets exactly `to`, marks the
//!    animation completed, fires the completion signal and expires it.
//!
//! The animation has no owned [`Duration`](crate::components::duration::Duration);
//! its lifetime is entirely self-managed.
//!
//! # Related
//!
//! - [`crate::components::tween::Easing`] – curve selection
//! - [`crate::resources::animator::PropertyAnimator`] – fire-and-await façade

use std::fmt;

use crate::components::tween::Easing;
use crate::components::updatable::{GroupId, Updatable, UpdatableCore};
use crate::error::{SchedulerError, SchedulerResult};
use crate::events::signal::{OnceSignal, SubscriptionId};
use crate::events::tick::Tick;

/// Updatable that interpolates one scalar from `from` to `to`.
pub struct PropertyAnimation {
    core: UpdatableCore,
    setter: Box<dyn FnMut(f64)>,
    from: f64,
    to: f64,
    duration: f64,
    easing: Easing,
    start_time: Option<f64>,
    elapsed: f64,
    completed: bool,
    on_completed: OnceSignal<()>,
}

impl PropertyAnimation {
    /// Creates an animation in the default update group.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::InvalidArgument`] if `duration` is negative or not finite.
    pub fn new(
        setter: impl FnMut(f64) + 'static,
        from: f64,
        to: f64,
        duration: f64,
        easing: impl Into<Easing>,
    ) -> SchedulerResult<Self> {
        if !duration.is_finite() || duration < 0.0 {
            return Err(SchedulerError::invalid(format!(
                "animation duration must be finite and non-negative, got {duration}"
            )));
        }
        Ok(PropertyAnimation {
            core: UpdatableCore::new(),
            setter: Box::new(setter),
            from,
            to,
            duration,
            easing: easing.into(),
            start_time: None,
            elapsed: 0.0,
            completed: false,
            on_completed: OnceSignal::new(),
        })
    }

    /// Builder: route the animation to another update group.
    pub fn with_group(mut self, group: GroupId) -> Self {
        self.core.set_group(group);
        self
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Calls `callback` once, when the animation reaches its target.
    ///
    /// Runs immediately (returning `None`) if it already has.
    pub fn on_completed(&mut self, callback: impl FnOnce() + 'static) -> Option<SubscriptionId> {
        self.on_completed.subscribe(move |()| callback())
    }

    /// Fraction of the duration elapsed so far, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.completed || self.duration <= 0.0 {
            return if self.completed { 1.0 } else { 0.0 };
        }
        (self.elapsed / self.duration).clamp(0.0, 1.0)
    }

    pub fn start_value(&self) -> f64 {
        self.from
    }

    pub fn target_value(&self) -> f64 {
        self.to
    }

    /// Length of the animation in milliseconds.
    pub fn span(&self) -> f64 {
        self.duration
    }

    pub fn easing(&self) -> &Easing {
        &self.easing
    }
}

impl Updatable for PropertyAnimation {
    fn core(&self) -> &UpdatableCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut UpdatableCore {
        &mut self.core
    }

    fn update(&mut self, tick: &Tick) {
        let start = *self.start_time.get_or_insert(tick.total);
        self.elapsed = tick.total - start;

        if self.elapsed > self.duration {
            self.elapsed = self.duration;
            (self.setter)(self.to);
            self.completed = true;
            self.on_completed.fire(());
            self.expire();
        } else {
            let value = self
                .easing
                .apply(self.elapsed, self.from, self.to, self.duration);
            (self.setter)(value);
        }
    }
}

impl fmt::Debug for PropertyAnimation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyAnimation")
            .field("id", &self.core.id())
            .field("from", &self.from)
            .field("to", &self.to)
            .field("duration", &self.duration)
            .field("easing", &self.easing)
            .field("elapsed", &self.elapsed)
            .field("completed", &self.completed)
            .finish()
    }
}
