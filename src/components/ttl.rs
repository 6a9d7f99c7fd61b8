//! Time-to-live updatable.
//!
//! A [`Ttl`] does nothing but live for a fixed span of tick time and then
//! expire. There is no callback of its own; anyone interested subscribes to
//! its expiry through [`UpdatableCore::on_expired`] or awaits
//! [`UpdatableCore::expiry`].
//!
//! # How It Works
//!
//! 1. The lifetime is an owned [`Duration`] on the core.
//! 2. Each advance feeds `tick.elapsed` into it.
//! 3. When it completes, the shared lifecycle expires the entity and its
//!    update service purges it on the following pass.
//!
//! Pausing the Ttl's update group freezes the countdown.
//!
//! # Related
//!
//! - [`crate::components::duration::Duration`] – the countdown itself
//! - [`crate::components::updatable::spawn`] – create and self-register in one call

use crate::components::duration::Duration;
use crate::components::updatable::{GroupId, Updatable, UpdatableCore};
use crate::error::SchedulerResult;
use crate::events::tick::Tick;

/// Expires after `lifetime` milliseconds of tick time.
#[derive(Debug)]
pub struct Ttl {
    core: UpdatableCore,
    ticks_lived: u64,
}

impl Ttl {
    /// Create a Ttl in the default group.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::InvalidArgument`](crate::error::SchedulerError::InvalidArgument)
    /// if `lifetime` is not positive.
    pub fn new(lifetime: f64) -> SchedulerResult<Self> {
        Self::in_group(lifetime, crate::components::updatable::DEFAULT_GROUP)
    }

    pub fn in_group(lifetime: f64, group: GroupId) -> SchedulerResult<Self> {
        let duration = Duration::new(lifetime, None)?;
        Ok(Ttl {
            core: UpdatableCore::with_group(group).with_duration(duration),
            ticks_lived: 0,
        })
    }

    /// Milliseconds left before expiry; 0 once expired.
    pub fn remaining(&self) -> f64 {
        self.core
            .duration()
            .map_or(0.0, |d| d.total_remaining().max(0.0))
    }

    /// Number of ticks this entity has been advanced.
    pub fn ticks_lived(&self) -> u64 {
        self.ticks_lived
    }
}

impl Updatable for Ttl {
    fn core(&self) -> &UpdatableCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut UpdatableCore {
        &mut self.core
    }

    fn update(&mut self, _tick: &Tick) {
        self.ticks_lived += 1;
    }
}
