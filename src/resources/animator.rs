//! Fire-and-await property animations.
//!
//! [`PropertyAnimator`] builds a [`PropertyAnimation`], registers it with a
//! bucketed update service and parks it in a per-thread registry that keeps
//! it alive. The returned [`Expiry`] resolves when the animation completes,
//! at which point the registry drops it. Callers never handle the entity.
//!
//! # How It Works
//!
//! 1. The animation is created and its group's bucket registers it (weakly).
//! 2. The registry holds the only strong reference.
//! 3. On expiry, a subscriber removes the registry entry; the update service
//!    purges its dead weak entry on its next pass.
//!
//! An animation that can never finish (its bucket was dropped, or its group
//! stays paused) is released with [`PropertyAnimator::cancel`]. Cancelling
//! expires it where it stands, without applying the target value.
//!
//! # Usage
//!
//! ```ignore
//! let done = PropertyAnimator::animate(
//!     move |v| opacity.set(v),
//!     0.0,
//!     1.0,
//!     250.0,
//!     EasingFunctionId::QuadEaseOut,
//! )?;
//! // ... ticks ...
//! assert!(done.is_resolved());
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::components::propertyanimation::PropertyAnimation;
use crate::components::tween::Easing;
use crate::components::updatable::{EntityId, Updatable};
use crate::error::{SchedulerError, SchedulerResult};
use crate::events::expiry::Expiry;
use crate::resources::locator::{GlobalLocator, ServiceLocator};
use crate::systems::bucketupdateservice::BucketUpdateService;

thread_local! {
    static ACTIVE: RefCell<FxHashMap<EntityId, Rc<RefCell<PropertyAnimation>>>> =
        RefCell::new(FxHashMap::default());
}

/// Stateless façade over the per-thread animation registry.
pub struct PropertyAnimator;

impl PropertyAnimator {
    /// Runs an animation on the default bucket service.
    ///
    /// # Errors
    ///
    /// - [`SchedulerError::MissingService`] if no default service is installed
    /// - [`SchedulerError::InvalidArgument`] for a negative or non-finite `duration`
    pub fn animate(
        setter: impl FnMut(f64) + 'static,
        from: f64,
        to: f64,
        duration: f64,
        easing: impl Into<Easing>,
    ) -> SchedulerResult<Expiry> {
        Self::animate_located(&GlobalLocator, setter, from, to, duration, easing)
    }

    /// Like [`PropertyAnimator::animate`], resolving the service through `locator`.
    pub fn animate_located(
        locator: &dyn ServiceLocator,
        setter: impl FnMut(f64) + 'static,
        from: f64,
        to: f64,
        duration: f64,
        easing: impl Into<Easing>,
    ) -> SchedulerResult<Expiry> {
        let service = locator
            .bucket_update_service()
            .ok_or(SchedulerError::MissingService("bucket update service"))?;
        let animation = PropertyAnimation::new(setter, from, to, duration, easing)?;
        Ok(Self::start(&service, animation))
    }

    /// Runs an animation on an explicit service.
    pub fn animate_with(
        service: &BucketUpdateService,
        setter: impl FnMut(f64) + 'static,
        from: f64,
        to: f64,
        duration: f64,
        easing: impl Into<Easing>,
    ) -> SchedulerResult<Expiry> {
        let animation = PropertyAnimation::new(setter, from, to, duration, easing)?;
        Ok(Self::start(service, animation))
    }

    /// Registers an already built animation, e.g. one tagged with a group.
    pub fn start(service: &BucketUpdateService, animation: PropertyAnimation) -> Expiry {
        let id = animation.id();
        let animation = Rc::new(RefCell::new(animation));

        let expiry = {
            let mut anim = animation.borrow_mut();
            anim.core_mut().on_expired(Self::forget);
            anim.core_mut().expiry()
        };

        service.register_updatable(&animation);
        ACTIVE.with(|active| active.borrow_mut().insert(id, animation));
        log::debug!("animation {} started", id);
        expiry
    }

    /// Number of animations that have not completed yet.
    pub fn active_count() -> usize {
        ACTIVE.with(|active| active.borrow().len())
    }

    /// Whether the animation `id` is still running.
    pub fn is_active(id: EntityId) -> bool {
        ACTIVE.with(|active| active.borrow().contains_key(&id))
    }

    /// Stops a running animation and releases it from the registry.
    ///
    /// The value is left wherever the last tick put it; the completion
    /// callbacks do not run but the [`Expiry`] resolves. Returns `false` if
    /// `id` is not active, or if the animation is mid-advance (cancelling
    /// from inside its own setter), in which case it keeps running.
    pub fn cancel(id: EntityId) -> bool {
        let Some(animation) = ACTIVE.with(|active| active.borrow_mut().remove(&id)) else {
            return false;
        };
        let cancelled = match animation.try_borrow_mut() {
            Ok(mut anim) => {
                anim.expire();
                true
            }
            Err(_) => false,
        };
        if cancelled {
            log::debug!("animation {} cancelled", id);
        } else {
            log::warn!("animation {} is advancing; cancel ignored", id);
            ACTIVE.with(|active| active.borrow_mut().insert(id, animation));
        }
        cancelled
    }

    fn forget(id: EntityId) {
        // The service still holds an upgraded handle while the animation
        // expires, so releasing ours here never drops it mid-advance.
        let removed = ACTIVE.with(|active| active.borrow_mut().remove(&id));
        if removed.is_some() {
            log::debug!("animation {} finished", id);
        }
        drop(removed);
    }
}
