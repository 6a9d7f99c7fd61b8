//! Lookup of the default bucketed update service.
//!
//! Entities that self-register on creation (see
//! [`spawn`](crate::components::updatable::spawn)) and the
//! [`PropertyAnimator`](crate::resources::animator::PropertyAnimator) need a
//! service to register with. They ask a [`ServiceLocator`] instead of
//! reaching for a global directly, so tests can hand in their own.
//!
//! [`GlobalLocator`] resolves the per-thread default installed with
//! [`set_default_bucket_service`]. Everything in the scheduler is
//! single-threaded, so "process-wide" means the thread running the tick loop.

use std::cell::RefCell;
use std::rc::Rc;

use crate::systems::bucketupdateservice::BucketUpdateService;

thread_local! {
    static DEFAULT_BUCKET: RefCell<Option<Rc<BucketUpdateService>>> = const { RefCell::new(None) };
}

/// Resolves services by capability.
pub trait ServiceLocator {
    fn bucket_update_service(&self) -> Option<Rc<BucketUpdateService>>;
}

/// Locator backed by the thread's default registration.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalLocator;

impl ServiceLocator for GlobalLocator {
    fn bucket_update_service(&self) -> Option<Rc<BucketUpdateService>> {
        default_bucket_service()
    }
}

/// Locator that always answers with the same instance.
#[derive(Clone)]
pub struct FixedLocator(pub Rc<BucketUpdateService>);

impl ServiceLocator for FixedLocator {
    fn bucket_update_service(&self) -> Option<Rc<BucketUpdateService>> {
        Some(self.0.clone())
    }
}

/// Installs (or with `None`, removes) the default bucket service. Returns the previous one.
pub fn set_default_bucket_service(
    service: Option<Rc<BucketUpdateService>>,
) -> Option<Rc<BucketUpdateService>> {
    let installing = service.is_some();
    let previous = DEFAULT_BUCKET.with(|slot| std::mem::replace(&mut *slot.borrow_mut(), service));
    log::debug!(
        "default bucket update service {}",
        if installing { "installed" } else { "cleared" }
    );
    previous
}

pub fn default_bucket_service() -> Option<Rc<BucketUpdateService>> {
    DEFAULT_BUCKET.with(|slot| slot.borrow().clone())
}
