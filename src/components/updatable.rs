//! The capability contract for anything advanced by the scheduler.
//!
//! An updatable is any type implementing [`Updatable`]. It embeds an
//! [`UpdatableCore`] holding the bookkeeping every entity shares:
//!
//! - a process-unique [`EntityId`],
//! - an update-group tag ([`GroupId`], default [`DEFAULT_GROUP`]),
//! - a monotonic expired flag,
//! - an optional owned [`Duration`] that expires the entity when it completes,
//! - a single-shot expiry signal.
//!
//! Implementors only write [`Updatable::update`] (and optionally the expire
//! hooks); [`Updatable::advance`] and [`Updatable::expire`] are provided and
//! implement the shared lifecycle:
//!
//! ```text
//! created -> registered -> advanced 0..n times -> expired -> purged by its service
//! ```
//!
//! Entities are shared as `Rc<RefCell<T>>`. Update services only keep a
//! [`WeakUpdatable`], so the entity lives exactly as long as its owners do.
//! [`spawn`] wraps a value and self-registers it with the default bucketed
//! service when a [`ServiceLocator`] provides one.
//!
//! # Example
//!
//! ```ignore
//! struct Blinker { core: UpdatableCore, on: bool }
//!
//! impl Updatable for Blinker {
//!     fn core(&self) -> &UpdatableCore { &self.core }
//!     fn core_mut(&mut self) -> &mut UpdatableCore { &mut self.core }
//!     fn update(&mut self, _tick: &Tick) { self.on = !self.on; }
//! }
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::components::duration::Duration;
use crate::events::expiry::{Expiry, ExpiryTrigger};
use crate::events::signal::{OnceSignal, SubscriptionId};
use crate::events::tick::Tick;
use crate::resources::locator::ServiceLocator;

static NEXT_ENTITY: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of an updatable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

impl EntityId {
    /// Allocates a fresh id.
    pub fn next() -> Self {
        EntityId(NEXT_ENTITY.fetch_add(1, Ordering::Relaxed))
    }

    pub fn to_bits(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Update-group tag partitioning entities into independently pausable cohorts.
pub type GroupId = i32;

/// Group every updatable belongs to unless told otherwise.
pub const DEFAULT_GROUP: GroupId = 0;

/// Strong, shareable handle to any updatable.
pub type SharedUpdatable = Rc<RefCell<dyn Updatable>>;

/// Non-owning handle kept by update services.
pub type WeakUpdatable = Weak<RefCell<dyn Updatable>>;

/// Bookkeeping shared by every updatable.
#[derive(Debug)]
pub struct UpdatableCore {
    id: EntityId,
    group: GroupId,
    expired: bool,
    duration: Option<Duration>,
    on_expired: OnceSignal<EntityId>,
    expiry: Option<Expiry>,
    expiry_trigger: Option<ExpiryTrigger>,
}

impl Default for UpdatableCore {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdatableCore {
    /// Core in the default group, without a duration.
    pub fn new() -> Self {
        Self::with_group(DEFAULT_GROUP)
    }

    pub fn with_group(group: GroupId) -> Self {
        UpdatableCore {
            id: EntityId::next(),
            group,
            expired: false,
            duration: None,
            on_expired: OnceSignal::new(),
            expiry: None,
            expiry_trigger: None,
        }
    }

    /// Builder: attach a lifetime. The owner expires when it completes.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn group(&self) -> GroupId {
        self.group
    }

    /// Retags the entity. Services route by group at registration, so call
    /// this before registering.
    pub fn set_group(&mut self, group: GroupId) {
        self.group = group;
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    pub fn duration(&self) -> Option<&Duration> {
        self.duration.as_ref()
    }

    pub fn duration_mut(&mut self) -> Option<&mut Duration> {
        self.duration.as_mut()
    }

    /// Replaces the owned duration; `None` disables auto-expiration.
    pub fn set_duration(&mut self, duration: Option<Duration>) {
        self.duration = duration;
    }

    /// Calls `callback` once, when the entity expires.
    ///
    /// If it already expired the callback runs immediately and `None` is returned.
    pub fn on_expired(
        &mut self,
        callback: impl FnOnce(EntityId) + 'static,
    ) -> Option<SubscriptionId> {
        self.on_expired.subscribe(callback)
    }

    pub fn unsubscribe_expired(&mut self, id: SubscriptionId) -> bool {
        self.on_expired.unsubscribe(id)
    }

    /// Awaitable that resolves the first time the entity expires.
    ///
    /// Every call hands out a clone of the same handle.
    pub fn expiry(&mut self) -> Expiry {
        if let Some(expiry) = &self.expiry {
            return expiry.clone();
        }
        let expiry = if self.expired {
            Expiry::resolved(self.id)
        } else {
            let (trigger, expiry) = Expiry::channel(self.id);
            self.expiry_trigger = Some(trigger);
            expiry
        };
        self.expiry = Some(expiry.clone());
        expiry
    }

    /// Sets the flag; fires and drains the expiry signal on the first call only.
    fn mark_expired(&mut self) -> bool {
        if self.expired {
            return false;
        }
        self.expired = true;
        if let Some(trigger) = self.expiry_trigger.take() {
            trigger.fire();
        }
        self.on_expired.fire(self.id);
        true
    }
}

/// Something the update services advance once per tick.
pub trait Updatable {
    fn core(&self) -> &UpdatableCore;
    fn core_mut(&mut self) -> &mut UpdatableCore;

    /// Entity-specific advance logic. Never called once expired.
    fn update(&mut self, _tick: &Tick) {}

    /// Runs at the start of every [`Updatable::expire`] call.
    fn before_expire(&mut self) {}

    /// Runs at the end of every [`Updatable::expire`] call.
    fn after_expire(&mut self) {}

    fn id(&self) -> EntityId {
        self.core().id()
    }

    fn group(&self) -> GroupId {
        self.core().group()
    }

    fn is_expired(&self) -> bool {
        self.core().is_expired()
    }

    fn duration(&self) -> Option<&Duration> {
        self.core().duration()
    }

    /// Advances the entity by one tick.
    ///
    /// No-op once expired. Otherwise runs [`Updatable::update`], feeds the
    /// tick's elapsed time to the owned duration (if any) and expires the
    /// entity when that duration has completed.
    fn advance(&mut self, tick: &Tick) {
        if self.is_expired() {
            return;
        }

        self.update(tick);
        if self.is_expired() {
            return;
        }

        let completed = match self.core_mut().duration_mut() {
            Some(duration) => {
                duration.advance(tick.elapsed);
                duration.is_completed()
            }
            None => false,
        };
        if completed {
            self.expire();
        }
    }

    /// Expires the entity.
    ///
    /// The flag only ever goes from `false` to `true`; the expiry signal
    /// fires on that transition and never again.
    fn expire(&mut self) {
        self.before_expire();
        if self.core_mut().mark_expired() {
            log::trace!("updatable {} expired", self.id());
        }
        self.after_expire();
    }
}

/// Wraps `entity` for sharing and registers it with the default bucketed
/// service, if `locator` resolves one.
///
/// Passing `None` means the caller registers the entity manually.
pub fn spawn<T>(entity: T, locator: Option<&dyn ServiceLocator>) -> Rc<RefCell<T>>
where
    T: Updatable + 'static,
{
    let shared = Rc::new(RefCell::new(entity));
    match locator.and_then(|l| l.bucket_update_service()) {
        Some(service) => service.register_updatable(&shared),
        None => log::trace!("no default update service; {} not self-registered", shared.borrow().id()),
    }
    shared
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct MockUpdatable {
        core: UpdatableCore,
        updates: Rc<Cell<u32>>,
        hooks: Rc<RefCell<Vec<&'static str>>>,
    }

    impl MockUpdatable {
        fn new(core: UpdatableCore) -> Self {
            MockUpdatable {
                core,
                updates: Rc::new(Cell::new(0)),
                hooks: Rc::new(RefCell::new(Vec::new())),
            }
        }
    }

    impl Updatable for MockUpdatable {
        fn core(&self) -> &UpdatableCore {
            &self.core
        }
        fn core_mut(&mut self) -> &mut UpdatableCore {
            &mut self.core
        }
        fn update(&mut self, _tick: &Tick) {
            self.updates.set(self.updates.get() + 1);
        }
        fn before_expire(&mut self) {
            self.hooks.borrow_mut().push("before");
        }
        fn after_expire(&mut self) {
            self.hooks.borrow_mut().push("after");
        }
    }

    #[test]
    fn test_new_instance_defaults() {
        let mock = MockUpdatable::new(UpdatableCore::new());
        assert!(!mock.is_expired());
        assert_eq!(mock.group(), DEFAULT_GROUP);
        assert!(mock.duration().is_none());
    }

    #[test]
    fn test_ids_are_unique() {
        let a = UpdatableCore::new();
        let b = UpdatableCore::new();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_expire_fires_signal_once() {
        let mut mock = MockUpdatable::new(UpdatableCore::new());
        let fired = Rc::new(Cell::new(0));
        let f = fired.clone();
        mock.core_mut().on_expired(move |_| f.set(f.get() + 1));

        mock.expire();
        mock.expire();
        mock.expire();
        assert_eq!(fired.get(), 1);
        assert!(mock.is_expired());
    }

    #[test]
    fn test_expire_runs_hooks_around_flag() {
        let mut mock = MockUpdatable::new(UpdatableCore::new());
        let hooks = mock.hooks.clone();
        let seen_expired = Rc::new(Cell::new(false));
        let s = seen_expired.clone();
        mock.core_mut().on_expired(move |_| s.set(true));
        mock.expire();
        assert_eq!(*hooks.borrow(), vec!["before", "after"]);
        assert!(seen_expired.get());
    }

    #[test]
    fn test_expired_entity_does_not_update() {
        let mut mock = MockUpdatable::new(UpdatableCore::new());
        mock.expire();
        mock.advance(&Tick::from_elapsed(500.0));
        assert_eq!(mock.updates.get(), 0);
    }

    #[test]
    fn test_completed_duration_expires_owner() {
        let core = UpdatableCore::new().with_duration(Duration::new(100.0, None).unwrap());
        let mut mock = MockUpdatable::new(core);

        mock.advance(&Tick::from_elapsed(60.0));
        assert!(!mock.is_expired());
        mock.advance(&Tick::from_elapsed(60.0));
        assert!(mock.is_expired());
        assert_eq!(mock.updates.get(), 2);

        mock.advance(&Tick::from_elapsed(60.0));
        assert_eq!(mock.updates.get(), 2);
    }

    #[test]
    fn test_paused_duration_keeps_owner_alive() {
        let core = UpdatableCore::new().with_duration(Duration::paused(10.0, None).unwrap());
        let mut mock = MockUpdatable::new(core);
        mock.advance(&Tick::from_elapsed(100.0));
        assert!(!mock.is_expired());
    }

    #[test]
    fn test_expiry_resolves_on_expire() {
        let mut mock = MockUpdatable::new(UpdatableCore::new());
        let expiry = mock.core_mut().expiry();
        assert!(!expiry.is_resolved());
        mock.expire();
        assert!(expiry.is_resolved());
        assert_eq!(expiry.id(), mock.id());

        let late = mock.core_mut().expiry();
        assert!(late.is_resolved());
    }

    #[test]
    fn test_repeated_expiry_calls_share_one_handle() {
        let mut mock = MockUpdatable::new(UpdatableCore::new());
        let handles: Vec<Expiry> = (0..50).map(|_| mock.core_mut().expiry()).collect();
        assert!(mock.core().on_expired.is_empty());

        mock.expire();
        assert!(handles.iter().all(Expiry::is_resolved));
    }

    #[test]
    fn test_set_group_keeps_identity_and_subscribers() {
        let mut core = UpdatableCore::new();
        let id = core.id();
        let fired = Rc::new(Cell::new(false));
        let f = fired.clone();
        core.on_expired(move |_| f.set(true));

        core.set_group(4);
        assert_eq!(core.group(), 4);
        assert_eq!(core.id(), id);

        let mut mock = MockUpdatable::new(core);
        mock.expire();
        assert!(fired.get());
    }

    #[test]
    fn test_on_expired_after_expiry_runs_immediately() {
        let mut mock = MockUpdatable::new(UpdatableCore::new());
        mock.expire();
        let fired = Rc::new(Cell::new(false));
        let f = fired.clone();
        assert!(mock.core_mut().on_expired(move |_| f.set(true)).is_none());
        assert!(fired.get());
    }

    #[test]
    fn test_spawn_without_locator_does_not_register() {
        let shared = spawn(MockUpdatable::new(UpdatableCore::new()), None);
        assert_eq!(Rc::strong_count(&shared), 1);
        assert_eq!(Rc::weak_count(&shared), 0);
    }
}
