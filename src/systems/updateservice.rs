//! Drives one tick source across a set of weakly held updatables.
//!
//! An [`UpdateService`] subscribes to a [`TickSource`] on construction. On
//! every tick, unless the service is paused, it walks its membership map:
//!
//! 1. entries whose entity has been dropped by every owner are removed,
//! 2. entries whose entity has expired are removed,
//! 3. every other entity is advanced with the tick.
//!
//! Membership is a [`BufferedMap`] from [`EntityId`] to a [`WeakUpdatable`],
//! so pruning happens while dispatching, and entities may register or
//! unregister other entities from inside their own update without
//! disturbing the current pass. Anything registered mid-tick is first
//! advanced on the next tick.
//!
//! The service never keeps an entity alive. Dropping the last `Rc` of an
//! entity is enough to retire it; [`UpdateService::collect_garbage`] sweeps
//! such entries without advancing anything.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::collections::bufferedmap::BufferedMap;
use crate::components::updatable::{EntityId, SharedUpdatable, Updatable, WeakUpdatable};
use crate::events::signal::SubscriptionId;
use crate::events::tick::Tick;
use crate::systems::ticksource::TickSource;

/// Advances registered updatables on every tick of its source.
pub struct UpdateService {
    name: RefCell<String>,
    members: BufferedMap<EntityId, WeakUpdatable>,
    paused: Cell<bool>,
    source: Rc<dyn TickSource>,
    subscription: SubscriptionId,
}

impl UpdateService {
    /// Creates a service bound to `source`.
    pub fn new(source: Rc<dyn TickSource>) -> Rc<Self> {
        Rc::new_cyclic(|this: &Weak<UpdateService>| {
            let this = this.clone();
            let subscription = source.subscribe(Box::new(move |tick: &Tick| {
                if let Some(service) = this.upgrade() {
                    service.on_tick(tick);
                }
            }));
            UpdateService {
                name: RefCell::new(String::new()),
                members: BufferedMap::new(),
                paused: Cell::new(false),
                source,
                subscription,
            }
        })
    }

    /// Creates a named service; the name only shows up in logs.
    pub fn with_name(source: Rc<dyn TickSource>, name: impl Into<String>) -> Rc<Self> {
        let service = Self::new(source);
        service.set_name(name);
        service
    }

    pub fn name(&self) -> String {
        self.name.borrow().clone()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        *self.name.borrow_mut() = name.into();
    }

    /// Registers `entity` by id. Registering the same id again replaces the stored handle.
    pub fn register<T>(&self, entity: &Rc<RefCell<T>>)
    where
        T: Updatable + 'static,
    {
        let shared: SharedUpdatable = entity.clone();
        self.register_shared(&shared);
    }

    /// Type-erased form of [`UpdateService::register`].
    pub fn register_shared(&self, entity: &SharedUpdatable) {
        let id = entity.borrow().id();
        self.members.insert(id, Rc::downgrade(entity));
        log::debug!("update service '{}' registered {}", self.name.borrow(), id);
    }

    /// Drops the membership entry for `id`. Returns whether it was registered.
    pub fn unregister(&self, id: EntityId) -> bool {
        self.members.remove(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.members.contains_key(&id)
    }

    /// Number of membership entries, dead or alive, not yet purged.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn pause(&self) {
        self.paused.set(true);
    }

    pub fn unpause(&self) {
        self.paused.set(false);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.get()
    }

    /// Removes entries whose entity no longer exists. Returns how many were purged.
    pub fn collect_garbage(&self) -> usize {
        let mut purged = 0;
        self.members.for_each(|id, weak| {
            if weak.strong_count() == 0 && self.members.remove(id) {
                purged += 1;
            }
        });
        if purged > 0 {
            log::debug!(
                "update service '{}' collected {} dead entries",
                self.name.borrow(),
                purged
            );
        }
        purged
    }

    /// Runs one dispatch pass. Called by the tick source subscription.
    fn on_tick(&self, tick: &Tick) {
        if self.paused.get() {
            return;
        }
        log::trace!(
            "update service '{}' dispatching tick {:?} to {} entries",
            self.name.borrow(),
            tick,
            self.members.len()
        );

        self.members.for_each(|id, weak| {
            let Some(entity) = weak.upgrade() else {
                self.members.remove(id);
                return;
            };
            let Ok(mut entity) = entity.try_borrow_mut() else {
                log::warn!("updatable {id} is already borrowed; skipping this tick");
                return;
            };
            if entity.is_expired() {
                self.members.remove(id);
                return;
            }
            entity.advance(tick);
        });
    }
}

impl Drop for UpdateService {
    fn drop(&mut self) {
        self.source.unsubscribe(self.subscription);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::duration::Duration;
    use crate::components::updatable::UpdatableCore;
    use crate::systems::ticksource::ManualTickSource;

    struct Counter {
        core: UpdatableCore,
        updates: u32,
    }

    impl Counter {
        fn shared() -> Rc<RefCell<Counter>> {
            Rc::new(RefCell::new(Counter {
                core: UpdatableCore::new(),
                updates: 0,
            }))
        }
    }

    impl Updatable for Counter {
        fn core(&self) -> &UpdatableCore {
            &self.core
        }
        fn core_mut(&mut self) -> &mut UpdatableCore {
            &mut self.core
        }
        fn update(&mut self, _tick: &Tick) {
            self.updates += 1;
        }
    }

    fn setup() -> (Rc<ManualTickSource>, Rc<UpdateService>) {
        let source = ManualTickSource::shared();
        let service = UpdateService::new(source.clone());
        (source, service)
    }

    #[test]
    fn test_registered_entity_is_advanced() {
        let (source, service) = setup();
        let counter = Counter::shared();
        service.register(&counter);

        source.advance(16.0);
        source.advance(16.0);
        assert_eq!(counter.borrow().updates, 2);
        assert!(service.contains(counter.borrow().id()));
    }

    #[test]
    fn test_duplicate_registration_replaces() {
        let (source, service) = setup();
        let counter = Counter::shared();
        service.register(&counter);
        service.register(&counter);
        assert_eq!(service.len(), 1);
        source.advance(1.0);
        assert_eq!(counter.borrow().updates, 1);
    }

    #[test]
    fn test_service_does_not_keep_entity_alive() {
        let (source, service) = setup();
        let counter = Counter::shared();
        service.register(&counter);
        assert_eq!(Rc::strong_count(&counter), 1);

        drop(counter);
        assert_eq!(service.len(), 1);
        source.advance(1.0);
        assert_eq!(service.len(), 0);
    }

    #[test]
    fn test_collect_garbage_purges_dead_without_advancing() {
        let (_source, service) = setup();
        let alive = Counter::shared();
        let dead = Counter::shared();
        service.register(&alive);
        service.register(&dead);
        drop(dead);

        assert_eq!(service.collect_garbage(), 1);
        assert_eq!(service.len(), 1);
        assert_eq!(alive.borrow().updates, 0);
    }

    #[test]
    fn test_expired_entity_is_purged_and_not_advanced() {
        let (source, service) = setup();
        let counter = Counter::shared();
        service.register(&counter);
        counter.borrow_mut().expire();

        source.advance(1.0);
        assert_eq!(counter.borrow().updates, 0);
        assert_eq!(service.len(), 0);
    }

    #[test]
    fn test_duration_expiry_then_lazy_purge() {
        let (source, service) = setup();
        let counter = Counter::shared();
        counter
            .borrow_mut()
            .core_mut()
            .set_duration(Some(Duration::new(20.0, None).unwrap()));
        service.register(&counter);

        source.advance(10.0);
        source.advance(10.0);
        assert!(counter.borrow().is_expired());
        // Still listed until the next pass observes the expiry.
        assert_eq!(service.len(), 1);
        source.advance(10.0);
        assert_eq!(service.len(), 0);
        assert_eq!(counter.borrow().updates, 2);
    }

    #[test]
    fn test_paused_service_skips_dispatch() {
        let (source, service) = setup();
        let counter = Counter::shared();
        service.register(&counter);
        service.pause();
        source.advance(1.0);
        assert_eq!(counter.borrow().updates, 0);
        service.unpause();
        source.advance(1.0);
        assert_eq!(counter.borrow().updates, 1);
    }

    #[test]
    fn test_unregister() {
        let (source, service) = setup();
        let counter = Counter::shared();
        service.register(&counter);
        assert!(service.unregister(counter.borrow().id()));
        assert!(!service.unregister(counter.borrow().id()));
        source.advance(1.0);
        assert_eq!(counter.borrow().updates, 0);
    }

    #[test]
    fn test_drop_unsubscribes_from_source() {
        let (source, service) = setup();
        assert_eq!(source.subscriber_count(), 1);
        drop(service);
        assert_eq!(source.subscriber_count(), 0);
    }

    #[test]
    fn test_name() {
        let source = ManualTickSource::shared();
        let service = UpdateService::with_name(source, "hud");
        assert_eq!(service.name(), "hud");
    }
}
