//! Update services partitioned by update group.
//!
//! A [`BucketUpdateService`] owns one [`UpdateService`] per [`GroupId`], all
//! driven by the same tick source. Entities are routed to the bucket matching
//! their group tag when registered, so a whole cohort (UI, gameplay,
//! cutscene...) can be paused without touching the others.
//!
//! # How It Works
//!
//! 1. Construction creates the bucket for [`DEFAULT_GROUP`].
//! 2. [`BucketUpdateService::register_updatable`] reads the entity's group and
//!    creates that bucket on first use.
//! 3. Each bucket subscribes to the shared tick source independently and
//!    dispatches, prunes and pauses on its own.
//!
//! Pausing or unpausing a group that has no bucket yet is a no-op; it does
//! not create one.
//!
//! # Related
//!
//! - [`crate::systems::updateservice::UpdateService`] – a single bucket
//! - [`crate::resources::locator`] – process-wide default instance

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::components::updatable::{DEFAULT_GROUP, GroupId, SharedUpdatable, Updatable};
use crate::systems::ticksource::TickSource;
use crate::systems::updateservice::UpdateService;

/// One [`UpdateService`] per update group, sharing a tick source.
pub struct BucketUpdateService {
    source: Rc<dyn TickSource>,
    groups: RefCell<FxHashMap<GroupId, Rc<UpdateService>>>,
}

impl BucketUpdateService {
    pub fn new(source: Rc<dyn TickSource>) -> Self {
        let bucket = BucketUpdateService {
            source,
            groups: RefCell::new(FxHashMap::default()),
        };
        bucket.update_service(DEFAULT_GROUP);
        bucket
    }

    /// Convenience for sharing the bucket through a locator.
    pub fn shared(source: Rc<dyn TickSource>) -> Rc<Self> {
        Rc::new(Self::new(source))
    }

    /// Registers `entity` with the bucket for its group.
    pub fn register_updatable<T>(&self, entity: &Rc<RefCell<T>>)
    where
        T: Updatable + 'static,
    {
        let shared: SharedUpdatable = entity.clone();
        self.register_shared(&shared);
    }

    pub fn register_shared(&self, entity: &SharedUpdatable) {
        let group = entity.borrow().group();
        self.update_service(group).register_shared(entity);
    }

    /// Returns the bucket for `group`, creating it if needed.
    pub fn update_service(&self, group: GroupId) -> Rc<UpdateService> {
        if let Some(service) = self.groups.borrow().get(&group) {
            return service.clone();
        }
        let service = UpdateService::with_name(self.source.clone(), format!("group {group}"));
        self.groups.borrow_mut().insert(group, service.clone());
        log::debug!("created update bucket for group {}", group);
        service
    }

    /// Returns the bucket for `group` without creating it.
    pub fn get(&self, group: GroupId) -> Option<Rc<UpdateService>> {
        self.groups.borrow().get(&group).cloned()
    }

    /// Pauses an existing group. Unknown groups are ignored.
    pub fn pause(&self, group: GroupId) {
        match self.get(group) {
            Some(service) => service.pause(),
            None => log::debug!("pause ignored: no update bucket for group {}", group),
        }
    }

    /// Unpauses an existing group. Unknown groups are ignored.
    pub fn unpause(&self, group: GroupId) {
        match self.get(group) {
            Some(service) => service.unpause(),
            None => log::debug!("unpause ignored: no update bucket for group {}", group),
        }
    }

    /// Whether `group` exists and is paused.
    pub fn is_paused(&self, group: GroupId) -> bool {
        self.get(group).is_some_and(|s| s.is_paused())
    }

    pub fn pause_all(&self) {
        for service in self.services() {
            service.pause();
        }
    }

    pub fn unpause_all(&self) {
        for service in self.services() {
            service.unpause();
        }
    }

    /// Purges dead entries from every bucket. Returns the total purged.
    pub fn collect_garbage(&self) -> usize {
        self.services().iter().map(|s| s.collect_garbage()).sum()
    }

    /// Existing group ids in ascending order.
    pub fn group_ids(&self) -> Vec<GroupId> {
        let mut ids: Vec<GroupId> = self.groups.borrow().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Entries across all buckets, including dead ones not yet purged.
    pub fn len(&self) -> usize {
        self.services().iter().map(|s| s.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Snapshot so callbacks may create buckets while we iterate.
    fn services(&self) -> SmallVec<[Rc<UpdateService>; 8]> {
        self.groups.borrow().values().cloned().collect()
    }
}
