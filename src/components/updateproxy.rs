//! Updatable that re-broadcasts the ticks it receives.
//!
//! Registering an [`UpdateProxy`] in some update group gives code that is not
//! itself an updatable a tick feed which follows that group's pause state.
//! Subscribers are plain closures; they are called from inside the proxy's
//! advance, so they must not borrow the proxy itself.

use crate::components::updatable::{GroupId, Updatable, UpdatableCore};
use crate::events::signal::{Signal, SubscriptionId};
use crate::events::tick::Tick;

#[derive(Debug, Default)]
pub struct UpdateProxy {
    core: UpdatableCore,
    updated: Signal<Tick>,
}

impl UpdateProxy {
    pub fn new(group: GroupId) -> Self {
        UpdateProxy {
            core: UpdatableCore::with_group(group),
            updated: Signal::new(),
        }
    }

    pub fn subscribe(&mut self, callback: impl FnMut(Tick) + 'static) -> SubscriptionId {
        self.updated.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.updated.unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.updated.len()
    }
}

impl Updatable for UpdateProxy {
    fn core(&self) -> &UpdatableCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut UpdatableCore {
        &mut self.core
    }

    fn update(&mut self, tick: &Tick) {
        self.updated.emit(*tick);
    }
}
