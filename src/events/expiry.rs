//! Awaitable handle that resolves when an updatable expires.
//!
//! [`Expiry`] is the only suspension point the scheduler exposes. It never
//! resolves inside the call that created it unless the entity was already
//! expired; otherwise it resolves on whichever later tick (or explicit
//! `expire()` call) expires the entity.
//!
//! # How It Works
//!
//! Each entity owns at most one oneshot channel. The receiving half is wrapped
//! in [`Shared`], so every clone of the handle is its own waiter and all of
//! them are woken when the [`ExpiryTrigger`] fires. If the entity is dropped
//! without ever expiring, its handles stay pending.
//!
//! # Related
//!
//! - [`crate::components::updatable::UpdatableCore::expiry`] – where handles come from

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::oneshot;
use futures::future::{FutureExt, Shared};

use crate::components::updatable::EntityId;

/// Resolves with the id of the entity once it has expired.
#[derive(Clone)]
pub struct Expiry {
    id: EntityId,
    inner: Shared<oneshot::Receiver<EntityId>>,
}

/// Sending half owned by the entity; firing it resolves every handle.
pub(crate) struct ExpiryTrigger {
    id: EntityId,
    sender: oneshot::Sender<EntityId>,
}

impl ExpiryTrigger {
    pub(crate) fn fire(self) {
        // Every handle may already be gone; nothing to resolve then.
        let _ = self.sender.send(self.id);
    }
}

impl fmt::Debug for ExpiryTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpiryTrigger").field("id", &self.id).finish()
    }
}

impl Expiry {
    pub(crate) fn channel(id: EntityId) -> (ExpiryTrigger, Expiry) {
        let (sender, receiver) = oneshot::channel();
        (
            ExpiryTrigger { id, sender },
            Expiry {
                id,
                inner: receiver.shared(),
            },
        )
    }

    pub(crate) fn resolved(id: EntityId) -> Self {
        let (trigger, expiry) = Self::channel(id);
        trigger.fire();
        expiry
    }

    /// Id of the entity this handle is waiting on.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Whether the entity has expired.
    pub fn is_resolved(&self) -> bool {
        matches!(self.inner.clone().now_or_never(), Some(Ok(_)))
    }
}

impl fmt::Debug for Expiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expiry")
            .field("id", &self.id)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

impl Future for Expiry {
    type Output = EntityId;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.inner.poll_unpin(cx) {
            Poll::Ready(Ok(id)) => Poll::Ready(id),
            // Trigger dropped unfired: the entity is gone and will never expire.
            Poll::Ready(Err(_)) | Poll::Pending => Poll::Pending,
        }
    }
}
