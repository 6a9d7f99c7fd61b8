//! Per-entity state advanced by the scheduler.
//!
//! This module groups the types an entity is made of: its lifecycle
//! bookkeeping, the countdowns it may own, and the concrete updatables the
//! crate ships with.
//!
//! Submodules overview:
//! - [`duration`] – countdown with optional periodic boundaries
//! - [`propertyanimation`] – updatable that eases a scalar toward a target
//! - [`ttl`] – updatable that simply expires after a lifetime
//! - [`tween`] – easing curve selection (named ids and custom closures)
//! - [`updatable`] – the `Updatable` trait, shared core state and `spawn`
//! - [`updateproxy`] – updatable that re-broadcasts its ticks

pub mod duration;
pub mod propertyanimation;
pub mod ttl;
pub mod tween;
pub mod updatable;
pub mod updateproxy;
