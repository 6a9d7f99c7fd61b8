//! Scheduler drivers.
//!
//! This module groups the pieces that produce ticks and push them through
//! registered entities.
//!
//! Submodules overview
//! - [`bucketupdateservice`] – one update service per update group
//! - [`ticksource`] – the `TickSource` trait, manual and timer-driven sources
//! - [`tween`] – easing curve math
//! - [`updateservice`] – dispatch, pruning and pausing for one set of entities

pub mod bucketupdateservice;
pub mod ticksource;
pub mod tween;
pub mod updateservice;
