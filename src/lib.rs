//! Tick-driven scheduling engine.
//!
//! This crate exposes a mutation-safe map, tick sources, the `Duration`
//! countdown, the `Updatable` entity contract, plain and group-bucketed
//! update services, and a tweening layer built on top of them.
//!
//! Everything runs on one thread: a tick source emits, services advance
//! their entities in order, and the only suspension point offered to callers
//! is awaiting an entity's [`Expiry`](events::expiry::Expiry).

pub mod collections;
pub mod components;
pub mod error;
pub mod events;
pub mod resources;
pub mod systems;
