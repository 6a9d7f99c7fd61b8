//! Event types exchanged between tick sources, services and entities.
//!
//! Submodules:
//! - [`expiry`] – awaitable resolved when an entity expires
//! - [`signal`] – repeatable and single-shot callback fan-out
//! - [`tick`] – the time step delivered to every subscriber
//!
//! See each submodule for concrete event data and semantics.
pub mod expiry;
pub mod signal;
pub mod tick;
