//! Long-lived, process-wide state.
//!
//! Overview
//! - `animator` – registry keeping fire-and-await animations alive
//! - `locator` – lookup of the default bucketed update service
//! - `schedulerconfig` – INI-backed settings for a tick loop
pub mod animator;
pub mod locator;
pub mod schedulerconfig;
