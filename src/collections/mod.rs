//! Containers used by the scheduler.
//!
//! Submodules overview:
//! - [`bufferedmap`] – hash map that buffers add/remove/clear issued while it is being traversed

pub mod bufferedmap;
