//! The tick event carried from a tick source to every update service.
//!
//! All time values are milliseconds. Mixing units between a
//! [`Duration`](crate::components::duration::Duration) and the tick source
//! that drives it is a caller error.

/// One discrete advance of time.
///
/// Produced once per tick by a [`TickSource`](crate::systems::ticksource::TickSource)
/// and consumed synchronously by every subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Tick {
    /// Milliseconds since the previous tick.
    pub elapsed: f64,
    /// Milliseconds since the source started, excluding paused time.
    pub total: f64,
}

impl Tick {
    pub fn new(elapsed: f64, total: f64) -> Self {
        Tick { elapsed, total }
    }

    /// A tick carrying only an elapsed delta; `total` is left at zero.
    pub fn from_elapsed(elapsed: f64) -> Self {
        Tick {
            elapsed,
            total: 0.0,
        }
    }
}
