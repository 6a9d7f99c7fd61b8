//! Tick sources: producers of discrete time events.
//!
//! A [`TickSource`] hands every subscriber the same [`Tick`] synchronously,
//! once per advance. Sources can be paused; while paused no ticks are produced.
//!
//! Two implementations are provided:
//! - [`ManualTickSource`] – ticks only when told to. Fully deterministic, used by tests
//!   and by hosts that already own a frame loop.
//! - [`LiveTickSource`] – driven by a `crossbeam_channel::tick` timer. The host calls
//!   [`LiveTickSource::pump`] from its loop (or blocks in [`LiveTickSource::run_for`]);
//!   each timer event becomes one tick. Paused time is excluded from `total`.
//!
//! Subscribers are snapshotted at the start of an emission, so a callback
//! subscribed while a tick is being delivered only sees the next one.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Instant;

use crossbeam_channel::Receiver;
use smallvec::SmallVec;

use crate::error::{SchedulerError, SchedulerResult};
use crate::events::signal::SubscriptionId;
use crate::events::tick::Tick;

/// Callback invoked with every produced tick.
pub type TickCallback = Box<dyn FnMut(&Tick)>;

/// Pausable producer of tick events.
pub trait TickSource {
    /// Registers `callback` to receive every future tick.
    fn subscribe(&self, callback: TickCallback) -> SubscriptionId;
    /// Removes a subscription. Returns whether it existed.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
    fn is_paused(&self) -> bool;
    fn pause(&self);
    fn unpause(&self);
}

type SharedCallback = Rc<RefCell<TickCallback>>;

/// Subscriber list shared by the tick source implementations.
#[derive(Default)]
pub struct TickSubscribers {
    entries: RefCell<Vec<(SubscriptionId, SharedCallback)>>,
}

impl TickSubscribers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, callback: TickCallback) -> SubscriptionId {
        let id = SubscriptionId::next();
        self.entries
            .borrow_mut()
            .push((id, Rc::new(RefCell::new(callback))));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|(sid, _)| *sid != id);
        entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Delivers `tick` to everyone subscribed when the call started.
    pub fn emit(&self, tick: &Tick) {
        let snapshot: SmallVec<[(SubscriptionId, SharedCallback); 8]> =
            self.entries.borrow().iter().cloned().collect();
        for (id, callback) in snapshot {
            // Unsubscribed by an earlier callback of this same emission.
            if !self.entries.borrow().iter().any(|(sid, _)| *sid == id) {
                continue;
            }
            match callback.try_borrow_mut() {
                Ok(mut cb) => cb(tick),
                Err(_) => log::warn!("tick subscriber {id:?} re-entered while running; skipped"),
            }
        }
    }
}

// ==================== MANUAL SOURCE ====================

/// Deterministic source that ticks only on explicit calls.
#[derive(Default)]
pub struct ManualTickSource {
    subscribers: TickSubscribers,
    paused: Cell<bool>,
    total: Cell<f64>,
}

impl ManualTickSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor returning the source behind an `Rc`.
    pub fn shared() -> Rc<Self> {
        Rc::new(Self::new())
    }

    /// Accumulated time across every produced tick.
    pub fn total(&self) -> f64 {
        self.total.get()
    }

    /// Produces a tick `elapsed` ms after the previous one.
    ///
    /// Returns `false` without producing anything while paused.
    pub fn advance(&self, elapsed: f64) -> bool {
        if self.paused.get() {
            return false;
        }
        let total = self.total.get() + elapsed;
        self.total.set(total);
        self.subscribers.emit(&Tick::new(elapsed, total));
        true
    }

    /// Produces exactly `tick`, and adopts its `total` as the running total.
    pub fn emit(&self, tick: Tick) -> bool {
        if self.paused.get() {
            return false;
        }
        self.total.set(tick.total);
        self.subscribers.emit(&tick);
        true
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl TickSource for ManualTickSource {
    fn subscribe(&self, callback: TickCallback) -> SubscriptionId {
        self.subscribers.subscribe(callback)
    }
    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }
    fn is_paused(&self) -> bool {
        self.paused.get()
    }
    fn pause(&self) {
        self.paused.set(true);
    }
    fn unpause(&self) {
        self.paused.set(false);
    }
}

// ==================== LIVE SOURCE ====================

/// Stopwatch that stops accumulating while paused.
struct Stopwatch {
    started: Instant,
    paused_at: Option<Instant>,
    resumed_at: Option<Instant>,
    paused_total: std::time::Duration,
}

impl Stopwatch {
    fn start() -> Self {
        Stopwatch {
            started: Instant::now(),
            paused_at: None,
            resumed_at: None,
            paused_total: std::time::Duration::ZERO,
        }
    }

    fn pause(&mut self) {
        if self.paused_at.is_none() {
            self.paused_at = Some(Instant::now());
        }
    }

    fn resume(&mut self) {
        if let Some(at) = self.paused_at.take() {
            let now = Instant::now();
            self.paused_total += now.saturating_duration_since(at);
            self.resumed_at = Some(now);
        }
    }

    /// Whether a timer event stamped `at` fired before the latest resume.
    fn fired_before_resume(&self, at: Instant) -> bool {
        self.resumed_at.is_some_and(|resumed| at < resumed)
    }

    /// Running milliseconds at `now`, minus any paused interval.
    fn elapsed_ms_at(&self, now: Instant) -> f64 {
        let running = now
            .saturating_duration_since(self.started)
            .saturating_sub(self.paused_total);
        running.as_secs_f64() * 1000.0
    }
}

/// Timer-driven source producing one tick per timer interval.
pub struct LiveTickSource {
    subscribers: TickSubscribers,
    timer: Receiver<Instant>,
    interval: std::time::Duration,
    stopwatch: RefCell<Stopwatch>,
    last_total: Cell<f64>,
    produced: Cell<u64>,
}

impl LiveTickSource {
    /// Starts a source ticking every `interval_ms` milliseconds.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::InvalidArgument`] if `interval_ms` is zero.
    pub fn new(interval_ms: u64) -> SchedulerResult<Self> {
        if interval_ms == 0 {
            return Err(SchedulerError::invalid("tick interval must be at least 1 ms"));
        }
        let interval = std::time::Duration::from_millis(interval_ms);
        Ok(LiveTickSource {
            subscribers: TickSubscribers::new(),
            timer: crossbeam_channel::tick(interval),
            interval,
            stopwatch: RefCell::new(Stopwatch::start()),
            last_total: Cell::new(0.0),
            produced: Cell::new(0),
        })
    }

    pub fn interval(&self) -> std::time::Duration {
        self.interval
    }

    /// Number of ticks produced so far.
    pub fn produced(&self) -> u64 {
        self.produced.get()
    }

    /// Emits one tick per timer event that has fired since the last call.
    ///
    /// Never blocks. Returns the number of ticks produced.
    pub fn pump(&self) -> usize {
        let fired: SmallVec<[Instant; 4]> = self.timer.try_iter().collect();
        let mut produced = 0;
        for at in fired {
            if self.dispatch(at) {
                produced += 1;
            }
        }
        produced
    }

    /// Blocks until `ticks` ticks have been produced, or the source is paused.
    pub fn run_for(&self, ticks: u64) {
        let mut produced = 0;
        while produced < ticks && !self.is_paused() {
            match self.timer.recv() {
                Ok(at) => {
                    if self.dispatch(at) {
                        produced += 1;
                    }
                }
                Err(_) => break,
            }
        }
    }

    fn dispatch(&self, at: Instant) -> bool {
        if self.is_paused() || self.stopwatch.borrow().fired_before_resume(at) {
            return false;
        }
        // A timer event queued before a pause must not move time backwards.
        let total = self
            .stopwatch
            .borrow()
            .elapsed_ms_at(at)
            .max(self.last_total.get());
        let elapsed = total - self.last_total.get();
        self.last_total.set(total);
        self.produced.set(self.produced.get() + 1);
        self.subscribers.emit(&Tick::new(elapsed, total));
        true
    }
}

impl TickSource for LiveTickSource {
    fn subscribe(&self, callback: TickCallback) -> SubscriptionId {
        self.subscribers.subscribe(callback)
    }
    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }
    fn is_paused(&self) -> bool {
        self.stopwatch.borrow().paused_at.is_some()
    }
    fn pause(&self) {
        self.stopwatch.borrow_mut().pause();
    }
    fn unpause(&self) {
        if !self.is_paused() {
            return;
        }
        self.stopwatch.borrow_mut().resume();
        let stale = self.timer.try_iter().count();
        if stale > 0 {
            log::trace!("discarded {stale} timer events fired while paused");
        }
    }
}
