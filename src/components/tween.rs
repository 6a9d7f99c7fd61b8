//! Easing selection for property animations.
//!
//! An easing function maps `(elapsed, from, to, duration)` to the value a
//! property should have at `elapsed`. Animations pick one through [`Easing`]:
//!
//! - [`Easing::Named`] – one of the built-in curves, by [`EasingFunctionId`]
//! - [`Easing::Custom`] – any closure with the same four-argument shape
//!
//! Ids parse from strings (`"QuadEaseIn"`, case-insensitive) and deserialize
//! with serde, so curves can be chosen from config files.
//! See [`crate::systems::tween`] for the curve math.

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;
use crate::systems::tween;

/// Built-in easing curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EasingFunctionId {
    /// Constant speed.
    #[default]
    Linear,
    /// Starts slow, accelerates (quadratic).
    QuadEaseIn,
    /// Starts fast, decelerates (quadratic).
    QuadEaseOut,
    /// Slow start and end (quadratic).
    QuadEaseInOut,
    CubicEaseIn,
    CubicEaseOut,
    CubicEaseInOut,
    /// Starts very slow, accelerates (quartic).
    QuartEaseIn,
    /// Rises from `from` to `to` at the midpoint and falls back to `from`.
    QuadraticRiseFall,
}

impl EasingFunctionId {
    pub const ALL: [EasingFunctionId; 9] = [
        EasingFunctionId::Linear,
        EasingFunctionId::QuadEaseIn,
        EasingFunctionId::QuadEaseOut,
        EasingFunctionId::QuadEaseInOut,
        EasingFunctionId::CubicEaseIn,
        EasingFunctionId::CubicEaseOut,
        EasingFunctionId::CubicEaseInOut,
        EasingFunctionId::QuartEaseIn,
        EasingFunctionId::QuadraticRiseFall,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EasingFunctionId::Linear => "Linear",
            EasingFunctionId::QuadEaseIn => "QuadEaseIn",
            EasingFunctionId::QuadEaseOut => "QuadEaseOut",
            EasingFunctionId::QuadEaseInOut => "QuadEaseInOut",
            EasingFunctionId::CubicEaseIn => "CubicEaseIn",
            EasingFunctionId::CubicEaseOut => "CubicEaseOut",
            EasingFunctionId::CubicEaseInOut => "CubicEaseInOut",
            EasingFunctionId::QuartEaseIn => "QuartEaseIn",
            EasingFunctionId::QuadraticRiseFall => "QuadraticRiseFall",
        }
    }
}

impl fmt::Display for EasingFunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EasingFunctionId {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        EasingFunctionId::ALL
            .into_iter()
            .find(|id| id.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| SchedulerError::invalid(format!("unknown easing function '{wanted}'")))
    }
}

/// Signature shared by every easing curve: `(elapsed, from, to, duration) -> value`.
pub type EasingFn = dyn Fn(f64, f64, f64, f64) -> f64;

/// The curve an animation interpolates with.
#[derive(Clone)]
pub enum Easing {
    Named(EasingFunctionId),
    Custom(Rc<EasingFn>),
}

impl Easing {
    /// Wraps a caller-supplied curve.
    pub fn custom(f: impl Fn(f64, f64, f64, f64) -> f64 + 'static) -> Self {
        Easing::Custom(Rc::new(f))
    }

    /// Value at `elapsed` of a transition from `from` to `to` lasting `duration`.
    pub fn apply(&self, elapsed: f64, from: f64, to: f64, duration: f64) -> f64 {
        match self {
            Easing::Named(id) => tween::interpolate(*id, elapsed, from, to, duration),
            Easing::Custom(f) => f(elapsed, from, to, duration),
        }
    }
}

impl Default for Easing {
    fn default() -> Self {
        Easing::Named(EasingFunctionId::Linear)
    }
}

impl From<EasingFunctionId> for Easing {
    fn from(id: EasingFunctionId) -> Self {
        Easing::Named(id)
    }
}

impl fmt::Debug for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Easing::Named(id) => write!(f, "Easing::Named({id})"),
            Easing::Custom(_) => f.write_str("Easing::Custom(..)"),
        }
    }
}
