//! Easing curve math.
//!
//! Every curve is available in two shapes:
//!
//! - normalized, via [`ease`]: maps progress `x` in `[0, 1]` to an eased factor
//! - absolute, via [`interpolate`] and the named helpers ([`linear`],
//!   [`quad_ease_in`], ...): `(elapsed, from, to, duration) -> value`
//!
//! The absolute form is what [`PropertyAnimation`](crate::components::propertyanimation::PropertyAnimation)
//! calls each tick. Progress is clamped to `[0, 1]`, and a non-positive
//! duration jumps straight to `to`.

use crate::components::tween::EasingFunctionId;

/// Apply an easing curve to a normalized progress value.
///
/// The input `x` is clamped to [0.0, 1.0]. Every curve except
/// [`EasingFunctionId::QuadraticRiseFall`] maps 0 to 0 and 1 to 1; the
/// rise-fall curve peaks at 1 when `x` is 0.5 and returns to 0 at both ends.
pub fn ease(id: EasingFunctionId, x: f64) -> f64 {
    let x = x.clamp(0.0, 1.0);
    match id {
        EasingFunctionId::Linear => x,
        EasingFunctionId::QuadEaseIn => x * x,
        EasingFunctionId::QuadEaseOut => x * (2.0 - x),
        EasingFunctionId::QuadEaseInOut => {
            if x < 0.5 {
                2.0 * x * x
            } else {
                -1.0 + (4.0 - 2.0 * x) * x
            }
        }
        EasingFunctionId::CubicEaseIn => x * x * x,
        EasingFunctionId::CubicEaseOut => {
            let p = x - 1.0;
            p * p * p + 1.0
        }
        EasingFunctionId::CubicEaseInOut => {
            if x < 0.5 {
                4.0 * x * x * x
            } else {
                let p = 2.0 * x - 2.0;
                0.5 * p * p * p + 1.0
            }
        }
        EasingFunctionId::QuartEaseIn => x * x * x * x,
        EasingFunctionId::QuadraticRiseFall => {
            let p = 2.0 * x - 1.0;
            1.0 - p * p
        }
    }
}

/// Linearly interpolate between two values.
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Value at `elapsed` of an eased transition from `from` to `to` over `duration`.
pub fn interpolate(id: EasingFunctionId, elapsed: f64, from: f64, to: f64, duration: f64) -> f64 {
    if duration <= 0.0 {
        return to;
    }
    lerp(from, to, ease(id, elapsed / duration))
}

pub fn linear(elapsed: f64, from: f64, to: f64, duration: f64) -> f64 {
    interpolate(EasingFunctionId::Linear, elapsed, from, to, duration)
}

pub fn quad_ease_in(elapsed: f64, from: f64, to: f64, duration: f64) -> f64 {
    interpolate(EasingFunctionId::QuadEaseIn, elapsed, from, to, duration)
}

pub fn quad_ease_out(elapsed: f64, from: f64, to: f64, duration: f64) -> f64 {
    interpolate(EasingFunctionId::QuadEaseOut, elapsed, from, to, duration)
}

pub fn quart_ease_in(elapsed: f64, from: f64, to: f64, duration: f64) -> f64 {
    interpolate(EasingFunctionId::QuartEaseIn, elapsed, from, to, duration)
}

pub fn quadratic_rise_fall(elapsed: f64, from: f64, to: f64, duration: f64) -> f64 {
    interpolate(EasingFunctionId::QuadraticRiseFall, elapsed, from, to, duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    // ==================== NORMALIZED EASING TESTS ====================

    #[test]
    fn test_ease_monotonic_types_at_zero_and_one() {
        for id in EasingFunctionId::ALL {
            if id == EasingFunctionId::QuadraticRiseFall {
                continue;
            }
            assert!(approx_eq(ease(id, 0.0), 0.0), "{id} at x=0.0 should be 0.0");
            assert!(approx_eq(ease(id, 1.0), 1.0), "{id} at x=1.0 should be 1.0");
        }
    }

    #[test]
    fn test_ease_clamps_input() {
        assert!(approx_eq(ease(EasingFunctionId::Linear, -0.5), 0.0));
        assert!(approx_eq(ease(EasingFunctionId::Linear, 1.5), 1.0));
        assert!(approx_eq(ease(EasingFunctionId::CubicEaseOut, 2.0), 1.0));
    }

    #[test]
    fn test_ease_in_out_midpoints() {
        assert!(approx_eq(ease(EasingFunctionId::QuadEaseInOut, 0.5), 0.5));
        assert!(approx_eq(ease(EasingFunctionId::CubicEaseInOut, 0.5), 0.5));
        assert!(ease(EasingFunctionId::QuadEaseIn, 0.5) < 0.5);
        assert!(ease(EasingFunctionId::QuadEaseOut, 0.5) > 0.5);
    }

    #[test]
    fn test_rise_fall_shape() {
        let id = EasingFunctionId::QuadraticRiseFall;
        assert!(approx_eq(ease(id, 0.0), 0.0));
        assert!(approx_eq(ease(id, 0.5), 1.0));
        assert!(approx_eq(ease(id, 1.0), 0.0));
        assert!(approx_eq(ease(id, 0.25), ease(id, 0.75)));
    }

    // ==================== ABSOLUTE CURVE TESTS ====================

    #[test]
    fn test_linear_values() {
        assert!(approx_eq(linear(0.0, 0.0, 100.0, 100.0), 0.0));
        assert!(approx_eq(linear(50.0, 0.0, 100.0, 100.0), 50.0));
        assert!(approx_eq(linear(100.0, 0.0, 100.0, 100.0), 100.0));
    }

    #[test]
    fn test_linear_with_negative_start() {
        assert!(approx_eq(linear(0.0, -100.0, 300.0, 400.0), -100.0));
        assert!(approx_eq(linear(100.0, -100.0, 300.0, 400.0), 0.0));
        assert!(approx_eq(linear(200.0, -100.0, 300.0, 400.0), 100.0));
        assert!(approx_eq(linear(400.0, -100.0, 300.0, 400.0), 300.0));
    }

    #[test]
    fn test_quart_ease_in_values() {
        assert!(approx_eq(quart_ease_in(0.0, 0.0, 100.0, 100.0), 0.0));
        assert!(approx_eq(quart_ease_in(50.0, 0.0, 100.0, 100.0), 6.25));
        assert!(approx_eq(quart_ease_in(100.0, 0.0, 100.0, 100.0), 100.0));
    }

    #[test]
    fn test_quad_ease_in_descending() {
        assert!(approx_eq(quad_ease_in(1.0, 100.0, 0.0, 10.0), 99.0));
        assert!(approx_eq(quad_ease_in(2.0, 100.0, 0.0, 10.0), 96.0));
        assert!(approx_eq(quad_ease_in(10.0, 100.0, 0.0, 10.0), 0.0));
    }

    #[test]
    fn test_quad_ease_out_values() {
        assert!(approx_eq(quad_ease_out(5.0, 0.0, 100.0, 10.0), 75.0));
    }

    #[test]
    fn test_quadratic_rise_fall_values() {
        let expected = [
            (5.0, 75.0),
            (8.0, 96.0),
            (9.0, 99.0),
            (10.0, 100.0),
            (11.0, 99.0),
            (12.0, 96.0),
            (15.0, 75.0),
            (20.0, 0.0),
        ];
        for (t, value) in expected {
            let got = quadratic_rise_fall(t, 0.0, 100.0, 20.0);
            assert!(approx_eq(got, value), "t={t}: expected {value}, got {got}");
        }
    }

    #[test]
    fn test_zero_duration_jumps_to_target() {
        assert_eq!(interpolate(EasingFunctionId::Linear, 0.0, 3.0, 7.0, 0.0), 7.0);
        assert_eq!(interpolate(EasingFunctionId::QuartEaseIn, 5.0, 3.0, 7.0, -1.0), 7.0);
    }

    #[test]
    fn test_lerp() {
        assert!(approx_eq(lerp(10.0, 20.0, 0.25), 12.5));
        assert!(approx_eq(lerp(10.0, 20.0, 0.0), 10.0));
        assert!(approx_eq(lerp(10.0, 20.0, 1.0), 20.0));
    }
}
