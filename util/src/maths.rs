//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Linearly interpolate between `a` and `b` by `frac`, where `frac = 0`
/// gives `a` and `frac = 1` gives `b`.
pub fn lerp<T>(a: T, b: T, frac: T) -> T
where
    T: Float
{
    a + (b - a) * frac
}

pub fn clamp<T>(value: &T, min: &T, max: &T) -> T 
where
    T: Float
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

/// Wrap an angle into the range (-pi, pi].
pub fn wrap_pi<T>(angle: T) -> T
where
    T: Float
{
    let pi_t: T = T::from(std::f64::consts::PI).unwrap();
    let tau_t: T = T::from(std::f64::consts::TAU).unwrap();

    if angle > -pi_t && angle <= pi_t {
        return angle;
    }

    let wrapped = rem_euclid(angle + pi_t, tau_t) - pi_t;

    if wrapped <= -pi_t {
        wrapped + tau_t
    }
    else {
        wrapped
    }
}

/// Wrap `input` into the range [`min`, `max`] by adding or removing whole 
/// multiples of the range width.
///
/// Used by controllers with continuous inputs (such as angles) so that the
/// error between two inputs is always the shortest distance around the range.
pub fn input_modulus<T>(input: T, min: T, max: T) -> T
where
    T: Float
{
    let modulus = max - min;
    let mut value = input;

    let num_max = ((value - min) / modulus).trunc();
    value = value - num_max * modulus;

    let num_min = ((value - max) / modulus).trunc();
    value = value - num_min * modulus;

    value
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
/// 
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()`, violating the mathematical definition, if
/// `self` is much smaller than `rhs.abs()` in magnitude and `self < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

#[cfg(test)]
mod test {
    use super::*;

    const TAU: f64 = std::f64::consts::TAU;
    const PI: f64 = std::f64::consts::PI;

    #[test]
    fn test_wrap_pi() {
        assert_eq!(wrap_pi(0f64), 0f64);
        assert_eq!(wrap_pi(PI), PI);
        assert_eq!(wrap_pi(-PI), PI);
        assert!((wrap_pi(3.0 * PI / 2.0) + PI / 2.0).abs() < 1e-12);
        assert!((wrap_pi(-3.0 * PI / 2.0) - PI / 2.0).abs() < 1e-12);
        assert!((wrap_pi(TAU + 0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_input_modulus() {
        assert!((input_modulus(3.0 * PI / 2.0, -PI, PI) + PI / 2.0).abs() < 1e-12);
        assert!((input_modulus(-3.0 * PI / 2.0, -PI, PI) - PI / 2.0).abs() < 1e-12);
        assert_eq!(input_modulus(0.5, -PI, PI), 0.5);
        assert_eq!(input_modulus(370.0, 0.0, 360.0), 10.0);
    }

    #[test]
    fn test_lerp_clamp() {
        assert_eq!(lerp(1.0, 3.0, 0.5), 2.0);
        assert_eq!(lerp(1.0, 3.0, 0.0), 1.0);
        assert_eq!(clamp(&5.0, &-1.0, &1.0), 1.0);
        assert_eq!(clamp(&-5.0, &-1.0, &1.0), -1.0);
        assert_eq!(clamp(&0.25, &-1.0, &1.0), 0.25);
    }
}
