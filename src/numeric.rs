//! Convenience wrappers around methods from the approx crate. Provides utility functions for
//! working with floating point precision.

use approx::AbsDiffEq;

/// Targeted accuracy instantiated over `f64`
pub const ACC: f64 = 10e-11;

/// Compares if two floats are close via `approx::abs_diff_eq` using a maximum absolute difference
/// (epsilon) of `acc`.
#[must_use]
pub fn almost_eq(a: f64, b: f64, acc: f64) -> bool {
    if a.is_infinite() && b.is_infinite() {
        return a == b;
    }
    a.abs_diff_eq(&b, acc)
}

/// Compares if two floats are close via `approx::relative_eq!` with a maximum relative
/// difference of `max_relative`.
#[must_use]
pub fn relative_almost_eq(a: f64, b: f64, max_relative: f64) -> bool {
    approx::relative_eq!(a, b, max_relative = max_relative)
}

/// Returns true if no element exceeds its predecessor by more than `tolerance`.
#[must_use]
pub fn is_non_increasing(values: &[f64], tolerance: f64) -> bool {
    values.windows(2).all(|pair| pair[1] <= pair[0] + tolerance)
}

/// Returns true if no element falls below its predecessor by more than `tolerance`.
#[must_use]
pub fn is_non_decreasing(values: &[f64], tolerance: f64) -> bool {
    values.windows(2).all(|pair| pair[1] >= pair[0] - tolerance)
}
