//! Scale-aware floating point comparisons and the means used by the
//! measure aggregation.
//!
//! The comparison functions take a `size` hint, the expected number of
//! accumulated terms in the compared values, so that the equality margin
//! grows with the accumulated rounding error.

use num_traits::Float;

/// Smallest distinguishable relative difference of the floating point type.
pub fn precision_limit<T: Float>() -> T {
    T::epsilon().sqrt()
}

/// Checks the approximate equality of two floating point numbers.
///
/// `size` is the average number of accumulated items in `a` and `b`, >= 1.
///
/// ```
/// assert!(clsim::equal(0.1f64 + 0.2, 0.3, 1.0));
/// assert!(!clsim::equal(0.3f64, 0.30001, 1.0));
/// assert!(clsim::equal(0.0f64, 0.0, 1.0));
/// ```
pub fn equal<T: Float>(a: T, b: T, size: f32) -> bool {
    debug_assert!(size > 0.0, "equal(), positive size is expected");
    let two = T::one() + T::one();
    let eps = precision_limit::<T>();
    // Relative difference with a margin growing as log2 of the number of
    // accumulated items
    let margin = eps * (T::one() + T::from(size.log2()).unwrap());
    two * (a - b).abs() / (a.abs() + b.abs() + eps) <= margin
}

/// Strict `a < b` for floating point numbers, the counterpart of [`equal`].
///
/// ```
/// assert!(clsim::less(0.3f64, 0.30001, 1.0));
/// assert!(!clsim::less(0.1f64 + 0.2, 0.3, 1.0));
/// ```
pub fn less<T: Float>(a: T, b: T, size: f32) -> bool {
    debug_assert!(size > 0.0, "less(), positive size is expected");
    let two = T::one() + T::one();
    let eps = precision_limit::<T>();
    let margin = eps * (T::one() + T::from(size.log2()).unwrap());
    two * (a - b) / (a.abs() + b.abs() + eps) + margin < T::zero()
}

/// Harmonic mean of two non-negative values, 0 when both are 0.
pub fn harmonic_mean(a: f64, b: f64) -> f64 {
    if a + b > 0.0 {
        2.0 * a / (a + b) * b
    } else {
        0.0
    }
}

/// Geometric mean of two non-negative values.
pub fn geometric_mean(a: f64, b: f64) -> f64 {
    (a * b).sqrt()
}

/// Arithmetic mean of two values.
pub fn arithmetic_mean(a: f64, b: f64) -> f64 {
    (a + b) / 2.0
}

/// Logarithm base of the entropy evaluation.
///
/// The choice cancels out in the normalized measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogBase {
    /// Shannon entropy in bits, log2
    #[default]
    Bits,
    /// Absolute entropy in nats, ln
    Nats,
}

impl LogBase {
    pub fn log(self, val: f64) -> f64 {
        match self {
            LogBase::Bits => val.log2(),
            LogBase::Nats => val.ln(),
        }
    }
}
