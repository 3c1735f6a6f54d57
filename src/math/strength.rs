//! Strength Computation
//!
//! Formulas used by the progression calculator. All functions take plain numbers so
//! they can be reused for sets, history rows and chart data alike.

use log::trace;

use crate::core::constants::EPLEY_DIVISOR;

/// `set_volume` function.
///
/// Volume of a single set: weight times reps.
///
/// # Arguments
/// - `weight`: Load of the set in the user's unit.
/// - `reps`: Number of repetitions.
pub fn set_volume(weight: f64, reps: u32) -> f64 {
    weight * f64::from(reps)
}

/// `epley_one_rep_max` function.
///
/// Estimates the one-rep-max with the Epley formula `w * (1 + r / 30)`.
/// A set of one rep (or none) is taken at face value.
///
/// # Arguments
/// - `weight`: Load of the set.
/// - `reps`: Number of repetitions.
///
/// # Returns
/// The estimated one-rep-max in the unit of `weight`.
pub fn epley_one_rep_max(weight: f64, reps: u32) -> f64 {
    if reps <= 1 {
        return weight;
    }
    let estimate = weight * (1.0 + f64::from(reps) / EPLEY_DIVISOR);
    trace!("Epley estimate for {}x{}: {}", weight, reps, estimate);
    estimate
}

/// `percent_change` function.
///
/// Relative change from `first` to `last` in percent. A zero baseline yields 0.
pub fn percent_change(first: f64, last: f64) -> f64 {
    if first == 0.0 {
        return 0.0;
    }
    (last - first) / first * 100.0
}
