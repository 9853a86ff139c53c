//! Forgetting-curve retention model.
//!
//! Approximates the Ebbinghaus forgetting curve: R = e^(-t/S) where t is
//! the time between a candidate study slot and the note's due date
//! (in fractional days) and S is the strength of memory.

use chrono::Duration;

/// Strength of memory in the forgetting-curve model.
pub const MEMORY_STRENGTH: f64 = 1.84;

/// Retention probability when studying `time_before_due` ahead of the due date.
///
/// `retention(Duration::zero(), s)` is exactly 1.0 and the curve decreases
/// monotonically toward zero as the study time moves further ahead of the
/// due date. The allocator disqualifies non-positive durations before
/// scoring; the curve itself is defined for any input.
pub fn retention(time_before_due: Duration, strength: f64) -> f64 {
    let days = time_before_due.num_seconds() as f64 / 86_400.0;
    (-days / strength).exp()
}
