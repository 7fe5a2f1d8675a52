pub mod attendance_stats;
pub mod dashboard;
pub mod fallback;
pub mod productivity;
pub mod summary;
pub mod task_stats;

/// Assumed working days per month when no calendar is available.
pub const WORKING_DAYS_PER_MONTH: f64 = 22.0;

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// `part / whole * 100`, or `0.0` for an empty whole.
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
