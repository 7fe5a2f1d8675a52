use super::{round_to, WORKING_DAYS_PER_MONTH};
use crate::domain::models::{Attendance, AttendanceStatus};
use crate::time_utils::month_bounds;
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MonthlyAttendanceStats {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub total_days: usize,
    pub on_time_days: usize,
    pub late_days: usize,
    /// Never derived from missing records; always `null`.
    pub absent_days: Option<usize>,
    pub average_work_hours: f64,
    pub attendance_rate: f64,
}

/// Statistics for the calendar month containing `reference`. Rows outside
/// that month are ignored.
pub fn monthly_stats(rows: &[Attendance], reference: NaiveDate) -> MonthlyAttendanceStats {
    let (start, end) = month_bounds(reference);
    let in_month: Vec<&Attendance> = rows
        .iter()
        .filter(|r| r.date >= start && r.date <= end)
        .collect();

    let total_days = in_month.len();
    let on_time_days = in_month
        .iter()
        .filter(|r| r.status == AttendanceStatus::OnTime)
        .count();
    let late_days = in_month
        .iter()
        .filter(|r| r.status == AttendanceStatus::Late)
        .count();

    let hours: Vec<f64> = in_month.iter().filter_map(|r| r.work_hours).collect();
    let average_work_hours = if hours.is_empty() {
        0.0
    } else {
        round_to(hours.iter().sum::<f64>() / hours.len() as f64, 2)
    };

    MonthlyAttendanceStats {
        period_start: start,
        period_end: end,
        total_days,
        on_time_days,
        late_days,
        absent_days: None,
        average_work_hours,
        attendance_rate: round_to(total_days as f64 / WORKING_DAYS_PER_MONTH * 100.0, 1),
    }
}
