//! Placeholder dashboard data for empty installations.
//!
//! When enabled, series that come back all-zero or empty are replaced with a
//! fixed demo set so a fresh deployment renders something. Disabled, every
//! value passes through untouched.

use super::dashboard::{Activity, ActivityKind, DailyAttendance, TaskDistribution};
use crate::time_utils::CivilZone;
use chrono::{DateTime, Duration, Utc};

const DEMO_DISTRIBUTION: TaskDistribution = TaskDistribution {
    completed: 12,
    in_progress: 8,
    pending: 5,
    overdue: 2,
};

/// (present, on_time, late) for each day of the demo week, oldest first.
const DEMO_WEEK: [(usize, usize, usize); 7] = [
    (18, 15, 3),
    (20, 17, 3),
    (19, 16, 3),
    (21, 19, 2),
    (17, 14, 3),
    (6, 5, 1),
    (4, 4, 0),
];

/// (kind, user, description, minutes ago)
const DEMO_ACTIVITY: [(ActivityKind, &str, &str, i64); 4] = [
    (ActivityKind::CheckIn, "Siti Rahayu", "checked in", 15),
    (ActivityKind::TaskCompleted, "Budi Santoso", "completed task \"Monthly report\"", 45),
    (ActivityKind::CheckIn, "Dewi Lestari", "checked in late", 90),
    (ActivityKind::CheckOut, "Ahmad Fauzi", "checked out", 180),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct DemoFallback {
    enabled: bool,
}

impl DemoFallback {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn task_distribution(&self, real: TaskDistribution) -> TaskDistribution {
        if self.enabled && real.is_empty() {
            DEMO_DISTRIBUTION
        } else {
            real
        }
    }

    /// Keeps the real dates and labels; only the counts are substituted.
    pub fn weekly_attendance(&self, real: Vec<DailyAttendance>) -> Vec<DailyAttendance> {
        if !self.enabled || real.iter().any(|d| d.present > 0) {
            return real;
        }
        real.into_iter()
            .zip(DEMO_WEEK)
            .map(|(day, (present, on_time, late))| DailyAttendance {
                present,
                on_time,
                late,
                ..day
            })
            .collect()
    }

    pub fn recent_activity(
        &self,
        zone: &CivilZone,
        now: DateTime<Utc>,
        real: Vec<Activity>,
    ) -> Vec<Activity> {
        if !self.enabled || !real.is_empty() {
            return real;
        }
        DEMO_ACTIVITY
            .iter()
            .map(|(kind, user, description, minutes)| {
                let at = now - Duration::minutes(*minutes);
                Activity {
                    kind: *kind,
                    user_name: user.to_string(),
                    description: description.to_string(),
                    timestamp: at,
                    time: zone.format_datetime(at),
                }
            })
            .collect()
    }
}
