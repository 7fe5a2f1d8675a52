//! Dashboard aggregates over a rolling window of recent days.

use super::productivity::productivity_score;
use super::{percentage, round_to};
use crate::domain::models::{Attendance, AttendanceStatus, AttendanceWithUser, Task, User};
use crate::time_utils::{weekday_label, CivilZone};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

pub const RECENT_ACTIVITY_LIMIT: usize = 10;
const WINDOW_DAYS: i64 = 7;
const TREND_WEEKS: i64 = 4;
/// Expected attendance days per employee per trend week.
const WORKDAYS_PER_WEEK: usize = 5;

/// First day of the seven-day window ending on `today`.
pub fn window_start(today: NaiveDate) -> NaiveDate {
    today - Duration::days(WINDOW_DAYS - 1)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OverviewStats {
    pub total_employees: i64,
    pub present_today: usize,
    pub on_time_today: usize,
    pub late_today: usize,
    pub average_work_hours: f64,
    pub productivity_rate: f64,
}

/// `rows` should cover at least the seven days ending on `today`; older rows
/// are ignored.
pub fn overview(
    total_employees: i64,
    today: NaiveDate,
    rows: &[Attendance],
    tasks: &[Task],
) -> OverviewStats {
    let todays: Vec<&Attendance> = rows.iter().filter(|r| r.date == today).collect();
    let start = window_start(today);
    let hours: Vec<f64> = rows
        .iter()
        .filter(|r| r.date >= start && r.date <= today)
        .filter_map(|r| r.work_hours)
        .collect();
    let average_work_hours = if hours.is_empty() {
        0.0
    } else {
        round_to(hours.iter().sum::<f64>() / hours.len() as f64, 1)
    };
    let completed = tasks.iter().filter(|t| t.completed).count();

    OverviewStats {
        total_employees,
        present_today: todays.len(),
        on_time_today: todays
            .iter()
            .filter(|r| r.status == AttendanceStatus::OnTime)
            .count(),
        late_today: todays
            .iter()
            .filter(|r| r.status == AttendanceStatus::Late)
            .count(),
        average_work_hours,
        productivity_rate: round_to(percentage(completed, tasks.len()), 1),
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DailyAttendance {
    pub date: NaiveDate,
    pub day: &'static str,
    pub present: usize,
    pub on_time: usize,
    pub late: usize,
}

/// One entry per day of the week ending on `today`, oldest first. Days
/// without rows are present with zero counts.
pub fn weekly_attendance(today: NaiveDate, rows: &[Attendance]) -> Vec<DailyAttendance> {
    let start = window_start(today);
    (0..WINDOW_DAYS)
        .map(|offset| {
            let date = start + Duration::days(offset);
            let mut day = DailyAttendance {
                date,
                day: weekday_label(date),
                present: 0,
                on_time: 0,
                late: 0,
            };
            for row in rows.iter().filter(|r| r.date == date) {
                day.present += 1;
                match row.status {
                    AttendanceStatus::OnTime => day.on_time += 1,
                    AttendanceStatus::Late => day.late += 1,
                    AttendanceStatus::Absent | AttendanceStatus::Leave => {}
                }
            }
            day
        })
        .collect()
}

/// Dashboard-only classification of a task by how long ago it was created.
/// Independent of the task's assigned status.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AgeBucket {
    Completed,
    InProgress,
    Pending,
    Overdue,
}

pub fn age_bucket(task: &Task, now: DateTime<Utc>) -> AgeBucket {
    if task.completed {
        return AgeBucket::Completed;
    }
    let age = now - task.created_at;
    if age < Duration::days(3) {
        AgeBucket::InProgress
    } else if age <= Duration::days(7) {
        AgeBucket::Pending
    } else {
        AgeBucket::Overdue
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct TaskDistribution {
    pub completed: usize,
    pub in_progress: usize,
    pub pending: usize,
    pub overdue: usize,
}

impl TaskDistribution {
    pub fn is_empty(&self) -> bool {
        self.completed + self.in_progress + self.pending + self.overdue == 0
    }
}

pub fn task_distribution(tasks: &[Task], now: DateTime<Utc>) -> TaskDistribution {
    let mut dist = TaskDistribution::default();
    for task in tasks {
        match age_bucket(task, now) {
            AgeBucket::Completed => dist.completed += 1,
            AgeBucket::InProgress => dist.in_progress += 1,
            AgeBucket::Pending => dist.pending += 1,
            AgeBucket::Overdue => dist.overdue += 1,
        }
    }
    dist
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    CheckIn,
    CheckOut,
    TaskCompleted,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Activity {
    pub kind: ActivityKind,
    pub user_name: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    /// Civil wall-clock rendering of `timestamp`.
    pub time: String,
}

/// Check-ins, check-outs and task completions since `since`, newest first,
/// truncated to `limit` entries.
pub fn recent_activity(
    zone: &CivilZone,
    since: DateTime<Utc>,
    rows: &[AttendanceWithUser],
    tasks: &[Task],
    users: &[User],
    limit: usize,
) -> Vec<Activity> {
    let names: HashMap<Uuid, &str> = users.iter().map(|u| (u.id, u.name.as_str())).collect();
    let mut feed = Vec::new();

    let mut push = |kind, user_name: &str, description: String, at: DateTime<Utc>| {
        if at >= since {
            feed.push(Activity {
                kind,
                user_name: user_name.to_string(),
                description,
                timestamp: at,
                time: zone.format_datetime(at),
            });
        }
    };

    for row in rows {
        let att = &row.attendance;
        let label = match att.status {
            AttendanceStatus::Late => "checked in late",
            _ => "checked in",
        };
        push(
            ActivityKind::CheckIn,
            &row.user_name,
            label.to_string(),
            att.check_in_time,
        );
        if let Some(out) = att.check_out_time {
            push(
                ActivityKind::CheckOut,
                &row.user_name,
                "checked out".to_string(),
                out,
            );
        }
    }

    for task in tasks {
        if let Some(done_at) = task.completed_at {
            let user_name = names.get(&task.user_id).copied().unwrap_or("Unknown");
            push(
                ActivityKind::TaskCompleted,
                user_name,
                format!("completed task \"{}\"", task.title),
                done_at,
            );
        }
    }

    feed.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    feed.truncate(limit);
    feed
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TrendPoint {
    pub week: String,
    pub score: f64,
}

/// Cohort productivity over four consecutive seven-day windows ending on
/// `today`, labelled `Week 1` (oldest) to `Week 4`.
pub fn productivity_trend(
    zone: &CivilZone,
    today: NaiveDate,
    employees: i64,
    rows: &[Attendance],
    tasks: &[Task],
) -> Vec<TrendPoint> {
    let expected = usize::try_from(employees).unwrap_or(0) * WORKDAYS_PER_WEEK;

    (0..TREND_WEEKS)
        .map(|index| {
            let end = today - Duration::days((TREND_WEEKS - 1 - index) * WINDOW_DAYS);
            let start = window_start(end);

            let week_rows: Vec<&Attendance> = rows
                .iter()
                .filter(|r| r.date >= start && r.date <= end)
                .collect();
            let on_time = week_rows
                .iter()
                .filter(|r| r.status == AttendanceStatus::OnTime)
                .count();

            let week_tasks: Vec<&Task> = tasks
                .iter()
                .filter(|t| {
                    let created = zone.today(t.created_at);
                    created >= start && created <= end
                })
                .collect();
            let completed = week_tasks.iter().filter(|t| t.completed).count();

            let score = productivity_score(
                percentage(week_rows.len(), expected),
                percentage(completed, week_tasks.len()),
                percentage(on_time, week_rows.len()),
            );
            TrendPoint {
                week: format!("Week {}", index + 1),
                score,
            }
        })
        .collect()
}
