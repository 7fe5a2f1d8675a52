//! Per-user report rows built from a running accumulator per user.

use super::productivity::{score_and_grade, Grade};
use super::{percentage, round_to, WORKING_DAYS_PER_MONTH};
use crate::domain::models::{Attendance, AttendanceStatus, Task, TaskStatus, User};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct AttendanceAccumulator {
    pub total_days: usize,
    pub on_time: usize,
    pub late: usize,
    pub total_hours: f64,
}

impl AttendanceAccumulator {
    pub fn push(&mut self, row: &Attendance) {
        self.total_days += 1;
        match row.status {
            AttendanceStatus::OnTime => self.on_time += 1,
            AttendanceStatus::Late => self.late += 1,
            AttendanceStatus::Absent | AttendanceStatus::Leave => {}
        }
        self.total_hours += row.work_hours.unwrap_or(0.0);
    }

    pub fn avg_hours(&self) -> f64 {
        if self.total_days == 0 {
            0.0
        } else {
            round_to(self.total_hours / self.total_days as f64, 2)
        }
    }

    pub fn on_time_rate(&self) -> f64 {
        round_to(percentage(self.on_time, self.total_days), 1)
    }
}

#[derive(Debug, Clone, Default)]
struct TaskAccumulator {
    total: usize,
    completed: usize,
    in_progress: usize,
    pending: usize,
    overdue: usize,
}

impl TaskAccumulator {
    fn push(&mut self, task: &Task) {
        self.total += 1;
        match task.status {
            TaskStatus::Completed => self.completed += 1,
            TaskStatus::InProgress => self.in_progress += 1,
            TaskStatus::Pending => self.pending += 1,
            TaskStatus::Overdue => self.overdue += 1,
        }
    }

    fn completion_rate(&self) -> f64 {
        round_to(percentage(self.completed, self.total), 1)
    }
}

/// Groups rows by user id. Every user in `users` gets an entry, even without
/// rows; rows for users outside the scope are dropped.
pub fn accumulate_attendance(
    users: &[User],
    rows: &[Attendance],
) -> HashMap<Uuid, AttendanceAccumulator> {
    let mut groups: HashMap<Uuid, AttendanceAccumulator> = users
        .iter()
        .map(|u| (u.id, AttendanceAccumulator::default()))
        .collect();
    for row in rows {
        if let Some(acc) = groups.get_mut(&row.user_id) {
            acc.push(row);
        }
    }
    groups
}

fn accumulate_tasks(users: &[User], tasks: &[Task]) -> HashMap<Uuid, TaskAccumulator> {
    let mut groups: HashMap<Uuid, TaskAccumulator> = users
        .iter()
        .map(|u| (u.id, TaskAccumulator::default()))
        .collect();
    for task in tasks {
        if let Some(acc) = groups.get_mut(&task.user_id) {
            acc.push(task);
        }
    }
    groups
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AttendanceSummaryRow {
    pub user_id: Uuid,
    pub user_name: String,
    pub total_days: usize,
    pub on_time: usize,
    pub late: usize,
    pub total_hours: f64,
    pub avg_hours: f64,
    pub on_time_rate: f64,
}

pub fn attendance_summary(users: &[User], rows: &[Attendance]) -> Vec<AttendanceSummaryRow> {
    let groups = accumulate_attendance(users, rows);
    users
        .iter()
        .map(|user| {
            let acc = groups.get(&user.id).cloned().unwrap_or_default();
            AttendanceSummaryRow {
                user_id: user.id,
                user_name: user.name.clone(),
                total_days: acc.total_days,
                on_time: acc.on_time,
                late: acc.late,
                total_hours: round_to(acc.total_hours, 2),
                avg_hours: acc.avg_hours(),
                on_time_rate: acc.on_time_rate(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TaskSummaryRow {
    pub user_id: Uuid,
    pub user_name: String,
    pub total_tasks: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub pending: usize,
    pub overdue: usize,
    pub completion_rate: f64,
}

pub fn task_summary(users: &[User], tasks: &[Task]) -> Vec<TaskSummaryRow> {
    let groups = accumulate_tasks(users, tasks);
    users
        .iter()
        .map(|user| {
            let acc = groups.get(&user.id).cloned().unwrap_or_default();
            TaskSummaryRow {
                user_id: user.id,
                user_name: user.name.clone(),
                total_tasks: acc.total,
                completed: acc.completed,
                in_progress: acc.in_progress,
                pending: acc.pending,
                overdue: acc.overdue,
                completion_rate: acc.completion_rate(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProductivityRow {
    pub user_id: Uuid,
    pub user_name: String,
    pub attendance_days: usize,
    pub on_time_days: usize,
    pub late_days: usize,
    pub avg_work_hours: f64,
    pub attendance_rate: f64,
    pub on_time_rate: f64,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub task_completion_rate: f64,
    pub productivity_score: f64,
    pub grade: Grade,
}

pub fn productivity_report(
    users: &[User],
    rows: &[Attendance],
    tasks: &[Task],
) -> Vec<ProductivityRow> {
    let attendance = accumulate_attendance(users, rows);
    let work = accumulate_tasks(users, tasks);

    users
        .iter()
        .map(|user| {
            let att = attendance.get(&user.id).cloned().unwrap_or_default();
            let tk = work.get(&user.id).cloned().unwrap_or_default();
            let attendance_rate =
                round_to(att.total_days as f64 / WORKING_DAYS_PER_MONTH * 100.0, 1);
            let on_time_rate = att.on_time_rate();
            let completion_rate = tk.completion_rate();
            let (score, grade) = score_and_grade(attendance_rate, completion_rate, on_time_rate);

            ProductivityRow {
                user_id: user.id,
                user_name: user.name.clone(),
                attendance_days: att.total_days,
                on_time_days: att.on_time,
                late_days: att.late,
                avg_work_hours: att.avg_hours(),
                attendance_rate,
                on_time_rate,
                total_tasks: tk.total,
                completed_tasks: tk.completed,
                task_completion_rate: completion_rate,
                productivity_score: score,
                grade,
            }
        })
        .collect()
}
