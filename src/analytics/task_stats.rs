use super::{percentage, round_to};
use crate::domain::models::{Task, TaskStatus};
use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct TaskStats {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub overdue: usize,
    /// High or urgent tasks that are still open.
    pub high_priority: usize,
    pub completion_rate: f64,
}

pub fn task_stats(tasks: &[Task]) -> TaskStats {
    let mut stats = TaskStats {
        total: tasks.len(),
        ..TaskStats::default()
    };

    for task in tasks {
        match task.status {
            TaskStatus::Pending => stats.pending += 1,
            TaskStatus::InProgress => stats.in_progress += 1,
            TaskStatus::Completed => stats.completed += 1,
            TaskStatus::Overdue => stats.overdue += 1,
        }
        if task.priority.is_high() && task.status != TaskStatus::Completed {
            stats.high_priority += 1;
        }
    }

    stats.completion_rate = round_to(percentage(stats.completed, stats.total), 1);
    stats
}
