//! Background jobs run by the cron scheduler.

use crate::state::SharedState;
use chrono::Utc;
use tokio_cron_scheduler::{Job, JobScheduler};

/// Moves open tasks whose deadline has passed to overdue.
pub async fn sweep_overdue_tasks(state: &SharedState) -> anyhow::Result<u64> {
    let changed = state.store.mark_overdue_tasks(Utc::now()).await?;
    if changed > 0 {
        tracing::info!("Marked {} tasks overdue", changed);
    }
    Ok(changed)
}

pub async fn start_scheduler(state: SharedState, overdue_cron: &str) -> anyhow::Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let shared_for_sweep = state.clone();
    scheduler
        .add(Job::new_async(overdue_cron, move |_uuid, _l| {
            let state = shared_for_sweep.clone();
            Box::pin(async move {
                if let Err(e) = sweep_overdue_tasks(&state).await {
                    tracing::error!("Overdue sweep failed: {}", e);
                }
                state.face_limiter.cleanup().await;
            })
        })?)
        .await?;

    scheduler.start().await?;
    tracing::info!("Scheduler started: overdue sweep at '{}'", overdue_cron);
    Ok(scheduler)
}
