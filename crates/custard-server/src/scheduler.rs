//! Background job scheduler.
//!
//! Keeps the flavor cache warm by scraping once a day ahead of the first
//! visitor.

use std::sync::Arc;

use custard_core::shop_today;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::cache::FlavorCache;

/// Builds and starts the background job scheduler.
///
/// The returned [`JobScheduler`] must be kept alive for the lifetime of the
/// process; dropping it stops the refresh job.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if `cron` is not a valid schedule or the
/// scheduler fails to start.
pub async fn build_scheduler(
    cache: Arc<FlavorCache>,
    cron: &str,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    register_refresh_job(&scheduler, cache, cron).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the daily cache refresh. The schedule is evaluated in UTC.
async fn register_refresh_job(
    scheduler: &JobScheduler,
    cache: Arc<FlavorCache>,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let cache = Arc::clone(&cache);

        Box::pin(async move {
            let today = shop_today();
            tracing::info!(%today, "scheduler: starting flavor refresh");
            let records = cache.refresh(today).await;
            tracing::info!(count = records.len(), "scheduler: flavor refresh complete");
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %cron, "scheduler: registered flavor refresh job");
    Ok(())
}
