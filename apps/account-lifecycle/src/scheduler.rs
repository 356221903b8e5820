use domain_accounts::{AccountService, UserRepository};
use eyre::{Result, WrapErr};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

/// Cron job running one stale account sweep per tick
pub fn cleanup_job<R>(service: AccountService<R>, cron_expr: &str) -> Result<Job>
where
    R: UserRepository + 'static,
{
    Job::new_async(cron_expr, move |_uuid, _l| {
        let service = service.clone();

        Box::pin(async move {
            info!("Running scheduled removal of not activated users");

            match service.remove_not_activated_users().await {
                Ok(removed) => info!(removed, "Scheduled cleanup complete"),
                Err(e) => error!(error = %e, "Scheduled cleanup failed"),
            }
        })
    })
    .wrap_err_with(|| format!("invalid cron expression '{cron_expr}'"))
}

/// Run the sweep on `cron_expr` until Ctrl-C
pub async fn run_scheduled<R>(service: AccountService<R>, cron_expr: &str) -> Result<()>
where
    R: UserRepository + 'static,
{
    let job = cleanup_job(service, cron_expr)?;

    let mut sched = JobScheduler::new().await?;
    sched.add(job).await?;
    sched.start().await?;

    info!(cron = cron_expr, "Scheduler started, waiting for jobs");
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received, stopping scheduler");
    sched.shutdown().await?;
    Ok(())
}
