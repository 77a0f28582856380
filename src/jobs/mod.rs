use std::sync::Arc;
use std::time::Instant;
use tokio::time::{interval, Duration};
use tracing::{error, info};

use crate::metrics;

pub mod tasks;

/// Job scheduler for background tasks
pub struct JobScheduler {
    context: Arc<crate::context::AppContext>,
}

impl JobScheduler {
    pub fn new(context: Arc<crate::context::AppContext>) -> Self {
        Self { context }
    }

    /// Start all background jobs
    pub fn start(self: Arc<Self>) {
        info!("Starting background job scheduler");

        if self.context.config.jobs.orphan_sweep_interval > 0 {
            tokio::spawn(Self::orphan_sweep_job(Arc::clone(&self)));
        } else {
            info!("Orphan blob sweep disabled");
        }

        tokio::spawn(Self::health_check_job(Arc::clone(&self)));

        info!("Background jobs started");
    }

    /// Remove orphan blobs (interval from config)
    async fn orphan_sweep_job(scheduler: Arc<Self>) {
        let jobs = &scheduler.context.config.jobs;
        let grace_period = Duration::from_secs(jobs.orphan_grace_period);
        let mut interval = interval(Duration::from_secs(jobs.orphan_sweep_interval));

        loop {
            interval.tick().await;
            info!("Running orphan blob sweep");
            let start = Instant::now();

            match tasks::sweep_orphan_blobs(&scheduler.context, grace_period).await {
                Ok(count) => {
                    metrics::record_orphans_removed(count);
                    metrics::record_background_job(
                        "orphan_sweep",
                        "success",
                        start.elapsed().as_secs_f64(),
                    );
                    if count > 0 {
                        info!("Removed {} orphan blobs", count);
                    } else {
                        info!("Orphan sweep: no orphan blobs found");
                    }
                }
                Err(e) => {
                    metrics::record_background_job(
                        "orphan_sweep",
                        "failure",
                        start.elapsed().as_secs_f64(),
                    );
                    error!("Failed to sweep orphan blobs: {}", e);
                }
            }
        }
    }

    /// Health check job (runs every 5 minutes)
    async fn health_check_job(scheduler: Arc<Self>) {
        let mut interval = interval(Duration::from_secs(300));

        loop {
            interval.tick().await;

            match tasks::health_check(&scheduler.context).await {
                Ok(_) => {
                    // Silent success - health is good
                }
                Err(e) => error!("Health check failed: {}", e),
            }
        }
    }
}
