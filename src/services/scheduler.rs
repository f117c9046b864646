//! Background jobs
//!
//! One slot per job name; registering a name twice is refused. Each job runs
//! on its own tokio interval and a failing run is logged and counted, never
//! propagated. Runs of the same job are not serialized against manual runs.

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::services::compliance_service::ComplianceService;
use crate::utils::metrics::JOB_RUNS;

pub const EXPIRING_DOCUMENTS_JOB: &str = "expiring-documents";
pub const STATUS_REFRESH_JOB: &str = "document-status-refresh";

#[async_trait]
pub trait ScheduledJob: Send + Sync {
    fn name(&self) -> &'static str;
    /// One-line outcome for the log
    async fn run(&self) -> Result<String>;
}

pub struct ExpiringDocumentsJob {
    compliance: ComplianceService,
    threshold_days: i64,
}

impl ExpiringDocumentsJob {
    pub fn new(compliance: ComplianceService, threshold_days: i64) -> Self {
        Self {
            compliance,
            threshold_days,
        }
    }
}

#[async_trait]
impl ScheduledJob for ExpiringDocumentsJob {
    fn name(&self) -> &'static str {
        EXPIRING_DOCUMENTS_JOB
    }

    async fn run(&self) -> Result<String> {
        let summary = self
            .compliance
            .check_and_notify_expiring_documents(self.threshold_days)
            .await?;
        Ok(format!(
            "scanned={} sent={} failed={}",
            summary.scanned, summary.sent, summary.failed
        ))
    }
}

pub struct StatusRefreshJob {
    compliance: ComplianceService,
}

impl StatusRefreshJob {
    pub fn new(compliance: ComplianceService) -> Self {
        Self { compliance }
    }
}

#[async_trait]
impl ScheduledJob for StatusRefreshJob {
    fn name(&self) -> &'static str {
        STATUS_REFRESH_JOB
    }

    async fn run(&self) -> Result<String> {
        let updated = self.compliance.refresh_expired_statuses().await?;
        Ok(format!("expired={}", updated))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInfo {
    pub name: String,
    pub interval_secs: u64,
    pub runs: u64,
    pub failures: u64,
    pub last_run_at: Option<DateTime<Utc>>,
    pub last_outcome: Option<String>,
}

struct JobSlot {
    info: Arc<Mutex<JobInfo>>,
    handle: JoinHandle<()>,
}

#[derive(Default)]
pub struct Scheduler {
    slots: Mutex<HashMap<String, JobSlot>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `job` every `every`, first run after one full period
    pub fn schedule(&self, job: Arc<dyn ScheduledJob>, every: Duration) -> Result<()> {
        let name = job.name().to_string();
        if every.is_zero() {
            bail!("job '{}' needs a non-zero interval", name);
        }
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| anyhow::anyhow!("scheduler lock poisoned"))?;
        if slots.contains_key(&name) {
            bail!("job '{}' is already scheduled", name);
        }

        let info = Arc::new(Mutex::new(JobInfo {
            name: name.clone(),
            interval_secs: every.as_secs(),
            runs: 0,
            failures: 0,
            last_run_at: None,
            last_outcome: None,
        }));

        let task_info = info.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // the first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                execute(job.as_ref(), &task_info).await;
            }
        });

        info!("⏰ Scheduled job '{}' every {}s", name, every.as_secs());
        slots.insert(name, JobSlot { info, handle });
        Ok(())
    }

    pub fn jobs(&self) -> Vec<JobInfo> {
        let Ok(slots) = self.slots.lock() else {
            return Vec::new();
        };
        let mut jobs: Vec<JobInfo> = slots
            .values()
            .filter_map(|slot| slot.info.lock().ok().map(|info| info.clone()))
            .collect();
        jobs.sort_by(|a, b| a.name.cmp(&b.name));
        jobs
    }

    pub fn is_scheduled(&self, name: &str) -> bool {
        self.slots.lock().map(|s| s.contains_key(name)).unwrap_or(false)
    }

    pub fn stop(&self, name: &str) -> bool {
        let Ok(mut slots) = self.slots.lock() else {
            return false;
        };
        match slots.remove(name) {
            Some(slot) => {
                slot.handle.abort();
                info!("🛑 Stopped job '{}'", name);
                true
            }
            None => false,
        }
    }

    pub fn stop_all(&self) {
        let Ok(mut slots) = self.slots.lock() else {
            return;
        };
        for (name, slot) in slots.drain() {
            slot.handle.abort();
            info!("🛑 Stopped job '{}'", name);
        }
    }
}

async fn execute(job: &dyn ScheduledJob, info: &Mutex<JobInfo>) {
    let started = Utc::now();
    let outcome = job.run().await;

    let label = match &outcome {
        Ok(summary) => {
            info!("✅ Job '{}' finished: {}", job.name(), summary);
            JOB_RUNS.with_label_values(&[job.name(), "success"]).inc();
            summary.clone()
        }
        Err(e) => {
            error!("❌ Job '{}' failed: {:#}", job.name(), e);
            JOB_RUNS.with_label_values(&[job.name(), "failure"]).inc();
            format!("error: {}", e)
        }
    };

    match info.lock() {
        Ok(mut info) => {
            info.runs += 1;
            if outcome.is_err() {
                info.failures += 1;
            }
            info.last_run_at = Some(started);
            info.last_outcome = Some(label);
        }
        Err(_) => warn!("⚠️ Could not record run of '{}'", job.name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingJob {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl ScheduledJob for CountingJob {
        fn name(&self) -> &'static str {
            "counting"
        }
        async fn run(&self) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                bail!("boom");
            }
            Ok("ok".into())
        }
    }

    #[tokio::test]
    async fn test_duplicate_name_is_refused() {
        let scheduler = Scheduler::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let job = Arc::new(CountingJob {
            calls: calls.clone(),
            fail: false,
        });
        scheduler.schedule(job.clone(), Duration::from_secs(3600)).unwrap();
        assert!(scheduler.schedule(job, Duration::from_secs(60)).is_err());
        assert_eq!(scheduler.jobs().len(), 1);
        scheduler.stop_all();
        assert!(!scheduler.is_scheduled("counting"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_job_keeps_running() {
        let scheduler = Scheduler::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let job = Arc::new(CountingJob {
            calls: calls.clone(),
            fail: true,
        });
        scheduler.schedule(job, Duration::from_secs(10)).unwrap();

        tokio::time::sleep(Duration::from_secs(35)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        let info = &scheduler.jobs()[0];
        assert_eq!(info.failures, 3);
        assert!(info.last_outcome.as_deref().unwrap_or_default().contains("boom"));
        scheduler.stop("counting");
    }
}
