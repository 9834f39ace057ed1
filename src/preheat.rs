//! Server preheating.
//!
//! Simulates a long-running Garden by pushing it through many create and
//! destroy cycles before anything is measured. Each iteration creates a
//! fixed-size batch of containers from a fixed number of concurrent
//! workers, joins them, then sweeps everything away with the
//! [`CleanupEngine`], so the live container count never grows past one
//! batch.

use crate::cleanup::{CleanupEngine, CleanupError};
use crate::fanout::join_workers;
use garden_client::{ClientError, ContainerSpec, DiskLimitScope, LifecycleClient};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::task::JoinSet;

pub const DEFAULT_BATCH_SIZE: u64 = 10;
pub const DEFAULT_NUM_WORKERS: u64 = 5;
/// Hard disk quota of every preheat container (1 MiB).
pub const PREHEAT_DISK_LIMIT_BYTES: u64 = 1024 * 1024;

#[derive(Error, Debug)]
pub enum PreheatError {
    #[error("Invalid preheat plan: {0}")]
    InvalidPlan(String),

    #[error("Failed to create container")]
    Create(#[source] ClientError),

    #[error("Failed to clean up after batch")]
    Cleanup(#[from] CleanupError),

    #[error("Preheat worker did not finish: {0}")]
    Worker(String),
}

/// Batch size and fan-out of each preheat iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreheatPlan {
    batch_size: u64,
    num_workers: u64,
}

impl PreheatPlan {
    /// The batch must split evenly across the workers.
    pub fn new(batch_size: u64, num_workers: u64) -> Result<Self, PreheatError> {
        if batch_size == 0 || num_workers == 0 {
            return Err(PreheatError::InvalidPlan(format!(
                "batch size ({batch_size}) and worker count ({num_workers}) must be positive"
            )));
        }
        if batch_size % num_workers != 0 {
            return Err(PreheatError::InvalidPlan(format!(
                "batch size {batch_size} is not divisible by {num_workers} workers"
            )));
        }
        Ok(Self {
            batch_size,
            num_workers,
        })
    }

    pub fn batch_size(&self) -> u64 {
        self.batch_size
    }

    pub fn num_workers(&self) -> u64 {
        self.num_workers
    }

    pub fn per_worker(&self) -> u64 {
        self.batch_size / self.num_workers
    }
}

impl Default for PreheatPlan {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            num_workers: DEFAULT_NUM_WORKERS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreheatReport {
    pub batches: u64,
    /// Containers created and destroyed; may overshoot the target by less than one batch.
    pub containers_created: u64,
    pub elapsed: Duration,
}

pub struct Preheater {
    client: Arc<dyn LifecycleClient>,
    cleanup: CleanupEngine,
    plan: PreheatPlan,
}

impl Preheater {
    pub fn new(client: Arc<dyn LifecycleClient>, plan: PreheatPlan) -> Self {
        let cleanup = CleanupEngine::new(Arc::clone(&client));
        Self {
            client,
            cleanup,
            plan,
        }
    }

    /// Run create/destroy batches until at least `total` containers went through.
    pub async fn preheat(&self, total: u64) -> Result<PreheatReport, PreheatError> {
        let started = Instant::now();
        let mut count = 0u64;
        let mut batches = 0u64;

        tracing::info!("Preheating the server (this will take a while)");

        while count < total {
            self.run_batch().await?;
            self.cleanup.cleanup().await?;

            count += self.plan.batch_size;
            batches += 1;
            tracing::info!("Batch complete - {}/{}", count, total);
        }

        let elapsed = started.elapsed();
        tracing::info!("Preheating complete - took {:?}", elapsed);

        Ok(PreheatReport {
            batches,
            containers_created: count,
            elapsed,
        })
    }

    /// Create one batch across all workers; returns each worker's create count.
    pub(crate) async fn run_batch(&self) -> Result<Vec<u64>, PreheatError> {
        let spec =
            ContainerSpec::with_disk_limit(PREHEAT_DISK_LIMIT_BYTES, DiskLimitScope::Exclusive);

        let mut workers = JoinSet::new();
        for _ in 0..self.plan.num_workers {
            let client = Arc::clone(&self.client);
            let spec = spec.clone();
            let per_worker = self.plan.per_worker();
            workers.spawn(async move {
                for _ in 0..per_worker {
                    client.create(&spec).await.map_err(PreheatError::Create)?;
                }
                Ok::<_, PreheatError>(per_worker)
            });
        }

        join_workers(workers, |e| PreheatError::Worker(e.to_string())).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeGarden;

    #[test]
    fn test_plan_requires_even_split() {
        assert!(PreheatPlan::new(10, 5).is_ok());
        assert!(matches!(
            PreheatPlan::new(10, 3),
            Err(PreheatError::InvalidPlan(_))
        ));
        assert!(PreheatPlan::new(10, 0).is_err());
        assert!(PreheatPlan::new(0, 5).is_err());
    }

    #[test]
    fn test_default_plan() {
        let plan = PreheatPlan::default();
        assert_eq!(plan.batch_size(), 10);
        assert_eq!(plan.num_workers(), 5);
        assert_eq!(plan.per_worker(), 2);
    }

    #[tokio::test]
    async fn test_single_iteration() {
        let garden = Arc::new(FakeGarden::new());
        let preheater = Preheater::new(garden.clone(), PreheatPlan::new(10, 5).unwrap());

        let report = preheater.preheat(10).await.unwrap();

        assert_eq!(report.batches, 1);
        assert!(report.containers_created >= 10);
        assert_eq!(garden.create_calls(), 10);
        assert_eq!(garden.destroy_calls(), 10);
        assert_eq!(garden.list_calls(), 1);
        assert_eq!(garden.live_count(), 0);
    }

    #[tokio::test]
    async fn test_each_worker_creates_its_share() {
        let garden = Arc::new(FakeGarden::new());
        let preheater = Preheater::new(garden.clone(), PreheatPlan::new(10, 5).unwrap());

        let per_worker = preheater.run_batch().await.unwrap();

        assert_eq!(per_worker, vec![2; 5]);
        assert_eq!(garden.live_count(), 10);
    }

    #[tokio::test]
    async fn test_last_batch_overshoots() {
        let garden = Arc::new(FakeGarden::new());
        let preheater = Preheater::new(garden.clone(), PreheatPlan::default());

        let report = preheater.preheat(25).await.unwrap();

        assert_eq!(report.batches, 3);
        assert_eq!(report.containers_created, 30);
        assert_eq!(garden.create_calls(), 30);
        assert_eq!(garden.live_count(), 0);
    }

    #[tokio::test]
    async fn test_zero_total_does_nothing() {
        let garden = Arc::new(FakeGarden::new());
        let report = Preheater::new(garden.clone(), PreheatPlan::default())
            .preheat(0)
            .await
            .unwrap();

        assert_eq!(report.batches, 0);
        assert_eq!(garden.create_calls(), 0);
        assert_eq!(garden.list_calls(), 0);
    }

    #[tokio::test]
    async fn test_cleanup_never_overlaps_creates() {
        let garden = Arc::new(FakeGarden::new());
        Preheater::new(garden.clone(), PreheatPlan::default())
            .preheat(50)
            .await
            .unwrap();

        assert_eq!(garden.list_calls(), 5);
        assert_eq!(garden.lists_during_create(), 0);
    }

    #[tokio::test]
    async fn test_create_failure_aborts() {
        let garden = Arc::new(FakeGarden::new());
        garden.fail_create_from(14);
        let preheater = Preheater::new(garden.clone(), PreheatPlan::default());

        let err = preheater.preheat(100).await.unwrap_err();

        assert!(matches!(err, PreheatError::Create(_)));
        assert_eq!(
            format!("{:#}", anyhow::Error::new(err)),
            "Failed to create container: Garden operation failed: insufficient disk"
        );
        // the failing batch is not cleaned up and no further batch starts
        assert_eq!(garden.list_calls(), 1);
        assert!(garden.create_calls() <= 20);
    }

    #[tokio::test]
    async fn test_containers_use_exclusive_disk_limit() {
        let garden = Arc::new(FakeGarden::new());
        Preheater::new(garden.clone(), PreheatPlan::default())
            .preheat(10)
            .await
            .unwrap();

        let specs = garden.created_specs();
        assert_eq!(specs.len(), 10);
        assert!(specs.iter().all(|s| {
            s.limits.disk.byte_hard == PREHEAT_DISK_LIMIT_BYTES
                && s.limits.disk.scope == DiskLimitScope::Exclusive
        }));
    }
}
