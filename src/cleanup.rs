//! Bulk destruction of every live container.
//!
//! The live set is listed once, split in two halves and each half is
//! destroyed sequentially by its own worker. Callers must not create
//! containers while a cleanup is running.

use crate::fanout::join_workers;
use garden_client::{ClientError, Handle, LifecycleClient, Properties};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;

#[derive(Error, Debug)]
pub enum CleanupError {
    #[error("Failed to list containers")]
    List(#[source] ClientError),

    #[error("Failed to destroy container {handle}")]
    Destroy {
        handle: Handle,
        #[source]
        source: ClientError,
    },

    #[error("Cleanup worker did not finish: {0}")]
    Worker(String),
}

/// Split `items` at `len / 2`; odd lengths leave the extra item in the second half.
pub fn split_in_half<T>(mut items: Vec<T>) -> (Vec<T>, Vec<T>) {
    let second = items.split_off(items.len() / 2);
    (items, second)
}

#[derive(Clone)]
pub struct CleanupEngine {
    client: Arc<dyn LifecycleClient>,
}

impl CleanupEngine {
    pub fn new(client: Arc<dyn LifecycleClient>) -> Self {
        Self { client }
    }

    /// Destroy every container the server knows about and return how many
    /// were destroyed. Any destroy failure fails the whole cleanup once both
    /// workers have finished.
    pub async fn cleanup(&self) -> Result<usize, CleanupError> {
        let containers = self
            .client
            .containers(&Properties::new())
            .await
            .map_err(CleanupError::List)?;

        let handles: Vec<Handle> = containers.iter().map(|c| c.handle().clone()).collect();
        let count = handles.len();
        let (batch_a, batch_b) = split_in_half(handles);
        tracing::debug!(
            "Destroying {} containers ({} + {})",
            count,
            batch_a.len(),
            batch_b.len()
        );

        let mut workers = JoinSet::new();
        for batch in [batch_a, batch_b] {
            workers.spawn(destroy_all(Arc::clone(&self.client), batch));
        }
        join_workers(workers, |e| CleanupError::Worker(e.to_string())).await?;

        Ok(count)
    }
}

async fn destroy_all(
    client: Arc<dyn LifecycleClient>,
    handles: Vec<Handle>,
) -> Result<(), CleanupError> {
    for handle in handles {
        if let Err(source) = client.destroy(&handle).await {
            return Err(CleanupError::Destroy { handle, source });
        }
    }
    Ok(())
}
