//! Client interface for a Garden container-management server.
//!
//! The performance suite only needs three lifecycle operations from the
//! remote service: create a container, destroy it by handle and list what
//! is currently alive. [`LifecycleClient`] captures exactly that surface so
//! the orchestration code can run against the real [`HttpGardenClient`] or
//! against an in-memory fake in tests.

pub mod error;
pub mod http;
pub mod types;

pub use error::ClientError;
pub use http::HttpGardenClient;
pub use types::{Container, ContainerSpec, DiskLimitScope, DiskLimits, Handle, Limits, Properties};

/// Lifecycle operations consumed from the remote service.
#[async_trait::async_trait]
pub trait LifecycleClient: Send + Sync {
    /// Create a container from `spec` and return its handle.
    async fn create(&self, spec: &ContainerSpec) -> Result<Handle, ClientError>;

    /// Destroy the container identified by `handle`.
    async fn destroy(&self, handle: &Handle) -> Result<(), ClientError>;

    /// List containers matching `filter`. An empty filter matches everything.
    async fn containers(&self, filter: &Properties) -> Result<Vec<Container>, ClientError>;
}
