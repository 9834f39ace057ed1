//! Container spec and handle types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Opaque identifier of a remote container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(String);

impl Handle {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Handle {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Property filter used when listing containers.
pub type Properties = BTreeMap<String, String>;

/// A live container as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    handle: Handle,
}

impl Container {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }
}

/// Whether a disk quota covers the whole container or only its own layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(into = "u8")]
pub enum DiskLimitScope {
    #[default]
    Total,
    Exclusive,
}

impl From<DiskLimitScope> for u8 {
    fn from(scope: DiskLimitScope) -> Self {
        match scope {
            DiskLimitScope::Total => 0,
            DiskLimitScope::Exclusive => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DiskLimits {
    #[serde(skip_serializing_if = "is_zero")]
    pub byte_hard: u64,
    pub scope: DiskLimitScope,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Limits {
    pub disk: DiskLimits,
}

/// Specification for a new container.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ContainerSpec {
    pub limits: Limits,
}

impl ContainerSpec {
    /// Spec with only a hard disk quota set.
    pub fn with_disk_limit(byte_hard: u64, scope: DiskLimitScope) -> Self {
        Self {
            limits: Limits {
                disk: DiskLimits { byte_hard, scope },
            },
        }
    }
}

fn is_zero(v: &u64) -> bool {
    *v == 0
}
