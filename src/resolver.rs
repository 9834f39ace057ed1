//! Garden endpoint resolution.
//!
//! Name lookups for the Garden host have been seen to come back empty
//! instead of failing outright, so the address is looked up once at suite
//! start and retried until it resolves or a deadline passes. Every later
//! connection uses the resolved IP.

use crate::config::ResolverSettings;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Could not resolve {host} within {waited:?}: {last_error}")]
    Timeout {
        host: String,
        waited: Duration,
        last_error: String,
    },
}

/// DNS lookup seam.
#[async_trait::async_trait]
pub trait HostLookup: Send + Sync {
    async fn lookup(&self, host: &str) -> io::Result<Vec<IpAddr>>;
}

/// Lookup through the system resolver.
pub struct SystemLookup;

#[async_trait::async_trait]
impl HostLookup for SystemLookup {
    async fn lookup(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        let addrs = tokio::net::lookup_host((host, 0)).await?;
        Ok(addrs.map(|addr| addr.ip()).collect())
    }
}

pub struct Resolver<L = SystemLookup> {
    lookup: L,
    settings: ResolverSettings,
}

impl Resolver<SystemLookup> {
    pub fn system(settings: ResolverSettings) -> Self {
        Self::new(SystemLookup, settings)
    }
}

impl<L: HostLookup> Resolver<L> {
    pub fn new(lookup: L, settings: ResolverSettings) -> Self {
        Self { lookup, settings }
    }

    /// Resolve `host` to the string form of its first address.
    ///
    /// Literal IP addresses are returned unchanged without a lookup.
    pub async fn resolve(&self, host: &str) -> Result<String, ResolveError> {
        if host.parse::<IpAddr>().is_ok() {
            return Ok(host.to_string());
        }

        let started = Instant::now();
        let mut attempt = 1u32;
        loop {
            let last_error = match self.lookup.lookup(host).await {
                Ok(ips) => match ips.first() {
                    Some(ip) => {
                        tracing::info!("Resolved {} to {} (attempt {})", host, ip, attempt);
                        return Ok(ip.to_string());
                    }
                    None => "0 IPs returned from DNS".to_string(),
                },
                Err(e) => e.to_string(),
            };

            let waited = started.elapsed();
            if waited >= self.settings.deadline {
                return Err(ResolveError::Timeout {
                    host: host.to_string(),
                    waited,
                    last_error,
                });
            }

            let delay = self
                .settings
                .retry_interval
                .min(self.settings.deadline - waited);
            tracing::warn!(
                "Failed to resolve {} (attempt {}): {}. Retrying in {:?}...",
                host,
                attempt,
                last_error,
                delay
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

/// The Garden server address, fixed once resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetEndpoint {
    pub host: String,
    pub port: u16,
    pub resolved_address: String,
}

impl TargetEndpoint {
    pub async fn resolve<L: HostLookup>(
        resolver: &Resolver<L>,
        host: &str,
        port: u16,
    ) -> Result<Self, ResolveError> {
        let resolved_address = resolver.resolve(host).await?;
        Ok(Self {
            host: host.to_string(),
            port,
            resolved_address,
        })
    }

    /// `address:port`, with IPv6 addresses bracketed.
    pub fn address(&self) -> String {
        match self.resolved_address.parse::<IpAddr>() {
            Ok(ip) => SocketAddr::new(ip, self.port).to_string(),
            Err(_) => format!("{}:{}", self.resolved_address, self.port),
        }
    }
}
