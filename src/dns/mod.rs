// src/dns/mod.rs
//! DNS transport: name resolution and zone transfer

pub mod axfr;

pub use axfr::{AxfrClient, AxfrError, ZoneTransfer};

use async_trait::async_trait;
use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use hickory_resolver::error::{ResolveError as HickoryError, ResolveErrorKind};
use hickory_resolver::proto::error::ProtoErrorKind;
use std::net::IpAddr;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace};

/// Why a lookup produced no addresses
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no such name")]
    NotFound,
    #[error("lookup timed out")]
    Timeout,
    /// No upstream nameserver could be contacted at all
    #[error("resolver unreachable: {0}")]
    Unreachable(String),
    #[error("server error: {0}")]
    Server(String),
}

/// `resolve(hostname, timeout) -> addresses | NotFound | Timeout`
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, host: &str, timeout: Duration) -> Result<Vec<IpAddr>, ResolveError>;

    /// Authoritative nameserver hostnames for `domain`, without trailing dot
    async fn name_servers(&self, domain: &str, timeout: Duration)
        -> Result<Vec<String>, ResolveError>;
}

/// hickory-backed resolver talking to a fixed set of upstream nameservers
pub struct HickoryResolver {
    inner: TokioAsyncResolver,
}

impl HickoryResolver {
    /// Use `nameservers` as upstreams; the system configuration when empty
    pub fn new(nameservers: &[IpAddr], timeout: Duration) -> Self {
        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;
        opts.attempts = 1;

        let config = if nameservers.is_empty() {
            ResolverConfig::default()
        } else {
            ResolverConfig::from_parts(
                None,
                vec![],
                NameServerConfigGroup::from_ips_clear(nameservers, 53, true),
            )
        };

        debug!("DNS resolver options: {:?}", opts);
        let inner = TokioAsyncResolver::tokio(config, opts);

        Self { inner }
    }
}

fn classify(err: &HickoryError) -> ResolveError {
    match err.kind() {
        ResolveErrorKind::NoRecordsFound { .. } => ResolveError::NotFound,
        ResolveErrorKind::Timeout => ResolveError::Timeout,
        ResolveErrorKind::NoConnections | ResolveErrorKind::Io(_) => {
            ResolveError::Unreachable(err.to_string())
        }
        ResolveErrorKind::Proto(proto) => match proto.kind() {
            ProtoErrorKind::Timeout => ResolveError::Timeout,
            ProtoErrorKind::Io(_) => ResolveError::Unreachable(err.to_string()),
            _ => ResolveError::Server(err.to_string()),
        },
        _ => ResolveError::Server(err.to_string()),
    }
}

#[async_trait]
impl Resolver for HickoryResolver {
    async fn resolve(&self, host: &str, timeout: Duration) -> Result<Vec<IpAddr>, ResolveError> {
        // fully qualified so search domains never apply
        let fqdn = format!("{}.", host.trim_end_matches('.'));

        let lookup = tokio::time::timeout(timeout, self.inner.lookup_ip(fqdn.as_str()))
            .await
            .map_err(|_| ResolveError::Timeout)?
            .map_err(|e| classify(&e))?;

        let addrs: Vec<IpAddr> = lookup.iter().collect();
        trace!("{} -> {:?}", host, addrs);

        if addrs.is_empty() {
            Err(ResolveError::NotFound)
        } else {
            Ok(addrs)
        }
    }

    async fn name_servers(
        &self,
        domain: &str,
        timeout: Duration,
    ) -> Result<Vec<String>, ResolveError> {
        let fqdn = format!("{}.", domain.trim_end_matches('.'));

        let lookup = tokio::time::timeout(timeout, self.inner.ns_lookup(fqdn.as_str()))
            .await
            .map_err(|_| ResolveError::Timeout)?
            .map_err(|e| classify(&e))?;

        let mut servers: Vec<String> = lookup
            .iter()
            .map(|ns| ns.to_string().trim_end_matches('.').to_ascii_lowercase())
            .collect();
        servers.sort();
        servers.dedup();

        debug!("{} nameservers: {:?}", domain, servers);
        Ok(servers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_error_display() {
        assert_eq!(ResolveError::NotFound.to_string(), "no such name");
        assert_eq!(
            ResolveError::Unreachable("no connections".into()).to_string(),
            "resolver unreachable: no connections"
        );
    }

    #[tokio::test]
    async fn test_unroutable_upstream_never_hangs() {
        // TEST-NET-1, nothing answers there
        let ns: IpAddr = "192.0.2.1".parse().unwrap();
        let resolver = HickoryResolver::new(&[ns], Duration::from_millis(200));

        let started = std::time::Instant::now();
        let result = resolver
            .resolve("www.example.com", Duration::from_millis(300))
            .await;

        assert!(result.is_err());
        assert!(started.elapsed() < Duration::from_secs(3));
    }
}
