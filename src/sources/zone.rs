// src/sources/zone.rs
//! Zone transfer (AXFR) against each authoritative nameserver

use super::{ScanContext, Source};
use crate::dns::{AxfrError, Resolver, ZoneTransfer};
use crate::types::{Candidate, Discovery, SourceOutcome, SourceTag};
use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info, warn};

const DNS_PORT: u16 = 53;

pub struct ZoneTransferSource {
    resolver: Arc<dyn Resolver>,
    transfer: Arc<dyn ZoneTransfer>,
}

impl ZoneTransferSource {
    pub fn new(resolver: Arc<dyn Resolver>, transfer: Arc<dyn ZoneTransfer>) -> Self {
        Self { resolver, transfer }
    }

    async fn try_server(&self, ns: &str, ctx: &ScanContext) -> Result<Vec<String>, AxfrError> {
        let timeout = ctx.config.timeout;

        let addrs = self
            .resolver
            .resolve(ns, timeout)
            .await
            .map_err(|e| AxfrError::Io(format!("cannot resolve {}: {}", ns, e)))?;

        // one address per nameserver is enough, they serve the same zone
        let ip = addrs
            .first()
            .copied()
            .ok_or_else(|| AxfrError::Io(format!("no address for {}", ns)))?;

        self.transfer
            .transfer(SocketAddr::new(ip, DNS_PORT), ctx.domain(), timeout)
            .await
    }
}

#[async_trait]
impl Source for ZoneTransferSource {
    fn tag(&self) -> SourceTag {
        SourceTag::ZoneTransfer
    }

    async fn discover(&self, ctx: &ScanContext) -> Discovery {
        let servers = match self
            .resolver
            .name_servers(ctx.domain(), ctx.config.timeout)
            .await
        {
            Ok(servers) if !servers.is_empty() => servers,
            Ok(_) => return Discovery::failed("no nameservers found"),
            Err(e) => {
                warn!("NS lookup for {} failed: {}", ctx.domain(), e);
                return Discovery::failed(format!("NS lookup failed: {}", e));
            }
        };

        let mut names = Vec::new();
        let mut transferred = false;
        let mut refusal = None;
        let mut warnings = Vec::new();
        let mut interrupted = false;

        for ns in &servers {
            if ctx.is_cancelled() {
                interrupted = true;
                break;
            }

            match self.try_server(ns, ctx).await {
                Ok(records) => {
                    info!("Zone transfer succeeded on {} ({} records)", ns, records.len());
                    transferred = true;
                    names.extend(records);
                }
                Err(e) if e.is_refusal() => {
                    debug!("{} refused zone transfer: {}", ns, e);
                    refusal.get_or_insert_with(|| format!("{}: {}", ns, e));
                }
                Err(e) => {
                    debug!("Zone transfer against {} failed: {}", ns, e);
                    warnings.push(format!("{}: {}", ns, e));
                }
            }
        }

        let discovery = if transferred {
            Discovery::from_candidates(
                names
                    .into_iter()
                    .map(|n| Candidate::new(n, SourceTag::ZoneTransfer))
                    .collect(),
            )
        } else if let Some(reason) = refusal {
            Discovery::new(SourceOutcome::Refused(reason))
        } else if warnings.is_empty() {
            Discovery::failed("cancelled before any nameserver was tried")
        } else {
            Discovery::failed(warnings.join("; "))
        };

        discovery.with_warnings(warnings).interrupted(interrupted)
    }
}
