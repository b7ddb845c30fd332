// src/pool.rs
//! Bounded-concurrency DNS resolution pool

use crate::dns::{ResolveError, Resolver};
use crate::progress::ProgressReporter;
use futures_util::{StreamExt, stream};
use std::future::ready;
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, trace, warn};

/// Abort once this many attempts failed to reach any resolver and none got an answer
pub const UNREACHABLE_ABORT_THRESHOLD: usize = 16;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("DNS resolver unreachable: {0}")]
    ResolverUnreachable(String),
}

/// Outcome for a single hostname
#[derive(Debug, Clone)]
pub struct Resolution {
    pub host: String,
    pub result: Result<Vec<IpAddr>, ResolveError>,
}

impl Resolution {
    pub fn resolved(&self) -> bool {
        matches!(&self.result, Ok(addrs) if !addrs.is_empty())
    }
}

#[derive(Debug, Default)]
pub struct PoolOutcome {
    /// Hostnames that resolved to at least one address, in completion order
    pub resolved: Vec<String>,
    /// Items whose resolution actually ran
    pub attempted: usize,
    /// Cancellation stopped submission before the input ran out
    pub cancelled: bool,
}

/// Runs up to `concurrency` resolutions at once, each bounded by `timeout`
pub struct WorkerPool {
    resolver: Arc<dyn Resolver>,
    concurrency: usize,
    timeout: Duration,
}

impl WorkerPool {
    pub fn new(resolver: Arc<dyn Resolver>, concurrency: usize, timeout: Duration) -> Self {
        Self {
            resolver,
            concurrency: concurrency.max(1),
            timeout,
        }
    }

    /// Resolve every item once. Items are pulled lazily, so once `cancel`
    /// flips to true nothing new is submitted; in-flight lookups finish or
    /// time out on their own.
    pub async fn run<I>(
        &self,
        items: I,
        cancel: watch::Receiver<bool>,
        progress: &ProgressReporter,
    ) -> Result<PoolOutcome, PoolError>
    where
        I: IntoIterator<Item = String>,
        I::IntoIter: Send,
    {
        let mut outcome = PoolOutcome::default();
        let mut unreachable_streak = 0usize;
        let mut answered = false;
        let mut last_unreachable = String::new();

        // set only when the gate actually dropped input
        let cut_short = AtomicBool::new(false);
        let gate = cancel.clone();
        let mut results = stream::iter(items.into_iter())
            .take_while(|_| {
                let open = !*gate.borrow();
                if !open {
                    cut_short.store(true, Ordering::Relaxed);
                }
                ready(open)
            })
            .map(|host| self.resolve_one(host))
            .buffer_unordered(self.concurrency);

        while let Some(resolution) = results.next().await {
            outcome.attempted += 1;

            match &resolution.result {
                Err(ResolveError::Unreachable(msg)) => {
                    unreachable_streak += 1;
                    last_unreachable = msg.clone();
                }
                Ok(_) | Err(ResolveError::NotFound) => answered = true,
                Err(_) => {}
            }

            if resolution.resolved() {
                debug!("Resolved {}", resolution.host);
                progress.item_done(Some(&resolution.host));
                outcome.resolved.push(resolution.host);
            } else {
                trace!("{}: {:?}", resolution.host, resolution.result);
                progress.item_done(None);
            }

            if !answered && unreachable_streak >= UNREACHABLE_ABORT_THRESHOLD {
                warn!("Aborting pool after {} unreachable lookups", unreachable_streak);
                return Err(PoolError::ResolverUnreachable(last_unreachable));
            }
        }

        // short inputs: every single attempt failed to reach a resolver
        if !answered && outcome.attempted > 0 && unreachable_streak == outcome.attempted {
            return Err(PoolError::ResolverUnreachable(last_unreachable));
        }

        drop(results);
        outcome.cancelled = cut_short.load(Ordering::Relaxed);
        Ok(outcome)
    }

    async fn resolve_one(&self, host: String) -> Resolution {
        let lookup = self.resolver.resolve(&host, self.timeout);
        let result = match tokio::time::timeout(self.timeout, lookup).await {
            Ok(result) => result,
            Err(_) => Err(ResolveError::Timeout),
        };
        Resolution { host, result }
    }
}
