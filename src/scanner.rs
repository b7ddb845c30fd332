// src/scanner.rs
//! Scan orchestration
//!
//! Runs the enabled sources in phase order (CT, Web, Zone, Brute-Force),
//! feeds every discovery into the aggregator and enforces the global
//! deadline. Cancellation, whether from the deadline or a [`CancelHandle`],
//! lets the running phase drain and keeps any later phase from starting.

use crate::aggregator::Aggregator;
use crate::config::ScanConfig;
use crate::dns::{AxfrClient, HickoryResolver, Resolver, ZoneTransfer};
use crate::error::ConfigError;
use crate::http::{HttpFetch, ReqwestFetcher};
use crate::progress::ProgressReporter;
use crate::sources::{
    BruteForceSource, CrtShSource, ScanContext, Source, WebSearchSource, ZoneTransferSource,
};
use crate::types::{Completion, Phase, ScanReport, ScanState, SourceStats, SourceStatus, SourceTag};
use crate::wordlist::Wordlist;
use chrono::Utc;
use futures_util::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Requests cancellation of a running scan. Cheap to clone.
#[derive(Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

pub struct Scanner {
    resolver: Arc<dyn Resolver>,
    http: Arc<dyn HttpFetch>,
    zone: Arc<dyn ZoneTransfer>,
    progress: ProgressReporter,
    state: watch::Sender<ScanState>,
    cancel: Arc<watch::Sender<bool>>,
}

impl Scanner {
    pub fn new(
        resolver: Arc<dyn Resolver>,
        http: Arc<dyn HttpFetch>,
        zone: Arc<dyn ZoneTransfer>,
        progress: ProgressReporter,
    ) -> Self {
        let (state, _) = watch::channel(ScanState::Idle);
        let (cancel, _) = watch::channel(false);

        Self {
            resolver,
            http,
            zone,
            progress,
            state,
            cancel: Arc::new(cancel),
        }
    }

    /// Scanner wired to the network: hickory for DNS, reqwest for HTTP
    pub fn with_defaults(config: &ScanConfig, progress: ProgressReporter) -> anyhow::Result<Self> {
        let resolver = HickoryResolver::new(&config.nameservers, config.timeout);
        let http = ReqwestFetcher::new()?;

        Ok(Self::new(
            Arc::new(resolver),
            Arc::new(http),
            Arc::new(AxfrClient::new()),
            progress,
        ))
    }

    pub fn state(&self) -> ScanState {
        *self.state.borrow()
    }

    /// Receiver that sees every state transition
    pub fn subscribe_state(&self) -> watch::Receiver<ScanState> {
        self.state.subscribe()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            tx: Arc::clone(&self.cancel),
        }
    }

    fn set_state(&self, state: ScanState) {
        debug!("Scan state: {:?}", state);
        self.state.send_replace(state);
    }

    fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Run one full scan. Only configuration problems are errors; every
    /// source failure ends up in the report instead.
    ///
    /// A cancel requested while idle applies to the next run. Each run
    /// clears the flag when it finishes, so a scanner can be reused.
    pub async fn run_scan(&self, config: ScanConfig) -> Result<ScanReport, ConfigError> {
        config.validate()?;

        // a bad wordlist must fail before any network traffic
        let wordlist = if config.sources.brute {
            let path = config.wordlist.as_deref().ok_or(ConfigError::MissingWordlist)?;
            Some(Wordlist::open(path)?)
        } else {
            None
        };

        let started_at = Utc::now();
        let aggregator = Aggregator::new(config.domain.clone());
        info!("Starting enumeration of {}", config.domain);

        let deadline = config.deadline.map(|limit| {
            let cancel = Arc::clone(&self.cancel);
            tokio::spawn(async move {
                tokio::time::sleep(limit).await;
                warn!("Scan deadline of {:?} reached, stopping", limit);
                cancel.send_replace(true);
            })
        });

        let ctx = ScanContext::new(config.clone(), self.cancel.subscribe(), self.progress.clone());
        let mut stats: BTreeMap<SourceTag, SourceStats> = BTreeMap::new();

        let mut passive: Vec<Box<dyn Source>> = Vec::new();
        if config.sources.ct {
            passive.push(Box::new(CrtShSource::new(Arc::clone(&self.http))));
        }
        if config.sources.web {
            passive.push(Box::new(WebSearchSource::new(Arc::clone(&self.http))));
        }
        if config.sources.zone {
            passive.push(Box::new(ZoneTransferSource::new(
                Arc::clone(&self.resolver),
                Arc::clone(&self.zone),
            )));
        }

        if config.parallel_sources && passive.len() > 1 && !self.is_cancelled() {
            self.set_state(ScanState::Running(Phase::Passive));
            let results = join_all(
                passive
                    .iter()
                    .map(|source| self.run_phase(source.as_ref(), &ctx, &aggregator)),
            )
            .await;
            stats.extend(results);
        } else {
            for source in &passive {
                let (tag, phase_stats) = self.maybe_run(source.as_ref(), &ctx, &aggregator).await;
                stats.insert(tag, phase_stats);
            }
        }

        if let Some(wordlist) = wordlist {
            let brute = BruteForceSource::new(Arc::clone(&self.resolver), wordlist);
            let (tag, phase_stats) = self.maybe_run(&brute, &ctx, &aggregator).await;
            stats.insert(tag, phase_stats);
        }

        for tag in SourceTag::ALL {
            stats.entry(tag).or_insert_with(SourceStats::skipped);
        }

        if let Some(timer) = deadline {
            timer.abort();
            // wait it out so a late firing cannot leak into the next scan
            let _ = timer.await;
        }

        self.set_state(ScanState::Finalizing);
        let completion = if self.is_cancelled() {
            Completion::Aborted
        } else {
            Completion::Done
        };
        let report = aggregator.finalize(started_at, stats, completion).await;

        match completion {
            Completion::Done => self.set_state(ScanState::Done),
            Completion::Aborted => self.set_state(ScanState::Aborted),
        }

        // cancellation is per scan; the next run starts clean
        self.cancel.send_replace(false);

        info!(
            "Enumeration of {} finished: {} subdomains in {:.2}s{}",
            report.domain,
            report.total(),
            report.duration_seconds(),
            if report.is_complete() { "" } else { " (incomplete)" }
        );

        Ok(report)
    }

    /// Run `source` unless the scan has already been cancelled
    async fn maybe_run(
        &self,
        source: &dyn Source,
        ctx: &ScanContext,
        aggregator: &Aggregator,
    ) -> (SourceTag, SourceStats) {
        if self.is_cancelled() {
            info!("Skipping {}: scan cancelled", source.tag().label());
            return (source.tag(), SourceStats::not_run());
        }

        self.set_state(ScanState::Running(Phase::for_source(source.tag())));
        self.run_phase(source, ctx, aggregator).await
    }

    async fn run_phase(
        &self,
        source: &dyn Source,
        ctx: &ScanContext,
        aggregator: &Aggregator,
    ) -> (SourceTag, SourceStats) {
        let tag = source.tag();
        self.progress.phase_started(tag);
        info!("Starting {}", tag.label());

        let start = Instant::now();
        let discovery = source.discover(ctx).await;
        let found = aggregator.admit(discovery.candidates(), tag).await;
        let stats = SourceStats::from_discovery(&discovery, found, start.elapsed());

        match stats.status {
            SourceStatus::Failed => warn!(
                "{} failed: {}",
                tag.label(),
                stats.reason.as_deref().unwrap_or("unknown error")
            ),
            SourceStatus::Refused => info!(
                "{} refused: {}",
                tag.label(),
                stats.reason.as_deref().unwrap_or("")
            ),
            _ => info!("{}: {} subdomains", tag.label(), found),
        }
        for warning in &stats.warnings {
            debug!("{} warning: {}", tag.label(), warning);
        }

        self.progress.phase_completed(tag, &stats);
        (tag, stats)
    }
}

/// Run a scan against the real network with default transports
pub async fn run_scan(config: ScanConfig) -> anyhow::Result<ScanReport> {
    let scanner = Scanner::with_defaults(&config, ProgressReporter::new())?;
    Ok(scanner.run_scan(config).await?)
}
