// src/sources/brute.rs
//! Wordlist brute-force through the resolution pool

use super::{ScanContext, Source};
use crate::dns::Resolver;
use crate::error::ConfigError;
use crate::pool::WorkerPool;
use crate::types::{Candidate, Discovery, SourceTag};
use crate::wordlist::Wordlist;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

pub struct BruteForceSource {
    resolver: Arc<dyn Resolver>,
    wordlist: Wordlist,
}

impl BruteForceSource {
    pub fn new(resolver: Arc<dyn Resolver>, wordlist: Wordlist) -> Self {
        Self { resolver, wordlist }
    }

    /// `label.domain` for every usable wordlist entry, one per [`Wordlist::count`]
    fn hosts(&self, domain: &str) -> Result<impl Iterator<Item = String> + Send + use<>, ConfigError> {
        let domain = domain.to_string();
        Ok(self
            .wordlist
            .labels()?
            .map(move |label| format!("{}.{}", label, domain)))
    }
}

#[async_trait]
impl Source for BruteForceSource {
    fn tag(&self) -> SourceTag {
        SourceTag::BruteForce
    }

    async fn discover(&self, ctx: &ScanContext) -> Discovery {
        let total = match self.wordlist.count() {
            Ok(total) => total,
            Err(e) => return Discovery::failed(e.to_string()),
        };
        let hosts = match self.hosts(ctx.domain()) {
            Ok(hosts) => hosts,
            Err(e) => return Discovery::failed(e.to_string()),
        };

        info!(
            "Brute-forcing {} names from {} with {} workers",
            total,
            self.wordlist.path().display(),
            ctx.config.threads
        );
        ctx.progress.begin_work(total as u64);

        let pool = WorkerPool::new(
            Arc::clone(&self.resolver),
            ctx.config.threads,
            ctx.config.timeout,
        );

        match pool.run(hosts, ctx.cancel.clone(), &ctx.progress).await {
            Ok(outcome) => {
                if outcome.cancelled {
                    warn!(
                        "Brute-force interrupted after {}/{} names",
                        outcome.attempted, total
                    );
                }
                Discovery::from_candidates(
                    outcome
                        .resolved
                        .into_iter()
                        .map(|host| Candidate::new(host, SourceTag::BruteForce))
                        .collect(),
                )
                .interrupted(outcome.cancelled)
            }
            Err(e) => {
                warn!("Brute-force aborted: {}", e);
                Discovery::failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanConfig;
    use crate::dns::ResolveError;
    use crate::progress::ProgressReporter;
    use crate::types::SourceOutcome;
    use std::collections::HashSet;
    use std::io::Write;
    use std::net::IpAddr;
    use std::time::Duration;
    use tempfile::NamedTempFile;
    use tokio::sync::watch;

    struct KnownHosts {
        known: HashSet<&'static str>,
        unreachable: bool,
    }

    #[async_trait]
    impl Resolver for KnownHosts {
        async fn resolve(&self, host: &str, _timeout: Duration) -> Result<Vec<IpAddr>, ResolveError> {
            if self.unreachable {
                return Err(ResolveError::Unreachable("network is unreachable".into()));
            }
            if self.known.contains(host) {
                Ok(vec!["192.0.2.10".parse().unwrap()])
            } else {
                Err(ResolveError::NotFound)
            }
        }

        async fn name_servers(&self, _domain: &str, _timeout: Duration) -> Result<Vec<String>, ResolveError> {
            Ok(vec![])
        }
    }

    fn wordlist(content: &str) -> (NamedTempFile, Wordlist) {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        let list = Wordlist::open(file.path()).unwrap();
        (file, list)
    }

    fn context() -> ScanContext {
        let mut config = ScanConfig::new("example.com");
        config.threads = 4;
        let (_tx, rx) = watch::channel(false);
        ScanContext::new(config, rx, ProgressReporter::new())
    }

    #[tokio::test]
    async fn test_only_resolving_names_emitted() {
        let (_file, list) = wordlist("www\napi\n# comment\nmail\nnope\n");
        let resolver = Arc::new(KnownHosts {
            known: HashSet::from(["api.example.com", "mail.example.com"]),
            unreachable: false,
        });
        let ctx = context();

        let discovery = BruteForceSource::new(resolver, list).discover(&ctx).await;

        let mut raw: Vec<&str> = discovery.candidates().iter().map(|c| c.raw.as_str()).collect();
        raw.sort();
        assert_eq!(raw, vec!["api.example.com", "mail.example.com"]);
        assert!(!discovery.interrupted);

        let snapshot = ctx.progress.snapshot();
        assert_eq!(snapshot.total, 4);
        assert_eq!(snapshot.done, 4);
        assert_eq!(snapshot.found, 2);
    }

    #[tokio::test]
    async fn test_invalid_labels_never_queried() {
        let (_file, list) = wordlist("ok\n-bad\nhas space\n");
        let resolver = Arc::new(KnownHosts {
            known: HashSet::new(),
            unreachable: false,
        });
        let ctx = context();

        let discovery = BruteForceSource::new(resolver, list).discover(&ctx).await;

        assert!(matches!(discovery.outcome, SourceOutcome::Empty));
        assert_eq!(ctx.progress.snapshot().total, 1);
    }

    #[tokio::test]
    async fn test_unreachable_resolver_fails_phase() {
        let (_file, list) = wordlist("a\nb\nc\n");
        let resolver = Arc::new(KnownHosts {
            known: HashSet::new(),
            unreachable: true,
        });

        let discovery = BruteForceSource::new(resolver, list).discover(&context()).await;

        match discovery.outcome {
            SourceOutcome::Failed(reason) => assert!(reason.contains("unreachable")),
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cancelled_phase_is_interrupted() {
        let (_file, list) = wordlist("www\n");
        let resolver = Arc::new(KnownHosts {
            known: HashSet::from(["www.example.com"]),
            unreachable: false,
        });
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();
        let ctx = ScanContext::new(ScanConfig::new("example.com"), rx, ProgressReporter::new());

        let discovery = BruteForceSource::new(resolver, list).discover(&ctx).await;

        assert!(discovery.interrupted);
        assert!(discovery.candidates().is_empty());
    }
}
