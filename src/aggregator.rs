// src/aggregator.rs
//! Merges candidates from every source into one deduplicated, sorted set

use crate::normalize::normalize;
use crate::types::{Candidate, Completion, ScanReport, SourceStats, SourceTag, Subdomain};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[derive(Default)]
struct Inner {
    /// normalized name -> first source that admitted it
    names: BTreeMap<String, SourceTag>,
    per_source: HashMap<SourceTag, HashSet<String>>,
    report: Option<ScanReport>,
}

/// Cloneable handle; all clones share one result set
#[derive(Clone)]
pub struct Aggregator {
    domain: String,
    inner: Arc<Mutex<Inner>>,
}

impl Aggregator {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    /// Normalize and record `candidates` for `tag`. Returns how many distinct
    /// names `tag` has contributed so far. Ignored once finalized.
    pub async fn admit(&self, candidates: &[Candidate], tag: SourceTag) -> usize {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;

        if inner.report.is_some() {
            warn!(
                "Dropping {} late candidates from {}: results already finalized",
                candidates.len(),
                tag
            );
            return inner.per_source.get(&tag).map_or(0, HashSet::len);
        }

        let seen = inner.per_source.entry(tag).or_default();
        let mut rejected = 0;

        for candidate in candidates {
            let Some(name) = normalize(&candidate.raw, &self.domain) else {
                rejected += 1;
                continue;
            };

            inner
                .names
                .entry(name.as_str().to_string())
                .or_insert(tag);
            seen.insert(name.into_string());
        }

        if rejected > 0 {
            debug!("{}: {} candidates out of scope or malformed", tag, rejected);
        }

        seen.len()
    }

    /// Distinct names admitted by `tag` so far
    pub async fn count_for(&self, tag: SourceTag) -> usize {
        self.inner
            .lock()
            .await
            .per_source
            .get(&tag)
            .map_or(0, HashSet::len)
    }

    /// Source that first contributed `name`
    pub async fn first_source(&self, name: &str) -> Option<SourceTag> {
        self.inner.lock().await.names.get(name).copied()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.names.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Freeze the result set and build the report. Only the first call builds
    /// it; later calls get the same report back.
    pub async fn finalize(
        &self,
        started_at: DateTime<Utc>,
        sources: BTreeMap<SourceTag, SourceStats>,
        state: Completion,
    ) -> ScanReport {
        let mut inner = self.inner.lock().await;

        if let Some(report) = &inner.report {
            return report.clone();
        }

        let report = ScanReport {
            domain: self.domain.clone(),
            started_at,
            finished_at: Utc::now(),
            // BTreeMap keys are already in ascending order
            subdomains: inner
                .names
                .keys()
                .map(|n| Subdomain::new_unchecked(n.clone()))
                .collect(),
            sources,
            state,
        };

        inner.report = Some(report.clone());
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates(names: &[&str], tag: SourceTag) -> Vec<Candidate> {
        names.iter().map(|n| Candidate::new(*n, tag)).collect()
    }

    fn names(report: &ScanReport) -> Vec<&str> {
        report.subdomains.iter().map(|s| s.as_str()).collect()
    }

    #[tokio::test]
    async fn test_dedup_across_sources() {
        let agg = Aggregator::new("example.com");

        let ct = agg
            .admit(&candidates(&["www.example.com", "api.example.com", "WWW.example.com."], SourceTag::CtLogs), SourceTag::CtLogs)
            .await;
        let web = agg
            .admit(&candidates(&["*.admin.example.com", "api.example.com"], SourceTag::WebSearch), SourceTag::WebSearch)
            .await;

        assert_eq!(ct, 2);
        assert_eq!(web, 2);
        assert_eq!(agg.len().await, 3);
        assert_eq!(agg.first_source("api.example.com").await, Some(SourceTag::CtLogs));
        assert_eq!(agg.first_source("admin.example.com").await, Some(SourceTag::WebSearch));

        let report = agg
            .finalize(Utc::now(), BTreeMap::new(), Completion::Done)
            .await;
        assert_eq!(names(&report), vec!["admin.example.com", "api.example.com", "www.example.com"]);
    }

    #[tokio::test]
    async fn test_out_of_scope_rejected() {
        let agg = Aggregator::new("example.com");

        let count = agg
            .admit(&candidates(&["evil.com", "notexample.com", "example.com.evil.net", "a..example.com"], SourceTag::WebSearch), SourceTag::WebSearch)
            .await;

        assert_eq!(count, 0);
        assert!(agg.is_empty().await);
    }

    #[tokio::test]
    async fn test_readmission_never_double_counts() {
        let agg = Aggregator::new("example.com");
        let batch = candidates(&["mail.example.com"], SourceTag::BruteForce);

        assert_eq!(agg.admit(&batch, SourceTag::BruteForce).await, 1);
        assert_eq!(agg.admit(&batch, SourceTag::BruteForce).await, 1);
        assert_eq!(agg.count_for(SourceTag::BruteForce).await, 1);
        assert_eq!(agg.count_for(SourceTag::CtLogs).await, 0);
    }

    #[tokio::test]
    async fn test_order_independent() {
        let batches = vec![
            (SourceTag::CtLogs, vec!["b.example.com", "a.example.com"]),
            (SourceTag::WebSearch, vec!["c.example.com", "a.example.com"]),
            (SourceTag::BruteForce, vec!["z.example.com", "b.example.com"]),
        ];

        let forward = Aggregator::new("example.com");
        for (tag, batch) in &batches {
            forward.admit(&candidates(batch, *tag), *tag).await;
        }
        let backward = Aggregator::new("example.com");
        for (tag, batch) in batches.iter().rev() {
            backward.admit(&candidates(batch, *tag), *tag).await;
        }

        let a = forward.finalize(Utc::now(), BTreeMap::new(), Completion::Done).await;
        let b = backward.finalize(Utc::now(), BTreeMap::new(), Completion::Done).await;
        assert_eq!(a.subdomains, b.subdomains);
    }

    #[tokio::test]
    async fn test_concurrent_admits() {
        let agg = Aggregator::new("example.com");

        let handles: Vec<_> = SourceTag::ALL
            .iter()
            .map(|tag| {
                let agg = agg.clone();
                let tag = *tag;
                tokio::spawn(async move {
                    for i in 0..100 {
                        let name = format!("host{}.example.com", i);
                        agg.admit(&[Candidate::new(name, tag)], tag).await;
                    }
                })
            })
            .collect();
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(agg.len().await, 100);
        for tag in SourceTag::ALL {
            assert_eq!(agg.count_for(tag).await, 100);
        }
    }

    #[tokio::test]
    async fn test_finalize_freezes() {
        let agg = Aggregator::new("example.com");
        agg.admit(&candidates(&["www.example.com"], SourceTag::CtLogs), SourceTag::CtLogs)
            .await;

        let first = agg.finalize(Utc::now(), BTreeMap::new(), Completion::Aborted).await;
        let late = agg
            .admit(&candidates(&["late.example.com"], SourceTag::BruteForce), SourceTag::BruteForce)
            .await;
        let second = agg.finalize(Utc::now(), BTreeMap::new(), Completion::Done).await;

        assert_eq!(late, 0);
        assert_eq!(names(&second), vec!["www.example.com"]);
        assert_eq!(first.finished_at, second.finished_at);
        assert_eq!(second.state, Completion::Aborted);
    }
}
