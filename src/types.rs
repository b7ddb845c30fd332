// src/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Discovery channel that produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTag {
    CtLogs,
    WebSearch,
    ZoneTransfer,
    BruteForce,
}

impl SourceTag {
    /// All tags in phase order
    pub const ALL: [SourceTag; 4] = [
        SourceTag::CtLogs,
        SourceTag::WebSearch,
        SourceTag::ZoneTransfer,
        SourceTag::BruteForce,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::CtLogs => "ct_logs",
            SourceTag::WebSearch => "web_search",
            SourceTag::ZoneTransfer => "zone_transfer",
            SourceTag::BruteForce => "brute_force",
        }
    }

    /// Human-readable label used in summaries
    pub fn label(&self) -> &'static str {
        match self {
            SourceTag::CtLogs => "Certificate Transparency",
            SourceTag::WebSearch => "Web Sources",
            SourceTag::ZoneTransfer => "Zone Transfer",
            SourceTag::BruteForce => "DNS Brute-Force",
        }
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw hostname as returned by a source, before normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub raw: String,
    pub source: SourceTag,
}

impl Candidate {
    pub fn new(raw: impl Into<String>, source: SourceTag) -> Self {
        Self {
            raw: raw.into(),
            source,
        }
    }
}

/// Normalized, in-scope hostname
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Subdomain(String);

impl Subdomain {
    /// Only the normalizer builds these, so the scope invariant holds
    pub(crate) fn new_unchecked(name: String) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Subdomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a single adapter invocation produced
#[derive(Debug, Clone)]
pub enum SourceOutcome {
    /// At least one raw hostname came back
    Found(Vec<Candidate>),
    /// The source answered but had nothing
    Empty,
    /// An expected refusal (zone transfer not allowed)
    Refused(String),
    /// The source could not be reached or returned garbage
    Failed(String),
}

/// Result of `Source::discover`
#[derive(Debug, Clone)]
pub struct Discovery {
    pub outcome: SourceOutcome,
    /// Non-fatal problems, e.g. one dead aggregator endpoint
    pub warnings: Vec<String>,
    /// The phase was cut short by cancellation
    pub interrupted: bool,
}

impl Discovery {
    pub fn new(outcome: SourceOutcome) -> Self {
        Self {
            outcome,
            warnings: Vec::new(),
            interrupted: false,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self::new(SourceOutcome::Failed(reason.into()))
    }

    /// `Found` when there are candidates, `Empty` otherwise
    pub fn from_candidates(candidates: Vec<Candidate>) -> Self {
        if candidates.is_empty() {
            Self::new(SourceOutcome::Empty)
        } else {
            Self::new(SourceOutcome::Found(candidates))
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn interrupted(mut self, interrupted: bool) -> Self {
        self.interrupted = interrupted;
        self
    }

    pub fn candidates(&self) -> &[Candidate] {
        match &self.outcome {
            SourceOutcome::Found(c) => c,
            _ => &[],
        }
    }
}

/// Final state of one phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    /// Disabled in the config
    Skipped,
    /// Never started because the scan was cancelled first
    NotRun,
    Found,
    Empty,
    Refused,
    Failed,
}

/// Per-source counters, written by the orchestrator as each phase completes
#[derive(Debug, Clone, Serialize)]
pub struct SourceStats {
    pub status: SourceStatus,
    /// Distinct normalized names this source admitted
    pub found: usize,
    /// Raw candidates produced before normalization
    pub raw: usize,
    #[serde(rename = "elapsed_seconds", serialize_with = "serialize_secs")]
    pub elapsed: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub interrupted: bool,
}

impl SourceStats {
    pub fn with_status(status: SourceStatus) -> Self {
        Self {
            status,
            found: 0,
            raw: 0,
            elapsed: Duration::ZERO,
            reason: None,
            warnings: Vec::new(),
            interrupted: false,
        }
    }

    pub fn skipped() -> Self {
        Self::with_status(SourceStatus::Skipped)
    }

    pub fn not_run() -> Self {
        Self::with_status(SourceStatus::NotRun)
    }

    /// Build stats from an adapter's discovery and the aggregator's count
    pub fn from_discovery(discovery: &Discovery, found: usize, elapsed: Duration) -> Self {
        let (status, reason) = match &discovery.outcome {
            SourceOutcome::Found(_) if found > 0 => (SourceStatus::Found, None),
            // Everything it returned was out of scope
            SourceOutcome::Found(_) | SourceOutcome::Empty => (SourceStatus::Empty, None),
            SourceOutcome::Refused(r) => (SourceStatus::Refused, Some(r.clone())),
            SourceOutcome::Failed(r) => (SourceStatus::Failed, Some(r.clone())),
        };

        Self {
            status,
            found,
            raw: discovery.candidates().len(),
            elapsed,
            reason,
            warnings: discovery.warnings.clone(),
            interrupted: discovery.interrupted,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.status == SourceStatus::Failed
    }
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64((d.as_secs_f64() * 100.0).round() / 100.0)
}

/// Phase being executed by the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    CtLogs,
    WebSearch,
    ZoneTransfer,
    BruteForce,
    /// CT, Web and Zone running concurrently
    Passive,
}

impl Phase {
    pub fn for_source(tag: SourceTag) -> Self {
        match tag {
            SourceTag::CtLogs => Phase::CtLogs,
            SourceTag::WebSearch => Phase::WebSearch,
            SourceTag::ZoneTransfer => Phase::ZoneTransfer,
            SourceTag::BruteForce => Phase::BruteForce,
        }
    }
}

/// Orchestrator state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Running(Phase),
    Finalizing,
    Done,
    Aborted,
}

/// Terminal state recorded in the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Completion {
    Done,
    Aborted,
}

/// Immutable result of one scan
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub domain: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub subdomains: Vec<Subdomain>,
    pub sources: BTreeMap<SourceTag, SourceStats>,
    pub state: Completion,
}

impl ScanReport {
    pub fn total(&self) -> usize {
        self.subdomains.len()
    }

    /// False when a deadline or cancellation cut the scan short
    pub fn is_complete(&self) -> bool {
        self.state == Completion::Done
    }

    pub fn duration_seconds(&self) -> f64 {
        let ms = (self.finished_at - self.started_at).num_milliseconds().max(0);
        (ms as f64 / 10.0).round() / 100.0
    }

    /// Found count per source, for every source that has stats
    pub fn by_source(&self) -> BTreeMap<SourceTag, usize> {
        self.sources
            .iter()
            .map(|(tag, stats)| (*tag, stats.found))
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.subdomains
            .binary_search_by(|s| s.as_str().cmp(name))
            .is_ok()
    }
}
