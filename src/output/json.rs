// src/output/json.rs
//! JSON export

use crate::error::OutputError;
use crate::types::{ScanReport, SourceStats, SourceTag, Subdomain};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// On-disk JSON shape. `by_source` holds the per-source counts, `sources`
/// the full per-phase detail.
#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    domain: &'a str,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    duration_seconds: f64,
    complete: bool,
    total: usize,
    by_source: BTreeMap<SourceTag, usize>,
    sources: &'a BTreeMap<SourceTag, SourceStats>,
    subdomains: &'a [Subdomain],
}

impl<'a> From<&'a ScanReport> for JsonReport<'a> {
    fn from(report: &'a ScanReport) -> Self {
        Self {
            domain: &report.domain,
            started_at: report.started_at,
            finished_at: report.finished_at,
            duration_seconds: report.duration_seconds(),
            complete: report.is_complete(),
            total: report.total(),
            by_source: report.by_source(),
            sources: &report.sources,
            subdomains: &report.subdomains,
        }
    }
}

pub fn render(report: &ScanReport) -> Result<String, OutputError> {
    let mut body = serde_json::to_string_pretty(&JsonReport::from(report))?;
    body.push('\n');
    Ok(body)
}
