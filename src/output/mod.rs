// src/output/mod.rs
//! Report export and console summary
//!
//! Exports are written once, after the scan. A failed export never touches
//! the in-memory report, so the caller can still print it.

use crate::error::OutputError;
use crate::types::ScanReport;
use chrono::Local;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub mod human;
pub mod json;
pub mod text;

/// Export file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Summary header plus one subdomain per line
    #[default]
    Txt,
    /// Pretty-printed JSON document
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Txt => "txt",
            OutputFormat::Json => "json",
        }
    }

    /// Serialize `report` in this format
    pub fn render(&self, report: &ScanReport) -> Result<String, OutputError> {
        match self {
            OutputFormat::Txt => Ok(text::render(report)),
            OutputFormat::Json => json::render(report),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// `subdomains_<domain>_<YYYYmmdd_HHMMSS>`, local time of scan completion
pub fn default_file_stem(report: &ScanReport) -> String {
    format!(
        "subdomains_{}_{}",
        report.domain,
        report
            .finished_at
            .with_timezone(&Local)
            .format("%Y%m%d_%H%M%S")
    )
}

/// Write `report` to `dir/<stem>.<ext>` and return the path written
pub fn export(
    report: &ScanReport,
    format: OutputFormat,
    stem: Option<&str>,
    dir: &Path,
) -> Result<PathBuf, OutputError> {
    let stem = match stem {
        Some(s) => s.to_string(),
        None => default_file_stem(report),
    };
    let path = dir.join(format!("{}.{}", stem, format.extension()));

    let body = format.render(report)?;
    fs::write(&path, body).map_err(|source| OutputError::Io {
        path: path.clone(),
        source,
    })?;

    info!("Results saved to {}", path.display());
    Ok(path)
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::types::{Completion, ScanReport, SourceStats, SourceStatus, SourceTag, Subdomain};
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;
    use std::time::Duration;

    /// Small finished report: CT found two names, brute one, web failed
    pub fn sample_report() -> ScanReport {
        let mut sources = BTreeMap::new();

        let mut ct = SourceStats::with_status(SourceStatus::Found);
        ct.found = 2;
        ct.raw = 3;
        ct.elapsed = Duration::from_millis(1234);
        sources.insert(SourceTag::CtLogs, ct);

        let mut web = SourceStats::with_status(SourceStatus::Failed);
        web.reason = Some("HackerTarget: HTTP 429".to_string());
        sources.insert(SourceTag::WebSearch, web);

        sources.insert(SourceTag::ZoneTransfer, SourceStats::skipped());

        let mut brute = SourceStats::with_status(SourceStatus::Found);
        brute.found = 1;
        brute.raw = 1;
        sources.insert(SourceTag::BruteForce, brute);

        ScanReport {
            domain: "example.com".to_string(),
            started_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            finished_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 42).unwrap(),
            subdomains: ["api.example.com", "mail.example.com", "www.example.com"]
                .iter()
                .map(|s| Subdomain::new_unchecked(s.to_string()))
                .collect(),
            sources,
            state: Completion::Done,
        }
    }
}
