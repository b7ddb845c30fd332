// src/output/text.rs
//! Plain-text export: `# key: value` header, then one subdomain per line

use crate::types::ScanReport;
use std::fmt::Write;

pub fn render(report: &ScanReport) -> String {
    let mut out = String::new();

    // writing into a String cannot fail
    let _ = writeln!(out, "# domain: {}", report.domain);
    let _ = writeln!(out, "# started: {}", report.started_at.to_rfc3339());
    let _ = writeln!(out, "# duration_seconds: {:.2}", report.duration_seconds());
    let _ = writeln!(out, "# complete: {}", report.is_complete());
    let _ = writeln!(out, "# total: {}", report.total());
    for (tag, count) in report.by_source() {
        let _ = writeln!(out, "# {}: {}", tag, count);
    }

    for subdomain in &report.subdomains {
        let _ = writeln!(out, "{}", subdomain);
    }
    out
}
