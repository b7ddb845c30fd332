// src/output/human.rs
//! Colored scan summary for the terminal

use crate::types::{ScanReport, SourceStats, SourceStatus};
use colored::Colorize;
use std::io::{self, Write};
use std::sync::Mutex;

const RULE_WIDTH: usize = 70;

/// Prints the end-of-scan summary block
pub struct HumanSummary {
    writer: Mutex<Box<dyn Write + Send>>,
    use_colors: bool,
}

impl HumanSummary {
    /// Summary on stdout, colored when stdout is a terminal
    pub fn new() -> Self {
        Self {
            writer: Mutex::new(Box::new(io::stdout())),
            use_colors: is_terminal::is_terminal(std::io::stdout()),
        }
    }

    /// Summary into any writer, without colors
    pub fn to_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
            use_colors: false,
        }
    }

    fn status_text(&self, stats: &SourceStats) -> String {
        let text = match stats.status {
            SourceStatus::Found => stats.found.to_string(),
            SourceStatus::Empty => "0".to_string(),
            SourceStatus::Skipped => "skipped".to_string(),
            SourceStatus::NotRun => "not run".to_string(),
            SourceStatus::Refused => "refused".to_string(),
            SourceStatus::Failed => "failed".to_string(),
        };
        let text = if stats.interrupted {
            format!("{} (interrupted)", text)
        } else {
            text
        };

        if !self.use_colors {
            return text;
        }
        match stats.status {
            SourceStatus::Found => text.green().to_string(),
            SourceStatus::Failed => text.red().to_string(),
            SourceStatus::Refused | SourceStatus::NotRun => text.yellow().to_string(),
            _ => text.dimmed().to_string(),
        }
    }

    pub fn print(&self, report: &ScanReport) -> io::Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| io::Error::other("summary writer poisoned"))?;

        let rule = "=".repeat(RULE_WIDTH);
        let title = format!("{:^width$}", "SCAN SUMMARY", width = RULE_WIDTH);

        writeln!(writer)?;
        if self.use_colors {
            writeln!(writer, "{}", rule.cyan().bold())?;
            writeln!(writer, "{}", title.cyan().bold())?;
            writeln!(writer, "{}", rule.cyan().bold())?;
        } else {
            writeln!(writer, "{}\n{}\n{}", rule, title, rule)?;
        }
        writeln!(writer)?;

        let total = report.total().to_string();
        if self.use_colors {
            writeln!(writer, "{} {}", "Target Domain:".bold(), report.domain)?;
            writeln!(writer, "{} {:.2} seconds", "Scan Duration:".bold(), report.duration_seconds())?;
            writeln!(writer, "{} {}", "Total Subdomains:".bold(), total.green().bold())?;
        } else {
            writeln!(writer, "Target Domain: {}", report.domain)?;
            writeln!(writer, "Scan Duration: {:.2} seconds", report.duration_seconds())?;
            writeln!(writer, "Total Subdomains: {}", total)?;
        }

        if !report.is_complete() {
            let note = "Scan was interrupted; results are partial";
            if self.use_colors {
                writeln!(writer, "{}", note.yellow().bold())?;
            } else {
                writeln!(writer, "{}", note)?;
            }
        }

        writeln!(writer)?;
        writeln!(writer, "Discovery Breakdown:")?;
        for (tag, stats) in &report.sources {
            writeln!(writer, "  - {:.<30} {}", tag.label(), self.status_text(stats))?;
            if let Some(reason) = &stats.reason {
                let reason = format!("      {}", reason);
                if self.use_colors {
                    writeln!(writer, "{}", reason.dimmed())?;
                } else {
                    writeln!(writer, "{}", reason)?;
                }
            }
        }

        writeln!(writer)?;
        writeln!(writer, "{}", if self.use_colors { rule.cyan().bold().to_string() } else { rule })?;
        writer.flush()
    }
}

impl Default for HumanSummary {
    fn default() -> Self {
        Self::new()
    }
}
