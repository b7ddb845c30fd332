// src/cli.rs
use crate::config::{Config, DEFAULT_WORDLIST, ScanConfig, clean_domain};
use crate::output::OutputFormat;
use clap::Parser;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// subhunter: concurrent subdomain enumeration
///
/// Combines certificate transparency, public DNS aggregators, zone transfer
/// attempts and wordlist brute-force into one deduplicated list.
#[derive(Parser, Debug, Clone)]
#[command(name = "subhunter")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    // ===== Target =====
    /// Target domain (a URL is accepted and reduced to its host)
    #[arg(short = 'd', long = "domain")]
    pub domain: String,

    /// Path to TOML config file
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    // ===== Brute-force =====
    /// Wordlist for DNS brute-force
    #[arg(short = 'w', long = "wordlist")]
    pub wordlist: Option<PathBuf>,

    /// Number of concurrent DNS lookups
    #[arg(short = 't', long = "threads")]
    pub threads: Option<usize>,

    /// Per-query timeout in seconds (HTTP requests get twice this)
    #[arg(long = "timeout")]
    pub timeout: Option<u64>,

    /// Stop the whole scan after this many seconds and keep partial results
    #[arg(long = "deadline")]
    pub deadline: Option<u64>,

    /// Upstream DNS server (repeatable)
    #[arg(long = "resolver")]
    pub resolvers: Vec<IpAddr>,

    // ===== Sources =====
    /// Skip certificate transparency
    #[arg(long = "no-ct")]
    pub no_ct: bool,

    /// Skip web aggregators
    #[arg(long = "no-web")]
    pub no_web: bool,

    /// Skip zone transfer attempts
    #[arg(long = "no-zone")]
    pub no_zone: bool,

    /// Skip DNS brute-force
    #[arg(long = "no-brute")]
    pub no_brute: bool,

    /// Run CT, web and zone sources concurrently
    #[arg(long = "parallel")]
    pub parallel: bool,

    // ===== Output =====
    /// Export format
    #[arg(short = 'o', long = "output", value_enum, default_value_t = OutputFormat::Txt)]
    pub output: OutputFormat,

    /// Export file name without extension (default: subdomains_<domain>_<timestamp>)
    #[arg(short = 'f', long = "file")]
    pub file: Option<String>,

    /// Disable progress indicator
    #[arg(long = "no-progress")]
    pub no_progress: bool,

    // ===== Logging =====
    /// Verbose logging (set log level to debug)
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Quiet logging (set log level to warn)
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

impl Cli {
    /// Validate flag combinations and return errors for invalid usage
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.threads == Some(0) {
            anyhow::bail!("--threads must be greater than 0");
        }

        if self.timeout == Some(0) {
            anyhow::bail!("--timeout must be greater than 0");
        }

        if self.deadline == Some(0) {
            anyhow::bail!("--deadline must be greater than 0");
        }

        // Verbose and quiet are mutually exclusive
        if self.verbose && self.quiet {
            anyhow::bail!("Cannot specify both --verbose and --quiet");
        }

        if self.no_brute && self.wordlist.is_some() {
            anyhow::bail!("--wordlist has no effect with --no-brute");
        }

        Ok(())
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output
    }

    /// Check if progress indicator should be enabled
    pub fn should_show_progress(&self) -> bool {
        !self.no_progress && !self.quiet
    }

    /// Log level from -v/-q, or None to defer to the config file
    pub fn log_level(&self) -> Option<&str> {
        if self.verbose {
            Some("debug")
        } else if self.quiet {
            Some("warn")
        } else {
            None
        }
    }

    /// Final scan settings: file values first, then flags on top
    pub fn scan_config(&self, file: &Config) -> ScanConfig {
        let mut cfg = file.scan_config(&clean_domain(&self.domain));

        if let Some(threads) = self.threads {
            cfg.threads = threads;
        }
        if let Some(secs) = self.timeout {
            cfg.timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.deadline {
            cfg.deadline = Some(Duration::from_secs(secs));
        }
        if !self.resolvers.is_empty() {
            cfg.nameservers = self.resolvers.clone();
        }
        if self.wordlist.is_some() {
            cfg.wordlist = self.wordlist.clone();
        }
        cfg.parallel_sources |= self.parallel;

        cfg.sources.ct &= !self.no_ct;
        cfg.sources.web &= !self.no_web;
        cfg.sources.zone &= !self.no_zone;
        cfg.sources.brute &= !self.no_brute;

        if cfg.sources.brute && cfg.wordlist.is_none() {
            let fallback = Path::new(DEFAULT_WORDLIST);
            if fallback.is_file() {
                cfg.wordlist = Some(fallback.to_path_buf());
            } else {
                warn!(
                    "No wordlist given and {} not found, skipping brute-force",
                    DEFAULT_WORDLIST
                );
                cfg.sources.brute = false;
            }
        }

        cfg
    }
}
