// src/config.rs

use crate::error::ConfigError;
use serde::Deserialize;
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_THREADS: usize = 50;
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_WORDLIST: &str = "wordlists/common.txt";

fn default_true() -> bool { true }
fn default_nameservers() -> Vec<IpAddr> {
    ["8.8.8.8", "1.1.1.1", "8.8.4.4"]
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect()
}
fn default_ct_url() -> String {
    "https://crt.sh/?q=%25.{domain}&output=json".to_string()
}
fn default_web_endpoints() -> Vec<WebEndpoint> {
    vec![
        WebEndpoint {
            name: "HackerTarget".to_string(),
            url: "https://api.hackertarget.com/hostsearch/?q={domain}".to_string(),
        },
        WebEndpoint {
            name: "BufferOver".to_string(),
            url: "https://dns.bufferover.run/dns?q=.{domain}".to_string(),
        },
    ]
}
fn default_log_level() -> String { "info".to_string() }

/// One web aggregator endpoint; `{domain}` in `url` is replaced by the target
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct WebEndpoint {
    pub name: String,
    pub url: String,
}

impl WebEndpoint {
    pub fn url_for(&self, domain: &str) -> String {
        self.url.replace("{domain}", domain)
    }
}

/// Remote endpoints queried by the passive sources
#[derive(Debug, Deserialize, Clone)]
pub struct Endpoints {
    #[serde(default = "default_ct_url")]
    pub ct_url: String,
    #[serde(default = "default_web_endpoints")]
    pub web: Vec<WebEndpoint>,
}

impl Endpoints {
    pub fn ct_url_for(&self, domain: &str) -> String {
        self.ct_url.replace("{domain}", domain)
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            ct_url: default_ct_url(),
            web: default_web_endpoints(),
        }
    }
}

/// Which discovery channels are enabled
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct SourceToggles {
    #[serde(default = "default_true")]
    pub ct: bool,
    #[serde(default = "default_true")]
    pub web: bool,
    #[serde(default = "default_true")]
    pub zone: bool,
    #[serde(default = "default_true")]
    pub brute: bool,
}

impl SourceToggles {
    pub fn none() -> Self {
        Self { ct: false, web: false, zone: false, brute: false }
    }
}

impl Default for SourceToggles {
    fn default() -> Self {
        Self { ct: true, web: true, zone: true, brute: true }
    }
}

/// Fully resolved configuration for one scan
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub domain: String,
    pub threads: usize,
    /// Per-query timeout (DNS); HTTP calls get twice this
    pub timeout: Duration,
    pub sources: SourceToggles,
    pub wordlist: Option<PathBuf>,
    /// Global scan deadline
    pub deadline: Option<Duration>,
    /// Run CT, Web and Zone concurrently instead of one after the other
    pub parallel_sources: bool,
    pub nameservers: Vec<IpAddr>,
    pub endpoints: Endpoints,
}

impl ScanConfig {
    /// Config with defaults for everything but the domain
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            threads: DEFAULT_THREADS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            sources: SourceToggles::default(),
            wordlist: None,
            deadline: None,
            parallel_sources: false,
            nameservers: default_nameservers(),
            endpoints: Endpoints::default(),
        }
    }

    /// Timeout applied to each HTTP request
    pub fn http_timeout(&self) -> Duration {
        self.timeout * 2
    }

    /// Check the invariants that must hold before any network I/O.
    /// The wordlist itself is opened (and checked) by the scanner.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_domain(&self.domain) {
            return Err(ConfigError::InvalidDomain(self.domain.clone()));
        }
        if self.threads == 0 {
            return Err(ConfigError::InvalidThreads);
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout);
        }
        if self.sources.brute && self.wordlist.is_none() {
            return Err(ConfigError::MissingWordlist);
        }
        Ok(())
    }
}

/// Strip scheme, path, port and case from user input.
/// `https://Example.com/login` becomes `example.com`.
pub fn clean_domain(input: &str) -> String {
    let trimmed = input.trim();
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };
    let host = url::Url::parse(&with_scheme)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string));

    let host = match host {
        Some(h) if !h.is_empty() => h,
        _ => trimmed.to_string(),
    };
    host.trim_end_matches('.').to_ascii_lowercase()
}

/// `^[a-z0-9]+([-.][a-z0-9]+)*\.[a-z]{2,}$`
pub fn is_valid_domain(domain: &str) -> bool {
    if domain.is_empty() || domain.len() > 253 {
        return false;
    }

    let Some((head, tld)) = domain.rsplit_once('.') else {
        return false;
    };

    if tld.len() < 2 || !tld.bytes().all(|b| b.is_ascii_lowercase()) {
        return false;
    }

    // head: alnum runs separated by single '-' or '.'
    let mut prev_sep = true;
    for b in head.bytes() {
        match b {
            b'a'..=b'z' | b'0'..=b'9' => prev_sep = false,
            b'-' | b'.' if !prev_sep => prev_sep = true,
            _ => return false,
        }
    }
    !prev_sep
}

#[derive(Debug, Deserialize, Default)]
pub struct ScanSection {
    #[serde(default)]
    pub threads: Option<usize>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub deadline_secs: Option<u64>,
    #[serde(default)]
    pub parallel_sources: bool,
    #[serde(default)]
    pub wordlist: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct ResolverSection {
    #[serde(default = "default_nameservers")]
    pub nameservers: Vec<IpAddr>,
}

impl Default for ResolverSection {
    fn default() -> Self {
        Self { nameservers: default_nameservers() }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct SourcesSection {
    #[serde(default)]
    pub enabled: SourceToggles,
    #[serde(flatten)]
    pub endpoints: Endpoints,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

/// Optional TOML config file. CLI flags override anything set here.
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub scan: ScanSection,
    #[serde(default)]
    pub resolver: ResolverSection,
    #[serde(default)]
    pub sources: SourcesSection,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    /// Base scan config for `domain` from the file's values
    pub fn scan_config(&self, domain: &str) -> ScanConfig {
        let mut cfg = ScanConfig::new(domain);
        if let Some(threads) = self.scan.threads {
            cfg.threads = threads;
        }
        if let Some(secs) = self.scan.timeout_secs {
            cfg.timeout = Duration::from_secs(secs);
        }
        cfg.deadline = self.scan.deadline_secs.map(Duration::from_secs);
        cfg.parallel_sources = self.scan.parallel_sources;
        cfg.wordlist = self.scan.wordlist.clone();
        cfg.sources = self.sources.enabled;
        cfg.nameservers = self.resolver.nameservers.clone();
        cfg.endpoints = self.sources.endpoints.clone();
        cfg
    }
}
