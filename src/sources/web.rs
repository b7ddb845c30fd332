// src/sources/web.rs
//! Public DNS aggregators (HackerTarget, BufferOver, ...)
//!
//! Endpoints are queried concurrently. Hostnames are scraped out of whatever
//! the endpoint returns, so the format of each API does not matter.

use super::{ScanContext, Source};
use crate::config::WebEndpoint;
use crate::http::HttpFetch;
use crate::normalize::normalize;
use crate::types::{Candidate, Discovery, SourceOutcome, SourceTag};
use async_trait::async_trait;
use futures_util::future::join_all;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct WebSearchSource {
    http: Arc<dyn HttpFetch>,
}

impl WebSearchSource {
    pub fn new(http: Arc<dyn HttpFetch>) -> Self {
        Self { http }
    }

    async fn query(
        &self,
        endpoint: &WebEndpoint,
        ctx: &ScanContext,
        pattern: &Regex,
    ) -> Result<Vec<String>, String> {
        let url = endpoint.url_for(ctx.domain());
        debug!("Querying {}: {}", endpoint.name, url);

        let response = self
            .http
            .get(&url, ctx.config.http_timeout())
            .await
            .map_err(|e| format!("{}: {}", endpoint.name, e))?;

        if !response.is_success() {
            return Err(format!("{}: HTTP {}", endpoint.name, response.status));
        }

        let names = extract_hostnames(pattern, &response.body, ctx.domain());
        debug!("{} returned {} names", endpoint.name, names.len());
        Ok(names)
    }
}

/// Matches whole hostname-shaped tokens in free text. A token is never cut
/// short, so `a.example.com.evil.net` stays one token.
pub fn hostname_pattern() -> Result<Regex, regex::Error> {
    Regex::new(r"[A-Za-z0-9*_][A-Za-z0-9*_.-]*")
}

/// Tokens that are proper subdomains of `domain`, as they appeared in `body`
fn extract_hostnames(pattern: &Regex, body: &str, domain: &str) -> Vec<String> {
    pattern
        .find_iter(body)
        .map(|m| m.as_str())
        .filter(|token| {
            normalize(token, domain).is_some_and(|name| name.as_str() != domain)
        })
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl Source for WebSearchSource {
    fn tag(&self) -> SourceTag {
        SourceTag::WebSearch
    }

    async fn discover(&self, ctx: &ScanContext) -> Discovery {
        let endpoints = &ctx.config.endpoints.web;
        if endpoints.is_empty() {
            return Discovery::new(SourceOutcome::Empty);
        }

        let pattern = match hostname_pattern() {
            Ok(p) => p,
            Err(e) => return Discovery::failed(format!("bad hostname pattern: {}", e)),
        };

        let results = join_all(
            endpoints
                .iter()
                .map(|endpoint| self.query(endpoint, ctx, &pattern)),
        )
        .await;

        let mut names = BTreeSet::new();
        let mut warnings = Vec::new();
        for result in results {
            match result {
                Ok(found) => names.extend(found),
                Err(e) => {
                    warn!("Web aggregator failed: {}", e);
                    warnings.push(e);
                }
            }
        }

        if warnings.len() == endpoints.len() {
            return Discovery::failed(warnings.join("; ")).with_warnings(warnings);
        }

        Discovery::from_candidates(
            names
                .into_iter()
                .map(|n| Candidate::new(n, SourceTag::WebSearch))
                .collect(),
        )
        .with_warnings(warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanConfig;
    use crate::http::{HttpResponse, TransportError};
    use crate::progress::ProgressReporter;
    use std::collections::HashMap;
    use std::time::Duration;
    use tokio::sync::watch;

    /// Canned responses keyed by URL; unknown URLs fail at transport level
    struct FakeHttp {
        responses: HashMap<String, (u16, String)>,
    }

    #[async_trait]
    impl HttpFetch for FakeHttp {
        async fn get(&self, url: &str, _timeout: Duration) -> Result<HttpResponse, TransportError> {
            match self.responses.get(url) {
                Some((status, body)) => Ok(HttpResponse {
                    status: *status,
                    body: body.clone(),
                }),
                None => Err(TransportError::Request("connection refused".into())),
            }
        }
    }

    fn context() -> ScanContext {
        let mut config = ScanConfig::new("example.com");
        config.endpoints.web = vec![
            WebEndpoint {
                name: "alpha".into(),
                url: "http://alpha/?q={domain}".into(),
            },
            WebEndpoint {
                name: "beta".into(),
                url: "http://beta/?q={domain}".into(),
            },
        ];
        let (_tx, rx) = watch::channel(false);
        ScanContext::new(config, rx, ProgressReporter::new())
    }

    fn fake(entries: &[(&str, u16, &str)]) -> Arc<FakeHttp> {
        Arc::new(FakeHttp {
            responses: entries
                .iter()
                .map(|(u, s, b)| (u.to_string(), (*s, b.to_string())))
                .collect(),
        })
    }

    #[test]
    fn test_pattern_extracts_from_free_text() {
        let pattern = hostname_pattern().unwrap();
        let body = "www.example.com,1.2.3.4\nAPI.Example.COM,5.6.7.8\nexample.com,9.9.9.9\nfoo.example.community";

        let names = extract_hostnames(&pattern, body, "example.com");
        assert_eq!(names, vec!["www.example.com", "API.Example.COM"]);
    }

    #[test]
    fn test_pattern_escapes_domain_dots() {
        let pattern = hostname_pattern().unwrap();
        assert!(extract_hostnames(&pattern, "www.exampleXcom", "example.com").is_empty());
    }

    #[test]
    fn test_foreign_host_with_target_prefix_rejected() {
        let pattern = hostname_pattern().unwrap();
        let body = "secret.example.com.evil.net,6.6.6.6\nx.example.com-cdn.net\nok.example.com,1.1.1.1";

        let names = extract_hostnames(&pattern, body, "example.com");
        assert_eq!(names, vec!["ok.example.com"]);
    }

    #[tokio::test]
    async fn test_foreign_hosts_never_reach_the_report() {
        let http = fake(&[
            ("http://alpha/?q=example.com", 200, "secret.example.com.evil.net,6.6.6.6"),
            ("http://beta/?q=example.com", 200, r#"{"FDNS_A":["6.6.6.6,x.example.com.evil.net"]}"#),
        ]);

        let discovery = WebSearchSource::new(http).discover(&context()).await;
        assert!(matches!(discovery.outcome, SourceOutcome::Empty));

        let aggregator = crate::aggregator::Aggregator::new("example.com");
        let admitted = aggregator
            .admit(discovery.candidates(), SourceTag::WebSearch)
            .await;
        assert_eq!(admitted, 0);
        assert!(aggregator.is_empty().await);
    }

    #[tokio::test]
    async fn test_union_of_endpoints() {
        let http = fake(&[
            ("http://alpha/?q=example.com", 200, "www.example.com,1.1.1.1\nmail.example.com,2.2.2.2"),
            ("http://beta/?q=example.com", 200, r#"{"FDNS_A":["3.3.3.3,www.example.com","4.4.4.4,vpn.example.com"]}"#),
        ]);

        let discovery = WebSearchSource::new(http).discover(&context()).await;

        let raw: Vec<&str> = discovery.candidates().iter().map(|c| c.raw.as_str()).collect();
        assert_eq!(raw, vec!["mail.example.com", "vpn.example.com", "www.example.com"]);
        assert!(discovery.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_one_failing_endpoint_is_a_warning() {
        let http = fake(&[("http://alpha/?q=example.com", 200, "admin.example.com,1.1.1.1")]);

        let discovery = WebSearchSource::new(http).discover(&context()).await;

        assert_eq!(discovery.candidates().len(), 1);
        assert_eq!(discovery.warnings.len(), 1);
        assert!(discovery.warnings[0].starts_with("beta"));
    }

    #[tokio::test]
    async fn test_all_endpoints_failing_is_failed() {
        let http = fake(&[("http://alpha/?q=example.com", 500, "")]);

        let discovery = WebSearchSource::new(http).discover(&context()).await;

        assert!(matches!(discovery.outcome, SourceOutcome::Failed(_)));
        assert_eq!(discovery.warnings.len(), 2);
    }

    #[tokio::test]
    async fn test_no_matches_is_empty() {
        let http = fake(&[
            ("http://alpha/?q=example.com", 200, "error check your search parameter"),
            ("http://beta/?q=example.com", 200, "{}"),
        ]);

        let discovery = WebSearchSource::new(http).discover(&context()).await;
        assert!(matches!(discovery.outcome, SourceOutcome::Empty));
    }
}
