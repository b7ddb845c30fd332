// src/sources/crtsh.rs
//! Certificate transparency search via crt.sh

use super::{ScanContext, Source};
use crate::http::HttpFetch;
use crate::types::{Candidate, Discovery, SourceTag};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// One row of the crt.sh JSON output. Only the name fields matter.
#[derive(Debug, Deserialize)]
struct CrtShEntry {
    #[serde(default)]
    name_value: Option<String>,
    #[serde(default)]
    common_name: Option<String>,
}

pub struct CrtShSource {
    http: Arc<dyn HttpFetch>,
}

impl CrtShSource {
    pub fn new(http: Arc<dyn HttpFetch>) -> Self {
        Self { http }
    }
}

/// Raw names from a crt.sh body; `name_value` holds one SAN per line
fn parse_entries(body: &str) -> Result<Vec<String>, serde_json::Error> {
    let entries: Vec<CrtShEntry> = serde_json::from_str(body)?;

    let mut names = Vec::new();
    for entry in entries {
        if let Some(value) = entry.name_value {
            names.extend(
                value
                    .split('\n')
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map(str::to_string),
            );
        }
        if let Some(cn) = entry.common_name {
            if !cn.trim().is_empty() {
                names.push(cn.trim().to_string());
            }
        }
    }
    Ok(names)
}

#[async_trait]
impl Source for CrtShSource {
    fn tag(&self) -> SourceTag {
        SourceTag::CtLogs
    }

    async fn discover(&self, ctx: &ScanContext) -> Discovery {
        let url = ctx.config.endpoints.ct_url_for(ctx.domain());
        debug!("Querying certificate logs: {}", url);

        let response = match self.http.get(&url, ctx.config.http_timeout()).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Certificate log query failed: {}", e);
                return Discovery::failed(e.to_string());
            }
        };

        if !response.is_success() {
            warn!("crt.sh returned HTTP {}", response.status);
            return Discovery::failed(format!("HTTP {}", response.status));
        }

        match parse_entries(&response.body) {
            Ok(names) => {
                debug!("crt.sh returned {} names", names.len());
                Discovery::from_candidates(
                    names
                        .into_iter()
                        .map(|n| Candidate::new(n, SourceTag::CtLogs))
                        .collect(),
                )
            }
            Err(e) => {
                warn!("crt.sh returned an unparsable body: {}", e);
                Discovery::failed(format!("invalid JSON from crt.sh: {}", e))
            }
        }
    }
}
