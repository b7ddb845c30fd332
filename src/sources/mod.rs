// src/sources/mod.rs
//! Discovery sources
//!
//! Every source turns one discovery channel into a [`Discovery`]. Sources
//! never return errors: transport problems, refusals and bad payloads are
//! reported through [`SourceOutcome`](crate::types::SourceOutcome) so one dead
//! channel cannot sink the scan.

pub mod brute;
pub mod crtsh;
pub mod web;
pub mod zone;

pub use brute::BruteForceSource;
pub use crtsh::CrtShSource;
pub use web::WebSearchSource;
pub use zone::ZoneTransferSource;

use crate::config::ScanConfig;
use crate::progress::ProgressReporter;
use crate::types::{Discovery, SourceTag};
use async_trait::async_trait;
use tokio::sync::watch;

/// Everything a source needs from the running scan
#[derive(Clone)]
pub struct ScanContext {
    pub config: ScanConfig,
    pub cancel: watch::Receiver<bool>,
    pub progress: ProgressReporter,
}

impl ScanContext {
    pub fn new(config: ScanConfig, cancel: watch::Receiver<bool>, progress: ProgressReporter) -> Self {
        Self {
            config,
            cancel,
            progress,
        }
    }

    pub fn domain(&self) -> &str {
        &self.config.domain
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }
}

#[async_trait]
pub trait Source: Send + Sync {
    fn tag(&self) -> SourceTag;

    async fn discover(&self, ctx: &ScanContext) -> Discovery;
}
