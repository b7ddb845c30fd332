// src/progress.rs
//! Progress reporting: phase events and live counters
//!
//! Workers only touch atomic counters; observers (progress bar, log lines)
//! are notified synchronously and never influence control flow.

use crate::stats::{ProgressCounters, ProgressSnapshot};
use crate::types::{SourceStats, SourceStatus, SourceTag};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

/// Emit a snapshot every this many completed items
const SNAPSHOT_EVERY: u64 = 50;

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    PhaseStarted(SourceTag),
    PhaseCompleted {
        tag: SourceTag,
        status: SourceStatus,
        found: usize,
    },
    /// A batch of `total` items is about to be processed
    WorkStarted { total: u64 },
    /// A hostname confirmed while work is in flight
    Found(String),
    Snapshot(ProgressSnapshot),
}

/// Receives progress events
pub trait ProgressObserver: Send + Sync {
    fn on_event(&self, event: &ProgressEvent);
}

/// Shared handle given to the orchestrator and the worker pool
#[derive(Clone, Default)]
pub struct ProgressReporter {
    counters: ProgressCounters,
    observers: Vec<Arc<dyn ProgressObserver>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    fn emit(&self, event: ProgressEvent) {
        for observer in &self.observers {
            observer.on_event(&event);
        }
    }

    pub fn phase_started(&self, tag: SourceTag) {
        self.emit(ProgressEvent::PhaseStarted(tag));
    }

    pub fn phase_completed(&self, tag: SourceTag, stats: &SourceStats) {
        self.emit(ProgressEvent::PhaseCompleted {
            tag,
            status: stats.status,
            found: stats.found,
        });
    }

    pub fn begin_work(&self, total: u64) {
        self.counters.reset(total);
        self.emit(ProgressEvent::WorkStarted { total });
    }

    /// Record one finished item; `found` is the hostname if it resolved
    pub fn item_done(&self, found: Option<&str>) {
        if let Some(name) = found {
            self.counters.increment_found();
            self.emit(ProgressEvent::Found(name.to_string()));
        }

        let done = self.counters.increment_done();
        let total = self.counters.snapshot().total;
        if done % SNAPSHOT_EVERY == 0 || done == total {
            self.emit_snapshot();
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.counters.snapshot()
    }

    pub fn emit_snapshot(&self) {
        self.emit(ProgressEvent::Snapshot(self.snapshot()));
    }

    /// Emit a snapshot every `every` until the returned handle is aborted
    pub fn spawn_ticker(&self, every: Duration) -> JoinHandle<()> {
        let reporter = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.tick().await;
            loop {
                interval.tick().await;
                reporter.emit_snapshot();
            }
        })
    }
}

/// Writes progress to the tracing log
pub struct LogObserver;

impl ProgressObserver for LogObserver {
    fn on_event(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::PhaseStarted(tag) => info!("Phase started: {}", tag.label()),
            ProgressEvent::PhaseCompleted { tag, status, found } => {
                info!("Phase complete: {} ({:?}, {} found)", tag.label(), status, found)
            }
            ProgressEvent::WorkStarted { total } => info!("Loaded {} entries", total),
            ProgressEvent::Found(name) => info!("[FOUND] {}", name),
            ProgressEvent::Snapshot(s) => info!(
                "Progress: {:.1}% ({}/{}) | {} found | {}",
                s.percentage(),
                s.done,
                s.total,
                s.found,
                ProgressCounters::format_elapsed(s.elapsed_secs)
            ),
        }
    }
}

/// indicatif spinner for passive phases, bar for brute-force
pub struct BarObserver {
    bar: ProgressBar,
}

impl BarObserver {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(spinner_style());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for BarObserver {
    fn default() -> Self {
        Self::new()
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.yellow}] {percent:>3}% ({pos}/{len}) {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█░ ")
}

impl ProgressObserver for BarObserver {
    fn on_event(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::PhaseStarted(tag) => {
                self.bar.set_style(spinner_style());
                self.bar.set_message(format!("{}...", tag.label()));
            }
            ProgressEvent::PhaseCompleted { tag, found, .. } => {
                self.bar
                    .println(format!("[*] {}: {} subdomains", tag.label(), found));
            }
            ProgressEvent::WorkStarted { total } => {
                self.bar.set_style(bar_style());
                self.bar.set_length(*total);
                self.bar.set_position(0);
                self.bar.set_message("");
            }
            ProgressEvent::Found(name) => self.bar.println(format!("[FOUND] {}", name)),
            ProgressEvent::Snapshot(s) => {
                self.bar.set_position(s.done);
                self.bar.set_message(format!("{} found", s.found));
            }
        }
    }
}

impl Drop for BarObserver {
    fn drop(&mut self) {
        self.finish();
    }
}
