// src/stats.rs
//! Lock-free progress counters shared by pool workers

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Thread-safe counters for the work currently in flight
#[derive(Clone)]
pub struct ProgressCounters {
    done: Arc<AtomicU64>,
    total: Arc<AtomicU64>,
    found: Arc<AtomicU64>,
    start_time: Instant,
}

/// Progress at a point in time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    pub done: u64,
    pub total: u64,
    pub found: u64,
    pub elapsed_secs: u64,
}

impl ProgressSnapshot {
    /// 0.0 - 100.0; 100 when there is nothing to do
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            (self.done as f64 / self.total as f64) * 100.0
        }
    }

    pub fn is_finished(&self) -> bool {
        self.done >= self.total
    }
}

impl ProgressCounters {
    pub fn new() -> Self {
        Self {
            done: Arc::new(AtomicU64::new(0)),
            total: Arc::new(AtomicU64::new(0)),
            found: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }

    /// Start a new unit of work of `total` items
    pub fn reset(&self, total: u64) {
        self.done.store(0, Ordering::Relaxed);
        self.found.store(0, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
    }

    /// Record one completed item; returns the new done count
    pub fn increment_done(&self) -> u64 {
        self.done.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn increment_found(&self) {
        self.found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            done: self.done.load(Ordering::Relaxed),
            total: self.total.load(Ordering::Relaxed),
            found: self.found.load(Ordering::Relaxed),
            elapsed_secs: self.start_time.elapsed().as_secs(),
        }
    }

    /// Format a duration in seconds
    pub fn format_elapsed(secs: u64) -> String {
        let hours = secs / 3600;
        let minutes = (secs % 3600) / 60;
        let seconds = secs % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}

impl Default for ProgressCounters {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_new() {
        let counters = ProgressCounters::new();
        let snapshot = counters.snapshot();

        assert_eq!(snapshot.done, 0);
        assert_eq!(snapshot.total, 0);
        assert_eq!(snapshot.found, 0);
        assert_eq!(snapshot.percentage(), 100.0);
    }

    #[test]
    fn test_increment_and_percentage() {
        let counters = ProgressCounters::new();
        counters.reset(4);

        assert_eq!(counters.increment_done(), 1);
        counters.increment_found();

        let snapshot = counters.snapshot();
        assert_eq!(snapshot.done, 1);
        assert_eq!(snapshot.found, 1);
        assert_eq!(snapshot.percentage(), 25.0);
        assert!(!snapshot.is_finished());
    }

    #[test]
    fn test_reset_clears_previous_work() {
        let counters = ProgressCounters::new();
        counters.reset(2);
        counters.increment_done();
        counters.increment_found();

        counters.reset(10);
        let snapshot = counters.snapshot();
        assert_eq!(snapshot.done, 0);
        assert_eq!(snapshot.found, 0);
        assert_eq!(snapshot.total, 10);
    }

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        let counters = ProgressCounters::new();
        counters.reset(8000);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let c = counters.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        c.increment_done();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let snapshot = counters.snapshot();
        assert_eq!(snapshot.done, 8000);
        assert!(snapshot.is_finished());
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(ProgressCounters::format_elapsed(30), "30s");
        assert_eq!(ProgressCounters::format_elapsed(90), "1m 30s");
        assert_eq!(ProgressCounters::format_elapsed(3661), "1h 1m 1s");
    }
}
