// src/lib.rs
// Library interface for subhunter
pub mod aggregator;
pub mod cli;
pub mod config;
pub mod dns;
pub mod error;
pub mod http;
pub mod normalize;
pub mod output;
pub mod pool;
pub mod progress;
pub mod scanner;
pub mod sources;
pub mod stats;
pub mod types;
pub mod wordlist;

pub use scanner::{CancelHandle, Scanner, run_scan};
