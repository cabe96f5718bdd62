//! Core domain of the fare tracker.
//!
//! Holds the observation/history model and its derived statistics, the
//! per-domain error enums, and the ports (`FareFetcher`, `HistoryStore`,
//! `Reporter`) that the adapter crates implement.

pub mod common;
pub mod config;
pub mod fetch;
pub mod history;
pub mod report;
