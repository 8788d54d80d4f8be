//! Cache Warming Module
//!
//! Proactively fills the caches with the queries users ask for most.
//!
//! # Stages
//! - Data: load the backing file through the data cache
//! - Queries: revenue timeline, property revenue and lost income for the
//!   last 30 days and for the full dataset
//! - Date ranges: the same three for each common window

mod ranges;
mod service;

pub use ranges::{common_date_ranges, last_30_days, NamedRange};
pub use service::{DataLoader, WarmingOutcome, WarmingReport, WarmingService, WarmingStatus};
