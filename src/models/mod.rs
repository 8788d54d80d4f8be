//! Dataset models for the short-term-rental analytics backend
//!
//! Records deserialized from the backing JSON file plus the date filter
//! shared by every analytics query.

pub mod dataset;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use dataset::{load_and_validate, DatasetSummary};

/// A rental property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub property_id: i64,
    pub property_name: String,
    pub reviews_count: i64,
    pub average_review_score: f64,
}

/// A guest reservation. `check_out` is exclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub reservation_id: i64,
    pub property_id: i64,
    pub property_name: String,
    pub guest_name: String,
    pub reservation_date: NaiveDate,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub reservation_revenue: f64,
}

impl Reservation {
    /// Nights stayed; same-day stays count as one night.
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days().max(1)
    }
}

/// A guest review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub review_id: i64,
    pub property_id: i64,
    pub property_name: String,
    pub review_date: NaiveDate,
    pub rating: f64,
}

/// A period during which a property could not be booked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceBlock {
    pub maintenance_id: i64,
    pub property_id: i64,
    pub property_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub blocked_days: i64,
}

/// The complete backing dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub properties: Vec<Property>,
    pub reservations: Vec<Reservation>,
    pub reviews: Vec<Review>,
    pub maintenance_blocks: Vec<MaintenanceBlock>,
}

// == Date Range ==
/// Inclusive date filter; a missing bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// No filter at all.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |start| date >= start) && self.end.map_or(true, |end| date <= end)
    }

    /// Whether `[first, last]` shares at least one day with the range.
    pub fn overlaps(&self, first: NaiveDate, last: NaiveDate) -> bool {
        self.start.map_or(true, |start| last >= start) && self.end.map_or(true, |end| first <= end)
    }
}
