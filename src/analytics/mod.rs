//! Analytics Module
//!
//! The business computations the cache layer wraps. The cache treats them
//! as opaque functions: [`Analytics`] is the seam, [`StandardAnalytics`] the
//! default implementation and [`CachedAnalytics`] the cached front used by
//! request handlers and the warming service.

mod cached;

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::Serialize;
use tracing::warn;

use crate::models::{Dataset, DateRange, Reservation};

pub use cached::CachedAnalytics;

// == Result Types ==
/// Revenue attributed to one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub revenue: f64,
}

/// Revenue timeline over a date range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueTimeline {
    pub range: DateRange,
    pub points: Vec<DailyRevenue>,
    pub total_revenue: f64,
}

/// Revenue accumulated by one property.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyRevenue {
    pub property_id: i64,
    pub property_name: String,
    pub revenue: f64,
    pub nights: i64,
    pub reservations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyRevenueSummary {
    pub range: DateRange,
    pub properties: Vec<PropertyRevenue>,
    pub total_revenue: f64,
}

/// Estimated income lost to one maintenance block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LostIncome {
    pub maintenance_id: i64,
    pub property_id: i64,
    pub property_name: String,
    pub blocked_days: i64,
    pub average_daily_rate: f64,
    pub lost_income: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LostIncomeSummary {
    pub range: DateRange,
    pub blocks: Vec<LostIncome>,
    pub total_lost_income: f64,
    pub total_blocked_days: i64,
}

// == Analytics Trait ==
/// Business computations over a loaded dataset.
///
/// Implementations must be deterministic for a given dataset and range;
/// the cache relies on recomputation being idempotent.
pub trait Analytics: Send + Sync {
    /// Revenue per day, sorted by date.
    fn daily_revenue(&self, data: &Dataset, range: &DateRange) -> anyhow::Result<Vec<DailyRevenue>>;

    /// Revenue per property, sorted by property id.
    fn property_revenue(
        &self,
        data: &Dataset,
        range: &DateRange,
    ) -> anyhow::Result<Vec<PropertyRevenue>>;

    /// Income lost to maintenance blocks overlapping the range.
    fn lost_income(&self, data: &Dataset, range: &DateRange) -> anyhow::Result<LostIncomeSummary>;
}

// == Standard Analytics ==
/// Revenue prorated evenly over stay nights; lost income valued at the
/// property's historical average daily rate.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardAnalytics;

impl Analytics for StandardAnalytics {
    fn daily_revenue(&self, data: &Dataset, range: &DateRange) -> anyhow::Result<Vec<DailyRevenue>> {
        let mut days: BTreeMap<NaiveDate, f64> = BTreeMap::new();

        for reservation in &data.reservations {
            for (date, amount) in prorate(reservation) {
                if range.contains(date) {
                    *days.entry(date).or_insert(0.0) += amount;
                }
            }
        }

        Ok(days
            .into_iter()
            .map(|(date, revenue)| DailyRevenue { date, revenue })
            .collect())
    }

    fn property_revenue(
        &self,
        data: &Dataset,
        range: &DateRange,
    ) -> anyhow::Result<Vec<PropertyRevenue>> {
        let mut by_property: BTreeMap<i64, PropertyRevenue> = BTreeMap::new();

        for reservation in &data.reservations {
            let in_range: Vec<f64> = prorate(reservation)
                .filter(|(date, _)| range.contains(*date))
                .map(|(_, amount)| amount)
                .collect();
            if in_range.is_empty() {
                continue;
            }

            let acc = by_property
                .entry(reservation.property_id)
                .or_insert_with(|| PropertyRevenue {
                    property_id: reservation.property_id,
                    property_name: reservation.property_name.clone(),
                    revenue: 0.0,
                    nights: 0,
                    reservations: 0,
                });
            acc.revenue += in_range.iter().sum::<f64>();
            acc.nights += in_range.len() as i64;
            acc.reservations += 1;
        }

        Ok(by_property.into_values().collect())
    }

    fn lost_income(&self, data: &Dataset, range: &DateRange) -> anyhow::Result<LostIncomeSummary> {
        let portfolio_rate = average_daily_rate(data.reservations.iter());

        let blocks: Vec<LostIncome> = data
            .maintenance_blocks
            .iter()
            .filter(|block| range.overlaps(block.start_date, block.end_date))
            .map(|block| {
                // Stays overlapping the block itself are left out of the rate
                let history = data.reservations.iter().filter(|r| {
                    r.property_id == block.property_id
                        && (r.check_out <= block.start_date || r.check_in >= block.end_date)
                });
                let mut rate = average_daily_rate(history);
                if rate == 0.0 {
                    rate = portfolio_rate;
                }

                LostIncome {
                    maintenance_id: block.maintenance_id,
                    property_id: block.property_id,
                    property_name: block.property_name.clone(),
                    blocked_days: block.blocked_days,
                    average_daily_rate: rate,
                    lost_income: rate * block.blocked_days as f64,
                }
            })
            .collect();

        Ok(LostIncomeSummary {
            range: *range,
            total_lost_income: blocks.iter().map(|b| b.lost_income).sum(),
            total_blocked_days: blocks.iter().map(|b| b.blocked_days).sum(),
            blocks,
        })
    }
}

/// Splits a reservation's revenue evenly across its stay nights. Same-day
/// stays put everything on the check-in date.
fn prorate(reservation: &Reservation) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
    let nights = if reservation.check_out < reservation.check_in {
        warn!(
            reservation_id = reservation.reservation_id,
            "Check-out precedes check-in, skipping reservation"
        );
        0
    } else {
        reservation.nights()
    };
    let nightly = if nights > 0 {
        reservation.reservation_revenue / nights as f64
    } else {
        0.0
    };

    (0..nights as u64).filter_map(move |offset| {
        reservation
            .check_in
            .checked_add_days(Days::new(offset))
            .map(|date| (date, nightly))
    })
}

fn average_daily_rate<'a>(reservations: impl Iterator<Item = &'a Reservation>) -> f64 {
    let (revenue, nights) = reservations
        .filter(|r| r.check_out >= r.check_in)
        .fold((0.0, 0i64), |(revenue, nights), r| {
            (revenue + r.reservation_revenue, nights + r.nights())
        });

    if nights > 0 {
        revenue / nights as f64
    } else {
        0.0
    }
}
