//! Named date windows warmed ahead of traffic.

use chrono::{Datelike, Days, NaiveDate};

use crate::models::DateRange;

/// A date window with the name it is reported under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamedRange {
    pub name: &'static str,
    pub range: DateRange,
}

/// Rolling 30-day window ending today.
pub fn last_30_days(today: NaiveDate) -> DateRange {
    DateRange::new(today - Days::new(30), today)
}

/// The windows users ask for most, relative to `today`.
pub fn common_date_ranges(today: NaiveDate) -> Vec<NamedRange> {
    let month_start = first_of_month(today);
    let previous_month_end = month_start - Days::new(1);
    let previous_month_start = first_of_month(previous_month_end);

    vec![
        NamedRange {
            name: "last_7_days",
            range: DateRange::new(today - Days::new(7), today),
        },
        NamedRange {
            name: "last_30_days",
            range: last_30_days(today),
        },
        NamedRange {
            name: "last_90_days",
            range: DateRange::new(today - Days::new(90), today),
        },
        NamedRange {
            name: "current_month",
            range: DateRange::new(month_start, today),
        },
        NamedRange {
            name: "previous_month",
            range: DateRange::new(previous_month_start, previous_month_end),
        },
    ]
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.day0()))
}
