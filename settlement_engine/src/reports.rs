use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, Utc};
use msr_common::Centavos;

use crate::db_types::LedgerRecord;

/// Aggregate figures over one reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodSummary {
    pub units: usize,
    pub gross: Centavos,
    pub net: Centavos,
}

impl PeriodSummary {
    /// Everything deducted between gross and net (marketplace fees, shipping, tax).
    pub fn cost(&self) -> Centavos {
        self.gross - self.net
    }

    /// Cost as a percentage of gross, 0 when nothing was sold for money.
    pub fn cost_percentage(&self) -> f64 {
        if self.gross.is_zero() {
            0.0
        } else {
            self.cost().value() as f64 / self.gross.value() as f64 * 100.0
        }
    }
}

/// `None` for an empty window, so callers can suppress the report instead of sending a page of zeroes.
pub fn summarize(records: &[LedgerRecord]) -> Option<PeriodSummary> {
    if records.is_empty() {
        return None;
    }
    let gross = records.iter().map(|r| r.gross).sum();
    let net = records.iter().map(|r| r.net).sum();
    Some(PeriodSummary { units: records.len(), gross, net })
}

/// The current UTC calendar day as a half-open window.
pub fn day_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    let end = start + Days::new(1);
    (start, end)
}

/// The current UTC calendar month as a half-open window.
pub fn month_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let date = now.date_naive();
    let first = NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date);
    let start = first.and_time(NaiveTime::MIN).and_utc();
    // stepping 32 days from the 1st always lands in the next month
    let next_month = first + Days::new(32);
    let end = NaiveDate::from_ymd_opt(next_month.year(), next_month.month(), 1)
        .unwrap_or(next_month)
        .and_time(NaiveTime::MIN)
        .and_utc();
    (start, end)
}

pub fn is_last_day_of_month(now: DateTime<Utc>) -> bool {
    now.date_naive().succ_opt().map(|next| next.day() == 1).unwrap_or(false)
}
