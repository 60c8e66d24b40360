use std::time::Duration as StdDuration;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use log::*;
use settlement_engine::{
    reports::{day_window, is_last_day_of_month, month_window, summarize},
    traits::LedgerManagement,
    JsonLedger,
};
use tokio::task::JoinHandle;

use crate::{
    messages,
    notifier::{Notifier, TelegramNotifier},
};

const SCHEDULE_TICK: StdDuration = StdDuration::from_secs(60);

/// Wall-clock scheduler for the daily and monthly sales reports. Each trigger fires at most once per calendar
/// day; the monthly trigger additionally requires the run date to be the last day of its month.
pub struct ReportWorker<TL, TN> {
    ledger: TL,
    notifier: TN,
    daily_at: NaiveTime,
    monthly_at: NaiveTime,
    last_daily: Option<NaiveDate>,
    last_monthly: Option<NaiveDate>,
}

impl<TL, TN> ReportWorker<TL, TN>
where
    TL: LedgerManagement,
    TN: Notifier,
{
    pub fn new(ledger: TL, notifier: TN, daily_at: NaiveTime, monthly_at: NaiveTime) -> Self {
        Self { ledger, notifier, daily_at, monthly_at, last_daily: None, last_monthly: None }
    }

    pub async fn run(mut self) {
        let mut timer = tokio::time::interval(SCHEDULE_TICK);
        info!(
            "📊️ Report scheduler started. Daily report at {} UTC, monthly check at {} UTC.",
            self.daily_at, self.monthly_at
        );
        loop {
            timer.tick().await;
            self.tick(Utc::now()).await;
        }
    }

    /// The monthly check runs first so that on month end the consolidated report lands before the daily one.
    pub async fn tick(&mut self, now: DateTime<Utc>) {
        if due(now, self.monthly_at, self.last_monthly) {
            self.last_monthly = Some(now.date_naive());
            if is_last_day_of_month(now) {
                self.send_monthly(now).await;
            } else {
                debug!("📊️ Not the last day of the month. No monthly report due.");
            }
        }
        if due(now, self.daily_at, self.last_daily) {
            self.last_daily = Some(now.date_naive());
            self.send_daily(now).await;
        }
    }

    async fn send_daily(&self, now: DateTime<Utc>) {
        let (start, end) = day_window(now);
        let records = match self.ledger.records_between(start, end).await {
            Ok(records) => records,
            Err(e) => {
                error!("📊️ Could not read the ledger for the daily report: {e}");
                return;
            },
        };
        match summarize(&records) {
            Some(summary) => {
                info!("📊️ Sending the daily report: {} unit(s) sold.", summary.units);
                self.notifier.broadcast(&messages::daily_report(now, &summary)).await;
            },
            None => info!("📊️ No sales recorded today. Daily report suppressed."),
        }
    }

    async fn send_monthly(&self, now: DateTime<Utc>) {
        let (start, end) = month_window(now);
        let records = match self.ledger.records_between(start, end).await {
            Ok(records) => records,
            Err(e) => {
                error!("📊️ Could not read the ledger for the monthly report: {e}");
                return;
            },
        };
        match summarize(&records) {
            Some(summary) => {
                info!("📊️ Sending the monthly report: {} unit(s) sold.", summary.units);
                self.notifier.broadcast(&messages::monthly_report(now, &summary)).await;
            },
            None => info!("📊️ No sales recorded this month. Monthly report suppressed."),
        }
    }
}

fn due(now: DateTime<Utc>, fire_at: NaiveTime, last_fired: Option<NaiveDate>) -> bool {
    now.time() >= fire_at && last_fired != Some(now.date_naive())
}

/// Starts the report scheduler. Do not await the returned JoinHandle, as it will run indefinitely.
pub fn start_report_worker(worker: ReportWorker<JsonLedger, TelegramNotifier>) -> JoinHandle<()> {
    tokio::spawn(async move { worker.run().await })
}
