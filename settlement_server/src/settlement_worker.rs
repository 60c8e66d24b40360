use std::{collections::HashMap, sync::Arc, time::Duration as StdDuration};

use chrono::{DateTime, Duration, Utc};
use log::*;
use meli_tools::{MeliApi, MeliApiError, ShipmentCosts};
use settlement_engine::{
    db_types::{LedgerRecord, QueueEntry},
    retry::{retry, RetryPolicy},
    settlement::compute_settlement,
    traits::{LedgerManagement, QueueManagement, StorageError},
    JsonLedger,
    JsonQueue,
    ProcessedOrders,
};
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::{
    accounts::MarketplaceAccounts,
    config::{SellerProfile, ServerConfig},
    integrations::meli::{settlement_input_from_order, MarketplaceApi},
    messages,
    notifier::{Notifier, TelegramNotifier},
};

/// A freshly approved order can take a short while to become visible on the orders endpoint, so "not found" is
/// retried a few times before the entry is given up on.
const ORDER_FETCH_ATTEMPTS: u32 = 3;
const ORDER_FETCH_RETRY_DELAY: StdDuration = StdDuration::from_secs(15);

#[derive(Debug, Error)]
pub enum SettleError {
    #[error("Seller {0} is no longer managed by this deployment")]
    UnmanagedSeller(u64),
    #[error("Marketplace error: {0}")]
    Marketplace(#[from] MeliApiError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleOutcome {
    Settled,
    /// The entry was consumed without producing a ledger record (duplicate, stale, or missing data).
    Skipped,
}

#[derive(Debug, Clone, Copy)]
pub struct WorkerSettings {
    /// Orders created before this instant are discarded unsettled. Captured once at process start, so a
    /// redeploy never reprocesses history.
    pub cutoff: DateTime<Utc>,
    pub maturation_window: Duration,
    pub poll_interval: StdDuration,
    pub retry_policy: RetryPolicy,
}

impl WorkerSettings {
    pub fn from_config(config: &ServerConfig, cutoff: DateTime<Utc>) -> Self {
        Self {
            cutoff,
            maturation_window: config.maturation_window,
            poll_interval: config.poll_interval,
            retry_policy: RetryPolicy::new(ORDER_FETCH_ATTEMPTS, ORDER_FETCH_RETRY_DELAY),
        }
    }
}

/// The consumer half of the pipeline: pops mature queue entries, fetches order and fee detail, computes the net
/// value, appends the ledger record and pushes the sale alert. One entry's failure never stops the loop.
pub struct SettlementWorker<TM, TQ, TL, TN> {
    accounts: Arc<MarketplaceAccounts<TM>>,
    queue: TQ,
    ledger: TL,
    notifier: TN,
    processed: Arc<ProcessedOrders>,
    profiles: HashMap<u64, SellerProfile>,
    settings: WorkerSettings,
}

impl<TM, TQ, TL, TN> SettlementWorker<TM, TQ, TL, TN>
where
    TM: MarketplaceApi,
    TQ: QueueManagement,
    TL: LedgerManagement,
    TN: Notifier,
{
    pub fn new(
        accounts: Arc<MarketplaceAccounts<TM>>,
        queue: TQ,
        ledger: TL,
        notifier: TN,
        processed: Arc<ProcessedOrders>,
        profiles: HashMap<u64, SellerProfile>,
        settings: WorkerSettings,
    ) -> Self {
        Self { accounts, queue, ledger, notifier, processed, profiles, settings }
    }

    pub async fn run(self) {
        let mut timer = tokio::time::interval(self.settings.poll_interval);
        info!(
            "💰️ Settlement worker started. Maturation window is {} s; orders created before {} are ignored.",
            self.settings.maturation_window.num_seconds(),
            self.settings.cutoff
        );
        loop {
            timer.tick().await;
            if let Err(e) = self.drain_mature_entries().await {
                error!("💰️ Could not read the command queue: {e}");
            }
        }
    }

    /// Consumes every consecutively mature head entry, then yields until the next poll. An immature head blocks
    /// the entries behind it; since all entries share the same window and the queue is age-ordered, nothing
    /// younger can be mature either.
    pub async fn drain_mature_entries(&self) -> Result<usize, StorageError> {
        let mut settled = 0;
        loop {
            let now = Utc::now();
            let Some(head) = self.queue.peek().await? else {
                break;
            };
            if !head.is_mature(now, self.settings.maturation_window) {
                trace!(
                    "💰️ Order {} has only matured {} of {} s. Nothing to do yet.",
                    head.order_id,
                    head.age(now).num_seconds(),
                    self.settings.maturation_window.num_seconds()
                );
                break;
            }
            let Some(entry) = self.queue.dequeue().await? else {
                break;
            };
            // The entry has left the queue for good; there is no re-enqueue on failure.
            match self.settle(&entry).await {
                Ok(SettleOutcome::Settled) => settled += 1,
                Ok(SettleOutcome::Skipped) => {},
                Err(e) => {
                    error!("💰️ Order {} failed to settle. {e}", entry.order_id);
                    self.notifier.debug_alert(&messages::settlement_failure(&entry, &e.to_string())).await;
                },
            }
        }
        Ok(settled)
    }

    async fn settle(&self, entry: &QueueEntry) -> Result<SettleOutcome, SettleError> {
        // Second idempotency gate. Claiming before any network call means a concurrent duplicate can never get
        // past this point; claims are permanent.
        if !self.processed.claim(entry.order_id) {
            debug!("💰️ Order {} has already been claimed for settlement. Skipping.", entry.order_id);
            return Ok(SettleOutcome::Skipped);
        }
        let api = self.accounts.for_seller(entry.seller_id).ok_or(SettleError::UnmanagedSeller(entry.seller_id))?;
        let order = retry(self.settings.retry_policy, MeliApiError::is_not_found, || {
            api.fetch_order(entry.order_id)
        })
        .await?;
        let Some(created_at) = order.date_created else {
            debug!("💰️ Order {} carries no creation timestamp. Skipping.", entry.order_id);
            return Ok(SettleOutcome::Skipped);
        };
        if created_at < self.settings.cutoff {
            debug!(
                "💰️ Order {} was created at {created_at}, before the cutoff {}. Skipping stale order.",
                entry.order_id, self.settings.cutoff
            );
            return Ok(SettleOutcome::Skipped);
        }
        let costs = match order.shipping.as_ref().and_then(|s| s.id) {
            Some(shipment_id) => match api.fetch_shipment_costs(shipment_id).await {
                Ok(costs) => costs,
                Err(e) if e.is_not_found() => {
                    debug!("💰️ Shipment {shipment_id} has no cost breakdown. Assuming zero shipping cost.");
                    ShipmentCosts::default()
                },
                Err(e) => return Err(e.into()),
            },
            None => ShipmentCosts::default(),
        };
        let input = settlement_input_from_order(&order, &costs, entry.seller_id);
        let breakdown = compute_settlement(&input);
        let record = LedgerRecord {
            timestamp: Utc::now(),
            seller_id: entry.seller_id,
            gross: breakdown.gross,
            net: breakdown.net,
        };
        self.ledger.record_sale(record).await?;
        info!(
            "💰️ Order {} settled for seller {}. Gross {}, net {}.",
            entry.order_id, entry.seller_id, breakdown.gross, breakdown.net
        );
        let profile = self
            .profiles
            .get(&entry.seller_id)
            .cloned()
            .unwrap_or_else(|| SellerProfile::unknown(entry.seller_id));
        self.notifier.broadcast(&messages::sale_alert(&profile, &order, &breakdown)).await;
        Ok(SettleOutcome::Settled)
    }
}

/// Starts the settlement worker. Do not await the returned JoinHandle, as it will run indefinitely.
pub fn start_settlement_worker(
    worker: SettlementWorker<MeliApi, JsonQueue, JsonLedger, TelegramNotifier>,
) -> JoinHandle<()> {
    tokio::spawn(async move { worker.run().await })
}

#[cfg(test)]
mod test {
    use std::{
        collections::HashMap,
        sync::{
            atomic::{AtomicU32, Ordering},
            Arc,
        },
        time::Duration as StdDuration,
    };

    use chrono::{DateTime, Duration, Utc};
    use meli_tools::{MeliApiError, Order, SenderCost, ShipmentCosts};
    use mockall::predicate::eq;
    use msr_common::Centavos;
    use settlement_engine::{
        db_types::QueueEntry,
        retry::RetryPolicy,
        traits::{LedgerManagement, QueueManagement},
        JsonLedger,
        JsonQueue,
        ProcessedOrders,
    };
    use tempfile::TempDir;

    use super::{SettlementWorker, WorkerSettings};
    use crate::{
        accounts::MarketplaceAccounts,
        config::SellerProfile,
        endpoint_tests::mocks::{MockMarketplace, RecordingNotifier},
    };

    const SELLER: u64 = 323091477;

    struct Fixture {
        _dir: TempDir,
        queue: JsonQueue,
        ledger: JsonLedger,
        processed: Arc<ProcessedOrders>,
        notifier: RecordingNotifier,
        cutoff: DateTime<Utc>,
    }

    impl Fixture {
        fn new() -> Self {
            let _ = env_logger::try_init().ok();
            let dir = TempDir::new().unwrap();
            let queue = JsonQueue::new(dir.path().join("queue.json")).unwrap();
            let ledger = JsonLedger::new(dir.path().join("ledger.json")).unwrap();
            Self {
                _dir: dir,
                queue,
                ledger,
                processed: Arc::new(ProcessedOrders::new()),
                notifier: RecordingNotifier::default(),
                cutoff: Utc::now() - Duration::hours(1),
            }
        }

        fn worker(
            &self,
            marketplace: MockMarketplace,
        ) -> SettlementWorker<MockMarketplace, JsonQueue, JsonLedger, RecordingNotifier> {
            let accounts = Arc::new(MarketplaceAccounts::new(HashMap::from([(SELLER, marketplace)])));
            let profiles =
                HashMap::from([(SELLER, SellerProfile { nickname: "EQUIPESCAFORTE".into(), emoji: "🐟".into() })]);
            let settings = WorkerSettings {
                cutoff: self.cutoff,
                maturation_window: Duration::minutes(5),
                poll_interval: StdDuration::from_secs(30),
                retry_policy: RetryPolicy::new(3, StdDuration::ZERO),
            };
            SettlementWorker::new(
                accounts,
                self.queue.clone(),
                self.ledger.clone(),
                self.notifier.clone(),
                self.processed.clone(),
                profiles,
                settings,
            )
        }

        async fn enqueue(&self, order_id: u64, age_minutes: i64) {
            let entry = QueueEntry::new(SELLER, order_id, Utc::now() - Duration::minutes(age_minutes));
            self.queue.enqueue(entry).await.unwrap();
        }

        async fn ledger_records(&self) -> Vec<settlement_engine::db_types::LedgerRecord> {
            let now = Utc::now();
            self.ledger.records_between(now - Duration::days(1), now + Duration::days(1)).await.unwrap()
        }
    }

    fn order_fixture(order_id: u64) -> Order {
        serde_json::from_value(serde_json::json!({
            "id": order_id,
            "date_created": Utc::now().to_rfc3339(),
            "total_amount": 100.0,
            "order_items": [{"item": {"id": "MLB1", "title": "Molinete 4000"}, "sale_fee": 10.0}],
            "buyer": {"first_name": "Ana", "last_name": "Souza"},
            "shipping": {"id": 555, "logistic_type": "fulfillment"}
        }))
        .expect("order fixture")
    }

    fn not_found() -> MeliApiError {
        MeliApiError::QueryError { status: 404, message: "order not found".into() }
    }

    #[tokio::test]
    async fn immature_entries_are_left_in_the_queue() {
        let fx = Fixture::new();
        fx.enqueue(1001, 2).await;
        let mut marketplace = MockMarketplace::new();
        marketplace.expect_fetch_order().times(0);
        let worker = fx.worker(marketplace);
        let settled = worker.drain_mature_entries().await.unwrap();
        assert_eq!(settled, 0);
        assert!(fx.queue.peek().await.unwrap().is_some());
        assert!(!fx.processed.contains(1001));
    }

    #[tokio::test]
    async fn the_reference_sale_settles_end_to_end() {
        let fx = Fixture::new();
        fx.enqueue(1001, 6).await;
        let mut marketplace = MockMarketplace::new();
        marketplace.expect_fetch_order().with(eq(1001)).times(1).returning(|id| Ok(order_fixture(id)));
        marketplace.expect_fetch_shipment_costs().with(eq(555)).times(1).returning(|_| {
            Ok(ShipmentCosts { senders: vec![SenderCost { user_id: SELLER, cost: 5.0 }] })
        });
        let worker = fx.worker(marketplace);
        let settled = worker.drain_mature_entries().await.unwrap();
        assert_eq!(settled, 1);
        assert!(fx.queue.peek().await.unwrap().is_none());
        assert!(fx.processed.contains(1001));
        // net = 100 - 10 - 5 - 7.15 = 77.85
        let records = fx.ledger_records().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].seller_id, SELLER);
        assert_eq!(records[0].gross, Centavos::from(10_000));
        assert_eq!(records[0].net, Centavos::from(7_785));
        let alerts = fx.notifier.broadcasts.lock().unwrap();
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].contains("✅ <b>Valor Líquido Final:</b> R$ 77.85"));
    }

    #[tokio::test]
    async fn claimed_orders_are_skipped_without_fetching() {
        let fx = Fixture::new();
        fx.processed.claim(1001);
        fx.enqueue(1001, 10).await;
        let mut marketplace = MockMarketplace::new();
        marketplace.expect_fetch_order().times(0);
        let worker = fx.worker(marketplace);
        let settled = worker.drain_mature_entries().await.unwrap();
        assert_eq!(settled, 0);
        assert!(fx.queue.peek().await.unwrap().is_none());
        assert!(fx.ledger_records().await.is_empty());
    }

    #[tokio::test]
    async fn pre_cutoff_orders_are_discarded_silently() {
        let fx = Fixture::new();
        fx.enqueue(1001, 10).await;
        let mut marketplace = MockMarketplace::new();
        let stale = fx.cutoff - Duration::hours(5);
        marketplace.expect_fetch_order().times(1).returning(move |id| {
            let mut order = order_fixture(id);
            order.date_created = Some(stale);
            Ok(order)
        });
        marketplace.expect_fetch_shipment_costs().times(0);
        let worker = fx.worker(marketplace);
        let settled = worker.drain_mature_entries().await.unwrap();
        assert_eq!(settled, 0);
        assert!(fx.ledger_records().await.is_empty());
        assert!(fx.notifier.broadcasts.lock().unwrap().is_empty());
        assert!(fx.notifier.debug_alerts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn not_found_is_retried_up_to_three_times() {
        let fx = Fixture::new();
        fx.enqueue(1001, 10).await;
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let mut marketplace = MockMarketplace::new();
        marketplace.expect_fetch_order().times(3).returning(move |id| {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(not_found())
            } else {
                Ok(order_fixture(id))
            }
        });
        marketplace.expect_fetch_shipment_costs().times(1).returning(|_| Ok(ShipmentCosts::default()));
        let worker = fx.worker(marketplace);
        let settled = worker.drain_mature_entries().await.unwrap();
        assert_eq!(settled, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(fx.ledger_records().await.len(), 1);
    }

    #[tokio::test]
    async fn other_errors_abort_without_retry_and_alert_the_debug_channel() {
        let fx = Fixture::new();
        fx.enqueue(1001, 10).await;
        let mut marketplace = MockMarketplace::new();
        marketplace
            .expect_fetch_order()
            .times(1)
            .returning(|_| Err(MeliApiError::QueryError { status: 500, message: "server error".into() }));
        let worker = fx.worker(marketplace);
        let settled = worker.drain_mature_entries().await.unwrap();
        assert_eq!(settled, 0);
        // the entry is consumed for good, but the failure is surfaced on the debug channel
        assert!(fx.queue.peek().await.unwrap().is_none());
        assert!(fx.ledger_records().await.is_empty());
        let debug_alerts = fx.notifier.debug_alerts.lock().unwrap();
        assert_eq!(debug_alerts.len(), 1);
        assert!(debug_alerts[0].contains("1001"));
    }

    #[tokio::test]
    async fn a_failed_entry_does_not_block_the_next_one() {
        let fx = Fixture::new();
        fx.enqueue(1001, 10).await;
        fx.enqueue(1002, 9).await;
        let mut marketplace = MockMarketplace::new();
        marketplace.expect_fetch_order().with(eq(1001)).times(1).returning(|_| {
            Err(MeliApiError::QueryError { status: 500, message: "server error".into() })
        });
        marketplace.expect_fetch_order().with(eq(1002)).times(1).returning(|id| Ok(order_fixture(id)));
        marketplace.expect_fetch_shipment_costs().times(1).returning(|_| Ok(ShipmentCosts::default()));
        let worker = fx.worker(marketplace);
        let settled = worker.drain_mature_entries().await.unwrap();
        assert_eq!(settled, 1);
        let records = fx.ledger_records().await;
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn missing_cost_breakdown_counts_as_zero_shipping() {
        let fx = Fixture::new();
        fx.enqueue(1001, 10).await;
        let mut marketplace = MockMarketplace::new();
        marketplace.expect_fetch_order().times(1).returning(|id| Ok(order_fixture(id)));
        marketplace.expect_fetch_shipment_costs().times(1).returning(|_| Err(not_found()));
        let worker = fx.worker(marketplace);
        let settled = worker.drain_mature_entries().await.unwrap();
        assert_eq!(settled, 1);
        let records = fx.ledger_records().await;
        // net = 100 - 10 - 0 - 7.15
        assert_eq!(records[0].net, Centavos::from(8_285));
    }
}
