use std::sync::{Arc, Mutex};

use meli_tools::{MeliApiError, Order, Payment, ShipmentCosts};
use mockall::mock;
use settlement_engine::{
    db_types::QueueEntry,
    traits::{QueueManagement, StorageError},
};

use crate::{integrations::meli::MarketplaceApi, notifier::Notifier};

mock! {
    pub Marketplace {}
    impl MarketplaceApi for Marketplace {
        async fn fetch_payment(&self, resource: &str) -> Result<Payment, MeliApiError>;
        async fn fetch_order(&self, order_id: u64) -> Result<Order, MeliApiError>;
        async fn fetch_shipment_costs(&self, shipment_id: u64) -> Result<ShipmentCosts, MeliApiError>;
    }
}

mock! {
    pub Queue {}
    impl QueueManagement for Queue {
        async fn enqueue(&self, entry: QueueEntry) -> Result<(), StorageError>;
        async fn peek(&self) -> Result<Option<QueueEntry>, StorageError>;
        async fn dequeue(&self) -> Result<Option<QueueEntry>, StorageError>;
        async fn is_pending(&self, order_id: u64) -> Result<bool, StorageError>;
    }
}

/// Captures everything the workers tried to send, in place of the Telegram transport.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pub broadcasts: Arc<Mutex<Vec<String>>>,
    pub debug_alerts: Arc<Mutex<Vec<String>>>,
}

impl RecordingNotifier {
    pub fn broadcast_count(&self) -> usize {
        self.broadcasts.lock().unwrap().len()
    }
}

impl Notifier for RecordingNotifier {
    async fn broadcast(&self, text: &str) {
        self.broadcasts.lock().unwrap().push(text.to_string());
    }

    async fn debug_alert(&self, text: &str) {
        self.debug_alerts.lock().unwrap().push(text.to_string());
    }
}
