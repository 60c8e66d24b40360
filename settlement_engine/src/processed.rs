use std::{
    collections::HashSet,
    sync::{Mutex, PoisonError},
};

/// Process-lifetime set of order ids accepted for settlement. Membership is write-once; there is no eviction.
/// The set only exists to stop a redelivered webhook from double-counting a sale, and a process restart both
/// clears it and moves the cutoff timestamp forward, so unbounded growth is bounded by process uptime.
#[derive(Debug, Default)]
pub struct ProcessedOrders {
    ids: Mutex<HashSet<u64>>,
}

impl ProcessedOrders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the id, returning `true` when this call claimed it and `false` when it was already present.
    pub fn claim(&self, order_id: u64) -> bool {
        self.ids.lock().unwrap_or_else(PoisonError::into_inner).insert(order_id)
    }

    pub fn contains(&self, order_id: u64) -> bool {
        self.ids.lock().unwrap_or_else(PoisonError::into_inner).contains(&order_id)
    }

    pub fn len(&self) -> usize {
        self.ids.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod test {
    use super::ProcessedOrders;

    #[test]
    fn claims_are_write_once() {
        let processed = ProcessedOrders::new();
        assert!(!processed.contains(1001));
        assert!(processed.claim(1001));
        assert!(!processed.claim(1001));
        assert!(processed.contains(1001));
        assert_eq!(processed.len(), 1);
    }
}
