use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Serialization point for settlement-affecting writes.
///
/// One async mutex per bill and per order. Every write that can change whether
/// a bill is settled runs while holding its key, so two deliveries of the same
/// callback, or a double-clicked cash payment, are applied one after the other
/// and observe each other's result. When a write needs several keys, bill keys
/// are taken first in id order, then order keys in id order.
///
/// Owned by the process entry point and injected into services.
#[derive(Default)]
pub struct SettlementLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

/// Held for the duration of a settlement-affecting write
pub struct SettlementLock {
    _guard: OwnedMutexGuard<()>,
    key: String,
}

impl SettlementLock {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl SettlementLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bill_key(bill_id: &str) -> String {
        format!("bill:{}", bill_id)
    }

    pub fn order_key(order_id: &str) -> String {
        format!("order:{}", order_id)
    }

    /// Wait for exclusive access to `key`
    pub async fn acquire(&self, key: String) -> SettlementLock {
        let mutex = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        tracing::trace!(lock_key = %key, "Acquiring settlement lock");
        let guard = mutex.lock_owned().await;

        SettlementLock { _guard: guard, key }
    }

    pub async fn lock_bill(&self, bill_id: &str) -> SettlementLock {
        self.acquire(Self::bill_key(bill_id)).await
    }

    pub async fn lock_order(&self, order_id: &str) -> SettlementLock {
        self.acquire(Self::order_key(order_id)).await
    }

    /// Drop map entries nobody is holding or waiting on
    pub fn prune(&self) -> usize {
        let before = self.locks.len();
        self.locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);
        before - self.locks.len()
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
