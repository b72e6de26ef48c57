//! Transaction ledger store.
//!
//! The ledger is append-only: entries are inserted or deleted wholesale,
//! never updated. Balance and history are pure reduces over the fetched
//! collection.
//!
//! Mirror writes from the contribution and tour stores are best-effort
//! secondary writes: a failure never rolls back the primary write. It is
//! not silently dropped either - the entry is logged and parked in a
//! visible pending queue until [`retry_pending`](LedgerStore::retry_pending)
//! flushes it. Until then the ledger lags the source-of-truth tables;
//! that drift window is the known limitation of the two-step design.

use crate::collection::Collection;
use njangi_backend::{Backend, Filter, Order, Result};
use njangi_model::{Amount, Transaction, TransactionKind};
use std::sync::{Arc, Mutex};
use tracing::warn;

pub struct LedgerStore {
    collection: Collection<Transaction>,
    pending: Mutex<Vec<Transaction>>,
}

impl LedgerStore {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            collection: Collection::new(backend),
            pending: Mutex::new(Vec::new()),
        }
    }

    pub async fn fetch_all(&self) -> Result<()> {
        self.collection.fetch(Filter::none(), Some(Order::desc("created_at"))).await
    }

    pub async fn fetch_by_tontine(&self, tontine_id: &str) -> Result<()> {
        self.collection
            .fetch(Filter::eq("id_tontine", tontine_id), Some(Order::desc("created_at")))
            .await
    }

    /// Append one entry. There is deliberately no update operation.
    pub async fn record(&self, entry: Transaction) -> Result<Transaction> {
        self.collection.insert(&entry).await
    }

    /// Best-effort secondary write used by the contribution and tour
    /// stores after their primary write succeeded. Failures are logged
    /// and queued for retry, never propagated.
    pub async fn mirror(&self, entry: Transaction) {
        if let Err(error) = self.record(entry.clone()).await {
            warn!(%error, kind = ?entry.kind, tontine = %entry.tontine_id,
                "ledger mirror write failed; entry queued for retry");
            self.pending.lock().unwrap().push(entry);
        }
    }

    /// Mirror writes waiting to be retried.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    /// Retry every queued mirror write. Returns how many flushed; entries
    /// that fail again stay queued and the first error is reported.
    pub async fn retry_pending(&self) -> Result<usize> {
        let entries: Vec<Transaction> = std::mem::take(&mut *self.pending.lock().unwrap());

        let mut flushed = 0;
        let mut first_error = None;
        for entry in entries {
            match self.record(entry.clone()).await {
                Ok(_) => flushed += 1,
                Err(error) => {
                    self.pending.lock().unwrap().push(entry);
                    if first_error.is_none() {
                        first_error = Some(error);
                    }
                }
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(flushed),
        }
    }

    /// Delete one entry wholesale.
    pub async fn remove(&self, id: &str) -> Result<()> {
        self.collection.remove(id).await
    }

    pub fn all(&self) -> Vec<Transaction> {
        self.collection.all()
    }

    pub fn by_tontine(&self, tontine_id: &str) -> Vec<Transaction> {
        self.collection.find_all(|t| t.tontine_id == tontine_id)
    }

    pub fn by_kind(&self, tontine_id: &str, kind: TransactionKind) -> Vec<Transaction> {
        self.collection.find_all(|t| t.tontine_id == tontine_id && t.kind == kind)
    }

    /// Signed reduce over the fetched entries.
    pub fn balance(&self, tontine_id: &str) -> Amount {
        self.by_tontine(tontine_id).iter().map(|t| t.amount).sum()
    }

    /// Newest entries first.
    pub fn history(&self, tontine_id: &str, limit: Option<usize>) -> Vec<Transaction> {
        let mut entries = self.by_tontine(tontine_id);
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = limit {
            entries.truncate(limit);
        }
        entries
    }

    pub fn can_afford(&self, tontine_id: &str, amount: Amount) -> bool {
        self.balance(tontine_id) >= amount
    }

    pub fn last_error(&self) -> Option<String> {
        self.collection.last_error()
    }

    pub fn clear_error(&self) {
        self.collection.clear_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use njangi_backend::{Error, MockBackend};

    fn store() -> (Arc<MockBackend>, LedgerStore) {
        let backend = Arc::new(MockBackend::new());
        let store = LedgerStore::new(backend.clone());
        (backend, store)
    }

    #[tokio::test]
    async fn balance_is_a_signed_reduce() {
        let (_backend, store) = store();
        store
            .record(Transaction::new("1", TransactionKind::Contribution, 50_000, "Cotisation"))
            .await
            .unwrap();
        store
            .record(Transaction::new("1", TransactionKind::TourDistribution, -30_000, "Tour #1"))
            .await
            .unwrap();
        store
            .record(Transaction::new("2", TransactionKind::InitialFunding, 10_000, "Fonds initial"))
            .await
            .unwrap();

        assert_eq!(store.balance("1"), 20_000);
        assert_eq!(store.balance("2"), 10_000);
        assert!(store.can_afford("1", 20_000));
        assert!(!store.can_afford("1", 20_001));
    }

    #[tokio::test]
    async fn mirror_failure_queues_for_retry() {
        let (backend, store) = store();
        backend.fail_next(Error::network("down"));

        store
            .mirror(Transaction::new("1", TransactionKind::Contribution, 20_000, "Cotisation"))
            .await;
        assert_eq!(store.pending_count(), 1);
        assert_eq!(store.balance("1"), 0);

        let flushed = store.retry_pending().await.unwrap();
        assert_eq!(flushed, 1);
        assert_eq!(store.pending_count(), 0);
        assert_eq!(store.balance("1"), 20_000);
    }

    #[tokio::test]
    async fn retry_keeps_entries_that_fail_again() {
        let (backend, store) = store();
        backend.fail_next(Error::network("down"));
        store
            .mirror(Transaction::new("1", TransactionKind::Contribution, 20_000, "Cotisation"))
            .await;

        backend.fail_next(Error::network("still down"));
        store.retry_pending().await.unwrap_err();
        assert_eq!(store.pending_count(), 1);
    }

    #[tokio::test]
    async fn by_kind_filters_locally() {
        let (_backend, store) = store();
        store
            .record(Transaction::new("1", TransactionKind::Contribution, 50_000, "Cotisation"))
            .await
            .unwrap();
        store
            .record(Transaction::new("1", TransactionKind::Penalty, 5_000, "Pénalité"))
            .await
            .unwrap();

        assert_eq!(store.by_kind("1", TransactionKind::Penalty).len(), 1);
        assert_eq!(store.by_kind("1", TransactionKind::Adjustment).len(), 0);
    }
}
