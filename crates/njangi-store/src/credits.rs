//! Credit store.
//!
//! Repayment arithmetic is simple interest, computed client-side for
//! display and validated client-side before any network call; the
//! backend's canonical record replaces the local guess after every
//! mutation.

use crate::collection::Collection;
use chrono::NaiveDate;
use njangi_backend::{Backend, Error, Filter, Order, Result};
use njangi_model::{format_xaf, is_placeholder, Amount, Credit, CreditStatus};
use serde_json::json;
use std::sync::Arc;

pub struct CreditStore {
    collection: Collection<Credit>,
}

impl CreditStore {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { collection: Collection::new(backend) }
    }

    pub async fn fetch_all(&self) -> Result<()> {
        self.collection.fetch(Filter::none(), Some(Order::desc("date_demande"))).await
    }

    /// File a credit request. A member with an active credit may not
    /// request another.
    pub async fn request(&self, mut credit: Credit) -> Result<Credit> {
        if is_placeholder(&credit.member_id) {
            return Err(Error::validation(
                "Impossible d'accorder un crédit à un membre non confirmé.",
            ));
        }
        if credit.principal <= 0 {
            return Err(Error::validation("Le montant du crédit doit être supérieur à 0."));
        }
        if self.has_active_credit(&credit.member_id) {
            return Err(Error::validation("Ce membre a déjà un crédit en cours."));
        }

        credit.remaining = credit.repayment_total();
        credit.amount_repaid = 0;
        credit.status = CreditStatus::Pending;
        self.collection.insert(&credit).await
    }

    pub async fn approve(&self, id: &str) -> Result<Credit> {
        self.transition(id, CreditStatus::Pending, json!({"statut": "approuve"})).await
    }

    /// Disburse an approved credit; repayment tracking starts here.
    pub async fn disburse(&self, id: &str, date: NaiveDate) -> Result<Credit> {
        self.transition(
            id,
            CreditStatus::Approved,
            json!({"statut": "decaisse", "date_decaissement": date}),
        )
        .await
    }

    /// Apply a repayment. Rejected client-side when the amount is not in
    /// `(0, remaining]`; the remaining balance never goes negative and
    /// the credit completes exactly when it reaches zero.
    pub async fn repay(&self, id: &str, amount: Amount) -> Result<Credit> {
        let Some(credit) = self.by_id(id) else {
            return Err(Error::not_found("credit"));
        };
        if !matches!(
            credit.status,
            CreditStatus::Disbursed | CreditStatus::Repaying | CreditStatus::Defaulted
        ) {
            return Err(Error::validation("Ce crédit n'est pas en cours de remboursement."));
        }
        if amount <= 0 {
            return Err(Error::validation("Le montant doit être supérieur à 0."));
        }
        if amount > credit.remaining {
            return Err(Error::validation(format!(
                "Le montant ne peut pas dépasser le solde restant de {}.",
                format_xaf(credit.remaining)
            )));
        }

        let remaining = credit.remaining - amount;
        let status = if remaining == 0 { CreditStatus::Completed } else { CreditStatus::Repaying };
        let patch = json!({
            "montant_rembourse": credit.amount_repaid + amount,
            "solde": remaining,
            "statut": serde_json::to_value(status).map_err(Error::from)?,
        });
        self.collection.update(id, patch).await
    }

    /// Flag local credits past their due date as defaulted.
    pub async fn mark_overdue(&self, today: NaiveDate) -> Result<usize> {
        let overdue: Vec<String> = self
            .collection
            .find_all(|c| c.is_overdue(today) && c.status != CreditStatus::Defaulted)
            .into_iter()
            .map(|c| c.id)
            .collect();

        for id in &overdue {
            self.collection.update(id, json!({"statut": "en_retard"})).await?;
        }
        Ok(overdue.len())
    }

    pub async fn remove(&self, id: &str) -> Result<()> {
        self.collection.remove(id).await
    }

    pub fn all(&self) -> Vec<Credit> {
        self.collection.all()
    }

    pub fn by_id(&self, id: &str) -> Option<Credit> {
        self.collection.by_id(id)
    }

    pub fn by_member(&self, member_id: &str) -> Vec<Credit> {
        self.collection.find_all(|c| c.member_id == member_id)
    }

    pub fn by_tontine(&self, tontine_id: &str) -> Vec<Credit> {
        self.collection.find_all(|c| c.tontine_id.as_deref() == Some(tontine_id))
    }

    pub fn active(&self) -> Vec<Credit> {
        self.collection.find_all(Credit::is_active)
    }

    pub fn has_active_credit(&self, member_id: &str) -> bool {
        !self.collection.find_all(|c| c.member_id == member_id && c.is_active()).is_empty()
    }

    pub fn is_loading(&self) -> bool {
        self.collection.is_loading()
    }

    pub fn last_error(&self) -> Option<String> {
        self.collection.last_error()
    }

    pub fn clear_error(&self) {
        self.collection.clear_error()
    }

    async fn transition(
        &self,
        id: &str,
        expected: CreditStatus,
        patch: serde_json::Value,
    ) -> Result<Credit> {
        let Some(credit) = self.by_id(id) else {
            return Err(Error::not_found("credit"));
        };
        if credit.status != expected {
            return Err(Error::validation("Transition de statut invalide pour ce crédit."));
        }
        self.collection.update(id, patch).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use njangi_backend::MockBackend;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn store() -> (Arc<MockBackend>, CreditStore) {
        let backend = Arc::new(MockBackend::new());
        let store = CreditStore::new(backend.clone());
        (backend, store)
    }

    async fn disbursed_credit(store: &CreditStore) -> Credit {
        let credit = store
            .request(Credit::new("1", 100_000, 5.0, date(2026, 1, 1), date(2026, 7, 1)))
            .await
            .unwrap();
        store.approve(&credit.id).await.unwrap();
        store.disburse(&credit.id, date(2026, 1, 5)).await.unwrap()
    }

    #[tokio::test]
    async fn request_computes_repayment_total() {
        let (_backend, store) = store();
        let credit = store
            .request(Credit::new("1", 100_000, 5.0, date(2026, 1, 1), date(2026, 7, 1)))
            .await
            .unwrap();
        assert_eq!(credit.remaining, 105_000);
        assert_eq!(credit.status, CreditStatus::Pending);
    }

    #[tokio::test]
    async fn one_active_credit_per_member() {
        let (_backend, store) = store();
        disbursed_credit(&store).await;

        let err = store
            .request(Credit::new("1", 50_000, 4.0, date(2026, 2, 1), date(2026, 8, 1)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));

        // A different member is fine.
        store
            .request(Credit::new("2", 50_000, 4.0, date(2026, 2, 1), date(2026, 8, 1)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn repayment_lifecycle() {
        let (_backend, store) = store();
        let credit = disbursed_credit(&store).await;

        let after_first = store.repay(&credit.id, 50_000).await.unwrap();
        assert_eq!(after_first.remaining, 55_000);
        assert_eq!(after_first.amount_repaid, 50_000);
        assert_eq!(after_first.status, CreditStatus::Repaying);

        let settled = store.repay(&credit.id, 55_000).await.unwrap();
        assert_eq!(settled.remaining, 0);
        assert_eq!(settled.amount_repaid, 105_000);
        assert_eq!(settled.status, CreditStatus::Completed);
    }

    #[tokio::test]
    async fn overpayment_rejected_before_any_network_call() {
        let (backend, store) = store();
        let credit = disbursed_credit(&store).await;

        let requests = backend.request_count();
        let err = store.repay(&credit.id, 200_000).await.unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        let err = store.repay(&credit.id, 0).await.unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert_eq!(backend.request_count(), requests);
    }

    #[tokio::test]
    async fn mark_overdue_flags_defaulted() {
        let (_backend, store) = store();
        let credit = disbursed_credit(&store).await;
        store.repay(&credit.id, 5_000).await.unwrap();

        let flagged = store.mark_overdue(date(2026, 8, 1)).await.unwrap();
        assert_eq!(flagged, 1);
        assert_eq!(store.by_id(&credit.id).unwrap().status, CreditStatus::Defaulted);

        // Already defaulted; nothing left to flag.
        assert_eq!(store.mark_overdue(date(2026, 9, 1)).await.unwrap(), 0);
    }
}
