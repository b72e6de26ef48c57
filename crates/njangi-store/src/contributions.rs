//! Contribution store.
//!
//! Recording a contribution also writes a matching ledger entry through
//! [`LedgerStore::mirror`] as an independent second write after the
//! primary insert succeeds. The two writes are not atomic; see the
//! ledger store for how failures are surfaced.

use crate::collection::{decode, Collection};
use crate::ledger::LedgerStore;
use njangi_backend::{Backend, Error, Filter, Order, Result};
use njangi_model::{
    format_xaf, is_placeholder, Amount, Contribution, ContributionStatus, RelatedKind,
    Transaction, TransactionKind,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

pub struct ContributionStore {
    collection: Collection<Contribution>,
    ledger: Arc<LedgerStore>,
}

/// Result of the `enregistrer_presence_et_cotisation` procedure.
#[derive(Debug, Deserialize)]
struct AttendanceRecorded {
    #[serde(default)]
    cotisation: Option<Contribution>,
}

impl ContributionStore {
    pub fn new(backend: Arc<dyn Backend>, ledger: Arc<LedgerStore>) -> Self {
        Self { collection: Collection::new(backend), ledger }
    }

    pub async fn fetch_all(&self) -> Result<()> {
        self.collection.fetch_all().await
    }

    /// Replace the collection with one session's contributions.
    pub async fn fetch_by_session(&self, session_id: &str) -> Result<()> {
        self.collection
            .fetch(Filter::eq("id_seance", session_id), Some(Order::asc("id_membre")))
            .await
    }

    /// Record one contribution. The status is derived from the paid vs
    /// expected amounts before the insert; once the backend confirms, a
    /// ledger entry mirrors the money movement.
    pub async fn record(&self, mut contribution: Contribution) -> Result<Contribution> {
        if is_placeholder(&contribution.member_id)
            || is_placeholder(&contribution.session_id)
            || is_placeholder(&contribution.tontine_id)
        {
            return Err(Error::validation(
                "Impossible d'enregistrer une cotisation pour un enregistrement non confirmé.",
            ));
        }
        if contribution.amount < 0 {
            return Err(Error::validation("Le montant ne peut pas être négatif."));
        }

        contribution.status =
            ContributionStatus::derive(contribution.amount, contribution.expected_amount);
        let created = self.collection.insert(&contribution).await?;

        self.ledger.mirror(ledger_entry(&created)).await;
        Ok(created)
    }

    /// Record a batch, one insert per contribution, stopping at the first
    /// failure. Contributions recorded before the failure stay recorded.
    pub async fn record_bulk(&self, contributions: Vec<Contribution>) -> Result<Vec<Contribution>> {
        let mut created = Vec::with_capacity(contributions.len());
        for contribution in contributions {
            created.push(self.record(contribution).await?);
        }
        Ok(created)
    }

    /// Record attendance and an optional payment in one backend call
    /// (the `enregistrer_presence_et_cotisation` procedure). Returns the
    /// created contribution when the member was present and paid.
    pub async fn record_with_attendance(
        &self,
        session_id: &str,
        member_id: &str,
        present: bool,
        amount_paid: Amount,
    ) -> Result<Option<Contribution>> {
        if is_placeholder(member_id) || is_placeholder(session_id) {
            return Err(Error::validation(
                "Impossible d'enregistrer une présence pour un enregistrement non confirmé.",
            ));
        }

        let args = json!({
            "id_seance": session_id,
            "id_membre": member_id,
            "est_present": present,
            "montant_paye": amount_paid,
        });

        let recorded: AttendanceRecorded = match self
            .collection
            .backend()
            .call_procedure("enregistrer_presence_et_cotisation", args)
            .await
            .and_then(decode)
        {
            Ok(recorded) => recorded,
            Err(error) => {
                self.collection.record_error(&error);
                return Err(error);
            }
        };

        let Some(contribution) = recorded.cotisation else {
            return Ok(None);
        };
        self.collection.push_local(contribution.clone());
        self.ledger.mirror(ledger_entry(&contribution)).await;
        Ok(Some(contribution))
    }

    /// Correct a contribution's paid amount; the status follows.
    pub async fn update_amount(&self, id: &str, amount: Amount) -> Result<Contribution> {
        if amount < 0 {
            return Err(Error::validation("Le montant ne peut pas être négatif."));
        }
        let Some(existing) = self.by_id(id) else {
            return Err(Error::not_found("cotisation"));
        };
        let status = ContributionStatus::derive(amount, existing.expected_amount);
        let patch = json!({
            "montant": amount,
            "statut": serde_json::to_value(status).map_err(Error::from)?,
        });
        self.collection.update(id, patch).await
    }

    pub async fn remove(&self, id: &str) -> Result<()> {
        self.collection.remove(id).await
    }

    pub fn all(&self) -> Vec<Contribution> {
        self.collection.all()
    }

    pub fn by_id(&self, id: &str) -> Option<Contribution> {
        self.collection.by_id(id)
    }

    pub fn by_session(&self, session_id: &str) -> Vec<Contribution> {
        self.collection.find_all(|c| c.session_id == session_id)
    }

    pub fn by_member(&self, member_id: &str) -> Vec<Contribution> {
        self.collection.find_all(|c| c.member_id == member_id)
    }

    pub fn by_tontine(&self, tontine_id: &str) -> Vec<Contribution> {
        self.collection.find_all(|c| c.tontine_id == tontine_id)
    }

    /// Sum paid for one session, over fetched state.
    pub fn total_for_session(&self, session_id: &str) -> Amount {
        self.by_session(session_id).iter().map(|c| c.amount).sum()
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
}

fn ledger_entry(contribution: &Contribution) -> Transaction {
    let mut entry = Transaction::new(
        contribution.tontine_id.clone(),
        TransactionKind::Contribution,
        contribution.amount,
        format!("Cotisation de {}", format_xaf(contribution.amount)),
    );
    entry.related_id = Some(contribution.id.clone());
    entry.related_kind = Some(RelatedKind::Session);
    entry.member_id = Some(contribution.member_id.clone());
    entry.session_id = Some(contribution.session_id.clone());
    entry
}
