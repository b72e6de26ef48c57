//! Penalty store.
//!
//! Payments go through the `payer_penalite` backend procedure, which owns
//! the paid-amount arithmetic. The store validates bounds first: paying
//! zero, a negative amount or more than the remaining balance never
//! reaches the network.

use crate::collection::{decode, Collection};
use njangi_backend::{Backend, Error, Filter, Order, Result};
use njangi_model::{format_xaf, is_placeholder, Amount, Penalty, PenaltyStatus};
use serde_json::json;
use std::sync::Arc;

pub struct PenaltyStore {
    collection: Collection<Penalty>,
}

impl PenaltyStore {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { collection: Collection::new(backend) }
    }

    pub async fn fetch_all(&self) -> Result<()> {
        self.collection.fetch(Filter::none(), Some(Order::desc("date"))).await
    }

    pub async fn add(&self, penalty: Penalty) -> Result<Penalty> {
        if is_placeholder(&penalty.member_id) {
            return Err(Error::validation(
                "Impossible de pénaliser un membre non confirmé.",
            ));
        }
        if penalty.amount <= 0 {
            return Err(Error::validation("Le montant doit être supérieur à 0."));
        }
        self.collection.insert(&penalty).await
    }

    /// Pay part or all of a penalty. The backend returns the canonical
    /// record (new paid amount, status, payment date), which replaces the
    /// local copy.
    pub async fn pay(&self, id: &str, amount: Amount) -> Result<Penalty> {
        let Some(penalty) = self.by_id(id) else {
            return Err(Error::not_found("penalite"));
        };
        if penalty.is_settled() {
            return Err(Error::validation("Cette pénalité est déjà soldée."));
        }
        if amount <= 0 {
            return Err(Error::validation("Le montant doit être supérieur à 0."));
        }
        if amount > penalty.remaining() {
            return Err(Error::validation(format!(
                "Le montant ne peut pas dépasser {}.",
                format_xaf(penalty.remaining())
            )));
        }

        let args = json!({"id_penalite": id, "montant": amount});
        match self
            .collection
            .backend()
            .call_procedure("payer_penalite", args)
            .await
            .and_then(decode::<Penalty>)
        {
            Ok(canonical) => {
                self.collection.replace_local(id, canonical.clone());
                Ok(canonical)
            }
            Err(error) => {
                self.collection.record_error(&error);
                Err(error)
            }
        }
    }

    /// Cancel a penalty; nothing more can be collected on it.
    pub async fn waive(&self, id: &str) -> Result<Penalty> {
        self.collection.update(id, json!({"statut": "annule"})).await
    }

    pub async fn remove(&self, id: &str) -> Result<()> {
        self.collection.remove(id).await
    }

    pub fn all(&self) -> Vec<Penalty> {
        self.collection.all()
    }

    pub fn by_id(&self, id: &str) -> Option<Penalty> {
        self.collection.by_id(id)
    }

    pub fn by_member(&self, member_id: &str) -> Vec<Penalty> {
        self.collection.find_all(|p| p.member_id == member_id)
    }

    pub fn by_session(&self, session_id: &str) -> Vec<Penalty> {
        self.collection.find_all(|p| p.session_id.as_deref() == Some(session_id))
    }

    pub fn by_tontine(&self, tontine_id: &str) -> Vec<Penalty> {
        self.collection.find_all(|p| p.tontine_id.as_deref() == Some(tontine_id))
    }

    /// Penalties with money still owed.
    pub fn outstanding(&self) -> Vec<Penalty> {
        self.collection.find_all(|p| {
            matches!(p.status, PenaltyStatus::Unpaid | PenaltyStatus::PartiallyPaid)
        })
    }

    pub fn paid(&self) -> Vec<Penalty> {
        self.collection.find_all(|p| p.status == PenaltyStatus::Paid)
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
