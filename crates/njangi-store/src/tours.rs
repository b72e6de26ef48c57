//! Tour store.
//!
//! Distribution checks the pooled balance through the backend's
//! `calculer_solde_tontine` procedure before inserting, numbers tours by
//! scanning the fetched collection (same documented race as sessions)
//! and mirrors the outflow into the ledger.

use crate::collection::{decode, Collection};
use crate::ledger::LedgerStore;
use njangi_backend::{Backend, Error, Filter, Order, Result};
use njangi_model::{
    format_xaf, is_placeholder, Amount, RelatedKind, Tour, Transaction, TransactionKind,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

pub struct TourStore {
    collection: Collection<Tour>,
    ledger: Arc<LedgerStore>,
}

/// A member's standing for the next payout.
#[derive(Debug, Clone, PartialEq)]
pub struct EligibleBeneficiary {
    pub member_id: String,
    pub tours_received: u32,
    pub total_contributed: Amount,
    /// True when the member has not yet received a payout.
    pub eligible: bool,
}

#[derive(Debug, Deserialize)]
struct Balance {
    #[serde(rename = "solde")]
    amount: Amount,
}

impl TourStore {
    pub fn new(backend: Arc<dyn Backend>, ledger: Arc<LedgerStore>) -> Self {
        Self { collection: Collection::new(backend), ledger }
    }

    pub async fn fetch_all(&self) -> Result<()> {
        self.collection.fetch(Filter::none(), Some(Order::desc("date"))).await
    }

    /// Next sequential tour number for a tontine, from fetched state.
    pub fn next_number(&self, tontine_id: &str) -> u32 {
        self.collection
            .find_all(|t| t.tontine_id == tontine_id)
            .iter()
            .map(|t| t.number)
            .max()
            .unwrap_or(0)
            + 1
    }

    /// Current pooled balance, computed by the backend.
    pub async fn tontine_balance(&self, tontine_id: &str) -> Result<Amount> {
        let args = json!({"id_tontine": tontine_id});
        match self
            .collection
            .backend()
            .call_procedure("calculer_solde_tontine", args)
            .await
            .and_then(decode::<Balance>)
        {
            Ok(balance) => Ok(balance.amount),
            Err(error) => {
                self.collection.record_error(&error);
                Err(error)
            }
        }
    }

    /// Distribute a payout. The pooled balance must cover the amount;
    /// insufficient funds are rejected before the insert.
    pub async fn distribute(&self, mut tour: Tour) -> Result<Tour> {
        if is_placeholder(&tour.beneficiary_id) || is_placeholder(&tour.tontine_id) {
            return Err(Error::validation(
                "Impossible de distribuer un tour à un enregistrement non confirmé.",
            ));
        }
        if tour.amount <= 0 {
            return Err(Error::validation("Le montant doit être supérieur à 0."));
        }

        let balance = self.tontine_balance(&tour.tontine_id).await?;
        if balance < tour.amount {
            return Err(Error::validation(format!(
                "Fonds insuffisants pour ce tour. Disponible : {}, demandé : {}.",
                format_xaf(balance),
                format_xaf(tour.amount)
            )));
        }

        tour.number = self.next_number(&tour.tontine_id);
        let created = self.collection.insert(&tour).await?;

        self.ledger.mirror(ledger_entry(&created)).await;
        Ok(created)
    }

    /// Let the backend attribute the session's pooled gain to a
    /// beneficiary (the `attribuer_gain` procedure) and adopt the
    /// resulting tour.
    pub async fn assign_gain(&self, session_id: &str, beneficiary_id: &str) -> Result<Tour> {
        if is_placeholder(beneficiary_id) {
            return Err(Error::validation(
                "Impossible d'attribuer un gain à un membre non confirmé.",
            ));
        }

        let args = json!({"id_seance": session_id, "id_beneficiaire": beneficiary_id});
        match self
            .collection
            .backend()
            .call_procedure("attribuer_gain", args)
            .await
            .and_then(decode::<Tour>)
        {
            Ok(tour) => {
                self.collection.push_local(tour.clone());
                Ok(tour)
            }
            Err(error) => {
                self.collection.record_error(&error);
                Err(error)
            }
        }
    }

    /// Participants of a tontine with their payout standing: who already
    /// received a tour, and how much each has contributed.
    pub async fn eligible_beneficiaries(&self, tontine_id: &str) -> Result<Vec<EligibleBeneficiary>> {
        let backend = self.collection.backend();

        let participations = backend
            .query("participe", Filter::eq("id_tontine", tontine_id), None)
            .await?;
        let tours = backend
            .query("tour", Filter::eq("id_tontine", tontine_id), None)
            .await?;
        let contributions = backend
            .query(
                "cotisation",
                Filter::eq("id_tontine", tontine_id).and_eq("statut", "complete"),
                None,
            )
            .await?;

        let member_of = |row: &serde_json::Value, key: &str| {
            row.get(key).and_then(serde_json::Value::as_str).unwrap_or("").to_string()
        };

        Ok(participations
            .iter()
            .map(|p| {
                let member_id = member_of(p, "id_membre");
                let tours_received = tours
                    .iter()
                    .filter(|t| member_of(t, "id_beneficiaire") == member_id)
                    .count() as u32;
                let total_contributed = contributions
                    .iter()
                    .filter(|c| member_of(c, "id_membre") == member_id)
                    .map(|c| c.get("montant").and_then(serde_json::Value::as_i64).unwrap_or(0))
                    .sum();
                EligibleBeneficiary {
                    eligible: tours_received == 0,
                    member_id,
                    tours_received,
                    total_contributed,
                }
            })
            .collect())
    }

    pub async fn remove(&self, id: &str) -> Result<()> {
        self.collection.remove(id).await
    }

    pub fn all(&self) -> Vec<Tour> {
        self.collection.all()
    }

    pub fn by_id(&self, id: &str) -> Option<Tour> {
        self.collection.by_id(id)
    }

    pub fn by_tontine(&self, tontine_id: &str) -> Vec<Tour> {
        let mut tours = self.collection.find_all(|t| t.tontine_id == tontine_id);
        tours.sort_by_key(|t| t.number);
        tours
    }

    pub fn by_session(&self, session_id: &str) -> Vec<Tour> {
        self.collection.find_all(|t| t.session_id.as_deref() == Some(session_id))
    }

    pub fn by_beneficiary(&self, member_id: &str) -> Vec<Tour> {
        self.collection.find_all(|t| t.beneficiary_id == member_id)
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

fn ledger_entry(tour: &Tour) -> Transaction {
    let mut entry = Transaction::new(
        tour.tontine_id.clone(),
        TransactionKind::TourDistribution,
        -tour.amount,
        format!("Tour #{} distribué", tour.number),
    );
    entry.related_id = Some(tour.id.clone());
    entry.related_kind = Some(RelatedKind::Tour);
    entry.member_id = Some(tour.beneficiary_id.clone());
    entry.session_id = tour.session_id.clone();
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use njangi_backend::MockBackend;
    use serde_json::json;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 15).unwrap()
    }

    fn store() -> (Arc<MockBackend>, Arc<LedgerStore>, TourStore) {
        let backend = Arc::new(MockBackend::new());
        let ledger = Arc::new(LedgerStore::new(backend.clone()));
        let store = TourStore::new(backend.clone(), ledger.clone());
        (backend, ledger, store)
    }

    fn seed_funds(backend: &MockBackend, tontine_id: &str, amount: i64) {
        backend.seed(
            "cotisation",
            vec![json!({
                "id": "c-seed",
                "id_tontine": tontine_id,
                "id_seance": "s1",
                "id_membre": "m1",
                "montant": amount,
                "statut": "complete"
            })],
        );
    }

    #[tokio::test]
    async fn distribute_checks_funds_and_mirrors() {
        let (backend, ledger, store) = store();
        seed_funds(&backend, "1", 200_000);

        let tour = store.distribute(Tour::new("1", "3", 0, 150_000, date())).await.unwrap();
        assert_eq!(tour.number, 1);

        let entries = ledger.by_kind("1", TransactionKind::TourDistribution);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].amount, -150_000);
    }

    #[tokio::test]
    async fn insufficient_funds_rejected_before_insert() {
        let (backend, _ledger, store) = store();
        seed_funds(&backend, "1", 100_000);

        let err = store.distribute(Tour::new("1", "3", 0, 150_000, date())).await.unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert!(err.user_message().contains("Fonds insuffisants"));
        assert!(store.all().is_empty());
        assert!(backend.rows("tour").is_empty());
    }

    #[tokio::test]
    async fn tour_numbers_are_sequential_per_tontine() {
        let (backend, _ledger, store) = store();
        seed_funds(&backend, "1", 1_000_000);
        seed_funds(&backend, "2", 1_000_000);

        let first = store.distribute(Tour::new("1", "3", 0, 100_000, date())).await.unwrap();
        let second = store.distribute(Tour::new("1", "4", 0, 100_000, date())).await.unwrap();
        let other = store.distribute(Tour::new("2", "5", 0, 100_000, date())).await.unwrap();

        assert_eq!((first.number, second.number, other.number), (1, 2, 1));
    }

    #[tokio::test]
    async fn assign_gain_adopts_backend_tour() {
        let (backend, _ledger, store) = store();
        backend.seed(
            "seance",
            vec![json!({"id": "s1", "id_tontine": "1", "date": "2024-02-15", "numero_seance": 1})],
        );
        seed_funds(&backend, "1", 0);
        backend.seed(
            "cotisation",
            vec![json!({
                "id": "c2", "id_tontine": "1", "id_seance": "s1", "id_membre": "m2",
                "montant": 40_000, "statut": "complete"
            })],
        );

        let tour = store.assign_gain("s1", "m2").await.unwrap();
        assert_eq!(tour.tontine_id, "1");
        assert_eq!(tour.number, 1);
        assert_eq!(tour.amount, 40_000);
        assert_eq!(store.by_session("s1").len(), 1);
    }

    #[tokio::test]
    async fn eligibility_reflects_received_tours() {
        let (backend, _ledger, store) = store();
        backend.seed(
            "participe",
            vec![
                json!({"id": "p1", "id_tontine": "1", "id_membre": "m1", "nb_parts": 1}),
                json!({"id": "p2", "id_tontine": "1", "id_membre": "m2", "nb_parts": 2}),
            ],
        );
        backend.seed(
            "tour",
            vec![json!({"id": "t1", "id_tontine": "1", "id_beneficiaire": "m1", "numero": 1, "montant_distribue": 50_000})],
        );
        backend.seed(
            "cotisation",
            vec![json!({"id": "c1", "id_tontine": "1", "id_seance": "s1", "id_membre": "m2", "montant": 25_000, "statut": "complete"})],
        );

        let eligible = store.eligible_beneficiaries("1").await.unwrap();
        assert_eq!(eligible.len(), 2);

        let m1 = eligible.iter().find(|e| e.member_id == "m1").unwrap();
        assert!(!m1.eligible);
        assert_eq!(m1.tours_received, 1);

        let m2 = eligible.iter().find(|e| e.member_id == "m2").unwrap();
        assert!(m2.eligible);
        assert_eq!(m2.total_contributed, 25_000);
    }
}
