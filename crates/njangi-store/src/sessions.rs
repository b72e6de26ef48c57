//! Session store.
//!
//! Sequential numbering is computed client-side by scanning the fetched
//! collection (max + 1). Two near-simultaneous creations for the same
//! tontine can compute the same number; the backend's uniqueness
//! constraint rejects the loser and the error surfaces for resubmission.

use crate::collection::{decode, Collection};
use njangi_backend::{Backend, Error, Filter, Order, Result};
use njangi_model::{is_placeholder, Amount, Penalty, Session, SessionStatus};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

pub struct SessionStore {
    collection: Collection<Session>,
}

/// Attendance entry passed to the closing procedure.
#[derive(Debug, Clone, Serialize)]
pub struct Attendance {
    #[serde(rename = "id_membre")]
    pub member_id: String,
    pub present: bool,
}

impl Attendance {
    pub fn new(member_id: impl Into<String>, present: bool) -> Self {
        Self { member_id: member_id.into(), present }
    }
}

/// Result of the `cloturer_seance` procedure.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionClose {
    #[serde(rename = "id_seance")]
    pub session_id: String,
    #[serde(rename = "statut")]
    pub status: SessionStatus,
    #[serde(rename = "penalites_creees", default)]
    pub penalties_created: Vec<Penalty>,
    #[serde(rename = "total_cotisations", default)]
    pub total_contributions: Amount,
    #[serde(rename = "total_penalites", default)]
    pub total_penalties: Amount,
    #[serde(rename = "nombre_presents", default)]
    pub attendance_count: u32,
}

/// Partial update for a session.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<chrono::NaiveDate>,
    #[serde(rename = "lieu", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(rename = "ordre_du_jour", skip_serializing_if = "Option::is_none")]
    pub agenda: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(rename = "statut", skip_serializing_if = "Option::is_none")]
    pub status: Option<SessionStatus>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { collection: Collection::new(backend) }
    }

    pub async fn fetch_all(&self) -> Result<()> {
        self.collection.fetch(Filter::none(), Some(Order::desc("date"))).await
    }

    /// Replace the collection with one tontine's sessions.
    pub async fn fetch_by_tontine(&self, tontine_id: &str) -> Result<()> {
        self.collection
            .fetch(Filter::eq("id_tontine", tontine_id), Some(Order::asc("numero_seance")))
            .await
    }

    /// Next sequential number for a tontine, from already-fetched state.
    /// 1 when the tontine has no sessions yet.
    pub fn next_number(&self, tontine_id: &str) -> u32 {
        self.collection
            .find_all(|s| s.tontine_id == tontine_id)
            .iter()
            .map(|s| s.number)
            .max()
            .unwrap_or(0)
            + 1
    }

    /// Insert a new session, assigning the next sequential number for its
    /// tontine.
    pub async fn add(&self, mut session: Session) -> Result<Session> {
        if is_placeholder(&session.tontine_id) {
            return Err(Error::validation(
                "Impossible de créer une séance pour une tontine non confirmée.",
            ));
        }
        session.number = self.next_number(&session.tontine_id);
        self.collection.insert(&session).await
    }

    pub async fn update(&self, id: &str, patch: SessionPatch) -> Result<Session> {
        let value = serde_json::to_value(&patch).map_err(Error::from)?;
        self.collection.update(id, value).await
    }

    pub async fn remove(&self, id: &str) -> Result<()> {
        self.collection.remove(id).await
    }

    /// Close a session through the backend procedure: the backend flips
    /// the status, creates absence penalties for presence tontines and
    /// computes the aggregate totals. The local session is updated from
    /// the returned outcome.
    pub async fn close(
        &self,
        session_id: &str,
        absence_penalty: Amount,
        attendance: &[Attendance],
    ) -> Result<SessionClose> {
        let args = json!({
            "id_seance": session_id,
            "montant_penalite_absence": absence_penalty,
            "presences": attendance,
        });

        let outcome: SessionClose = match self
            .collection
            .backend()
            .call_procedure("cloturer_seance", args)
            .await
            .and_then(decode)
        {
            Ok(outcome) => outcome,
            Err(error) => {
                self.collection.record_error(&error);
                return Err(error);
            }
        };

        self.collection.apply_local(session_id, |session| {
            session.status = outcome.status;
            session.total_contributions = outcome.total_contributions;
            session.total_penalties = outcome.total_penalties;
            session.attendance_count = outcome.attendance_count;
        });

        Ok(outcome)
    }

    pub fn all(&self) -> Vec<Session> {
        self.collection.all()
    }

    pub fn by_id(&self, id: &str) -> Option<Session> {
        self.collection.by_id(id)
    }

    pub fn by_tontine(&self, tontine_id: &str) -> Vec<Session> {
        let mut sessions = self.collection.find_all(|s| s.tontine_id == tontine_id);
        sessions.sort_by_key(|s| s.number);
        sessions
    }

    pub fn open_sessions(&self) -> Vec<Session> {
        self.collection.find_all(Session::is_open)
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

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use njangi_backend::MockBackend;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn store() -> (Arc<MockBackend>, SessionStore) {
        let backend = Arc::new(MockBackend::new());
        let store = SessionStore::new(backend.clone());
        (backend, store)
    }

    #[tokio::test]
    async fn numbering_scans_the_local_collection() {
        let (_backend, store) = store();
        for day in [15, 16, 17] {
            store.add(Session::new("1", 0, date(2024, 1, day))).await.unwrap();
        }

        assert_eq!(store.next_number("1"), 4);
        assert_eq!(store.next_number("2"), 1);

        let numbers: Vec<u32> = store.by_tontine("1").iter().map(|s| s.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn duplicate_number_surfaces_backend_error() {
        let (backend, store) = store();
        store.add(Session::new("1", 0, date(2024, 1, 15))).await.unwrap();

        backend.fail_next(Error::unique("numero_seance duplicate"));
        let err = store.add(Session::new("1", 0, date(2024, 1, 16))).await.unwrap_err();
        assert!(matches!(err, Error::Unique { .. }));
        assert_eq!(store.by_tontine("1").len(), 1);
    }

    #[tokio::test]
    async fn close_applies_backend_outcome() {
        let (backend, store) = store();
        backend.seed(
            "tontine",
            vec![json!({"id": "1", "type": "presence", "montant_cotisation": 50_000, "statut": "Actif"})],
        );
        let session = store.add(Session::new("1", 0, date(2024, 1, 15))).await.unwrap();
        backend.seed(
            "cotisation",
            vec![json!({"id": "c1", "id_seance": session.id, "id_tontine": "1", "montant": 100_000, "statut": "complete"})],
        );

        let attendance = [Attendance::new("11", true), Attendance::new("12", false)];
        let outcome = store.close(&session.id, 5_000, &attendance).await.unwrap();

        assert_eq!(outcome.status, SessionStatus::Completed);
        assert_eq!(outcome.penalties_created.len(), 1);
        assert_eq!(outcome.total_contributions, 100_000);
        assert_eq!(outcome.total_penalties, 5_000);

        let local = store.by_id(&session.id).unwrap();
        assert_eq!(local.status, SessionStatus::Completed);
        assert_eq!(local.total_contributions, 100_000);
        assert_eq!(local.attendance_count, 1);
    }
}
