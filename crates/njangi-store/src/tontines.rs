//! Tontine store, including member participation.

use crate::collection::Collection;
use chrono::Utc;
use njangi_backend::{Backend, Error, Result};
use njangi_model::{is_placeholder, Amount, Participation, Period, Tontine, TontineStatus};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

pub struct TontineStore {
    tontines: Collection<Tontine>,
    participations: Collection<Participation>,
}

/// Partial update for a tontine.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TontinePatch {
    #[serde(rename = "nom", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "montant_cotisation", skip_serializing_if = "Option::is_none")]
    pub contribution_amount: Option<Amount>,
    #[serde(rename = "periode", skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
    #[serde(rename = "date_fin", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<chrono::NaiveDate>,
    #[serde(rename = "statut", skip_serializing_if = "Option::is_none")]
    pub status: Option<TontineStatus>,
}

impl TontinePatch {
    fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(Error::from)
    }
}

impl TontineStore {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            tontines: Collection::new(backend.clone()),
            participations: Collection::new(backend),
        }
    }

    pub async fn fetch_all(&self) -> Result<()> {
        self.tontines.fetch_all().await
    }

    pub async fn fetch_participations(&self) -> Result<()> {
        self.participations.fetch_all().await
    }

    pub async fn add(&self, tontine: Tontine) -> Result<Tontine> {
        self.tontines.insert(&tontine).await
    }

    pub async fn update(&self, id: &str, patch: TontinePatch) -> Result<Tontine> {
        self.tontines.update(id, patch.to_value()?).await
    }

    pub async fn remove(&self, id: &str) -> Result<()> {
        self.tontines.remove(id).await
    }

    /// Enroll a member. Placeholder ids are rejected: an unconfirmed
    /// record must not be referenced by a foreign key.
    pub async fn register_member(
        &self,
        member_id: &str,
        tontine_id: &str,
        shares: u32,
    ) -> Result<Participation> {
        if is_placeholder(member_id) || is_placeholder(tontine_id) {
            return Err(Error::validation(
                "Impossible d'inscrire un enregistrement non encore confirmé.",
            ));
        }
        let participation =
            Participation::new(member_id, tontine_id, shares, Utc::now().date_naive());
        self.participations.insert(&participation).await
    }

    /// Drop a member's enrollment.
    pub async fn unregister_member(&self, member_id: &str, tontine_id: &str) -> Result<()> {
        let Some(participation) = self
            .participations
            .find_all(|p| p.member_id == member_id && p.tontine_id == tontine_id)
            .into_iter()
            .next()
        else {
            return Err(Error::not_found("participe"));
        };
        self.participations.remove(&participation.id).await
    }

    pub fn all(&self) -> Vec<Tontine> {
        self.tontines.all()
    }

    pub fn by_id(&self, id: &str) -> Option<Tontine> {
        self.tontines.by_id(id)
    }

    pub fn by_status(&self, status: TontineStatus) -> Vec<Tontine> {
        self.tontines.find_all(|t| t.status == status)
    }

    pub fn active(&self) -> Vec<Tontine> {
        self.by_status(TontineStatus::Active)
    }

    /// Members enrolled in a tontine.
    pub fn member_ids(&self, tontine_id: &str) -> Vec<String> {
        self.participations
            .find_all(|p| p.tontine_id == tontine_id)
            .into_iter()
            .map(|p| p.member_id)
            .collect()
    }

    pub fn member_count(&self, tontine_id: &str) -> usize {
        self.member_ids(tontine_id).len()
    }

    /// Share count a member holds in a tontine (1 if not found).
    pub fn shares_of(&self, member_id: &str, tontine_id: &str) -> u32 {
        self.participations
            .find_all(|p| p.member_id == member_id && p.tontine_id == tontine_id)
            .first()
            .map(|p| p.shares)
            .unwrap_or(1)
    }

    /// Tontines a member is enrolled in.
    pub fn tontines_of_member(&self, member_id: &str) -> Vec<Tontine> {
        let ids: Vec<String> = self
            .participations
            .find_all(|p| p.member_id == member_id)
            .into_iter()
            .map(|p| p.tontine_id)
            .collect();
        self.tontines.find_all(|t| ids.contains(&t.id))
    }

    pub fn is_loading(&self) -> bool {
        self.tontines.is_loading()
    }

    pub fn last_error(&self) -> Option<String> {
        self.tontines.last_error().or_else(|| self.participations.last_error())
    }

    pub fn clear_error(&self) {
        self.tontines.clear_error();
        self.participations.clear_error();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use njangi_backend::MockBackend;
    use njangi_model::{placeholder_id, TontineKind};

    fn store() -> (Arc<MockBackend>, TontineStore) {
        let backend = Arc::new(MockBackend::new());
        let store = TontineStore::new(backend.clone());
        (backend, store)
    }

    fn enseignants() -> Tontine {
        Tontine::new(
            "Tontine des Enseignants",
            TontineKind::Presence,
            50_000,
            Period::Monthly,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        )
    }

    #[tokio::test]
    async fn add_is_not_applied_until_confirmed() {
        let (backend, store) = store();
        backend.fail_next(Error::network("down"));
        store.add(enseignants()).await.unwrap_err();
        assert!(store.all().is_empty());
        assert!(store.last_error().is_some());
    }

    #[tokio::test]
    async fn register_member_tracks_participation() {
        let (_backend, store) = store();
        let tontine = store.add(enseignants()).await.unwrap();
        store.register_member("11", &tontine.id, 2).await.unwrap();
        store.register_member("12", &tontine.id, 1).await.unwrap();

        assert_eq!(store.member_count(&tontine.id), 2);
        assert_eq!(store.shares_of("11", &tontine.id), 2);
        assert_eq!(store.shares_of("99", &tontine.id), 1);
    }

    #[tokio::test]
    async fn register_member_rejects_placeholders() {
        let (backend, store) = store();
        let tontine = store.add(enseignants()).await.unwrap();

        let requests = backend.request_count();
        let err = store.register_member(&placeholder_id(), &tontine.id, 1).await.unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        // Rejected before any network call.
        assert_eq!(backend.request_count(), requests);
    }
}
