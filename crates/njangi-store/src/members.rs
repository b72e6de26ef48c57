//! Member store - the optimistic store.
//!
//! The member list is the shared resource several users edit at once, so
//! mutations here apply optimistically: the row appears (or changes, or
//! disappears) immediately and rolls back if the backend refuses.

use crate::collection::Collection;
use njangi_backend::{Backend, Error, Filter, Order, Result};
use njangi_model::{Member, MemberStatus};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

pub struct MemberStore {
    collection: Collection<Member>,
}

/// Partial update for a member. Only the present fields are sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MemberPatch {
    #[serde(rename = "prenom", skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(rename = "nom", skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "telephone", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "adresse", skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commune: Option<String>,
    #[serde(rename = "statut", skip_serializing_if = "Option::is_none")]
    pub status: Option<MemberStatus>,
}

impl MemberPatch {
    fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(Error::from)
    }

    fn apply(&self, member: &mut Member) {
        if let Some(v) = &self.first_name {
            member.first_name = v.clone();
        }
        if let Some(v) = &self.last_name {
            member.last_name = v.clone();
        }
        if let Some(v) = &self.email {
            member.email = v.clone();
        }
        if let Some(v) = &self.phone {
            member.phone = v.clone();
        }
        if let Some(v) = &self.address {
            member.address = Some(v.clone());
        }
        if let Some(v) = &self.commune {
            member.commune = Some(v.clone());
        }
        if let Some(v) = self.status {
            member.status = v;
        }
    }
}

impl MemberStore {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { collection: Collection::new(backend) }
    }

    pub async fn fetch_all(&self) -> Result<()> {
        self.collection.fetch(Filter::none(), Some(Order::asc("nom"))).await
    }

    /// Optimistic add: the member appears immediately under a placeholder
    /// id and is replaced by the backend's canonical record. Until the
    /// swap, the placeholder must not be referenced by any other entity.
    pub async fn add(&self, member: Member) -> Result<Member> {
        self.collection.insert_optimistic(member).await
    }

    /// Optimistic partial update with snapshot restore on failure.
    pub async fn update(&self, id: &str, patch: MemberPatch) -> Result<Member> {
        let value = patch.to_value()?;
        self.collection.update_optimistic(id, |m| patch.apply(m), value).await
    }

    /// Optimistic removal with snapshot restore on failure.
    pub async fn remove(&self, id: &str) -> Result<()> {
        self.collection.remove_optimistic(id).await
    }

    pub fn all(&self) -> Vec<Member> {
        self.collection.all()
    }

    pub fn by_id(&self, id: &str) -> Option<Member> {
        self.collection.by_id(id)
    }

    pub fn by_status(&self, status: MemberStatus) -> Vec<Member> {
        self.collection.find_all(|m| m.status == status)
    }

    pub fn active(&self) -> Vec<Member> {
        self.by_status(MemberStatus::Active)
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
    use njangi_model::is_placeholder;

    fn store() -> (Arc<MockBackend>, MemberStore) {
        let backend = Arc::new(MockBackend::new());
        let store = MemberStore::new(backend.clone());
        (backend, store)
    }

    fn jean() -> Member {
        Member::new(
            "Jean",
            "Dupont",
            "jean.dupont@example.com",
            "+237 6 77 88 99 00",
            NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
        )
    }

    #[tokio::test]
    async fn add_confirms_server_id() {
        let (_backend, store) = store();
        let created = store.add(jean()).await.unwrap();
        assert!(!is_placeholder(&created.id));
        assert_eq!(store.by_id(&created.id).unwrap().full_name(), "Jean Dupont");
    }

    #[tokio::test]
    async fn partial_update_only_sends_changed_fields() {
        let patch = MemberPatch { phone: Some("+237 6 11 22 33 44".into()), ..Default::default() };
        let value = patch.to_value().unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 1);
        assert!(object.contains_key("telephone"));
    }

    #[tokio::test]
    async fn update_rolls_back_and_reports() {
        let (backend, store) = store();
        let created = store.add(jean()).await.unwrap();

        backend.fail_next(Error::check("invalid email"));
        let patch = MemberPatch { email: Some("not-an-email".into()), ..Default::default() };
        store.update(&created.id, patch).await.unwrap_err();

        assert_eq!(store.by_id(&created.id).unwrap().email, "jean.dupont@example.com");
        assert!(store.last_error().is_some());
    }

    #[tokio::test]
    async fn status_getters_filter_locally() {
        let (backend, store) = store();
        store.add(jean()).await.unwrap();
        let mut marie = Member::new(
            "Marie",
            "Kamga",
            "marie.kamga@example.com",
            "+237 6 55 44 33 22",
            NaiveDate::from_ymd_opt(2024, 1, 12).unwrap(),
        );
        marie.status = MemberStatus::Inactive;
        store.add(marie).await.unwrap();

        let requests = backend.request_count();
        assert_eq!(store.active().len(), 1);
        assert_eq!(store.by_status(MemberStatus::Inactive).len(), 1);
        // Derived getters never touch the network.
        assert_eq!(backend.request_count(), requests);
    }
}
