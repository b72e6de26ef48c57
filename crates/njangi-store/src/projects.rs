//! Project store.

use crate::collection::Collection;
use njangi_backend::{Backend, Error, Filter, Order, Result};
use njangi_model::{is_placeholder, Amount, Project, ProjectStatus};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

pub struct ProjectStore {
    collection: Collection<Project>,
}

/// Partial update for a project.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectPatch {
    #[serde(rename = "nom", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<Amount>,
    #[serde(rename = "date_cible", skip_serializing_if = "Option::is_none")]
    pub target_date: Option<chrono::NaiveDate>,
    #[serde(rename = "date_fin_reelle", skip_serializing_if = "Option::is_none")]
    pub completed_date: Option<chrono::NaiveDate>,
    #[serde(rename = "statut", skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(rename = "id_responsable", skip_serializing_if = "Option::is_none")]
    pub responsible_id: Option<String>,
}

impl ProjectStore {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { collection: Collection::new(backend) }
    }

    pub async fn fetch_all(&self) -> Result<()> {
        self.collection.fetch(Filter::none(), Some(Order::desc("date_debut"))).await
    }

    pub async fn add(&self, project: Project) -> Result<Project> {
        if is_placeholder(&project.tontine_id) {
            return Err(Error::validation(
                "Impossible de créer un projet pour une tontine non confirmée.",
            ));
        }
        if project.budget <= 0 {
            return Err(Error::validation("Le budget doit être supérieur à 0."));
        }
        self.collection.insert(&project).await
    }

    pub async fn update(&self, id: &str, patch: ProjectPatch) -> Result<Project> {
        let value = serde_json::to_value(&patch).map_err(Error::from)?;
        self.collection.update(id, value).await
    }

    /// Allocate funds to a project, capped at its budget.
    pub async fn allocate(&self, id: &str, amount: Amount) -> Result<Project> {
        let Some(project) = self.by_id(id) else {
            return Err(Error::not_found("projet"));
        };
        if amount <= 0 {
            return Err(Error::validation("Le montant doit être supérieur à 0."));
        }
        if project.allocated + amount > project.budget {
            return Err(Error::validation("L'allocation dépasse le budget du projet."));
        }
        self.collection
            .update(id, json!({"montant_alloue": project.allocated + amount}))
            .await
    }

    pub async fn remove(&self, id: &str) -> Result<()> {
        self.collection.remove(id).await
    }

    pub fn all(&self) -> Vec<Project> {
        self.collection.all()
    }

    pub fn by_id(&self, id: &str) -> Option<Project> {
        self.collection.by_id(id)
    }

    pub fn by_tontine(&self, tontine_id: &str) -> Vec<Project> {
        self.collection.find_all(|p| p.tontine_id == tontine_id)
    }

    pub fn active(&self) -> Vec<Project> {
        self.collection.find_all(Project::is_active)
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

    fn store() -> (Arc<MockBackend>, ProjectStore) {
        let backend = Arc::new(MockBackend::new());
        let store = ProjectStore::new(backend.clone());
        (backend, store)
    }

    fn forage() -> Project {
        Project::new("1", "Forage communautaire", 400_000, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
    }

    #[tokio::test]
    async fn allocation_is_capped_at_budget() {
        let (backend, store) = store();
        let project = store.add(forage()).await.unwrap();

        let funded = store.allocate(&project.id, 250_000).await.unwrap();
        assert_eq!(funded.allocated, 250_000);
        assert_eq!(funded.remaining_budget(), 150_000);

        let requests = backend.request_count();
        let err = store.allocate(&project.id, 150_001).await.unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert_eq!(backend.request_count(), requests);
    }

    #[tokio::test]
    async fn status_updates_flow_through_patch() {
        let (_backend, store) = store();
        let project = store.add(forage()).await.unwrap();

        let patch = ProjectPatch { status: Some(ProjectStatus::Fundraising), ..Default::default() };
        let updated = store.update(&project.id, patch).await.unwrap();
        assert_eq!(updated.status, ProjectStatus::Fundraising);
        assert_eq!(store.active().len(), 1);

        let patch = ProjectPatch { status: Some(ProjectStatus::Cancelled), ..Default::default() };
        store.update(&project.id, patch).await.unwrap();
        assert!(store.active().is_empty());
    }
}
