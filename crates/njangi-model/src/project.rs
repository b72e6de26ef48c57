//! Community project records.

use crate::entity::Entity;
use crate::id::placeholder_id;
use crate::money::Amount;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A community project funded from a tontine's pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,

    #[serde(rename = "id_tontine")]
    pub tontine_id: String,

    #[serde(rename = "id_responsable", default, skip_serializing_if = "Option::is_none")]
    pub responsible_id: Option<String>,

    #[serde(rename = "nom")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub budget: Amount,

    #[serde(rename = "montant_alloue", default)]
    pub allocated: Amount,

    #[serde(rename = "date_debut")]
    pub start_date: NaiveDate,

    #[serde(rename = "date_cible", default, skip_serializing_if = "Option::is_none")]
    pub target_date: Option<NaiveDate>,

    #[serde(rename = "date_fin_reelle", default, skip_serializing_if = "Option::is_none")]
    pub completed_date: Option<NaiveDate>,

    #[serde(rename = "statut", default)]
    pub status: ProjectStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Project lifecycle: planned → fundraising → in progress → completed,
/// or cancelled at any point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProjectStatus {
    #[default]
    #[serde(rename = "planifie")]
    Planned,
    #[serde(rename = "collecte_fonds")]
    Fundraising,
    #[serde(rename = "en_cours")]
    InProgress,
    #[serde(rename = "termine")]
    Completed,
    #[serde(rename = "annule")]
    Cancelled,
}

impl Project {
    /// Create a project with a placeholder id.
    pub fn new(
        tontine_id: impl Into<String>,
        name: impl Into<String>,
        budget: Amount,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            id: placeholder_id(),
            tontine_id: tontine_id.into(),
            responsible_id: None,
            name: name.into(),
            description: None,
            budget,
            allocated: 0,
            start_date,
            target_date: None,
            completed_date: None,
            status: ProjectStatus::Planned,
            notes: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Budget not yet allocated.
    pub fn remaining_budget(&self) -> Amount {
        (self.budget - self.allocated).max(0)
    }

    pub fn is_active(&self) -> bool {
        matches!(
            self.status,
            ProjectStatus::Planned | ProjectStatus::Fundraising | ProjectStatus::InProgress
        )
    }
}

impl Entity for Project {
    const TABLE: &'static str = "projet";

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_budget_never_negative() {
        let mut project = Project::new("1", "Moulin", 400_000, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(project.remaining_budget(), 400_000);
        project.allocated = 450_000;
        assert_eq!(project.remaining_budget(), 0);
    }

    #[test]
    fn wire_status_values() {
        let mut project = Project::new("1", "Forage", 1_000_000, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        project.status = ProjectStatus::Fundraising;
        let json = serde_json::to_value(&project).unwrap();
        assert_eq!(json["statut"], "collecte_fonds");
        assert_eq!(json["montant_alloue"], 0);
    }
}
