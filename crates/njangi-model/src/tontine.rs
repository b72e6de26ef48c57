//! Tontine (savings circle) records and member participation.

use crate::entity::Entity;
use crate::id::placeholder_id;
use crate::money::Amount;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A rotating savings circle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tontine {
    pub id: String,

    #[serde(rename = "nom")]
    pub name: String,

    /// Presence tontines penalize absentees at session close; optional
    /// tontines do not.
    #[serde(rename = "type")]
    pub kind: TontineKind,

    #[serde(rename = "montant_cotisation")]
    pub contribution_amount: Amount,

    #[serde(rename = "periode")]
    pub period: Period,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "date_debut")]
    pub start_date: NaiveDate,

    #[serde(rename = "date_fin", default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,

    #[serde(rename = "statut", default)]
    pub status: TontineStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TontineKind {
    #[default]
    #[serde(rename = "presence")]
    Presence,
    #[serde(rename = "optionnelle")]
    Optional,
}

/// Contribution period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "hebdomadaire")]
    Weekly,
    #[serde(rename = "bimensuelle")]
    Biweekly,
    #[serde(rename = "mensuelle")]
    Monthly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TontineStatus {
    #[default]
    #[serde(rename = "Actif")]
    Active,
    #[serde(rename = "Terminée")]
    Completed,
    #[serde(rename = "Annulée")]
    Cancelled,
}

impl Tontine {
    /// Create a new tontine with a placeholder id.
    pub fn new(
        name: impl Into<String>,
        kind: TontineKind,
        contribution_amount: Amount,
        period: Period,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            id: placeholder_id(),
            name: name.into(),
            kind,
            contribution_amount,
            period,
            description: None,
            start_date,
            end_date: None,
            status: TontineStatus::Active,
            created_at: None,
            updated_at: None,
        }
    }
}

impl Entity for Tontine {
    const TABLE: &'static str = "tontine";

    fn id(&self) -> &str {
        &self.id
    }
}

/// A member's enrollment in a tontine (the `participe` join table).
///
/// `shares` is the number of parts the member holds; expected
/// contributions scale with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participation {
    pub id: String,

    #[serde(rename = "id_membre")]
    pub member_id: String,

    #[serde(rename = "id_tontine")]
    pub tontine_id: String,

    #[serde(rename = "nb_parts")]
    pub shares: u32,

    #[serde(rename = "date_adhesion")]
    pub joined_on: NaiveDate,

    #[serde(rename = "statut", default)]
    pub status: ParticipationStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipationStatus {
    #[default]
    #[serde(rename = "actif")]
    Active,
    #[serde(rename = "inactif")]
    Inactive,
    #[serde(rename = "suspendu")]
    Suspended,
}

impl Participation {
    pub fn new(
        member_id: impl Into<String>,
        tontine_id: impl Into<String>,
        shares: u32,
        joined_on: NaiveDate,
    ) -> Self {
        Self {
            id: placeholder_id(),
            member_id: member_id.into(),
            tontine_id: tontine_id.into(),
            shares,
            joined_on,
            status: ParticipationStatus::Active,
            created_at: None,
        }
    }
}

impl Entity for Participation {
    const TABLE: &'static str = "participe";

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_kind_and_period() {
        let tontine = Tontine::new(
            "Tontine des Enseignants",
            TontineKind::Presence,
            50_000,
            Period::Monthly,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        );
        let json = serde_json::to_value(&tontine).unwrap();
        assert_eq!(json["type"], "presence");
        assert_eq!(json["periode"], "mensuelle");
        assert_eq!(json["montant_cotisation"], 50_000);
        assert_eq!(json["statut"], "Actif");
    }

    #[test]
    fn accented_statuses_roundtrip() {
        let row = serde_json::json!({
            "id": "3",
            "nom": "Solidarité",
            "type": "optionnelle",
            "montant_cotisation": 10_000,
            "periode": "hebdomadaire",
            "date_debut": "2024-02-01",
            "statut": "Terminée"
        });
        let tontine: Tontine = serde_json::from_value(row).unwrap();
        assert_eq!(tontine.status, TontineStatus::Completed);
        assert_eq!(tontine.kind, TontineKind::Optional);
    }

    #[test]
    fn participation_defaults_active() {
        let p = Participation::new("1", "2", 2, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["nb_parts"], 2);
        assert_eq!(json["statut"], "actif");
    }
}
