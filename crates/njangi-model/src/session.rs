//! Session (séance) records.

use crate::entity::Entity;
use crate::id::placeholder_id;
use crate::money::Amount;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One scheduled meeting of a tontine.
///
/// `number` is sequential and unique within the tontine. The aggregate
/// totals are populated by backend computation (notably at session close)
/// and are zero until then.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,

    #[serde(rename = "id_tontine")]
    pub tontine_id: String,

    #[serde(rename = "numero_seance")]
    pub number: u32,

    pub date: NaiveDate,

    #[serde(rename = "lieu", default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(rename = "ordre_du_jour", default, skip_serializing_if = "Option::is_none")]
    pub agenda: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(rename = "statut", default)]
    pub status: SessionStatus,

    #[serde(rename = "total_cotisations", default)]
    pub total_contributions: Amount,

    #[serde(rename = "total_penalites", default)]
    pub total_penalties: Amount,

    #[serde(rename = "nombre_presents", default)]
    pub attendance_count: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Session lifecycle. The closing procedure reports `cloturee`, accepted
/// here as an alias of `terminee`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionStatus {
    #[default]
    #[serde(rename = "programmee")]
    Scheduled,
    #[serde(rename = "en_cours")]
    Ongoing,
    #[serde(rename = "terminee", alias = "cloturee")]
    Completed,
    #[serde(rename = "annulee")]
    Cancelled,
}

impl Session {
    /// Create a session with a placeholder id.
    pub fn new(tontine_id: impl Into<String>, number: u32, date: NaiveDate) -> Self {
        Self {
            id: placeholder_id(),
            tontine_id: tontine_id.into(),
            number,
            date,
            location: None,
            agenda: None,
            notes: None,
            status: SessionStatus::Scheduled,
            total_contributions: 0,
            total_penalties: 0,
            attendance_count: 0,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.status, SessionStatus::Scheduled | SessionStatus::Ongoing)
    }
}

impl Entity for Session {
    const TABLE: &'static str = "seance";

    fn id(&self) -> &str {
        &self.id
    }
}
