//! Tour (payout round) records.

use crate::entity::Entity;
use crate::id::placeholder_id;
use crate::money::Amount;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A payout distributing pooled funds to one beneficiary member.
///
/// `number` is sequential and unique within the tontine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tour {
    pub id: String,

    #[serde(rename = "id_tontine")]
    pub tontine_id: String,

    #[serde(rename = "id_seance", default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    #[serde(rename = "id_beneficiaire")]
    pub beneficiary_id: String,

    #[serde(rename = "numero")]
    pub number: u32,

    pub date: NaiveDate,

    #[serde(rename = "montant_distribue")]
    pub amount: Amount,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Tour {
    /// Create a tour with a placeholder id.
    pub fn new(
        tontine_id: impl Into<String>,
        beneficiary_id: impl Into<String>,
        number: u32,
        amount: Amount,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: placeholder_id(),
            tontine_id: tontine_id.into(),
            session_id: None,
            beneficiary_id: beneficiary_id.into(),
            number,
            date,
            amount,
            notes: None,
            created_at: None,
            updated_at: None,
        }
    }
}

impl Entity for Tour {
    const TABLE: &'static str = "tour";

    fn id(&self) -> &str {
        &self.id
    }
}
