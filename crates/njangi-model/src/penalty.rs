//! Penalty (pénalité) records.

use crate::entity::Entity;
use crate::id::placeholder_id;
use crate::money::Amount;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A charge levied against a member, payable in partial installments.
///
/// `amount_paid` never decreases and is capped at `amount`; the backend's
/// payment procedure owns that arithmetic, the client only validates
/// bounds before calling it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Penalty {
    pub id: String,

    #[serde(rename = "id_membre")]
    pub member_id: String,

    #[serde(rename = "id_seance", default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    #[serde(rename = "id_tontine", default, skip_serializing_if = "Option::is_none")]
    pub tontine_id: Option<String>,

    #[serde(rename = "montant")]
    pub amount: Amount,

    #[serde(rename = "montant_paye", default)]
    pub amount_paid: Amount,

    #[serde(rename = "raison")]
    pub reason: String,

    #[serde(rename = "type_penalite", default)]
    pub kind: PenaltyKind,

    pub date: NaiveDate,

    #[serde(rename = "date_paiement", default, skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<NaiveDate>,

    #[serde(rename = "statut", default)]
    pub status: PenaltyStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PenaltyKind {
    #[serde(rename = "absence")]
    Absence,
    #[serde(rename = "retard_cotisation")]
    LateContribution,
    #[serde(rename = "mauvaise_conduite")]
    Misconduct,
    #[default]
    #[serde(rename = "autre")]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PenaltyStatus {
    #[default]
    #[serde(rename = "non_paye")]
    Unpaid,
    #[serde(rename = "partiellement_paye")]
    PartiallyPaid,
    #[serde(rename = "paye")]
    Paid,
    #[serde(rename = "annule")]
    Cancelled,
}

impl Penalty {
    /// Create a penalty with a placeholder id.
    pub fn new(
        member_id: impl Into<String>,
        amount: Amount,
        reason: impl Into<String>,
        kind: PenaltyKind,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: placeholder_id(),
            member_id: member_id.into(),
            session_id: None,
            tontine_id: None,
            amount,
            amount_paid: 0,
            reason: reason.into(),
            kind,
            date,
            payment_date: None,
            status: PenaltyStatus::Unpaid,
            notes: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Amount still owed.
    pub fn remaining(&self) -> Amount {
        (self.amount - self.amount_paid).max(0)
    }

    /// Fully paid or cancelled; nothing more can be collected.
    pub fn is_settled(&self) -> bool {
        matches!(self.status, PenaltyStatus::Paid | PenaltyStatus::Cancelled)
    }
}

impl Entity for Penalty {
    const TABLE: &'static str = "penalite";

    fn id(&self) -> &str {
        &self.id
    }
}
