//! Contribution (cotisation) records.

use crate::entity::Entity;
use crate::id::placeholder_id;
use crate::money::Amount;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A member's payment into a tontine for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub id: String,

    #[serde(rename = "id_membre")]
    pub member_id: String,

    #[serde(rename = "id_seance")]
    pub session_id: String,

    #[serde(rename = "id_tontine")]
    pub tontine_id: String,

    #[serde(rename = "montant")]
    pub amount: Amount,

    #[serde(rename = "montant_attendu")]
    pub expected_amount: Amount,

    #[serde(rename = "date_paiement")]
    pub payment_date: NaiveDate,

    #[serde(rename = "methode_paiement", default)]
    pub method: PaymentMethod,

    #[serde(rename = "statut", default)]
    pub status: ContributionStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[default]
    #[serde(rename = "especes")]
    Cash,
    #[serde(rename = "virement")]
    BankTransfer,
    #[serde(rename = "mobile_money")]
    MobileMoney,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ContributionStatus {
    #[default]
    #[serde(rename = "en_attente")]
    Pending,
    #[serde(rename = "partiel")]
    Partial,
    #[serde(rename = "complete")]
    Complete,
    #[serde(rename = "en_retard")]
    Late,
}

impl ContributionStatus {
    /// Derive the status from the paid/expected ratio.
    pub fn derive(paid: Amount, expected: Amount) -> Self {
        if paid <= 0 {
            ContributionStatus::Pending
        } else if paid < expected {
            ContributionStatus::Partial
        } else {
            ContributionStatus::Complete
        }
    }
}

impl Contribution {
    /// Create a contribution with a placeholder id; status is derived
    /// from the paid vs expected amounts.
    pub fn new(
        member_id: impl Into<String>,
        session_id: impl Into<String>,
        tontine_id: impl Into<String>,
        amount: Amount,
        expected_amount: Amount,
        payment_date: NaiveDate,
    ) -> Self {
        Self {
            id: placeholder_id(),
            member_id: member_id.into(),
            session_id: session_id.into(),
            tontine_id: tontine_id.into(),
            amount,
            expected_amount,
            payment_date,
            method: PaymentMethod::Cash,
            status: ContributionStatus::derive(amount, expected_amount),
            notes: None,
            created_at: None,
            updated_at: None,
        }
    }
}

impl Entity for Contribution {
    const TABLE: &'static str = "cotisation";

    fn id(&self) -> &str {
        &self.id
    }
}
