//! Credit (internal loan) records.

use crate::entity::Entity;
use crate::id::placeholder_id;
use crate::money::Amount;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Total owed on a credit: principal plus simple interest, rounded to
/// whole francs. No compounding.
pub fn repayment_total(principal: Amount, interest_rate: f64) -> Amount {
    principal + (principal as f64 * interest_rate / 100.0).round() as Amount
}

/// An internal loan from a tontine's pooled funds to a member.
///
/// `remaining` never increases and never exceeds the repayment total;
/// `amount_repaid` never decreases. Both are maintained against the
/// backend's canonical values after every repayment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credit {
    pub id: String,

    #[serde(rename = "id_membre")]
    pub member_id: String,

    #[serde(rename = "id_tontine", default, skip_serializing_if = "Option::is_none")]
    pub tontine_id: Option<String>,

    #[serde(rename = "montant")]
    pub principal: Amount,

    /// Outstanding balance (`solde`).
    #[serde(rename = "solde")]
    pub remaining: Amount,

    /// Simple interest rate, in percent.
    #[serde(rename = "taux_interet")]
    pub interest_rate: f64,

    #[serde(rename = "objet", default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,

    #[serde(rename = "date_demande")]
    pub requested_date: NaiveDate,

    #[serde(rename = "date_decaissement", default, skip_serializing_if = "Option::is_none")]
    pub disbursement_date: Option<NaiveDate>,

    #[serde(rename = "date_remboursement_prevue")]
    pub due_date: NaiveDate,

    #[serde(rename = "montant_rembourse", default)]
    pub amount_repaid: Amount,

    #[serde(rename = "statut", default)]
    pub status: CreditStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Credit lifecycle: pending → approved → disbursed → repaying →
/// completed, or → defaulted once overdue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CreditStatus {
    #[default]
    #[serde(rename = "en_attente")]
    Pending,
    #[serde(rename = "approuve")]
    Approved,
    #[serde(rename = "decaisse")]
    Disbursed,
    #[serde(rename = "en_cours")]
    Repaying,
    #[serde(rename = "rembourse")]
    Completed,
    #[serde(rename = "en_retard", alias = "defaut")]
    Defaulted,
}

impl Credit {
    /// Create a credit request with a placeholder id. The outstanding
    /// balance starts at the full repayment total.
    pub fn new(
        member_id: impl Into<String>,
        principal: Amount,
        interest_rate: f64,
        requested_date: NaiveDate,
        due_date: NaiveDate,
    ) -> Self {
        Self {
            id: placeholder_id(),
            member_id: member_id.into(),
            tontine_id: None,
            principal,
            remaining: repayment_total(principal, interest_rate),
            interest_rate,
            purpose: None,
            requested_date,
            disbursement_date: None,
            due_date,
            amount_repaid: 0,
            status: CreditStatus::Pending,
            notes: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Principal plus simple interest.
    pub fn repayment_total(&self) -> Amount {
        repayment_total(self.principal, self.interest_rate)
    }

    /// Disbursed money that is still being (or failing to be) repaid.
    pub fn is_active(&self) -> bool {
        matches!(
            self.status,
            CreditStatus::Disbursed | CreditStatus::Repaying | CreditStatus::Defaulted
        )
    }

    /// Past due with an outstanding balance.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.remaining > 0 && self.due_date < today && self.is_active()
    }
}

impl Entity for Credit {
    const TABLE: &'static str = "credit";

    fn id(&self) -> &str {
        &self.id
    }
}
