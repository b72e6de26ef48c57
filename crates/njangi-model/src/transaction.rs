//! Transaction ledger entries.

use crate::entity::Entity;
use crate::id::placeholder_id;
use crate::money::Amount;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An append-only ledger entry recording money moving in or out of a
/// tontine. Entries are never mutated after creation, only inserted or
/// deleted wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,

    #[serde(rename = "id_tontine")]
    pub tontine_id: String,

    #[serde(rename = "type")]
    pub kind: TransactionKind,

    /// Signed: positive for money in, negative for money out.
    #[serde(rename = "montant")]
    pub amount: Amount,

    pub description: String,

    #[serde(rename = "id_reference", default, skip_serializing_if = "Option::is_none")]
    pub related_id: Option<String>,

    #[serde(rename = "type_reference", default, skip_serializing_if = "Option::is_none")]
    pub related_kind: Option<RelatedKind>,

    #[serde(rename = "id_membre", default, skip_serializing_if = "Option::is_none")]
    pub member_id: Option<String>,

    #[serde(rename = "id_seance", default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// What moved the money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Contribution,
    CreditGranted,
    CreditRepayment,
    Penalty,
    TourDistribution,
    ProjectExpense,
    InitialFunding,
    Adjustment,
}

/// Entity a ledger entry points back at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelatedKind {
    Credit,
    Tour,
    Project,
    Session,
    Penalty,
}

impl Transaction {
    /// Create a ledger entry with a placeholder id.
    pub fn new(
        tontine_id: impl Into<String>,
        kind: TransactionKind,
        amount: Amount,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: placeholder_id(),
            tontine_id: tontine_id.into(),
            kind,
            amount,
            description: description.into(),
            related_id: None,
            related_kind: None,
            member_id: None,
            session_id: None,
            created_at: None,
        }
    }

    pub fn is_inflow(&self) -> bool {
        self.amount > 0
    }
}

impl Entity for Transaction {
    const TABLE: &'static str = "transaction";

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_wire_values() {
        let entry = Transaction::new("1", TransactionKind::TourDistribution, -150_000, "Tour #2");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "tour_distribution");
        assert_eq!(json["montant"], -150_000);
        assert!(!entry.is_inflow());
    }

    #[test]
    fn related_entity_roundtrip() {
        let mut entry = Transaction::new("1", TransactionKind::Contribution, 20_000, "Cotisation");
        entry.related_id = Some("8".into());
        entry.related_kind = Some(RelatedKind::Session);
        let json = serde_json::to_string(&entry).unwrap();
        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }
}
