//! Member records.

use crate::entity::Entity;
use crate::id::placeholder_id;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A member of one or more tontines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,

    #[serde(rename = "nom")]
    pub last_name: String,

    #[serde(rename = "prenom")]
    pub first_name: String,

    pub email: String,

    #[serde(rename = "telephone")]
    pub phone: String,

    #[serde(rename = "adresse", default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commune: Option<String>,

    #[serde(rename = "statut", default)]
    pub status: MemberStatus,

    #[serde(rename = "date_inscription")]
    pub joined_date: NaiveDate,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Membership status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MemberStatus {
    #[default]
    #[serde(rename = "Actif")]
    Active,
    #[serde(rename = "Inactif")]
    Inactive,
    #[serde(rename = "Suspendu")]
    Suspended,
}

impl Member {
    /// Create a new member with a placeholder id; the backend assigns the
    /// durable identifier on insert.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
        joined_date: NaiveDate,
    ) -> Self {
        Self {
            id: placeholder_id(),
            last_name: last_name.into(),
            first_name: first_name.into(),
            email: email.into(),
            phone: phone.into(),
            address: None,
            commune: None,
            status: MemberStatus::Active,
            joined_date,
            created_at: None,
            updated_at: None,
        }
    }

    /// Display name, `"Prenom Nom"`.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl Entity for Member {
    const TABLE: &'static str = "membre";

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::is_placeholder;

    fn jean() -> Member {
        Member::new(
            "Jean",
            "Dupont",
            "jean.dupont@example.com",
            "+237 6 77 88 99 00",
            NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
        )
    }

    #[test]
    fn new_member_is_placeholder() {
        let member = jean();
        assert!(is_placeholder(&member.id));
        assert_eq!(member.status, MemberStatus::Active);
        assert_eq!(member.full_name(), "Jean Dupont");
    }

    #[test]
    fn wire_names_are_french() {
        let json = serde_json::to_value(jean()).unwrap();
        assert_eq!(json["nom"], "Dupont");
        assert_eq!(json["prenom"], "Jean");
        assert_eq!(json["telephone"], "+237 6 77 88 99 00");
        assert_eq!(json["statut"], "Actif");
        assert_eq!(json["date_inscription"], "2024-01-10");
    }

    #[test]
    fn deserializes_backend_row() {
        let row = serde_json::json!({
            "id": "7",
            "nom": "Kamga",
            "prenom": "Marie",
            "email": "marie.kamga@example.com",
            "telephone": "+237 6 55 44 33 22",
            "adresse": "Douala",
            "statut": "Suspendu",
            "date_inscription": "2024-01-12"
        });
        let member: Member = serde_json::from_value(row).unwrap();
        assert_eq!(member.id, "7");
        assert_eq!(member.status, MemberStatus::Suspended);
        assert_eq!(member.commune, None);
    }
}
