//! Dashboard statistics.
//!
//! The backend's `get_statistiques_dashboard` procedure computes the
//! summary in one round-trip. When the procedure fails, the store falls
//! back to assembling the same figures client-side from plain queries,
//! the way the rest of the data layer reads tables.

use njangi_backend::{Backend, Error, Filter, Order, Result};
use njangi_model::Amount;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

/// Financial summary shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DashboardStats {
    #[serde(rename = "total_membres")]
    pub total_members: u64,
    #[serde(rename = "total_tontines")]
    pub total_tontines: u64,
    /// Contributions minus distributions.
    #[serde(rename = "caisse")]
    pub cash_on_hand: Amount,
    #[serde(rename = "credits_actifs")]
    pub active_credits: u64,
    #[serde(rename = "montant_credits_actifs")]
    pub active_credit_amount: Amount,
    #[serde(rename = "penalites_non_payees")]
    pub unpaid_penalties: u64,
    #[serde(rename = "montant_penalites_non_payees")]
    pub unpaid_penalty_amount: Amount,
    #[serde(rename = "projets_actifs")]
    pub active_projects: u64,
    #[serde(rename = "total_cotisations")]
    pub total_contributions: Amount,
    #[serde(rename = "total_tours")]
    pub total_distributed: Amount,
    #[serde(rename = "dernieres_seances", default)]
    pub latest_sessions: Vec<SessionDigest>,
}

/// One line of the recent-sessions list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDigest {
    pub id: String,
    pub date: String,
    #[serde(rename = "lieu", default)]
    pub location: Option<String>,
    #[serde(rename = "statut", default)]
    pub status: String,
    #[serde(rename = "total_cotisations", default)]
    pub total_contributions: Amount,
}

pub struct DashboardStore {
    backend: Arc<dyn Backend>,
    stats: RwLock<Option<DashboardStats>>,
    loading: AtomicBool,
    last_error: RwLock<Option<String>>,
}

impl DashboardStore {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            stats: RwLock::new(None),
            loading: AtomicBool::new(false),
            last_error: RwLock::new(None),
        }
    }

    /// Refresh the summary: procedure first, client-side aggregation as
    /// the fallback. Previous stats are preserved when both fail.
    pub async fn fetch(&self) -> Result<()> {
        self.loading.store(true, Ordering::Relaxed);
        let result = self.fetch_inner().await;
        self.loading.store(false, Ordering::Relaxed);

        match result {
            Ok(stats) => {
                *self.stats.write().unwrap() = Some(stats);
                Ok(())
            }
            Err(error) => {
                *self.last_error.write().unwrap() = Some(error.user_message());
                Err(error)
            }
        }
    }

    async fn fetch_inner(&self) -> Result<DashboardStats> {
        match self.backend.call_procedure("get_statistiques_dashboard", Value::Null).await {
            Ok(value) => serde_json::from_value(value).map_err(Error::from),
            Err(_) => self.compute_fallback().await,
        }
    }

    /// The manual aggregation used when the procedure is unavailable.
    async fn compute_fallback(&self) -> Result<DashboardStats> {
        let members = self.backend.query("membre", Filter::eq("statut", "Actif"), None).await?;
        let tontines = self.backend.query("tontine", Filter::eq("statut", "Actif"), None).await?;
        let contributions = self.backend.query("cotisation", Filter::none(), None).await?;
        let tours = self.backend.query("tour", Filter::none(), None).await?;
        let credits = self
            .backend
            .query(
                "credit",
                Filter::eq_any("statut", vec!["decaisse".into(), "en_cours".into()]),
                None,
            )
            .await?;
        let penalties = self.backend.query("penalite", Filter::eq("statut", "non_paye"), None).await?;
        let projects = self
            .backend
            .query(
                "projet",
                Filter::eq_any(
                    "statut",
                    vec!["planifie".into(), "collecte_fonds".into(), "en_cours".into()],
                ),
                None,
            )
            .await?;
        let sessions = self
            .backend
            .query("seance", Filter::none(), Some(Order::desc("date")))
            .await?;

        let total_contributions = sum(&contributions, "montant");
        let total_distributed = sum(&tours, "montant_distribue");

        let latest_sessions = sessions
            .iter()
            .take(5)
            .map(|s| SessionDigest {
                id: field_str(s, "id"),
                date: field_str(s, "date"),
                location: s.get("lieu").and_then(Value::as_str).map(str::to_string),
                status: field_str(s, "statut"),
                total_contributions: s
                    .get("total_cotisations")
                    .and_then(Value::as_i64)
                    .unwrap_or(0),
            })
            .collect();

        Ok(DashboardStats {
            total_members: members.len() as u64,
            total_tontines: tontines.len() as u64,
            cash_on_hand: total_contributions - total_distributed,
            active_credits: credits.len() as u64,
            active_credit_amount: sum(&credits, "solde"),
            unpaid_penalties: penalties.len() as u64,
            unpaid_penalty_amount: sum(&penalties, "montant"),
            active_projects: projects.len() as u64,
            total_contributions,
            total_distributed,
            latest_sessions,
        })
    }

    /// Last fetched summary, if any.
    pub fn stats(&self) -> Option<DashboardStats> {
        self.stats.read().unwrap().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Relaxed)
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().unwrap().clone()
    }

    pub fn clear_error(&self) {
        *self.last_error.write().unwrap() = None;
    }
}

fn sum(rows: &[Value], key: &str) -> Amount {
    rows.iter().map(|r| r.get(key).and_then(Value::as_i64).unwrap_or(0)).sum()
}

fn field_str(row: &Value, key: &str) -> String {
    row.get(key).and_then(Value::as_str).unwrap_or("").to_string()
}
