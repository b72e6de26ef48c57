//! In-memory backend for tests.
//!
//! Stores tables of JSON rows, assigns numeric string identifiers, honors
//! the filter/order subset the stores use, and answers the fixed stored
//! procedures with faithful simplified semantics. Failures can be
//! scripted with [`MockBackend::fail_next`] to exercise rollback paths.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::filter::{Filter, Order};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::cmp::Ordering as CmpOrdering;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// In-memory [`Backend`] implementation.
pub struct MockBackend {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    script: Mutex<VecDeque<Option<Error>>>,
    next_id: AtomicU64,
    requests: AtomicU64,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
            script: Mutex::new(VecDeque::new()),
            next_id: AtomicU64::new(1000),
            requests: AtomicU64::new(0),
        }
    }

    /// Pre-load rows into a table, as-is.
    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        self.tables.lock().unwrap().entry(table.to_string()).or_default().extend(rows);
    }

    /// Script the next backend operation to fail with the given error.
    /// Scripted outcomes apply in order; unscripted operations succeed.
    pub fn fail_next(&self, error: Error) {
        self.script.lock().unwrap().push_back(Some(error));
    }

    /// Script the next backend operation to succeed, so a following
    /// [`fail_next`](Self::fail_next) targets the operation after it.
    pub fn pass_next(&self) {
        self.script.lock().unwrap().push_back(None);
    }

    /// Number of operations that reached the backend (scripted failures
    /// included; client-side rejections never get here).
    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Snapshot of a table's rows.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables.lock().unwrap().get(table).cloned().unwrap_or_default()
    }

    fn begin(&self) -> Result<()> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        match self.script.lock().unwrap().pop_front() {
            Some(Some(error)) => Err(error),
            _ => Ok(()),
        }
    }

    fn gen_id(&self) -> String {
        self.next_id.fetch_add(1, Ordering::Relaxed).to_string()
    }

    fn now() -> String {
        chrono::Utc::now().to_rfc3339()
    }

    fn today() -> String {
        chrono::Utc::now().date_naive().to_string()
    }
}

fn amount(row: &Value, key: &str) -> i64 {
    row.get(key).and_then(Value::as_i64).unwrap_or(0)
}

fn text<'a>(row: &'a Value, key: &str) -> &'a str {
    row.get(key).and_then(Value::as_str).unwrap_or("")
}

fn cmp_values(a: &Value, b: &Value) -> CmpOrdering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(CmpOrdering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => CmpOrdering::Equal,
    }
}

fn sum_where(rows: &[Value], filter: impl Fn(&Value) -> bool, key: &str) -> i64 {
    rows.iter().filter(|r| filter(r)).map(|r| amount(r, key)).sum()
}

#[async_trait]
impl Backend for MockBackend {
    async fn query(&self, table: &str, filter: Filter, order: Option<Order>) -> Result<Vec<Value>> {
        self.begin()?;
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<Value> = tables
            .get(table)
            .map(|rows| rows.iter().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default();

        if let Some(order) = order {
            rows.sort_by(|a, b| {
                let cmp = cmp_values(
                    a.get(&order.column).unwrap_or(&Value::Null),
                    b.get(&order.column).unwrap_or(&Value::Null),
                );
                if order.ascending {
                    cmp
                } else {
                    cmp.reverse()
                }
            });
        }

        Ok(rows)
    }

    async fn insert(&self, table: &str, record: Value) -> Result<Value> {
        self.begin()?;
        let mut row = record;
        let object = row
            .as_object_mut()
            .ok_or_else(|| Error::validation("insert payload must be an object"))?;

        object.insert("id".to_string(), json!(self.gen_id()));
        object.entry("created_at").or_insert_with(|| json!(Self::now()));
        object.entry("updated_at").or_insert_with(|| json!(Self::now()));

        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        Ok(row)
    }

    async fn update(&self, table: &str, id: &str, patch: Value) -> Result<Value> {
        self.begin()?;
        let patch = patch
            .as_object()
            .cloned()
            .ok_or_else(|| Error::validation("update payload must be an object"))?;

        let mut tables = self.tables.lock().unwrap();
        let rows = tables
            .get_mut(table)
            .ok_or_else(|| Error::not_found(table.to_string()))?;
        let row = rows
            .iter_mut()
            .find(|r| text(r, "id") == id)
            .ok_or_else(|| Error::not_found(format!("{table}/{id}")))?;

        let object = row.as_object_mut().expect("mock rows are objects");
        for (key, value) in patch {
            object.insert(key, value);
        }
        object.insert("updated_at".to_string(), json!(Self::now()));

        Ok(row.clone())
    }

    async fn remove(&self, table: &str, id: &str) -> Result<()> {
        self.begin()?;
        let mut tables = self.tables.lock().unwrap();
        let rows = tables
            .get_mut(table)
            .ok_or_else(|| Error::not_found(table.to_string()))?;
        let before = rows.len();
        rows.retain(|r| text(r, "id") != id);
        if rows.len() == before {
            return Err(Error::not_found(format!("{table}/{id}")));
        }
        Ok(())
    }

    async fn call_procedure(&self, name: &str, args: Value) -> Result<Value> {
        self.begin()?;
        match name {
            "payer_penalite" => self.payer_penalite(&args),
            "cloturer_seance" => self.cloturer_seance(&args),
            "attribuer_gain" => self.attribuer_gain(&args),
            "calculer_solde_tontine" => self.calculer_solde_tontine(&args),
            "get_statistiques_dashboard" => self.statistiques_dashboard(),
            "enregistrer_presence_et_cotisation" => self.enregistrer_presence(&args),
            other => Err(Error::other(format!("unknown procedure: {other}"))),
        }
    }
}

impl MockBackend {
    fn payer_penalite(&self, args: &Value) -> Result<Value> {
        let id = text(args, "id_penalite").to_string();
        let paid = amount(args, "montant");

        let mut tables = self.tables.lock().unwrap();
        let rows = tables
            .get_mut("penalite")
            .ok_or_else(|| Error::not_found("penalite"))?;
        let row = rows
            .iter_mut()
            .find(|r| text(r, "id") == id)
            .ok_or_else(|| Error::not_found(format!("penalite/{id}")))?;

        let total = amount(row, "montant");
        let already = amount(row, "montant_paye");
        if text(row, "statut") == "annule" {
            return Err(Error::check("penalty is cancelled"));
        }
        if paid <= 0 || paid > total - already {
            return Err(Error::check("payment out of range"));
        }

        let new_paid = already + paid;
        let object = row.as_object_mut().expect("mock rows are objects");
        object.insert("montant_paye".to_string(), json!(new_paid));
        if new_paid >= total {
            object.insert("statut".to_string(), json!("paye"));
            object.insert("date_paiement".to_string(), json!(Self::today()));
        } else {
            object.insert("statut".to_string(), json!("partiellement_paye"));
        }
        object.insert("updated_at".to_string(), json!(Self::now()));

        Ok(row.clone())
    }

    fn cloturer_seance(&self, args: &Value) -> Result<Value> {
        let session_id = text(args, "id_seance").to_string();
        let absence_penalty = amount(args, "montant_penalite_absence");
        let empty = Vec::new();
        let presences = args.get("presences").and_then(Value::as_array).unwrap_or(&empty);

        let mut tables = self.tables.lock().unwrap();

        let (tontine_id, session_date) = {
            let session = tables
                .get("seance")
                .and_then(|rows| rows.iter().find(|r| text(r, "id") == session_id))
                .ok_or_else(|| Error::not_found(format!("seance/{session_id}")))?;
            (text(session, "id_tontine").to_string(), text(session, "date").to_string())
        };

        let is_presence = tables
            .get("tontine")
            .and_then(|rows| rows.iter().find(|r| text(r, "id") == tontine_id))
            .map(|t| text(t, "type") == "presence")
            .unwrap_or(false);

        let mut created = Vec::new();
        if is_presence && absence_penalty > 0 {
            for entry in presences {
                if entry.get("present").and_then(Value::as_bool).unwrap_or(true) {
                    continue;
                }
                let penalty = json!({
                    "id": self.gen_id(),
                    "id_membre": text(entry, "id_membre"),
                    "id_seance": session_id,
                    "id_tontine": tontine_id,
                    "montant": absence_penalty,
                    "montant_paye": 0,
                    "raison": "Absence",
                    "type_penalite": "absence",
                    "date": session_date,
                    "statut": "non_paye",
                    "created_at": Self::now(),
                    "updated_at": Self::now(),
                });
                tables.entry("penalite".to_string()).or_default().push(penalty.clone());
                created.push(penalty);
            }
        }

        let total_contributions = sum_where(
            tables.get("cotisation").map(Vec::as_slice).unwrap_or_default(),
            |r| text(r, "id_seance") == session_id,
            "montant",
        );
        let total_penalties = sum_where(
            tables.get("penalite").map(Vec::as_slice).unwrap_or_default(),
            |r| text(r, "id_seance") == session_id,
            "montant",
        );
        let attendance = presences
            .iter()
            .filter(|e| e.get("present").and_then(Value::as_bool).unwrap_or(false))
            .count();

        let session = tables
            .get_mut("seance")
            .and_then(|rows| rows.iter_mut().find(|r| text(r, "id") == session_id))
            .expect("session existed above");
        let object = session.as_object_mut().expect("mock rows are objects");
        object.insert("statut".to_string(), json!("cloturee"));
        object.insert("total_cotisations".to_string(), json!(total_contributions));
        object.insert("total_penalites".to_string(), json!(total_penalties));
        object.insert("nombre_presents".to_string(), json!(attendance));
        object.insert("updated_at".to_string(), json!(Self::now()));

        Ok(json!({
            "id_seance": session_id,
            "statut": "cloturee",
            "penalites_creees": created,
            "total_cotisations": total_contributions,
            "total_penalites": total_penalties,
            "nombre_presents": attendance,
        }))
    }

    fn attribuer_gain(&self, args: &Value) -> Result<Value> {
        let session_id = text(args, "id_seance").to_string();
        let beneficiary_id = text(args, "id_beneficiaire").to_string();

        let mut tables = self.tables.lock().unwrap();

        let (tontine_id, session_date) = {
            let session = tables
                .get("seance")
                .and_then(|rows| rows.iter().find(|r| text(r, "id") == session_id))
                .ok_or_else(|| Error::not_found(format!("seance/{session_id}")))?;
            (text(session, "id_tontine").to_string(), text(session, "date").to_string())
        };

        let distributed = sum_where(
            tables.get("cotisation").map(Vec::as_slice).unwrap_or_default(),
            |r| text(r, "id_seance") == session_id && text(r, "statut") == "complete",
            "montant",
        );

        let next_number = tables
            .get("tour")
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .filter(|r| text(r, "id_tontine") == tontine_id)
            .map(|r| amount(r, "numero"))
            .max()
            .unwrap_or(0)
            + 1;

        let tour = json!({
            "id": self.gen_id(),
            "id_tontine": tontine_id,
            "id_seance": session_id,
            "id_beneficiaire": beneficiary_id,
            "numero": next_number,
            "date": session_date,
            "montant_distribue": distributed,
            "created_at": Self::now(),
            "updated_at": Self::now(),
        });
        tables.entry("tour".to_string()).or_default().push(tour.clone());

        Ok(tour)
    }

    fn calculer_solde_tontine(&self, args: &Value) -> Result<Value> {
        let tontine_id = text(args, "id_tontine").to_string();
        let tables = self.tables.lock().unwrap();
        let of_tontine = |r: &Value| text(r, "id_tontine") == tontine_id;

        let rows = |name: &str| tables.get(name).map(Vec::as_slice).unwrap_or_default();

        let money_in = sum_where(rows("cotisation"), of_tontine, "montant")
            + sum_where(rows("penalite"), of_tontine, "montant_paye")
            + sum_where(rows("credit"), of_tontine, "montant_rembourse");

        let disbursed = |r: &Value| {
            of_tontine(r) && matches!(text(r, "statut"), "decaisse" | "en_cours" | "en_retard" | "rembourse")
        };
        let money_out = sum_where(rows("credit"), disbursed, "montant")
            + sum_where(rows("tour"), of_tontine, "montant_distribue")
            + sum_where(rows("projet"), of_tontine, "montant_alloue");

        Ok(json!({ "solde": money_in - money_out }))
    }

    fn statistiques_dashboard(&self) -> Result<Value> {
        let tables = self.tables.lock().unwrap();
        let rows = |name: &str| tables.get(name).map(Vec::as_slice).unwrap_or_default();

        let total_members = rows("membre").iter().filter(|r| text(r, "statut") == "Actif").count();
        let total_tontines = rows("tontine").iter().filter(|r| text(r, "statut") == "Actif").count();
        let total_contributions = sum_where(rows("cotisation"), |_| true, "montant");
        let total_tours = sum_where(rows("tour"), |_| true, "montant_distribue");

        let active_credit = |r: &Value| matches!(text(r, "statut"), "decaisse" | "en_cours");
        let active_credits = rows("credit").iter().filter(|r| active_credit(r)).count();
        let active_credit_amount = sum_where(rows("credit"), active_credit, "solde");

        let unpaid = |r: &Value| text(r, "statut") == "non_paye";
        let unpaid_penalties = rows("penalite").iter().filter(|r| unpaid(r)).count();
        let unpaid_penalty_amount = sum_where(rows("penalite"), unpaid, "montant");

        let active_projects = rows("projet")
            .iter()
            .filter(|r| matches!(text(r, "statut"), "planifie" | "collecte_fonds" | "en_cours"))
            .count();

        let mut sessions: Vec<&Value> = rows("seance").iter().collect();
        sessions.sort_by(|a, b| text(b, "date").cmp(text(a, "date")));
        let latest: Vec<Value> = sessions
            .iter()
            .take(5)
            .map(|s| {
                json!({
                    "id": text(s, "id"),
                    "date": text(s, "date"),
                    "lieu": text(s, "lieu"),
                    "statut": text(s, "statut"),
                    "total_cotisations": amount(s, "total_cotisations"),
                })
            })
            .collect();

        Ok(json!({
            "total_membres": total_members,
            "total_tontines": total_tontines,
            "caisse": total_contributions - total_tours,
            "credits_actifs": active_credits,
            "montant_credits_actifs": active_credit_amount,
            "penalites_non_payees": unpaid_penalties,
            "montant_penalites_non_payees": unpaid_penalty_amount,
            "projets_actifs": active_projects,
            "total_cotisations": total_contributions,
            "total_tours": total_tours,
            "dernieres_seances": latest,
        }))
    }

    fn enregistrer_presence(&self, args: &Value) -> Result<Value> {
        let session_id = text(args, "id_seance").to_string();
        let member_id = text(args, "id_membre").to_string();
        let present = args.get("est_present").and_then(Value::as_bool).unwrap_or(false);
        let paid = amount(args, "montant_paye");

        let mut tables = self.tables.lock().unwrap();

        let tontine_id = {
            let session = tables
                .get("seance")
                .and_then(|rows| rows.iter().find(|r| text(r, "id") == session_id))
                .ok_or_else(|| Error::not_found(format!("seance/{session_id}")))?;
            text(session, "id_tontine").to_string()
        };

        let presence = json!({
            "id": self.gen_id(),
            "id_membre": member_id,
            "id_seance": session_id,
            "present": present,
            "created_at": Self::now(),
        });
        tables.entry("presence".to_string()).or_default().push(presence.clone());

        let mut contribution = Value::Null;
        if present && paid > 0 {
            let expected = tables
                .get("tontine")
                .and_then(|rows| rows.iter().find(|r| text(r, "id") == tontine_id))
                .map(|t| amount(t, "montant_cotisation"))
                .unwrap_or(0);
            let status = if paid >= expected { "complete" } else { "partiel" };
            contribution = json!({
                "id": self.gen_id(),
                "id_membre": member_id,
                "id_seance": session_id,
                "id_tontine": tontine_id,
                "montant": paid,
                "montant_attendu": expected,
                "date_paiement": Self::today(),
                "methode_paiement": "especes",
                "statut": status,
                "created_at": Self::now(),
                "updated_at": Self::now(),
            });
            tables
                .entry("cotisation".to_string())
                .or_default()
                .push(contribution.clone());
        }

        Ok(json!({ "presence": presence, "cotisation": contribution }))
    }
}
