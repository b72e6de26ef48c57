//! Query filters and ordering.
//!
//! A small builder covering what the stores actually ask for: equality
//! and membership clauses combined with AND, plus single-column ordering.
//! Renders to PostgREST query parameters and evaluates in-memory for the
//! mock backend.

use serde_json::Value;

/// Conjunction of column clauses.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    clauses: Vec<Clause>,
}

#[derive(Debug, Clone)]
enum Clause {
    Eq(String, Value),
    In(String, Vec<Value>),
}

impl Filter {
    /// Match every row.
    pub fn none() -> Self {
        Self::default()
    }

    /// `column = value`
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::none().and_eq(column, value)
    }

    /// `column IN (values...)`
    pub fn eq_any(column: impl Into<String>, values: Vec<Value>) -> Self {
        Self::none().and_eq_any(column, values)
    }

    pub fn and_eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push(Clause::Eq(column.into(), value.into()));
        self
    }

    pub fn and_eq_any(mut self, column: impl Into<String>, values: Vec<Value>) -> Self {
        self.clauses.push(Clause::In(column.into(), values));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Evaluate against a JSON row (used by the mock backend).
    pub fn matches(&self, row: &Value) -> bool {
        self.clauses.iter().all(|clause| match clause {
            Clause::Eq(column, value) => row.get(column) == Some(value),
            Clause::In(column, values) => {
                row.get(column).is_some_and(|v| values.contains(v))
            }
        })
    }

    /// Render PostgREST query parameters, e.g. `id_tontine=eq.4`.
    pub fn to_query(&self) -> Vec<(String, String)> {
        self.clauses
            .iter()
            .map(|clause| match clause {
                Clause::Eq(column, value) => (column.clone(), format!("eq.{}", literal(value))),
                Clause::In(column, values) => {
                    let list = values.iter().map(literal).collect::<Vec<_>>().join(",");
                    (column.clone(), format!("in.({list})"))
                }
            })
            .collect()
    }
}

/// Single-column ordering.
#[derive(Debug, Clone)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

impl Order {
    pub fn asc(column: impl Into<String>) -> Self {
        Self { column: column.into(), ascending: true }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self { column: column.into(), ascending: false }
    }

    /// Render the PostgREST `order` parameter value.
    pub fn to_query(&self) -> String {
        let dir = if self.ascending { "asc" } else { "desc" };
        format!("{}.{dir}", self.column)
    }
}

fn literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
