//! The backend contract consumed by every store.

use crate::error::Result;
use crate::filter::{Filter, Order};
use async_trait::async_trait;
use serde_json::Value;

/// Gateway to the remote relational backend.
///
/// CRUD requests are scoped by table name; business logic (session
/// closing, penalty payment, gain attribution, balance calculation,
/// financial summaries) lives behind named stored procedures invoked via
/// [`call_procedure`](Backend::call_procedure) and treated as atomic
/// black boxes.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Read rows from a table.
    async fn query(&self, table: &str, filter: Filter, order: Option<Order>) -> Result<Vec<Value>>;

    /// Insert one record; returns the stored row with the server-assigned
    /// identifier and defaults.
    async fn insert(&self, table: &str, record: Value) -> Result<Value>;

    /// Partially update one record; returns the full updated row (the
    /// server may normalize fields).
    async fn update(&self, table: &str, id: &str, patch: Value) -> Result<Value>;

    /// Hard-delete one record.
    async fn remove(&self, table: &str, id: &str) -> Result<()>;

    /// Invoke a named stored procedure.
    async fn call_procedure(&self, name: &str, args: Value) -> Result<Value>;
}
