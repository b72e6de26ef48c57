//! The seam between records and the store layer.

use serde::de::DeserializeOwned;
use serde::Serialize;

/// A record stored in one backend table.
///
/// The store layer is generic over this trait: it needs the table name to
/// route requests and the identifier to locate records for replacement,
/// snapshot and rollback.
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Backend table this entity lives in.
    const TABLE: &'static str;

    /// Opaque identifier assigned by the backend, or a placeholder id
    /// before an optimistic insert is confirmed.
    fn id(&self) -> &str;
}
