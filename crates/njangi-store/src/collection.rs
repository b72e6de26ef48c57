//! Generic optimistic collection.
//!
//! Every entity store is a thin configuration of [`Collection`], which
//! owns the in-memory copy of one table and mediates all mutations
//! through the backend. The consistency discipline lives here once:
//!
//! - a failed refresh preserves the previous collection;
//! - a non-optimistic insert appends only after the backend confirms;
//! - an optimistic insert shows a placeholder immediately, replaces it
//!   with the canonical record on success and removes it on failure;
//! - optimistic update/remove snapshot the prior value and restore it
//!   verbatim on failure.
//!
//! The last-error slot is cleared only by an explicit
//! [`clear_error`](Collection::clear_error); a later successful call does
//! not clear it, so a stale message can linger if the caller forgets.

use njangi_backend::{Backend, Error, Filter, Order, Result};
use njangi_model::{is_placeholder, Entity};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

/// In-memory copy of one entity collection plus its mutation discipline.
///
/// Locks are never held across an await; local state is applied or rolled
/// back strictly before and after each backend round-trip.
pub struct Collection<T: Entity> {
    backend: Arc<dyn Backend>,
    items: RwLock<Vec<T>>,
    loading: AtomicBool,
    last_error: RwLock<Option<String>>,
}

impl<T: Entity> Collection<T> {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            items: RwLock::new(Vec::new()),
            loading: AtomicBool::new(false),
            last_error: RwLock::new(None),
        }
    }

    /// The backend this collection talks to, for store-level procedure
    /// calls.
    pub(crate) fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    // --- synchronous state access (never touches the network) ---

    pub fn all(&self) -> Vec<T> {
        self.items.read().unwrap().clone()
    }

    pub fn by_id(&self, id: &str) -> Option<T> {
        self.items.read().unwrap().iter().find(|item| item.id() == id).cloned()
    }

    pub fn find_all(&self, predicate: impl Fn(&T) -> bool) -> Vec<T> {
        self.items.read().unwrap().iter().filter(|item| predicate(item)).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.items.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().unwrap().is_empty()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Relaxed)
    }

    /// Last recorded user-facing error message, if any.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().unwrap().clone()
    }

    /// Explicitly clear the error slot. Successful calls do not.
    pub fn clear_error(&self) {
        *self.last_error.write().unwrap() = None;
    }

    pub(crate) fn record_error(&self, error: &Error) {
        *self.last_error.write().unwrap() = Some(error.user_message());
    }

    // --- reads ---

    /// Replace the collection with a query result. On failure the
    /// previous collection is preserved and the error recorded.
    pub async fn fetch(&self, filter: Filter, order: Option<Order>) -> Result<()> {
        self.loading.store(true, Ordering::Relaxed);
        let result = self
            .backend
            .query(T::TABLE, filter, order)
            .await
            .and_then(decode_rows::<T>);
        self.loading.store(false, Ordering::Relaxed);

        match result {
            Ok(rows) => {
                *self.items.write().unwrap() = rows;
                Ok(())
            }
            Err(error) => {
                self.record_error(&error);
                Err(error)
            }
        }
    }

    pub async fn fetch_all(&self) -> Result<()> {
        self.fetch(Filter::none(), None).await
    }

    // --- inserts ---

    /// Await the backend, append only on success.
    pub async fn insert(&self, record: &T) -> Result<T> {
        let payload = insert_payload(record)?;
        match self.backend.insert(T::TABLE, payload).await.and_then(decode::<T>) {
            Ok(created) => {
                self.items.write().unwrap().push(created.clone());
                Ok(created)
            }
            Err(error) => {
                self.record_error(&error);
                Err(error)
            }
        }
    }

    /// Show the placeholder immediately; replace it with the canonical
    /// record on success, remove it entirely on failure.
    pub async fn insert_optimistic(&self, record: T) -> Result<T> {
        debug_assert!(is_placeholder(record.id()), "optimistic inserts start as placeholders");
        let temp_id = record.id().to_string();
        let payload = insert_payload(&record)?;
        self.items.write().unwrap().push(record);

        match self.backend.insert(T::TABLE, payload).await.and_then(decode::<T>) {
            Ok(created) => {
                self.replace_local(&temp_id, created.clone());
                Ok(created)
            }
            Err(error) => {
                self.remove_local(&temp_id);
                self.record_error(&error);
                Err(error)
            }
        }
    }

    // --- updates ---

    /// Await the backend, then take its canonical value.
    pub async fn update(&self, id: &str, patch: Value) -> Result<T> {
        match self.backend.update(T::TABLE, id, patch).await.and_then(decode::<T>) {
            Ok(canonical) => {
                self.replace_local(id, canonical.clone());
                Ok(canonical)
            }
            Err(error) => {
                self.record_error(&error);
                Err(error)
            }
        }
    }

    /// Apply `apply` to local state immediately, send `patch`, and on
    /// failure restore the snapshot verbatim. On success the server's
    /// canonical value replaces the local guess.
    pub async fn update_optimistic(
        &self,
        id: &str,
        apply: impl FnOnce(&mut T),
        patch: Value,
    ) -> Result<T> {
        let Some(prior) = self.apply_local(id, apply) else {
            let error = Error::not_found(format!("{}/{id}", T::TABLE));
            self.record_error(&error);
            return Err(error);
        };

        match self.backend.update(T::TABLE, id, patch).await.and_then(decode::<T>) {
            Ok(canonical) => {
                self.replace_local(id, canonical.clone());
                Ok(canonical)
            }
            Err(error) => {
                self.replace_local(id, prior);
                self.record_error(&error);
                Err(error)
            }
        }
    }

    // --- removals ---

    pub async fn remove(&self, id: &str) -> Result<()> {
        match self.backend.remove(T::TABLE, id).await {
            Ok(()) => {
                self.remove_local(id);
                Ok(())
            }
            Err(error) => {
                self.record_error(&error);
                Err(error)
            }
        }
    }

    /// Remove immediately; restore the snapshot at its original position
    /// on failure.
    pub async fn remove_optimistic(&self, id: &str) -> Result<()> {
        let Some((index, snapshot)) = self.take_local(id) else {
            let error = Error::not_found(format!("{}/{id}", T::TABLE));
            self.record_error(&error);
            return Err(error);
        };

        match self.backend.remove(T::TABLE, id).await {
            Ok(()) => Ok(()),
            Err(error) => {
                let mut items = self.items.write().unwrap();
                let index = index.min(items.len());
                items.insert(index, snapshot);
                drop(items);
                self.record_error(&error);
                Err(error)
            }
        }
    }

    // --- local-state helpers for the stores ---

    pub(crate) fn push_local(&self, record: T) {
        self.items.write().unwrap().push(record);
    }

    pub(crate) fn replace_local(&self, id: &str, record: T) -> bool {
        let mut items = self.items.write().unwrap();
        match items.iter_mut().find(|item| item.id() == id) {
            Some(slot) => {
                *slot = record;
                true
            }
            None => false,
        }
    }

    pub(crate) fn remove_local(&self, id: &str) {
        self.items.write().unwrap().retain(|item| item.id() != id);
    }

    fn take_local(&self, id: &str) -> Option<(usize, T)> {
        let mut items = self.items.write().unwrap();
        let index = items.iter().position(|item| item.id() == id)?;
        Some((index, items.remove(index)))
    }

    /// Mutate one record in place, returning the prior value.
    pub(crate) fn apply_local(&self, id: &str, apply: impl FnOnce(&mut T)) -> Option<T> {
        let mut items = self.items.write().unwrap();
        let item = items.iter_mut().find(|item| item.id() == id)?;
        let prior = item.clone();
        apply(item);
        Some(prior)
    }
}

/// Decode one backend row.
pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(Error::from)
}

/// Decode a query result.
pub(crate) fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>> {
    rows.into_iter().map(decode).collect()
}

/// Serialize an insert payload, stripping the server-assigned fields.
pub(crate) fn insert_payload<T: Serialize>(record: &T) -> Result<Value> {
    let mut value = serde_json::to_value(record)?;
    if let Some(object) = value.as_object_mut() {
        object.remove("id");
        object.remove("created_at");
        object.remove("updated_at");
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use njangi_backend::MockBackend;
    use njangi_model::Member;
    use serde_json::json;
    use std::collections::BTreeSet;

    fn member(name: &str) -> Member {
        Member::new(
            name,
            "Test",
            format!("{}@example.com", name.to_lowercase()),
            "+237 6 00 00 00 00",
            NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
        )
    }

    fn ids(collection: &Collection<Member>) -> BTreeSet<String> {
        collection.all().into_iter().map(|m| m.id).collect()
    }

    #[tokio::test]
    async fn confirmed_insert_appends_canonical_record() {
        let backend = Arc::new(MockBackend::new());
        let collection = Collection::<Member>::new(backend);

        let created = collection.insert(&member("Jean")).await.unwrap();
        assert!(!is_placeholder(&created.id));
        assert_eq!(collection.by_id(&created.id).unwrap(), created);
    }

    #[tokio::test]
    async fn optimistic_insert_swaps_placeholder_for_canonical() {
        let backend = Arc::new(MockBackend::new());
        let collection = Collection::<Member>::new(backend);

        let record = member("Jean");
        let temp_id = record.id.clone();
        let created = collection.insert_optimistic(record).await.unwrap();

        assert_ne!(created.id, temp_id);
        assert!(collection.by_id(&temp_id).is_none());
        let stored = collection.by_id(&created.id).unwrap();
        assert_eq!(stored, created);
        assert_eq!(stored.first_name, "Jean");
    }

    #[tokio::test]
    async fn optimistic_insert_rolls_back_on_failure() {
        let backend = Arc::new(MockBackend::new());
        let collection = Collection::<Member>::new(backend.clone());
        collection.insert(&member("Marie")).await.unwrap();
        let before = ids(&collection);

        backend.fail_next(Error::unique("duplicate email"));
        let err = collection.insert_optimistic(member("Jean")).await.unwrap_err();

        assert!(matches!(err, Error::Unique { .. }));
        assert_eq!(ids(&collection), before);
        assert_eq!(collection.last_error(), Some("Cette valeur existe déjà.".to_string()));
    }

    #[tokio::test]
    async fn optimistic_update_restores_snapshot_on_failure() {
        let backend = Arc::new(MockBackend::new());
        let collection = Collection::<Member>::new(backend.clone());
        let created = collection.insert(&member("Paul")).await.unwrap();

        backend.fail_next(Error::check("bad phone"));
        let err = collection
            .update_optimistic(
                &created.id,
                |m| m.phone = "invalid".to_string(),
                json!({"telephone": "invalid"}),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Check { .. }));
        assert_eq!(collection.by_id(&created.id).unwrap(), created);
    }

    #[tokio::test]
    async fn optimistic_remove_restores_position_on_failure() {
        let backend = Arc::new(MockBackend::new());
        let collection = Collection::<Member>::new(backend.clone());
        collection.insert(&member("Jean")).await.unwrap();
        let target = collection.insert(&member("Marie")).await.unwrap();
        collection.insert(&member("Paul")).await.unwrap();
        let before: Vec<String> = collection.all().into_iter().map(|m| m.id).collect();

        backend.fail_next(Error::foreign_key("referenced by cotisation"));
        collection.remove_optimistic(&target.id).await.unwrap_err();

        let after: Vec<String> = collection.all().into_iter().map(|m| m.id).collect();
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn failed_refresh_preserves_collection() {
        let backend = Arc::new(MockBackend::new());
        let collection = Collection::<Member>::new(backend.clone());
        collection.insert(&member("Jean")).await.unwrap();

        backend.fail_next(Error::network("connection reset"));
        collection.fetch_all().await.unwrap_err();

        assert_eq!(collection.len(), 1);
        assert!(collection.last_error().is_some());
    }

    #[tokio::test]
    async fn error_lingers_until_cleared() {
        let backend = Arc::new(MockBackend::new());
        let collection = Collection::<Member>::new(backend.clone());

        backend.fail_next(Error::network("down"));
        collection.insert(&member("Jean")).await.unwrap_err();
        assert!(collection.last_error().is_some());

        // A later success does not clear the slot.
        collection.insert(&member("Marie")).await.unwrap();
        assert!(collection.last_error().is_some());

        collection.clear_error();
        assert!(collection.last_error().is_none());
    }
}
