//! Njangi Backend - the client/backend boundary.
//!
//! Everything the store layer knows about the remote relational backend
//! goes through the [`Backend`] trait: plain CRUD over named tables plus
//! named stored procedures treated as atomic black boxes. Errors surface
//! as a structured taxonomy so the UI can translate categories into
//! user-facing messages.
//!
//! # Architecture
//!
//! - **Trait**: object-safe async [`Backend`] over `serde_json::Value`
//! - **Errors**: one variant per backend error category, with localized
//!   user messages
//! - **HTTP**: PostgREST-style implementation over reqwest
//! - **Mock**: in-memory implementation with scripted failures, used by
//!   the store tests

pub mod backend;
pub mod error;
pub mod filter;
pub mod http;
pub mod mock;

pub use backend::Backend;
pub use error::{Error, Result};
pub use filter::{Filter, Order};
pub use http::{BackendConfig, HttpBackend};
pub use mock::MockBackend;
