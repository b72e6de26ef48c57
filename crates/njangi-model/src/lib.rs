//! Njangi Model - entity records for the tontine backend.
//!
//! Typed views of the backend's relational schema. The backend speaks
//! French column names and enum values; every record here carries serde
//! renames so the Rust side stays idiomatic while the wire stays fixed.
//!
//! # Architecture
//!
//! - **Entities**: one module per table (member, tontine, session, ...)
//! - **Entity trait**: table name + identifier extraction, the seam the
//!   store layer is generic over
//! - **Placeholder ids**: client-generated temporary identifiers used to
//!   locate-and-replace optimistically inserted records

pub mod contribution;
pub mod credit;
pub mod entity;
pub mod id;
pub mod member;
pub mod money;
pub mod penalty;
pub mod project;
pub mod session;
pub mod tontine;
pub mod tour;
pub mod transaction;

pub use contribution::{Contribution, ContributionStatus, PaymentMethod};
pub use credit::{repayment_total, Credit, CreditStatus};
pub use entity::Entity;
pub use id::{is_placeholder, placeholder_id, PLACEHOLDER_PREFIX};
pub use member::{Member, MemberStatus};
pub use money::{format_xaf, Amount};
pub use penalty::{Penalty, PenaltyKind, PenaltyStatus};
pub use project::{Project, ProjectStatus};
pub use session::{Session, SessionStatus};
pub use tontine::{Participation, ParticipationStatus, Period, Tontine, TontineKind, TontineStatus};
pub use tour::Tour;
pub use transaction::{RelatedKind, Transaction, TransactionKind};
