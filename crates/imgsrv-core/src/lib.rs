//! Image server core - entity model and query vocabulary
//!
//! This crate has no I/O. It provides:
//! - The structured error facility (`ExError`) and logging facility
//! - Entities of the image server database with typed field enums
//! - `SelectCriteria` and `UpdateColumns`, the typed query and assignment
//!   builders every broker and adaptor consumes
//! - Principals for row-level access control
//! - Work queue intervention rules

pub mod criteria;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod rules;
pub mod security;

pub use imgsrv_core_types as types;

pub use criteria::{SelectCriteria, UpdateColumns};
pub use errors::{DomainError, ExError, ExErrorKind, Result};
pub use model::{Entity, EntityKey, Field, Value};
pub use security::Principal;
