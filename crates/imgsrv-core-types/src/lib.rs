//! Core types shared across the image server data layer
//!
//! - **Correlation types**: `RequestId` and `ContextId` for tying log
//!   events and errors to the call or persistence context that produced them
//! - **Schema constants**: canonical field keys and event names used by the
//!   logging facility

pub mod correlation;
pub mod schema;

pub use correlation::{ContextId, RequestId};
