//! Canonical schema constants for structured logging
//!
//! Keeps field names identical across adaptors, controllers and the CLI so
//! log queries do not depend on which layer emitted the event.

pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_REQUEST_ID: &str = "request_id";
pub const FIELD_CONTEXT_ID: &str = "context_id";

// Entity context
pub const FIELD_ENTITY: &str = "entity";
pub const FIELD_ENTITY_KEY: &str = "entity_key";
pub const FIELD_ROWS: &str = "rows";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";

// Operation events
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";

// Persistence context lifecycle events
pub const EVENT_CONTEXT_OPEN: &str = "context_open";
pub const EVENT_CONTEXT_COMMIT: &str = "context_commit";
pub const EVENT_CONTEXT_DISCARD: &str = "context_discard";
