use imgsrv_core_types::{ContextId, RequestId};
use thiserror::Error;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that callers (the CLI, tests, any
/// UI in front of the controllers) can match on without parsing messages.
///
/// "Not found" on the read path and "no rows matched" on the write path are
/// not errors: they are `None`, an empty list or `false`. `NotFound` is only
/// raised when an operation cannot proceed without the entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Input/Validation
    InvalidInput,
    InvalidCriteria,
    InvalidColumn,
    UnknownCode,
    NotFound,
    AlreadyExists,
    ConstraintViolation,

    // Persistence context lifecycle
    ContextClosed,

    // Business rules
    InvalidState,

    // Integration/IO
    Io,
    Serialization,
    Persistence,
    Configuration,
    Concurrency,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::InvalidCriteria => "ERR_INVALID_CRITERIA",
            ExErrorKind::InvalidColumn => "ERR_INVALID_COLUMN",
            ExErrorKind::UnknownCode => "ERR_UNKNOWN_CODE",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::AlreadyExists => "ERR_ALREADY_EXISTS",
            ExErrorKind::ConstraintViolation => "ERR_CONSTRAINT_VIOLATION",
            ExErrorKind::ContextClosed => "ERR_CONTEXT_CLOSED",
            ExErrorKind::InvalidState => "ERR_INVALID_STATE",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Configuration => "ERR_CONFIGURATION",
            ExErrorKind::Concurrency => "ERR_CONCURRENCY",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries a kind for programmatic handling plus the operation and entity it
/// happened on, so a single log line at the failure point is enough to
/// diagnose it.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity: Option<&'static str>,
    entity_id: Option<String>,
    request_id: Option<RequestId>,
    context_id: Option<ContextId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity: None,
            entity_id: None,
            request_id: None,
            context_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add the entity type the operation was working on
    pub fn with_entity(mut self, entity: &'static str) -> Self {
        self.entity = Some(entity);
        self
    }

    /// Add entity key context
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add the persistence context the failure happened in
    pub fn with_context_id(mut self, context_id: ContextId) -> Self {
        self.context_id = Some(context_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Wrap a lower-level error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity(&self) -> Option<&'static str> {
        self.entity
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn context_id(&self) -> Option<&ContextId> {
        self.context_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the wrapped error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if let Some(entity) = self.entity {
            write!(f, " on {}", entity)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (key: {})", entity_id)?;
        }
        if let Some(source) = &self.source {
            write!(f, " <- {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Domain-level failures raised by the model and criteria layers
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// A persisted enum column held a code this build does not know
    #[error("Unknown {enum_name} code: {code}")]
    UnknownCode {
        enum_name: &'static str,
        code: String,
    },

    /// An entity key was empty
    #[error("Entity key must not be empty")]
    EmptyKey,

    /// Update columns tried to assign the key column
    #[error("The key column of {entity} cannot be assigned")]
    KeyAssignment { entity: &'static str },

    /// Criteria that cannot be executed, such as ordering against NULL
    #[error("Invalid criteria on {entity}: {reason}")]
    InvalidCriteria {
        entity: &'static str,
        reason: String,
    },

    /// An entity required by the operation does not exist
    #[error("{entity} not found: {key}")]
    EntityNotFound { entity: &'static str, key: String },

    /// A business rule refused the operation
    #[error("{entity} {key} is in state {state}, operation not allowed")]
    InvalidState {
        entity: &'static str,
        key: String,
        state: String,
    },
}

impl From<DomainError> for ExError {
    fn from(err: DomainError) -> Self {
        let message = err.to_string();
        match err {
            DomainError::UnknownCode { .. } => {
                ExError::new(ExErrorKind::UnknownCode).with_message(message)
            }
            DomainError::EmptyKey => ExError::new(ExErrorKind::InvalidInput).with_message(message),
            DomainError::KeyAssignment { entity } => ExError::new(ExErrorKind::InvalidColumn)
                .with_entity(entity)
                .with_message(message),
            DomainError::InvalidCriteria { entity, .. } => {
                ExError::new(ExErrorKind::InvalidCriteria)
                    .with_entity(entity)
                    .with_message(message)
            }
            DomainError::EntityNotFound { entity, key } => ExError::new(ExErrorKind::NotFound)
                .with_entity(entity)
                .with_entity_id(key)
                .with_message(message),
            DomainError::InvalidState { entity, key, .. } => {
                ExError::new(ExErrorKind::InvalidState)
                    .with_entity(entity)
                    .with_entity_id(key)
                    .with_message(message)
            }
        }
    }
}

impl From<serde_json::Error> for ExError {
    fn from(err: serde_json::Error) -> Self {
        ExError::new(ExErrorKind::Serialization).with_message(err.to_string())
    }
}
