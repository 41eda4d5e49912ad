use thiserror::Error;

/// Result type alias using ChangeLogError
pub type Result<T> = std::result::Result<T, ChangeLogError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code usable for programmatic handling,
/// tests and external responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Usage
    InvalidInput,
    NonScalarMessage,
    CompositeKeyUnsupported,
    UnknownClass,
    MissingPrimaryKey,

    // Read views
    ImmutableView,
    NotFound,
    UnsupportedOperation,

    // Lifecycle
    AlreadyPersisted,

    // Schema capabilities
    CapabilityUnavailable,

    // Payload decoding
    InvalidPayload,
    UnsupportedPayloadVersion,

    // Integration/IO
    Config,
    Io,
    Serialization,
    Persistence,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::NonScalarMessage => "ERR_NON_SCALAR_MESSAGE",
            ExErrorKind::CompositeKeyUnsupported => "ERR_COMPOSITE_KEY_UNSUPPORTED",
            ExErrorKind::UnknownClass => "ERR_UNKNOWN_CLASS",
            ExErrorKind::MissingPrimaryKey => "ERR_MISSING_PRIMARY_KEY",
            ExErrorKind::ImmutableView => "ERR_IMMUTABLE_VIEW",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::UnsupportedOperation => "ERR_UNSUPPORTED_OPERATION",
            ExErrorKind::AlreadyPersisted => "ERR_ALREADY_PERSISTED",
            ExErrorKind::CapabilityUnavailable => "ERR_CAPABILITY_UNAVAILABLE",
            ExErrorKind::InvalidPayload => "ERR_INVALID_PAYLOAD",
            ExErrorKind::UnsupportedPayloadVersion => "ERR_UNSUPPORTED_PAYLOAD_VERSION",
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
        }
    }

    /// Whether this kind is a caller precondition violation
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            ExErrorKind::InvalidInput
                | ExErrorKind::NonScalarMessage
                | ExErrorKind::CompositeKeyUnsupported
                | ExErrorKind::UnknownClass
                | ExErrorKind::MissingPrimaryKey
        )
    }
}

/// Canonical structured error type
///
/// Used at the store and engine boundaries. Carries a classification plus
/// the operation and tracked object it happened on.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity context (class name and/or normalized key)
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the entity context, if any
    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Domain error taxonomy for change log operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChangeLogError {
    // ===== Usage Errors =====
    /// Custom change messages must be scalar values
    #[error("Only scalar values can be set as changelog messages, submitted value was of type \"{value_type}\"")]
    NonScalarMessage { value_type: String },

    /// Many-to-many traversal does not handle composite keys
    #[error("Composite keys are not supported for many-to-many relation {relation} of {class_name}")]
    CompositeKeyUnsupported {
        class_name: String,
        relation: String,
    },

    /// The class is not registered in the schema registry
    #[error("Unknown class: {class_name}")]
    UnknownClass { class_name: String },

    /// The tracked object has no (complete) primary key yet
    #[error("Object of class {class_name} has no primary key")]
    MissingPrimaryKey { class_name: String },

    /// Generic invalid input
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    // ===== Read View Errors =====
    /// Persisted change views cannot be modified
    #[error("Cannot {action} changes: change log views are read-only (key: {key})")]
    ImmutableView { action: String, key: String },

    /// Keyed lookup on an adapter view missed
    #[error("Change \"{key}\" does not exist")]
    ChangeNotFound { key: String },

    /// Entry carries an operation code with no adapter
    #[error("Unsupported operation code: {code}")]
    UnsupportedOperation { code: i64 },

    // ===== Lifecycle Errors =====
    /// A log entry can only be persisted once
    #[error("Log entry already persisted with id {entry_id}")]
    AlreadyPersisted { entry_id: i64 },

    // ===== Capability Errors =====
    /// The schema registry cannot answer the request
    #[error("Schema capability unavailable: {capability}")]
    CapabilityUnavailable { capability: String },

    // ===== Payload Errors =====
    /// Stored payload could not be decoded
    #[error("Invalid change payload: {reason}")]
    InvalidPayload { reason: String },

    /// Stored payload uses an unknown schema version
    #[error("Unsupported change payload schema version: {version}")]
    UnsupportedPayloadVersion { version: u64 },

    // ===== Generic Errors =====
    /// Configuration could not be loaded
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A configuration or schema file could not be read
    #[error("Cannot read {path}: {message}")]
    Io { path: String, message: String },

    /// Serialization error (JSON encoding/decoding)
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Failure reported by the object store collaborator
    #[error("Object store error: {message}")]
    ObjectStore { message: String },

}

/// Conversion from ChangeLogError to ExError
impl From<ChangeLogError> for ExError {
    fn from(err: ChangeLogError) -> Self {
        match err {
            ChangeLogError::NonScalarMessage { value_type } => {
                ExError::new(ExErrorKind::NonScalarMessage)
                    .with_op("set_custom_change_message")
                    .with_message(format!(
                        "Only scalar values can be set as changelog messages, got {}",
                        value_type
                    ))
            }

            ChangeLogError::CompositeKeyUnsupported {
                class_name,
                relation,
            } => ExError::new(ExErrorKind::CompositeKeyUnsupported)
                .with_entity_id(class_name)
                .with_op("many_to_many_related_change_log")
                .with_message(format!("Relation {} uses composite keys", relation)),

            ChangeLogError::UnknownClass { class_name } => ExError::new(ExErrorKind::UnknownClass)
                .with_entity_id(class_name)
                .with_message("Class is not registered in the schema registry"),

            ChangeLogError::MissingPrimaryKey { class_name } => {
                ExError::new(ExErrorKind::MissingPrimaryKey)
                    .with_entity_id(class_name)
                    .with_message("Object has no primary key")
            }

            ChangeLogError::InvalidInput { reason } => {
                ExError::new(ExErrorKind::InvalidInput).with_message(reason)
            }

            ChangeLogError::ImmutableView { action, key } => {
                ExError::new(ExErrorKind::ImmutableView)
                    .with_op(action)
                    .with_entity_id(key)
                    .with_message("Change log views are read-only")
            }

            ChangeLogError::ChangeNotFound { key } => ExError::new(ExErrorKind::NotFound)
                .with_entity_id(key)
                .with_message("Change does not exist"),

            ChangeLogError::UnsupportedOperation { code } => {
                ExError::new(ExErrorKind::UnsupportedOperation)
                    .with_message(format!("Unsupported operation code {}", code))
            }

            ChangeLogError::AlreadyPersisted { entry_id } => {
                ExError::new(ExErrorKind::AlreadyPersisted)
                    .with_entity_id(entry_id.to_string())
                    .with_message("Log entry already persisted")
            }

            ChangeLogError::CapabilityUnavailable { capability } => {
                ExError::new(ExErrorKind::CapabilityUnavailable).with_message(capability)
            }

            ChangeLogError::InvalidPayload { reason } => {
                ExError::new(ExErrorKind::InvalidPayload).with_message(reason)
            }

            ChangeLogError::UnsupportedPayloadVersion { version } => {
                ExError::new(ExErrorKind::UnsupportedPayloadVersion)
                    .with_message(format!("Payload schema version {}", version))
            }

            ChangeLogError::Config { message } => {
                ExError::new(ExErrorKind::Config).with_message(message)
            }

            ChangeLogError::Serialization { message } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }

            ChangeLogError::ObjectStore { message } => ExError::new(ExErrorKind::Persistence)
                .with_op("object_store")
                .with_message(message),

            ChangeLogError::Io { path, message } => ExError::new(ExErrorKind::Io)
                .with_op("read")
                .with_entity_id(path)
                .with_message(message),
        }
    }
}

/// Conversion from serde_json::Error to ChangeLogError
impl From<serde_json::Error> for ChangeLogError {
    fn from(err: serde_json::Error) -> Self {
        ChangeLogError::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_codes() {
        let cases = [
            (ExErrorKind::ImmutableView, "ERR_IMMUTABLE_VIEW"),
            (ExErrorKind::NonScalarMessage, "ERR_NON_SCALAR_MESSAGE"),
            (
                ExErrorKind::CapabilityUnavailable,
                "ERR_CAPABILITY_UNAVAILABLE",
            ),
            (ExErrorKind::AlreadyPersisted, "ERR_ALREADY_PERSISTED"),
            (ExErrorKind::Persistence, "ERR_PERSISTENCE"),
            (ExErrorKind::Io, "ERR_IO"),
        ];
        for (kind, expected_code) in cases {
            assert_eq!(kind.code(), expected_code, "Wrong code for {:?}", kind);
        }
    }

    #[test]
    fn test_usage_errors_are_classified() {
        assert!(ExErrorKind::NonScalarMessage.is_usage_error());
        assert!(ExErrorKind::CompositeKeyUnsupported.is_usage_error());
        assert!(!ExErrorKind::CapabilityUnavailable.is_usage_error());
        assert!(!ExErrorKind::ImmutableView.is_usage_error());
    }

    #[test]
    fn test_immutable_view_maps_to_distinct_kind() {
        let err: ExError = ChangeLogError::ImmutableView {
            action: "update".into(),
            key: "name".into(),
        }
        .into();
        assert_eq!(err.kind(), ExErrorKind::ImmutableView);
        assert_eq!(err.entity_id(), Some("name"));
    }

    #[test]
    fn test_display_includes_code_and_op() {
        let err = ExError::new(ExErrorKind::Persistence)
            .with_op("sqlite")
            .with_message("disk full");
        assert_eq!(
            err.to_string(),
            "[ERR_PERSISTENCE] in operation 'sqlite': disk full"
        );
    }
}
