use emc_uuid::LocationId;

#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("Cannot delete the location \"{name}\" because it has patients assigned to it")]
    ConstraintViolation { location_id: LocationId, name: String },
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("failed to create storage directory: {0}")]
    DirCreation(std::io::Error),
    #[error("failed to read record: {0}")]
    FileRead(std::io::Error),
    #[error("failed to write record: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to remove record: {0}")]
    FileRemove(std::io::Error),
    #[error("failed to serialize YAML: {0}")]
    YamlSerialization(serde_yaml::Error),
    #[error("failed to deserialize YAML: {0}")]
    YamlDeserialization(serde_yaml::Error),
    #[error("registry state lock poisoned")]
    LockPoisoned,

    #[error("identifier error: {0}")]
    Uuid(#[from] emc_uuid::UuidError),
    #[error("text error: {0}")]
    Text(#[from] emc_types::TextError),
}

/// Coarse classification used by API adapters to choose a response status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    ConstraintViolation,
    InvariantViolation,
    Storage,
}

impl ErrorKind {
    /// Snake-case label used in error bodies and log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::NotFound => "not_found",
            ErrorKind::ConstraintViolation => "constraint_violation",
            ErrorKind::InvariantViolation => "invariant_violation",
            ErrorKind::Storage => "storage",
        }
    }
}

impl LocationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LocationError::InvalidInput(_) | LocationError::Uuid(_) | LocationError::Text(_) => {
                ErrorKind::InvalidInput
            }
            LocationError::NotFound(_) => ErrorKind::NotFound,
            LocationError::ConstraintViolation { .. } => ErrorKind::ConstraintViolation,
            LocationError::InvariantViolation(_) => ErrorKind::InvariantViolation,
            LocationError::DirCreation(_)
            | LocationError::FileRead(_)
            | LocationError::FileWrite(_)
            | LocationError::FileRemove(_)
            | LocationError::YamlSerialization(_)
            | LocationError::YamlDeserialization(_)
            | LocationError::LockPoisoned => ErrorKind::Storage,
        }
    }

    /// True for errors caused by the caller rather than by the server.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InvalidInput | ErrorKind::NotFound | ErrorKind::ConstraintViolation
        )
    }
}

pub type LocationResult<T> = std::result::Result<T, LocationError>;
