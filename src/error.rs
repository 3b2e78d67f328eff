//! Error types for zkp-auth

/// Main error types for the library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid group parameters or protocol inputs were provided.
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// A protocol step was invoked out of order.
    #[error("Invalid protocol state: {0}")]
    InvalidState(String),

    /// The user name is already registered.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Unknown user or challenge identifier.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The challenge was superseded by a newer one for the same user.
    #[error("Aborted: {0}")]
    Aborted(String),

    /// Cryptographic verification failed.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
}

/// Fieldless classification of [`Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`Error::InvalidParams`].
    InvalidParams,
    /// See [`Error::InvalidState`].
    InvalidState,
    /// See [`Error::AlreadyExists`].
    AlreadyExists,
    /// See [`Error::NotFound`].
    NotFound,
    /// See [`Error::Aborted`].
    Aborted,
    /// See [`Error::PermissionDenied`].
    PermissionDenied,
}

impl Error {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidParams(_) => ErrorKind::InvalidParams,
            Error::InvalidState(_) => ErrorKind::InvalidState,
            Error::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Aborted(_) => ErrorKind::Aborted,
            Error::PermissionDenied(_) => ErrorKind::PermissionDenied,
        }
    }

    /// Whether re-running the flow from `CreateChallenge` may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Aborted(_))
    }
}
