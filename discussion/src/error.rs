/// Failures reported by the transport collaborator.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("The request timed out")]
    Timeout,

    #[error("Could not reach the server: {0}")]
    Connection(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The server refused the request, e.g. because permissions changed
    /// while it was in flight.
    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// The network call failed. The optimistic change has been rolled back
    /// and the action can be retried.
    #[error("{0}")]
    Transient(TransportError),

    /// The input was rejected before anything was changed.
    #[error("{0}")]
    Validation(String),

    /// The view the action belonged to went away, or the action no longer
    /// applies. Nothing is reported to the user.
    #[error("The action no longer applies to the current view")]
    StaleState,

    /// The server rejected the change. Rolled back like a transient failure,
    /// but retrying will not help.
    #[error("{0}")]
    Conflict(TransportError),
}

impl SyncError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::Transient(_))
    }

    /// Stale actions are dropped without telling the user.
    pub fn is_silent(&self) -> bool {
        matches!(self, SyncError::StaleState)
    }
}

impl From<TransportError> for SyncError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Rejected { .. } => SyncError::Conflict(e),
            TransportError::Timeout
            | TransportError::Connection(_)
            | TransportError::Server { .. } => SyncError::Transient(e),
        }
    }
}

impl From<&'static str> for SyncError {
    fn from(e: &'static str) -> Self {
        SyncError::Validation(e.into())
    }
}
