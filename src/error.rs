use thiserror::Error;

/// Failure of a single authenticated device call.
#[derive(Debug, Error)]
pub enum AuthError {
    /// 401 without a Digest challenge, or a Digest variant we cannot answer
    #[error("device requires an unsupported authentication scheme: {0}")]
    AuthSchemeUnsupported(String),

    #[error("device challenge is malformed: {0}")]
    MalformedChallenge(String),

    #[error("device unreachable: {0}")]
    Unreachable(String),

    #[error("device call timed out")]
    Timeout,

    #[error("device rejected the request with status {status}")]
    Rejected { status: u16 },
}

impl AuthError {
    /// Errors that make every further call to the same device pointless.
    pub fn trips_device(&self) -> bool {
        matches!(
            self,
            AuthError::AuthSchemeUnsupported(_) | AuthError::Unreachable(_) | AuthError::Timeout
        )
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AuthError::Timeout
        } else {
            AuthError::Unreachable(e.to_string())
        }
    }
}

/// Failure of one (device, employee) event query.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("malformed event response: {0}")]
    MalformedResponse(String),
}

impl FetchError {
    pub fn trips_device(&self) -> bool {
        match self {
            FetchError::Auth(e) => e.trips_device(),
            FetchError::MalformedResponse(_) => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0} not found")]
    NotFound(String),
}

/// Reason a rollup pass was abandoned. The pass is retried on the next tick.
#[derive(Debug, Error)]
pub enum RollupError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("rollup pass cancelled")]
    Cancelled,
}
