//! Error taxonomy of the streaming core.
//!
//! Every failure a request can hit maps onto one variant here, and each
//! variant carries enough context for the server to derive a status code via
//! [`Error::http_status`].

/// Common error type for mediarelay.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The supplied token does not match the object's unique token.
    #[error("Invalid hash")]
    InvalidAuthorization,

    /// The upstream source has no object with this id.
    #[error("File not found: {id}")]
    NotFound { id: String },

    /// The `Range` header could not be parsed.
    #[error("Invalid Range header: {0}")]
    MalformedRange(String),

    /// The requested range lies outside the object.
    #[error("Range not satisfiable for object of {size} bytes")]
    UnsatisfiableRange { size: u64 },

    /// The request path or query could not be parsed.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Fetching data from an upstream client failed.
    #[error("Upstream error: {0}")]
    UpstreamIo(String),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new NotFound error.
    pub fn not_found<S: ToString>(id: S) -> Self {
        Self::NotFound { id: id.to_string() }
    }

    /// Create a new MalformedRange error.
    pub fn malformed_range<S: Into<String>>(msg: S) -> Self {
        Self::MalformedRange(msg.into())
    }

    /// Create a new BadRequest error.
    pub fn bad_request<S: Into<String>>(msg: S) -> Self {
        Self::BadRequest(msg.into())
    }

    /// Create a new UpstreamIo error.
    pub fn upstream<S: Into<String>>(msg: S) -> Self {
        Self::UpstreamIo(msg.into())
    }

    /// Create a new Internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Map this error to an HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidAuthorization => 403,
            Self::NotFound { .. } => 404,
            Self::MalformedRange(_) | Self::BadRequest(_) => 400,
            Self::UnsatisfiableRange { .. } => 416,
            Self::UpstreamIo(_) => 502,
            Self::Internal(_) => 500,
        }
    }

    /// Short machine-readable code used in JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidAuthorization => "invalid_hash",
            Self::NotFound { .. } => "not_found",
            Self::MalformedRange(_) => "malformed_range",
            Self::UnsatisfiableRange { .. } => "range_not_satisfiable",
            Self::BadRequest(_) => "bad_request",
            Self::UpstreamIo(_) => "upstream_error",
            Self::Internal(_) => "internal_error",
        }
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
