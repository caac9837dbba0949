use std::fmt;

/// A pull request that could not be reconciled during a concurrent sync phase
#[derive(Debug)]
pub struct SyncFailure {
    /// Branch whose pull request failed
    pub branch: String,
    /// What went wrong for this branch
    pub error: PrStackError,
}

impl fmt::Display for SyncFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.branch, self.error)
    }
}

/// PrStack Error Types
#[derive(Debug, thiserror::Error)]
pub enum PrStackError {
    /// A stack, pointer or pull request does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A 1-based position outside the stack
    #[error("Position {position} is out of range (stack has {len} items)")]
    OutOfRange { position: usize, len: usize },

    /// Remote state that does not look like something we produced
    #[error("Malformed remote state: {0}")]
    MalformedRemoteState(String),

    /// A git or review-service command exited unsuccessfully
    #[error("`{operation}` failed: {message}")]
    ExternalCommand { operation: String, message: String },

    /// The user declined an interactive confirmation
    #[error("Aborted by user")]
    UserAborted,

    /// Refusing to overwrite existing state
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failures collected from the pull request fan-out
    #[error("{} pull request(s) failed to sync:\n{}", .0.len(), summarize(.0))]
    PullRequestSync(Vec<SyncFailure>),

    /// The rebase sweep stopped part way through the stack
    #[error("Rebase stopped at item {position}: {source} (resume with `prstack rebase-all {position}`)")]
    RebaseStopped {
        position: usize,
        #[source]
        source: Box<PrStackError>,
    },

    /// Git-related errors
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON errors from review-service output
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Stack or settings file could not be parsed
    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// Stack or settings file could not be written
    #[error("TOML write error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// Interactive prompt errors
    #[error("Prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),
}

fn summarize(failures: &[SyncFailure]) -> String {
    failures
        .iter()
        .map(|failure| format!("  - {failure}"))
        .collect::<Vec<_>>()
        .join("\n")
}

impl PrStackError {
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        PrStackError::NotFound(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        PrStackError::Config(msg.into())
    }

    pub fn validation<S: Into<String>>(msg: S) -> Self {
        PrStackError::Validation(msg.into())
    }

    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        PrStackError::MalformedRemoteState(msg.into())
    }

    pub fn external<O: Into<String>, M: Into<String>>(operation: O, message: M) -> Self {
        PrStackError::ExternalCommand {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn out_of_range(position: usize, len: usize) -> Self {
        PrStackError::OutOfRange { position, len }
    }

    /// True when the error means "the thing simply is not there"
    pub fn is_not_found(&self) -> bool {
        matches!(self, PrStackError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, PrStackError>;
