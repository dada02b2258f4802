use rusqlite::ErrorCode;
use thiserror::Error;

pub type RepoResult<T> = Result<T, RepoError>;

/// Failures surfaced by the repositories.
///
/// Three kinds reach the caller: a targeted row did not exist
/// ([`RepoError::NotFound`]), the database could not be reached or the
/// statement failed ([`RepoError::Unavailable`], [`RepoError::Interrupted`],
/// [`RepoError::Execution`]), or a stored tag set could not be decoded
/// ([`RepoError::Serialization`]). None of them are retried here.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("record not found")]
    NotFound,

    #[error("database connection is unavailable")]
    Unavailable,

    #[error("statement interrupted: request deadline exceeded or cancelled")]
    Interrupted,

    #[error("database error: {0}")]
    Execution(rusqlite::Error),

    #[error("stored tag set is not a JSON array of strings: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RepoError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// True for every failure to reach or execute against the database.
    pub fn is_execution_failure(&self) -> bool {
        matches!(
            self,
            Self::Unavailable | Self::Interrupted | Self::Execution(_)
        )
    }

    pub fn is_serialization_failure(&self) -> bool {
        matches!(self, Self::Serialization(_))
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::QueryReturnedNoRows => Self::NotFound,
            rusqlite::Error::SqliteFailure(ref e, _)
                if e.code == ErrorCode::OperationInterrupted =>
            {
                Self::Interrupted
            }
            other => Self::Execution(other),
        }
    }
}
