use hearth_db::StoreError;
use rusqlite::ErrorCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Coarse classification the transport layer maps onto status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Unauthorized,
    TransactionAborted,
    InvalidArgument,
    Internal,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("you've already reacted to this")]
    AlreadyReacted,

    #[error("you are already following this user")]
    AlreadyFollowing,

    #[error("you are not following this user")]
    NotFollowing,

    #[error("this user is already blocked")]
    AlreadyBlocked,

    #[error("this user is not blocked")]
    NotBlocked,

    #[error("you've already reported this")]
    DuplicateReport,

    #[error("story is already in your read later list")]
    AlreadySaved,

    #[error("you can't follow yourself")]
    SelfFollow,

    #[error("you can't block yourself")]
    SelfBlock,

    #[error("you can't message yourself")]
    SelfConversation,

    #[error("interaction blocked between these users")]
    Blocked,

    #[error("not the author, or no such entity")]
    NotAuthorOrNotFound,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("transaction aborted: {0}")]
    TransactionAborted(String),

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("internal error: {0}")]
    Internal(String),

    #[error("storage error: {0}")]
    Storage(rusqlite::Error),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) | Self::NotFollowing | Self::NotBlocked => ErrorKind::NotFound,
            Self::AlreadyReacted
            | Self::AlreadyFollowing
            | Self::AlreadyBlocked
            | Self::DuplicateReport
            | Self::AlreadySaved
            | Self::SelfFollow
            | Self::SelfBlock
            | Self::SelfConversation => ErrorKind::Conflict,
            Self::Blocked | Self::NotAuthorOrNotFound => ErrorKind::Unauthorized,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::TransactionAborted(_) | Self::DeadlineExceeded => ErrorKind::TransactionAborted,
            Self::Internal(_) | Self::Storage(_) => ErrorKind::Internal,
        }
    }

    /// Only aborted transactions are worth retrying; everything else is
    /// terminal for the request.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::TransactionAborted
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

impl From<rusqlite::Error> for EngineError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, msg)
                if matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) =>
            {
                Self::TransactionAborted(msg.clone().unwrap_or_else(|| e.to_string()))
            }
            _ => Self::Storage(err),
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Poisoned(which) => Self::Internal(format!("{which} lock poisoned")),
            StoreError::Sqlite(e) => e.into(),
        }
    }
}

pub(crate) use hearth_db::is_unique_violation;

#[cfg(test)]
mod tests {
    use super::*;

    fn sqlite_failure(code: std::os::raw::c_int) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(rusqlite::ffi::Error::new(code), None)
    }

    #[test]
    fn busy_store_is_retryable() {
        let err: EngineError = sqlite_failure(rusqlite::ffi::SQLITE_BUSY).into();
        assert!(matches!(err, EngineError::TransactionAborted(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn conflicts_are_terminal() {
        for err in [
            EngineError::AlreadyReacted,
            EngineError::DuplicateReport,
            EngineError::SelfConversation,
        ] {
            assert_eq!(err.kind(), ErrorKind::Conflict);
            assert!(!err.is_retryable());
        }
        assert!(EngineError::DeadlineExceeded.is_retryable());
        assert_eq!(EngineError::Blocked.kind(), ErrorKind::Unauthorized);
    }

    #[test]
    fn detects_unique_violations() {
        let unique = sqlite_failure(rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE);
        let check = sqlite_failure(rusqlite::ffi::SQLITE_CONSTRAINT_CHECK);
        assert!(is_unique_violation(&unique));
        assert!(!is_unique_violation(&check));
    }
}
