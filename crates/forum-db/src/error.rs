use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("username already taken")]
    DuplicateUsername,

    #[error("no such thread")]
    UnknownThread,

    #[error("database lock poisoned")]
    LockPoisoned,

    #[error(transparent)]
    Db(#[from] rusqlite::Error),
}
