use thiserror::Error;

/// Failure of a single record store call.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store refused the write because a constraint did not hold.
    #[error("constraint violated: {0}")]
    Constraint(String),
    #[error("database error: {0}")]
    Database(String),
    /// A row was read back but could not be turned into a domain value.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// Primary result code shared by every extended `SQLITE_CONSTRAINT_*` code.
const SQLITE_CONSTRAINT: i32 = 19;

fn is_constraint_code(code: i32) -> bool {
    code & 0xff == SQLITE_CONSTRAINT
}

impl From<libsql::Error> for StoreError {
    fn from(err: libsql::Error) -> Self {
        let constraint = match &err {
            libsql::Error::SqliteFailure(code, _) => is_constraint_code(*code),
            libsql::Error::RemoteSqliteFailure(code, extended, _) => {
                is_constraint_code(*code) || is_constraint_code(*extended)
            }
            // hrana and other transports only carry the message
            _ => err.to_string().contains("constraint failed"),
        };

        let message = err.to_string();
        if constraint {
            StoreError::Constraint(message)
        } else {
            StoreError::Database(message)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The external identity is not in the configured allow-list.
    NotAllowed,
    /// The identity is allowed by config but the store rejected the user row.
    NotProvisioned,
}

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("access denied: {0:?}")]
    Denied(DenyReason),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),
    #[error("{0} is required for remote database URLs")]
    MissingAuthToken(&'static str),
    #[error("invalid user id in allow-list: {0:?}")]
    InvalidAllowListEntry(String),
    #[error("allow-list must contain at least one user id")]
    EmptyAllowList,
    #[error("invalid boolean for {name}: {value:?}")]
    InvalidFlag { name: &'static str, value: String },
}
