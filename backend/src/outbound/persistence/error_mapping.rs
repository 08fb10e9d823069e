//! Classification of pool and Diesel failures shared by the repositories.
//!
//! Each repository turns a [`StoreFailure`] into its own port error; this
//! module only decides which failures are transient.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;

/// Unique index arbitrating concurrent registrations.
pub(super) const ACCOUNTS_EMAIL_KEY: &str = "accounts_email_key";

/// Store failure reduced to what the ports distinguish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum StoreFailure {
    /// Transient: the caller may retry.
    Connection(String),
    /// Permanent statement failure.
    Query(String),
    /// A unique index rejected the write.
    UniqueViolation {
        /// Violated constraint, when Postgres reports it.
        constraint: Option<String>,
    },
    /// A foreign key rejected the write.
    ForeignKeyViolation,
}

pub(super) fn classify_pool_error(error: PoolError) -> StoreFailure {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            StoreFailure::Connection(message)
        }
    }
}

fn is_statement_timeout(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("statement timeout") || lower.contains("lock timeout")
}

pub(super) fn classify_diesel_error(error: DieselError, operation: &'static str) -> StoreFailure {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), operation, "diesel operation failed");
        }
        other => debug!(error = %other, operation, "diesel operation failed"),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            StoreFailure::UniqueViolation {
                constraint: info.constraint_name().map(str::to_owned),
            }
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
            StoreFailure::ForeignKeyViolation
        }
        DieselError::DatabaseError(
            DatabaseErrorKind::ClosedConnection | DatabaseErrorKind::SerializationFailure,
            info,
        ) => StoreFailure::Connection(info.message().to_owned()),
        DieselError::DatabaseError(_, info) if is_statement_timeout(info.message()) => {
            StoreFailure::Connection(info.message().to_owned())
        }
        DieselError::BrokenTransactionManager => {
            StoreFailure::Connection("transaction manager broken".to_owned())
        }
        DieselError::DatabaseError(_, _) => {
            StoreFailure::Query(format!("{operation}: database error"))
        }
        other => StoreFailure::Query(format!("{operation}: {other}")),
    }
}
