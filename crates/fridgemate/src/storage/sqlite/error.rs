//! SQLite error mapping.
//!
//! Maps `tokio_rusqlite::Error` and `rusqlite::Error` to `RepositoryError` from
//! `fridgemate_core::storage`.

use fridgemate_core::storage::RepositoryError;

/// Returns true for a violation of the unique key index.
pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(sqlite_err, _)
            if sqlite_err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || sqlite_err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

/// Carries a domain error out of a `Connection::call` closure.
pub fn domain_error(err: RepositoryError) -> tokio_rusqlite::Error {
    tokio_rusqlite::Error::Other(Box::new(err))
}

/// Maps a rusqlite error to a RepositoryError.
///
/// # Error Mapping
///
/// - Unique/primary key violations → `RepositoryError::ConstraintViolation`
/// - Open/busy/locked database → `RepositoryError::StorageUnavailable`
/// - All other errors → `RepositoryError::QueryFailed`
fn map_rusqlite_error(err: &rusqlite::Error, entity_type: &'static str) -> RepositoryError {
    match err {
        e if is_unique_violation(e) => RepositoryError::ConstraintViolation {
            entity_type,
            field: "key",
            value: "unknown".to_string(),
        },

        rusqlite::Error::SqliteFailure(sqlite_err, _)
            if matches!(
                sqlite_err.code,
                rusqlite::ErrorCode::CannotOpen
                    | rusqlite::ErrorCode::DatabaseBusy
                    | rusqlite::ErrorCode::DatabaseLocked
            ) =>
        {
            RepositoryError::StorageUnavailable(err.to_string())
        }

        _ => RepositoryError::QueryFailed(err.to_string()),
    }
}

/// Maps a tokio_rusqlite error to a RepositoryError.
///
/// This is the main entry point for error mapping in async code. Domain
/// errors raised inside a closure via [`domain_error`] are passed through.
pub fn map_tokio_rusqlite_error(
    err: tokio_rusqlite::Error,
    entity_type: &'static str,
) -> RepositoryError {
    match err {
        tokio_rusqlite::Error::Rusqlite(rusqlite_err) => {
            map_rusqlite_error(&rusqlite_err, entity_type)
        }
        tokio_rusqlite::Error::ConnectionClosed | tokio_rusqlite::Error::Close(_) => {
            RepositoryError::StorageUnavailable("Connection closed unexpectedly".to_string())
        }
        tokio_rusqlite::Error::Other(boxed) => match boxed.downcast::<RepositoryError>() {
            Ok(domain) => *domain,
            Err(other) => RepositoryError::QueryFailed(other.to_string()),
        },
        other => RepositoryError::QueryFailed(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sqlite_failure(code: std::os::raw::c_int) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(rusqlite::ffi::Error::new(code), None)
    }

    #[test]
    fn test_unique_violation_maps_to_constraint_violation() {
        let err = sqlite_failure(rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE);
        assert!(is_unique_violation(&err));
        assert!(matches!(
            map_rusqlite_error(&err, "user"),
            RepositoryError::ConstraintViolation {
                entity_type: "user",
                ..
            }
        ));
    }

    #[test]
    fn test_cannot_open_maps_to_unavailable() {
        let err = sqlite_failure(rusqlite::ffi::SQLITE_CANTOPEN);
        assert!(matches!(
            map_rusqlite_error(&err, "user"),
            RepositoryError::StorageUnavailable(_)
        ));
    }

    #[test]
    fn test_other_errors_map_to_query_failed() {
        let err = rusqlite::Error::InvalidQuery;
        assert!(matches!(
            map_rusqlite_error(&err, "user"),
            RepositoryError::QueryFailed(_)
        ));
    }

    #[test]
    fn test_domain_errors_pass_through() {
        let original = RepositoryError::NotFound {
            entity_type: "budget",
            id: "4".to_string(),
        };
        let mapped = map_tokio_rusqlite_error(domain_error(original.clone()), "budget");
        assert_eq!(mapped, original);
    }

    #[test]
    fn test_closed_connection_maps_to_unavailable() {
        let mapped = map_tokio_rusqlite_error(tokio_rusqlite::Error::ConnectionClosed, "user");
        assert!(matches!(mapped, RepositoryError::StorageUnavailable(_)));
    }
}
