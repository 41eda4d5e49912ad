//! Store-side construction of [`ExError`]
//!
//! SQLite failures surface as `Persistence`, except type conversion
//! failures on stored columns, which mean a row could not be decoded.

use changelog_core::errors::{ExError, ExErrorKind};

pub type Result<T> = std::result::Result<T, ExError>;

fn persistence(op: &str, message: String) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op(op)
        .with_message(message)
}

pub fn migration_error(migration_id: &str, reason: &str) -> ExError {
    persistence("migrate", format!("{migration_id}: {reason}"))
}

/// An applied migration whose SQL has since changed
pub fn checksum_mismatch(migration_id: &str, recorded: &str, embedded: &str) -> ExError {
    persistence(
        "migrate",
        format!(
            "Checksum mismatch on {migration_id}: recorded {recorded}, embedded {embedded}"
        ),
    )
}

pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    match err {
        rusqlite::Error::FromSqlConversionFailure(column, _, source) => {
            ExError::new(ExErrorKind::Serialization)
                .with_op("sqlite_decode")
                .with_message(format!("column {column}: {source}"))
        }
        rusqlite::Error::InvalidColumnType(column, name, found) => {
            ExError::new(ExErrorKind::Serialization)
                .with_op("sqlite_decode")
                .with_message(format!("column {column} ({name}) holds {found}"))
        }
        other => persistence("sqlite", other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_mismatch_is_a_decoding_error() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let err = conn
            .query_row("SELECT 'text'", [], |row| row.get::<_, i64>(0))
            .unwrap_err();
        assert_eq!(from_rusqlite(err).kind(), ExErrorKind::Serialization);
    }

    #[test]
    fn test_sql_failures_are_persistence_errors() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let err = conn.execute("SELECT * FROM missing", []).unwrap_err();
        assert_eq!(from_rusqlite(err).kind(), ExErrorKind::Persistence);
    }
}
