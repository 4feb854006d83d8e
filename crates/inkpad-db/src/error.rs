use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write. Holds the offending column.
    #[error("{0} already taken")]
    Conflict(String),

    #[error("sqlite: {0}")]
    Sqlite(rusqlite::Error),

    #[error("database lock poisoned")]
    Poisoned,
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, msg)
                if code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Self::Conflict(conflicting_column(msg.as_deref()))
            }
            _ => Self::Sqlite(err),
        }
    }
}

/// SQLite reports `UNIQUE constraint failed: users.email`; keep the column name.
fn conflicting_column(msg: Option<&str>) -> String {
    msg.and_then(|m| m.rsplit('.').next())
        .map(|col| col.trim().to_string())
        .filter(|col| !col.is_empty())
        .unwrap_or_else(|| "value".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_is_taken_from_sqlite_message() {
        assert_eq!(
            conflicting_column(Some("UNIQUE constraint failed: users.email")),
            "email"
        );
        assert_eq!(conflicting_column(None), "value");
    }
}
