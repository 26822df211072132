//! Translation of SQLite driver errors into the stable [`StoreError`] taxonomy.

use crate::traits::StoreError;

// SQLite extended result codes, as reported by `DatabaseError::code()`.
const SQLITE_CONSTRAINT_CHECK: &str = "275";
const SQLITE_CONSTRAINT_FOREIGNKEY: &str = "787";
const SQLITE_CONSTRAINT_NOTNULL: &str = "1299";
const SQLITE_CONSTRAINT_PRIMARYKEY: &str = "1555";
const SQLITE_CONSTRAINT_UNIQUE: &str = "2067";

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(de) => {
                let code = de.code().map(|c| c.to_string()).unwrap_or_default();
                let message = de.message().to_string();
                match code.as_str() {
                    SQLITE_CONSTRAINT_UNIQUE | SQLITE_CONSTRAINT_PRIMARYKEY => StoreError::DuplicateEntry(message),
                    SQLITE_CONSTRAINT_FOREIGNKEY => StoreError::ReferenceNotFound(message),
                    SQLITE_CONSTRAINT_CHECK | SQLITE_CONSTRAINT_NOTNULL => StoreError::ValidationFailed(message),
                    _ if message.contains("no such table") => StoreError::SchemaMissing(message),
                    _ => StoreError::Unknown { code, message },
                }
            },
            other => StoreError::other(other.to_string()),
        }
    }
}
