//! Binds built queries onto the SQLite driver.
//!
//! The parameter list of a [`BuiltQuery`] is positional, so binding is a straight left fold over
//! the values. Driver errors are translated to [`StoreError`] here; nothing above this layer sees
//! a raw `sqlx::Error`.

use log::trace;
use sqlx::{
    query::{Query, QueryAs},
    sqlite::{SqliteArguments, SqliteQueryResult, SqliteRow},
    FromRow,
    Sqlite,
    SqliteConnection,
};

use super::{BuiltQuery, SqlValue};
use crate::traits::StoreError;

fn bind<'q>(q: Query<'q, Sqlite, SqliteArguments<'q>>, params: &'q [SqlValue]) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    params.iter().fold(q, |q, value| match value {
        SqlValue::Text(s) => q.bind(s.as_str()),
        SqlValue::Int(i) => q.bind(*i),
        SqlValue::Bool(b) => q.bind(*b),
        SqlValue::Timestamp(ts) => q.bind(*ts),
        SqlValue::Null => q.bind(Option::<i64>::None),
    })
}

fn bind_as<'q, T>(
    q: QueryAs<'q, Sqlite, T, SqliteArguments<'q>>,
    params: &'q [SqlValue],
) -> QueryAs<'q, Sqlite, T, SqliteArguments<'q>> {
    params.iter().fold(q, |q, value| match value {
        SqlValue::Text(s) => q.bind(s.as_str()),
        SqlValue::Int(i) => q.bind(*i),
        SqlValue::Bool(b) => q.bind(*b),
        SqlValue::Timestamp(ts) => q.bind(*ts),
        SqlValue::Null => q.bind(Option::<i64>::None),
    })
}

impl BuiltQuery {
    pub async fn fetch_all<T>(&self, conn: &mut SqliteConnection) -> Result<Vec<T>, StoreError>
    where T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin {
        trace!("🧾 Executing query: {}", self.text);
        bind_as(sqlx::query_as::<Sqlite, T>(&self.text), &self.params).fetch_all(conn).await.map_err(StoreError::from)
    }

    /// Statements that change data and carry a `RETURNING` clause must run to completion: a
    /// statement abandoned after its first row gets reset on the SQLite driver and the write can
    /// vanish when the connection is reused. So this drains every row and hands back the first.
    pub async fn fetch_optional<T>(&self, conn: &mut SqliteConnection) -> Result<Option<T>, StoreError>
    where T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin {
        let mut rows = self.fetch_all(conn).await?;
        if rows.is_empty() {
            Ok(None)
        } else {
            Ok(Some(rows.swap_remove(0)))
        }
    }

    /// For statements that must produce a row, e.g. `INSERT ... RETURNING *`.
    pub async fn fetch_one<T>(&self, conn: &mut SqliteConnection) -> Result<T, StoreError>
    where T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin {
        let row = self.fetch_optional(conn).await?;
        row.ok_or_else(|| StoreError::other(format!("Statement returned no rows: {}", self.text)))
    }

    pub async fn execute(&self, conn: &mut SqliteConnection) -> Result<SqliteQueryResult, StoreError> {
        trace!("🧾 Executing query: {}", self.text);
        bind(sqlx::query(&self.text), &self.params).execute(conn).await.map_err(StoreError::from)
    }
}
