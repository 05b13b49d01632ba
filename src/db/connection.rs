use sqlx::mysql::MySqlRow;
use sqlx::postgres::PgRow;
use sqlx::sqlite::SqliteRow;
use sqlx::{Connection, Executor, Row as _, ValueRef};

use super::{Cursor, Descriptor, Driver, Row, Value};
use crate::error::DumpError;

/// A single open connection. Only one query result is ever live on it.
pub enum DatabaseConnection {
    Postgres(sqlx::PgConnection),
    MySql(sqlx::MySqlConnection),
    Sqlite(sqlx::SqliteConnection),
}

impl DatabaseConnection {
    pub async fn connect(descriptor: &Descriptor) -> Result<Self, DumpError> {
        let url = descriptor.url();
        let connection = match descriptor.driver() {
            Driver::Postgres => Self::Postgres(
                sqlx::PgConnection::connect(url)
                    .await
                    .map_err(DumpError::Connect)?,
            ),
            Driver::MySql => Self::MySql(
                sqlx::MySqlConnection::connect(url)
                    .await
                    .map_err(DumpError::Connect)?,
            ),
            Driver::Sqlite => Self::Sqlite(
                sqlx::SqliteConnection::connect(url)
                    .await
                    .map_err(DumpError::Connect)?,
            ),
        };
        Ok(connection)
    }

    /// Submits `query` and waits for its first row.
    ///
    /// The query goes out without bind parameters, so MySQL and PostgreSQL
    /// answer over their text protocols and every value arrives as text.
    pub async fn execute<'c>(&'c mut self, query: &'c str) -> Result<Cursor<'c>, DumpError> {
        match self {
            Self::Postgres(conn) => {
                Cursor::open(conn.fetch(query), |row| decode_row(row, extract_pg_value)).await
            }
            Self::MySql(conn) => {
                Cursor::open(conn.fetch(query), |row| decode_row(row, extract_mysql_value)).await
            }
            Self::Sqlite(conn) => {
                Cursor::open(conn.fetch(query), |row| decode_row(row, extract_sqlite_value)).await
            }
        }
    }

    pub async fn close(self) -> Result<(), sqlx::Error> {
        match self {
            Self::Postgres(conn) => conn.close().await,
            Self::MySql(conn) => conn.close().await,
            Self::Sqlite(conn) => conn.close().await,
        }
    }
}

fn decode_row<R: sqlx::Row>(
    row: &R,
    extract: fn(&R, usize) -> Result<Value, sqlx::Error>,
) -> Result<Row, sqlx::Error> {
    (0..row.len()).map(|idx| extract(row, idx)).collect()
}

fn extract_pg_value(row: &PgRow, idx: usize) -> Result<Value, sqlx::Error> {
    if row.try_get_raw(idx)?.is_null() {
        return Ok(Value::Null);
    }
    row.try_get_unchecked::<String, _>(idx)
        .map(|text| Value::Bytes(text.into_bytes()))
}

fn extract_mysql_value(row: &MySqlRow, idx: usize) -> Result<Value, sqlx::Error> {
    if row.try_get_raw(idx)?.is_null() {
        return Ok(Value::Null);
    }
    row.try_get_unchecked::<Vec<u8>, _>(idx).map(Value::Bytes)
}

// SQLite hands back INTEGER and REAL columns in their text form when read
// as a blob.
fn extract_sqlite_value(row: &SqliteRow, idx: usize) -> Result<Value, sqlx::Error> {
    if row.try_get_raw(idx)?.is_null() {
        return Ok(Value::Null);
    }
    row.try_get_unchecked::<Vec<u8>, _>(idx).map(Value::Bytes)
}
