use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use sqlx::Column;

use super::Row;
use crate::error::DumpError;

/// Anything that yields rows one at a time, in order.
pub trait RowSource {
    fn columns(&self) -> &[String];

    async fn next_row(&mut self) -> Result<Option<Row>, DumpError>;
}

/// Forward-only iterator over a running query.
///
/// The first row is fetched when the cursor is opened: a failure at that
/// point belongs to the query itself, and the row carries the column names.
/// Every later failure is a scan error.
pub struct Cursor<'c> {
    columns: Vec<String>,
    pending: Option<Row>,
    rows: BoxStream<'c, Result<Row, sqlx::Error>>,
}

impl<'c> Cursor<'c> {
    pub(super) async fn open<R, F>(
        rows: BoxStream<'c, Result<R, sqlx::Error>>,
        decode: F,
    ) -> Result<Self, DumpError>
    where
        R: sqlx::Row,
        F: Fn(&R) -> Result<Row, sqlx::Error> + Send + 'c,
    {
        // Polled again after the end of results when the set is empty.
        let mut rows = rows.fuse();
        let first = rows.try_next().await.map_err(DumpError::Query)?;

        let columns = first
            .as_ref()
            .map(|row| {
                row.columns()
                    .iter()
                    .map(|column| column.name().to_string())
                    .collect()
            })
            .unwrap_or_default();
        let pending = first
            .as_ref()
            .map(&decode)
            .transpose()
            .map_err(DumpError::Scan)?;

        let rows = rows
            .map(move |row| row.and_then(|row| decode(&row)))
            .boxed();

        Ok(Self {
            columns,
            pending,
            rows,
        })
    }
}

impl RowSource for Cursor<'_> {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    async fn next_row(&mut self) -> Result<Option<Row>, DumpError> {
        if let Some(row) = self.pending.take() {
            return Ok(Some(row));
        }
        self.rows.try_next().await.map_err(DumpError::Scan)
    }
}
