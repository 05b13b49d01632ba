use std::io::Write;

use tracing::{info, warn};

use crate::db::{ConnectionParams, DatabaseConnection, Descriptor, RowSource};
use crate::encode::Format;
use crate::error::DumpError;
use crate::sink::Sink;

pub const PROGRESS_INTERVAL: u64 = 1_000_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipelineOptions {
    pub format: Format,
    pub gzip: bool,
    /// Rows between two progress lines.
    pub progress_interval: u64,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            format: Format::Json,
            gzip: false,
            progress_interval: PROGRESS_INTERVAL,
        }
    }
}

/// Runs `query` and streams its result set into `dest`.
///
/// Returns the number of records written. On failure whatever was already
/// flushed to `dest` stays there.
pub async fn run<W: Write>(
    params: &ConnectionParams,
    query: &str,
    options: &PipelineOptions,
    dest: W,
) -> Result<u64, DumpError> {
    let descriptor = Descriptor::build(params)?;
    info!("connecting to {}", descriptor.display_name());
    let mut connection = DatabaseConnection::connect(&descriptor).await?;

    info!("[SQL] {query}");
    let mut cursor = connection.execute(query).await?;
    info!("query returned");

    let mut sink = Sink::new(dest, options.gzip);
    let count = stream_rows(&mut cursor, options, &mut sink).await?;
    sink.finish().map_err(DumpError::Write)?;

    drop(cursor);
    // Rows are already flushed; a close failure is only logged.
    if let Err(err) = connection.close().await {
        warn!("closing connection: {err}");
    }

    info!("Total {count} records");
    Ok(count)
}

/// Encodes every row of `source` as one line of `out`, in order.
pub async fn stream_rows<S, W>(
    source: &mut S,
    options: &PipelineOptions,
    out: &mut W,
) -> Result<u64, DumpError>
where
    S: RowSource,
    W: Write,
{
    let columns = source.columns().to_vec();
    let interval = options.progress_interval.max(1);

    let mut count = 0u64;
    while let Some(row) = source.next_row().await? {
        options
            .format
            .write_row(out, &columns, &row)
            .and_then(|()| out.write_all(b"\n"))
            .map_err(DumpError::Write)?;

        count += 1;
        if count % interval == 0 {
            info!("read {count} records...");
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io;

    use super::*;
    use crate::db::{Row, Value};
    use crate::logging::{self, Captured};

    struct Rows {
        columns: Vec<String>,
        rows: VecDeque<Result<Row, DumpError>>,
    }

    impl Rows {
        fn new(columns: &[&str], rows: Vec<Result<Row, DumpError>>) -> Self {
            Self {
                columns: columns.iter().map(|c| c.to_string()).collect(),
                rows: rows.into(),
            }
        }
    }

    impl RowSource for Rows {
        fn columns(&self) -> &[String] {
            &self.columns
        }

        async fn next_row(&mut self) -> Result<Option<Row>, DumpError> {
            self.rows.pop_front().transpose()
        }
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn numbered(n: usize) -> Vec<Result<Row, DumpError>> {
        (0..n).map(|i| Ok(vec![Value::text(&i.to_string())])).collect()
    }

    #[tokio::test]
    async fn one_line_per_row_in_order() {
        let mut source = Rows::new(&["id"], numbered(5));
        let mut out = Vec::new();
        let count = stream_rows(&mut source, &PipelineOptions::default(), &mut out)
            .await
            .unwrap();

        assert_eq!(count, 5);
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        for (i, line) in lines.iter().enumerate() {
            assert_eq!(*line, format!("{{\"id\":\"{i}\"}}"));
        }
        assert!(text.ends_with('\n'));
    }

    #[tokio::test]
    async fn empty_result_writes_nothing() {
        let mut source = Rows::new(&[], Vec::new());
        let mut out = Vec::new();
        let count = stream_rows(&mut source, &PipelineOptions::default(), &mut out)
            .await
            .unwrap();
        assert_eq!(count, 0);
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn tsv_format_is_honored() {
        let mut source = Rows::new(
            &["a", "b"],
            vec![Ok(vec![Value::text("x"), Value::Null])],
        );
        let options = PipelineOptions {
            format: Format::Tsv,
            ..PipelineOptions::default()
        };
        let mut out = Vec::new();
        stream_rows(&mut source, &options, &mut out).await.unwrap();
        assert_eq!(out, b"x\t\n");
    }

    #[tokio::test]
    async fn scan_error_keeps_earlier_rows() {
        let mut rows = numbered(2);
        rows.push(Err(DumpError::Scan(sqlx::Error::RowNotFound)));
        rows.extend(numbered(1));
        let mut source = Rows::new(&["id"], rows);

        let mut out = Vec::new();
        let err = stream_rows(&mut source, &PipelineOptions::default(), &mut out)
            .await
            .unwrap_err();

        assert!(matches!(err, DumpError::Scan(_)));
        assert_eq!(out, b"{\"id\":\"0\"}\n{\"id\":\"1\"}\n");
    }

    #[tokio::test]
    async fn write_failure_is_a_write_error() {
        let mut source = Rows::new(&["id"], numbered(1));
        let err = stream_rows(&mut source, &PipelineOptions::default(), &mut BrokenPipe)
            .await
            .unwrap_err();
        assert!(matches!(err, DumpError::Write(e) if e.kind() == io::ErrorKind::BrokenPipe));
    }

    #[tokio::test]
    async fn progress_lines_go_to_the_log_every_interval() {
        let captured = Captured::default();
        let _guard = tracing::subscriber::set_default(logging::subscriber(captured.clone()));

        let options = PipelineOptions {
            progress_interval: 2,
            ..PipelineOptions::default()
        };
        let mut out = Vec::new();
        let count = stream_rows(&mut Rows::new(&["id"], numbered(5)), &options, &mut out)
            .await
            .unwrap();
        assert_eq!(count, 5);

        let log = captured.text();
        let lines: Vec<&str> = log.lines().collect();
        assert_eq!(lines.len(), 2, "{log}");
        assert!(lines[0].ends_with(": read 2 records..."));
        assert!(lines[1].ends_with(": read 4 records..."));

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 5);
        assert!(!text.contains("records"));
    }

    #[tokio::test]
    async fn unsupported_driver_fails_before_connecting() {
        let params = ConnectionParams {
            driver: "oracle".to_string(),
            host: "localhost".to_string(),
            port: "1521".to_string(),
            user: "u".to_string(),
            password: "p".to_string(),
            database: "d".to_string(),
        };
        let mut out = Vec::new();
        let err = run(&params, "SELECT 1", &PipelineOptions::default(), &mut out)
            .await
            .unwrap_err();
        assert!(matches!(err, DumpError::UnsupportedDriver(_)));
        assert!(out.is_empty());
    }
}
