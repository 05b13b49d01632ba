use thiserror::Error;

/// Every way a dump can fail. All of them are fatal to the run.
#[derive(Debug, Error)]
pub enum DumpError {
    #[error("wrong number of arguments ({given} for {expected})")]
    Arguments { given: usize, expected: usize },

    #[error("unsupported driver: {0}")]
    UnsupportedDriver(String),

    #[error("cannot connect to database")]
    Connect(#[source] sqlx::Error),

    #[error("query failed")]
    Query(#[source] sqlx::Error),

    #[error("cannot read row")]
    Scan(#[source] sqlx::Error),

    #[error("cannot write output")]
    Write(#[source] std::io::Error),
}
