use clap::{CommandFactory, Parser};

use crate::db::{ConnectionParams, DEFAULT_DRIVER};
use crate::encode::Format;
use crate::error::DumpError;
use crate::pipeline::PipelineOptions;

const POSITIONALS: usize = 6;

#[derive(Parser, Debug)]
#[command(
    name = "sqldump",
    about = "Run one SQL query and write the result set to stdout as JSON lines or TSV",
    override_usage = "sqldump [--driver NAME] [--tsv | --json] [--gzip] [--version] HOST PORT USER PASSWORD DATABASE QUERY > out.json",
    disable_version_flag = true
)]
pub struct Options {
    /// Database driver name (mysql, postgres, sqlite)
    #[arg(long, value_name = "NAME", default_value = DEFAULT_DRIVER)]
    pub driver: String,

    /// Enables TSV output
    #[arg(long, overrides_with = "json")]
    pub tsv: bool,

    /// Enables JSON output (default)
    #[arg(long, overrides_with = "tsv")]
    pub json: bool,

    /// Enables gzip compression
    #[arg(long)]
    pub gzip: bool,

    /// Shows version number and quit
    #[arg(long)]
    pub version: bool,

    /// HOST PORT USER PASSWORD DATABASE QUERY
    ///
    /// Flags are only read before the first of these; anything after it,
    /// dash-leading or not, is a positional value.
    #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// What the command line asked for.
#[derive(Debug)]
pub enum Invocation {
    Version,
    Dump(DumpRequest),
}

#[derive(Debug)]
pub struct DumpRequest {
    pub params: ConnectionParams,
    pub query: String,
    pub options: PipelineOptions,
}

impl Options {
    pub fn into_invocation(self) -> Result<Invocation, DumpError> {
        if self.version {
            return Ok(Invocation::Version);
        }

        let [host, port, user, password, database, query]: [String; POSITIONALS] =
            self.args.try_into().map_err(|args: Vec<String>| DumpError::Arguments {
                given: args.len(),
                expected: POSITIONALS,
            })?;

        // `overrides_with` leaves only the flag given last set.
        let format = if self.tsv { Format::Tsv } else { Format::Json };

        Ok(Invocation::Dump(DumpRequest {
            params: ConnectionParams {
                driver: self.driver,
                host,
                port,
                user,
                password,
                database,
            },
            query,
            options: PipelineOptions {
                format,
                gzip: self.gzip,
                ..PipelineOptions::default()
            },
        }))
    }
}

/// Usage line followed by the flag descriptions.
pub fn usage() -> String {
    Options::command().render_help().to_string()
}

pub fn version() -> String {
    format!("sqldump version {}", env!("CARGO_PKG_VERSION"))
}
