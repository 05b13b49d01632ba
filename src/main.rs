mod cli;
mod db;
mod encode;
mod error;
mod logging;
mod pipeline;
mod sink;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use cli::{DumpRequest, Invocation, Options};

fn main() -> ExitCode {
    let options = match Options::try_parse() {
        Ok(options) => options,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let request = match options.into_invocation() {
        Ok(Invocation::Version) => {
            println!("{}", cli::version());
            return ExitCode::SUCCESS;
        }
        Ok(Invocation::Dump(request)) => request,
        Err(err) => {
            print_error(&err.into());
            eprint!("{}", cli::usage());
            return ExitCode::FAILURE;
        }
    };

    logging::init();

    match dump(request) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            print_error(&err);
            ExitCode::FAILURE
        }
    }
}

fn dump(request: DumpRequest) -> Result<u64> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let stdout = std::io::stdout().lock();
    let count = runtime.block_on(pipeline::run(
        &request.params,
        &request.query,
        &request.options,
        stdout,
    ))?;
    Ok(count)
}

fn print_error(err: &anyhow::Error) {
    let program = std::env::args_os()
        .next()
        .map(|arg| arg.to_string_lossy().into_owned())
        .unwrap_or_else(|| "sqldump".to_string());
    eprintln!("{program}: error: {err:#}");
}
