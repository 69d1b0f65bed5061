//! Binary entry point for `ctxfanout`.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use clap::Parser;
use ctxfanout::cli::Cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(
                "debug".parse().expect("static directive parses"),
            ))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .init();
    }

    let Ok(runtime) = tokio::runtime::Runtime::new() else {
        eprintln!("error: failed to start the async runtime");
        return ExitCode::FAILURE;
    };
    runtime.block_on(ctxfanout::cli::run(cli))
}
