//! Reference CLI host for the decomposition-dispatch-aggregation
//! pipeline. An external collaborator per the crate's own scope: it
//! carries no business logic beyond argument parsing, config resolution,
//! and output formatting.

pub mod output;
pub mod parser;

pub use output::OutputFormat;
pub use parser::Cli;

use std::process::ExitCode;
use std::sync::Arc;

use crate::model::Input;
use crate::worker::EchoWorker;

/// Runs the CLI end to end: resolves `Input`/`Options` from `cli`, calls
/// [`crate::process`] with the identity fallback worker (no live LM
/// transport is wired in by this reference host — see §4.5), and prints
/// the formatted reply.
pub async fn run(cli: Cli) -> ExitCode {
    let input = if let Some(path) = cli.file.clone() {
        Input::FilePath(path)
    } else if let Some(content) = cli.content.clone() {
        Input::Content(content)
    } else if !cli.files.is_empty() {
        Input::Files(cli.files.clone())
    } else {
        eprintln!("one of --file, --content, or --files is required");
        return ExitCode::FAILURE;
    };

    let options = cli.options();
    let format = OutputFormat::parse(&cli.format);
    let worker = Arc::new(EchoWorker);

    match crate::process(input, options, worker).await {
        Ok(reply) => {
            println!("{}", output::format_reply(&reply, format));
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
