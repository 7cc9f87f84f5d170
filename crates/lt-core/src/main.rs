//! lt-core: classify mainframe job logs against known error signatures.

use clap::Parser;
use lt_core::cli::{render_error, run, Cli};
use lt_core::exit_codes::ExitCode;
use lt_core::logging::init_logging;
use lt_common::OutputFormat;
use std::io::{self, Write};
use tracing::debug;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_format);

    let result = run(&cli, &mut io::stdin().lock(), &mut io::stdout().lock());
    let code = match result {
        Ok(code) => code,
        Err(err) => {
            debug!(code = err.code(), "{err}");
            let rendered = render_error(cli.format, &err);
            let written = match cli.format {
                OutputFormat::Json => io::stdout().write_all(rendered.as_bytes()),
                OutputFormat::Table | OutputFormat::Csv => {
                    io::stderr().write_all(rendered.as_bytes())
                }
            };
            if let Err(write_err) = written {
                debug!(error = %write_err, "failed to write error report");
            }
            ExitCode::for_error(&err)
        }
    };

    let _ = io::stdout().flush();
    std::process::exit(code.as_i32());
}
