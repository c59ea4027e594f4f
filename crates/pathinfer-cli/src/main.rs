use std::process::ExitCode;

use clap::Parser;

use pathinfer_cli::app::{Cli, run};
use pathinfer_cli::{EXIT_USAGE, exit_code};

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // --help and --version print to stdout and exit 0.
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => {
            eprint!("{}", err.render());
            return ExitCode::from(EXIT_USAGE);
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}
