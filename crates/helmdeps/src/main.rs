//! helmdeps: graph or JSON output of all dependencies of a Helm chart.

// The written path goes to stdout; everything else goes through tracing.
#![allow(clippy::print_stdout, clippy::print_stderr)]

use helmdeps::cli::{self, EXIT_OK, exit_code_for, render_error};
use helmdeps::tracing::{TracingConfig, init_tracing};

fn main() {
    let cli = cli::parse();

    let config = TracingConfig::from_verbosity(cli.verbose, cli.log_format);
    if let Err(e) = init_tracing(&config) {
        eprintln!("Warning: failed to initialize tracing: {e}");
    }

    let code = match helmdeps::run(&cli) {
        Ok(path) => {
            println!("{}", path.display());
            EXIT_OK
        }
        Err(err) => {
            render_error(&err);
            exit_code_for(&err)
        }
    };

    std::process::exit(code);
}
