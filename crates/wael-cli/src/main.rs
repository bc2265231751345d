use std::process::ExitCode;

use clap::Parser;
use wael_cli::{init_tracing, run, Cli};

fn main() -> ExitCode {
    init_tracing();
    run(Cli::parse())
}
