//! bcas-dump binary
//!
//! ```bash
//! # Print every frame of a capture
//! bcas-dump capture.bcas
//!
//! # Print captured ECM exchanges and answer a lookup
//! bcas-dump --mode ecm capture.bcas --lookup 001e01fe...
//!
//! # Write the init status from a key file back out
//! bcas-dump --config card.toml --dump-init-status
//! ```

use std::{io, process::ExitCode};

use bcas_dump::{Args, run};
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match run(&args, &mut out) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "bcas-dump failed");
            ExitCode::FAILURE
        },
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}
