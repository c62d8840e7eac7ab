#![forbid(unsafe_code)]

//! Walkthrough binary: runs the change-tracking scenarios with logging.

use revtrack_demo::cli::Opts;
use revtrack_demo::walkthrough;
use tracing_subscriber::EnvFilter;

fn main() {
    let opts = Opts::parse();

    let filter = EnvFilter::try_new(&opts.log).unwrap_or_else(|err| {
        eprintln!("Invalid log filter {:?}: {err}; using 'info'", opts.log);
        EnvFilter::new("info")
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if let Err(err) = walkthrough::run(opts.scenario) {
        tracing::error!(error = %err, "walkthrough failed");
        std::process::exit(1);
    }
}
