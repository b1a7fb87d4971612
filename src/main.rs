use clap::Parser;
use storemap::{app, utils, Args};
use tracing::error;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    utils::setup_logging(args.verbose);
    utils::validate_args(&args)?;

    match app::run(&args) {
        Ok(()) => Ok(()),
        Err(e) => {
            error!(action = "fail", component = "main", error = %e, "Dashboard failed");
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
