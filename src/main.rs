use anyhow::Result;
use clap::Parser;
use sbscript_core::cli::Args;

fn main() -> Result<()> {
    let args = Args::parse();
    let default_level = if args.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
    sbscript_core::run_cli(&args)
}
