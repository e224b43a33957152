use clap::Parser;
use extsort::cli::{Args, run_cli};
use extsort::config::Config;
use extsort::output::OutputFormatter;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            OutputFormatter::error(&format!("Error loading configuration: {}", e));
            return ExitCode::from(2);
        }
    };

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    // Logged here rather than in Config::load, which runs before the logger exists.
    match &config.source {
        Some(path) => log::debug!("Loaded configuration from {}", path.display()),
        None => log::debug!("No configuration file found, using defaults"),
    }

    match run_cli(&args, &config) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            OutputFormatter::error("Some files could not be moved. Please review the errors above.");
            ExitCode::FAILURE
        }
        Err(e) => {
            OutputFormatter::error(&format!("{:#}", e));
            ExitCode::from(2)
        }
    }
}
