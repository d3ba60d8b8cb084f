use std::process::ExitCode;

use clap::Parser;
use pixelsmith::cli::{self, CliArgs};
use pixelsmith::logger::{self, LogLevel};
use pixelsmith::settings::EngineSettings;

fn main() -> ExitCode {
    let args = CliArgs::parse();
    let settings = EngineSettings::load();

    // Initialize session log (overwrites previous session log)
    let level = if args.verbose { LogLevel::Debug } else { settings.log_level };
    logger::init(level);
    pixelsmith::log_info!("cli run: {} input pattern(s)", args.input.len());

    cli::run(args, &settings)
}
