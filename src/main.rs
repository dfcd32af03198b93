use std::process;

use clap::Parser;
use colored::Colorize;

use redmine_release::app;
use redmine_release::cli::Args;
use redmine_release::error::Error;

fn main() {
    let args = Args::parse();

    if let Err(err) = init_logger(args.debug) {
        eprintln!("Failed to initialize logger: {}", err);
        process::exit(1);
    }

    if let Err(err) = app::run(args) {
        match err {
            // Ctrl-C / ESC in a prompt is a normal way out, not a failure
            Error::Cancelled => process::exit(130),
            other => {
                eprintln!("{} {}", "error:".red(), other);
                process::exit(1);
            }
        }
    }
}

fn init_logger(debug: bool) -> Result<(), log::SetLoggerError> {
    let filter = if debug {
        simplelog::LevelFilter::Debug
    } else {
        simplelog::LevelFilter::Warn
    };

    let config = simplelog::ConfigBuilder::new()
        .add_filter_allow_str("redmine_release")
        .build();

    simplelog::TermLogger::init(
        filter,
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )
}
