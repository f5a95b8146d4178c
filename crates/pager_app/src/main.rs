mod app;
mod config;
mod logging;

use std::process::ExitCode;

use logging::LogDestination;

fn main() -> ExitCode {
    logging::initialize(LogDestination::from_env(|key| std::env::var(key).ok()));

    let config = match config::AppConfig::from_sources(std::env::args().skip(1), |key| {
        std::env::var(key).ok()
    }) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("feedpager: {err}");
            return ExitCode::from(2);
        }
    };

    match app::run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("feedpager: {err}");
            ExitCode::FAILURE
        }
    }
}
