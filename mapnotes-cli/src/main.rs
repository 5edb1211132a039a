//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use mapnotes_cli::CliError;

fn main() {
    env_logger::init();
    match mapnotes_cli::run() {
        Ok(()) => {}
        Err(CliError::ArgumentParsing(err)) => err.exit(),
        Err(err) => {
            eprintln!("mapnotes: {err}");
            std::process::exit(1);
        }
    }
}
