//! Command-line entry point for the contacts core.
//!
//! # Responsibility
//! - Read one JSON contact payload from stdin and run the upsert.
//! - Print a JSON response envelope and exit non-zero on failure.
//!
//! Usage: `camp_cli [DB_PATH]` or `camp_cli --version`.

mod entry;

use camp_core::{init_logging, CampConfig};
use std::io::Read;
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let db_override = match args.next() {
        Some(arg) if arg == "--version" || arg == "-V" => {
            println!("camp_core version={}", camp_core::core_version());
            return ExitCode::SUCCESS;
        }
        other => other,
    };

    let mut config = CampConfig::from_env();
    if let Some(path) = db_override {
        config = config.with_db_path(path);
    }

    if let Err(err) = init_logging(&config) {
        eprintln!("logging disabled: {err}");
    }

    let mut input = String::new();
    let response = match std::io::stdin().read_to_string(&mut input) {
        Ok(_) => entry::run_entry(&config, &input),
        Err(err) => entry::EntryResponse::failure(format!("failed to read stdin: {err}")),
    };

    match serde_json::to_string(&response) {
        Ok(body) => println!("{body}"),
        Err(err) => {
            eprintln!("failed to encode response: {err}");
            return ExitCode::FAILURE;
        }
    }

    if response.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
