//! CLI smoke entry point.
//!
//! # Responsibility
//! - Open the registry configured through `SCHOOLREG_*` variables.
//! - Print the core version and a record count per entity kind.

use log::error;
use schoolreg_core::{init_logging, LoggingConfig, RegistryConfig, SchoolRegistry};
use std::process::ExitCode;

fn main() -> ExitCode {
    if let Some(logging) = LoggingConfig::from_env() {
        if let Err(err) = init_logging(&logging) {
            eprintln!("schoolreg logging disabled: {err}");
        }
    }

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("event=cli_startup module=cli status=error");
            eprintln!("schoolreg error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    let config = RegistryConfig::from_env().map_err(|err| err.to_string())?;
    let registry = SchoolRegistry::open(&config).map_err(|err| err.to_string())?;
    let snapshot = registry.snapshot().map_err(|err| err.to_string())?;

    println!("schoolreg_core version={}", schoolreg_core::core_version());
    println!("cities={}", snapshot.cities.len());
    println!("specialities={}", snapshot.specialities.len());
    println!("users={}", snapshot.users.len());
    println!("students={}", snapshot.students.len());
    println!("teachers={}", snapshot.teachers.len());
    println!("meetings={}", snapshot.meetings.len());
    Ok(())
}
