//! Settings validation CLI tool
//!
//! Validates a bpsession settings document and prints the resolved options.

use bpsession_util::default_settings_path;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let settings_path = match args.get(1) {
        Some(path) if path == "-h" || path == "--help" => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        Some(path) => PathBuf::from(path),
        None => default_settings_path(),
    };

    if args.len() > 2 {
        print_usage();
        return ExitCode::from(2);
    }

    if !settings_path.exists() {
        eprintln!("Error: Settings file not found: {}", settings_path.display());
        return ExitCode::from(1);
    }

    match bpsession_config::load_settings(&settings_path) {
        Ok(config) => {
            println!("✓ Settings are valid");
            println!();
            println!("Resolved ({}):", settings_path.display());
            println!("  compositor:    {}", on_off(config.compositor));
            println!("  steam_os_mode: {}", on_off(config.steam_os_mode));
            println!("  on_deck:       {}", on_off(config.on_deck));
            println!("  deck_ui_mode:  {}", on_off(config.deck_ui_mode));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Settings validation failed");
            eprintln!();
            match &e {
                bpsession_config::SettingsError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                bpsession_config::SettingsError::ParseError(parse_err) => {
                    eprintln!("JSON parse error:");
                    eprintln!("  {}", parse_err);
                }
                bpsession_config::SettingsError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
            }
            ExitCode::from(1)
        }
    }
}

fn print_usage() {
    let default_path = default_settings_path();
    eprintln!("Usage: validate-settings [settings-file]");
    eprintln!();
    eprintln!("Validates a bpsession settings document.");
    eprintln!();
    eprintln!("If no path is provided, uses: {}", default_path.display());
}

fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}
