pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "moduvisor",
    about = "Moduvisor operator CLI",
    long_about = "Prepare the module catalog, inspect configuration, check readiness, and run recommendations from the terminal.",
    after_help = "Examples:\n  moduvisor migrate\n  moduvisor seed\n  moduvisor doctor --json\n  moduvisor recommend \"I run a small cafe in Bali\" --exclude 16"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the demo module catalog and industry rows (idempotent)")]
    Seed,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, model settings, DB connectivity, and catalog coverage")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Recommend modules for a business described in one or more user turns")]
    Recommend {
        #[arg(required = true, help = "User turns, oldest first")]
        text: Vec<String>,
        #[arg(long, value_delimiter = ',', help = "Module ids already shown to the user")]
        exclude: Vec<i64>,
        #[arg(long, help = "Use the built-in demo catalog instead of the database")]
        demo_catalog: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Recommend { text, exclude, demo_catalog } => {
            commands::recommend::run(text, exclude, demo_catalog)
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Command};

    #[test]
    fn recommend_accepts_comma_separated_exclusions() {
        let cli = Cli::try_parse_from([
            "moduvisor",
            "recommend",
            "I run a warung",
            "we also deliver",
            "--exclude",
            "16,3",
            "--demo-catalog",
        ])
        .expect("arguments parse");

        match cli.command {
            Command::Recommend { text, exclude, demo_catalog } => {
                assert_eq!(text, vec!["I run a warung", "we also deliver"]);
                assert_eq!(exclude, vec![16, 3]);
                assert!(demo_catalog);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn recommend_requires_text() {
        assert!(Cli::try_parse_from(["moduvisor", "recommend"]).is_err());
    }
}
