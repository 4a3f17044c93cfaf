pub mod commands;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use commands::recommend::RecommendArgs;

#[derive(Debug, Parser)]
#[command(
    name = "voltwiz",
    about = "VoltWiz electricity plan advisor CLI",
    long_about = "Find the best electricity plan interactively or from direct preferences, and inspect catalog, config and readiness.",
    after_help = "Examples:\n  voltwiz chat\n  voltwiz recommend --smart-meter yes --priority max-discount --min-discount 10\n  voltwiz recommend --smart-meter no --priority time-specific --window 18-22 --json\n  voltwiz doctor --json"
)]
pub struct Cli {
    #[arg(long, global = true, value_name = "PATH", help = "Config file (defaults to voltwiz.toml or config/voltwiz.toml)")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Answer the advisor's questions on stdin and get a recommendation")]
    Chat,
    #[command(about = "Recommend a plan from preferences given as flags")]
    Recommend(RecommendArgs),
    #[command(about = "Validate and list the configured plan catalog")]
    Catalog {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, plan catalog, and message templates")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Command::Chat => {
            let stdin = io::stdin();
            commands::chat::run(config_path, stdin.lock(), io::stdout())
        }
        Command::Recommend(args) => commands::recommend::run(config_path, &args),
        Command::Catalog { json } => commands::catalog::run(config_path, json),
        Command::Config => commands::config::run(config_path),
        Command::Doctor { json } => commands::doctor::run(config_path, json),
    };

    if !result.output.is_empty() {
        println!("{}", result.output);
    }
    ExitCode::from(result.exit_code)
}
