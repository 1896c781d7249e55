pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "valbot",
    about = "Valuation Bot operator CLI",
    long_about = "Inspect configuration, check Twilio readiness, and replay chat commands locally.",
    after_help = "Examples:\n  valbot doctor --json\n  valbot config\n  valbot reply /calculate 15000\n  valbot reply --script '/settings high' --script '/calculate 1000'"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config and Twilio credential readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Run chat messages through the command router against a fresh store")]
    Reply {
        #[arg(long, default_value = commands::reply::DEFAULT_SENDER, help = "Sender id")]
        from: String,
        #[arg(long = "script", help = "Message to send before the trailing message; repeatable")]
        script: Vec<String>,
        #[arg(trailing_var_arg = true, help = "Message text, joined with spaces")]
        message: Vec<String>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Reply { from, script, message } => {
            let mut messages = script;
            if !message.is_empty() {
                messages.push(message.join(" "));
            }
            commands::reply::run(&from, &messages)
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
