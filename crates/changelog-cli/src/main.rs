//! Change Log CLI
//!
//! Command-line access to a change log database

use changelog_core::logging_facility::{init, Profile};
use clap::{Parser, Subcommand};

mod commands;
mod context;

#[derive(Debug, Parser)]
#[command(name = "changelog")]
#[command(about = "Inspect and annotate an object change log", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: context::GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create or upgrade the log database
    Migrate,
    /// List the history of one object
    Log(commands::log::LogArgs),
    /// Show a single entry
    Show(commands::show::ShowArgs),
    /// Show the most recent entry of one object
    Latest(commands::show::LatestArgs),
    /// Log a custom message against one object
    Message(commands::message::MessageArgs),
}

fn main() {
    let cli = Cli::parse();
    init(if cli.global.log_json {
        Profile::Production
    } else {
        Profile::Development
    });

    let result = match cli.command {
        Commands::Migrate => commands::migrate::execute(&cli.global),
        Commands::Log(args) => commands::log::execute(&cli.global, args),
        Commands::Show(args) => commands::show::execute(&cli.global, args),
        Commands::Latest(args) => commands::show::execute_latest(&cli.global, args),
        Commands::Message(args) => commands::message::execute(&cli.global, args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
