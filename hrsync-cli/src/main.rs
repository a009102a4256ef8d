//! hrsync: HR directory to expense-platform role sync.
//!
//! # Usage
//!
//! ```text
//! hrsync init [--force]
//! hrsync run [--days N | --start DATE --end DATE | --full] [--skip-roles] [--continue-on-error]
//! hrsync schedule [--hour H] [--minute M]
//! hrsync mappings leaders|managers [--json]
//! hrsync branch-file [--dest DIR]
//! hrsync logs [--lines N]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    branch_file::BranchFileArgs, init::InitArgs, logs::LogsArgs, mappings::MappingsCommand,
    run::RunArgs, schedule::ScheduleArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "hrsync",
    version,
    about = "Sync the HR directory into a local database and push derived approval roles",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a template config and create the local database.
    Init(InitArgs),

    /// Run one sync now.
    Run(RunArgs),

    /// Run the sync every day at a fixed local time until ctrl-c.
    Schedule(ScheduleArgs),

    /// Print role mappings derived from the local database.
    Mappings {
        #[command(subcommand)]
        command: MappingsCommand,
    },

    /// Download the bank-branch spreadsheet from the expense platform.
    BranchFile(BranchFileArgs),

    /// Print the tail of the log file.
    Logs(LogsArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Init(args) => args.run(),
        Commands::Run(args) => args.run(),
        Commands::Schedule(args) => args.run(),
        Commands::Mappings { command } => commands::mappings::run(command),
        Commands::BranchFile(args) => args.run(),
        Commands::Logs(args) => args.run(),
    }
}
