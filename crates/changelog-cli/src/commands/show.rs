//! Show and latest commands
//!
//! Usage: changelog show --id <ID>
//!        changelog latest --class <CLASS> --pk <PK>

use crate::context::{CliResult, GlobalArgs};
use changelog_core::{ChangeLogAdapter, ChangeLogRepository, NormalizedPk};
use clap::Args;

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Entry id
    #[arg(long)]
    pub id: i64,
}

#[derive(Debug, Args)]
pub struct LatestArgs {
    #[arg(long)]
    pub class: String,

    #[arg(long)]
    pub pk: String,
}

pub fn execute(global: &GlobalArgs, args: ShowArgs) -> CliResult {
    let behavior = global.behavior()?;
    let adapter = behavior
        .entry_adapter(args.id)?
        .ok_or_else(|| format!("no change log entry with id {}", args.id))?;
    print_adapter(&adapter);
    Ok(())
}

pub fn execute_latest(global: &GlobalArgs, args: LatestArgs) -> CliResult {
    let behavior = global.behavior()?;
    let latest = behavior
        .repo()
        .latest_for(&args.class, &NormalizedPk::from(args.pk.as_str()))?;
    match latest.and_then(|entry| behavior.adapters(vec![entry]).pop()) {
        Some(adapter) => print_adapter(&adapter),
        None => println!("No change log entries for {} {}", args.class, args.pk),
    }
    Ok(())
}

fn print_adapter(adapter: &ChangeLogAdapter) {
    println!("Entry #{}", adapter.entry().id().unwrap_or_default());
    println!("  class:     {}", adapter.render_class_name());
    println!("  object:    {}", adapter.primary_key());
    println!("  operation: {}", adapter.operation());
    println!("  user:      {}", adapter.render_username());
    println!("  at:        {}", adapter.render_created_at());
    println!();
    println!("{}", adapter);
}
