//! Message command
//!
//! Usage: changelog message --class <CLASS> --pk <PK> --text <TEXT> [--user <NAME>]

use crate::context::{record_for_key, CliResult, GlobalArgs};
use changelog_engine::ChangeLogSession;
use clap::Args;

#[derive(Debug, Args)]
pub struct MessageArgs {
    /// Class of the object; must be present in `--schema`
    #[arg(long)]
    pub class: String,

    #[arg(long)]
    pub pk: String,

    #[arg(long)]
    pub text: String,

    /// Actor recorded on the entry (default: the configured CLI user)
    #[arg(long)]
    pub user: Option<String>,
}

pub fn execute(global: &GlobalArgs, args: MessageArgs) -> CliResult {
    let mut behavior = global.behavior()?;
    let record = record_for_key(behavior.registry(), &args.class, &args.pk)?;
    let session = ChangeLogSession::default();

    let entry = behavior.set_custom_change_message(
        &session,
        &record,
        &serde_json::Value::String(args.text),
        args.user.as_deref(),
    )?;
    println!(
        "Logged message #{} for {} {}",
        entry.id().unwrap_or_default(),
        entry.class_name(),
        args.pk
    );
    Ok(())
}
