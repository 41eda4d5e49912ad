//! Log command
//!
//! Usage: changelog log --class <CLASS> --pk <PK> [--from <DATE>] [--to <DATE>]
//! [--operation <OP>] [--reverse] [--limit <N>] [--detail]

use crate::commands::{detail_lines, summary_line};
use crate::context::{parse_instant, CliResult, GlobalArgs};
use changelog_core::{LogCriteria, LogOrder, NormalizedPk, OperationKind};
use clap::Args;

#[derive(Debug, Args)]
pub struct LogArgs {
    /// Class of the object
    #[arg(long)]
    pub class: String,

    /// Normalized primary key (composite parts joined with `-`)
    #[arg(long)]
    pub pk: String,

    /// Earliest creation time, inclusive
    #[arg(long)]
    pub from: Option<String>,

    /// Latest creation time, inclusive
    #[arg(long)]
    pub to: Option<String>,

    /// Only one operation: insertion, update, deletion or custom_message
    #[arg(long)]
    pub operation: Option<String>,

    /// Newest first
    #[arg(long)]
    pub reverse: bool,

    #[arg(long)]
    pub limit: Option<usize>,

    /// Print each entry in full below its summary
    #[arg(long)]
    pub detail: bool,
}

pub fn execute(global: &GlobalArgs, args: LogArgs) -> CliResult {
    let behavior = global.behavior()?;
    let criteria = criteria_from(&args)?;
    let adapters =
        behavior.get_change_log_for(&args.class, &NormalizedPk::from(args.pk.as_str()), &criteria)?;

    if adapters.is_empty() {
        println!("No change log entries for {} {}", args.class, args.pk);
        return Ok(());
    }
    for adapter in &adapters {
        println!("{}", summary_line(adapter));
        if args.detail {
            for line in detail_lines(adapter) {
                println!("{}", line);
            }
        }
    }
    Ok(())
}

fn criteria_from(args: &LogArgs) -> CliResult<LogCriteria> {
    let from = args
        .from
        .as_deref()
        .map(|s| parse_instant(s, false))
        .transpose()?;
    let to = args
        .to
        .as_deref()
        .map(|s| parse_instant(s, true))
        .transpose()?;

    let mut criteria = LogCriteria::new().between(from, to).order(if args.reverse {
        LogOrder::ReverseChronological
    } else {
        LogOrder::Chronological
    });
    if let Some(operation) = &args.operation {
        let kind = OperationKind::parse(operation)
            .ok_or_else(|| format!("unknown operation '{}'", operation))?;
        criteria = criteria.operation(kind);
    }
    if let Some(limit) = args.limit {
        criteria = criteria.limit(limit);
    }
    Ok(criteria)
}
