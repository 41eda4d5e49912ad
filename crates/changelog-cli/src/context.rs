//! Flags shared by every command and the behavior they build

use changelog_core::config::load_config;
use changelog_core::schema::load_schema;
use changelog_core::{ChangeLogConfig, NormalizedPk, PrimaryKey, Record, SchemaRegistry};
use changelog_engine::ChangeLogBehavior;
use changelog_store::SqliteLogRepo;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::Args;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// SQLite database holding the log
    #[arg(long, global = true, default_value = ".changelog/changelog.db")]
    pub db: PathBuf,

    /// Behavior configuration (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Schema registry (TOML); needed for labels and for `message`
    #[arg(long, global = true)]
    pub schema: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,
}

impl GlobalArgs {
    pub fn open_repo(&self) -> CliResult<SqliteLogRepo> {
        if let Some(parent) = self.db.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Ok(SqliteLogRepo::open(&self.db)?)
    }

    pub fn behavior(&self) -> CliResult<ChangeLogBehavior<SqliteLogRepo>> {
        let config = match &self.config {
            Some(path) => load_config(path)?,
            None => ChangeLogConfig::default(),
        };
        let registry = match &self.schema {
            Some(path) => load_schema(path)?,
            None => SchemaRegistry::new(),
        };
        Ok(ChangeLogBehavior::new(
            Arc::new(config),
            Arc::new(registry),
            self.open_repo()?,
        ))
    }
}

/// A stored-looking record carrying only its key columns
pub fn record_for_key(registry: &SchemaRegistry, class_name: &str, pk: &str) -> CliResult<Record> {
    let table = registry.require_table(class_name)?;
    let key = PrimaryKey::from_normalized(&NormalizedPk::from(pk), table.primary_key.len());
    let parts = key.parts();
    if parts.len() != table.primary_key.len() {
        return Err(format!(
            "{} has a {}-column primary key, got '{}'",
            class_name,
            table.primary_key.len(),
            pk
        )
        .into());
    }
    let values: BTreeMap<String, serde_json::Value> = table
        .primary_key
        .iter()
        .zip(parts)
        .map(|(column, part)| (column.clone(), serde_json::Value::from(part)))
        .collect();
    Ok(Record::from_stored(class_name, values))
}

/// RFC 3339 instant or a bare `YYYY-MM-DD` date
///
/// A bare date means the start of that day, or its last millisecond when
/// `end_of_day` is set.
pub fn parse_instant(input: &str, end_of_day: bool) -> CliResult<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(input) {
        return Ok(instant.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{}': expected YYYY-MM-DD or RFC 3339", input))?;
    let time = if end_of_day {
        NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
    } else {
        Some(NaiveTime::MIN)
    };
    let time = time.ok_or("invalid time of day")?;
    Ok(date.and_time(time).and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_instant_forms() {
        assert_eq!(
            parse_instant("2024-03-01", false).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_instant("2024-03-01", true).unwrap().to_rfc3339(),
            "2024-03-01T23:59:59.999+00:00"
        );
        assert_eq!(
            parse_instant("2024-03-01T10:00:00+02:00", false).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
        );
        assert!(parse_instant("yesterday", false).is_err());
    }

    #[test]
    fn test_record_for_composite_key() {
        let registry = SchemaRegistry::new().with_table(
            changelog_core::TableDescriptor::new("BookTag", "book_tag")
                .with_primary_key(&["book_id", "tag_id"]),
        );
        let record = record_for_key(&registry, "BookTag", "3-7").unwrap();
        assert_eq!(record.value("book_id"), "3");
        assert_eq!(record.value("tag_id"), "7");
        assert!(!record.is_new());

        assert!(record_for_key(&registry, "BookTag", "3").is_err());
        assert!(record_for_key(&registry, "Book", "3").is_err());
    }
}
