//! Change log configuration
//!
//! Built once at startup, either from code or from a TOML file, and shared
//! read-only (`Arc<ChangeLogConfig>`) by the engine and the render layer.

#![allow(clippy::result_large_err)]

use crate::errors::{ChangeLogError, Result};
use crate::render::Templates;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Fields never diffed, whatever the class
pub const DEFAULT_IGNORED_FIELDS: &[&str] = &["created_at", "created_by", "updated_at", "updated_by"];

/// What to do with an update whose change set came out empty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyUpdatePolicy {
    /// Write the record anyway (audit columns still move), log nothing
    #[default]
    Persist,
    /// Skip the write entirely
    Skip,
}

/// Extra fields excluded from diffs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoreFields {
    /// Applies to every class
    pub any_class: Vec<String>,
    /// Keyed by class name
    pub per_class: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangeLogConfig {
    /// User name recorded when no actor is known
    pub username_cli: String,
    pub date_format: String,
    pub time_format: String,
    pub date_time_format: String,
    pub ignore_fields: IgnoreFields,
    /// Name of the formatter adapters render with
    pub formatter: String,
    pub templates: Templates,
    /// Render foreign key values as the referenced object's display string
    pub foreign_values: bool,
    /// Escape rendered values for markup formatters
    pub escape_values: bool,
    /// Run field render hooks
    pub fire_formatting_events: bool,
    /// Stamp a null `created_at` column with the insertion instant
    pub stamp_created_at: bool,
    pub empty_update_policy: EmptyUpdatePolicy,
}

impl Default for ChangeLogConfig {
    fn default() -> Self {
        Self {
            username_cli: "cli".to_string(),
            date_format: "%Y/%m/%d".to_string(),
            time_format: "%H:%M:%S".to_string(),
            date_time_format: "%Y/%m/%d %H:%M:%S".to_string(),
            ignore_fields: IgnoreFields::default(),
            formatter: "plain".to_string(),
            templates: Templates::default(),
            foreign_values: false,
            escape_values: false,
            fire_formatting_events: true,
            stamp_created_at: true,
            empty_update_policy: EmptyUpdatePolicy::Persist,
        }
    }
}

impl ChangeLogConfig {
    /// Parse a TOML document; missing keys keep their defaults
    ///
    /// # Errors
    ///
    /// Returns `Config` if the document is not valid TOML for this shape.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ChangeLogError::Config {
            message: e.to_string(),
        })
    }

    /// Full ignore list for a class: defaults, then `any_class`, then the
    /// class's own entries
    pub fn ignored_fields_for(&self, class_name: &str) -> Vec<String> {
        let mut fields: Vec<String> = DEFAULT_IGNORED_FIELDS
            .iter()
            .map(|f| f.to_string())
            .collect();
        let per_class = self
            .ignore_fields
            .per_class
            .get(class_name)
            .into_iter()
            .flatten();
        for field in self.ignore_fields.any_class.iter().chain(per_class) {
            if !fields.contains(field) {
                fields.push(field.clone());
            }
        }
        fields
    }
}

/// Load configuration from a TOML file
///
/// # Errors
///
/// Returns `Io` if the file cannot be read, `Config` if it cannot be
/// parsed.
pub fn load_config(path: &Path) -> Result<ChangeLogConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ChangeLogError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    ChangeLogConfig::from_toml_str(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ChangeLogConfig::default();
        assert_eq!(config.username_cli, "cli");
        assert_eq!(config.date_time_format, "%Y/%m/%d %H:%M:%S");
        assert_eq!(config.formatter, "plain");
        assert!(config.fire_formatting_events);
        assert!(!config.foreign_values);
        assert_eq!(config.empty_update_policy, EmptyUpdatePolicy::Persist);
    }

    #[test]
    fn test_toml_overrides_keep_other_defaults() {
        let config = ChangeLogConfig::from_toml_str(
            r#"
username_cli = "batch"
formatter = "html"
empty_update_policy = "skip"

[ignore_fields]
any_class = ["version"]

[ignore_fields.per_class]
Book = ["isbn"]

[templates]
list_entry = "%operation% (%date%)"
"#,
        )
        .unwrap();

        assert_eq!(config.username_cli, "batch");
        assert_eq!(config.formatter, "html");
        assert_eq!(config.empty_update_policy, EmptyUpdatePolicy::Skip);
        assert_eq!(config.date_format, "%Y/%m/%d");
        assert_eq!(config.templates.list_entry, "%operation% (%date%)");
        assert_eq!(
            config.templates.value_update,
            Templates::default().value_update
        );
    }

    #[test]
    fn test_ignored_fields_merge_without_duplicates() {
        let mut config = ChangeLogConfig::default();
        config.ignore_fields.any_class = vec!["version".into(), "updated_at".into()];
        config
            .ignore_fields
            .per_class
            .insert("Book".into(), vec!["isbn".into()]);

        let fields = config.ignored_fields_for("Book");
        assert_eq!(
            fields,
            vec!["created_at", "created_by", "updated_at", "updated_by", "version", "isbn"]
        );
        assert!(!config.ignored_fields_for("Author").contains(&"isbn".to_string()));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = ChangeLogConfig::from_toml_str("username_cli = [").unwrap_err();
        assert!(matches!(err, ChangeLogError::Config { .. }));
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("changelog.toml");
        std::fs::write(&path, "foreign_values = true\n").unwrap();

        let config = load_config(&path).unwrap();
        assert!(config.foreign_values);

        let missing = load_config(&dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(ChangeLogError::Io { .. })));
    }
}
