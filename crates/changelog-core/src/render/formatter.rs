#![allow(clippy::result_large_err)]

use crate::adapter::ChangeLogAdapter;
use crate::config::ChangeLogConfig;
use crate::errors::Result;
use crate::model::{ChangeType, FieldChange};
use crate::render::html::HtmlFormatter;
use crate::render::plain::PlainFormatter;
use crate::render::template::substitute;
use std::collections::BTreeMap;

/// Turns adapters into text
///
/// Every method has a plain-text default built from the configured
/// templates; implementations override the markup around them and decide
/// how dynamic values are escaped.
pub trait Formatter {
    /// Name the factory registers this formatter under
    fn name(&self) -> &'static str;

    /// Applied to every dynamic value before it is substituted
    fn escape(&self, text: &str) -> String {
        text.to_string()
    }

    /// Emitted before a single rendered entry
    fn format_start(&self) -> String {
        String::new()
    }

    /// Emitted after a single rendered entry
    fn format_end(&self) -> String {
        String::new()
    }

    /// Emitted before a list of entries
    fn format_list_start(&self) -> String {
        String::new()
    }

    /// Emitted after a list of entries
    fn format_list_end(&self) -> String {
        String::new()
    }

    fn format_insertion(&self, adapter: &ChangeLogAdapter) -> String {
        self.fill(&adapter.templates().insertion, &self.entry_params(adapter))
    }

    fn format_deletion(&self, adapter: &ChangeLogAdapter) -> String {
        self.fill(&adapter.templates().deletion, &self.entry_params(adapter))
    }

    /// # Errors
    ///
    /// Returns the payload decoding error, if any.
    fn format_custom_message(&self, adapter: &ChangeLogAdapter) -> Result<String> {
        self.custom_message_sentence(adapter)
    }

    /// Every change of an update, joined with `separator`
    ///
    /// # Errors
    ///
    /// Returns the payload decoding error, if any.
    fn format_update(&self, adapter: &ChangeLogAdapter, separator: &str) -> Result<String> {
        Ok(adapter
            .changes()?
            .iter()
            .map(|change| self.format_update_change(adapter, change))
            .collect::<Vec<_>>()
            .join(separator))
    }

    fn format_update_change(&self, adapter: &ChangeLogAdapter, change: &FieldChange) -> String {
        self.change_sentence(adapter, change)
    }

    /// The template sentence for one change, without markup
    fn change_sentence(&self, adapter: &ChangeLogAdapter, change: &FieldChange) -> String {
        let templates = adapter.templates();
        let template = match change.change_type() {
            ChangeType::Addition => &templates.value_addition,
            ChangeType::Removal => &templates.value_removal,
            ChangeType::Update => &templates.value_update,
            ChangeType::BooleanSet => &templates.boolean_set,
            ChangeType::BooleanUnset => &templates.boolean_unset,
        };
        let params = [
            ("field_name", self.escape(&adapter.render_field_name(change))),
            ("old_value", self.escape(&adapter.render_old_value(change))),
            ("new_value", self.escape(&adapter.render_new_value(change))),
        ];
        self.fill(template, &params)
    }

    /// One row of a listing
    fn format_list_entry(&self, adapter: &ChangeLogAdapter) -> String {
        let params = [
            ("operation", self.escape(&adapter.render_operation_type())),
            ("date", self.escape(&adapter.render_created_at())),
        ];
        self.fill(&adapter.templates().list_entry, &params)
    }

    fn format_list_insertion(&self, adapter: &ChangeLogAdapter, _link: &str) -> String {
        self.format_list_entry(adapter)
    }

    fn format_list_update(&self, adapter: &ChangeLogAdapter, _link: &str) -> String {
        self.format_list_entry(adapter)
    }

    fn format_list_deletion(&self, adapter: &ChangeLogAdapter, _link: &str) -> String {
        self.format_list_entry(adapter)
    }

    fn format_list_custom_message(&self, adapter: &ChangeLogAdapter, _link: &str) -> String {
        self.format_list_entry(adapter)
    }

    /// The custom message template filled in, without markup
    ///
    /// # Errors
    ///
    /// Returns the payload decoding error, if any.
    fn custom_message_sentence(&self, adapter: &ChangeLogAdapter) -> Result<String> {
        let mut params = self.entry_params(adapter);
        params.push(("message", self.escape(adapter.custom_message()?)));
        Ok(self.fill(&adapter.templates().custom_message, &params))
    }

    /// `%object_name%`, `%pk%`, `%date%` and `%username%`, escaped
    fn entry_params(&self, adapter: &ChangeLogAdapter) -> Vec<(&'static str, String)> {
        vec![
            ("object_name", self.escape(&adapter.render_class_name())),
            ("pk", self.escape(adapter.primary_key())),
            ("date", self.escape(&adapter.render_created_at())),
            ("username", self.escape(adapter.render_username())),
        ]
    }

    fn fill(&self, template: &str, params: &[(&'static str, String)]) -> String {
        let borrowed: Vec<(&str, &str)> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();
        substitute(template, &borrowed)
    }
}

pub type FormatterConstructor = fn(&ChangeLogConfig) -> Box<dyn Formatter>;

fn plain(_config: &ChangeLogConfig) -> Box<dyn Formatter> {
    Box::new(PlainFormatter)
}

fn html(config: &ChangeLogConfig) -> Box<dyn Formatter> {
    Box::new(HtmlFormatter::new(config.escape_values))
}

/// Maps formatter names to constructors
#[derive(Debug, Clone)]
pub struct FormatterFactory {
    constructors: BTreeMap<String, FormatterConstructor>,
}

impl Default for FormatterFactory {
    fn default() -> Self {
        let mut factory = Self {
            constructors: BTreeMap::new(),
        };
        factory.register(PlainFormatter::NAME, plain);
        factory.register(HtmlFormatter::NAME, html);
        factory
    }
}

impl FormatterFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, constructor: FormatterConstructor) {
        self.constructors.insert(name.into(), constructor);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    /// Build the named formatter, falling back to plain text
    pub fn create(&self, name: &str, config: &ChangeLogConfig) -> Box<dyn Formatter> {
        match self.constructors.get(name) {
            Some(constructor) => constructor(config),
            None => {
                tracing::warn!(formatter = name, "unknown formatter, using plain");
                plain(config)
            }
        }
    }
}
