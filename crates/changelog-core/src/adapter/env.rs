use crate::config::ChangeLogConfig;
use crate::render::{FieldHooks, FieldRenderContext, Formatter, FormatterFactory, ForeignValueResolver};
use crate::schema::SchemaRegistry;
use serde_json::Value;
use std::sync::Arc;

/// Everything an adapter needs to render itself
///
/// Built once and shared by every adapter through an `Arc`.
pub struct RenderEnv {
    config: Arc<ChangeLogConfig>,
    registry: Arc<SchemaRegistry>,
    formatters: FormatterFactory,
    field_hooks: FieldHooks,
    foreign_values: Option<Box<dyn ForeignValueResolver>>,
}

impl RenderEnv {
    pub fn new(config: Arc<ChangeLogConfig>, registry: Arc<SchemaRegistry>) -> Self {
        Self {
            config,
            registry,
            formatters: FormatterFactory::new(),
            field_hooks: FieldHooks::new(),
            foreign_values: None,
        }
    }

    pub fn with_formatters(mut self, formatters: FormatterFactory) -> Self {
        self.formatters = formatters;
        self
    }

    pub fn with_field_hooks(mut self, field_hooks: FieldHooks) -> Self {
        self.field_hooks = field_hooks;
        self
    }

    /// Used for foreign key columns when `foreign_values` is configured
    pub fn with_foreign_value_resolver(mut self, resolver: impl ForeignValueResolver + 'static) -> Self {
        self.foreign_values = Some(Box::new(resolver));
        self
    }

    pub fn config(&self) -> &ChangeLogConfig {
        &self.config
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn formatters(&self) -> &FormatterFactory {
        &self.formatters
    }

    /// The configured formatter, freshly built
    pub fn formatter(&self) -> Box<dyn Formatter> {
        self.formatters.create(&self.config.formatter, &self.config)
    }

    /// Run field hooks when enabled; reports whether a field hook handled it
    pub(crate) fn run_field_hooks(&self, ctx: &FieldRenderContext<'_>, value: Value) -> (Value, bool) {
        if self.config.fire_formatting_events {
            self.field_hooks.run(ctx, value)
        } else {
            (value, false)
        }
    }

    pub(crate) fn resolve_foreign_value(&self, class_name: &str, key: &str) -> Option<String> {
        if !self.config.foreign_values {
            return None;
        }
        self.foreign_values
            .as_ref()
            .and_then(|resolver| resolver.display_value(class_name, key))
    }
}

impl std::fmt::Debug for RenderEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderEnv")
            .field("config", &self.config)
            .field("field_hooks", &self.field_hooks)
            .field("foreign_values", &self.foreign_values.is_some())
            .finish()
    }
}
