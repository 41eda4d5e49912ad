use serde::{Deserialize, Serialize};

/// Sentences the formatters fill in
///
/// Placeholders per template:
/// - `value_update`: `%field_name%`, `%old_value%`, `%new_value%`
/// - `value_addition`: `%field_name%`, `%new_value%`
/// - `value_removal`: `%field_name%`, `%old_value%`
/// - `insertion`, `deletion`: `%object_name%`, `%pk%`, `%date%`, `%username%`
/// - `boolean_set`, `boolean_unset`: `%field_name%`
/// - `custom_message`: `%message%`, `%object_name%`, `%pk%`, `%date%`, `%username%`
/// - `list_entry`: `%operation%`, `%date%`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Templates {
    pub value_update: String,
    pub value_addition: String,
    pub value_removal: String,
    pub insertion: String,
    pub deletion: String,
    pub boolean_set: String,
    pub boolean_unset: String,
    pub custom_message: String,
    pub list_entry: String,
}

impl Default for Templates {
    fn default() -> Self {
        Self {
            value_update: "Value of field '%field_name%' changed from '%old_value%' to '%new_value%'."
                .to_string(),
            value_addition:
                "Value of field '%field_name%' was set to '%new_value%'. It had no value set before."
                    .to_string(),
            value_removal:
                "Value of field '%field_name%' was unset. It's previous value was '%old_value%'."
                    .to_string(),
            insertion: "A new %object_name% has been created and it has been given the primary key '%pk%' at %date% by %username%."
                .to_string(),
            deletion: "The %object_name% with primary key '%pk%' has been deleted at %date% by %username%."
                .to_string(),
            boolean_set: "The boolean field '%field_name%' was set.".to_string(),
            boolean_unset: "The boolean field '%field_name%' was unset.".to_string(),
            custom_message: "%message%".to_string(),
            list_entry: "%operation% at %date%".to_string(),
        }
    }
}

/// Replace `%name%` placeholders in a single pass
///
/// Placeholders without a parameter are left as written, and substituted
/// values are never scanned again.
pub fn substitute(template: &str, params: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('%') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('%') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let name = &after[..end];
        match params.iter().find(|(key, _)| *key == name) {
            Some((_, value)) => {
                out.push_str(value);
                rest = &after[end + 1..];
            }
            None => {
                out.push('%');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
