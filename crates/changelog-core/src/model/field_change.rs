use crate::schema::ColumnType;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Text form of a field value as rendered and compared for emptiness
///
/// `null` and `false` render as the empty string, `true` as `"1"`.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => String::new(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_empty_value(value: &Value) -> bool {
    value_text(value).is_empty()
}

/// Classification of a single field change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeType {
    Addition,
    Removal,
    Update,
    BooleanSet,
    BooleanUnset,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Addition => "VALUE.ADDITION",
            ChangeType::Removal => "VALUE.REMOVAL",
            ChangeType::Update => "VALUE.UPDATE",
            ChangeType::BooleanSet => "BOOLEAN.SET",
            ChangeType::BooleanUnset => "BOOLEAN.UNSET",
        }
    }
}

/// Old and new value of one field in an update
///
/// `old_value`/`new_value` are the display forms (temporal columns already
/// formatted); `raw_old`/`raw_new` are the values as the record held them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    #[serde(default)]
    pub old_value: Value,
    #[serde(default)]
    pub new_value: Value,
    #[serde(default)]
    pub raw_old: Value,
    #[serde(default)]
    pub raw_new: Value,
    #[serde(default)]
    pub column_type: ColumnType,
    #[serde(default)]
    pub foreign_key: bool,
}

impl FieldChange {
    /// A change whose raw values equal its display values
    pub fn new(field: impl Into<String>, old_value: impl Into<Value>, new_value: impl Into<Value>) -> Self {
        let old_value = old_value.into();
        let new_value = new_value.into();
        Self {
            field: field.into(),
            raw_old: old_value.clone(),
            raw_new: new_value.clone(),
            old_value,
            new_value,
            column_type: ColumnType::Other,
            foreign_key: false,
        }
    }

    pub fn with_raw(mut self, raw_old: Value, raw_new: Value) -> Self {
        self.raw_old = raw_old;
        self.raw_new = raw_new;
        self
    }

    pub fn with_column_type(mut self, column_type: ColumnType) -> Self {
        self.column_type = column_type;
        self
    }

    pub fn with_foreign_key(mut self, foreign_key: bool) -> Self {
        self.foreign_key = foreign_key;
        self
    }

    /// Derived from the values and column type, never stored
    pub fn change_type(&self) -> ChangeType {
        let boolean = self.column_type == ColumnType::Boolean;
        if is_empty_value(&self.old_value) {
            if boolean {
                ChangeType::BooleanSet
            } else {
                ChangeType::Addition
            }
        } else if is_empty_value(&self.new_value) {
            if boolean {
                ChangeType::BooleanUnset
            } else {
                ChangeType::Removal
            }
        } else {
            ChangeType::Update
        }
    }
}
