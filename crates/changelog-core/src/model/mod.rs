pub mod change_set;
pub mod field_change;
pub mod log_entry;
pub mod operation;
pub mod payload;
pub mod primary_key;
pub mod record;

pub use change_set::ChangeSet;
pub use field_change::{value_text, ChangeType, FieldChange};
pub use log_entry::LogEntry;
pub use operation::OperationKind;
pub use payload::{ChangePayload, PAYLOAD_SCHEMA_VERSION};
pub use primary_key::{NormalizedPk, PrimaryKey};
pub use record::{InstanceId, Record};
