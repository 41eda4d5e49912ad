use serde::{Deserialize, Serialize};

/// Kind of operation a log entry records
///
/// Persisted as its integer code. Codes are stable and must never be
/// renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Insertion,
    Update,
    Deletion,
    CustomMessage,
}

impl OperationKind {
    pub const ALL: [OperationKind; 4] = [
        OperationKind::Insertion,
        OperationKind::Update,
        OperationKind::Deletion,
        OperationKind::CustomMessage,
    ];

    pub fn code(&self) -> i64 {
        match self {
            OperationKind::Insertion => 1,
            OperationKind::Update => 2,
            OperationKind::Deletion => 3,
            OperationKind::CustomMessage => 4,
        }
    }

    /// `None` for codes written by something newer than this build
    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    pub fn label(&self) -> &'static str {
        match self {
            OperationKind::Insertion => "Insertion",
            OperationKind::Update => "Update",
            OperationKind::Deletion => "Deletion",
            OperationKind::CustomMessage => "Custom message",
        }
    }

    /// Parse a user supplied name (`insertion`, `update`, `deletion`,
    /// `custom_message`) or numeric code
    pub fn parse(input: &str) -> Option<Self> {
        let normalized = input.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "insertion" | "insert" => Some(OperationKind::Insertion),
            "update" => Some(OperationKind::Update),
            "deletion" | "delete" => Some(OperationKind::Deletion),
            "custom_message" | "message" => Some(OperationKind::CustomMessage),
            other => other.parse::<i64>().ok().and_then(Self::from_code),
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(OperationKind::Insertion.code(), 1);
        assert_eq!(OperationKind::Update.code(), 2);
        assert_eq!(OperationKind::Deletion.code(), 3);
        assert_eq!(OperationKind::CustomMessage.code(), 4);
    }

    #[test]
    fn test_from_code() {
        for kind in OperationKind::ALL {
            assert_eq!(OperationKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(OperationKind::from_code(0), None);
        assert_eq!(OperationKind::from_code(99), None);
    }

    #[test]
    fn test_parse_names_and_codes() {
        assert_eq!(OperationKind::parse("Update"), Some(OperationKind::Update));
        assert_eq!(
            OperationKind::parse("custom-message"),
            Some(OperationKind::CustomMessage)
        );
        assert_eq!(OperationKind::parse("3"), Some(OperationKind::Deletion));
        assert_eq!(OperationKind::parse("rename"), None);
    }

    #[test]
    fn test_label() {
        assert_eq!(OperationKind::CustomMessage.to_string(), "Custom message");
    }
}
