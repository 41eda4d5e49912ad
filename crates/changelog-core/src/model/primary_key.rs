//! Primary keys and their normalized (single string) form
//!
//! Log entries reference their target by class name plus normalized key.
//! Composite keys are joined with `-`, so components must not contain it.

#![allow(clippy::result_large_err)]

use crate::errors::{ChangeLogError, Result};
use serde::{Deserialize, Serialize};

pub const PK_SEPARATOR: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimaryKey {
    Single(String),
    Composite(Vec<String>),
}

impl PrimaryKey {
    pub fn single(value: impl Into<String>) -> Self {
        PrimaryKey::Single(value.into())
    }

    pub fn composite<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PrimaryKey::Composite(parts.into_iter().map(Into::into).collect())
    }

    /// True when the key has more than one component
    pub fn is_composite(&self) -> bool {
        matches!(self, PrimaryKey::Composite(parts) if parts.len() > 1)
    }

    pub fn parts(&self) -> Vec<&str> {
        match self {
            PrimaryKey::Single(value) => vec![value.as_str()],
            PrimaryKey::Composite(parts) => parts.iter().map(String::as_str).collect(),
        }
    }

    /// Collapse the key into its stored string form
    ///
    /// A one-element composite normalizes like a single key.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if a composite component contains the
    /// separator, since the result could not be split back.
    pub fn normalize(&self) -> Result<NormalizedPk> {
        match self {
            PrimaryKey::Single(value) => Ok(NormalizedPk(value.clone())),
            PrimaryKey::Composite(parts) if parts.len() == 1 => Ok(NormalizedPk(parts[0].clone())),
            PrimaryKey::Composite(parts) => {
                if let Some(bad) = parts.iter().find(|p| p.contains(PK_SEPARATOR)) {
                    return Err(ChangeLogError::InvalidInput {
                        reason: format!(
                            "composite key component '{}' contains '{}'",
                            bad, PK_SEPARATOR
                        ),
                    });
                }
                Ok(NormalizedPk(parts.join(PK_SEPARATOR)))
            }
        }
    }

    /// Rebuild a key from its normalized form using the table's key arity
    ///
    /// Single column keys are never split, so values containing `-` (UUIDs)
    /// round-trip.
    pub fn from_normalized(pk: &NormalizedPk, arity: usize) -> Self {
        if arity <= 1 {
            PrimaryKey::Single(pk.0.clone())
        } else {
            PrimaryKey::Composite(pk.0.split(PK_SEPARATOR).map(str::to_string).collect())
        }
    }
}

impl std::fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrimaryKey::Single(value) => f.write_str(value),
            PrimaryKey::Composite(parts) => write!(f, "[{}]", parts.join(", ")),
        }
    }
}

/// Normalized primary key as stored on a log entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedPk(String);

impl NormalizedPk {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split back into components without schema knowledge
    ///
    /// A value containing `-` is treated as composite. Prefer
    /// [`PrimaryKey::from_normalized`] when the table arity is known.
    pub fn denormalize(&self) -> PrimaryKey {
        if self.0.contains(PK_SEPARATOR) {
            PrimaryKey::Composite(self.0.split(PK_SEPARATOR).map(str::to_string).collect())
        } else {
            PrimaryKey::Single(self.0.clone())
        }
    }
}

impl std::fmt::Display for NormalizedPk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NormalizedPk {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NormalizedPk {
    fn from(value: String) -> Self {
        Self(value)
    }
}
