//! Request correlation
//!
//! A request is the unit of work a host hands to the change log: one web
//! request, one CLI invocation, one batch job. Its id ties the log lines of
//! that unit together and its actor is the user recorded on the entries it
//! produces.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Time-ordered request identifier (UUIDv7)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for RequestId {
    type Err = uuid::Error;

    /// Accept an id handed over by an upstream caller
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Who is acting, and under which request
///
/// Without an actor the engine falls back to its configured default user
/// name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub request_id: RequestId,
    pub actor: Option<String>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue a request started elsewhere
    pub fn for_request(request_id: RequestId) -> Self {
        Self {
            request_id,
            actor: None,
        }
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    /// The actor, ignoring blank names
    pub fn actor(&self) -> Option<&str> {
        self.actor.as_deref().filter(|a| !a.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_ids_are_unique() {
        assert_ne!(RequestId::new(), RequestId::new());
    }

    #[test]
    fn test_request_id_parses_its_display_form() {
        let id = RequestId::new();
        let parsed: RequestId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<RequestId>().is_err());
    }

    #[test]
    fn test_request_id_serializes_as_plain_string() {
        let id = RequestId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
    }

    #[test]
    fn test_blank_actor_is_no_actor() {
        assert_eq!(RequestContext::new().actor(), None);
        assert_eq!(RequestContext::new().with_actor("  ").actor(), None);
        assert_eq!(
            RequestContext::new().with_actor("alice").actor(),
            Some("alice")
        );
    }

    #[test]
    fn test_continued_request_keeps_its_id() {
        let id = RequestId::new();
        let ctx = RequestContext::for_request(id).with_actor("batch");
        assert_eq!(ctx.request_id, id);
    }
}
