//! Observable events
//!
//! Every log line the engine writes names one of these.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Engine configuration loaded
    ConfigLoaded,
    /// Configuration rejected (FATAL)
    ConfigInvalid,
    /// One schema definition compiled and registered
    SchemaCompiled,
    /// A schema directory was scanned
    SchemasLoaded,
    /// A schema definition failed to compile
    SchemaRejected,
    /// A document passed validation
    DocumentAccepted,
    /// A document failed validation
    DocumentRejected,
    /// A CLI command finished
    CommandComplete,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::ConfigInvalid => "CONFIG_INVALID",
            Event::SchemaCompiled => "SCHEMA_COMPILED",
            Event::SchemasLoaded => "SCHEMAS_LOADED",
            Event::SchemaRejected => "SCHEMA_REJECTED",
            Event::DocumentAccepted => "DOCUMENT_ACCEPTED",
            Event::DocumentRejected => "DOCUMENT_REJECTED",
            Event::CommandComplete => "COMMAND_COMPLETE",
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::ConfigInvalid)
    }

    /// Rejections are expected outcomes, logged one level up from routine events.
    pub fn is_warning(&self) -> bool {
        matches!(self, Event::DocumentRejected | Event::SchemaRejected)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        let events = [
            Event::ConfigLoaded,
            Event::ConfigInvalid,
            Event::SchemaCompiled,
            Event::SchemasLoaded,
            Event::SchemaRejected,
            Event::DocumentAccepted,
            Event::DocumentRejected,
            Event::CommandComplete,
        ];
        for event in events {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_uppercase() || c == '_'));
        }
        assert_eq!(Event::SchemaCompiled.to_string(), "SCHEMA_COMPILED");
    }

    #[test]
    fn test_event_levels() {
        assert!(Event::ConfigInvalid.is_fatal());
        assert!(!Event::DocumentRejected.is_fatal());
        assert!(Event::DocumentRejected.is_warning());
        assert!(!Event::DocumentAccepted.is_warning());
    }
}
