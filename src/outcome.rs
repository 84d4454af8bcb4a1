//! Success types: what a finished invocation hands back.
//!
//! A [`ConversionOutcome`] only exists on success — failures travel as
//! [`crate::error::PipelineError`]. The payload is exactly what the engine
//! produced in the requested shape, untouched; metadata records what was
//! converted and how long each stage took.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::pipeline::detect::DocumentKind;
use crate::request::ResponseShape;

/// The converted document, in the shape the request asked for.
///
/// Serializes untagged: markdown becomes a JSON string, structured output
/// becomes a bare JSON object. Handler bodies rely on this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Markdown(String),
    Structured(Map<String, Value>),
}

impl Payload {
    pub fn shape(&self) -> ResponseShape {
        match self {
            Payload::Markdown(_) => ResponseShape::Markdown,
            Payload::Structured(_) => ResponseShape::Structured,
        }
    }

    pub fn as_markdown(&self) -> Option<&str> {
        match self {
            Payload::Markdown(text) => Some(text),
            Payload::Structured(_) => None,
        }
    }

    pub fn as_structured(&self) -> Option<&Map<String, Value>> {
        match self {
            Payload::Markdown(_) => None,
            Payload::Structured(map) => Some(map),
        }
    }

    /// Byte form for delivery to object storage.
    ///
    /// Markdown uploads as UTF-8 text, structured output as pretty JSON.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        match self {
            Payload::Markdown(text) => Ok(text.as_bytes().to_vec()),
            Payload::Structured(map) => serde_json::to_vec_pretty(map),
        }
    }
}

/// Wall-clock milliseconds per pipeline stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTimings {
    pub resolve_ms: u64,
    pub detect_ms: u64,
    pub convert_ms: u64,
    pub deliver_ms: u64,
    pub total_ms: u64,
}

/// What was converted, plus per-stage timings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeMetadata {
    /// Detected document kind.
    pub kind: DocumentKind,
    /// Size of the source document in bytes.
    pub source_bytes: u64,
    pub timings: StageTimings,
}

/// A successful invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutcome {
    pub payload: Payload,
    /// Derived object key when delivery wrote back to the store.
    pub stored_at: Option<String>,
    pub metadata: OutcomeMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_payload_serializes_as_a_bare_string() {
        let p = Payload::Markdown("# Title".into());
        assert_eq!(serde_json::to_string(&p).unwrap(), "\"# Title\"");
    }

    #[test]
    fn structured_payload_serializes_as_a_bare_object() {
        let mut map = Map::new();
        map.insert("pages".into(), Value::from(3));
        let p = Payload::Structured(map);
        assert_eq!(serde_json::to_string(&p).unwrap(), r#"{"pages":3}"#);
    }

    #[test]
    fn shape_matches_the_variant() {
        assert_eq!(
            Payload::Markdown(String::new()).shape(),
            ResponseShape::Markdown
        );
        assert_eq!(
            Payload::Structured(Map::new()).shape(),
            ResponseShape::Structured
        );
        assert!(Payload::Markdown("x".into()).as_structured().is_none());
    }
}
