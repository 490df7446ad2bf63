//! Error types for the library layer.

use std::fmt;

/// Errors produced by the library layer, wrapping provider client errors
/// and adding document, cache, and serialization failures.
#[derive(Debug)]
pub enum ClassifyError {
    /// An error from the underlying provider client.
    Api(morningstar_api::Error),
    /// The portfolio document could not be read or written.
    Io(std::io::Error),
    /// The portfolio document is not well-formed XML.
    Xml(quick_xml::Error),
    /// JSON serialization or deserialization failed.
    Serialization(serde_json::Error),
    /// The document or a provider payload had an unexpected shape.
    Document(String),
}

impl fmt::Display for ClassifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Api(e) => write!(f, "API error: {}", e),
            Self::Io(e) => write!(f, "I/O error: {}", e),
            Self::Xml(e) => write!(f, "XML error: {}", e),
            Self::Serialization(e) => write!(f, "Serialization error: {}", e),
            Self::Document(msg) => write!(f, "Document error: {}", msg),
        }
    }
}

impl std::error::Error for ClassifyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Api(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::Xml(e) => Some(e),
            Self::Serialization(e) => Some(e),
            _ => None,
        }
    }
}

impl From<morningstar_api::Error> for ClassifyError {
    fn from(e: morningstar_api::Error) -> Self {
        Self::Api(e)
    }
}

impl From<std::io::Error> for ClassifyError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<quick_xml::Error> for ClassifyError {
    fn from(e: quick_xml::Error) -> Self {
        Self::Xml(e)
    }
}

impl From<serde_json::Error> for ClassifyError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e)
    }
}
