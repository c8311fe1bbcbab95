//! Structured error types for the pagina engine.
//!
//! Only setup can fail: parsing the document and loading fonts. Everything
//! that happens during pagination recovers locally (exhausted breakers,
//! missing glyphs, empty shadow pages) or is reported as a [`Diagnostic`].

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// The unified error type returned by all public pagina API functions.
#[derive(Debug, Error)]
pub enum PaginaError {
    /// JSON input failed to parse as a valid document.
    #[error("Failed to parse document: {source}{}", hint_suffix(.hint))]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },
    /// A font file could not be read.
    #[error("Font error: cannot read {}: {source}", .path.display())]
    FontIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Font bytes were read but are not a usable TrueType/OpenType face.
    #[error("Font error: '{family}' is not a parseable TrueType/OpenType font")]
    FontParse { family: String },
    /// Embedded font data in the document could not be decoded.
    #[error("Font error: embedded data for '{family}' is invalid: {reason}")]
    FontData { family: String, reason: String },
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {hint}")
    }
}

impl From<serde_json::Error> for PaginaError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the document schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        PaginaError::Parse { source: e, hint }
    }
}

/// A CSS feature the document asks for that the engine does not implement.
///
/// The property is ignored (treated as its initial value) and layout goes on,
/// but the gap is reported so callers can detect it instead of receiving a
/// silently different layout.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "camelCase")]
#[error("unsupported {property}: {value} (ignored)")]
pub struct Unsupported {
    pub property: &'static str,
    pub value: &'static str,
}

/// A non-fatal finding collected while paginating.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    /// The `id` of the node the finding is about, when it has one.
    pub node: Option<String>,
    pub unsupported: Unsupported,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_carries_hint() {
        let err: PaginaError = serde_json::from_str::<serde_json::Value>("{\"a\": 1,}")
            .unwrap_err()
            .into();
        let msg = err.to_string();
        assert!(msg.starts_with("Failed to parse document"));
        assert!(msg.contains("Hint: Check for trailing commas"));
    }

    #[test]
    fn unsupported_display() {
        let u = Unsupported {
            property: "word-break",
            value: "break-all",
        };
        assert_eq!(u.to_string(), "unsupported word-break: break-all (ignored)");
    }
}
