//! # Engine Configuration
//!
//! [`EngineBuilder`] collects fonts, the text pipeline and pagination
//! options; [`Engine`] runs documents through them.
//!
//! ```no_run
//! use pagina::config::{EngineBuilder, ShadowDirection};
//! use pagina::text::bidi::UnicodeBidiSplitter;
//!
//! let mut engine = EngineBuilder::new()
//!     .use_font("fonts/NotoNaskhArabic.ttf", "Noto Naskh Arabic")
//!     .use_bidi_splitter(UnicodeBidiSplitter)
//!     .max_shadow_pages(2)
//!     .shadow_direction(ShadowDirection::Rtl)
//!     .build()?;
//! # let document = pagina::model::Document::default();
//! let pagination = engine.paginate(&document)?;
//! # Ok::<(), pagina::PaginaError>(())
//! ```

use std::path::PathBuf;

use base64::Engine as _;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::PaginaError;
use crate::font::{FontContext, FontMetrics, FontRegistry};
use crate::layout::{self, Pagination};
use crate::model::{Document, FontEntry};
use crate::style::{Direction, ResolvedStyle};
use crate::text::bidi::{BidiReorderer, BidiSplitter, LevelReorderer, NoBidiSplitter};
use crate::text::breaker::{TextBreaker, UnicodeLineBreaker};
use crate::text::TextLayout;

/// Which way shadow pages extend from their origin page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShadowDirection {
    /// Overflow to the right of the page.
    #[default]
    Ltr,
    /// Overflow to the left of the page.
    Rtl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationOptions {
    /// Shadow pages per primary page at most. Overflow beyond is cut off.
    pub max_shadow_pages: u32,
    pub shadow_direction: ShadowDirection,
    /// Base direction when the document does not set one.
    pub default_direction: Direction,
}

impl Default for PaginationOptions {
    fn default() -> Self {
        Self {
            max_shadow_pages: 1,
            shadow_direction: ShadowDirection::Ltr,
            default_direction: Direction::Ltr,
        }
    }
}

enum FontSource {
    File { path: PathBuf, family: String },
    Data { family: String, data: Vec<u8> },
    Metrics { family: String, metrics: FontMetrics },
}

/// Builder for [`Engine`]. For every option, a later call overrides an
/// earlier one; fonts registered under the same family replace each other
/// in call order.
#[derive(Default)]
pub struct EngineBuilder {
    fonts: Vec<FontSource>,
    breaker: Option<Box<dyn TextBreaker + Send>>,
    splitter: Option<Box<dyn BidiSplitter + Send>>,
    reorderer: Option<Box<dyn BidiReorderer + Send>>,
    options: PaginationOptions,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a TrueType/OpenType file. Read when the engine is built.
    pub fn use_font(mut self, path: impl Into<PathBuf>, family: &str) -> Self {
        self.fonts.push(FontSource::File {
            path: path.into(),
            family: family.to_string(),
        });
        self
    }

    /// Register TrueType/OpenType bytes.
    pub fn use_font_data(mut self, family: &str, data: Vec<u8>) -> Self {
        self.fonts.push(FontSource::Data {
            family: family.to_string(),
            data,
        });
        self
    }

    /// Register a synthetic fixed-advance font.
    pub fn use_font_metrics(mut self, family: &str, metrics: FontMetrics) -> Self {
        self.fonts.push(FontSource::Metrics {
            family: family.to_string(),
            metrics,
        });
        self
    }

    pub fn use_line_breaker(mut self, breaker: impl TextBreaker + Send + 'static) -> Self {
        self.breaker = Some(Box::new(breaker));
        self
    }

    pub fn use_bidi_splitter(mut self, splitter: impl BidiSplitter + Send + 'static) -> Self {
        self.splitter = Some(Box::new(splitter));
        self
    }

    pub fn use_bidi_reorderer(mut self, reorderer: impl BidiReorderer + Send + 'static) -> Self {
        self.reorderer = Some(Box::new(reorderer));
        self
    }

    pub fn default_text_direction(mut self, direction: Direction) -> Self {
        self.options.default_direction = direction;
        self
    }

    pub fn max_shadow_pages(mut self, pages: u32) -> Self {
        self.options.max_shadow_pages = pages;
        self
    }

    pub fn shadow_direction(mut self, direction: ShadowDirection) -> Self {
        self.options.shadow_direction = direction;
        self
    }

    /// Load fonts and assemble the engine.
    pub fn build(self) -> Result<Engine, PaginaError> {
        let mut registry = FontRegistry::new();
        for source in self.fonts {
            match source {
                FontSource::File { path, family } => {
                    let data = std::fs::read(&path).map_err(|source| PaginaError::FontIo {
                        path: path.clone(),
                        source,
                    })?;
                    registry.register(&family, data)?;
                }
                FontSource::Data { family, data } => registry.register(&family, data)?,
                FontSource::Metrics { family, metrics } => {
                    registry.register_metrics(&family, metrics)
                }
            }
        }

        let text = TextLayout::new(
            self.breaker
                .unwrap_or_else(|| Box::new(UnicodeLineBreaker::default())),
            self.splitter.unwrap_or_else(|| Box::new(NoBidiSplitter)),
            self.reorderer.unwrap_or_else(|| Box::new(LevelReorderer)),
        );

        Ok(Engine {
            fonts: FontContext::with_registry(registry),
            text,
            options: self.options,
        })
    }
}

/// A configured pagination engine.
pub struct Engine {
    fonts: FontContext,
    text: TextLayout,
    options: PaginationOptions,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            fonts: FontContext::new(),
            text: TextLayout::default(),
            options: PaginationOptions::default(),
        }
    }
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn options(&self) -> &PaginationOptions {
        &self.options
    }

    pub fn fonts(&self) -> &FontContext {
        &self.fonts
    }

    /// Paginate a document. Fonts embedded in the document are registered
    /// first and stay registered for later documents.
    pub fn paginate(&mut self, document: &Document) -> Result<Pagination, PaginaError> {
        for entry in &document.fonts {
            let data = decode_font_entry(entry)?;
            self.fonts.registry_mut().register(&entry.family, data)?;
        }

        let direction = document.direction.unwrap_or(self.options.default_direction);
        let root = ResolvedStyle::root(direction);
        let pagination = layout::paginate_document(
            document,
            &root,
            &mut self.text,
            &self.fonts,
            &self.options,
        );
        debug!(
            "{} page(s), {} shadow, {} diagnostic(s)",
            pagination.pages.len(),
            pagination.shadow_pages().count(),
            pagination.diagnostics.len()
        );
        Ok(pagination)
    }

    /// Paginate a document given as JSON.
    pub fn paginate_json(&mut self, json: &str) -> Result<Pagination, PaginaError> {
        let document: Document = serde_json::from_str(json)?;
        self.paginate(&document)
    }
}

/// Decode a base64 font entry, with or without a data-URI prefix.
fn decode_font_entry(entry: &FontEntry) -> Result<Vec<u8>, PaginaError> {
    let payload = if entry.src.starts_with("data:") {
        let comma = entry.src.find(',').ok_or_else(|| PaginaError::FontData {
            family: entry.family.clone(),
            reason: "data URI without a comma".to_string(),
        })?;
        &entry.src[comma + 1..]
    } else {
        entry.src.as_str()
    };
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| PaginaError::FontData {
            family: entry.family.clone(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let engine = EngineBuilder::new().build().unwrap();
        assert_eq!(engine.options().max_shadow_pages, 1);
        assert_eq!(engine.options().shadow_direction, ShadowDirection::Ltr);
        assert_eq!(engine.options().default_direction, Direction::Ltr);
    }

    #[test]
    fn later_option_wins() {
        let engine = EngineBuilder::new()
            .max_shadow_pages(3)
            .max_shadow_pages(2)
            .default_text_direction(Direction::Rtl)
            .build()
            .unwrap();
        assert_eq!(engine.options().max_shadow_pages, 2);
        assert_eq!(engine.options().default_direction, Direction::Rtl);
    }

    #[test]
    fn missing_font_file_is_io_error() {
        let err = EngineBuilder::new()
            .use_font("/nonexistent/font.ttf", "Nope")
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, PaginaError::FontIo { .. }));
        assert!(err.to_string().contains("/nonexistent/font.ttf"));
    }

    #[test]
    fn later_font_replaces_earlier() {
        let engine = EngineBuilder::new()
            .use_font_metrics("A", FontMetrics::fixed(0.5))
            .use_font_metrics("A", FontMetrics::fixed(1.0))
            .build()
            .unwrap();
        let chain = vec!["A".to_string()];
        assert_eq!(engine.fonts().resolve('x', &chain, 10.0).advance, 10.0);
    }

    #[test]
    fn bad_embedded_font_is_data_error() {
        let entry = FontEntry {
            family: "Broken".into(),
            src: "data:font/ttf;base64,!!!".into(),
        };
        assert!(matches!(
            decode_font_entry(&entry),
            Err(PaginaError::FontData { .. })
        ));
    }

    #[test]
    fn embedded_font_must_parse() {
        let mut engine = Engine::default();
        let doc = Document {
            fonts: vec![FontEntry {
                family: "Junk".into(),
                src: "AAECAw==".into(),
            }],
            ..Default::default()
        };
        assert!(matches!(
            engine.paginate(&doc),
            Err(PaginaError::FontParse { .. })
        ));
    }
}
