//! # Font Management
//!
//! A registry of named fonts and per-character fallback resolution.
//!
//! Two kinds of font are supported:
//! - Real TrueType/OpenType faces, parsed with ttf-parser for glyph coverage
//!   and advance widths.
//! - Synthetic fixed-advance faces with an explicit coverage set. The engine
//!   registers a `monospace` one covering everything, so layout works without
//!   any font files; tests use them to make widths exact.

use std::collections::HashMap;
use std::ops::RangeInclusive;

use log::debug;

use crate::error::PaginaError;

/// Parsed metrics from a TrueType/OpenType font via ttf-parser.
#[derive(Debug, Clone)]
pub struct CustomFontMetrics {
    pub units_per_em: u16,
    pub advance_widths: HashMap<char, u16>,
    pub default_advance: u16,
}

impl CustomFontMetrics {
    /// Parse metrics from font data using ttf-parser.
    pub fn from_font_data(data: &[u8]) -> Option<Self> {
        let face = ttf_parser::Face::parse(data, 0).ok()?;
        let units_per_em = face.units_per_em();

        let mut advance_widths = HashMap::new();
        let mut default_advance = 0u16;

        // Sample the BMP to build the coverage and width map
        for code in 32u32..=0xFFFF {
            if let Some(ch) = char::from_u32(code) {
                if let Some(glyph_id) = face.glyph_index(ch) {
                    let advance = face.glyph_hor_advance(glyph_id).unwrap_or(0);
                    advance_widths.insert(ch, advance);
                    if ch == ' ' {
                        default_advance = advance;
                    }
                }
            }
        }

        if default_advance == 0 {
            default_advance = units_per_em / 2;
        }

        Some(CustomFontMetrics {
            units_per_em,
            advance_widths,
            default_advance,
        })
    }

    pub fn has_glyph(&self, ch: char) -> bool {
        self.advance_widths.contains_key(&ch)
    }

    /// Advance width of a character in points. Missing glyphs use the
    /// default advance (the width of `.notdef` is close enough for layout).
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        let w = self
            .advance_widths
            .get(&ch)
            .copied()
            .unwrap_or(self.default_advance);
        (w as f64 / self.units_per_em as f64) * font_size
    }
}

/// Metrics of a synthetic font: every covered glyph has the same advance.
#[derive(Debug, Clone)]
pub struct FontMetrics {
    /// Advance as a fraction of the font size.
    pub advance_em: f64,
    /// Covered characters. `None` covers everything.
    pub coverage: Option<Vec<RangeInclusive<char>>>,
}

impl FontMetrics {
    /// A fixed-advance font covering every character.
    pub fn fixed(advance_em: f64) -> Self {
        Self {
            advance_em,
            coverage: None,
        }
    }

    /// A fixed-advance font covering only the given ranges.
    pub fn fixed_with_coverage(advance_em: f64, coverage: Vec<RangeInclusive<char>>) -> Self {
        Self {
            advance_em,
            coverage: Some(coverage),
        }
    }

    pub fn has_glyph(&self, ch: char) -> bool {
        match &self.coverage {
            None => true,
            Some(ranges) => ranges.iter().any(|r| r.contains(&ch)),
        }
    }
}

#[derive(Debug, Clone)]
pub enum FontData {
    /// A synthetic fixed-advance face.
    Synthetic(FontMetrics),
    /// A TrueType/OpenType face.
    Custom {
        data: Vec<u8>,
        metrics: CustomFontMetrics,
    },
}

impl FontData {
    pub fn has_glyph(&self, ch: char) -> bool {
        match self {
            FontData::Synthetic(m) => m.has_glyph(ch),
            FontData::Custom { metrics, .. } => metrics.has_glyph(ch),
        }
    }

    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        match self {
            FontData::Synthetic(m) => m.advance_em * font_size,
            FontData::Custom { metrics, .. } => metrics.char_width(ch, font_size),
        }
    }
}

/// A font registry that maps family names to font data.
pub struct FontRegistry {
    fonts: HashMap<String, FontData>,
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FontRegistry {
    pub fn new() -> Self {
        let mut fonts = HashMap::new();
        fonts.insert(
            crate::style::DEFAULT_FONT_FAMILY.to_string(),
            FontData::Synthetic(FontMetrics::fixed(0.6)),
        );
        Self { fonts }
    }

    /// Register TrueType/OpenType bytes under `family`.
    pub fn register(&mut self, family: &str, data: Vec<u8>) -> Result<(), PaginaError> {
        let metrics =
            CustomFontMetrics::from_font_data(&data).ok_or_else(|| PaginaError::FontParse {
                family: family.to_string(),
            })?;
        debug!(
            "registered font '{}' ({} glyphs)",
            family,
            metrics.advance_widths.len()
        );
        self.fonts
            .insert(family.to_string(), FontData::Custom { data, metrics });
        Ok(())
    }

    /// Register a synthetic font under `family`. Replaces any earlier font.
    pub fn register_metrics(&mut self, family: &str, metrics: FontMetrics) {
        self.fonts
            .insert(family.to_string(), FontData::Synthetic(metrics));
    }

    pub fn get(&self, family: &str) -> Option<&FontData> {
        self.fonts.get(family)
    }

    /// The registered family name and its font.
    fn entry(&self, family: &str) -> Option<(&str, &FontData)> {
        self.fonts
            .get_key_value(family)
            .map(|(name, font)| (name.as_str(), font))
    }
}

/// The outcome of resolving one character against a fallback chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedGlyph<'a> {
    pub family: &'a str,
    pub advance: f64,
    /// No font in the chain has the glyph; a missing-glyph box is drawn.
    pub missing: bool,
}

/// Shared font context used by the line builder.
pub struct FontContext {
    registry: FontRegistry,
}

impl Default for FontContext {
    fn default() -> Self {
        Self::new()
    }
}

impl FontContext {
    pub fn new() -> Self {
        Self {
            registry: FontRegistry::new(),
        }
    }

    pub fn with_registry(registry: FontRegistry) -> Self {
        Self { registry }
    }

    /// Resolve `ch` against a fallback chain: the first registered font that
    /// has the glyph wins. If none has it, the last registered font of the
    /// chain is used and the glyph is flagged missing. Unknown family names
    /// are skipped; a chain with no registered font falls back to monospace.
    pub fn resolve(&self, ch: char, chain: &[String], font_size: f64) -> ResolvedGlyph<'_> {
        let mut last = None;
        for family in chain {
            if let Some((name, font)) = self.registry.entry(family) {
                if font.has_glyph(ch) {
                    return ResolvedGlyph {
                        family: name,
                        advance: font.char_width(ch, font_size),
                        missing: false,
                    };
                }
                last = Some((name, font));
            }
        }
        match last {
            Some((family, font)) => ResolvedGlyph {
                family,
                advance: font.char_width(ch, font_size),
                missing: true,
            },
            None => {
                let family = crate::style::DEFAULT_FONT_FAMILY;
                let font = self.registry.get(family);
                ResolvedGlyph {
                    family,
                    advance: font.map(|f| f.char_width(ch, font_size)).unwrap_or(0.0),
                    missing: font.map(|f| !f.has_glyph(ch)).unwrap_or(true),
                }
            }
        }
    }

    /// Access the underlying font registry mutably.
    pub fn registry_mut(&mut self) -> &mut FontRegistry {
        &mut self.registry
    }
}
