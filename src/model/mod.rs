//! # Document Model
//!
//! The input representation: a positioned box tree produced by an upstream
//! layout pass. Every node carries its border-box geometry relative to its
//! parent's origin; top-level nodes are relative to the content-area origin
//! of one continuous flow canvas. Splitting that canvas into pages, and
//! deciding what happens to content that does not fit the page, is this
//! crate's job.
//!
//! Text nodes only carry their box; lines are built here, so a text box may
//! end up taller or wider than the bounds it was given. That excess is
//! overflow like any other.

use crate::geometry::Rect;
use crate::style::{Direction, Style};
use serde::{Deserialize, Serialize};

/// A complete document ready for pagination.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Top-level nodes in flow order.
    pub children: Vec<Node>,

    #[serde(default)]
    pub page: PageConfig,

    /// Base paragraph direction. Overrides the engine's configured default.
    #[serde(default)]
    pub direction: Option<Direction>,

    /// Custom fonts to register before pagination.
    #[serde(default)]
    pub fonts: Vec<FontEntry>,
}

/// A custom font to register with the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontEntry {
    /// Font family name (e.g. "Karla", "Noto Naskh Arabic").
    pub family: String,
    /// Base64-encoded font data, or a data URI (e.g. "data:font/ttf;base64,...").
    pub src: String,
}

/// Configuration for a page: size and margins.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageConfig {
    /// Page size. Defaults to A4.
    #[serde(default)]
    pub size: PageSize,

    /// Page margins in points (1/72 inch).
    #[serde(default = "default_margin")]
    pub margin: Edges,
}

fn default_margin() -> Edges {
    Edges::uniform(54.0)
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            size: PageSize::A4,
            margin: default_margin(),
        }
    }
}

impl PageConfig {
    /// The page content area in page coordinates.
    pub fn content_rect(&self) -> Rect {
        let (w, h) = self.size.dimensions();
        Rect::new(
            self.margin.left,
            self.margin.top,
            (w - self.margin.horizontal()).max(0.0),
            (h - self.margin.vertical()).max(0.0),
        )
    }
}

/// Standard page sizes in points.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    A5,
    Letter,
    Legal,
    Custom {
        width: f64,
        height: f64,
    },
}

impl PageSize {
    /// Returns (width, height) in points.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::A5 => (419.53, 595.28),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}

/// Edge values (top, right, bottom, left).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Edges {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Edges {
    pub fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// A node in the positioned box tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub kind: NodeKind,

    #[serde(default)]
    pub style: Style,

    /// Border box relative to the parent's origin.
    #[serde(default)]
    pub bounds: Rect,

    #[serde(default)]
    pub children: Vec<Node>,

    /// Optional identifier, echoed in placed boxes and diagnostics.
    #[serde(default)]
    pub id: Option<String>,
}

impl Node {
    pub fn new(kind: NodeKind, bounds: Rect) -> Self {
        Self {
            kind,
            style: Style::default(),
            bounds,
            children: Vec::new(),
            id: None,
        }
    }
}

/// The different kinds of nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NodeKind {
    /// A block container. Breakable across pages between its children.
    Block,
    /// An atomic inline-level box. Never split across pages.
    InlineBlock,
    /// A floated box. Never split across pages.
    Float,
    /// A replaced element; paints its whole box.
    Image,
    /// A paragraph. `content` is used when `spans` is empty.
    Text {
        #[serde(default)]
        content: String,
        #[serde(default)]
        spans: Vec<TextSpan>,
    },
    /// A table. Paginated tables repeat header and footer rows on every page.
    Table {
        #[serde(default)]
        paginated: bool,
    },
    TableCaption,
    TableHeader,
    TableFooter,
    TableRow,
    /// A multi-column container, filled one column at a time (unbalanced).
    Columns {
        count: u32,
        #[serde(default)]
        gap: f64,
    },
    /// Forced break to the next column inside `Columns`.
    ColumnBreak,
    /// Forced break to the next page.
    PageBreak,
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Block => "Block",
            NodeKind::InlineBlock => "InlineBlock",
            NodeKind::Float => "Float",
            NodeKind::Image => "Image",
            NodeKind::Text { .. } => "Text",
            NodeKind::Table { .. } => "Table",
            NodeKind::TableCaption => "TableCaption",
            NodeKind::TableHeader => "TableHeader",
            NodeKind::TableFooter => "TableFooter",
            NodeKind::TableRow => "TableRow",
            NodeKind::Columns { .. } => "Columns",
            NodeKind::ColumnBreak => "ColumnBreak",
            NodeKind::PageBreak => "PageBreak",
        }
    }
}

/// An inline span inside a paragraph. Span boundaries are not line-break
/// opportunities; only the breaker's offsets and preserved newlines are.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextSpan {
    pub text: String,
    #[serde(default)]
    pub style: Style,
}

impl TextSpan {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            style: Style::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_rect_subtracts_margins() {
        let cfg = PageConfig {
            size: PageSize::Custom {
                width: 600.0,
                height: 800.0,
            },
            margin: Edges::uniform(50.0),
        };
        assert_eq!(cfg.content_rect(), Rect::new(50.0, 50.0, 500.0, 700.0));
    }

    #[test]
    fn camel_case_json() {
        let json = r#"{
            "page": { "size": { "Custom": { "width": 600, "height": 800 } }, "margin": { "top": 50, "right": 50, "bottom": 50, "left": 50 } },
            "children": [
                { "kind": { "type": "Text", "content": "Hello" },
                  "style": { "fontFamily": ["TestFont"], "whiteSpace": "NoWrap", "transform": [{ "Rotate": 45 }] },
                  "bounds": { "x": 0, "y": 0, "width": 100, "height": 20 } }
            ]
        }"#;
        let doc: Document = serde_json::from_str(json).unwrap();
        assert_eq!(doc.children.len(), 1);
        assert!(matches!(doc.children[0].kind, NodeKind::Text { .. }));
        assert_eq!(
            doc.children[0].style.font_family.as_deref(),
            Some(&["TestFont".to_string()][..])
        );
    }
}
