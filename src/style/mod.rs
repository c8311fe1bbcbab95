//! # Style System
//!
//! The computed-style subset the pagination core needs. Cascade and
//! selector matching happen upstream; nodes arrive with their own declared
//! values and inherit the rest from their parent through [`Style::resolve`].
//!
//! Inherited: typography, direction, white-space, word-wrap/word-break,
//! widows/orphans. Not inherited: positioning, overflow, transform, z-index,
//! background and border.

use crate::error::Unsupported;
use crate::geometry::{Point, Rect, Transform};
use serde::{Deserialize, Serialize};

/// The declared style of a node. `None` means "inherit or use the initial value".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    // ── Typography ─────────────────────────────────────────────
    /// Font fallback chain, most preferred first.
    pub font_family: Option<Vec<String>>,
    /// Font size in points.
    pub font_size: Option<f64>,
    /// Line height as a multiplier of font size.
    pub line_height: Option<f64>,
    /// Extra advance after every glyph, in points.
    pub letter_spacing: Option<f64>,
    pub text_align: Option<TextAlign>,
    pub direction: Option<Direction>,
    pub white_space: Option<WhiteSpace>,
    pub word_wrap: Option<WordWrap>,
    pub word_break: Option<WordBreak>,
    pub color: Option<Color>,

    // ── Positioning & Overflow ─────────────────────────────────
    pub position: Option<Position>,
    pub overflow: Option<Overflow>,
    /// Transform functions, applied left to right (CSS order).
    pub transform: Option<Vec<TransformOp>>,
    /// Pivot for `transform`, relative to the box's top-left corner.
    /// Defaults to the box center, like CSS `transform-origin: 50% 50%`.
    pub transform_origin: Option<Point>,
    pub z_index: Option<i32>,

    // ── Paint ──────────────────────────────────────────────────
    pub background_color: Option<Color>,
    pub border_width: Option<f64>,

    // ── Page Behavior ──────────────────────────────────────────
    /// `false` keeps the node on one page; if it doesn't fit it moves to the next.
    pub break_inside: Option<BreakInside>,
    /// Minimum lines kept at the bottom of a page before a break. Default: 2.
    pub orphans: Option<u32>,
    /// Minimum lines carried to the top of the next page. Default: 2.
    pub widows: Option<u32>,
}

/// A fully resolved style: every property has a value.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedStyle {
    pub font_family: Vec<String>,
    pub font_size: f64,
    pub line_height: f64,
    pub letter_spacing: f64,
    pub text_align: TextAlign,
    pub direction: Direction,
    pub white_space: WhiteSpace,
    pub word_wrap: WordWrap,
    pub word_break: WordBreak,
    pub color: Color,

    pub position: Position,
    pub overflow: Overflow,
    pub transform: Vec<TransformOp>,
    pub transform_origin: Option<Point>,
    pub z_index: i32,

    pub background_color: Option<Color>,
    pub border_width: f64,

    pub break_inside: BreakInside,
    pub orphans: u32,
    pub widows: u32,
}

pub const DEFAULT_FONT_FAMILY: &str = "monospace";

impl ResolvedStyle {
    /// The root style. `direction` is the engine's configured base direction.
    pub fn root(direction: Direction) -> Self {
        Self {
            font_family: vec![DEFAULT_FONT_FAMILY.to_string()],
            font_size: 12.0,
            line_height: 1.2,
            letter_spacing: 0.0,
            text_align: TextAlign::Start,
            direction,
            white_space: WhiteSpace::Normal,
            word_wrap: WordWrap::Normal,
            word_break: WordBreak::Normal,
            color: Color::BLACK,
            position: Position::Static,
            overflow: Overflow::Visible,
            transform: Vec::new(),
            transform_origin: None,
            z_index: 0,
            background_color: None,
            border_width: 0.0,
            break_inside: BreakInside::Auto,
            orphans: 2,
            widows: 2,
        }
    }

    /// Line box height in points.
    pub fn line_box_height(&self) -> f64 {
        self.font_size * self.line_height
    }

    /// Whether this box contains its absolutely positioned descendants.
    pub fn is_containing_block(&self) -> bool {
        !matches!(self.position, Position::Static) || !self.transform.is_empty()
    }

    /// The resolved transform matrix for a box with the given border rect,
    /// or `None` when the box is not transformed.
    pub fn transform_matrix(&self, rect: &Rect) -> Option<Transform> {
        if self.transform.is_empty() {
            return None;
        }
        let matrix = self
            .transform
            .iter()
            .rev()
            .fold(Transform::IDENTITY, |acc, op| acc.then(&op.matrix()));
        let origin = self
            .transform_origin
            .map(|o| Point::new(rect.x + o.x, rect.y + o.y))
            .unwrap_or_else(|| rect.center());
        Some(matrix.around(origin))
    }

    /// Features this style asks for that are ignored.
    pub fn unsupported(&self) -> Option<Unsupported> {
        match self.word_break {
            WordBreak::BreakAll => Some(Unsupported {
                property: "word-break",
                value: "break-all",
            }),
            WordBreak::Normal => None,
        }
    }
}

impl Style {
    /// Resolve against the parent's computed style.
    pub fn resolve(&self, parent: &ResolvedStyle) -> ResolvedStyle {
        ResolvedStyle {
            font_family: self
                .font_family
                .clone()
                .filter(|f| !f.is_empty())
                .unwrap_or_else(|| parent.font_family.clone()),
            font_size: self.font_size.unwrap_or(parent.font_size),
            line_height: self.line_height.unwrap_or(parent.line_height),
            letter_spacing: self.letter_spacing.unwrap_or(parent.letter_spacing),
            text_align: self.text_align.unwrap_or(parent.text_align),
            direction: self.direction.unwrap_or(parent.direction),
            white_space: self.white_space.unwrap_or(parent.white_space),
            word_wrap: self.word_wrap.unwrap_or(parent.word_wrap),
            word_break: self.word_break.unwrap_or(parent.word_break),
            color: self.color.unwrap_or(parent.color),

            position: self.position.unwrap_or_default(),
            overflow: self.overflow.unwrap_or_default(),
            transform: self.transform.clone().unwrap_or_default(),
            transform_origin: self.transform_origin,
            z_index: self.z_index.unwrap_or(0),

            background_color: self.background_color,
            border_width: self.border_width.unwrap_or(0.0),

            break_inside: self.break_inside.unwrap_or_default(),
            orphans: self.orphans.unwrap_or(parent.orphans),
            widows: self.widows.unwrap_or(parent.widows),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

impl Direction {
    pub fn is_rtl(&self) -> bool {
        matches!(self, Direction::Rtl)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    Left,
    Right,
    Center,
    Justify,
    /// Left in LTR paragraphs, right in RTL ones.
    #[default]
    Start,
    End,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WhiteSpace {
    /// Collapse whitespace, wrap at break opportunities.
    #[default]
    Normal,
    /// Collapse whitespace, never wrap.
    NoWrap,
    /// Preserve whitespace, honor newlines, wrap at break opportunities.
    PreWrap,
    /// Preserve whitespace, honor newlines, never wrap otherwise.
    Pre,
}

impl WhiteSpace {
    pub fn preserves(&self) -> bool {
        matches!(self, WhiteSpace::PreWrap | WhiteSpace::Pre)
    }

    pub fn wraps(&self) -> bool {
        matches!(self, WhiteSpace::Normal | WhiteSpace::PreWrap)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WordWrap {
    #[default]
    Normal,
    /// An unbreakable token wider than the line is split at character boundaries.
    BreakWord,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WordBreak {
    #[default]
    Normal,
    /// Recognized but not implemented; reported as a diagnostic.
    BreakAll,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Position {
    #[default]
    Static,
    Relative,
    Absolute,
    /// Anchored to the page viewport; repeated on every page.
    Fixed,
    /// Moved into a page margin box; repeated on every page.
    Running(RunningSlot),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunningSlot {
    Header,
    Footer,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Overflow {
    #[default]
    Visible,
    Hidden,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreakInside {
    #[default]
    Auto,
    Avoid,
}

/// A CSS transform function.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TransformOp {
    /// Clockwise rotation in degrees.
    Rotate(f64),
    Translate(f64, f64),
    Scale(f64, f64),
    Matrix(Transform),
}

impl TransformOp {
    pub fn matrix(&self) -> Transform {
        match *self {
            TransformOp::Rotate(deg) => Transform::rotate(deg),
            TransformOp::Translate(x, y) => Transform::translate(x, y),
            TransformOp::Scale(sx, sy) => Transform::scale(sx, sy),
            TransformOp::Matrix(m) => m,
        }
    }
}

/// An RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64, // 0.0 - 1.0
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };

    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn is_transparent(&self) -> bool {
        self.a <= 0.0
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typography_inherits_positioning_does_not() {
        let parent = Style {
            font_size: Some(20.0),
            position: Some(Position::Relative),
            overflow: Some(Overflow::Hidden),
            ..Default::default()
        }
        .resolve(&ResolvedStyle::root(Direction::Ltr));
        let child = Style::default().resolve(&parent);
        assert_eq!(child.font_size, 20.0);
        assert_eq!(child.position, Position::Static);
        assert_eq!(child.overflow, Overflow::Visible);
    }

    #[test]
    fn root_direction_flows_down() {
        let child = Style::default().resolve(&ResolvedStyle::root(Direction::Rtl));
        assert!(child.direction.is_rtl());
    }

    #[test]
    fn transform_pivots_around_center_by_default() {
        let style = Style {
            transform: Some(vec![TransformOp::Rotate(180.0)]),
            ..Default::default()
        }
        .resolve(&ResolvedStyle::root(Direction::Ltr));
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        let m = style.transform_matrix(&rect).unwrap();
        let b = m.apply_rect(&rect).bounds().unwrap();
        assert!((b.x - 0.0).abs() < 1e-9 && (b.y - 0.0).abs() < 1e-9);
    }

    #[test]
    fn transform_functions_apply_in_css_order() {
        // rotate(90deg) translate(10, 0): the translation happens in the
        // rotated frame, so it moves the box down.
        let style = Style {
            transform: Some(vec![TransformOp::Rotate(90.0), TransformOp::Translate(10.0, 0.0)]),
            transform_origin: Some(Point::new(0.0, 0.0)),
            ..Default::default()
        }
        .resolve(&ResolvedStyle::root(Direction::Ltr));
        let m = style.transform_matrix(&Rect::new(0.0, 0.0, 1.0, 1.0)).unwrap();
        let p = m.apply(Point::new(0.0, 0.0));
        assert!(p.x.abs() < 1e-9 && (p.y - 10.0).abs() < 1e-9, "{p:?}");
    }

    #[test]
    fn break_all_is_reported() {
        let style = Style {
            word_break: Some(WordBreak::BreakAll),
            ..Default::default()
        }
        .resolve(&ResolvedStyle::root(Direction::Ltr));
        assert_eq!(style.unsupported().map(|u| u.property), Some("word-break"));
    }
}
