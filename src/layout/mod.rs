//! # Pagination
//!
//! Turns the positioned box tree into pages. This is where content meets
//! the page boundary, and where we decide what happens to content that
//! doesn't fit it.
//!
//! The pipeline:
//! 1. [`paginate`] walks the flow canvas and cuts it into primary pages
//!    (lines, table rows and column content are the units that move)
//! 2. [`overflow`] classifies every placed box of a page against the page
//!    content rectangle, after transforms and ancestor clips
//! 3. [`shadow`] appends shadow pages for visible overflow
//! 4. [`replicate`] places fixed and running elements on the final
//!    sequence, with page counters resolved
//!
//! Text that uses `target-counter(#id)` needs the page numbers of the
//! finished sequence, so such documents go through the pipeline again with
//! the references filled in, until the numbers stop changing.
//!
//! ## Coordinates
//!
//! Every placed box of a page is in *content coordinates*: the origin is the
//! top-left corner of the primary page's content rectangle. A shadow page
//! keeps the coordinates of its origin page and shows a different strip of
//! them, given by its `viewport`. [`PageBox::to_page`] maps content
//! coordinates to physical page coordinates.

pub mod overflow;
pub mod page_break;
pub mod paginate;
pub mod replicate;
pub mod shadow;

use std::collections::HashMap;

use log::{debug, warn};
use serde::Serialize;

use crate::config::PaginationOptions;
use crate::error::{Diagnostic, Unsupported};
use crate::font::FontContext;
use crate::geometry::{Point, Polygon, Rect, Transform};
use crate::model::{Document, Node, NodeKind, PageConfig};
use crate::style::{Color, Overflow, Position, ResolvedStyle};
use crate::text::{InlineSpan, Line, Paragraph, TextLayout};
use overflow::OverflowState;

/// The result of paginating a document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Final page sequence: every shadow page follows its origin page.
    pub pages: Vec<PageBox>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Pagination {
    pub fn primary_pages(&self) -> impl Iterator<Item = &PageBox> {
        self.pages.iter().filter(|p| !p.is_shadow())
    }

    pub fn shadow_pages(&self) -> impl Iterator<Item = &PageBox> {
        self.pages.iter().filter(|p| p.is_shadow())
    }

    /// Shadow pages generated for the page at `origin` (an index into `pages`).
    pub fn shadow_pages_of(&self, origin: usize) -> impl Iterator<Item = &PageBox> {
        self.pages
            .iter()
            .filter(move |p| matches!(p.kind, PageKind::Shadow { origin: o, .. } if o == origin))
    }

    /// The number of the page each flow element with an id starts on.
    pub fn target_pages(&self) -> HashMap<String, usize> {
        let mut targets = HashMap::new();
        for page in self.primary_pages() {
            let mut boxes = Vec::new();
            for b in &page.boxes {
                b.collect(&mut boxes);
            }
            for id in boxes.into_iter().filter_map(|b| b.id.as_ref()) {
                targets.entry(id.clone()).or_insert(page.number);
            }
        }
        targets
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PageKind {
    Primary,
    /// Holds content overflowing page `origin`; `strip` counts from 1
    /// outwards in the overflow direction.
    Shadow { origin: usize, strip: u32 },
}

/// One page of the final sequence.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageBox {
    /// Position in the final sequence.
    pub index: usize,
    /// Page counter value. Shadow pages share their origin's number.
    pub number: usize,
    pub kind: PageKind,
    pub width: f64,
    pub height: f64,
    /// The content rectangle in page coordinates.
    pub content: Rect,
    /// The region of content coordinates this page shows.
    pub viewport: Rect,
    /// Flow content.
    pub boxes: Vec<PlacedBox>,
    /// Fixed elements replicated onto this page.
    pub fixed: Vec<PlacedBox>,
    /// Running elements, each wrapped in its margin box.
    pub running: Vec<PlacedBox>,
}

impl PageBox {
    fn primary(index: usize, config: &PageConfig, boxes: Vec<PlacedBox>) -> Self {
        let (width, height) = config.size.dimensions();
        let content = config.content_rect();
        Self {
            index,
            number: index + 1,
            kind: PageKind::Primary,
            width,
            height,
            content,
            viewport: Rect::new(0.0, 0.0, content.width, content.height),
            boxes,
            fixed: Vec::new(),
            running: Vec::new(),
        }
    }

    pub fn is_shadow(&self) -> bool {
        matches!(self.kind, PageKind::Shadow { .. })
    }

    /// Map a point in content coordinates to page coordinates.
    pub fn to_page(&self, p: Point) -> Point {
        Point::new(
            p.x - self.viewport.x + self.content.x,
            p.y - self.viewport.y + self.content.y,
        )
    }

    /// Depth-first over running, flow and fixed boxes.
    pub fn all_boxes(&self) -> Vec<&PlacedBox> {
        let mut out = Vec::new();
        for b in self.running.iter().chain(&self.boxes).chain(&self.fixed) {
            b.collect(&mut out);
        }
        out
    }

    /// The first box with the given id.
    pub fn find(&self, id: &str) -> Option<&PlacedBox> {
        self.all_boxes()
            .into_iter()
            .find(|b| b.id.as_deref() == Some(id))
    }

    /// Boxes in paint order: document order, stably sorted by z-index.
    /// Non-positioned boxes paint at their nearest positioned ancestor's level.
    pub fn paint_order(&self) -> Vec<&PlacedBox> {
        fn walk<'a>(b: &'a PlacedBox, inherited: i32, out: &mut Vec<(i32, &'a PlacedBox)>) {
            let z = if matches!(b.position, Position::Static) {
                inherited
            } else {
                b.z_index
            };
            out.push((z, b));
            for child in &b.children {
                walk(child, z, out);
            }
        }

        let mut items = Vec::new();
        for b in self.running.iter().chain(&self.boxes).chain(&self.fixed) {
            walk(b, 0, &mut items);
        }
        items.sort_by_key(|(z, _)| *z);
        items.into_iter().map(|(_, b)| b).collect()
    }
}

/// A box placed on a page, absolute in content coordinates.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedBox {
    pub id: Option<String>,
    pub kind: &'static str,
    /// Border box before `transform`.
    pub rect: Rect,
    /// This box's own transform, already pivoted; ancestors' transforms
    /// apply on top of it.
    pub transform: Option<Transform>,
    pub position: Position,
    pub overflow: Overflow,
    pub z_index: i32,
    pub background: Option<Color>,
    pub border_width: f64,
    pub lines: Vec<PlacedLine>,
    pub children: Vec<PlacedBox>,
    /// `false` for scaffolding kept only for its clip and transform.
    pub paint_self: bool,
    pub state: OverflowState,
    /// Marks left after ancestor clipping, post-transform.
    #[serde(skip)]
    pub(crate) visible_marks: Vec<Polygon>,
}

/// A text line placed inside its box.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedLine {
    /// Left edge of the line box.
    pub x: f64,
    pub y: f64,
    /// Width of the line box (the paragraph's available width).
    pub width: f64,
    pub height: f64,
    pub line: Line,
}

impl PlacedLine {
    /// The rectangle covered by the line's glyphs.
    pub fn ink(&self) -> Rect {
        let (left, right) = self.line.extent();
        Rect::new(self.x + left, self.y, right - left, self.height)
    }
}

impl PlacedBox {
    fn new(node: &Node, style: &ResolvedStyle, rect: Rect) -> Self {
        Self {
            id: node.id.clone(),
            kind: node.kind.name(),
            rect,
            transform: style.transform_matrix(&rect),
            position: style.position,
            overflow: style.overflow,
            z_index: style.z_index,
            background: style.background_color,
            border_width: style.border_width,
            lines: Vec::new(),
            children: Vec::new(),
            paint_self: true,
            state: OverflowState::Contained,
            visible_marks: Vec::new(),
        }
    }

    /// A non-painting box that only clips its children.
    pub(crate) fn clip_region(kind: &'static str, rect: Rect, children: Vec<PlacedBox>) -> Self {
        Self {
            id: None,
            kind,
            rect,
            transform: None,
            position: Position::Relative,
            overflow: Overflow::Hidden,
            z_index: 0,
            background: None,
            border_width: 0.0,
            lines: Vec::new(),
            children,
            paint_self: false,
            state: OverflowState::Contained,
            visible_marks: Vec::new(),
        }
    }

    /// Everything this box paints itself, before transforms and clipping.
    pub fn marks(&self) -> Vec<Rect> {
        if !self.paint_self {
            return Vec::new();
        }
        let mut marks = Vec::new();
        let box_paints = self.background.is_some_and(|c| !c.is_transparent())
            || self.border_width > 0.0
            || self.kind == "Image";
        if box_paints && !self.rect.is_empty() {
            marks.push(self.rect);
        }
        marks.extend(
            self.lines
                .iter()
                .filter(|l| l.line.has_ink())
                .map(PlacedLine::ink)
                .filter(|r| !r.is_empty()),
        );
        marks
    }

    pub fn is_containing_block(&self) -> bool {
        !matches!(self.position, Position::Static) || self.transform.is_some()
    }

    /// Whether anything of this subtree is visible inside `viewport`.
    /// Only meaningful after overflow classification.
    pub fn visible_in(&self, viewport: &Rect) -> bool {
        self.visible_marks.iter().any(|m| m.overlaps(viewport))
            || self.children.iter().any(|c| c.visible_in(viewport))
    }

    /// A copy of this box without children.
    pub(crate) fn shallow(&self) -> Self {
        Self {
            id: self.id.clone(),
            kind: self.kind,
            rect: self.rect,
            transform: self.transform,
            position: self.position,
            overflow: self.overflow,
            z_index: self.z_index,
            background: self.background,
            border_width: self.border_width,
            lines: self.lines.clone(),
            children: Vec::new(),
            paint_self: self.paint_self,
            state: self.state,
            visible_marks: self.visible_marks.clone(),
        }
    }

    /// Move the whole subtree by `(dx, dy)`.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.rect = self.rect.translate(dx, dy);
        self.transform = self.transform.map(|t| {
            Transform::translate(-dx, -dy)
                .then(&t)
                .then(&Transform::translate(dx, dy))
        });
        for line in &mut self.lines {
            line.x += dx;
            line.y += dy;
        }
        for mark in &mut self.visible_marks {
            *mark = mark.translate(dx, dy);
        }
        for child in &mut self.children {
            child.translate(dx, dy);
        }
    }

    /// The text of all lines, in logical order, one entry per line.
    pub fn line_texts(&self) -> Vec<&str> {
        self.lines.iter().map(|l| l.line.text.as_str()).collect()
    }

    fn collect<'a>(&'a self, out: &mut Vec<&'a PlacedBox>) {
        out.push(self);
        for child in &self.children {
            child.collect(out);
        }
    }
}

/// A fixed or running node pulled out of the flow, with the style it
/// inherits from its original parent.
#[derive(Debug, Clone)]
pub(crate) struct Anchored {
    pub node: Node,
    pub parent_style: ResolvedStyle,
}

/// Fixed nodes leave the flow unless a transformed ancestor contains them
/// (they then behave as absolute); running nodes always do.
fn is_anchored(style: &ResolvedStyle, in_transform: bool) -> bool {
    match style.position {
        Position::Fixed => !in_transform,
        Position::Running(_) => true,
        _ => false,
    }
}

/// Shared state of one pagination run.
pub(crate) struct Paginator<'a> {
    text: &'a mut TextLayout,
    fonts: &'a FontContext,
    pub(crate) page: PageConfig,
    pub(crate) diagnostics: Vec<Diagnostic>,
    pub(crate) fixed: Vec<Anchored>,
    pub(crate) running: Vec<Anchored>,
    /// Content height of a page; the flow canvas is cut every `page_height`.
    page_height: f64,
    /// How far the flow has been pushed down (or pulled up) so far.
    shift: f64,
    last_page: usize,
}

impl<'a> Paginator<'a> {
    pub(crate) fn new(text: &'a mut TextLayout, fonts: &'a FontContext, page: PageConfig) -> Self {
        let page_height = page.content_rect().height.max(1.0);
        Self {
            text,
            fonts,
            page,
            diagnostics: Vec::new(),
            fixed: Vec::new(),
            running: Vec::new(),
            page_height,
            shift: 0.0,
            last_page: 0,
        }
    }

    /// Pull fixed and running nodes out of the tree, in document order.
    pub(crate) fn collect_anchored(
        &mut self,
        nodes: &[Node],
        parent: &ResolvedStyle,
        in_transform: bool,
    ) {
        for node in nodes {
            let style = node.style.resolve(parent);
            if is_anchored(&style, in_transform) {
                let anchored = Anchored {
                    node: node.clone(),
                    parent_style: parent.clone(),
                };
                match style.position {
                    Position::Fixed => self.fixed.push(anchored),
                    _ => self.running.push(anchored),
                }
                continue;
            }
            let in_transform = in_transform || !style.transform.is_empty();
            self.collect_anchored(&node.children, &style, in_transform);
        }
    }

    /// Place a whole subtree with its top-left corner at `at`, unsplit.
    pub(crate) fn place_tree(
        &mut self,
        node: &Node,
        parent: &ResolvedStyle,
        at: Point,
        in_transform: bool,
    ) -> PlacedBox {
        let style = node.style.resolve(parent);
        let rect = Rect::new(at.x, at.y, node.bounds.width, node.bounds.height);
        let mut placed = PlacedBox::new(node, &style, rect);
        if matches!(style.position, Position::Fixed) && in_transform {
            placed.position = Position::Absolute;
        }
        placed.lines = self.layout_lines(node, &style, rect);

        let in_transform = in_transform || placed.transform.is_some();
        for child in &node.children {
            if matches!(child.kind, NodeKind::PageBreak | NodeKind::ColumnBreak) {
                continue;
            }
            let child_style = child.style.resolve(&style);
            if is_anchored(&child_style, in_transform) {
                continue;
            }
            let child_at = Point::new(at.x + child.bounds.x, at.y + child.bounds.y);
            placed
                .children
                .push(self.place_tree(child, &style, child_at, in_transform));
        }
        placed
    }

    /// Lay out a text node's lines inside `rect`. Non-text nodes have none.
    pub(crate) fn layout_lines(
        &mut self,
        node: &Node,
        style: &ResolvedStyle,
        rect: Rect,
    ) -> Vec<PlacedLine> {
        let NodeKind::Text { content, spans } = &node.kind else {
            return Vec::new();
        };

        let spans: Vec<InlineSpan> = if spans.is_empty() {
            vec![InlineSpan {
                text: content.clone(),
                style: style.clone(),
            }]
        } else {
            spans
                .iter()
                .map(|s| InlineSpan {
                    text: s.text.clone(),
                    style: s.style.resolve(style),
                })
                .collect()
        };

        if let Some(u) = style.unsupported() {
            self.report(node, u);
        }
        for span in &spans {
            if let Some(u) = span.style.unsupported() {
                self.report(node, u);
            }
        }

        let paragraph = Paragraph {
            spans,
            style: style.clone(),
        };
        let lines = self.text.layout(self.fonts, &paragraph, rect.width);

        let mut y = rect.y;
        lines
            .into_iter()
            .map(|line| {
                let height = line
                    .runs
                    .iter()
                    .map(|r| paragraph.spans[r.span].style.line_box_height())
                    .fold(style.line_box_height(), f64::max);
                let placed = PlacedLine {
                    x: rect.x,
                    y,
                    width: rect.width,
                    height,
                    line,
                };
                y += height;
                placed
            })
            .collect()
    }

    /// Record an ignored feature once per node.
    fn report(&mut self, node: &Node, unsupported: Unsupported) {
        let diagnostic = Diagnostic {
            node: node.id.clone(),
            unsupported,
        };
        if self.diagnostics.contains(&diagnostic) {
            return;
        }
        warn!(
            "{} ({}): {}",
            node.id.as_deref().unwrap_or("<anonymous>"),
            node.kind.name(),
            diagnostic.unsupported
        );
        self.diagnostics.push(diagnostic);
    }
}

/// Upper bound on pipeline runs for documents with `target-counter`.
const MAX_TARGET_PASSES: usize = 3;

/// Run the whole pipeline over a document.
pub(crate) fn paginate_document(
    document: &Document,
    root: &ResolvedStyle,
    text: &mut TextLayout,
    fonts: &FontContext,
    options: &PaginationOptions,
) -> Pagination {
    let mut pagination =
        paginate_pass(&document.children, document.page, root, text, fonts, options);
    if !replicate::uses_target_counters(&document.children) {
        return pagination;
    }

    for pass in 2..=MAX_TARGET_PASSES {
        let targets = pagination.target_pages();
        let children: Vec<Node> = document
            .children
            .iter()
            .map(|node| replicate::resolve_target_counters(node, &targets))
            .collect();
        pagination = paginate_pass(&children, document.page, root, text, fonts, options);
        if pagination.target_pages() == targets {
            break;
        }
        debug!("target pages moved in pass {pass}");
    }
    pagination
}

fn paginate_pass(
    children: &[Node],
    page: PageConfig,
    root: &ResolvedStyle,
    text: &mut TextLayout,
    fonts: &FontContext,
    options: &PaginationOptions,
) -> Pagination {
    let mut paginator = Paginator::new(text, fonts, page);
    let primary = paginator.paginate_flow(children, root);
    debug!("flow cut into {} primary page(s)", primary.len());

    let mut pages = shadow::synthesize(primary, options);
    replicate::replicate(&mut paginator, &mut pages);

    Pagination {
        pages,
        diagnostics: paginator.diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{Direction, Style};

    fn placed(kind: NodeKind, bounds: Rect, style: Style) -> PlacedBox {
        let mut node = Node::new(kind, bounds);
        node.style = style;
        let resolved = node.style.resolve(&ResolvedStyle::root(Direction::Ltr));
        PlacedBox::new(&node, &resolved, bounds)
    }

    #[test]
    fn plain_block_has_no_marks() {
        let b = placed(NodeKind::Block, Rect::new(0.0, 0.0, 10.0, 10.0), Style::default());
        assert!(b.marks().is_empty());
    }

    #[test]
    fn background_and_image_are_marks() {
        let bg = placed(
            NodeKind::Block,
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Style {
                background_color: Some(Color::rgb(1.0, 0.0, 0.0)),
                ..Default::default()
            },
        );
        assert_eq!(bg.marks().len(), 1);
        let img = placed(NodeKind::Image, Rect::new(0.0, 0.0, 10.0, 10.0), Style::default());
        assert_eq!(img.marks().len(), 1);
    }

    #[test]
    fn scaffolding_paints_nothing() {
        let mut b = placed(
            NodeKind::Image,
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Style::default(),
        );
        b.paint_self = false;
        assert!(b.marks().is_empty());
    }

    #[test]
    fn translate_moves_subtree_and_transform_pivot() {
        let mut b = placed(
            NodeKind::Image,
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Style {
                transform: Some(vec![crate::style::TransformOp::Rotate(90.0)]),
                ..Default::default()
            },
        );
        b.translate(100.0, 0.0);
        let t = b.transform.unwrap();
        let center = t.apply(Point::new(105.0, 5.0));
        assert!((center.x - 105.0).abs() < 1e-9 && (center.y - 5.0).abs() < 1e-9);
    }

    #[test]
    fn paint_order_sorts_by_z_index_stably() {
        let config = PageConfig::default();
        let mut low = placed(NodeKind::Block, Rect::default(), Style::default());
        low.id = Some("low".into());
        let mut high = placed(
            NodeKind::Block,
            Rect::default(),
            Style {
                position: Some(Position::Relative),
                z_index: Some(5),
                ..Default::default()
            },
        );
        high.id = Some("high".into());
        let mut neg = placed(
            NodeKind::Block,
            Rect::default(),
            Style {
                position: Some(Position::Absolute),
                z_index: Some(-1),
                ..Default::default()
            },
        );
        neg.id = Some("neg".into());
        let page = PageBox::primary(0, &config, vec![high, low, neg]);
        let ids: Vec<&str> = page
            .paint_order()
            .into_iter()
            .filter_map(|b| b.id.as_deref())
            .collect();
        assert_eq!(ids, vec!["neg", "low", "high"]);
    }

    #[test]
    fn to_page_accounts_for_viewport_and_margins() {
        let config = PageConfig::default();
        let mut page = PageBox::primary(0, &config, vec![]);
        page.viewport = page.viewport.translate(page.viewport.width, 0.0);
        let p = page.to_page(Point::new(page.viewport.x + 1.0, 2.0));
        assert!((p.x - (config.margin.left + 1.0)).abs() < 1e-9);
        assert!((p.y - (config.margin.top + 2.0)).abs() < 1e-9);
    }
}
