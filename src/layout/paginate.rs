//! # Flow Pagination
//!
//! Cuts the continuous flow canvas into primary pages.
//!
//! The canvas is sliced every page height. When a unit that must not be cut
//! (a text line, a table row, an atomic box) straddles a slice, it and
//! everything after it is pushed down to the next page; `shift` accumulates
//! those push-downs, so a canvas position `y` lands at `y + shift` in the
//! paginated flow. Tables that repeat their header and footer, and
//! multi-column containers, take more or less room than the canvas gave
//! them; they reset `shift` so the flow resumes right after them.
//!
//! Breakable containers (blocks, non-paginated tables) are never placed as
//! a whole: each page they touch gets a fragment of them holding the
//! fragments of their children on that page.

use std::collections::BTreeMap;

use log::debug;

use super::page_break::{decide_break, BreakDecision};
use super::{is_anchored, PageBox, PlacedBox, PlacedLine, Paginator};
use crate::geometry::{Point, Rect, EPSILON};
use crate::model::{Node, NodeKind};
use crate::style::{BreakInside, Position, ResolvedStyle};

type Fragments = Vec<(usize, PlacedBox)>;

impl Paginator<'_> {
    /// Paginate the top-level flow into primary pages.
    pub(crate) fn paginate_flow(
        &mut self,
        children: &[Node],
        root: &ResolvedStyle,
    ) -> Vec<PageBox> {
        self.collect_anchored(children, root, false);

        let mut pages: Vec<Vec<PlacedBox>> = Vec::new();
        for child in children {
            for (page, fragment) in self.flow_node(child, root, Point::default(), false) {
                if pages.len() <= page {
                    pages.resize_with(page + 1, Vec::new);
                }
                pages[page].push(fragment);
            }
        }
        let count = pages.len().max(self.last_page + 1);
        pages.resize_with(count, Vec::new);

        pages
            .into_iter()
            .enumerate()
            .map(|(index, boxes)| PageBox::primary(index, &self.page, boxes))
            .collect()
    }

    fn page_of(&self, y: f64) -> usize {
        ((y + EPSILON) / self.page_height).floor().max(0.0) as usize
    }

    /// Page of a bottom edge: a box ending exactly on a boundary stays on
    /// the page above it.
    fn page_of_end(&self, y: f64) -> usize {
        ((y - EPSILON) / self.page_height).floor().max(0.0) as usize
    }

    fn page_top(&self, page: usize) -> f64 {
        page as f64 * self.page_height
    }

    fn touch(&mut self, page: usize) {
        self.last_page = self.last_page.max(page);
    }

    /// Reserve room for an unsplittable unit at canvas `y`. Returns its page
    /// and the offset that maps canvas y to content y on that page.
    fn place_unit(&mut self, y: f64, height: f64) -> (usize, f64) {
        let top = y + self.shift;
        let mut page = self.page_of(top);
        let page_top = self.page_top(page);
        let at_page_top = top <= page_top + EPSILON;
        let past_bottom = top + height > page_top + self.page_height + EPSILON;
        if height > EPSILON && past_bottom && !at_page_top {
            debug!("unit at {:.1} (height {:.1}) pushed to page {}", top, height, page + 1);
            self.shift += page_top + self.page_height - top;
            page += 1;
        }
        self.touch(page);
        (page, self.shift - self.page_top(page))
    }

    /// Locate canvas `y` without moving anything.
    fn locate(&mut self, y: f64) -> (usize, f64) {
        let page = self.page_of(y + self.shift);
        self.touch(page);
        (page, self.shift - self.page_top(page))
    }

    fn force_page_break(&mut self, y: f64) {
        let top = y + self.shift;
        let page = self.page_of(top);
        if top > self.page_top(page) + EPSILON {
            self.shift += self.page_top(page + 1) - top;
        }
        self.touch(page);
    }

    /// Make the flow resume at `end` (paginated position) after a box whose
    /// canvas bottom is `canvas_bottom`.
    fn resume_after(&mut self, canvas_bottom: f64, end: f64) {
        self.shift = end - canvas_bottom;
    }

    fn flow_node(
        &mut self,
        node: &Node,
        parent: &ResolvedStyle,
        origin: Point,
        in_transform: bool,
    ) -> Fragments {
        let style = node.style.resolve(parent);
        if is_anchored(&style, in_transform) {
            return Vec::new();
        }
        let abs = node.bounds.translate(origin.x, origin.y);

        match node.kind {
            NodeKind::PageBreak => {
                self.force_page_break(abs.y);
                return Vec::new();
            }
            NodeKind::ColumnBreak => return Vec::new(),
            _ => {}
        }

        let out_of_flow = matches!(style.position, Position::Absolute)
            || (matches!(style.position, Position::Fixed) && in_transform);
        if out_of_flow {
            let (page, dy) = self.locate(abs.y);
            let placed = self.place_tree(node, parent, Point::new(abs.x, abs.y + dy), in_transform);
            return vec![(page, placed)];
        }

        let splittable = style.transform.is_empty() && style.break_inside == BreakInside::Auto;
        match &node.kind {
            NodeKind::Text { .. } if splittable => self.flow_text(node, &style, abs),
            NodeKind::Table { paginated: true } if splittable => {
                self.flow_table(node, &style, abs, in_transform)
            }
            NodeKind::Columns { count, gap } if splittable && !node.children.is_empty() => {
                self.flow_columns(node, &style, abs, *count, *gap, in_transform)
            }
            NodeKind::Block | NodeKind::Table { .. } if splittable && !node.children.is_empty() => {
                self.flow_block(node, &style, abs, in_transform)
            }
            // Inline-blocks, floats, images, rows and transformed boxes
            // move as one unit.
            _ => {
                let (page, dy) = self.place_unit(abs.y, abs.height);
                let at = Point::new(abs.x, abs.y + dy);
                let placed = self.place_tree(node, parent, at, in_transform);
                vec![(page, placed)]
            }
        }
    }

    /// A breakable container: one fragment per page it touches.
    fn flow_block(
        &mut self,
        node: &Node,
        style: &ResolvedStyle,
        abs: Rect,
        in_transform: bool,
    ) -> Fragments {
        let top = abs.y + self.shift;
        let origin = Point::new(abs.x, abs.y);
        let mut by_page: BTreeMap<usize, Vec<PlacedBox>> = BTreeMap::new();
        for child in &node.children {
            for (page, fragment) in self.flow_node(child, style, origin, in_transform) {
                by_page.entry(page).or_default().push(fragment);
            }
        }
        let bottom = abs.bottom() + self.shift;

        let first = self.page_of(top);
        let last = self.page_of_end(bottom).max(first);
        self.touch(last);
        for page in first..=last {
            by_page.entry(page).or_default();
        }

        by_page
            .into_iter()
            .map(|(page, children)| {
                let page_top = self.page_top(page);
                let y0 = if page <= first { top - page_top } else { 0.0 };
                let y1 = if page >= last {
                    (bottom - page_top).max(y0)
                } else {
                    self.page_height
                };
                let rect = Rect::new(abs.x, y0, abs.width, y1 - y0);
                let mut fragment = PlacedBox::new(node, style, rect);
                fragment.children = children;
                (page, fragment)
            })
            .collect()
    }

    /// A paragraph: lines move between pages under widow/orphan control.
    fn flow_text(&mut self, node: &Node, style: &ResolvedStyle, abs: Rect) -> Fragments {
        let lines = self.layout_lines(node, style, abs);
        if lines.is_empty() {
            let (page, dy) = self.place_unit(abs.y, abs.height);
            let rect = abs.translate(0.0, dy);
            return vec![(page, PlacedBox::new(node, style, rect))];
        }

        let heights: Vec<f64> = lines.iter().map(|l| l.height).collect();
        let orphans = style.orphans.max(1) as usize;
        let widows = style.widows.max(1) as usize;
        let mut runs: Vec<(usize, f64, Vec<PlacedLine>)> = Vec::new();
        let mut pending = lines.into_iter().peekable();
        let mut i = 0;

        while let Some(first_line) = pending.peek() {
            let top = first_line.y + self.shift;
            let page = self.page_of(top);
            let page_top = self.page_top(page);
            let remaining = page_top + self.page_height - top;
            let at_page_top = top <= page_top + EPSILON;

            let take = match decide_break(remaining, &heights[i..], orphans, widows) {
                BreakDecision::Place => heights.len() - i,
                BreakDecision::Split { lines_here } => lines_here,
                BreakDecision::MoveToNextPage if at_page_top => {
                    fit_count(remaining, &heights[i..]).max(1)
                }
                BreakDecision::MoveToNextPage => {
                    debug!("text lines {}.. moved to page {}", i, page + 1);
                    self.shift += page_top + self.page_height - top;
                    continue;
                }
            };

            self.touch(page);
            let dy = self.shift - page_top;
            let placed: Vec<PlacedLine> = pending
                .by_ref()
                .take(take)
                .map(|mut line| {
                    line.y += dy;
                    line
                })
                .collect();
            runs.push((page, dy, placed));
            i += take;

            if let Some(next) = pending.peek() {
                let next_top = next.y + self.shift;
                self.shift += page_top + self.page_height - next_top;
            }
        }

        let count = runs.len();
        runs.into_iter()
            .enumerate()
            .map(|(k, (page, dy, lines))| {
                let first_y = lines.first().map(|l| l.y).unwrap_or(abs.y + dy);
                let last_bottom = lines.last().map(|l| l.y + l.height).unwrap_or(first_y);
                let top = if k == 0 { abs.y + dy } else { first_y };
                let bottom = if k + 1 == count {
                    last_bottom.max(abs.bottom() + dy)
                } else {
                    last_bottom
                };
                let rect = Rect::new(abs.x, top, abs.width, (bottom - top).max(0.0));
                let mut fragment = PlacedBox::new(node, style, rect);
                fragment.lines = lines;
                (page, fragment)
            })
            .collect()
    }

    /// A paginated table: header and footer groups repeat on every page it
    /// spans, the caption only leads the first one.
    fn flow_table(
        &mut self,
        node: &Node,
        style: &ResolvedStyle,
        abs: Rect,
        in_transform: bool,
    ) -> Fragments {
        let mut caption = None;
        let mut headers = Vec::new();
        let mut footers = Vec::new();
        let mut rows = Vec::new();
        for child in &node.children {
            if matches!(child.kind, NodeKind::PageBreak | NodeKind::ColumnBreak) {
                continue;
            }
            if is_anchored(&child.style.resolve(style), in_transform) {
                continue;
            }
            match child.kind {
                NodeKind::TableCaption if caption.is_none() => caption = Some(child),
                NodeKind::TableHeader => headers.push(child),
                NodeKind::TableFooter => footers.push(child),
                _ => rows.push(child),
            }
        }
        let header_height: f64 = headers.iter().map(|h| h.bounds.height).sum();
        let footer_height: f64 = footers.iter().map(|f| f.bounds.height).sum();

        let mut cursor = TableCursor {
            page: self.page_of(abs.y + self.shift),
            y: 0.0,
            rows_on_page: 0,
            placed: BTreeMap::new(),
        };
        cursor.y = abs.y + self.shift - self.page_top(cursor.page);

        // Keep the caption, the header, the first row and the footer together.
        let lead = caption.map(|c| c.bounds.height).unwrap_or(0.0)
            + header_height
            + rows.first().map(|r| r.bounds.height).unwrap_or(0.0)
            + footer_height;
        if cursor.y + lead > self.page_height + EPSILON && cursor.y > EPSILON {
            cursor.next_page();
        }

        if let Some(caption) = caption {
            self.place_table_part(&mut cursor, caption, style, abs.x, in_transform);
        }
        for header in &headers {
            self.place_table_part(&mut cursor, header, style, abs.x, in_transform);
        }
        for row in rows {
            let overflows =
                cursor.y + row.bounds.height + footer_height > self.page_height + EPSILON;
            if overflows && cursor.rows_on_page > 0 {
                for footer in &footers {
                    self.place_table_part(&mut cursor, footer, style, abs.x, in_transform);
                }
                debug!("table continues on page {}", cursor.page + 1);
                cursor.next_page();
                for header in &headers {
                    self.place_table_part(&mut cursor, header, style, abs.x, in_transform);
                }
            }
            self.place_table_part(&mut cursor, row, style, abs.x, in_transform);
            cursor.rows_on_page += 1;
        }
        for footer in &footers {
            self.place_table_part(&mut cursor, footer, style, abs.x, in_transform);
        }

        let end = self.page_top(cursor.page) + cursor.y;
        self.touch(cursor.page);
        self.resume_after(abs.bottom(), end);

        cursor
            .placed
            .into_iter()
            .map(|(page, parts)| {
                let top = parts.iter().map(|p| p.rect.y).fold(f64::INFINITY, f64::min);
                let bottom = parts.iter().map(|p| p.rect.bottom()).fold(top, f64::max);
                let rect = Rect::new(abs.x, top, abs.width, bottom - top);
                let mut fragment = PlacedBox::new(node, style, rect);
                fragment.children = parts;
                (page, fragment)
            })
            .collect()
    }

    fn place_table_part(
        &mut self,
        cursor: &mut TableCursor,
        part: &Node,
        table_style: &ResolvedStyle,
        table_x: f64,
        in_transform: bool,
    ) {
        let at = Point::new(table_x + part.bounds.x, cursor.y);
        let placed = self.place_tree(part, table_style, at, in_transform);
        self.touch(cursor.page);
        cursor.y += part.bounds.height;
        cursor.placed.entry(cursor.page).or_default().push(placed);
    }

    /// Unbalanced columns: the first column fills to the bottom of the page
    /// before the next one starts; a full page of columns continues on the
    /// next page. Children are laid out as one column in the input and keep
    /// their offsets within it.
    fn flow_columns(
        &mut self,
        node: &Node,
        style: &ResolvedStyle,
        abs: Rect,
        count: u32,
        gap: f64,
        in_transform: bool,
    ) -> Fragments {
        let count = count.max(1) as usize;
        let column_width = ((abs.width - gap * (count as f64 - 1.0)) / count as f64).max(0.0);
        let start = abs.y + self.shift;
        let mut cursor = ColumnCursor {
            page: self.page_of(start),
            column: 0,
            count,
            top: 0.0,
            base: 0.0,
        };
        cursor.top = start - self.page_top(cursor.page);
        let mut placed: BTreeMap<usize, Vec<PlacedBox>> = BTreeMap::new();
        let mut tops: BTreeMap<usize, f64> = BTreeMap::new();
        let mut bottoms: BTreeMap<usize, f64> = BTreeMap::new();
        tops.insert(cursor.page, cursor.top);

        for child in &node.children {
            if matches!(child.kind, NodeKind::ColumnBreak) {
                cursor.advance();
                cursor.base = child.bounds.y;
                tops.entry(cursor.page).or_insert(cursor.top);
                continue;
            }
            if matches!(child.kind, NodeKind::PageBreak) {
                continue;
            }
            if is_anchored(&child.style.resolve(style), in_transform) {
                continue;
            }

            let mut rel = child.bounds.y - cursor.base;
            let past_bottom = cursor.top + rel + child.bounds.height > self.page_height + EPSILON;
            if past_bottom && rel > EPSILON {
                cursor.advance();
                cursor.base = child.bounds.y;
                tops.entry(cursor.page).or_insert(cursor.top);
                rel = 0.0;
            }
            let x = abs.x + cursor.column as f64 * (column_width + gap) + child.bounds.x;
            let at = Point::new(x, cursor.top + rel);
            let fragment = self.place_tree(child, style, at, in_transform);
            let bottom = bottoms.entry(cursor.page).or_insert(cursor.top);
            *bottom = bottom.max(fragment.rect.bottom());
            self.touch(cursor.page);
            placed.entry(cursor.page).or_default().push(fragment);
        }

        let last_page = cursor.page.max(placed.keys().next_back().copied().unwrap_or(cursor.page));
        let end_y = bottoms.get(&last_page).copied().unwrap_or(cursor.top);
        self.touch(last_page);
        self.resume_after(abs.bottom(), self.page_top(last_page) + end_y);

        tops.into_iter()
            .map(|(page, top)| {
                let bottom = bottoms.get(&page).copied().unwrap_or(top);
                let rect = Rect::new(abs.x, top, abs.width, bottom - top);
                let mut fragment = PlacedBox::new(node, style, rect);
                fragment.children = placed.remove(&page).unwrap_or_default();
                (page, fragment)
            })
            .collect()
    }
}

/// How many leading items fit in `remaining`.
fn fit_count(remaining: f64, heights: &[f64]) -> usize {
    let mut used = 0.0;
    heights
        .iter()
        .take_while(|&&h| {
            used += h;
            used <= remaining + EPSILON
        })
        .count()
}

struct TableCursor {
    page: usize,
    /// Content y on `page`.
    y: f64,
    rows_on_page: usize,
    placed: BTreeMap<usize, Vec<PlacedBox>>,
}

impl TableCursor {
    fn next_page(&mut self) {
        self.page += 1;
        self.y = 0.0;
        self.rows_on_page = 0;
    }
}

struct ColumnCursor {
    page: usize,
    column: usize,
    count: usize,
    /// Content y where the current columns start on `page`.
    top: f64,
    /// Single-column offset that maps to the top of the current column.
    base: f64,
}

impl ColumnCursor {
    fn advance(&mut self) {
        self.column += 1;
        if self.column == self.count {
            self.column = 0;
            self.page += 1;
            self.top = 0.0;
        }
    }
}
