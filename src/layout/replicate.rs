//! # Fixed and Running Elements
//!
//! Runs once the final page sequence is known, shadow pages included, so
//! every page gets its copies in a single pass.
//!
//! Fixed elements are positioned relative to the page viewport and appear
//! on every page where something of theirs is visible. Running elements go
//! into the page margin box of their slot, clipped to it, with
//! `counter(page)` and `counter(pages)` resolved for the page. Shadow pages
//! carry their origin's number; `counter(pages)` counts primary pages.
//! `if-cut-off(text)` expands to `text` on shadow pages and to nothing on
//! primary ones.
//!
//! `target-counter(#id)` is resolved before all of this, anywhere in the
//! document, by paginating again with the page numbers of the previous run.
//!
//! Neither kind takes part in overflow detection of the flow, so neither
//! can cause a shadow page.

use std::collections::HashMap;

use log::{debug, warn};

use super::overflow::classify;
use super::{Anchored, PageBox, Paginator, PlacedBox};
use crate::geometry::{Point, Rect};
use crate::model::{Node, NodeKind};
use crate::style::{Position, RunningSlot};

pub(crate) fn replicate(paginator: &mut Paginator, pages: &mut [PageBox]) {
    if paginator.fixed.is_empty() && paginator.running.is_empty() {
        return;
    }
    let pages_total = pages.iter().filter(|p| !p.is_shadow()).count();
    let fixed = std::mem::take(&mut paginator.fixed);
    let running = std::mem::take(&mut paginator.running);

    for page in pages.iter_mut() {
        for anchored in &fixed {
            if let Some(placed) = place_fixed(paginator, anchored, page, pages_total) {
                page.fixed.push(placed);
            }
        }
        for anchored in &running {
            let placed = place_running(paginator, anchored, page, pages_total);
            page.running.push(placed);
        }
    }

    paginator.fixed = fixed;
    paginator.running = running;
}

fn place_fixed(
    paginator: &mut Paginator,
    anchored: &Anchored,
    page: &PageBox,
    pages_total: usize,
) -> Option<PlacedBox> {
    let node = substitute_counters(&anchored.node, &PageCounters::of(page, pages_total));
    let at = Point::new(page.viewport.x + node.bounds.x, page.viewport.y + node.bounds.y);
    let mut placed = paginator.place_tree(&node, &anchored.parent_style, at, false);
    classify(std::slice::from_mut(&mut placed), &page.viewport);
    if !placed.visible_in(&page.viewport) {
        debug!(
            "fixed {} not visible on page {}",
            anchored.node.id.as_deref().unwrap_or(anchored.node.kind.name()),
            page.index
        );
        return None;
    }
    Some(placed)
}

fn place_running(
    paginator: &mut Paginator,
    anchored: &Anchored,
    page: &PageBox,
    pages_total: usize,
) -> PlacedBox {
    let slot = match anchored.node.style.position {
        Some(Position::Running(slot)) => slot,
        _ => RunningSlot::Header,
    };
    let area = margin_box(page, slot, paginator);
    let node = substitute_counters(&anchored.node, &PageCounters::of(page, pages_total));
    let at = Point::new(area.x + node.bounds.x, area.y + node.bounds.y);
    let mut placed = paginator.place_tree(&node, &anchored.parent_style, at, false);
    // Inside its margin box the running element flows normally.
    placed.position = Position::Static;
    PlacedBox::clip_region("MarginBox", area, vec![placed])
}

/// The margin box of a running slot, in the page's content coordinates.
fn margin_box(page: &PageBox, slot: RunningSlot, paginator: &Paginator) -> Rect {
    let margin = paginator.page.margin;
    let left = page.viewport.x - margin.left;
    match slot {
        RunningSlot::Header => {
            Rect::new(left, page.viewport.y - margin.top, page.width, margin.top)
        }
        RunningSlot::Footer => {
            Rect::new(left, page.viewport.bottom(), page.width, margin.bottom)
        }
    }
}

/// What the page-dependent content functions expand to on one page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageCounters {
    pub page: usize,
    pub pages: usize,
    /// Whether the page is a shadow page.
    pub cut_off: bool,
}

impl PageCounters {
    fn of(page: &PageBox, pages_total: usize) -> Self {
        Self {
            page: page.number,
            pages: pages_total,
            cut_off: page.is_shadow(),
        }
    }
}

/// Resolve `counter(page)`, `counter(pages)` and `if-cut-off(..)` in all
/// text of a subtree.
pub fn substitute_counters(node: &Node, counters: &PageCounters) -> Node {
    map_text(node, &|text: &str| {
        let text = replace_calls(text, "if-cut-off", |args| {
            Some(if counters.cut_off {
                unquote(args).to_string()
            } else {
                String::new()
            })
        });
        replace_calls(&text, "counter", |args| match args.trim() {
            "page" => Some(counters.page.to_string()),
            "pages" => Some(counters.pages.to_string()),
            _ => None,
        })
    })
}

/// Resolve `target-counter(#id)` (or `target-counter(#id, page)`) to the
/// page number `targets` gives for `id`. Unknown ids resolve to nothing.
pub fn resolve_target_counters(node: &Node, targets: &HashMap<String, usize>) -> Node {
    map_text(node, &|text: &str| {
        replace_calls(text, "target-counter", |args| {
            let id = target_id(args)?;
            match targets.get(id) {
                Some(page) => Some(page.to_string()),
                None => {
                    warn!("target-counter: no element with id '{id}'");
                    Some(String::new())
                }
            }
        })
    })
}

/// Whether any text in these subtrees refers to another element's page.
pub(crate) fn uses_target_counters(nodes: &[Node]) -> bool {
    nodes.iter().any(|node| {
        let own = match &node.kind {
            NodeKind::Text { content, spans } => {
                content.contains("target-counter(")
                    || spans.iter().any(|s| s.text.contains("target-counter("))
            }
            _ => false,
        };
        own || uses_target_counters(&node.children)
    })
}

fn target_id(args: &str) -> Option<&str> {
    let mut parts = args.split(',').map(str::trim);
    let id = unquote(parts.next()?);
    match parts.next() {
        None | Some("page") => {}
        Some(_) => return None,
    }
    Some(id.strip_prefix('#').unwrap_or(id))
}

fn unquote(s: &str) -> &str {
    let s = s.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = s.strip_prefix(quote).and_then(|r| r.strip_suffix(quote)) {
            return inner;
        }
    }
    s
}

/// Apply `f` to the content and spans of every text node of a subtree.
fn map_text(node: &Node, f: &dyn Fn(&str) -> String) -> Node {
    let mut out = node.clone();
    if let NodeKind::Text { content, spans } = &mut out.kind {
        *content = f(content);
        for span in spans.iter_mut() {
            span.text = f(&span.text);
        }
    }
    out.children = node.children.iter().map(|c| map_text(c, f)).collect();
    out
}

/// Replace each `name(args)` call in `text` with `expand(args)`. A `None`
/// keeps the call as written. `name` must not be the tail of a longer
/// identifier, so `counter` leaves `target-counter(..)` alone.
fn replace_calls(
    text: &str,
    name: &str,
    mut expand: impl FnMut(&str) -> Option<String>,
) -> String {
    let pattern = format!("{name}(");
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(&pattern) {
        let args_start = start + pattern.len();
        let Some(args_len) = closing_paren(&rest[args_start..]) else {
            break;
        };
        let call_end = args_start + args_len + 1;
        let glued = rest[..start]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_alphanumeric() || c == '-' || c == '_');
        out.push_str(&rest[..start]);
        let value = if glued {
            None
        } else {
            expand(&rest[args_start..args_start + args_len])
        };
        match value {
            Some(value) => out.push_str(&value),
            None => out.push_str(&rest[start..call_end]),
        }
        rest = &rest[call_end..];
    }
    out.push_str(rest);
    out
}

/// Byte offset of the `)` closing an argument list, skipping quoted text.
fn closing_paren(args: &str) -> Option<usize> {
    let mut quote = None;
    for (i, c) in args.char_indices() {
        match (quote, c) {
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, ')') => return Some(i),
            (None, _) => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TextSpan;

    fn counters(page: usize, pages: usize, cut_off: bool) -> PageCounters {
        PageCounters {
            page,
            pages,
            cut_off,
        }
    }

    fn text(content: &str) -> Node {
        Node::new(
            NodeKind::Text {
                content: content.into(),
                spans: vec![],
            },
            Rect::default(),
        )
    }

    fn content(node: &Node) -> &str {
        match &node.kind {
            NodeKind::Text { content, .. } => content,
            _ => "",
        }
    }

    #[test]
    fn counters_are_substituted_everywhere() {
        let mut node = Node::new(
            NodeKind::Text {
                content: "Page counter(page) of counter(pages)".into(),
                spans: vec![TextSpan::new("p. counter(page)")],
            },
            Rect::default(),
        );
        node.children.push(Node::new(
            NodeKind::Text {
                content: "counter(pages)".into(),
                spans: vec![],
            },
            Rect::default(),
        ));
        let out = substitute_counters(&node, &counters(3, 7, false));
        let NodeKind::Text { content, spans } = &out.kind else {
            panic!("kind changed");
        };
        assert_eq!(content, "Page 3 of 7");
        assert_eq!(spans[0].text, "p. 3");
        assert!(matches!(&out.children[0].kind, NodeKind::Text { content, .. } if content == "7"));
    }

    #[test]
    fn text_without_counters_is_unchanged() {
        let node = Node::new(
            NodeKind::Text {
                content: "plain counter text".into(),
                spans: vec![],
            },
            Rect::default(),
        );
        let out = substitute_counters(&node, &counters(1, 1, false));
        assert_eq!(content(&out), "plain counter text");
    }

    #[test]
    fn if_cut_off_shows_only_on_shadow_pages() {
        let node = text("p. counter(page)if-cut-off(' (continued)')");
        let primary = substitute_counters(&node, &counters(2, 5, false));
        let shadow = substitute_counters(&node, &counters(2, 5, true));
        assert_eq!(content(&primary), "p. 2");
        assert_eq!(content(&shadow), "p. 2 (continued)");
    }

    #[test]
    fn target_counter_accepts_hash_quotes_and_page_argument() {
        let targets = HashMap::from([("ch2".to_string(), 4)]);
        let node = text("a target-counter(#ch2) b target-counter('ch2', page) c");
        let out = resolve_target_counters(&node, &targets);
        assert_eq!(content(&out), "a 4 b 4 c");
    }

    #[test]
    fn target_counter_to_unknown_id_is_dropped() {
        let node = text("see target-counter(#nowhere).");
        let out = resolve_target_counters(&node, &HashMap::new());
        assert_eq!(content(&out), "see .");
    }

    #[test]
    fn page_counter_leaves_target_counter_alone() {
        let node = text("target-counter(page) counter(page)");
        let out = substitute_counters(&node, &counters(9, 9, false));
        assert_eq!(content(&out), "target-counter(page) 9");
    }

    #[test]
    fn target_counter_detection_looks_into_spans_and_children() {
        let mut parent = text("plain");
        assert!(!uses_target_counters(std::slice::from_ref(&parent)));
        let mut child = text("");
        if let NodeKind::Text { spans, .. } = &mut child.kind {
            spans.push(TextSpan::new("see target-counter(#x)"));
        }
        parent.children.push(child);
        assert!(uses_target_counters(&[parent]));
    }
}
