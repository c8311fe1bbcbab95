//! # Shadow Pages
//!
//! A primary page whose content overflows sideways gets extra pages right
//! after it, each showing the next page-width strip of the overflow. A
//! shadow page holds only the overflowing boxes, plus their ancestors as
//! non-painting scaffolding so clips and transforms still apply. A strip
//! with nothing visible in it produces no page.

use log::debug;

use super::overflow::{classify, OverflowState};
use super::{PageBox, PageKind, PlacedBox};
use crate::config::{PaginationOptions, ShadowDirection};
use crate::geometry::Rect;

/// Classify every primary page and insert its shadow pages after it.
pub(crate) fn synthesize(primary: Vec<PageBox>, options: &PaginationOptions) -> Vec<PageBox> {
    let mut pages = Vec::with_capacity(primary.len());

    for mut page in primary {
        let viewport = page.viewport;
        let overflowing = classify(&mut page.boxes, &viewport);
        let origin = pages.len();
        page.index = origin;

        let mut shadows = Vec::new();
        if overflowing > 0 {
            for strip in 1..=options.max_shadow_pages {
                let offset = strip as f64 * viewport.width;
                let dx = match options.shadow_direction {
                    ShadowDirection::Ltr => offset,
                    ShadowDirection::Rtl => -offset,
                };
                let strip_rect = viewport.translate(dx, 0.0);
                let boxes = prune(&page.boxes, &strip_rect);
                if boxes.is_empty() {
                    continue;
                }
                debug!("page {} overflows into strip {}", page.number, strip);
                shadows.push(PageBox {
                    index: origin + 1 + shadows.len(),
                    number: page.number,
                    kind: PageKind::Shadow { origin, strip },
                    width: page.width,
                    height: page.height,
                    content: page.content,
                    viewport: strip_rect,
                    boxes,
                    fixed: Vec::new(),
                    running: Vec::new(),
                });
            }
        }

        pages.push(page);
        pages.extend(shadows);
    }
    pages
}

/// The overflowing boxes visible in `strip`, with their ancestors.
fn prune(boxes: &[PlacedBox], strip: &Rect) -> Vec<PlacedBox> {
    boxes.iter().filter_map(|b| prune_box(b, strip)).collect()
}

fn prune_box(b: &PlacedBox, strip: &Rect) -> Option<PlacedBox> {
    let children = prune(&b.children, strip);
    let shows_here =
        b.state == OverflowState::PageOverflow && b.visible_marks.iter().any(|m| m.overlaps(strip));
    if !shows_here && children.is_empty() {
        return None;
    }
    let mut kept = b.shallow();
    kept.children = children;
    if !shows_here {
        kept.paint_self = false;
        kept.lines.clear();
        kept.visible_marks.clear();
    }
    Some(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PageConfig;
    use crate::style::{Color, Overflow, Position};

    fn boxed(id: &str, rect: Rect) -> PlacedBox {
        PlacedBox {
            id: Some(id.into()),
            kind: "Block",
            rect,
            transform: None,
            position: Position::Static,
            overflow: Overflow::Visible,
            z_index: 0,
            background: Some(Color::rgb(0.0, 0.0, 1.0)),
            border_width: 0.0,
            lines: Vec::new(),
            children: Vec::new(),
            paint_self: true,
            state: OverflowState::Contained,
            visible_marks: Vec::new(),
        }
    }

    fn page(boxes: Vec<PlacedBox>) -> PageBox {
        PageBox::primary(0, &PageConfig::default(), boxes)
    }

    fn width() -> f64 {
        PageConfig::default().content_rect().width
    }

    #[test]
    fn contained_page_gets_no_shadow() {
        let pages = synthesize(
            vec![page(vec![boxed("a", Rect::new(0.0, 0.0, 100.0, 10.0))])],
            &PaginationOptions::default(),
        );
        assert_eq!(pages.len(), 1);
    }

    #[test]
    fn overflow_creates_one_shadow_with_only_the_overflowing_box() {
        let w = width();
        let pages = synthesize(
            vec![page(vec![
                boxed("wide", Rect::new(0.0, 0.0, w + 50.0, 10.0)),
                boxed("narrow", Rect::new(0.0, 20.0, 10.0, 10.0)),
            ])],
            &PaginationOptions::default(),
        );
        assert_eq!(pages.len(), 2);
        let shadow = &pages[1];
        assert_eq!(shadow.kind, PageKind::Shadow { origin: 0, strip: 1 });
        assert_eq!(shadow.number, 1);
        assert_eq!(shadow.viewport.x, w);
        assert!(shadow.find("wide").is_some());
        assert!(shadow.find("narrow").is_none());
    }

    #[test]
    fn ancestors_become_scaffolding() {
        let w = width();
        let mut parent = boxed("parent", Rect::new(0.0, 0.0, 100.0, 10.0));
        parent
            .children
            .push(boxed("child", Rect::new(0.0, 0.0, w + 10.0, 10.0)));
        let pages = synthesize(vec![page(vec![parent])], &PaginationOptions::default());
        let scaffold = pages[1].find("parent").unwrap();
        assert!(!scaffold.paint_self);
        assert!(pages[1].find("child").unwrap().paint_self);
    }

    #[test]
    fn strips_limited_by_max_shadow_pages() {
        let w = width();
        let wide = vec![boxed("x", Rect::new(0.0, 0.0, w * 3.5, 10.0))];
        let one = synthesize(vec![page(wide.clone())], &PaginationOptions::default());
        assert_eq!(one.len(), 2);
        let options = PaginationOptions {
            max_shadow_pages: 3,
            ..Default::default()
        };
        let three = synthesize(vec![page(wide)], &options);
        assert_eq!(three.len(), 4);
        assert_eq!(three[3].kind, PageKind::Shadow { origin: 0, strip: 3 });
    }

    #[test]
    fn rtl_strips_extend_left() {
        let w = width();
        let options = PaginationOptions {
            shadow_direction: ShadowDirection::Rtl,
            ..Default::default()
        };
        let right = synthesize(
            vec![page(vec![boxed("r", Rect::new(0.0, 0.0, w + 50.0, 10.0))])],
            &options,
        );
        assert_eq!(right.len(), 1);
        let left = synthesize(
            vec![page(vec![boxed("l", Rect::new(-50.0, 0.0, w, 10.0))])],
            &options,
        );
        assert_eq!(left.len(), 2);
        assert_eq!(left[1].viewport.x, -w);
    }

    #[test]
    fn vertical_overflow_alone_makes_no_shadow() {
        let pages = synthesize(
            vec![page(vec![boxed("tall", Rect::new(0.0, -40.0, 100.0, 30.0))])],
            &PaginationOptions::default(),
        );
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].boxes[0].state, OverflowState::PageOverflow);
    }

    #[test]
    fn shadow_follows_its_origin() {
        let w = width();
        let mut second = page(vec![boxed("b", Rect::new(0.0, 0.0, w + 1.0, 10.0))]);
        second.index = 1;
        second.number = 2;
        let pages = synthesize(
            vec![page(vec![boxed("a", Rect::new(0.0, 0.0, w + 1.0, 10.0))]), second],
            &PaginationOptions::default(),
        );
        let kinds: Vec<PageKind> = pages.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![
                PageKind::Primary,
                PageKind::Shadow { origin: 0, strip: 1 },
                PageKind::Primary,
                PageKind::Shadow { origin: 2, strip: 1 },
            ]
        );
        assert_eq!(pages[3].number, 2);
    }
}
