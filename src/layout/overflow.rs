//! # Overflow Detection
//!
//! Classifies every placed box of a page by where its marks end up once
//! transforms and ancestor clips are applied.
//!
//! Clips follow containing blocks: an absolutely positioned box escapes the
//! hidden-overflow clips of ancestors below its containing block (the
//! nearest positioned or transformed ancestor); the containing block's own
//! clip still applies. Clip regions are transformed quads, so rotated
//! clips are exact.

use serde::Serialize;

use super::PlacedBox;
use crate::geometry::{Polygon, Rect, Transform};
use crate::style::{Overflow, Position};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum OverflowState {
    /// Everything it paints lies inside the page content rectangle.
    #[default]
    Contained,
    /// Some visible mark lies outside the page content rectangle.
    PageOverflow,
    /// Its geometry extends past an ancestor's hidden-overflow clip, and
    /// what is left visible fits the page.
    ClippedByAncestor,
}

/// Inherited clipping context.
struct Frame<'a> {
    transform: Transform,
    clips: &'a [Polygon],
    /// How many of `clips` apply to absolutely positioned descendants.
    containing_clips: usize,
}

/// Classify `boxes` against `viewport` (content coordinates). Returns the
/// number of boxes in `PageOverflow`.
pub fn classify(boxes: &mut [PlacedBox], viewport: &Rect) -> usize {
    let frame = Frame {
        transform: Transform::IDENTITY,
        clips: &[],
        containing_clips: 0,
    };
    boxes.iter_mut().map(|b| visit(b, &frame, viewport)).sum()
}

fn visit(b: &mut PlacedBox, parent: &Frame, viewport: &Rect) -> usize {
    let escapes = matches!(b.position, Position::Absolute | Position::Fixed);
    let clips = if escapes {
        &parent.clips[..parent.containing_clips]
    } else {
        parent.clips
    };
    let transform = match b.transform {
        Some(own) => own.then(&parent.transform),
        None => parent.transform,
    };

    let raw: Vec<Polygon> = b.marks().iter().map(|r| transform.apply_rect(r)).collect();
    let visible: Vec<Polygon> = raw
        .iter()
        .map(|mark| clips.iter().fold(mark.clone(), |acc, clip| acc.clip(clip)))
        .filter(|mark| !mark.is_empty())
        .collect();
    let geometry = transform.apply_rect(&b.rect);

    b.state = if visible.iter().any(|m| m.extends_outside(viewport)) {
        OverflowState::PageOverflow
    } else if clips.iter().any(|clip| {
        (!b.rect.is_empty() && geometry.extends_beyond(clip))
            || raw.iter().any(|m| m.extends_beyond(clip))
    }) {
        OverflowState::ClippedByAncestor
    } else {
        OverflowState::Contained
    };
    b.visible_marks = visible;

    let mut child_clips = clips.to_vec();
    if b.overflow == Overflow::Hidden {
        child_clips.push(geometry);
    }
    let containing_clips = if b.is_containing_block() {
        child_clips.len()
    } else {
        parent.containing_clips.min(child_clips.len())
    };
    let frame = Frame {
        transform,
        clips: &child_clips,
        containing_clips,
    };

    let own = usize::from(b.state == OverflowState::PageOverflow);
    own + b
        .children
        .iter_mut()
        .map(|child| visit(child, &frame, viewport))
        .sum::<usize>()
}
