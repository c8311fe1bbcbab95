//! # Line Break Decisions
//!
//! Where a paragraph's lines split between two pages. `orphans` is the
//! minimum number of lines left at the bottom of a page, `widows` the
//! minimum carried to the top of the next one.

use crate::geometry::EPSILON;

#[derive(Debug, Clone, PartialEq)]
pub enum BreakDecision {
    /// Every remaining line fits on this page.
    Place,
    /// Nothing should stay here; start on the next page.
    MoveToNextPage,
    /// Keep the first `lines_here` lines on this page.
    Split { lines_here: usize },
}

/// Decide how lines of the given heights share the `remaining` room.
pub fn decide_break(
    remaining: f64,
    heights: &[f64],
    orphans: usize,
    widows: usize,
) -> BreakDecision {
    let total: f64 = heights.iter().sum();
    if total <= remaining + EPSILON {
        return BreakDecision::Place;
    }

    let mut used = 0.0;
    let fit = heights
        .iter()
        .take_while(|&&h| {
            used += h;
            used <= remaining + EPSILON
        })
        .count();

    if fit < orphans {
        return BreakDecision::MoveToNextPage;
    }

    let carried = heights.len() - fit;
    if carried < widows {
        // Pull lines back until the next page has enough.
        let lines_here = fit.saturating_sub(widows - carried);
        if lines_here < orphans.max(1) {
            return BreakDecision::MoveToNextPage;
        }
        return BreakDecision::Split { lines_here };
    }

    BreakDecision::Split { lines_here: fit }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_lines_fit() {
        assert_eq!(decide_break(30.0, &[10.0, 10.0, 10.0], 2, 2), BreakDecision::Place);
    }

    #[test]
    fn split_where_room_ends() {
        assert_eq!(
            decide_break(25.0, &[10.0; 5], 1, 1),
            BreakDecision::Split { lines_here: 2 }
        );
    }

    #[test]
    fn too_few_lines_left_behind_moves_paragraph() {
        assert_eq!(
            decide_break(15.0, &[10.0, 10.0, 10.0], 2, 2),
            BreakDecision::MoveToNextPage
        );
    }

    #[test]
    fn lone_widow_pulls_a_line_over() {
        assert_eq!(
            decide_break(35.0, &[10.0; 4], 2, 2),
            BreakDecision::Split { lines_here: 2 }
        );
    }

    #[test]
    fn widow_pull_may_not_create_orphans() {
        // Two lines fit, one would be carried; pulling one back leaves a
        // single orphan, so the whole paragraph moves.
        assert_eq!(
            decide_break(25.0, &[10.0; 3], 2, 2),
            BreakDecision::MoveToNextPage
        );
    }

    #[test]
    fn no_room_at_all() {
        assert_eq!(decide_break(5.0, &[10.0, 10.0], 1, 1), BreakDecision::MoveToNextPage);
    }
}
