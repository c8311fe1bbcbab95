//! # BiDi Text Support
//!
//! Splitting a paragraph into directional runs and computing their visual
//! order, behind two small traits so a different algorithm can be swapped in
//! without touching the line builder.
//!
//! The pipeline:
//! 1. The splitter analyzes the whole paragraph once → directional runs
//! 2. The line builder breaks lines, then slices the runs at line bounds
//! 3. The reorderer turns each line's runs into visual order (UAX#9 L2)
//! 4. Characters of right-to-left runs are reversed and mirrored

use crate::style::Direction;
use std::ops::Range;
use unicode_bidi::{BidiInfo, Level};

/// A maximal substring of one embedding level, in logical order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectionalRun {
    /// Byte range in the paragraph text.
    pub range: Range<usize>,
    /// BiDi embedding level (even = LTR, odd = RTL).
    pub level: u8,
}

impl DirectionalRun {
    pub fn is_rtl(&self) -> bool {
        self.level % 2 == 1
    }

    pub fn direction(&self) -> Direction {
        if self.is_rtl() {
            Direction::Rtl
        } else {
            Direction::Ltr
        }
    }
}

/// Splits a paragraph into directional runs.
pub trait BidiSplitter {
    /// Runs covering all of `text` in logical order. Empty text yields no runs.
    fn split(&mut self, text: &str, base: Direction) -> Vec<DirectionalRun>;
}

/// Computes the visual order of a line's runs and mirrors characters.
pub trait BidiReorderer {
    /// A permutation: `visual[i]` is the logical index of the run displayed
    /// `i`-th from the left.
    fn reorder(&self, runs: &[DirectionalRun]) -> Vec<usize>;

    /// The glyph to display for `ch` inside a right-to-left run.
    fn mirror(&self, ch: char) -> char {
        mirror_char(ch)
    }
}

/// No bidi analysis: the whole paragraph is one run in the base direction.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBidiSplitter;

impl BidiSplitter for NoBidiSplitter {
    fn split(&mut self, text: &str, base: Direction) -> Vec<DirectionalRun> {
        if text.is_empty() {
            return vec![];
        }
        vec![DirectionalRun {
            range: 0..text.len(),
            level: if base.is_rtl() { 1 } else { 0 },
        }]
    }
}

/// UAX#9 analysis via `unicode-bidi`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnicodeBidiSplitter;

impl BidiSplitter for UnicodeBidiSplitter {
    fn split(&mut self, text: &str, base: Direction) -> Vec<DirectionalRun> {
        if text.is_empty() {
            return vec![];
        }
        if is_pure_ltr(text, base) {
            return NoBidiSplitter.split(text, base);
        }

        let para_level = match base {
            Direction::Ltr => Level::ltr(),
            Direction::Rtl => Level::rtl(),
        };

        // BidiInfo splits paragraphs at separators; levels are still indexed
        // by byte over the whole text, which is all we need here.
        let bidi_info = BidiInfo::new(text, Some(para_level));
        let levels = &bidi_info.levels;

        let mut runs: Vec<DirectionalRun> = Vec::new();
        for (byte_idx, ch) in text.char_indices() {
            let level = levels
                .get(byte_idx)
                .copied()
                .unwrap_or(para_level)
                .number();
            let end = byte_idx + ch.len_utf8();
            match runs.last_mut() {
                Some(run) if run.level == level => run.range.end = end,
                _ => runs.push(DirectionalRun {
                    range: byte_idx..end,
                    level,
                }),
            }
        }
        runs
    }
}

/// The standard reordering algorithm (UAX#9 rule L2) over run levels.
#[derive(Debug, Default, Clone, Copy)]
pub struct LevelReorderer;

impl BidiReorderer for LevelReorderer {
    fn reorder(&self, runs: &[DirectionalRun]) -> Vec<usize> {
        let levels: Vec<u8> = runs.iter().map(|r| r.level).collect();
        reorder_levels(&levels)
    }
}

/// Visual order for a sequence of levels: from the highest level down to the
/// lowest odd level, reverse every maximal sequence at that level or higher.
pub fn reorder_levels(levels: &[u8]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..levels.len()).collect();
    let Some(&max_level) = levels.iter().max() else {
        return order;
    };
    let min_level = levels.iter().copied().min().unwrap_or(0);
    let lowest_odd = if min_level % 2 == 1 {
        min_level
    } else {
        min_level + 1
    };
    if max_level < lowest_odd {
        return order;
    }

    let mut current = max_level;
    loop {
        let mut i = 0;
        while i < order.len() {
            if levels[order[i]] >= current {
                let start = i;
                while i < order.len() && levels[order[i]] >= current {
                    i += 1;
                }
                order[start..i].reverse();
            } else {
                i += 1;
            }
        }
        if current == lowest_odd {
            break;
        }
        current -= 1;
    }
    order
}

/// Bidi_Mirroring_Glyph for the paired punctuation that shows up in practice.
pub fn mirror_char(ch: char) -> char {
    match ch {
        '(' => ')',
        ')' => '(',
        '[' => ']',
        ']' => '[',
        '{' => '}',
        '}' => '{',
        '<' => '>',
        '>' => '<',
        '«' => '»',
        '»' => '«',
        '‹' => '›',
        '›' => '‹',
        '≤' => '≥',
        '≥' => '≤',
        '⁅' => '⁆',
        '⁆' => '⁅',
        '⟨' => '⟩',
        '⟩' => '⟨',
        '〈' => '〉',
        '〉' => '〈',
        '﴾' => '﴿',
        '﴿' => '﴾',
        _ => ch,
    }
}

/// Check if text is purely LTR (no RTL characters at all).
/// A fast path to skip bidi analysis for the common case.
pub fn is_pure_ltr(text: &str, direction: Direction) -> bool {
    if direction.is_rtl() {
        return false;
    }
    !text.chars().any(is_rtl_char)
}

/// Check if a character has an RTL BiDi class (R, AL, or AN), by block.
fn is_rtl_char(ch: char) -> bool {
    matches!(ch,
        '\u{0590}'..='\u{08FF}' |  // Hebrew, Arabic, Syriac, Thaana, NKo, Samaritan, Mandaic
        '\u{FB1D}'..='\u{FDFF}' |  // Hebrew and Arabic Presentation Forms-A
        '\u{FE70}'..='\u{FEFF}' |  // Arabic Presentation Forms-B
        '\u{10800}'..='\u{10FFF}' |
        '\u{1E800}'..='\u{1EEFF}' |
        '\u{200F}' | '\u{202B}' | '\u{202E}' | '\u{2067}'
    )
}
