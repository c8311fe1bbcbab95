//! # Text Layout
//!
//! Greedy line breaking over pluggable break opportunities, bidi reordering
//! per line, font fallback per character, letter-spacing and justification.
//!
//! A paragraph is a sequence of inline spans. The spans are concatenated
//! first and the breaker runs once over the whole paragraph, so a span
//! boundary is never a break opportunity by itself; only the breaker's
//! offsets and preserved newlines are.

pub mod bidi;
pub mod breaker;

use std::ops::Range;

use serde::Serialize;

use crate::font::FontContext;
use crate::geometry::EPSILON;
use crate::style::{Direction, ResolvedStyle, TextAlign, WordWrap};
use bidi::{BidiReorderer, BidiSplitter, DirectionalRun, LevelReorderer, NoBidiSplitter};
use breaker::{BreakCursor, TextBreaker, UnicodeLineBreaker};

/// One styled piece of a paragraph.
#[derive(Debug, Clone)]
pub struct InlineSpan {
    pub text: String,
    pub style: ResolvedStyle,
}

/// The input of the line builder.
#[derive(Debug, Clone)]
pub struct Paragraph {
    pub spans: Vec<InlineSpan>,
    /// Paragraph-level properties: alignment, direction, white-space, word-wrap.
    pub style: ResolvedStyle,
}

impl Paragraph {
    /// A paragraph of a single span styled like the paragraph itself.
    pub fn from_text(text: &str, style: ResolvedStyle) -> Self {
        Self {
            spans: vec![InlineSpan {
                text: text.to_string(),
                style: style.clone(),
            }],
            style,
        }
    }
}

/// A laid-out line.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Line {
    /// Byte range of the line's content in the paragraph text, trailing
    /// whitespace excluded.
    pub range: Range<usize>,
    /// The content in logical order.
    pub text: String,
    /// Glyph runs in visual order, left to right.
    pub runs: Vec<GlyphRun>,
    /// Advance of the content without justification.
    pub natural_width: f64,
    /// Advance including justification.
    pub width: f64,
    /// Offset of the first glyph from the line box's left edge (alignment).
    pub x_offset: f64,
    /// Extra space added at interior break points; never at the line end.
    pub justification: Vec<JustifyGap>,
    /// The line was ended by a preserved newline.
    pub hard_break: bool,
}

impl Line {
    pub fn justification_total(&self) -> f64 {
        self.justification.iter().map(|g| g.extra).sum()
    }

    /// Whether the line paints anything.
    pub fn has_ink(&self) -> bool {
        self.runs
            .iter()
            .any(|r| r.glyphs.iter().any(|g| !g.ch.is_whitespace()))
    }

    /// Horizontal extent of the glyphs relative to the line box's left edge.
    pub fn extent(&self) -> (f64, f64) {
        (self.x_offset, self.x_offset + self.width)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JustifyGap {
    /// The break offset the space is added at.
    pub offset: usize,
    pub extra: f64,
}

/// Consecutive glyphs sharing font, direction and span.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlyphRun {
    pub font_family: String,
    pub font_size: f64,
    pub direction: Direction,
    pub level: u8,
    /// The chain had no font with these glyphs; the renderer draws missing-glyph boxes.
    pub missing_glyph: bool,
    pub span: usize,
    pub x: f64,
    pub width: f64,
    pub glyphs: Vec<PositionedGlyph>,
}

impl GlyphRun {
    /// The displayed characters, in visual order.
    pub fn text(&self) -> String {
        self.glyphs.iter().map(|g| g.ch).collect()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedGlyph {
    /// The displayed character (mirrored inside RTL runs).
    pub ch: char,
    /// Byte offset of the source character in the paragraph.
    pub source: usize,
    pub x: f64,
    /// Advance including letter-spacing.
    pub advance: f64,
}

/// Whitespace that collapses in normal mode and hangs at line ends.
fn is_collapsible(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r' | '\u{c}')
}

/// A measured character of the prepared paragraph text.
struct Cluster<'a> {
    ch: char,
    byte: usize,
    span: usize,
    advance: f64,
    family: &'a str,
    missing: bool,
}

/// A line as a char-index range before glyph assembly. `end` includes the
/// whitespace hanging at the end of the line.
struct LineSpan {
    start: usize,
    end: usize,
    hard_break: bool,
}

/// The line builder: a breaker, a bidi splitter and a reorderer.
pub struct TextLayout {
    breaker: Box<dyn TextBreaker + Send>,
    splitter: Box<dyn BidiSplitter + Send>,
    reorderer: Box<dyn BidiReorderer + Send>,
}

impl Default for TextLayout {
    fn default() -> Self {
        Self::new(
            Box::new(UnicodeLineBreaker::default()),
            Box::new(NoBidiSplitter),
            Box::new(LevelReorderer),
        )
    }
}

impl TextLayout {
    pub fn new(
        breaker: Box<dyn TextBreaker + Send>,
        splitter: Box<dyn BidiSplitter + Send>,
        reorderer: Box<dyn BidiReorderer + Send>,
    ) -> Self {
        Self {
            breaker,
            splitter,
            reorderer,
        }
    }

    /// Break a paragraph into lines that fit within `max_width` where possible.
    pub fn layout(
        &mut self,
        fonts: &FontContext,
        paragraph: &Paragraph,
        max_width: f64,
    ) -> Vec<Line> {
        let style = &paragraph.style;
        let (text, span_of) = prepare_text(paragraph);
        if text.is_empty() {
            return vec![];
        }

        let clusters: Vec<Cluster> = text
            .char_indices()
            .zip(span_of.iter())
            .map(|((byte, ch), &span)| {
                let span_style = &paragraph.spans[span].style;
                if ch == '\n' {
                    return Cluster {
                        ch,
                        byte,
                        span,
                        advance: 0.0,
                        family: "",
                        missing: false,
                    };
                }
                let g = fonts.resolve(ch, &span_style.font_family, span_style.font_size);
                Cluster {
                    ch,
                    byte,
                    span,
                    advance: g.advance + span_style.letter_spacing,
                    family: g.family,
                    missing: g.missing,
                }
            })
            .collect();
        let n = clusters.len();
        let byte_to_char = build_byte_to_char_map(&text);

        let nowrap = |i: usize| !paragraph.spans[clusters[i].span].style.white_space.wraps();

        // allowed[i]: a line may end before char i
        let mut allowed = vec![false; n + 1];
        if style.white_space.wraps() {
            for offset in BreakCursor::new(self.breaker.as_mut(), &text) {
                let ci = byte_to_char[offset];
                if ci == 0 || ci >= n {
                    continue;
                }
                let inside_nowrap =
                    clusters[ci - 1].span == clusters[ci].span && nowrap(ci);
                if !inside_nowrap {
                    allowed[ci] = true;
                }
            }
        }

        let mut prefix = Vec::with_capacity(n + 1);
        let mut running = 0.0;
        prefix.push(running);
        for c in &clusters {
            running += c.advance;
            prefix.push(running);
        }
        let width_of = |a: usize, b: usize| prefix[b] - prefix[a];

        let spans = self.break_lines(&clusters, &allowed, &prefix, &nowrap, style, max_width);

        let para_runs = self.splitter.split(&text, style.direction);
        let line_count = spans.len();
        spans
            .iter()
            .enumerate()
            .map(|(idx, ls)| {
                let mut content_end = ls.end;
                while content_end > ls.start && is_collapsible(clusters[content_end - 1].ch) {
                    content_end -= 1;
                }
                let byte_start = clusters.get(ls.start).map(|c| c.byte).unwrap_or(text.len());
                let byte_end = clusters.get(content_end).map(|c| c.byte).unwrap_or(text.len());
                let natural_width = width_of(ls.start, content_end);

                let justify = matches!(style.text_align, TextAlign::Justify)
                    && idx + 1 < line_count
                    && !ls.hard_break;
                let gaps: Vec<usize> = if justify {
                    (ls.start + 1..content_end).filter(|&ci| allowed[ci]).collect()
                } else {
                    vec![]
                };
                let extras = distribute(max_width - natural_width, gaps.len());
                // extra space after logical char (ci - 1)
                let mut gap_after = vec![0.0; n];
                let justification: Vec<JustifyGap> = gaps
                    .iter()
                    .zip(extras.iter())
                    .map(|(&ci, &extra)| {
                        gap_after[ci - 1] = extra;
                        JustifyGap {
                            offset: clusters[ci].byte,
                            extra,
                        }
                    })
                    .collect();
                let width = natural_width + extras.iter().sum::<f64>();
                let x_offset = align_offset(style, justify && !gaps.is_empty(), width, max_width);

                let line_runs = clip_runs(&para_runs, byte_start..byte_end);
                let runs = self.assemble_runs(
                    &clusters,
                    &byte_to_char,
                    &line_runs,
                    &gap_after,
                    paragraph,
                    x_offset,
                );

                Line {
                    range: byte_start..byte_end,
                    text: text[byte_start..byte_end].to_string(),
                    runs,
                    natural_width,
                    width,
                    x_offset,
                    justification,
                    hard_break: ls.hard_break,
                }
            })
            .collect()
    }

    /// The greedy pass: char-index line spans.
    fn break_lines(
        &self,
        clusters: &[Cluster],
        allowed: &[bool],
        prefix: &[f64],
        nowrap: &dyn Fn(usize) -> bool,
        style: &ResolvedStyle,
        max_width: f64,
    ) -> Vec<LineSpan> {
        let n = clusters.len();
        let wraps = style.white_space.wraps();
        let break_word = matches!(style.word_wrap, WordWrap::BreakWord);
        let width_of = |a: usize, b: usize| prefix[b] - prefix[a];

        let mut lines = Vec::new();
        let mut start = 0;
        let mut last_break: Option<usize> = None;

        for i in 0..n {
            let ch = clusters[i].ch;
            if ch == '\n' {
                lines.push(LineSpan {
                    start,
                    end: i,
                    hard_break: true,
                });
                start = i + 1;
                last_break = None;
                continue;
            }
            if i > start && allowed[i] {
                last_break = Some(i);
            }
            if !wraps || is_collapsible(ch) {
                continue;
            }

            loop {
                let overflow = i > start && width_of(start, i + 1) > max_width + EPSILON;
                if !overflow {
                    break;
                }
                // Known limitation: a nowrap span that overflows stays on
                // the current line instead of moving to the next one.
                if nowrap(i) {
                    break;
                }
                if let Some(bp) = last_break.filter(|&bp| bp > start) {
                    let mut next = bp;
                    while next < i && is_collapsible(clusters[next].ch) {
                        next += 1;
                    }
                    lines.push(LineSpan {
                        start,
                        end: next,
                        hard_break: false,
                    });
                    start = next;
                    last_break = None;
                    continue;
                }
                if break_word {
                    // Hard split: as many chars as fit, at least one.
                    let mut j = start + 1;
                    while j < i && width_of(start, j + 1) <= max_width + EPSILON {
                        j += 1;
                    }
                    lines.push(LineSpan {
                        start,
                        end: j,
                        hard_break: false,
                    });
                    start = j;
                    continue;
                }
                break;
            }
        }

        if start < n {
            lines.push(LineSpan {
                start,
                end: n,
                hard_break: false,
            });
        }
        lines
    }

    /// Build the visual glyph runs of one line.
    fn assemble_runs(
        &self,
        clusters: &[Cluster],
        byte_to_char: &[usize],
        line_runs: &[DirectionalRun],
        gap_after: &[f64],
        paragraph: &Paragraph,
        x_offset: f64,
    ) -> Vec<GlyphRun> {
        let mut runs: Vec<GlyphRun> = Vec::new();
        let mut x = x_offset;

        for logical in self.reorderer.reorder(line_runs) {
            let Some(dir_run) = line_runs.get(logical) else {
                continue;
            };
            let first = byte_to_char[dir_run.range.start];
            let last = byte_to_char[dir_run.range.end];
            let indices: Vec<usize> = if dir_run.is_rtl() {
                (first..last).rev().collect()
            } else {
                (first..last).collect()
            };

            for ci in indices {
                let c = &clusters[ci];
                // Logical "after" is visual left in an RTL run.
                let ch = if dir_run.is_rtl() {
                    x += gap_after[ci];
                    self.reorderer.mirror(c.ch)
                } else {
                    c.ch
                };
                let glyph = PositionedGlyph {
                    ch,
                    source: c.byte,
                    x,
                    advance: c.advance,
                };
                x += c.advance;
                if !dir_run.is_rtl() {
                    x += gap_after[ci];
                }

                let same_run = runs.last().is_some_and(|r| {
                    r.span == c.span
                        && r.font_family == c.family
                        && r.missing_glyph == c.missing
                        && r.level == dir_run.level
                });
                if !same_run {
                    runs.push(GlyphRun {
                        font_family: c.family.to_string(),
                        font_size: paragraph.spans[c.span].style.font_size,
                        direction: dir_run.direction(),
                        level: dir_run.level,
                        missing_glyph: c.missing,
                        span: c.span,
                        x: glyph.x,
                        width: 0.0,
                        glyphs: Vec::new(),
                    });
                }
                if let Some(run) = runs.last_mut() {
                    run.width = x - run.x;
                    run.glyphs.push(glyph);
                }
            }
        }
        runs
    }
}

/// Concatenate spans, collapsing whitespace unless it is preserved.
/// Returns the text and the span index of every char.
fn prepare_text(paragraph: &Paragraph) -> (String, Vec<usize>) {
    let preserve = paragraph.style.white_space.preserves();
    let mut text = String::new();
    let mut span_of = Vec::new();
    // Starts true so leading whitespace is dropped in collapse mode.
    let mut prev_space = true;

    for (si, span) in paragraph.spans.iter().enumerate() {
        for ch in span.text.chars() {
            if preserve {
                if ch != '\r' {
                    text.push(ch);
                    span_of.push(si);
                }
            } else if is_collapsible(ch) {
                if !prev_space {
                    text.push(' ');
                    span_of.push(si);
                    prev_space = true;
                }
            } else {
                text.push(ch);
                span_of.push(si);
                prev_space = false;
            }
        }
    }
    (text, span_of)
}

/// Split `shortfall` over `k` gaps so the parts sum to exactly `shortfall`.
pub fn distribute(shortfall: f64, k: usize) -> Vec<f64> {
    if k == 0 || shortfall <= 0.0 {
        return vec![0.0; k];
    }
    let each = shortfall / k as f64;
    let mut parts = vec![each; k];
    let rest: f64 = parts[..k - 1].iter().sum();
    parts[k - 1] = shortfall - rest;
    parts
}

fn align_offset(style: &ResolvedStyle, justified: bool, width: f64, max_width: f64) -> f64 {
    let rtl = style.direction.is_rtl();
    if width > max_width + EPSILON {
        // Overflowing lines stick to the start edge.
        return if rtl { max_width - width } else { 0.0 };
    }
    if justified {
        return 0.0;
    }
    let align = match (style.text_align, rtl) {
        (TextAlign::Start | TextAlign::Justify, false) | (TextAlign::End, true) => TextAlign::Left,
        (TextAlign::Start | TextAlign::Justify, true) | (TextAlign::End, false) => TextAlign::Right,
        (other, _) => other,
    };
    match align {
        TextAlign::Right => max_width - width,
        TextAlign::Center => (max_width - width) / 2.0,
        _ => 0.0,
    }
}

/// Restrict paragraph runs to a line's byte range.
fn clip_runs(runs: &[DirectionalRun], range: Range<usize>) -> Vec<DirectionalRun> {
    runs.iter()
        .filter_map(|r| {
            let start = r.range.start.max(range.start);
            let end = r.range.end.min(range.end);
            (start < end).then(|| DirectionalRun {
                range: start..end,
                level: r.level,
            })
        })
        .collect()
}

/// Build a byte-offset → char-index map for a string.
fn build_byte_to_char_map(text: &str) -> Vec<usize> {
    let mut map = vec![0usize; text.len() + 1];
    let mut char_idx = 0;
    for (byte_idx, ch) in text.char_indices() {
        for slot in &mut map[byte_idx..byte_idx + ch.len_utf8()] {
            *slot = char_idx;
        }
        char_idx += 1;
    }
    map[text.len()] = char_idx;
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::FontMetrics;
    use crate::style::{Style, WhiteSpace};
    use bidi::UnicodeBidiSplitter;
    use breaker::{CollapsedSpaceBreaker, SimpleBreaker};

    /// Every glyph 10pt wide at size 10, Latin only; "Arabic" covers Arabic at 8pt.
    fn fonts() -> FontContext {
        let mut ctx = FontContext::new();
        ctx.registry_mut().register_metrics(
            "TestFont",
            FontMetrics::fixed_with_coverage(1.0, vec!['\u{0}'..='\u{24F}']),
        );
        ctx.registry_mut().register_metrics(
            "Arabic",
            FontMetrics::fixed_with_coverage(0.8, vec!['\u{600}'..='\u{6FF}']),
        );
        ctx
    }

    fn style(f: impl FnOnce(&mut Style)) -> ResolvedStyle {
        let mut s = Style {
            font_family: Some(vec!["TestFont".into(), "Arabic".into()]),
            font_size: Some(10.0),
            ..Default::default()
        };
        f(&mut s);
        s.resolve(&ResolvedStyle::root(Direction::Ltr))
    }

    fn simple() -> TextLayout {
        TextLayout::new(
            Box::new(SimpleBreaker::default()),
            Box::new(NoBidiSplitter),
            Box::new(LevelReorderer),
        )
    }

    fn texts(lines: &[Line]) -> Vec<&str> {
        lines.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn single_line() {
        let lines = simple().layout(&fonts(), &Paragraph::from_text("Hello", style(|_| {})), 200.0);
        assert_eq!(texts(&lines), vec!["Hello"]);
        assert_eq!(lines[0].width, 50.0);
    }

    #[test]
    fn breaks_at_last_space_before_overflow() {
        let lines = simple().layout(
            &fonts(),
            &Paragraph::from_text("aaa bbb ccc", style(|_| {})),
            75.0,
        );
        assert_eq!(texts(&lines), vec!["aaa bbb", "ccc"]);
        assert_eq!(lines[0].natural_width, 70.0);
    }

    #[test]
    fn empty_paragraph_has_no_lines() {
        let lines = simple().layout(&fonts(), &Paragraph::from_text("   ", style(|_| {})), 100.0);
        assert!(lines.is_empty());
    }

    #[test]
    fn long_word_overflows_by_default() {
        let lines = simple().layout(
            &fonts(),
            &Paragraph::from_text("ab abcdefghij", style(|_| {})),
            50.0,
        );
        assert_eq!(texts(&lines), vec!["ab", "abcdefghij"]);
        assert_eq!(lines[1].width, 100.0);
    }

    #[test]
    fn break_word_starts_own_line_then_splits() {
        let lines = simple().layout(
            &fonts(),
            &Paragraph::from_text(
                "ab abcdefghijkl",
                style(|s| s.word_wrap = Some(WordWrap::BreakWord)),
            ),
            50.0,
        );
        assert_eq!(texts(&lines), vec!["ab", "abcde", "fghij", "kl"]);
        assert!(lines.iter().all(|l| l.width <= 50.0));
    }

    #[test]
    fn pre_wrap_honors_newlines_and_keeps_spaces() {
        let lines = simple().layout(
            &fonts(),
            &Paragraph::from_text(
                "a  b\n\nc",
                style(|s| s.white_space = Some(WhiteSpace::PreWrap)),
            ),
            500.0,
        );
        assert_eq!(texts(&lines), vec!["a  b", "", "c"]);
        assert!(lines[0].hard_break && lines[1].hard_break);
    }

    #[test]
    fn normal_collapses_whitespace() {
        let lines = simple().layout(
            &fonts(),
            &Paragraph::from_text("  a \n\t b  ", style(|_| {})),
            500.0,
        );
        assert_eq!(texts(&lines), vec!["a b"]);
    }

    #[test]
    fn nowrap_paragraph_never_wraps() {
        let lines = simple().layout(
            &fonts(),
            &Paragraph::from_text(
                "aaa bbb ccc",
                style(|s| s.white_space = Some(WhiteSpace::NoWrap)),
            ),
            50.0,
        );
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].width, 110.0);
    }

    #[test]
    fn span_boundary_is_not_a_break_opportunity() {
        let st = style(|_| {});
        let para = Paragraph {
            spans: vec![
                InlineSpan {
                    text: "aa abc".into(),
                    style: st.clone(),
                },
                InlineSpan {
                    text: "def".into(),
                    style: st.clone(),
                },
            ],
            style: st,
        };
        let lines = simple().layout(&fonts(), &para, 70.0);
        assert_eq!(texts(&lines), vec!["aa", "abcdef"]);
    }

    #[test]
    fn nowrap_span_stays_on_overflowing_line() {
        // Known limitation: the nowrap span does not move to the next line
        // even though it would fit there.
        let st = style(|_| {});
        let para = Paragraph {
            spans: vec![
                InlineSpan {
                    text: "aaa ".into(),
                    style: st.clone(),
                },
                InlineSpan {
                    text: "bb cc".into(),
                    style: style(|s| s.white_space = Some(WhiteSpace::NoWrap)),
                },
                InlineSpan {
                    text: " dd".into(),
                    style: st.clone(),
                },
            ],
            style: st,
        };
        let lines = simple().layout(&fonts(), &para, 60.0);
        assert_eq!(texts(&lines), vec!["aaa bb cc", "dd"]);
        assert!(lines[0].width > 60.0);
    }

    #[test]
    fn justification_sums_to_shortfall_and_skips_line_end() {
        let lines = TextLayout::new(
            Box::new(CollapsedSpaceBreaker::default()),
            Box::new(NoBidiSplitter),
            Box::new(LevelReorderer),
        )
        .layout(
            &fonts(),
            &Paragraph::from_text(
                "aa bb cc dd ee ff gg",
                style(|s| s.text_align = Some(TextAlign::Justify)),
            ),
            97.0,
        );
        assert_eq!(texts(&lines), vec!["aa bb cc", "dd ee ff", "gg"]);
        let first = &lines[0];
        assert_eq!(first.justification.len(), 2);
        let total = first.justification_total();
        assert_eq!(total, 97.0 - first.natural_width);
        assert_eq!(first.width, 97.0);
        // The trailing space of the line hangs and gets no extra space.
        let last_glyph = first.runs.last().unwrap().glyphs.last().unwrap();
        assert_eq!(last_glyph.ch, 'c');
        assert!((last_glyph.x + last_glyph.advance - 97.0).abs() < 1e-9);
        // Last line is not justified.
        assert!(lines[2].justification.is_empty());
    }

    #[test]
    fn rtl_justification_widens_the_space_not_the_word() {
        let lines = simple().layout(
            &fonts(),
            &Paragraph::from_text(
                "ab cd ef",
                style(|s| {
                    s.text_align = Some(TextAlign::Justify);
                    s.direction = Some(Direction::Rtl);
                }),
            ),
            70.0,
        );
        assert_eq!(texts(&lines), vec!["ab cd", "ef"]);
        let glyphs: Vec<(char, f64)> = lines[0]
            .runs
            .iter()
            .flat_map(|r| r.glyphs.iter().map(|g| (g.ch, g.x)))
            .collect();
        assert_eq!(
            glyphs,
            vec![('d', 0.0), ('c', 10.0), (' ', 20.0), ('b', 50.0), ('a', 60.0)]
        );
        // Letters of one word stay adjacent.
        for pair in glyphs.windows(2) {
            let (left, right) = (pair[0], pair[1]);
            if left.0 != ' ' && right.0 != ' ' {
                assert_eq!(right.1 - left.1, 10.0, "{glyphs:?}");
            }
        }
    }

    #[test]
    fn distribute_has_no_residual() {
        let parts = distribute(10.0, 3);
        assert_eq!(parts.iter().sum::<f64>(), 10.0);
        assert_eq!(distribute(5.0, 0), Vec::<f64>::new());
        assert_eq!(distribute(-1.0, 2), vec![0.0, 0.0]);
    }

    #[test]
    fn letter_spacing_widens_every_glyph() {
        let lines = simple().layout(
            &fonts(),
            &Paragraph::from_text("abc", style(|s| s.letter_spacing = Some(2.0))),
            500.0,
        );
        assert_eq!(lines[0].width, 36.0);
        let xs: Vec<f64> = lines[0].runs[0].glyphs.iter().map(|g| g.x).collect();
        assert_eq!(xs, vec![0.0, 12.0, 24.0]);
    }

    #[test]
    fn fallback_font_splits_glyph_runs() {
        let lines = simple().layout(
            &fonts(),
            &Paragraph::from_text("ab مم", style(|_| {})),
            500.0,
        );
        let families: Vec<&str> = lines[0].runs.iter().map(|r| r.font_family.as_str()).collect();
        assert_eq!(families, vec!["TestFont", "Arabic"]);
        assert_eq!(lines[0].width, 30.0 + 16.0);
    }

    #[test]
    fn missing_glyph_is_flagged() {
        let lines = simple().layout(&fonts(), &Paragraph::from_text("a中", style(|_| {})), 500.0);
        let runs = &lines[0].runs;
        assert_eq!(runs.len(), 2);
        assert!(!runs[0].missing_glyph);
        assert!(runs[1].missing_glyph);
        assert_eq!(runs[1].font_family, "Arabic");
    }

    #[test]
    fn rtl_run_is_reversed_in_place() {
        let mut layout = TextLayout::new(
            Box::new(SimpleBreaker::default()),
            Box::new(UnicodeBidiSplitter),
            Box::new(LevelReorderer),
        );
        let lines = layout.layout(
            &fonts(),
            &Paragraph::from_text("ab (من) cd", style(|_| {})),
            500.0,
        );
        let visual: String = lines[0].runs.iter().map(|r| r.text()).collect();
        assert_eq!(visual, "ab (نم) cd");
        assert!(lines[0].runs.iter().any(|r| r.direction == Direction::Rtl));
    }

    #[test]
    fn rtl_run_mirrors_brackets() {
        let lines = simple().layout(
            &fonts(),
            &Paragraph::from_text("(ab)", style(|s| s.direction = Some(Direction::Rtl))),
            500.0,
        );
        let visual: String = lines[0].runs.iter().map(|r| r.text()).collect();
        assert_eq!(visual, "(ba)");
    }

    #[test]
    fn rtl_paragraph_aligns_right() {
        let mut layout = TextLayout::new(
            Box::new(SimpleBreaker::default()),
            Box::new(UnicodeBidiSplitter),
            Box::new(LevelReorderer),
        );
        let lines = layout.layout(
            &fonts(),
            &Paragraph::from_text("مرحبا", style(|s| s.direction = Some(Direction::Rtl))),
            100.0,
        );
        assert_eq!(lines[0].x_offset, 100.0 - 40.0);
        let visual: String = lines[0].runs.iter().map(|r| r.text()).collect();
        assert_eq!(visual, "ابحرم");
    }

    #[test]
    fn rtl_overflow_extends_left() {
        let mut layout = simple();
        let lines = layout.layout(
            &fonts(),
            &Paragraph::from_text(
                "abcdefghij",
                style(|s| s.direction = Some(Direction::Rtl)),
            ),
            50.0,
        );
        assert_eq!(lines[0].extent(), (-50.0, 50.0));
    }

    #[test]
    fn centered_line() {
        let lines = simple().layout(
            &fonts(),
            &Paragraph::from_text("ab", style(|s| s.text_align = Some(TextAlign::Center))),
            100.0,
        );
        assert_eq!(lines[0].x_offset, 40.0);
    }

    #[test]
    fn byte_map_covers_multibyte() {
        let map = build_byte_to_char_map("aé b");
        assert_eq!(map, vec![0, 1, 1, 2, 3, 4]);
    }
}
