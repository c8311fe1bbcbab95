//! # Line Break Opportunities
//!
//! A [`TextBreaker`] is a stateful scanner: `reset` points it at a new text
//! and rewinds it, then `next` is called until it returns `None`. Offsets are
//! byte offsets into the text; a break at offset `b` means a line may end
//! with `text[..b]` and the next one start at `b`.
//!
//! The line builder never talks to a breaker directly. It takes a
//! [`BreakCursor`] for one run, which resets the breaker, owns the scan for
//! the lifetime of that run, and stops at the first offset that does not
//! move forward.

use log::debug;
use unicode_linebreak::{linebreaks, BreakOpportunity};

/// A pluggable line-break opportunity scanner.
pub trait TextBreaker {
    /// Start scanning `text` from offset 0. Must not leak state from earlier runs.
    fn reset(&mut self, text: &str);

    /// The next break offset after the cursor, or `None` when exhausted.
    fn next(&mut self) -> Option<usize>;
}

/// Breaks exactly at ASCII spaces: one break per space, at the space's offset.
#[derive(Debug, Default, Clone)]
pub struct SimpleBreaker {
    text: String,
    position: usize,
}

impl TextBreaker for SimpleBreaker {
    fn reset(&mut self, text: &str) {
        self.text = text.to_string();
        self.position = 0;
    }

    fn next(&mut self) -> Option<usize> {
        let found = self.text.get(self.position..)?.find(' ')? + self.position;
        self.position = found + 1;
        Some(found)
    }
}

/// Breaks at the end of every maximal run of whitespace, so adjacent
/// whitespace collapses into a single opportunity.
#[derive(Debug, Default, Clone)]
pub struct CollapsedSpaceBreaker {
    text: String,
    position: usize,
}

impl TextBreaker for CollapsedSpaceBreaker {
    fn reset(&mut self, text: &str) {
        self.text = text.to_string();
        self.position = 0;
    }

    fn next(&mut self) -> Option<usize> {
        let rest = self.text.get(self.position..)?;
        let (start, _) = rest.char_indices().find(|(_, c)| c.is_whitespace())?;
        let run = &rest[start..];
        let run_len = run
            .char_indices()
            .find(|(_, c)| !c.is_whitespace())
            .map(|(i, _)| i)
            .unwrap_or(run.len());
        let end = self.position + start + run_len;
        self.position = end;
        Some(end)
    }
}

/// UAX#14 allowed break opportunities via `unicode-linebreak`. Mandatory
/// breaks are reported too; the break at the very end of the text is not.
#[derive(Debug, Default, Clone)]
pub struct UnicodeLineBreaker {
    breaks: Vec<usize>,
    index: usize,
}

impl TextBreaker for UnicodeLineBreaker {
    fn reset(&mut self, text: &str) {
        self.breaks = linebreaks(text)
            .filter(|&(offset, opp)| {
                offset < text.len()
                    && matches!(opp, BreakOpportunity::Allowed | BreakOpportunity::Mandatory)
            })
            .map(|(offset, _)| offset)
            .collect();
        self.index = 0;
    }

    fn next(&mut self) -> Option<usize> {
        let b = self.breaks.get(self.index).copied();
        self.index += 1;
        b
    }
}

/// One run's worth of break offsets, scanned from a borrowed breaker.
///
/// An offset that does not move forward, runs past the end or splits a
/// UTF-8 sequence ends the iteration.
pub struct BreakCursor<'a> {
    breaker: &'a mut dyn TextBreaker,
    text: &'a str,
    last: Option<usize>,
    done: bool,
}

impl<'a> BreakCursor<'a> {
    pub fn new(breaker: &'a mut dyn TextBreaker, text: &'a str) -> Self {
        breaker.reset(text);
        Self {
            breaker,
            text,
            last: None,
            done: false,
        }
    }
}

impl Iterator for BreakCursor<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.done {
            return None;
        }
        let Some(offset) = self.breaker.next() else {
            self.done = true;
            return None;
        };
        let advances = self.last.is_none_or(|last| offset > last);
        if !advances || offset > self.text.len() || !self.text.is_char_boundary(offset) {
            debug!(
                "breaker returned offset {} after {:?} for text of {} bytes; treating as exhausted",
                offset,
                self.last,
                self.text.len()
            );
            self.done = true;
            return None;
        }
        self.last = Some(offset);
        Some(offset)
    }
}
