//! Newline splitting for flat text segments.
//!
//! A segment becomes a sequence of text runs and break markers, one marker
//! per `\n`. Empty runs are never produced, so consecutive newlines yield
//! consecutive markers.

use crate::markup::MarkupSink;
use crate::markup::error::MarkupResult;

/// One piece of a split segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Run<'a> {
    /// Non-empty text without newlines.
    Text(&'a str),
    /// One newline.
    Break,
}

/// Iterator over the runs of a segment.
#[derive(Debug, Clone)]
pub struct LineRuns<'a> {
    rest: &'a str,
    pending_break: bool,
}

/// Split `segment` at newline boundaries.
pub fn split_lines(segment: &str) -> LineRuns<'_> {
    LineRuns {
        rest: segment,
        pending_break: false,
    }
}

impl<'a> Iterator for LineRuns<'a> {
    type Item = Run<'a>;

    fn next(&mut self) -> Option<Run<'a>> {
        if self.pending_break {
            self.pending_break = false;
            return Some(Run::Break);
        }
        if self.rest.is_empty() {
            return None;
        }

        match self.rest.find('\n') {
            Some(0) => {
                self.rest = &self.rest[1..];
                Some(Run::Break)
            }
            Some(i) => {
                let run = &self.rest[..i];
                self.rest = &self.rest[i + 1..];
                self.pending_break = true;
                Some(Run::Text(run))
            }
            None => {
                let run = self.rest;
                self.rest = "";
                Some(Run::Text(run))
            }
        }
    }
}

/// Send the runs of `segment` to `sink`.
pub fn write_runs<S: MarkupSink + ?Sized>(sink: &mut S, segment: &str) -> MarkupResult<()> {
    for run in split_lines(segment) {
        match run {
            Run::Text(text) => sink.text(text)?,
            Run::Break => sink.line_break()?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejoin(segment: &str) -> String {
        split_lines(segment)
            .map(|run| match run {
                Run::Text(t) => t,
                Run::Break => "\n",
            })
            .collect()
    }

    #[test]
    fn splits_text_and_breaks() {
        let runs: Vec<_> = split_lines("one\ntwo").collect();
        assert_eq!(runs, vec![Run::Text("one"), Run::Break, Run::Text("two")]);
    }

    #[test]
    fn consecutive_newlines_give_only_breaks() {
        let runs: Vec<_> = split_lines("\n\na\n").collect();
        assert_eq!(runs, vec![Run::Break, Run::Break, Run::Text("a"), Run::Break]);
    }

    #[test]
    fn empty_segment_yields_nothing() {
        assert_eq!(split_lines("").count(), 0);
    }

    #[test]
    fn no_empty_text_runs() {
        for segment in ["", "\n", "\n\n\n", "a\n\nb", "\nx\n", "trailing\n"] {
            assert!(
                split_lines(segment).all(|run| run != Run::Text("")),
                "empty run in {segment:?}"
            );
        }
    }

    #[test]
    fn round_trip_reconstructs_input() {
        for segment in [
            "",
            "plain",
            "\n",
            "a\nb\nc",
            "\n\nleading",
            "trailing\n\n",
            "windows\r\nline\r\n",
            "ünïcödé\n—\n日本語",
        ] {
            assert_eq!(rejoin(segment), segment);
        }
    }
}
