//! Token scanner for text files.
//!
//! Input is split into whitespace-delimited tokens.  A `;` starts a comment
//! that runs to the end of the physical line.  Lines without tokens (blank or
//! comment-only) are skipped.
//!
//! The scanner owns one line buffer plus the queue of token ranges found on
//! that line.  A token returned by [`Scanner::next_token`] borrows the buffer,
//! so it cannot outlive the next call: callers must consume a token before
//! asking for the following one.

use std::collections::VecDeque;
use std::io::BufRead;
use std::ops::Range;

use crate::error::{FioError, Result};

pub const COMMENT_CHAR: u8 = b';';

#[derive(Debug, Default)]
pub struct Scanner {
    line:    String,
    pending: VecDeque<Range<usize>>,
    line_no: u64,
}

impl Scanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the next token, reading further lines from `src` as needed.
    ///
    /// Fails with [`FioError::UnexpectedEof`] when the input ends first.
    pub fn next_token<R: BufRead + ?Sized>(&mut self, src: &mut R) -> Result<&str> {
        loop {
            if let Some(range) = self.pending.pop_front() {
                return Ok(&self.line[range]);
            }
            self.fill(src)?;
        }
    }

    /// Forget the current line and any queued tokens.  Required after the
    /// underlying stream is repositioned.
    pub fn reset(&mut self) {
        self.line.clear();
        self.pending.clear();
    }

    /// Tokens still queued from the current line.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Number of physical lines consumed so far.
    pub fn line_no(&self) -> u64 {
        self.line_no
    }

    fn fill<R: BufRead + ?Sized>(&mut self, src: &mut R) -> Result<()> {
        self.line.clear();
        if src.read_line(&mut self.line)? == 0 {
            return Err(FioError::UnexpectedEof);
        }
        self.line_no += 1;

        let bytes = self.line.as_bytes();
        let end = bytes.iter().position(|&b| b == COMMENT_CHAR).unwrap_or(bytes.len());
        let mut i = 0;
        while i < end {
            while i < end && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            let start = i;
            while i < end && !bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i > start {
                self.pending.push_back(start..i);
            }
        }
        Ok(())
    }
}
