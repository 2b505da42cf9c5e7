//! Error type shared by the registry and the item codecs.
//!
//! Errors fall into two categories:
//!
//! * **data-level** failures caused by the bytes on disk or the OS (short
//!   reads, malformed tokens, write failures).  Callers may recover from these.
//! * **misuse** failures that indicate a caller bug (stale handle, item call
//!   without a selected handle, count/kind mismatch, unsupported format).
//!   [`FioError::is_misuse`] tells them apart.

use std::io;
use std::panic::Location;
use std::path::PathBuf;

use thiserror::Error;

use crate::format::{FormatFamily, FormatTag};
use crate::item::ItemKind;

/// Direction of a failed item call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Read,
    Write,
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Op::Read  => "read",
            Op::Write => "write",
        })
    }
}

#[derive(Error, Debug)]
pub enum FioError {
    // ── Data-level ───────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[source] io::Error),
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("malformed {kind} token {token:?}")]
    Parse { kind: ItemKind, token: String },
    #[error("invalid length {len} (limit {limit})")]
    BadLength { len: i64, limit: i64 },
    #[error("string is not valid UTF-8")]
    InvalidString,
    #[error("string {0:?} cannot be stored as a single text token")]
    UnrepresentableString(String),
    #[error("file {} not found", .0.display())]
    NotFound(PathBuf),
    #[error("trying to {op} {kind} {desc:?} in file {file} ({site}): {source}")]
    Item {
        op:     Op,
        kind:   ItemKind,
        desc:   String,
        file:   String,
        site:   &'static Location<'static>,
        #[source]
        source: Box<FioError>,
    },

    // ── Misuse ───────────────────────────────────────────────────────────────
    #[error("trying to access non-open file {handle} ({site})")]
    InvalidHandle { handle: usize, site: &'static Location<'static> },
    #[error("dispatch not selected: call select before any item call ({site})")]
    NotSelected { site: &'static Location<'static> },
    #[error("can not read/write items to file type {tag} ({site})")]
    UnsupportedFormat { tag: FormatTag, site: &'static Location<'static> },
    #[error("{capability} support is not available in this build")]
    MissingCapability { capability: &'static str },
    #[error("count ({count}) may differ from 1 only for UCHAR or NRVEC, not for {kind} ({site})")]
    BadCount { kind: ItemKind, count: usize, site: &'static Location<'static> },
    #[error("can not seek on file {file} ({site})")]
    NotSeekable { file: String, site: &'static Location<'static> },
    #[error("file {file} was opened without a {family} channel ({site})")]
    ChannelMismatch { file: String, family: FormatFamily, site: &'static Location<'static> },
}

impl FioError {
    /// `true` for errors that indicate a caller bug rather than bad data.
    pub fn is_misuse(&self) -> bool {
        match self {
            FioError::InvalidHandle { .. }
            | FioError::NotSelected { .. }
            | FioError::UnsupportedFormat { .. }
            | FioError::MissingCapability { .. }
            | FioError::BadCount { .. }
            | FioError::NotSeekable { .. }
            | FioError::ChannelMismatch { .. } => true,
            FioError::Item { source, .. } => source.is_misuse(),
            _ => false,
        }
    }

    /// The underlying error with any [`FioError::Item`] context removed.
    pub fn root(&self) -> &FioError {
        match self {
            FioError::Item { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.root(), FioError::UnexpectedEof)
    }
}

impl From<io::Error> for FioError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            FioError::UnexpectedEof
        } else {
            FioError::Io(e)
        }
    }
}

pub type Result<T> = std::result::Result<T, FioError>;
