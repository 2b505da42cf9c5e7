//! Stream-backed channels used by the text and native-binary codecs.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Stdin, Stdout, Write};
use std::path::Path;
use std::str::FromStr;

/// How a handle was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Read,
    Write,
    Append,
}

impl Mode {
    pub fn is_read(self) -> bool {
        self == Mode::Read
    }

    fn options(self) -> OpenOptions {
        let mut opts = OpenOptions::new();
        match self {
            Mode::Read   => opts.read(true),
            Mode::Write  => opts.write(true).create(true).truncate(true),
            Mode::Append => opts.append(true).create(true),
        };
        opts
    }

    pub(crate) fn open_file(self, path: &Path) -> io::Result<File> {
        self.options().open(path)
    }
}

impl FromStr for Mode {
    type Err = String;

    /// Parse a C-style mode string (`"r"`, `"wb"`, `"a+"`, ...) by its first
    /// character.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.chars().next() {
            Some('r') => Ok(Mode::Read),
            Some('w') => Ok(Mode::Write),
            Some('a') => Ok(Mode::Append),
            _         => Err(format!("invalid open mode '{s}'")),
        }
    }
}

/// A byte stream underlying a text or native-binary handle.
///
/// Standard input is locked per read call, never for the life of the handle,
/// so any number of handles may be open on it at once.
#[derive(Debug)]
pub enum Stream {
    Reader(BufReader<File>),
    Writer(BufWriter<File>),
    Stdin(BufReader<Stdin>),
    Stdout(Stdout),
}

impl Stream {
    pub fn open(path: &Path, mode: Mode) -> io::Result<Self> {
        let file = mode.open_file(path)?;
        Ok(match mode {
            Mode::Read => Stream::Reader(BufReader::new(file)),
            _          => Stream::Writer(BufWriter::new(file)),
        })
    }

    pub fn stdio(mode: Mode) -> Self {
        if mode.is_read() {
            Stream::Stdin(BufReader::new(io::stdin()))
        } else {
            Stream::Stdout(io::stdout())
        }
    }

    /// Standard streams are never closed by the registry.
    pub fn is_stdio(&self) -> bool {
        matches!(self, Stream::Stdin(_) | Stream::Stdout(_))
    }

    pub fn reader(&mut self) -> io::Result<&mut dyn BufRead> {
        match self {
            Stream::Reader(r) => Ok(r),
            Stream::Stdin(r)  => Ok(r),
            _                 => Err(not_readable()),
        }
    }

    pub fn writer(&mut self) -> io::Result<&mut dyn Write> {
        match self {
            Stream::Writer(w) => Ok(w),
            Stream::Stdout(w) => Ok(w),
            _                 => Err(not_writable()),
        }
    }

    pub fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            Stream::Reader(r) => r.seek(pos),
            Stream::Writer(w) => w.seek(pos),
            _                 => Err(io::Error::new(io::ErrorKind::Unsupported, "standard streams are not seekable")),
        }
    }

    pub fn position(&mut self) -> io::Result<u64> {
        match self {
            Stream::Reader(r) => r.stream_position(),
            Stream::Writer(w) => w.stream_position(),
            _                 => Err(io::Error::new(io::ErrorKind::Unsupported, "standard streams have no position")),
        }
    }

    /// Advance a read stream by `n` bytes without decoding them.
    pub fn skip(&mut self, n: u64) -> io::Result<()> {
        match self {
            Stream::Reader(r) => {
                let len = r.get_ref().metadata()?.len();
                let pos = r.stream_position()?;
                if pos.saturating_add(n) > len {
                    r.seek(SeekFrom::End(0))?;
                    return Err(io::ErrorKind::UnexpectedEof.into());
                }
                r.seek_relative(n as i64)
            }
            Stream::Stdin(r) => {
                let copied = io::copy(&mut r.by_ref().take(n), &mut io::sink())?;
                if copied < n {
                    return Err(io::ErrorKind::UnexpectedEof.into());
                }
                Ok(())
            }
            _ => Err(not_readable()),
        }
    }

    pub fn flush(&mut self) -> io::Result<()> {
        match self {
            Stream::Writer(w) => w.flush(),
            Stream::Stdout(w) => w.flush(),
            _                 => Ok(()),
        }
    }
}

fn not_readable() -> io::Error { io::Error::new(io::ErrorKind::PermissionDenied, "stream is write-only") }
fn not_writable() -> io::Error { io::Error::new(io::ErrorKind::PermissionDenied, "stream is read-only") }
