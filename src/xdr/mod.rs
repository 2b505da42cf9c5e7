//! Portable binary channel: XDR (RFC 4506) primitives over a file.
//!
//! # Encoding
//! Every primitive is big-endian and padded to a multiple of four bytes:
//!
//! | Primitive        | Bytes on disk                         |
//! |------------------|---------------------------------------|
//! | `int` / `u_int`  | 4                                     |
//! | `u_char`         | 4 (widened unsigned int)              |
//! | `u_short`        | 4 (widened unsigned int)              |
//! | `float`          | 4 (IEEE-754 single)                   |
//! | `double`         | 8 (IEEE-754 double)                   |
//! | `string`         | 4-byte length, bytes, zero padding    |
//!
//! The byte stream is identical on every host; no runtime negotiation is
//! ever performed.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::stream::Mode;

/// Size of one XDR unit; every item is padded to a multiple of this.
pub const XDR_UNIT: usize = 4;

#[derive(Debug)]
enum Inner {
    Decode(BufReader<File>),
    Encode(BufWriter<File>),
}

/// An open XDR file.
#[derive(Debug)]
pub struct XdrStream {
    path:  PathBuf,
    inner: Inner,
}

/// Number of zero bytes that follow `len` payload bytes.
pub fn padding(len: usize) -> usize {
    (XDR_UNIT - len % XDR_UNIT) % XDR_UNIT
}

impl XdrStream {
    pub fn open<P: AsRef<Path>>(path: P, mode: Mode) -> io::Result<Self> {
        let path = path.as_ref().to_owned();
        let inner = Self::open_inner(&path, mode)?;
        Ok(Self { path, inner })
    }

    fn open_inner(path: &Path, mode: Mode) -> io::Result<Inner> {
        let file = mode.open_file(path)?;
        Ok(match mode {
            Mode::Read => Inner::Decode(BufReader::new(file)),
            _          => Inner::Encode(BufWriter::new(file)),
        })
    }

    /// Close and open the file again at its start.  Reopening for writing
    /// truncates.
    pub fn reopen(&mut self, read: bool) -> io::Result<()> {
        self.flush()?;
        let mode = if read { Mode::Read } else { Mode::Write };
        self.inner = Self::open_inner(&self.path, mode)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_decoding(&self) -> bool {
        matches!(self.inner, Inner::Decode(_))
    }

    pub fn flush(&mut self) -> io::Result<()> {
        match &mut self.inner {
            Inner::Encode(w) => w.flush(),
            Inner::Decode(_) => Ok(()),
        }
    }

    /// Flush and release the file.
    pub fn close(mut self) -> io::Result<()> {
        self.flush()
    }

    fn w(&mut self) -> io::Result<&mut BufWriter<File>> {
        match &mut self.inner {
            Inner::Encode(w) => Ok(w),
            Inner::Decode(_) => Err(io::Error::new(io::ErrorKind::PermissionDenied, "XDR stream is open for decoding")),
        }
    }

    fn r(&mut self) -> io::Result<&mut BufReader<File>> {
        match &mut self.inner {
            Inner::Decode(r) => Ok(r),
            Inner::Encode(_) => Err(io::Error::new(io::ErrorKind::PermissionDenied, "XDR stream is open for encoding")),
        }
    }

    // ── Encoding ─────────────────────────────────────────────────────────────

    pub fn put_int(&mut self, v: i32) -> io::Result<()> {
        self.w()?.write_i32::<BigEndian>(v)
    }

    pub fn put_uint(&mut self, v: u32) -> io::Result<()> {
        self.w()?.write_u32::<BigEndian>(v)
    }

    pub fn put_u_char(&mut self, v: u8) -> io::Result<()> {
        self.put_uint(u32::from(v))
    }

    pub fn put_u_short(&mut self, v: u16) -> io::Result<()> {
        self.put_uint(u32::from(v))
    }

    pub fn put_float(&mut self, v: f32) -> io::Result<()> {
        self.w()?.write_f32::<BigEndian>(v)
    }

    pub fn put_double(&mut self, v: f64) -> io::Result<()> {
        self.w()?.write_f64::<BigEndian>(v)
    }

    /// Write a counted byte string followed by its padding.
    pub fn put_string(&mut self, bytes: &[u8]) -> io::Result<()> {
        let len = u32::try_from(bytes.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "string too long for XDR"))?;
        let w = self.w()?;
        w.write_u32::<BigEndian>(len)?;
        w.write_all(bytes)?;
        w.write_all(&[0u8; XDR_UNIT][..padding(bytes.len())])
    }

    // ── Decoding ─────────────────────────────────────────────────────────────

    pub fn get_int(&mut self) -> io::Result<i32> {
        self.r()?.read_i32::<BigEndian>()
    }

    pub fn get_uint(&mut self) -> io::Result<u32> {
        self.r()?.read_u32::<BigEndian>()
    }

    pub fn get_u_char(&mut self) -> io::Result<u8> {
        let v = self.get_uint()?;
        u8::try_from(v).map_err(|_| out_of_range("u_char", v))
    }

    pub fn get_u_short(&mut self) -> io::Result<u16> {
        let v = self.get_uint()?;
        u16::try_from(v).map_err(|_| out_of_range("u_short", v))
    }

    pub fn get_float(&mut self) -> io::Result<f32> {
        self.r()?.read_f32::<BigEndian>()
    }

    pub fn get_double(&mut self) -> io::Result<f64> {
        self.r()?.read_f64::<BigEndian>()
    }

    /// Read a counted byte string of at most `max_len` bytes.
    ///
    /// The length prefix is returned as the error payload when it exceeds
    /// `max_len`, so callers can report it.
    pub fn get_string(&mut self, max_len: usize) -> io::Result<Result<Vec<u8>, u32>> {
        let len = self.get_uint()?;
        if len as usize > max_len {
            return Ok(Err(len));
        }
        let r = self.r()?;
        let mut buf = Vec::new();
        r.take(u64::from(len)).read_to_end(&mut buf)?;
        if buf.len() < len as usize {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        let mut pad = [0u8; XDR_UNIT];
        r.read_exact(&mut pad[..padding(buf.len())])?;
        Ok(Ok(buf))
    }
}

fn out_of_range(what: &str, v: u32) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, format!("XDR {what} value {v} out of range"))
}
