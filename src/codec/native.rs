//! Host-native binary codec.
//!
//! Values are written as their in-memory byte representation in host byte
//! order, at the host's natural widths: `Real` is `size_of::<Real>()` bytes
//! whatever the handle's precision flag says.  Files are meant to be read back
//! by the same build on the same host; nothing is portable.
//!
//! Strings are a native `INT` holding `len + 1`, then the bytes and a NUL.

use std::io::{BufRead, Read, Write};
use std::mem::size_of;

use byteorder::{NativeEndian, ReadBytesExt, WriteBytesExt};

use super::{CodecContext, ItemCodec};
use crate::error::{FioError, Result};
use crate::format::FormatFamily;
use crate::item::{IVec, Item, ItemKind, RVec, Real, Value, DIM};

pub struct NativeCodec;

#[cfg(not(feature = "double"))]
fn put_real(w: &mut dyn Write, x: Real) -> std::io::Result<()> {
    w.write_f32::<NativeEndian>(x)
}

#[cfg(feature = "double")]
fn put_real(w: &mut dyn Write, x: Real) -> std::io::Result<()> {
    w.write_f64::<NativeEndian>(x)
}

#[cfg(not(feature = "double"))]
fn get_real(r: &mut dyn BufRead) -> std::io::Result<Real> {
    r.read_f32::<NativeEndian>()
}

#[cfg(feature = "double")]
fn get_real(r: &mut dyn BufRead) -> std::io::Result<Real> {
    r.read_f64::<NativeEndian>()
}

fn put_rvec(w: &mut dyn Write, v: &RVec) -> std::io::Result<()> {
    v.iter().try_for_each(|&x| put_real(w, x))
}

fn get_rvec(r: &mut dyn BufRead) -> std::io::Result<RVec> {
    let mut v = [0.0; DIM];
    for c in &mut v {
        *c = get_real(r)?;
    }
    Ok(v)
}

/// Encoded size of one item of `kind`, excluding strings.
fn fixed_size(kind: ItemKind, count: usize) -> Option<usize> {
    Some(match kind {
        ItemKind::Real   => size_of::<Real>(),
        ItemKind::Int    => size_of::<i32>(),
        ItemKind::UChar  => count,
        ItemKind::UShort => size_of::<u16>(),
        ItemKind::RVec   => size_of::<RVec>(),
        ItemKind::NRVec  => size_of::<RVec>() * count,
        ItemKind::IVec   => size_of::<IVec>(),
        ItemKind::String => return None,
    })
}

impl NativeCodec {
    /// Read the `len + 1` string header and validate it.
    fn string_len(&self, ctx: &mut CodecContext<'_>) -> Result<usize> {
        let n = match self.read(ctx, ItemKind::Int, 1)? {
            Value::Int(n) => n,
            other => unreachable!("INT read returned {}", other.kind()),
        };
        if n < 1 {
            return Err(FioError::BadLength { len: i64::from(n), limit: i64::from(i32::MAX) });
        }
        Ok(n as usize)
    }
}

impl ItemCodec for NativeCodec {
    fn family(&self) -> FormatFamily {
        FormatFamily::NativeBinary
    }

    fn write(&self, ctx: &mut CodecContext<'_>, item: &Item<'_>, desc: &str) -> Result<()> {
        if let Item::Str(s) = item {
            let len = i32::try_from(s.len() + 1).map_err(|_| FioError::BadLength {
                len:   s.len() as i64 + 1,
                limit: i64::from(i32::MAX),
            })?;
            self.write(ctx, &Item::Int(len), desc)?;
            let w = ctx.stream(FormatFamily::NativeBinary)?.writer()?;
            w.write_all(s.as_bytes())?;
            w.write_u8(0)?;
            return Ok(());
        }

        let w = ctx.stream(FormatFamily::NativeBinary)?.writer()?;
        match item {
            Item::Real(x)   => put_real(w, *x)?,
            Item::Int(i)    => w.write_i32::<NativeEndian>(*i)?,
            Item::UChars(b) => w.write_all(b)?,
            Item::UShort(u) => w.write_u16::<NativeEndian>(*u)?,
            Item::RVec(v)   => put_rvec(w, v)?,
            Item::RVecs(vs) => vs.iter().try_for_each(|v| put_rvec(w, v))?,
            Item::IVec(v)   => v.iter().try_for_each(|&i| w.write_i32::<NativeEndian>(i))?,
            Item::Str(_)    => unreachable!(),
        }
        Ok(())
    }

    fn read(&self, ctx: &mut CodecContext<'_>, kind: ItemKind, count: usize) -> Result<Value> {
        if kind == ItemKind::String {
            let n = self.string_len(ctx)?;
            let r = ctx.stream(FormatFamily::NativeBinary)?.reader()?;
            // Grows with the bytes actually present, not with the header.
            let mut buf = Vec::new();
            r.take(n as u64).read_to_end(&mut buf)?;
            if buf.len() < n {
                return Err(FioError::UnexpectedEof);
            }
            if buf.last() == Some(&0) {
                buf.pop();
            }
            return String::from_utf8(buf)
                .map(Value::String)
                .map_err(|_| FioError::InvalidString);
        }

        let r = ctx.stream(FormatFamily::NativeBinary)?.reader()?;
        Ok(match kind {
            ItemKind::Real   => Value::Real(get_real(r)?),
            ItemKind::Int    => Value::Int(r.read_i32::<NativeEndian>()?),
            ItemKind::UShort => Value::UShort(r.read_u16::<NativeEndian>()?),
            ItemKind::UChar  => {
                let mut buf = vec![0u8; count];
                r.read_exact(&mut buf)?;
                Value::UChar(buf)
            }
            ItemKind::RVec  => Value::RVec(get_rvec(r)?),
            ItemKind::NRVec => Value::NRVec((0..count).map(|_| get_rvec(r)).collect::<std::io::Result<_>>()?),
            ItemKind::IVec  => {
                let mut v = [0i32; DIM];
                for c in &mut v {
                    *c = r.read_i32::<NativeEndian>()?;
                }
                Value::IVec(v)
            }
            ItemKind::String => unreachable!(),
        })
    }

    /// Seeks over the item instead of decoding it.
    fn skip(&self, ctx: &mut CodecContext<'_>, kind: ItemKind, count: usize) -> Result<()> {
        let size = match fixed_size(kind, count) {
            Some(size) => size,
            None       => self.string_len(ctx)?,
        };
        ctx.stream(FormatFamily::NativeBinary)?.skip(size as u64)?;
        Ok(())
    }
}
