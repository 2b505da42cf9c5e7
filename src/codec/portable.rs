//! Portable binary codec over XDR.
//!
//! The only codec where the handle's [`Precision`] matters: every real is
//! converted on its own to a 4-byte float or an 8-byte double, regardless of
//! the width of [`Real`] in this build.  Vectors are three such scalars;
//! vector arrays repeat the vector encoding `count` times.
//!
//! Strings carry an `INT` header of `len + 1` followed by an XDR string.
//! Decoding a string that is not kept still allocates a scratch buffer for it.

use super::{CodecContext, ItemCodec};
use crate::error::{FioError, Result};
use crate::format::FormatFamily;
use crate::item::{Item, ItemKind, Precision, RVec, Real, Value, DIM};
use crate::xdr::XdrStream;

pub struct PortableCodec;

fn put_real(x: &mut XdrStream, prec: Precision, v: Real) -> std::io::Result<()> {
    match prec {
        Precision::Double => x.put_double(f64::from(v)),
        Precision::Single => x.put_float(v as f32),
    }
}

fn get_real(x: &mut XdrStream, prec: Precision) -> std::io::Result<Real> {
    Ok(match prec {
        Precision::Double => x.get_double()? as Real,
        Precision::Single => x.get_float()? as Real,
    })
}

fn put_rvec(x: &mut XdrStream, prec: Precision, v: &RVec) -> std::io::Result<()> {
    v.iter().try_for_each(|&c| put_real(x, prec, c))
}

fn get_rvec(x: &mut XdrStream, prec: Precision) -> std::io::Result<RVec> {
    let mut v = [0.0; DIM];
    for c in &mut v {
        *c = get_real(x, prec)?;
    }
    Ok(v)
}

impl ItemCodec for PortableCodec {
    fn family(&self) -> FormatFamily {
        FormatFamily::PortableBinary
    }

    fn write(&self, ctx: &mut CodecContext<'_>, item: &Item<'_>, _desc: &str) -> Result<()> {
        let prec = ctx.precision();
        let x = ctx.xdr()?;
        match item {
            Item::Real(v)   => put_real(x, prec, *v)?,
            Item::Int(i)    => x.put_int(*i)?,
            Item::UChars(b) => b.iter().try_for_each(|&c| x.put_u_char(c))?,
            Item::UShort(u) => x.put_u_short(*u)?,
            Item::RVec(v)   => put_rvec(x, prec, v)?,
            Item::RVecs(vs) => vs.iter().try_for_each(|v| put_rvec(x, prec, v))?,
            Item::IVec(v)   => v.iter().try_for_each(|&i| x.put_int(i))?,
            Item::Str(s)    => {
                let header = i32::try_from(s.len() + 1).map_err(|_| FioError::BadLength {
                    len:   s.len() as i64 + 1,
                    limit: i64::from(i32::MAX),
                })?;
                x.put_int(header)?;
                x.put_string(s.as_bytes())?;
            }
        }
        Ok(())
    }

    fn read(&self, ctx: &mut CodecContext<'_>, kind: ItemKind, count: usize) -> Result<Value> {
        let prec = ctx.precision();
        let x = ctx.xdr()?;
        Ok(match kind {
            ItemKind::Real   => Value::Real(get_real(x, prec)?),
            ItemKind::Int    => Value::Int(x.get_int()?),
            ItemKind::UChar  => Value::UChar((0..count).map(|_| x.get_u_char()).collect::<std::io::Result<_>>()?),
            ItemKind::UShort => Value::UShort(x.get_u_short()?),
            ItemKind::RVec   => Value::RVec(get_rvec(x, prec)?),
            ItemKind::NRVec  => Value::NRVec((0..count).map(|_| get_rvec(x, prec)).collect::<std::io::Result<_>>()?),
            ItemKind::IVec   => {
                let mut v = [0i32; DIM];
                for c in &mut v {
                    *c = x.get_int()?;
                }
                Value::IVec(v)
            }
            ItemKind::String => {
                let header = x.get_int()?;
                if header < 0 {
                    return Err(FioError::BadLength { len: i64::from(header), limit: i64::from(i32::MAX) });
                }
                let bytes = x.get_string(header as usize)?.map_err(|len| FioError::BadLength {
                    len:   i64::from(len),
                    limit: i64::from(header),
                })?;
                Value::String(String::from_utf8(bytes).map_err(|_| FioError::InvalidString)?)
            }
        })
    }
}
