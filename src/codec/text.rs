//! Human-readable text codec.
//!
//! One item per line:
//!
//! | Kind     | Layout                                          |
//! |----------|-------------------------------------------------|
//! | `REAL`   | `%18.10e`                                       |
//! | `INT`    | `%18d`                                          |
//! | `UCHAR`  | `%4d` per byte                                  |
//! | `USHORT` | `%18d`                                          |
//! | `RVEC`   | three `%18.10e` fields                          |
//! | `NRVEC`  | one `RVEC` line per vector                      |
//! | `IVEC`   | three `%18d` fields                             |
//! | `STRING` | `%-18s`                                         |
//!
//! With the handle's debug flag set every line ends in
//! `"  ; <annotation> <description>"`.  Reading pulls whitespace-separated
//! tokens from the handle's [`Scanner`], so layout and comments are ignored.

use std::io::{BufRead, Write};
use std::str::FromStr;

use super::{CodecContext, ItemCodec};
use crate::error::{FioError, Result};
use crate::format::FormatFamily;
use crate::item::{Item, ItemKind, RVec, Real, Value, DIM};
use crate::scanner::{Scanner, COMMENT_CHAR};

/// Field width of scalar and vector-component columns.
pub const FIELD_WIDTH: usize = 18;
/// Digits after the decimal point of real fields.
pub const REAL_DIGITS: usize = 10;
/// Field width of each byte in a `UCHAR` line.
pub const BYTE_WIDTH: usize = 4;

pub struct TextCodec;

/// Format `value` the way C's `%.{precision}e` does: the exponent always
/// carries a sign and at least two digits.
pub fn c_exp(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return "nan".to_owned();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf".to_owned() } else { "-inf".to_owned() };
    }
    let s = format!("{value:.precision$e}");
    match s.split_once('e') {
        Some((mantissa, exp)) => {
            let exp: i32 = exp.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exp.unsigned_abs())
        }
        None => s,
    }
}

fn real_field(value: Real) -> String {
    format!("{:>w$}", c_exp(f64::from(value), REAL_DIGITS), w = FIELD_WIDTH)
}

fn rvec_fields(v: &RVec) -> String {
    v.iter().map(|&x| real_field(x)).collect()
}

/// Strings must survive the trip through the scanner as exactly one token.
fn check_token_safe(s: &str) -> Result<()> {
    let unsafe_byte = |b: u8| b.is_ascii_whitespace() || b == COMMENT_CHAR;
    if s.is_empty() || s.bytes().any(unsafe_byte) {
        return Err(FioError::UnrepresentableString(s.to_owned()));
    }
    Ok(())
}

impl ItemCodec for TextCodec {
    fn family(&self) -> FormatFamily {
        FormatFamily::Text
    }

    fn write(&self, ctx: &mut CodecContext<'_>, item: &Item<'_>, desc: &str) -> Result<()> {
        let comment = ctx.debug_comment(desc);
        let line = match item {
            Item::Real(x)   => format!("{}{comment}\n", real_field(*x)),
            Item::Int(i)    => format!("{i:>w$}{comment}\n", w = FIELD_WIDTH),
            Item::UShort(u) => format!("{u:>w$}{comment}\n", w = FIELD_WIDTH),
            Item::UChars(bytes) => {
                let mut line: String = bytes.iter().map(|b| format!("{b:>w$}", w = BYTE_WIDTH)).collect();
                line.push_str(&comment);
                line.push('\n');
                line
            }
            Item::RVec(v) => format!("{}{comment}\n", rvec_fields(v)),
            Item::RVecs(vs) => vs
                .iter()
                .map(|v| format!("{}{comment}\n", rvec_fields(v)))
                .collect(),
            Item::IVec(v) => format!(
                "{:>w$}{:>w$}{:>w$}{comment}\n",
                v[0], v[1], v[2],
                w = FIELD_WIDTH
            ),
            Item::Str(s) => {
                check_token_safe(s)?;
                format!("{s:<w$}{comment}\n", w = FIELD_WIDTH)
            }
        };
        ctx.stream(FormatFamily::Text)?
            .writer()?
            .write_all(line.as_bytes())?;
        Ok(())
    }

    fn read(&self, ctx: &mut CodecContext<'_>, kind: ItemKind, count: usize) -> Result<Value> {
        let (stream, scanner) = ctx.text_parts()?;
        let mut tokens = Tokens { scanner, src: stream.reader()?, kind, failed: None };

        let value = match kind {
            ItemKind::Real   => Value::Real(tokens.real()?),
            ItemKind::Int    => Value::Int(tokens.parse()?),
            ItemKind::UShort => Value::UShort(tokens.parse()?),
            ItemKind::UChar  => {
                let mut bytes = Vec::with_capacity(count);
                for _ in 0..count {
                    bytes.push(tokens.parse()?);
                }
                Value::UChar(bytes)
            }
            ItemKind::RVec  => Value::RVec(tokens.rvec()?),
            ItemKind::NRVec => {
                let mut vs = Vec::with_capacity(count);
                for _ in 0..count {
                    vs.push(tokens.rvec()?);
                }
                Value::NRVec(vs)
            }
            ItemKind::IVec => {
                let mut v = [0i32; DIM];
                for c in &mut v {
                    *c = tokens.parse()?;
                }
                Value::IVec(v)
            }
            ItemKind::String => Value::String(tokens.next()?.to_owned()),
        };

        // Every token of the item is consumed before a bad one is reported,
        // so the next item starts at the right place.
        match tokens.failed {
            Some(e) => Err(e),
            None    => Ok(value),
        }
    }
}

/// Token source for one item read.
struct Tokens<'a> {
    scanner: &'a mut Scanner,
    src:     &'a mut dyn BufRead,
    kind:    ItemKind,
    failed:  Option<FioError>,
}

impl Tokens<'_> {
    fn next(&mut self) -> Result<&str> {
        self.scanner.next_token(&mut *self.src)
    }

    /// Parse the next token; a malformed token is recorded and replaced by
    /// the default value.
    fn parse<T: FromStr + Default>(&mut self) -> Result<T> {
        let kind = self.kind;
        let tok = self.scanner.next_token(&mut *self.src)?;
        match tok.parse() {
            Ok(v) => Ok(v),
            Err(_) => {
                let err = FioError::Parse { kind, token: tok.to_owned() };
                self.failed.get_or_insert(err);
                Ok(T::default())
            }
        }
    }

    /// Reals are parsed at double precision, then narrowed to [`Real`].
    fn real(&mut self) -> Result<Real> {
        Ok(self.parse::<f64>()? as Real)
    }

    fn rvec(&mut self) -> Result<RVec> {
        let mut v = [0.0; DIM];
        for c in &mut v {
            *c = self.real()?;
        }
        Ok(v)
    }
}
