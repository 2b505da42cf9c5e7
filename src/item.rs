//! Typed items: the values that flow through an item codec.
//!
//! [`Item`] borrows a value for writing, [`ItemMut`] is a destination for
//! reading, and [`Value`] is an owned decoded item.  The element count is the
//! slice length for the two array kinds and 1 for everything else.

use std::fmt;
use std::panic::Location;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FioError, Result};

/// In-memory floating-point type.
#[cfg(not(feature = "double"))]
pub type Real = f32;
/// In-memory floating-point type.
#[cfg(feature = "double")]
pub type Real = f64;

pub const DIM: usize = 3;

pub type RVec = [Real; DIM];
pub type IVec = [i32; DIM];

// ── Precision ────────────────────────────────────────────────────────────────

/// Width of reals in portable-binary files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    Single,
    Double,
}

impl Precision {
    /// The width of [`Real`] in this build.
    pub const fn native() -> Self {
        if std::mem::size_of::<Real>() == std::mem::size_of::<f64>() {
            Precision::Double
        } else {
            Precision::Single
        }
    }

    pub const fn bytes(self) -> usize {
        match self {
            Precision::Single => 4,
            Precision::Double => 8,
        }
    }

    pub fn is_double(self) -> bool {
        self == Precision::Double
    }
}

impl Default for Precision {
    fn default() -> Self {
        Self::native()
    }
}

// ── ItemKind ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Real,
    Int,
    UChar,
    UShort,
    RVec,
    NRVec,
    IVec,
    String,
}

pub const ALL_KINDS: &[ItemKind] = &[
    ItemKind::Real, ItemKind::Int, ItemKind::UChar, ItemKind::UShort,
    ItemKind::RVec, ItemKind::NRVec, ItemKind::IVec, ItemKind::String,
];

impl ItemKind {
    pub fn name(self) -> &'static str {
        match self {
            ItemKind::Real   => "REAL",
            ItemKind::Int    => "INT",
            ItemKind::UChar  => "UCHAR",
            ItemKind::UShort => "USHORT",
            ItemKind::RVec   => "RVEC",
            ItemKind::NRVec  => "NRVEC",
            ItemKind::IVec   => "IVEC",
            ItemKind::String => "STRING",
        }
    }

    /// Only byte arrays and vector arrays carry a count other than 1.
    pub fn is_array(self) -> bool {
        matches!(self, ItemKind::UChar | ItemKind::NRVec)
    }

    #[track_caller]
    pub fn check_count(self, count: usize) -> Result<()> {
        self.check_count_at(count, Location::caller())
    }

    pub(crate) fn check_count_at(self, count: usize, site: &'static Location<'static>) -> Result<()> {
        if count != 1 && !self.is_array() {
            return Err(FioError::BadCount { kind: self, count, site });
        }
        Ok(())
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ALL_KINDS
            .iter()
            .copied()
            .find(|k| k.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown item kind '{s}'"))
    }
}

// ── Item (write side) ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Item<'a> {
    Real(Real),
    Int(i32),
    UChars(&'a [u8]),
    UShort(u16),
    RVec(RVec),
    RVecs(&'a [RVec]),
    IVec(IVec),
    Str(&'a str),
}

impl Item<'_> {
    pub fn kind(&self) -> ItemKind {
        match self {
            Item::Real(_)   => ItemKind::Real,
            Item::Int(_)    => ItemKind::Int,
            Item::UChars(_) => ItemKind::UChar,
            Item::UShort(_) => ItemKind::UShort,
            Item::RVec(_)   => ItemKind::RVec,
            Item::RVecs(_)  => ItemKind::NRVec,
            Item::IVec(_)   => ItemKind::IVec,
            Item::Str(_)    => ItemKind::String,
        }
    }

    pub fn count(&self) -> usize {
        match self {
            Item::UChars(b) => b.len(),
            Item::RVecs(v)  => v.len(),
            _               => 1,
        }
    }
}

// ── ItemMut (read side) ──────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ItemMut<'a> {
    Real(&'a mut Real),
    Int(&'a mut i32),
    UChars(&'a mut [u8]),
    UShort(&'a mut u16),
    RVec(&'a mut RVec),
    RVecs(&'a mut [RVec]),
    IVec(&'a mut IVec),
    Str(&'a mut String),
}

impl ItemMut<'_> {
    pub fn kind(&self) -> ItemKind {
        match self {
            ItemMut::Real(_)   => ItemKind::Real,
            ItemMut::Int(_)    => ItemKind::Int,
            ItemMut::UChars(_) => ItemKind::UChar,
            ItemMut::UShort(_) => ItemKind::UShort,
            ItemMut::RVec(_)   => ItemKind::RVec,
            ItemMut::RVecs(_)  => ItemKind::NRVec,
            ItemMut::IVec(_)   => ItemKind::IVec,
            ItemMut::Str(_)    => ItemKind::String,
        }
    }

    pub fn count(&self) -> usize {
        match self {
            ItemMut::UChars(b) => b.len(),
            ItemMut::RVecs(v)  => v.len(),
            _                  => 1,
        }
    }

    /// Move a decoded value into the destination.  The value must have been
    /// decoded for this destination's kind and count.
    pub(crate) fn store(self, value: Value) {
        match (self, value) {
            (ItemMut::Real(d),   Value::Real(v))   => *d = v,
            (ItemMut::Int(d),    Value::Int(v))    => *d = v,
            (ItemMut::UChars(d), Value::UChar(v))  => d.copy_from_slice(&v),
            (ItemMut::UShort(d), Value::UShort(v)) => *d = v,
            (ItemMut::RVec(d),   Value::RVec(v))   => *d = v,
            (ItemMut::RVecs(d),  Value::NRVec(v))  => d.copy_from_slice(&v),
            (ItemMut::IVec(d),   Value::IVec(v))   => *d = v,
            (ItemMut::Str(d),    Value::String(v)) => *d = v,
            (dest, value) => unreachable!(
                "decoded {} for a {} destination",
                value.kind(),
                dest.kind()
            ),
        }
    }
}

// ── Value (owned) ────────────────────────────────────────────────────────────

/// An owned, decoded item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Value {
    Real(Real),
    Int(i32),
    UChar(Vec<u8>),
    UShort(u16),
    RVec(RVec),
    NRVec(Vec<RVec>),
    IVec(IVec),
    String(String),
}

impl Value {
    pub fn kind(&self) -> ItemKind {
        self.as_item().kind()
    }

    pub fn count(&self) -> usize {
        self.as_item().count()
    }

    pub fn as_item(&self) -> Item<'_> {
        match self {
            Value::Real(v)   => Item::Real(*v),
            Value::Int(v)    => Item::Int(*v),
            Value::UChar(v)  => Item::UChars(v),
            Value::UShort(v) => Item::UShort(*v),
            Value::RVec(v)   => Item::RVec(*v),
            Value::NRVec(v)  => Item::RVecs(v),
            Value::IVec(v)   => Item::IVec(*v),
            Value::String(v) => Item::Str(v),
        }
    }
}
