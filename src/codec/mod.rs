//! Item codecs: one read/write contract, three on-disk encodings.
//!
//! | Family            | Codec            | Channel                 |
//! |-------------------|------------------|-------------------------|
//! | `Text`            | [`TextCodec`]    | [`Stream`] + [`Scanner`] |
//! | `NativeBinary`    | [`NativeCodec`]  | [`Stream`]              |
//! | `PortableBinary`  | [`PortableCodec`]| [`XdrStream`]           |
//!
//! Codecs are stateless; all per-file state (stream position, token queue,
//! precision, debug flag) lives on the [`FileHandle`] reached through the
//! [`CodecContext`].  A codec never decides whether a failure is fatal: it
//! returns the error and the registry attaches item context.
//!
//! [`XdrStream`]: crate::xdr::XdrStream

pub mod native;
#[cfg(feature = "portable")]
pub mod portable;
pub mod text;

use std::panic::Location;

use crate::error::{FioError, Result};
use crate::format::FormatFamily;
use crate::item::{Item, ItemKind, Precision, Value};
use crate::registry::{Channel, FileHandle};
use crate::scanner::Scanner;
use crate::stream::Stream;

pub use native::NativeCodec;
#[cfg(feature = "portable")]
pub use portable::PortableCodec;
pub use text::TextCodec;

// ── Codec trait ──────────────────────────────────────────────────────────────

pub trait ItemCodec: Sync {
    fn family(&self) -> FormatFamily;

    /// Encode one item.
    fn write(&self, ctx: &mut CodecContext<'_>, item: &Item<'_>, desc: &str) -> Result<()>;

    /// Decode one item of `kind` with `count` elements.
    fn read(&self, ctx: &mut CodecContext<'_>, kind: ItemKind, count: usize) -> Result<Value>;

    /// Consume one item without keeping it.  Must advance the channel exactly
    /// as far as [`ItemCodec::read`] would.
    fn skip(&self, ctx: &mut CodecContext<'_>, kind: ItemKind, count: usize) -> Result<()> {
        self.read(ctx, kind, count).map(drop)
    }
}

// ── Context ──────────────────────────────────────────────────────────────────

/// Everything a codec may touch during one item call.
pub struct CodecContext<'a> {
    pub(crate) handle:  &'a mut FileHandle,
    pub(crate) comment: Option<&'a str>,
    pub(crate) site:    &'static Location<'static>,
}

impl<'a> CodecContext<'a> {
    pub(crate) fn new(
        handle:  &'a mut FileHandle,
        comment: Option<&'a str>,
        site:    &'static Location<'static>,
    ) -> Self {
        Self { handle, comment, site }
    }

    pub fn precision(&self) -> Precision {
        self.handle.precision
    }

    pub fn debug(&self) -> bool {
        self.handle.debug
    }

    /// Trailing `"  ; <annotation> <desc>"` comment for text output, or an
    /// empty string when the handle's debug flag is off.  Line breaks in the
    /// annotation or description become spaces so the comment stays on one
    /// line.
    pub fn debug_comment(&self, desc: &str) -> String {
        if !self.handle.debug {
            return String::new();
        }
        let one_line = |s: &str| s.replace(['\n', '\r'], " ");
        format!("  ; {} {}", one_line(self.comment.unwrap_or("")), one_line(desc))
    }

    pub(crate) fn stream(&mut self, family: FormatFamily) -> Result<&mut Stream> {
        let site = self.site;
        let handle = &mut *self.handle;
        match &mut handle.channel {
            Channel::Stream(s) => Ok(s),
            #[allow(unreachable_patterns)]
            _ => Err(mismatch(&handle.filename, family, site)),
        }
    }

    pub(crate) fn text_parts(&mut self) -> Result<(&mut Stream, &mut Scanner)> {
        let site = self.site;
        let handle = &mut *self.handle;
        match &mut handle.channel {
            Channel::Stream(s) => Ok((s, &mut handle.scanner)),
            #[allow(unreachable_patterns)]
            _ => Err(mismatch(&handle.filename, FormatFamily::Text, site)),
        }
    }

    #[cfg(feature = "portable")]
    pub(crate) fn xdr(&mut self) -> Result<&mut crate::xdr::XdrStream> {
        let site = self.site;
        let handle = &mut *self.handle;
        match &mut handle.channel {
            Channel::Xdr(x) => Ok(x),
            _ => Err(mismatch(&handle.filename, FormatFamily::PortableBinary, site)),
        }
    }
}

fn mismatch(file: &str, family: FormatFamily, site: &'static Location<'static>) -> FioError {
    FioError::ChannelMismatch { file: file.to_owned(), family, site }
}

// ── Factory ──────────────────────────────────────────────────────────────────

static TEXT:   TextCodec   = TextCodec;
static NATIVE: NativeCodec = NativeCodec;
#[cfg(feature = "portable")]
static PORTABLE: PortableCodec = PortableCodec;

/// Resolve a format family to its codec.
///
/// Fails with [`FioError::MissingCapability`] for the portable family when
/// the crate was built without the `portable` feature.
pub fn get_codec(family: FormatFamily) -> Result<&'static dyn ItemCodec> {
    match family {
        FormatFamily::Text         => Ok(&TEXT),
        FormatFamily::NativeBinary => Ok(&NATIVE),
        #[cfg(feature = "portable")]
        FormatFamily::PortableBinary => Ok(&PORTABLE),
        #[cfg(not(feature = "portable"))]
        FormatFamily::PortableBinary => Err(FioError::MissingCapability {
            capability: "portable binary (XDR)",
        }),
    }
}
