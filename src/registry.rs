//! File handle registry and item dispatch.
//!
//! ```no_run
//! use sciio::{Item, ItemMut, Mode, Registry};
//!
//! let mut reg = Registry::new();
//! let h = reg.open(Some("conf.gro".as_ref()), Mode::Write)?;
//! reg.select(h)?;
//! reg.write(Item::Int(3), "natoms")?;
//! reg.write(Item::RVec([1.0, 2.0, 3.0]), "box")?;
//! reg.close(h)?;
//!
//! let h = reg.open(Some("conf.gro".as_ref()), Mode::Read)?;
//! reg.select(h)?;
//! let mut natoms = 0;
//! reg.read(ItemMut::Int(&mut natoms), "natoms")?;
//! reg.skip(sciio::ItemKind::RVec, 1, "box")?;
//! reg.close(h)?;
//! # Ok::<(), sciio::FioError>(())
//! ```
//!
//! # Handles
//! A [`HandleId`] is an index into the registry's slot table.  `open` reuses
//! the lowest free slot and only grows the table when none is free.  Using an
//! index that was never returned by `open`, or that has been closed, fails
//! with [`FioError::InvalidHandle`].
//!
//! # Dispatch
//! Item calls go to the most recently selected handle, through the codec of
//! its format family.  Before the first `select`, and after any `close`,
//! nothing is selected and item calls fail with [`FioError::NotSelected`].

use std::fmt;
use std::io::SeekFrom;
use std::panic::Location;
use std::path::Path;

use tracing::{debug, warn};

use crate::backup::{backup_existing, BackupNamer, NumberedBackup};
use crate::codec::{get_codec, CodecContext, ItemCodec};
use crate::error::{FioError, Op, Result};
use crate::format::{FormatFamily, FormatTag};
use crate::item::{Item, ItemKind, ItemMut, Precision, Value};
use crate::scanner::Scanner;
use crate::stream::{Mode, Stream};
#[cfg(feature = "portable")]
use crate::xdr::XdrStream;

/// Name reported for handles bound to stdin/stdout.
pub const STDIO_NAME: &str = "STDIO";

// ── RegistryOptions ──────────────────────────────────────────────────────────

/// Defaults applied to every handle a [`Registry`] opens.
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    /// Real width for portable-binary handles.
    pub precision: Precision,
    /// Emit debug comments (text) and failure diagnostics.
    pub debug:     bool,
    /// Move existing portable-binary files aside before overwriting them.
    pub backups:   bool,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            precision: Precision::native(),
            debug:     false,
            backups:   true,
        }
    }
}

// ── Handles ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(pub usize);

impl HandleId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The byte channel behind a handle.
#[derive(Debug)]
pub enum Channel {
    Stream(Stream),
    #[cfg(feature = "portable")]
    Xdr(XdrStream),
}

#[derive(Debug)]
pub struct FileHandle {
    pub(crate) index:     usize,
    pub(crate) tag:       FormatTag,
    pub(crate) mode:      Mode,
    pub(crate) read:      bool,
    pub(crate) precision: Precision,
    pub(crate) debug:     bool,
    pub(crate) filename:  String,
    pub(crate) channel:   Channel,
    pub(crate) scanner:   Scanner,
}

impl FileHandle {
    fn new(index: usize, tag: FormatTag, mode: Mode, filename: String, channel: Channel, opts: &RegistryOptions) -> Self {
        Self {
            index,
            tag,
            mode,
            read:      mode.is_read(),
            precision: opts.precision,
            debug:     opts.debug,
            filename,
            channel,
            scanner:   Scanner::new(),
        }
    }

    pub fn id(&self) -> HandleId           { HandleId(self.index) }
    pub fn tag(&self) -> FormatTag         { self.tag }
    pub fn family(&self) -> Option<FormatFamily> { self.tag.family() }
    pub fn mode(&self) -> Mode             { self.mode }
    pub fn is_read(&self) -> bool          { self.read }
    pub fn precision(&self) -> Precision   { self.precision }
    pub fn debug(&self) -> bool            { self.debug }
    pub fn filename(&self) -> &str         { &self.filename }

    pub fn is_stdio(&self) -> bool {
        match &self.channel {
            Channel::Stream(s) => s.is_stdio(),
            #[cfg(feature = "portable")]
            Channel::Xdr(_) => false,
        }
    }
}

#[derive(Clone, Copy)]
enum Dispatch {
    Unselected,
    Active { handle: HandleId, codec: &'static dyn ItemCodec },
}

// ── Registry ─────────────────────────────────────────────────────────────────

pub struct Registry {
    slots:        Vec<Option<FileHandle>>,
    dispatch:     Dispatch,
    comment:      Option<String>,
    options:      RegistryOptions,
    backup_namer: Box<dyn BackupNamer>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("slots", &self.slots)
            .field("selected", &self.selected())
            .field("comment", &self.comment)
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(feature = "portable")]
fn portable_channel(path: &Path, mode: Mode) -> std::io::Result<Channel> {
    Ok(Channel::Xdr(XdrStream::open(path, mode)?))
}

/// Without XDR support the file is still opened, as a plain stream; `select`
/// then reports the missing capability.
#[cfg(not(feature = "portable"))]
fn portable_channel(path: &Path, mode: Mode) -> std::io::Result<Channel> {
    Ok(Channel::Stream(Stream::open(path, mode)?))
}

impl Registry {
    pub fn new() -> Self {
        Self::with_options(RegistryOptions::default())
    }

    pub fn with_options(options: RegistryOptions) -> Self {
        Self {
            slots:        Vec::new(),
            dispatch:     Dispatch::Unselected,
            comment:      None,
            options,
            backup_namer: Box::new(NumberedBackup::default()),
        }
    }

    pub fn with_backup_namer(mut self, namer: Box<dyn BackupNamer>) -> Self {
        self.backup_namer = namer;
        self
    }

    pub fn options(&self) -> &RegistryOptions {
        &self.options
    }

    // ── Open / close ─────────────────────────────────────────────────────────

    /// Open `path`, or stdin/stdout when `path` is `None`.
    ///
    /// The format tag comes from the file extension.  Portable-binary files
    /// opened for writing are backed up first if they already exist; opened
    /// for reading or appending they must exist.
    #[track_caller]
    pub fn open(&mut self, path: Option<&Path>, mode: Mode) -> Result<HandleId> {
        let index = self
            .slots
            .iter()
            .position(Option::is_none)
            .unwrap_or(self.slots.len());

        let handle = match path {
            Some(path) => self.open_file(index, path, mode)?,
            None => FileHandle::new(
                index,
                FormatTag::STDIO,
                mode,
                STDIO_NAME.to_owned(),
                Channel::Stream(Stream::stdio(mode)),
                &self.options,
            ),
        };
        debug!(handle = index, file = %handle.filename, tag = %handle.tag, ?mode, "opened");

        if index == self.slots.len() {
            self.slots.push(Some(handle));
        } else {
            self.slots[index] = Some(handle);
        }
        Ok(HandleId(index))
    }

    fn open_file(&self, index: usize, path: &Path, mode: Mode) -> Result<FileHandle> {
        let tag = FormatTag::from_path(path);
        let channel = if tag.family() == Some(FormatFamily::PortableBinary) {
            match mode {
                Mode::Write if self.options.backups => {
                    backup_existing(path, self.backup_namer.as_ref());
                }
                Mode::Read | Mode::Append if !path.exists() => {
                    return Err(FioError::NotFound(path.to_owned()));
                }
                _ => {}
            }
            portable_channel(path, mode)?
        } else {
            Channel::Stream(Stream::open(path, mode)?)
        };
        Ok(FileHandle::new(index, tag, mode, path.display().to_string(), channel, &self.options))
    }

    /// Close a handle and clear the current selection, whichever handle it
    /// pointed at.  Standard streams are flushed but never closed.
    #[track_caller]
    pub fn close(&mut self, h: HandleId) -> Result<()> {
        let site = Location::caller();
        let handle = self
            .slots
            .get_mut(h.0)
            .and_then(Option::take)
            .ok_or(FioError::InvalidHandle { handle: h.0, site })?;
        self.dispatch = Dispatch::Unselected;
        debug!(handle = h.0, file = %handle.filename, "closed");

        match handle.channel {
            #[cfg(feature = "portable")]
            Channel::Xdr(x) => x.close()?,
            Channel::Stream(mut s) => s.flush()?,
        }
        Ok(())
    }

    pub fn is_open(&self, h: HandleId) -> bool {
        matches!(self.slots.get(h.0), Some(Some(_)))
    }

    pub fn open_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    // ── Dispatch ─────────────────────────────────────────────────────────────

    /// Make `h` the target of subsequent item calls, using the codec of its
    /// format family.
    #[track_caller]
    pub fn select(&mut self, h: HandleId) -> Result<()> {
        let site = Location::caller();
        let handle = self.handle(h)?;
        let tag = handle.tag;
        let family = tag.family().ok_or(FioError::UnsupportedFormat { tag, site })?;
        let codec = get_codec(family)?;
        debug!(handle = h.0, file = %handle.filename, %tag, %family, "selected");
        self.dispatch = Dispatch::Active { handle: h, codec };
        Ok(())
    }

    pub fn selected(&self) -> Option<HandleId> {
        match self.dispatch {
            Dispatch::Active { handle, .. } => Some(handle),
            Dispatch::Unselected => None,
        }
    }

    fn dispatch_item<T>(
        &mut self,
        op:    Op,
        kind:  ItemKind,
        count: usize,
        desc:  &str,
        site:  &'static Location<'static>,
        call:  impl FnOnce(&dyn ItemCodec, &mut CodecContext<'_>) -> Result<T>,
    ) -> Result<T> {
        let (id, codec) = match self.dispatch {
            Dispatch::Active { handle, codec } => (handle, codec),
            Dispatch::Unselected => return Err(FioError::NotSelected { site }),
        };
        kind.check_count_at(count, site)?;

        let comment = self.comment.as_deref();
        let handle = self
            .slots
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(FioError::NotSelected { site })?;

        let result = call(codec, &mut CodecContext::new(handle, comment, site));
        result.map_err(|err| {
            if err.is_misuse() {
                return err;
            }
            if handle.debug {
                warn!(
                    %op, %kind, desc, file = %handle.filename, %site, error = %err,
                    "item I/O failed"
                );
            }
            FioError::Item {
                op,
                kind,
                desc:   desc.to_owned(),
                file:   handle.filename.clone(),
                site,
                source: Box::new(err),
            }
        })
    }

    // ── Item calls ───────────────────────────────────────────────────────────

    /// Write one item to the selected handle.
    #[track_caller]
    pub fn write(&mut self, item: Item<'_>, desc: &str) -> Result<()> {
        let site = Location::caller();
        self.dispatch_item(Op::Write, item.kind(), item.count(), desc, site, |codec, ctx| {
            codec.write(ctx, &item, desc)
        })
    }

    /// Read one item from the selected handle into `dest`.  The destination's
    /// kind and length decide what is read.  On failure `dest` is unchanged.
    #[track_caller]
    pub fn read(&mut self, dest: ItemMut<'_>, desc: &str) -> Result<()> {
        let site = Location::caller();
        let (kind, count) = (dest.kind(), dest.count());
        let value = self.dispatch_item(Op::Read, kind, count, desc, site, |codec, ctx| {
            codec.read(ctx, kind, count)
        })?;
        dest.store(value);
        Ok(())
    }

    /// Read one item and return it as an owned [`Value`].
    #[track_caller]
    pub fn read_value(&mut self, kind: ItemKind, count: usize, desc: &str) -> Result<Value> {
        let site = Location::caller();
        self.dispatch_item(Op::Read, kind, count, desc, site, |codec, ctx| {
            codec.read(ctx, kind, count)
        })
    }

    /// Consume one item without storing it.  Advances the file exactly as far
    /// as reading it would.
    #[track_caller]
    pub fn skip(&mut self, kind: ItemKind, count: usize, desc: &str) -> Result<()> {
        let site = Location::caller();
        self.dispatch_item(Op::Read, kind, count, desc, site, |codec, ctx| {
            codec.skip(ctx, kind, count)
        })
    }

    // ── Annotation ───────────────────────────────────────────────────────────

    /// Prefix placed before the description in text debug comments.
    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.comment = Some(comment.into());
    }

    pub fn unset_comment(&mut self) {
        self.comment = None;
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    #[track_caller]
    pub fn handle(&self, h: HandleId) -> Result<&FileHandle> {
        let site = Location::caller();
        self.slots
            .get(h.0)
            .and_then(Option::as_ref)
            .ok_or(FioError::InvalidHandle { handle: h.0, site })
    }

    #[track_caller]
    fn handle_mut(&mut self, h: HandleId) -> Result<&mut FileHandle> {
        let site = Location::caller();
        self.slots
            .get_mut(h.0)
            .and_then(Option::as_mut)
            .ok_or(FioError::InvalidHandle { handle: h.0, site })
    }

    #[track_caller]
    pub fn precision(&self, h: HandleId) -> Result<Precision> {
        Ok(self.handle(h)?.precision)
    }

    #[track_caller]
    pub fn set_precision(&mut self, h: HandleId, precision: Precision) -> Result<()> {
        self.handle_mut(h)?.precision = precision;
        Ok(())
    }

    #[track_caller]
    pub fn debug(&self, h: HandleId) -> Result<bool> {
        Ok(self.handle(h)?.debug)
    }

    #[track_caller]
    pub fn set_debug(&mut self, h: HandleId, debug: bool) -> Result<()> {
        self.handle_mut(h)?.debug = debug;
        Ok(())
    }

    #[track_caller]
    pub fn format(&self, h: HandleId) -> Result<FormatTag> {
        Ok(self.handle(h)?.tag)
    }

    /// Override the format tag.  Takes effect at the next `select`.
    #[track_caller]
    pub fn set_format(&mut self, h: HandleId, tag: FormatTag) -> Result<()> {
        self.handle_mut(h)?.tag = tag;
        Ok(())
    }

    #[track_caller]
    pub fn name(&self, h: HandleId) -> Result<&str> {
        Ok(&self.handle(h)?.filename)
    }

    #[track_caller]
    pub fn is_read(&self, h: HandleId) -> Result<bool> {
        Ok(self.handle(h)?.read)
    }

    #[track_caller]
    pub fn set_read(&mut self, h: HandleId, read: bool) -> Result<()> {
        self.handle_mut(h)?.read = read;
        Ok(())
    }

    /// The stream behind a text or native-binary handle.
    #[track_caller]
    pub fn stream_mut(&mut self, h: HandleId) -> Result<Option<&mut Stream>> {
        Ok(match &mut self.handle_mut(h)?.channel {
            Channel::Stream(s) => Some(s),
            #[allow(unreachable_patterns)]
            _ => None,
        })
    }

    /// The XDR channel behind a portable-binary handle.
    #[cfg(feature = "portable")]
    #[track_caller]
    pub fn xdr_mut(&mut self, h: HandleId) -> Result<Option<&mut XdrStream>> {
        Ok(match &mut self.handle_mut(h)?.channel {
            Channel::Xdr(x) => Some(x),
            _ => None,
        })
    }

    // ── Positioning ──────────────────────────────────────────────────────────

    /// Move a stream-backed handle to absolute byte offset `pos`.
    #[track_caller]
    pub fn seek(&mut self, h: HandleId, pos: u64) -> Result<()> {
        let site = Location::caller();
        let handle = self.handle_mut(h)?;
        match &mut handle.channel {
            Channel::Stream(s) => {
                s.seek(SeekFrom::Start(pos))?;
                handle.scanner.reset();
                Ok(())
            }
            #[allow(unreachable_patterns)]
            _ => Err(FioError::NotSeekable { file: handle.filename.clone(), site }),
        }
    }

    #[track_caller]
    pub fn tell(&mut self, h: HandleId) -> Result<u64> {
        let site = Location::caller();
        let handle = self.handle_mut(h)?;
        match &mut handle.channel {
            Channel::Stream(s) => Ok(s.position()?),
            #[allow(unreachable_patterns)]
            _ => Err(FioError::NotSeekable { file: handle.filename.clone(), site }),
        }
    }

    /// Return to the start of the file.  Portable-binary handles are closed
    /// and reopened, for reading if the read flag is set and for writing
    /// (truncating) otherwise.
    #[track_caller]
    pub fn rewind(&mut self, h: HandleId) -> Result<()> {
        let handle = self.handle_mut(h)?;
        match &mut handle.channel {
            Channel::Stream(s) => {
                s.seek(SeekFrom::Start(0))?;
            }
            #[cfg(feature = "portable")]
            Channel::Xdr(x) => x.reopen(handle.read)?,
        }
        handle.scanner.reset();
        Ok(())
    }

    #[track_caller]
    pub fn flush(&mut self, h: HandleId) -> Result<()> {
        match &mut self.handle_mut(h)?.channel {
            Channel::Stream(s) => s.flush()?,
            #[cfg(feature = "portable")]
            Channel::Xdr(x) => x.flush()?,
        }
        Ok(())
    }
}
