//! File format tags and their partition into I/O families.
//!
//! Every [`FormatTag`] belongs to at most one of the three tag sets below.
//! Tags outside all three sets can be opened but never selected for item I/O.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Which item codec handles a format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormatFamily {
    Text,
    NativeBinary,
    PortableBinary,
}

impl FormatFamily {
    pub fn name(self) -> &'static str {
        match self {
            FormatFamily::Text           => "text",
            FormatFamily::NativeBinary   => "native-binary",
            FormatFamily::PortableBinary => "portable-binary",
        }
    }
}

impl fmt::Display for FormatFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// On-disk format classification, derived from a file's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatTag {
    // portable binary
    Tpr,
    Trr,
    Edr,
    Xtc,
    // text
    Tpa,
    Gro,
    Pdb,
    // native binary
    Tpb,
    Trj,
    Mtx,
    Ene,
    // not item-structured
    Top,
    Ndx,
    Log,
    Mdp,
    Xvg,
    Unknown,
}

pub const PORTABLE_FORMATS: &[FormatTag] = &[FormatTag::Tpr, FormatTag::Trr, FormatTag::Edr, FormatTag::Xtc];
pub const TEXT_FORMATS:     &[FormatTag] = &[FormatTag::Tpa, FormatTag::Gro, FormatTag::Pdb];
pub const NATIVE_FORMATS:   &[FormatTag] = &[FormatTag::Tpb, FormatTag::Trj, FormatTag::Mtx, FormatTag::Ene];

/// Every tag with a file extension, in declaration order.
pub const ALL_FORMATS: &[FormatTag] = &[
    FormatTag::Tpr, FormatTag::Trr, FormatTag::Edr, FormatTag::Xtc,
    FormatTag::Tpa, FormatTag::Gro, FormatTag::Pdb,
    FormatTag::Tpb, FormatTag::Trj, FormatTag::Mtx, FormatTag::Ene,
    FormatTag::Top, FormatTag::Ndx, FormatTag::Log, FormatTag::Mdp, FormatTag::Xvg,
];

impl FormatTag {
    /// The tag used for standard-stream handles.
    pub const STDIO: FormatTag = FormatTag::Tpa;

    /// File extension without the dot.  `Unknown` has none.
    pub fn extension(self) -> &'static str {
        match self {
            FormatTag::Tpr     => "tpr",
            FormatTag::Trr     => "trr",
            FormatTag::Edr     => "edr",
            FormatTag::Xtc     => "xtc",
            FormatTag::Tpa     => "tpa",
            FormatTag::Gro     => "gro",
            FormatTag::Pdb     => "pdb",
            FormatTag::Tpb     => "tpb",
            FormatTag::Trj     => "trj",
            FormatTag::Mtx     => "mtx",
            FormatTag::Ene     => "ene",
            FormatTag::Top     => "top",
            FormatTag::Ndx     => "ndx",
            FormatTag::Log     => "log",
            FormatTag::Mdp     => "mdp",
            FormatTag::Xvg     => "xvg",
            FormatTag::Unknown => "",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        ALL_FORMATS.iter().copied().find(|t| t.extension() == ext)
    }

    /// Classify a path by its extension; unrecognised or missing extensions
    /// yield [`FormatTag::Unknown`].
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        path.as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
            .unwrap_or(FormatTag::Unknown)
    }

    /// The family whose tag set contains this tag, if any.
    pub fn family(self) -> Option<FormatFamily> {
        if PORTABLE_FORMATS.contains(&self) {
            Some(FormatFamily::PortableBinary)
        } else if TEXT_FORMATS.contains(&self) {
            Some(FormatFamily::Text)
        } else if NATIVE_FORMATS.contains(&self) {
            Some(FormatFamily::NativeBinary)
        } else {
            None
        }
    }
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatTag::Unknown => f.pad("unknown"),
            other              => f.pad(other.extension()),
        }
    }
}
