pub mod error;
pub mod format;
pub mod item;
pub mod scanner;
pub mod stream;
#[cfg(feature = "portable")]
pub mod xdr;
pub mod backup;
pub mod codec;
pub mod registry;
pub mod schema;

pub use error::{FioError, Op, Result};
pub use format::{FormatFamily, FormatTag};
pub use item::{IVec, Item, ItemKind, ItemMut, Precision, RVec, Real, Value, DIM};
pub use scanner::Scanner;
pub use stream::{Mode, Stream};
pub use backup::{BackupNamer, NumberedBackup};
pub use codec::{get_codec, ItemCodec};
pub use registry::{FileHandle, HandleId, Registry, RegistryOptions};
pub use schema::{ItemSpec, Schema, SchemaError};
