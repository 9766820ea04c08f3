pub mod archive;
pub mod extract;
pub mod target;

pub use archive::{ArchiveEntry, ArchiveReader, EntryKind, strip_wrapper};
pub use extract::unpack_into;
pub use target::{InstallTarget, LocalFs};
