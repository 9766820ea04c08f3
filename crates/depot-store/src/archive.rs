use flate2::read::GzDecoder;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

use depot_error::{DepotError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    File(Vec<u8>),
    Directory,
    /// Links, devices and other entries that are not unpacked.
    Other,
}

/// One archive member with the wrapper directory already stripped from
/// its path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: PathBuf,
    pub kind: EntryKind,
}

/// Lazy reader over a gzip-compressed tarball.
///
/// Entries are decoded one at a time, in archive order, and can only be
/// walked once.
pub struct ArchiveReader<R: Read> {
    package: String,
    archive: tar::Archive<GzDecoder<R>>,
}

impl<R: Read> ArchiveReader<R> {
    pub fn new(package: &str, source: R) -> Self {
        Self {
            package: package.to_string(),
            archive: tar::Archive::new(GzDecoder::new(source)),
        }
    }

    pub fn entries(&mut self) -> Result<impl Iterator<Item = Result<ArchiveEntry>> + '_> {
        let package = self.package.clone();
        let entries = self
            .archive
            .entries()
            .map_err(|e| DepotError::format(&package, format!("unreadable archive: {e}")))?;

        Ok(entries.filter_map(move |entry| read_entry(&package, entry).transpose()))
    }
}

fn read_entry<R: Read>(
    package: &str,
    entry: io::Result<tar::Entry<'_, R>>,
) -> Result<Option<ArchiveEntry>> {
    let mut entry =
        entry.map_err(|e| DepotError::format(package, format!("corrupt archive entry: {e}")))?;

    let raw_path = entry
        .path()
        .map_err(|e| DepotError::format(package, format!("bad entry path: {e}")))?
        .into_owned();

    let Some(path) = strip_wrapper(&raw_path)
        .map_err(|reason| DepotError::format(package, reason))?
    else {
        return Ok(None);
    };

    let entry_type = entry.header().entry_type();
    let kind = if entry_type.is_file() {
        let mut contents = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
        entry.read_to_end(&mut contents).map_err(|e| {
            DepotError::format(
                package,
                format!("failed to read {}: {e}", raw_path.display()),
            )
        })?;
        EntryKind::File(contents)
    } else if entry_type.is_dir() {
        EntryKind::Directory
    } else {
        EntryKind::Other
    };

    Ok(Some(ArchiveEntry { path, kind }))
}

/// Drops the first path component (the registry's `package/` folder, whatever
/// it is called) and returns the rest.
///
/// `Ok(None)` means nothing is left, as for the wrapper directory itself.
/// Paths that would escape the package directory are rejected.
pub fn strip_wrapper(path: &Path) -> std::result::Result<Option<PathBuf>, String> {
    let mut wrapper_seen = false;
    let mut stripped = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::Normal(part) => {
                if wrapper_seen {
                    stripped.push(part);
                } else {
                    wrapper_seen = true;
                }
            }
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(format!("unsafe entry path {}", path.display()));
            }
        }
    }

    if stripped.as_os_str().is_empty() {
        Ok(None)
    } else {
        Ok(Some(stripped))
    }
}
