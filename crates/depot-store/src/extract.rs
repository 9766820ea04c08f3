use std::io::Read;
use std::path::{Path, PathBuf};

use depot_error::Result;

use crate::archive::{ArchiveReader, EntryKind};
use crate::target::InstallTarget;

/// Writes every archive entry under `package_dir` and returns the relative
/// paths of the files written.
///
/// Stops at the first failure. Files written before it stay on disk.
pub fn unpack_into<T, R>(
    target: &T,
    reader: &mut ArchiveReader<R>,
    package_dir: &Path,
) -> Result<Vec<PathBuf>>
where
    T: InstallTarget + ?Sized,
    R: Read,
{
    let mut written = Vec::new();

    for entry in reader.entries()? {
        let entry = entry?;
        let dest = package_dir.join(&entry.path);

        match entry.kind {
            EntryKind::File(contents) => {
                if entry.path.components().count() > 1 {
                    if let Some(parent) = dest.parent() {
                        target.ensure_dir(parent)?;
                    }
                }
                target.write_file(&dest, &contents)?;
                written.push(entry.path);
            }
            EntryKind::Directory => target.ensure_dir(&dest)?,
            EntryKind::Other => {
                depot_logger::debug(&format!("Skipping non-file entry {}", entry.path.display()));
            }
        }
    }

    Ok(written)
}
