use std::path::{Component, Path, PathBuf};

use depot_error::{DepotError, Result};

/// `<root>/<name>`, with scoped names nested as `<root>/@scope/name`.
///
/// Names come from registry manifests, so anything that is not a single
/// plain segment or `@scope/name` is rejected rather than joined.
pub fn package_install_path(root: &Path, package_name: &str) -> Result<PathBuf> {
    let segments: Vec<&str> = package_name.split('/').collect();
    match segments.as_slice() {
        [name] if is_plain_segment(name) && !name.starts_with('@') => Ok(root.join(name)),
        [scope, name]
            if scope.len() > 1
                && scope.starts_with('@')
                && is_plain_segment(scope)
                && is_plain_segment(name)
                && !name.starts_with('@') =>
        {
            Ok(root.join(scope).join(name))
        }
        _ => Err(DepotError::format(
            package_name,
            "package name is not a valid install directory",
        )),
    }
}

fn is_plain_segment(segment: &str) -> bool {
    let mut components = Path::new(segment).components();
    !segment.contains('\\')
        && matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        )
}

/// Last segment of a possibly scoped name, as used in tarball file names.
#[must_use]
pub fn package_basename(package_name: &str) -> &str {
    package_name
        .rsplit_once('/')
        .map_or(package_name, |(_, name)| name)
}
