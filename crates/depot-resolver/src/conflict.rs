use semver::{Version, VersionReq};

use depot_utils::extract_version;

/// Whether a selector that lost the first-writer race asks for something the
/// kept selector's version cannot satisfy.
///
/// Purely diagnostic. Selectors that don't parse (npm-only syntax like
/// `1.x` or space-separated ranges) never count as conflicts.
#[must_use]
pub fn selectors_conflict(kept: &str, requested: &str) -> bool {
    let Ok(kept_version) = Version::parse(&extract_version(kept)) else {
        return false;
    };

    let requested = requested.trim();
    // npm treats a bare version as exact, semver's VersionReq as caret.
    if let Ok(exact) = Version::parse(requested) {
        return exact != kept_version;
    }

    VersionReq::parse(requested).is_ok_and(|req| !req.matches(&kept_version))
}
