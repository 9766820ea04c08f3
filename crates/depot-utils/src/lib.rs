pub mod package_spec;
pub mod path_utils;
pub mod version_utils;

pub use package_spec::{PackageSpec, parse_package_spec};
pub use path_utils::*;
pub use version_utils::*;
