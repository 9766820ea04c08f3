pub mod config;
pub mod fetch;
pub mod install;

pub use config::InstallConfig;
pub use fetch::{FetchFailure, FetchHandle, FetchReport, FetchState, FetchedPackage, Fetcher};
pub use install::{InstallManager, InstallSummary, install_with};

use depot_resolver::{DependencyMap, ResolveStats};
use depot_utils::PackageSpec;

pub fn install_package<F>(
    config: InstallConfig,
    root: &PackageSpec,
    on_complete: F,
) -> anyhow::Result<InstallSummary>
where
    F: FnMut(&FetchedPackage),
{
    let manager = InstallManager::new(config);
    manager
        .install(root, on_complete)
        .map_err(|e| anyhow::anyhow!(e))
}

pub fn resolve_package(
    config: InstallConfig,
    root: &PackageSpec,
) -> anyhow::Result<(DependencyMap, ResolveStats)> {
    let manager = InstallManager::new(config);
    manager.resolve(root).map_err(|e| anyhow::anyhow!(e))
}
