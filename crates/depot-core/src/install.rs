use std::sync::Arc;

use depot_error::{DepotError, Result};
use depot_registry::{ArchiveSource, DependencySource, RegistryClient};
use depot_resolver::{DependencyMap, ResolveStats, Resolver};
use depot_store::{InstallTarget, LocalFs};
use depot_utils::PackageSpec;

use crate::config::InstallConfig;
use crate::fetch::{FetchReport, FetchedPackage, Fetcher};

pub struct InstallSummary {
    pub resolved: DependencyMap,
    pub stats: ResolveStats,
    pub report: FetchReport,
}

impl InstallSummary {
    #[must_use]
    pub fn is_success(&self) -> bool {
        !self.stats.root_failed && self.report.is_complete()
    }
}

/// Resolve-then-fetch pipeline over the live registry and local disk.
pub struct InstallManager {
    config: InstallConfig,
}

impl InstallManager {
    #[must_use]
    pub const fn new(config: InstallConfig) -> Self {
        Self { config }
    }

    pub fn install<F>(&self, root: &PackageSpec, on_complete: F) -> Result<InstallSummary>
    where
        F: FnMut(&FetchedPackage),
    {
        let client = Arc::new(self.client()?);
        runtime()?.block_on(install_with(
            client,
            Arc::new(LocalFs),
            &self.config,
            root,
            on_complete,
        ))
    }

    pub fn resolve(&self, root: &PackageSpec) -> Result<(DependencyMap, ResolveStats)> {
        let client = Arc::new(self.client()?);
        let resolver = Resolver::new(client, self.config.concurrency);
        Ok(runtime()?.block_on(resolver.resolve_with_stats(&root.name, &root.selector)))
    }

    fn client(&self) -> Result<RegistryClient> {
        RegistryClient::new(&self.config.registry, self.config.timeout)
    }
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| DepotError::Task(format!("Failed to create async runtime: {e}")))
}

/// Resolves `root`, then fetches everything resolved. `on_complete` sees each
/// package as soon as it is unpacked.
pub async fn install_with<S, T, F>(
    source: Arc<S>,
    target: Arc<T>,
    config: &InstallConfig,
    root: &PackageSpec,
    mut on_complete: F,
) -> Result<InstallSummary>
where
    S: DependencySource + ArchiveSource,
    T: InstallTarget,
    F: FnMut(&FetchedPackage),
{
    let resolver = Resolver::new(Arc::clone(&source), config.concurrency);
    let (mut resolved, stats) = resolver
        .resolve_with_stats(&root.name, &root.selector)
        .await;

    // A root that could not be looked up is not fetched either.
    if config.include_root && !stats.root_failed {
        resolved.insert_if_absent(&root.name, &root.selector);
    }
    depot_logger::status(&format!("Fetching {} packages...", resolved.len()));

    let fetcher = Fetcher::new(source, target, config.concurrency).force(config.force);
    let mut handle = fetcher.fetch_all(&resolved, &config.install_dir);
    while let Some(package) = handle.next().await {
        on_complete(&package);
    }
    let report = handle.finish().await?;

    Ok(InstallSummary {
        resolved,
        stats,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use indexmap::IndexMap;
    use std::collections::HashMap;

    fn tarball(name: &str) -> Vec<u8> {
        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
        let contents = format!("module.exports = '{name}';");
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, "package/index.js", contents.as_bytes())
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap()
    }

    /// Registry where every `name@version` has a manifest and a tarball.
    #[derive(Default)]
    struct FakeRegistry {
        manifests: HashMap<String, Vec<(&'static str, &'static str)>>,
        downloads: std::sync::Mutex<Vec<String>>,
    }

    impl FakeRegistry {
        fn with(mut self, key: &str, deps: &[(&'static str, &'static str)]) -> Self {
            self.manifests.insert(key.to_string(), deps.to_vec());
            self
        }
    }

    impl DependencySource for FakeRegistry {
        async fn lookup_dependencies(
            &self,
            name: &str,
            version: &str,
        ) -> Result<IndexMap<String, String>> {
            let deps = self
                .manifests
                .get(&format!("{name}@{version}"))
                .ok_or_else(|| DepotError::network(name, "HTTP 404"))?;
            Ok(deps
                .iter()
                .map(|(n, v)| ((*n).to_string(), (*v).to_string()))
                .collect())
        }
    }

    impl ArchiveSource for FakeRegistry {
        async fn download_archive(&self, name: &str, version: &str) -> Result<Vec<u8>> {
            let key = format!("{name}@{version}");
            if !self.manifests.contains_key(&key) {
                return Err(DepotError::network(name, "HTTP 404"));
            }
            self.downloads.lock().unwrap().push(key);
            Ok(tarball(name))
        }
    }

    fn scenario() -> FakeRegistry {
        FakeRegistry::default()
            .with("app@1.0.0", &[("a", "1.0.0"), ("b", "^1.0.0")])
            .with("a@1.0.0", &[])
            .with("a@2.0.0", &[])
            .with("b@1.0.0", &[("a", "2.0.0")])
    }

    fn config(dir: &std::path::Path, include_root: bool) -> InstallConfig {
        InstallConfig {
            install_dir: dir.to_path_buf(),
            include_root,
            concurrency: 4,
            ..InstallConfig::default()
        }
    }

    fn spec(name: &str, selector: &str) -> PackageSpec {
        PackageSpec {
            name: name.to_string(),
            selector: selector.to_string(),
        }
    }

    #[tokio::test]
    async fn test_diamond_fetches_each_package_once() {
        let temp_dir = tempfile::tempdir().unwrap();
        let registry = Arc::new(scenario());
        let mut completed = Vec::new();

        let summary = install_with(
            Arc::clone(&registry),
            Arc::new(LocalFs),
            &config(temp_dir.path(), false),
            &spec("app", "1.0.0"),
            |package| completed.push(package.name.clone()),
        )
        .await
        .unwrap();

        let expected: DependencyMap = [("a", "1.0.0"), ("b", "^1.0.0")].into_iter().collect();
        assert_eq!(summary.resolved, expected);
        assert!(summary.is_success());

        completed.sort();
        assert_eq!(completed, ["a", "b"]);

        let mut downloads = registry.downloads.lock().unwrap().clone();
        downloads.sort();
        assert_eq!(downloads, ["a@1.0.0", "b@1.0.0"]);
        assert!(temp_dir.path().join("a/index.js").is_file());
        assert!(!temp_dir.path().join("app").exists());
    }

    #[tokio::test]
    async fn test_root_included_when_requested() {
        let temp_dir = tempfile::tempdir().unwrap();
        let registry = Arc::new(scenario());

        let summary = install_with(
            registry,
            Arc::new(LocalFs),
            &config(temp_dir.path(), true),
            &spec("app", "1.0.0"),
            |_| {},
        )
        .await
        .unwrap();

        assert_eq!(summary.report.succeeded.len(), 3);
        assert!(temp_dir.path().join("app/index.js").is_file());
    }

    #[tokio::test]
    async fn test_unknown_root_is_not_success() {
        let temp_dir = tempfile::tempdir().unwrap();

        let summary = install_with(
            Arc::new(scenario()),
            Arc::new(LocalFs),
            &config(temp_dir.path(), false),
            &spec("ghost", "1.0.0"),
            |_| {},
        )
        .await
        .unwrap();

        assert!(summary.resolved.is_empty());
        assert!(summary.stats.root_failed);
        assert!(!summary.is_success());
    }

    #[tokio::test]
    async fn test_unknown_root_not_fetched_when_included() {
        let temp_dir = tempfile::tempdir().unwrap();
        let registry = Arc::new(scenario());

        let summary = install_with(
            Arc::clone(&registry),
            Arc::new(LocalFs),
            &config(temp_dir.path(), true),
            &spec("ghost", "1.0.0"),
            |_| {},
        )
        .await
        .unwrap();

        assert!(summary.stats.root_failed);
        assert!(summary.resolved.is_empty());
        assert_eq!(summary.report.total(), 0);
        assert!(registry.downloads.lock().unwrap().is_empty());
        assert!(!temp_dir.path().join("ghost").exists());
    }
}
