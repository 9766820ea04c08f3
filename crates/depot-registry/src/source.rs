use indexmap::IndexMap;
use std::future::Future;
use std::sync::Arc;

use depot_error::Result;

/// Answers "what does `name@version` depend on".
///
/// The returned map goes from dependency name to the raw selector the
/// manifest declared (`^1.2.0`, `latest`, ...). An empty map ends the branch.
pub trait DependencySource: Send + Sync + 'static {
    fn lookup_dependencies(
        &self,
        name: &str,
        version: &str,
    ) -> impl Future<Output = Result<IndexMap<String, String>>> + Send;
}

/// Produces the compressed archive bytes for `name@version`.
pub trait ArchiveSource: Send + Sync + 'static {
    fn download_archive(
        &self,
        name: &str,
        version: &str,
    ) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

impl<T: DependencySource> DependencySource for Arc<T> {
    fn lookup_dependencies(
        &self,
        name: &str,
        version: &str,
    ) -> impl Future<Output = Result<IndexMap<String, String>>> + Send {
        (**self).lookup_dependencies(name, version)
    }
}

impl<T: ArchiveSource> ArchiveSource for Arc<T> {
    fn download_archive(
        &self,
        name: &str,
        version: &str,
    ) -> impl Future<Output = Result<Vec<u8>>> + Send {
        (**self).download_archive(name, version)
    }
}
