use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;

use depot_registry::DependencySource;
use depot_utils::extract_version;

use crate::conflict::selectors_conflict;
use crate::dependency_map::DependencyMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveStats {
    pub lookups: usize,
    pub failed_lookups: usize,
    /// The root's own lookup failed, so nothing below it was discovered.
    pub root_failed: bool,
    /// Skipped selectors the kept version does not satisfy.
    pub conflicts: usize,
}

/// Result of a single lookup task: the names it inserted into the shared map
/// and which still need their own lookup.
#[derive(Default)]
struct LookupOutcome {
    discovered: Vec<(String, String)>,
    conflicts: usize,
    failed: bool,
}

impl LookupOutcome {
    fn failed() -> Self {
        Self {
            failed: true,
            ..Self::default()
        }
    }
}

/// Expands a root package into its flat transitive dependency map, one
/// concurrent lookup per newly discovered name.
pub struct Resolver<S> {
    source: Arc<S>,
    limiter: Arc<Semaphore>,
}

impl<S: DependencySource> Resolver<S> {
    pub fn new(source: Arc<S>, concurrency: usize) -> Self {
        Self {
            source,
            limiter: Arc::new(Semaphore::new(concurrency.clamp(1, Semaphore::MAX_PERMITS))),
        }
    }

    pub async fn resolve(&self, root_name: &str, root_selector: &str) -> DependencyMap {
        self.resolve_with_stats(root_name, root_selector).await.0
    }

    /// Runs until the root lookup and every lookup it transitively spawned
    /// have finished. Failed lookups are logged and end only their branch.
    pub async fn resolve_with_stats(
        &self,
        root_name: &str,
        root_selector: &str,
    ) -> (DependencyMap, ResolveStats) {
        let shared = Arc::new(Mutex::new(DependencyMap::new()));
        let mut tasks = JoinSet::new();
        let mut stats = ResolveStats::default();

        self.spawn_lookup(
            &mut tasks,
            &shared,
            root_name.to_string(),
            root_selector.to_string(),
        );

        while let Some(joined) = tasks.join_next().await {
            // The root is the only task until it completes.
            let is_root = stats.lookups == 0;
            stats.lookups += 1;
            match joined {
                Ok(outcome) => {
                    if outcome.failed {
                        stats.failed_lookups += 1;
                        stats.root_failed |= is_root;
                    }
                    stats.conflicts += outcome.conflicts;
                    for (name, selector) in outcome.discovered {
                        self.spawn_lookup(&mut tasks, &shared, name, selector);
                    }
                    depot_logger::progress("Resolving dependencies", stats.lookups, 0);
                }
                Err(e) => {
                    stats.failed_lookups += 1;
                    stats.root_failed |= is_root;
                    depot_logger::error(&format!("Resolution task aborted: {e}"));
                }
            }
        }

        let map = std::mem::take(&mut *shared.lock().await);
        depot_logger::debug(&format!(
            "Resolved {} packages with {} lookups ({} failed)",
            map.len(),
            stats.lookups,
            stats.failed_lookups
        ));
        (map, stats)
    }

    fn spawn_lookup(
        &self,
        tasks: &mut JoinSet<LookupOutcome>,
        shared: &Arc<Mutex<DependencyMap>>,
        name: String,
        selector: String,
    ) {
        let source = Arc::clone(&self.source);
        let limiter = Arc::clone(&self.limiter);
        let shared = Arc::clone(shared);

        tasks.spawn(async move { lookup_one(source, limiter, shared, name, selector).await });
    }
}

async fn lookup_one<S: DependencySource>(
    source: Arc<S>,
    limiter: Arc<Semaphore>,
    shared: Arc<Mutex<DependencyMap>>,
    name: String,
    selector: String,
) -> LookupOutcome {
    let version = extract_version(&selector);

    let dependencies = {
        let Ok(_permit) = limiter.acquire().await else {
            return LookupOutcome::failed();
        };
        source.lookup_dependencies(&name, &version).await
    };

    let dependencies = match dependencies {
        Ok(dependencies) => dependencies,
        Err(e) => {
            depot_logger::warn(&format!("Failed to resolve {name}@{version}: {e}"));
            return LookupOutcome::failed();
        }
    };

    let mut outcome = LookupOutcome::default();
    if dependencies.is_empty() {
        return outcome;
    }

    // One lock for the whole batch keeps every check-and-insert atomic.
    let mut map = shared.lock().await;
    for (dep_name, dep_selector) in dependencies {
        if map.insert_if_absent(&dep_name, &dep_selector) {
            outcome.discovered.push((dep_name, dep_selector));
        } else if let Some(kept) = map.get(&dep_name) {
            if selectors_conflict(kept, &dep_selector) {
                outcome.conflicts += 1;
                depot_logger::debug(&format!(
                    "{name}@{version} wants {dep_name}@{dep_selector}, keeping {kept}"
                ));
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use depot_error::{DepotError, Result};
    use indexmap::IndexMap;
    use std::collections::{HashMap, HashSet};

    #[derive(Default)]
    struct FakeRegistry {
        manifests: HashMap<String, Vec<(&'static str, &'static str)>>,
        broken: HashSet<String>,
        calls: std::sync::Mutex<Vec<String>>,
    }

    impl FakeRegistry {
        fn with(mut self, key: &str, deps: &[(&'static str, &'static str)]) -> Self {
            self.manifests.insert(key.to_string(), deps.to_vec());
            self
        }

        fn broken(mut self, key: &str) -> Self {
            self.broken.insert(key.to_string());
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn calls_for(&self, name: &str) -> usize {
            let prefix = format!("{name}@");
            self.calls()
                .iter()
                .filter(|c| c.starts_with(&prefix))
                .count()
        }
    }

    impl DependencySource for FakeRegistry {
        async fn lookup_dependencies(
            &self,
            name: &str,
            version: &str,
        ) -> Result<IndexMap<String, String>> {
            let key = format!("{name}@{version}");
            self.calls.lock().unwrap().push(key.clone());
            tokio::task::yield_now().await;

            if self.broken.contains(&key) {
                return Err(DepotError::network(name, "HTTP 500"));
            }
            Ok(self
                .manifests
                .get(&key)
                .map(|deps| {
                    deps.iter()
                        .map(|(n, v)| ((*n).to_string(), (*v).to_string()))
                        .collect()
                })
                .unwrap_or_default())
        }
    }

    fn resolver(registry: FakeRegistry) -> (Arc<FakeRegistry>, Resolver<FakeRegistry>) {
        let registry = Arc::new(registry);
        (Arc::clone(&registry), Resolver::new(registry, 4))
    }

    #[tokio::test]
    async fn test_first_selector_wins() {
        let (registry, resolver) = resolver(
            FakeRegistry::default()
                .with("app@1.0.0", &[("a", "1.0.0"), ("b", "^1.0.0")])
                .with("b@1.0.0", &[("a", "2.0.0")]),
        );

        let (map, stats) = resolver.resolve_with_stats("app", "1.0.0").await;

        let expected: DependencyMap = [("a", "1.0.0"), ("b", "^1.0.0")].into_iter().collect();
        assert_eq!(map, expected);
        assert_eq!(stats.lookups, 3);
        assert_eq!(stats.conflicts, 1);
        assert!(!registry.calls().contains(&"a@2.0.0".to_string()));
    }

    #[tokio::test]
    async fn test_lookups_use_normalized_versions() {
        let (registry, resolver) = resolver(
            FakeRegistry::default().with("app@latest", &[("b", "^1.4.2"), ("c", "*")]),
        );

        resolver.resolve("app", "latest").await;

        let calls: HashSet<_> = registry.calls().into_iter().collect();
        let expected: HashSet<_> = ["app@latest", "b@1.4.2", "c@"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(calls, expected);
    }

    #[tokio::test]
    async fn test_diamond_visits_shared_once() {
        let (registry, resolver) = resolver(
            FakeRegistry::default()
                .with("root@1.0.0", &[("left", "1.0.0"), ("right", "1.0.0")])
                .with("left@1.0.0", &[("shared", "1.0.0")])
                .with("right@1.0.0", &[("shared", "^1.0.0")]),
        );

        let map = resolver.resolve("root", "1.0.0").await;

        assert_eq!(map.len(), 3);
        assert!(map.contains("shared"));
        assert_eq!(registry.calls_for("shared"), 1);
    }

    #[tokio::test]
    async fn test_cycle_terminates() {
        let (registry, resolver) = resolver(
            FakeRegistry::default()
                .with("root@1.0.0", &[("x", "1.0.0")])
                .with("x@1.0.0", &[("y", "1.0.0")])
                .with("y@1.0.0", &[("x", "1.0.0"), ("root", "1.0.0")]),
        );

        let map = resolver.resolve("root", "1.0.0").await;

        let names: HashSet<_> = map.names().collect();
        assert_eq!(names, HashSet::from(["x", "y", "root"]));
        assert_eq!(registry.calls_for("x"), 1);
        // Once as the root, once after y pulled it into the map.
        assert_eq!(registry.calls_for("root"), 2);
    }

    #[tokio::test]
    async fn test_failed_branch_does_not_stop_siblings() {
        let (_, resolver) = resolver(
            FakeRegistry::default()
                .with("root@1.0.0", &[("broken", "1.0.0"), ("ok", "1.0.0")])
                .with("ok@1.0.0", &[("leaf", "1.0.0")])
                .with("broken@1.0.0", &[("never", "1.0.0")])
                .broken("broken@1.0.0"),
        );

        let (map, stats) = resolver.resolve_with_stats("root", "1.0.0").await;

        assert!(map.contains("broken"));
        assert!(map.contains("leaf"));
        assert!(!map.contains("never"));
        assert_eq!(stats.failed_lookups, 1);
        assert!(!stats.root_failed);
    }

    #[tokio::test]
    async fn test_root_failure_yields_empty_map() {
        let (_, resolver) = resolver(FakeRegistry::default().broken("root@1.0.0"));

        let (map, stats) = resolver.resolve_with_stats("root", "1.0.0").await;

        assert!(map.is_empty());
        assert_eq!(stats.lookups, 1);
        assert_eq!(stats.failed_lookups, 1);
        assert!(stats.root_failed);
    }

    #[tokio::test]
    async fn test_runs_are_isolated() {
        let (_, resolver) = resolver(
            FakeRegistry::default()
                .with("root@1.0.0", &[("a", "1.0.0")])
                .with("a@1.0.0", &[("b", "1.0.0")]),
        );

        let first = resolver.resolve("root", "1.0.0").await;
        let second = resolver.resolve("root", "1.0.0").await;

        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_wide_graph_with_single_permit() {
        let deps: Vec<(&'static str, &'static str)> = vec![
            ("p0", "1.0.0"),
            ("p1", "1.0.0"),
            ("p2", "1.0.0"),
            ("p3", "1.0.0"),
            ("p4", "1.0.0"),
        ];
        let mut registry = FakeRegistry::default().with("root@1.0.0", &deps);
        for (name, _) in &deps {
            registry = registry.with(&format!("{name}@1.0.0"), &deps);
        }
        let resolver = Resolver::new(Arc::new(registry), 1);

        let (map, stats) = resolver.resolve_with_stats("root", "1.0.0").await;

        assert_eq!(map.len(), 5);
        assert_eq!(stats.lookups, 6);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_workers_look_up_each_name_once() {
        let names: Vec<&'static str> = (0..40)
            .map(|i| -> &'static str { Box::leak(format!("p{i}").into_boxed_str()) })
            .collect();
        let deps: Vec<(&'static str, &'static str)> =
            names.iter().map(|name| (*name, "1.0.0")).collect();

        for _ in 0..20 {
            let mut registry = FakeRegistry::default().with("root@1.0.0", &deps);
            for name in &names {
                registry = registry.with(&format!("{name}@1.0.0"), &deps);
            }
            let (registry, resolver) = resolver(registry);

            let (map, stats) = resolver.resolve_with_stats("root", "1.0.0").await;

            assert_eq!(map.len(), 40);
            assert_eq!(stats.lookups, 41);
            for name in &names {
                assert_eq!(registry.calls_for(name), 1, "{name}");
            }
        }
    }
}
