pub mod conflict;
pub mod dependency_map;
pub mod resolver;

pub use conflict::selectors_conflict;
pub use dependency_map::DependencyMap;
pub use resolver::{ResolveStats, Resolver};
