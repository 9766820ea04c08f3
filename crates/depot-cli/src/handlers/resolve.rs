use anyhow::{Result, bail};

use depot_resolver::DependencyMap;
use depot_utils::parse_package_spec;

use crate::commands::RegistryArgs;

pub struct ResolveHandler;

impl ResolveHandler {
    pub fn resolve(package: &str, json: bool, registry: &RegistryArgs) -> Result<()> {
        let root = parse_package_spec(package);
        let config = super::load_config(registry)?;

        let (resolved, stats) = depot_core::resolve_package(config, &root)?;
        depot_logger::finish_line("");

        if stats.root_failed {
            bail!("could not resolve {}@{}", root.name, root.selector);
        }

        if json {
            println!("{}", Self::render_json(&resolved)?);
        } else {
            for (name, selector) in &resolved {
                println!("{name}@{selector}");
            }
        }

        if stats.conflicts > 0 {
            depot_logger::info(&format!(
                "{} requested versions differ from the one kept",
                stats.conflicts
            ));
        }
        if stats.failed_lookups > 0 {
            depot_logger::warn(&format!(
                "{} lookups failed; their dependencies are missing",
                stats.failed_lookups
            ));
        }
        depot_logger::finish(&format!("Resolved {} packages", resolved.len()));
        Ok(())
    }

    fn render_json(resolved: &DependencyMap) -> Result<String> {
        let object: serde_json::Map<String, serde_json::Value> = resolved
            .iter()
            .map(|(name, selector)| (name.clone(), serde_json::Value::from(selector.as_str())))
            .collect();
        Ok(serde_json::to_string_pretty(&object)?)
    }
}
