pub mod install;
pub mod resolve;

pub use install::InstallHandler;
pub use resolve::ResolveHandler;

use anyhow::Result;
use std::path::Path;
use std::time::Duration;

use depot_core::InstallConfig;

use crate::commands::RegistryArgs;

/// `.depotrc` and environment first, then whatever was passed on the command line.
pub(crate) fn load_config(args: &RegistryArgs) -> Result<InstallConfig> {
    let mut config = InstallConfig::load(Path::new("."))?;
    apply_registry_args(&mut config, args);
    config.validate()?;
    Ok(config)
}

pub(crate) fn apply_registry_args(config: &mut InstallConfig, args: &RegistryArgs) {
    config.apply_registry_override(args.registry.clone());
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(secs) = args.timeout {
        config.timeout = Duration::from_secs(secs);
    }
}
