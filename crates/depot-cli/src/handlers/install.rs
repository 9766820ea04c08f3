use anyhow::{Result, bail};
use owo_colors::OwoColorize;
use std::path::PathBuf;

use depot_utils::parse_package_spec;

use crate::commands::{OutputArgs, RegistryArgs};

pub struct InstallHandler;

impl InstallHandler {
    pub fn install(
        package: &str,
        dir: Option<PathBuf>,
        deps_only: bool,
        force: bool,
        registry: &RegistryArgs,
        output: OutputArgs,
    ) -> Result<()> {
        let root = parse_package_spec(package);
        let mut config = super::load_config(registry)?;
        if let Some(dir) = dir {
            config.install_dir = dir;
        }
        config.include_root = !deps_only;
        config.force = force;

        if !output.quiet {
            Self::print_header(&format!("{}@{}", root.name, root.selector));
        }

        let mut completed = 0usize;
        let summary = depot_core::install_package(config, &root, |package| {
            completed += 1;
            depot_logger::success(&format!(
                "{}@{} ({} files)",
                package.name,
                package.version,
                package.files.len()
            ));
        })?;

        if summary.stats.conflicts > 0 {
            depot_logger::info(&format!(
                "{} requested versions differ from the one kept",
                summary.stats.conflicts
            ));
        }

        if summary.stats.root_failed {
            bail!("could not resolve {}@{}", root.name, root.selector);
        }

        let failed = summary.report.failed.len();
        if failed > 0 {
            depot_logger::finish(&format!(
                "Installed {completed} of {} packages",
                summary.report.total()
            ));
            bail!("{failed} packages failed to install");
        }

        depot_logger::finish(&format!("Installed {completed} packages"));
        Ok(())
    }

    fn print_header(package: &str) {
        println!(
            "{} {} {}",
            "depot".bright_cyan().bold(),
            "install".bright_white(),
            package.bright_white()
        );
        println!();
    }
}
