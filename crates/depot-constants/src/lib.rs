pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DESCRIPTION: &str = "Resolves and installs npm dependency trees concurrently";
pub const BIN_NAME: &str = "depot";

pub const USER_AGENT: &str = "depot/0.1.0";
pub const REGISTRY_URL: &str = "https://registry.npmjs.org";
pub const REGISTRY_ENV: &str = "DEPOT_REGISTRY";
pub const CONFIG_FILE: &str = ".depotrc";
pub const DEFAULT_INSTALL_DIR: &str = "node_modules";

/// Selector that is passed through version extraction untouched.
pub const LATEST_TAG: &str = "latest";

pub const MAX_ATTEMPTS: u32 = 4;
pub const REQUEST_TIMEOUT_SECS: u64 = 45;
pub const CONNECT_TIMEOUT_SECS: u64 = 20;

pub const MIN_CONCURRENCY: usize = 8;
pub const MAX_CONCURRENCY: usize = 64;
