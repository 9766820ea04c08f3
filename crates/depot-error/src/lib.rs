use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum DepotError {
    Network { package: String, message: String },
    Format { package: String, message: String },
    Io { path: PathBuf, source: io::Error },
    Config(String),
    Task(String),
}

impl DepotError {
    pub fn network(package: &str, message: impl fmt::Display) -> Self {
        Self::Network {
            package: package.to_string(),
            message: message.to_string(),
        }
    }

    pub fn format(package: &str, message: impl fmt::Display) -> Self {
        Self::Format {
            package: package.to_string(),
            message: message.to_string(),
        }
    }

    pub fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// True for errors that came from the filesystem rather than the registry.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

impl fmt::Display for DepotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network { package, message } => {
                write!(f, "Network error for {package}: {message}")
            }
            Self::Format { package, message } => {
                write!(f, "Malformed data for {package}: {message}")
            }
            Self::Io { path, source } => {
                write!(f, "IO error at {}: {source}", path.display())
            }
            Self::Config(msg) => {
                write!(f, "Configuration error: {msg}")
            }
            Self::Task(msg) => {
                write!(f, "Task error: {msg}")
            }
        }
    }
}

impl std::error::Error for DepotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, DepotError>;
