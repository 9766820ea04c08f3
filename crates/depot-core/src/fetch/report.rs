use std::fmt;
use std::path::PathBuf;

use depot_error::DepotError;

use super::state::FetchState;

/// A package whose archive was fully unpacked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPackage {
    pub name: String,
    pub version: String,
    /// Paths relative to the package directory.
    pub files: Vec<PathBuf>,
}

#[derive(Debug)]
pub struct FetchFailure {
    pub name: String,
    /// State the task was in when the error hit.
    pub stage: FetchState,
    pub error: DepotError,
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed while {}: {}", self.name, self.stage, self.error)
    }
}

/// Outcome of a whole fetch run, available once every task has finished.
#[derive(Debug, Default)]
pub struct FetchReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<FetchFailure>,
}

impl FetchReport {
    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}
