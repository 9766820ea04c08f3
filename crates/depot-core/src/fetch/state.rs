use std::fmt;

use depot_error::DepotError;

use super::report::FetchFailure;

/// Lifecycle of one fetch task. `Done` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Pending,
    DirectoryCreated,
    Downloaded,
    Extracting,
    Done,
    Failed,
}

impl FetchState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// The single forward step allowed from this state.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::DirectoryCreated),
            Self::DirectoryCreated => Some(Self::Downloaded),
            Self::Downloaded => Some(Self::Extracting),
            Self::Extracting => Some(Self::Done),
            Self::Done | Self::Failed => None,
        }
    }
}

impl fmt::Display for FetchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::DirectoryCreated => "directory created",
            Self::Downloaded => "downloaded",
            Self::Extracting => "extracting",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Tracks where a single package is in its lifecycle.
pub(crate) struct FetchTracker {
    name: String,
    state: FetchState,
}

impl FetchTracker {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            state: FetchState::Pending,
        }
    }

    pub(crate) const fn state(&self) -> FetchState {
        self.state
    }

    /// Moves one step forward. Terminal states never move.
    pub(crate) fn advance(&mut self) {
        if let Some(next) = self.state.next() {
            depot_logger::debug(&format!("{}: {} -> {next}", self.name, self.state));
            self.state = next;
        }
    }

    /// Enters `Failed`, recording the state the error interrupted.
    pub(crate) fn fail(&mut self, error: DepotError) -> FetchFailure {
        let stage = self.state;
        self.state = FetchState::Failed;
        FetchFailure {
            name: self.name.clone(),
            stage,
            error,
        }
    }
}
