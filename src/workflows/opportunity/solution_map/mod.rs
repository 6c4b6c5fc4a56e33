//! Per-deal solution map: a domain → category → solution tree with share
//! allocation rules, plus immutable named snapshots of it.

mod content;
mod store;

pub use content::{Category, Domain, Solution, SolutionMapContent};
pub use store::{
    suggested_snapshot_title, CategorySummary, DomainSummary, MapSummary, SavedMap,
    SolutionMapStore,
};

use super::domain::DealId;
use super::repository::RepositoryError;

/// Share ceiling for a single category.
pub const MAX_CATEGORY_SHARE: u32 = 100;

/// Successful result of a map operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapOutcome {
    Applied,
    /// Accepted as a no-op; nothing was written.
    Unchanged,
}

impl MapOutcome {
    pub const fn code(self) -> &'static str {
        "SUCCESS"
    }

    pub const fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Rejections raised by the solution map. A failed call leaves the map untouched.
#[derive(Debug, thiserror::Error)]
pub enum SolutionMapError {
    #[error("name already exists at this level")]
    Duplicate,
    #[error("share allocation exceeds 100 (already allocated {allocated}, requested {requested})")]
    Overflow { allocated: u32, requested: u32 },
    #[error("referenced domain or category does not exist")]
    InvalidTarget,
    #[error("no solution at index {index}")]
    InvalidIndex { index: usize },
    #[error("deal {0} not found")]
    DealNotFound(DealId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl SolutionMapError {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Duplicate => "DUPLICATE",
            Self::Overflow { .. } => "OVERFLOW",
            Self::InvalidTarget => "INVALID_TARGET",
            Self::InvalidIndex { .. } => "INVALID_INDEX",
            Self::DealNotFound(_) => "DEAL_NOT_FOUND",
            Self::Repository(_) => "REPOSITORY",
        }
    }
}
