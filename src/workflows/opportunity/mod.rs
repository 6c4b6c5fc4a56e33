//! Opportunity data and scoring: deal aggregates, their solution maps, and
//! staged fit assessments.

pub mod assessment;
pub mod deals;
pub mod domain;
pub mod repository;
pub mod solution_map;

#[cfg(test)]
mod tests;

pub use assessment::{
    AssessmentEngine, AssessmentError, AssessmentRecord, Dimension, FitScores, Quadrant,
    ScoreConfig,
};
pub use deals::{DealService, DealServiceError};
pub use domain::{Deal, DealId, DealProfile, StageId};
pub use repository::{
    DealRepository, InMemoryDealRepository, JsonFileDealRepository, RepositoryError,
};
pub use solution_map::{
    MapOutcome, SavedMap, Solution, SolutionMapContent, SolutionMapError, SolutionMapStore,
};
