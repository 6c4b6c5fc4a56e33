//! Weighted fit assessment: per-stage item scores and category weights,
//! normalized into biz/tech fit scores and a quadrant.

mod config;
mod engine;
mod recommendations;
mod record;
mod rules;

pub use config::{item_key, CategoryDefinition, Dimension, ScoreConfig};
pub use engine::{AssessmentEngine, StageAssessment, StageSummary};
pub use recommendations::{
    requires_override_confirmation, Confidence, DimensionRecommendations, ItemRecommendation,
    RecommendationResponse, Recommendations, OVERRIDE_CONFIRMATION_GAP,
};
pub use record::{AssessmentRecord, DimensionAssessment};
pub use rules::{
    classify_quadrant, CategoryScore, CategoryScores, FitScores, Quadrant, QUADRANT_MIDPOINT,
};

use super::domain::{DealId, StageId};
use super::repository::RepositoryError;

pub const MIN_ITEM_SCORE: u8 = 1;
pub const MAX_ITEM_SCORE: u8 = 5;

/// Rejections raised by the assessment engine. A failed call leaves the record untouched.
#[derive(Debug, thiserror::Error)]
pub enum AssessmentError {
    #[error("item score {value} is outside 1..=5")]
    InvalidScore { value: i32 },
    #[error("{dimension} weights must total 100 (currently {sum})")]
    WeightSumInvalid { dimension: Dimension, sum: i32 },
    #[error("stage {0} is read-only")]
    ReadOnlyStage(StageId),
    #[error("unknown {dimension} category '{category}'")]
    UnknownCategory {
        dimension: Dimension,
        category: String,
    },
    #[error("category '{category}' has no item {index}")]
    UnknownItem { category: String, index: usize },
    #[error("malformed recommendations: {0}")]
    MalformedRecommendations(String),
    #[error("deal {0} not found")]
    DealNotFound(DealId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl AssessmentError {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidScore { .. } => "INVALID_SCORE",
            Self::WeightSumInvalid { .. } => "WEIGHT_SUM_INVALID",
            Self::ReadOnlyStage(_) => "READ_ONLY_STAGE",
            Self::UnknownCategory { .. } | Self::UnknownItem { .. } => "UNKNOWN_ITEM",
            Self::MalformedRecommendations(_) => "MALFORMED_RECOMMENDATIONS",
            Self::DealNotFound(_) => "DEAL_NOT_FOUND",
            Self::Repository(_) => "REPOSITORY",
        }
    }
}
