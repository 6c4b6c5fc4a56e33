use serde::Serialize;

use super::config::{Dimension, ScoreConfig};
use super::record::AssessmentRecord;

pub(crate) const REQUIRED_WEIGHT_SUM: i32 = 100;

/// Maps the 1–5 item scale onto the 20–100 fit axis.
const FIT_SCALE: f64 = 20.0;

/// Axis midpoint separating strong from weak fit.
pub const QUADRANT_MIDPOINT: u32 = 50;

/// Averaged score of one category, rounded to one decimal for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryScore {
    pub category_id: String,
    pub label: String,
    pub weight: i32,
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryScores {
    pub biz: Vec<CategoryScore>,
    pub tech: Vec<CategoryScore>,
}

impl CategoryScores {
    pub fn for_dimension(&self, dimension: Dimension) -> &[CategoryScore] {
        match dimension {
            Dimension::Biz => &self.biz,
            Dimension::Tech => &self.tech,
        }
    }
}

/// Derived fit result for one stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitScores {
    pub biz_score: u32,
    pub tech_score: u32,
    pub category_scores: CategoryScores,
}

impl FitScores {
    pub fn score(&self, dimension: Dimension) -> u32 {
        match dimension {
            Dimension::Biz => self.biz_score,
            Dimension::Tech => self.tech_score,
        }
    }

    pub fn quadrant(&self) -> Quadrant {
        classify_quadrant(self.biz_score, self.tech_score)
    }
}

/// Two-axis classification of a deal around the 50/50 midpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Quadrant {
    Fit,
    NoFit,
    TechStrongBizWeak,
    BizStrongTechWeak,
}

impl Quadrant {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Fit => "Fit",
            Self::NoFit => "No Fit",
            Self::TechStrongBizWeak => "Tech-strong/Biz-weak",
            Self::BizStrongTechWeak => "Biz-strong/Tech-weak",
        }
    }
}

pub fn classify_quadrant(biz_score: u32, tech_score: u32) -> Quadrant {
    let biz_strong = biz_score >= QUADRANT_MIDPOINT;
    let tech_strong = tech_score >= QUADRANT_MIDPOINT;
    match (biz_strong, tech_strong) {
        (true, true) => Quadrant::Fit,
        (false, false) => Quadrant::NoFit,
        (false, true) => Quadrant::TechStrongBizWeak,
        (true, false) => Quadrant::BizStrongTechWeak,
    }
}

/// Scores both dimensions. Weight validity is checked by the caller.
pub(crate) fn compute_scores(record: &AssessmentRecord, config: &ScoreConfig) -> FitScores {
    let (biz_score, biz) = score_dimension(record, config, Dimension::Biz);
    let (tech_score, tech) = score_dimension(record, config, Dimension::Tech);

    FitScores {
        biz_score,
        tech_score,
        category_scores: CategoryScores { biz, tech },
    }
}

fn score_dimension(
    record: &AssessmentRecord,
    config: &ScoreConfig,
    dimension: Dimension,
) -> (u32, Vec<CategoryScore>) {
    let assessment = record.dimension(dimension);
    let mut weighted_total = 0.0;
    let mut weight_total: i64 = 0;
    let mut categories = Vec::new();

    for category in config.categories(dimension) {
        let item_count = category.items.len();
        let average = if item_count == 0 {
            f64::from(super::MIN_ITEM_SCORE)
        } else {
            let sum: u32 = (0..item_count)
                .map(|index| u32::from(assessment.effective_score(category, index)))
                .sum();
            f64::from(sum) / item_count as f64
        };
        let weight = assessment.weight(category);

        weighted_total += average * f64::from(weight);
        weight_total += i64::from(weight);

        categories.push(CategoryScore {
            category_id: category.id.to_string(),
            label: category.label.to_string(),
            weight,
            average: round_to_tenth(average),
        });
    }

    let score = if weight_total == 0 {
        0
    } else {
        (weighted_total / weight_total as f64 * FIT_SCALE)
            .round()
            .max(0.0) as u32
    };

    (score, categories)
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
