use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::config::{CategoryDefinition, Dimension, ScoreConfig};
use super::recommendations::{DimensionRecommendations, ItemRecommendation, Recommendations};
use super::rules::{self, FitScores};
use super::{AssessmentError, MAX_ITEM_SCORE, MIN_ITEM_SCORE};

/// Raw item scores and category weights for one dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionAssessment {
    #[serde(default)]
    pub scores: BTreeMap<String, u8>,
    #[serde(default)]
    pub weights: BTreeMap<String, i32>,
}

impl DimensionAssessment {
    pub fn from_config(config: &ScoreConfig, dimension: Dimension) -> Self {
        Self {
            scores: BTreeMap::new(),
            weights: config.default_weights(dimension),
        }
    }

    /// Stored weight, or the catalog default when the category was never set.
    pub fn weight(&self, category: &CategoryDefinition) -> i32 {
        self.weights
            .get(category.id)
            .copied()
            .unwrap_or(category.default_weight)
    }

    /// Score used in averages; unscored (or legacy zero) items count as the minimum.
    pub fn effective_score(&self, category: &CategoryDefinition, index: usize) -> u8 {
        match self.scores.get(&category.item_key(index)) {
            Some(&score) if score >= MIN_ITEM_SCORE => score,
            _ => MIN_ITEM_SCORE,
        }
    }
}

/// Scoring record for one qualification stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRecord {
    pub biz: DimensionAssessment,
    pub tech: DimensionAssessment,
    #[serde(default)]
    pub recommendations: Option<Recommendations>,
    #[serde(default)]
    pub is_completed: bool,
}

impl AssessmentRecord {
    pub fn from_config(config: &ScoreConfig) -> Self {
        Self {
            biz: DimensionAssessment::from_config(config, Dimension::Biz),
            tech: DimensionAssessment::from_config(config, Dimension::Tech),
            recommendations: None,
            is_completed: false,
        }
    }

    pub fn dimension(&self, dimension: Dimension) -> &DimensionAssessment {
        match dimension {
            Dimension::Biz => &self.biz,
            Dimension::Tech => &self.tech,
        }
    }

    fn dimension_mut(&mut self, dimension: Dimension) -> &mut DimensionAssessment {
        match dimension {
            Dimension::Biz => &mut self.biz,
            Dimension::Tech => &mut self.tech,
        }
    }

    /// Raw stored score for an item, if it was ever set.
    pub fn item_score(&self, dimension: Dimension, category_id: &str, index: usize) -> Option<u8> {
        self.dimension(dimension)
            .scores
            .get(&super::config::item_key(category_id, index))
            .copied()
    }

    /// Stores an item score. Values outside `1..=5` are rejected, never clamped.
    pub fn set_item_score(
        &mut self,
        config: &ScoreConfig,
        dimension: Dimension,
        category_id: &str,
        index: usize,
        value: i32,
    ) -> Result<(), AssessmentError> {
        let category = lookup_item(config, dimension, category_id, index)?;
        if !(i32::from(MIN_ITEM_SCORE)..=i32::from(MAX_ITEM_SCORE)).contains(&value) {
            return Err(AssessmentError::InvalidScore { value });
        }

        self.dimension_mut(dimension)
            .scores
            .insert(category.item_key(index), value as u8);
        Ok(())
    }

    /// Stores a category weight as given; bounding it is the caller's job.
    pub fn set_category_weight(
        &mut self,
        config: &ScoreConfig,
        dimension: Dimension,
        category_id: &str,
        value: i32,
    ) -> Result<(), AssessmentError> {
        let category = lookup_category(config, dimension, category_id)?;
        self.dimension_mut(dimension)
            .weights
            .insert(category.id.to_string(), value);
        Ok(())
    }

    pub fn weight_sum(&self, config: &ScoreConfig, dimension: Dimension) -> i32 {
        let assessment = self.dimension(dimension);
        config
            .categories(dimension)
            .iter()
            .map(|category| assessment.weight(category))
            .sum()
    }

    /// Checks that each dimension's weights total exactly 100, biz first.
    pub fn validate_weights(&self, config: &ScoreConfig) -> Result<(), AssessmentError> {
        for dimension in Dimension::ordered() {
            let sum = self.weight_sum(config, dimension);
            if sum != rules::REQUIRED_WEIGHT_SUM {
                return Err(AssessmentError::WeightSumInvalid { dimension, sum });
            }
        }
        Ok(())
    }

    /// Computes fit scores without touching the record.
    pub fn evaluate(&self, config: &ScoreConfig) -> Result<FitScores, AssessmentError> {
        self.validate_weights(config)?;
        Ok(rules::compute_scores(self, config))
    }

    /// Computes fit scores and marks the record completed.
    pub fn compute_scores(&mut self, config: &ScoreConfig) -> Result<FitScores, AssessmentError> {
        let scores = self.evaluate(config)?;
        self.is_completed = true;
        Ok(scores)
    }

    /// Stores suggestions for one dimension verbatim. Scores and weights are untouched.
    pub fn attach_recommendations(
        &mut self,
        dimension: Dimension,
        payload: DimensionRecommendations,
    ) {
        self.recommendations
            .get_or_insert_with(Recommendations::default)
            .set(dimension, payload);
    }

    pub fn recommendation(
        &self,
        dimension: Dimension,
        category_id: &str,
        index: usize,
    ) -> Option<ItemRecommendation> {
        self.recommendations
            .as_ref()
            .and_then(|recommendations| recommendations.item(dimension, category_id, index))
    }
}

fn lookup_category(
    config: &ScoreConfig,
    dimension: Dimension,
    category_id: &str,
) -> Result<&'static CategoryDefinition, AssessmentError> {
    config
        .category(dimension, category_id)
        .ok_or_else(|| AssessmentError::UnknownCategory {
            dimension,
            category: category_id.to_string(),
        })
}

fn lookup_item(
    config: &ScoreConfig,
    dimension: Dimension,
    category_id: &str,
    index: usize,
) -> Result<&'static CategoryDefinition, AssessmentError> {
    let category = lookup_category(config, dimension, category_id)?;
    if index >= category.items.len() {
        return Err(AssessmentError::UnknownItem {
            category: category_id.to_string(),
            index,
        });
    }
    Ok(category)
}
