use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::config::{Dimension, ScoreConfig};
use super::recommendations::{DimensionRecommendations, RecommendationResponse};
use super::record::AssessmentRecord;
use super::rules::FitScores;
use super::AssessmentError;
use crate::workflows::opportunity::domain::{Deal, DealId, StageId};
use crate::workflows::opportunity::repository::DealRepository;

/// Stage record as seen through a requested stage, after aliasing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageAssessment {
    pub requested: StageId,
    pub source: StageId,
    pub read_only: bool,
    pub record: AssessmentRecord,
}

/// Per-stage status line for overviews.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageSummary {
    pub stage: StageId,
    pub completed: bool,
    pub scores: Option<FitScores>,
}

/// Persistence-backed access to per-stage assessment records.
///
/// Records are created from the catalog defaults on first access. `Purchase`
/// reads resolve to the evaluation record and every write through it is rejected.
pub struct AssessmentEngine<R> {
    repository: Arc<R>,
    config: ScoreConfig,
}

impl<R> AssessmentEngine<R>
where
    R: DealRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self::with_config(repository, ScoreConfig::STANDARD)
    }

    pub fn with_config(repository: Arc<R>, config: ScoreConfig) -> Self {
        Self { repository, config }
    }

    pub fn config(&self) -> &ScoreConfig {
        &self.config
    }

    /// Returns the stage's record, creating and persisting the default one if absent.
    pub fn record(
        &self,
        deal_id: &DealId,
        stage: StageId,
    ) -> Result<StageAssessment, AssessmentError> {
        let mut deal = self.load(deal_id)?;
        let source = stage.effective();

        if !deal.assessment.contains_key(&source) {
            deal.assessment
                .insert(source, AssessmentRecord::from_config(&self.config));
            deal.touch();
            self.repository.save(&deal)?;
            debug!(deal_id = %deal_id, stage = %source, "assessment record initialised");
        }

        let record = deal
            .assessment
            .remove(&source)
            .unwrap_or_else(|| AssessmentRecord::from_config(&self.config));

        Ok(StageAssessment {
            requested: stage,
            source,
            read_only: stage.is_read_only(),
            record,
        })
    }

    pub fn set_item_score(
        &self,
        deal_id: &DealId,
        stage: StageId,
        dimension: Dimension,
        category_id: &str,
        index: usize,
        value: i32,
    ) -> Result<(), AssessmentError> {
        self.edit(deal_id, stage, "set_item_score", |record, config| {
            record.set_item_score(config, dimension, category_id, index, value)
        })
    }

    /// Stores a weight and returns the dimension's new weight total.
    pub fn set_category_weight(
        &self,
        deal_id: &DealId,
        stage: StageId,
        dimension: Dimension,
        category_id: &str,
        value: i32,
    ) -> Result<i32, AssessmentError> {
        self.edit(deal_id, stage, "set_category_weight", |record, config| {
            record.set_category_weight(config, dimension, category_id, value)?;
            Ok(record.weight_sum(config, dimension))
        })
    }

    pub fn weight_sum(
        &self,
        deal_id: &DealId,
        stage: StageId,
        dimension: Dimension,
    ) -> Result<i32, AssessmentError> {
        let view = self.record(deal_id, stage)?;
        Ok(view.record.weight_sum(&self.config, dimension))
    }

    /// Computes the stage result. Refused unless both weight totals are exactly 100.
    ///
    /// The first success on a writable stage marks the record completed; the
    /// read-only `Purchase` view computes without recording anything.
    pub fn compute_scores(
        &self,
        deal_id: &DealId,
        stage: StageId,
    ) -> Result<FitScores, AssessmentError> {
        if stage.is_read_only() {
            let view = self.record(deal_id, stage)?;
            return view.record.evaluate(&self.config).inspect_err(|err| {
                warn!(deal_id = %deal_id, stage = %stage, code = err.code(), "score computation refused");
            });
        }

        let mut deal = self.load(deal_id)?;
        let record = deal
            .assessment
            .entry(stage)
            .or_insert_with(|| AssessmentRecord::from_config(&self.config));
        let was_completed = record.is_completed;

        let scores = match record.compute_scores(&self.config) {
            Ok(scores) => scores,
            Err(err) => {
                warn!(deal_id = %deal_id, stage = %stage, code = err.code(), "score computation refused");
                return Err(err);
            }
        };

        if !was_completed {
            deal.touch();
            self.repository.save(&deal)?;
        }

        debug!(
            deal_id = %deal_id,
            stage = %stage,
            biz = scores.biz_score,
            tech = scores.tech_score,
            "fit scores computed"
        );
        Ok(scores)
    }

    pub fn attach_recommendations(
        &self,
        deal_id: &DealId,
        stage: StageId,
        dimension: Dimension,
        payload: DimensionRecommendations,
    ) -> Result<(), AssessmentError> {
        self.edit(deal_id, stage, "attach_recommendations", |record, _| {
            record.attach_recommendations(dimension, payload);
            Ok(())
        })
    }

    /// Validates a raw suggestion document and attaches both dimensions at once.
    pub fn apply_recommendation_response(
        &self,
        deal_id: &DealId,
        stage: StageId,
        response: &Value,
    ) -> Result<(), AssessmentError> {
        let response = RecommendationResponse::from_value(response).inspect_err(|err| {
            warn!(deal_id = %deal_id, stage = %stage, code = err.code(), "recommendations rejected");
        })?;
        self.attach_response(deal_id, stage, response)
    }

    /// Attaches an already validated suggestion document, both dimensions in one save.
    pub fn attach_response(
        &self,
        deal_id: &DealId,
        stage: StageId,
        response: RecommendationResponse,
    ) -> Result<(), AssessmentError> {
        self.edit(deal_id, stage, "apply_recommendations", |record, _| {
            for (dimension, payload) in response.into_parts() {
                record.attach_recommendations(dimension, payload);
            }
            Ok(())
        })
    }

    /// Completion state and, where available, results for each scoring stage.
    pub fn stage_overview(&self, deal_id: &DealId) -> Result<Vec<StageSummary>, AssessmentError> {
        let deal = self.load(deal_id)?;

        Ok(StageId::scoring()
            .into_iter()
            .map(|stage| {
                let record = deal.assessment.get(&stage);
                let completed = record.map(|record| record.is_completed).unwrap_or(false);
                let scores = record
                    .filter(|record| record.is_completed)
                    .and_then(|record| record.evaluate(&self.config).ok());
                StageSummary {
                    stage,
                    completed,
                    scores,
                }
            })
            .collect())
    }

    fn load(&self, deal_id: &DealId) -> Result<Deal, AssessmentError> {
        self.repository
            .load(deal_id)?
            .ok_or_else(|| AssessmentError::DealNotFound(deal_id.clone()))
    }

    fn edit<T, F>(
        &self,
        deal_id: &DealId,
        stage: StageId,
        action: &'static str,
        apply: F,
    ) -> Result<T, AssessmentError>
    where
        F: FnOnce(&mut AssessmentRecord, &ScoreConfig) -> Result<T, AssessmentError>,
    {
        if stage.is_read_only() {
            let err = AssessmentError::ReadOnlyStage(stage);
            warn!(deal_id = %deal_id, stage = %stage, action, code = err.code(), "assessment edit rejected");
            return Err(err);
        }

        let mut deal = self.load(deal_id)?;
        let record = deal
            .assessment
            .entry(stage)
            .or_insert_with(|| AssessmentRecord::from_config(&self.config));

        let value = match apply(record, &self.config) {
            Ok(value) => value,
            Err(err) => {
                warn!(deal_id = %deal_id, stage = %stage, action, code = err.code(), "assessment edit rejected");
                return Err(err);
            }
        };

        deal.touch();
        self.repository.save(&deal)?;
        debug!(deal_id = %deal_id, stage = %stage, action, "assessment updated");
        Ok(value)
    }
}
