use serde_json::json;

use super::common::*;
use crate::workflows::opportunity::assessment::{
    classify_quadrant, AssessmentError, AssessmentRecord, Confidence, Dimension, ItemRecommendation,
    Quadrant, ScoreConfig,
};
use crate::workflows::opportunity::domain::StageId;
use crate::workflows::opportunity::repository::DealRepository;

fn score_all(
    record: &mut AssessmentRecord,
    config: &ScoreConfig,
    dimension: Dimension,
    values: &[(&str, i32)],
) {
    for (category, value) in values {
        let items = config
            .category(dimension, category)
            .expect("known category")
            .items
            .len();
        for index in 0..items {
            record
                .set_item_score(config, dimension, category, index, *value)
                .expect("score in range");
        }
    }
}

#[test]
fn scoring_example_produces_sixty_six() {
    let config = ScoreConfig::STANDARD;
    let mut record = AssessmentRecord::from_config(&config);
    score_all(
        &mut record,
        &config,
        Dimension::Biz,
        &[("budget", 3), ("authority", 4), ("need", 2), ("timeline", 5)],
    );

    let scores = record.compute_scores(&config).expect("default weights are valid");

    assert_eq!(scores.biz_score, 66);
    let averages: Vec<f64> = scores
        .category_scores
        .biz
        .iter()
        .map(|category| category.average)
        .collect();
    assert_eq!(averages, vec![3.0, 4.0, 2.0, 5.0]);
    assert!(record.is_completed);
}

#[test]
fn unscored_items_count_as_the_minimum() {
    let config = ScoreConfig::STANDARD;
    let mut record = AssessmentRecord::from_config(&config);

    let scores = record.compute_scores(&config).expect("weights valid");
    assert_eq!(scores.biz_score, 20);
    assert_eq!(scores.tech_score, 20);

    record
        .set_item_score(&config, Dimension::Tech, "req", 0, 5)
        .expect("score set");
    let scores = record.evaluate(&config).expect("weights valid");
    let req = &scores.category_scores.tech[0];
    assert_eq!(req.category_id, "req");
    assert_eq!(req.average, 3.0, "(5 + 1) / 2 with the unscored item as 1");
}

#[test]
fn legacy_zero_scores_count_as_the_minimum() {
    let config = ScoreConfig::STANDARD;
    let mut record = AssessmentRecord::from_config(&config);
    record.biz.scores.insert("need_0".to_string(), 0);

    let scores = record.evaluate(&config).expect("weights valid");
    assert_eq!(scores.biz_score, 20);
}

#[test]
fn weights_must_total_one_hundred_before_computing() {
    let config = ScoreConfig::STANDARD;
    let mut record = AssessmentRecord::from_config(&config);
    assert_eq!(record.weight_sum(&config, Dimension::Biz), 100);

    record
        .set_category_weight(&config, Dimension::Biz, "authority", 20)
        .expect("weight stored");
    assert_eq!(record.weight_sum(&config, Dimension::Biz), 95);

    match record.compute_scores(&config) {
        Err(AssessmentError::WeightSumInvalid { dimension, sum }) => {
            assert_eq!(dimension, Dimension::Biz);
            assert_eq!(sum, 95);
        }
        other => panic!("expected weight sum rejection, got {other:?}"),
    }
    assert!(!record.is_completed, "failed computation leaves the record untouched");
}

#[test]
fn tech_weights_are_reported_separately() {
    let config = ScoreConfig::STANDARD;
    let mut record = AssessmentRecord::from_config(&config);
    record
        .set_category_weight(&config, Dimension::Tech, "ops", 0)
        .expect("weight stored");

    match record.evaluate(&config) {
        Err(AssessmentError::WeightSumInvalid { dimension, sum }) => {
            assert_eq!(dimension, Dimension::Tech);
            assert_eq!(sum, 80);
        }
        other => panic!("expected tech weight rejection, got {other:?}"),
    }
}

#[test]
fn out_of_range_scores_are_rejected_not_clamped() {
    let config = ScoreConfig::STANDARD;
    let mut record = AssessmentRecord::from_config(&config);

    for value in [0, 6, -1] {
        match record.set_item_score(&config, Dimension::Biz, "need", 0, value) {
            Err(AssessmentError::InvalidScore { value: rejected }) => assert_eq!(rejected, value),
            other => panic!("expected invalid score, got {other:?}"),
        }
    }
    assert_eq!(record.item_score(Dimension::Biz, "need", 0), None);
}

#[test]
fn unknown_categories_and_items_are_rejected() {
    let config = ScoreConfig::STANDARD;
    let mut record = AssessmentRecord::from_config(&config);

    assert!(matches!(
        record.set_item_score(&config, Dimension::Biz, "req", 0, 3),
        Err(AssessmentError::UnknownCategory { .. })
    ));
    assert!(matches!(
        record.set_item_score(&config, Dimension::Biz, "need", 9, 3),
        Err(AssessmentError::UnknownItem { index: 9, .. })
    ));
    assert!(matches!(
        record.set_category_weight(&config, Dimension::Tech, "budget", 10),
        Err(AssessmentError::UnknownCategory { .. })
    ));
}

#[test]
fn quadrants_split_at_fifty() {
    assert_eq!(classify_quadrant(50, 50), Quadrant::Fit);
    assert_eq!(classify_quadrant(49, 49), Quadrant::NoFit);
    assert_eq!(classify_quadrant(49, 50), Quadrant::TechStrongBizWeak);
    assert_eq!(classify_quadrant(50, 49), Quadrant::BizStrongTechWeak);
    assert_eq!(Quadrant::TechStrongBizWeak.label(), "Tech-strong/Biz-weak");
}

#[test]
fn attached_recommendations_never_touch_scores_or_weights() {
    let config = ScoreConfig::STANDARD;
    let mut record = AssessmentRecord::from_config(&config);
    record
        .set_item_score(&config, Dimension::Biz, "budget", 0, 4)
        .expect("score set");
    let before = (record.biz.clone(), record.tech.clone());

    let mut payload = std::collections::BTreeMap::new();
    payload.insert(
        "budget".to_string(),
        vec![ItemRecommendation {
            score: 2,
            confidence: Confidence::Low,
            reason: "no approved budget yet".to_string(),
        }],
    );
    record.attach_recommendations(Dimension::Biz, payload);

    assert_eq!((record.biz.clone(), record.tech.clone()), before);
    let suggestion = record
        .recommendation(Dimension::Biz, "budget", 0)
        .expect("suggestion stored");
    assert_eq!(suggestion.score, 2);
    assert!(record.recommendation(Dimension::Tech, "req", 0).is_none());
}

#[test]
fn engine_initialises_records_from_defaults() {
    let fixture = setup();

    let view = fixture
        .engine
        .record(&fixture.deal_id, StageId::Awareness)
        .expect("record created");

    assert_eq!(view.source, StageId::Awareness);
    assert!(!view.read_only);
    assert!(view.record.biz.scores.is_empty());
    assert_eq!(view.record.biz.weights.get("need"), Some(&35));
    assert_eq!(view.record.tech.weights.get("req"), Some(&30));

    let stored = fixture
        .repository
        .load(&fixture.deal_id)
        .expect("load")
        .expect("present");
    assert!(stored.assessment.contains_key(&StageId::Awareness));
}

#[test]
fn purchase_reads_follow_the_evaluation_record() {
    let fixture = setup();
    let deal = &fixture.deal_id;

    let first = fixture
        .engine
        .record(deal, StageId::Purchase)
        .expect("purchase view");
    assert_eq!(first.source, StageId::Evaluation);
    assert!(first.read_only);
    assert_eq!(first.record.item_score(Dimension::Tech, "arch", 1), None);

    fixture
        .engine
        .set_item_score(deal, StageId::Evaluation, Dimension::Tech, "arch", 1, 4)
        .expect("evaluation edit");

    let purchase = fixture
        .engine
        .record(deal, StageId::Purchase)
        .expect("purchase view");
    let evaluation = fixture
        .engine
        .record(deal, StageId::Evaluation)
        .expect("evaluation view");
    assert_eq!(purchase.record, evaluation.record);
    assert_eq!(purchase.record.item_score(Dimension::Tech, "arch", 1), Some(4));

    let stored = fixture
        .repository
        .load(deal)
        .expect("load")
        .expect("present");
    assert!(!stored.assessment.contains_key(&StageId::Purchase));
}

#[test]
fn purchase_mutations_are_rejected() {
    let fixture = setup();
    let deal = &fixture.deal_id;

    let results = [
        fixture
            .engine
            .set_item_score(deal, StageId::Purchase, Dimension::Biz, "need", 0, 5)
            .map(|_| ()),
        fixture
            .engine
            .set_category_weight(deal, StageId::Purchase, Dimension::Biz, "need", 40)
            .map(|_| ()),
        fixture.engine.attach_recommendations(
            deal,
            StageId::Purchase,
            Dimension::Biz,
            Default::default(),
        ),
    ];
    for result in results {
        match result {
            Err(AssessmentError::ReadOnlyStage(StageId::Purchase)) => {}
            other => panic!("expected read-only rejection, got {other:?}"),
        }
    }

    let evaluation = fixture
        .engine
        .record(deal, StageId::Evaluation)
        .expect("evaluation view");
    assert!(evaluation.record.biz.scores.is_empty());
    assert_eq!(evaluation.record.biz.weights.get("need"), Some(&35));
    assert!(evaluation.record.recommendations.is_none());
}

#[test]
fn purchase_results_do_not_mark_completion() {
    let fixture = setup();
    let deal = &fixture.deal_id;

    let scores = fixture
        .engine
        .compute_scores(deal, StageId::Purchase)
        .expect("purchase result computed");
    assert_eq!(scores.biz_score, 20);

    let evaluation = fixture
        .engine
        .record(deal, StageId::Evaluation)
        .expect("evaluation view");
    assert!(!evaluation.record.is_completed);
}

#[test]
fn compute_scores_marks_completion_once_and_tracks_later_edits() {
    let fixture = setup();
    let deal = &fixture.deal_id;

    fixture
        .engine
        .compute_scores(deal, StageId::Consideration)
        .expect("first result");
    let view = fixture
        .engine
        .record(deal, StageId::Consideration)
        .expect("view");
    assert!(view.record.is_completed);

    for index in 0..2 {
        fixture
            .engine
            .set_item_score(deal, StageId::Consideration, Dimension::Biz, "need", index, 5)
            .expect("score set");
    }
    let scores = fixture
        .engine
        .compute_scores(deal, StageId::Consideration)
        .expect("recomputed");
    // need: avg 5 at weight 35, others avg 1 -> (35*5 + 65*1) / 100 * 20 = 48
    assert_eq!(scores.biz_score, 48);

    let view = fixture
        .engine
        .record(deal, StageId::Consideration)
        .expect("view");
    assert!(view.record.is_completed, "edits never revert completion");
}

#[test]
fn engine_refuses_invalid_weights_and_reports_the_sum() {
    let fixture = setup();
    let deal = &fixture.deal_id;

    let sum = fixture
        .engine
        .set_category_weight(deal, StageId::Awareness, Dimension::Biz, "authority", 20)
        .expect("weight stored");
    assert_eq!(sum, 95);
    assert_eq!(
        fixture
            .engine
            .weight_sum(deal, StageId::Awareness, Dimension::Biz)
            .expect("sum"),
        95
    );

    let err = fixture
        .engine
        .compute_scores(deal, StageId::Awareness)
        .expect_err("invalid weights refused");
    assert_eq!(err.code(), "WEIGHT_SUM_INVALID");

    let view = fixture
        .engine
        .record(deal, StageId::Awareness)
        .expect("view");
    assert!(!view.record.is_completed);
}

#[test]
fn recommendation_response_needs_both_dimensions() {
    let fixture = setup();
    let deal = &fixture.deal_id;

    let err = fixture
        .engine
        .apply_recommendation_response(deal, StageId::Evaluation, &json!({ "biz": {} }))
        .expect_err("tech missing");
    assert_eq!(err.code(), "MALFORMED_RECOMMENDATIONS");

    let view = fixture
        .engine
        .record(deal, StageId::Evaluation)
        .expect("view");
    assert!(view.record.recommendations.is_none());

    fixture
        .engine
        .apply_recommendation_response(
            deal,
            StageId::Evaluation,
            &json!({
                "biz": { "need": [
                    { "score": 4, "confidence": "High", "reason": "pain confirmed" },
                    { "score": 3, "confidence": "Medium", "reason": "" }
                ]},
                "tech": { "ops": [{ "score": 2, "confidence": "Low", "reason": "no SRE team" }] }
            }),
        )
        .expect("well-formed response attached");

    let view = fixture
        .engine
        .record(deal, StageId::Purchase)
        .expect("purchase view");
    let need = view
        .record
        .recommendation(Dimension::Biz, "need", 1)
        .expect("second need suggestion");
    assert_eq!(need.confidence, Confidence::Medium);
    assert_eq!(
        view.record
            .recommendation(Dimension::Tech, "ops", 0)
            .map(|rec| rec.score),
        Some(2)
    );
    assert!(view.record.biz.scores.is_empty());
}

#[test]
fn stage_overview_lists_scoring_stages() {
    let fixture = setup();
    let deal = &fixture.deal_id;
    fixture
        .engine
        .compute_scores(deal, StageId::Awareness)
        .expect("awareness result");

    let overview = fixture.engine.stage_overview(deal).expect("overview");
    let stages: Vec<StageId> = overview.iter().map(|summary| summary.stage).collect();
    assert_eq!(
        stages,
        vec![StageId::Awareness, StageId::Consideration, StageId::Evaluation]
    );
    assert!(overview[0].completed);
    assert_eq!(
        overview[0].scores.as_ref().map(|scores| scores.quadrant()),
        Some(Quadrant::NoFit)
    );
    assert!(!overview[1].completed);
    assert!(overview[2].scores.is_none());
}
