use std::fs;

use serde_json::json;

use super::common::*;
use crate::workflows::opportunity::assessment::Dimension;
use crate::workflows::opportunity::domain::{Deal, DealId, StageId};
use crate::workflows::opportunity::repository::{
    DealRepository, InMemoryDealRepository, JsonFileDealRepository, RepositoryError,
};

fn legacy_document() -> serde_json::Value {
    json!([{
        "id": "lx9c2k1",
        "clientName": "Umbrella",
        "dealName": "Lab analytics",
        "clientContact": "A. Wesker",
        "internalContact": "",
        "solution": "Data lake",
        "purchaseDate": "2026-06-30",
        "memo": "",
        "discovery": {
            "awareness": { "behavior": "Evaluating vendors", "emotion": "", "touchpoint": "", "problem": "", "result": null, "frozen": false }
        },
        "assessment": {
            "evaluation": {
                "biz": { "scores": { "need_0": 4, "need_1": 0 }, "weights": { "budget": 20, "authority": 25, "need": 35, "timeline": 20 } },
                "tech": { "scores": {}, "weights": { "req": 30, "arch": 25, "data": 25, "ops": 20 } },
                "recommendations": null,
                "isCompleted": true
            },
            "purchase": {
                "biz": { "scores": {}, "weights": {} },
                "tech": { "scores": {}, "weights": {} },
                "isCompleted": false
            }
        },
        "solutionMapContent": [],
        "savedMaps": [{
            "id": "lx9c2z0",
            "title": "Security_2026.01.10",
            "content": { "Security": { "Firewall": [{ "name": "Edge FW", "share": 70, "manufacturer": "Acme", "painPoints": [], "note": "" }] } },
            "updatedAt": 1768000000000i64
        }],
        "reports": [],
        "competitiveInsight": { "summary": "kept by another tool" },
        "updatedAt": "2026-01-10T09:00:00Z"
    }])
}

#[test]
fn in_memory_repository_round_trips_deals() {
    let repository = InMemoryDealRepository::new();
    let fixture = setup();
    let deal = fixture.deals.get(&fixture.deal_id).expect("deal");

    repository.save(&deal).expect("save");
    assert_eq!(repository.load(&deal.id).expect("load"), Some(deal.clone()));
    assert_eq!(repository.list().expect("list").len(), 1);

    repository.delete(&deal.id).expect("delete");
    assert_eq!(repository.load(&deal.id).expect("load"), None);
}

#[test]
fn json_repository_treats_a_missing_file_as_empty() {
    let dir = tempfile::tempdir().expect("temp dir");
    let repository = JsonFileDealRepository::new(dir.path().join("nested").join("deals.json"));

    assert!(repository.list().expect("list").is_empty());
    assert!(repository
        .load(&DealId::new("anything"))
        .expect("load")
        .is_none());
    repository
        .delete(&DealId::new("anything"))
        .expect("delete of a missing deal");
    assert!(!repository.path().exists(), "no-op delete never writes");
}

#[test]
fn json_repository_persists_whole_aggregates() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("nested").join("deals.json");
    let fixture = setup_with_category();
    fixture
        .maps
        .add_solution(
            &fixture.deal_id,
            "Infrastructure",
            "Storage",
            solution("SAN", 45),
        )
        .expect("solution");
    fixture
        .engine
        .set_item_score(&fixture.deal_id, StageId::Awareness, Dimension::Biz, "need", 1, 4)
        .expect("score");
    let deal = fixture.deals.get(&fixture.deal_id).expect("deal");

    let repository = JsonFileDealRepository::new(&path);
    repository.save(&deal).expect("saved to disk");

    let reopened = JsonFileDealRepository::new(&path);
    let loaded = reopened
        .load(&deal.id)
        .expect("load")
        .expect("deal present");
    assert_eq!(loaded, deal);

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).expect("file written")).expect("json");
    assert_eq!(raw[0]["clientName"], "Initech");
    assert_eq!(
        raw[0]["solutionMapContent"]["Infrastructure"]["Storage"][0]["share"],
        45
    );
    assert_eq!(raw[0]["assessment"]["awareness"]["biz"]["scores"]["need_1"], 4);
}

#[test]
fn json_repository_replaces_existing_entries_on_save() {
    let dir = tempfile::tempdir().expect("temp dir");
    let repository = JsonFileDealRepository::new(dir.path().join("deals.json"));
    let fixture = setup();
    let mut deal = fixture.deals.get(&fixture.deal_id).expect("deal");

    repository.save(&deal).expect("first save");
    deal.memo = "second pass".to_string();
    repository.save(&deal).expect("second save");

    let all = repository.list().expect("list");
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].memo, "second pass");

    repository.delete(&deal.id).expect("delete");
    assert!(repository.list().expect("list").is_empty());
}

#[test]
fn legacy_documents_load_with_extra_fields_preserved() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("deals.json");
    fs::write(&path, legacy_document().to_string()).expect("seed file");

    let repository = JsonFileDealRepository::new(&path);
    let deal: Deal = repository
        .load(&DealId::new("lx9c2k1"))
        .expect("legacy document decodes")
        .expect("deal present");

    assert_eq!(deal.client_name, "Umbrella");
    assert!(deal.solution_map_content.is_empty(), "array drafts load as empty");
    assert_eq!(deal.saved_maps.len(), 1);
    assert_eq!(
        deal.saved_maps[0]
            .content
            .category("Security", "Firewall")
            .map(|category| category.allocated_share()),
        Some(70)
    );
    let evaluation = deal
        .assessment
        .get(&StageId::Evaluation)
        .expect("evaluation record");
    assert!(evaluation.is_completed);
    assert_eq!(evaluation.item_score(Dimension::Biz, "need", 0), Some(4));
    assert_eq!(
        deal.extra.get("competitiveInsight"),
        Some(&json!({ "summary": "kept by another tool" }))
    );

    repository.save(&deal).expect("re-save");
    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).expect("file")).expect("json");
    assert_eq!(raw[0]["competitiveInsight"]["summary"], "kept by another tool");
}

#[test]
fn malformed_stored_suggestions_do_not_block_other_deals() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("deals.json");
    let document = json!([
        {
            "id": "a1",
            "clientName": "Stark",
            "dealName": "Edge compute",
            "assessment": {
                "evaluation": {
                    "biz": { "scores": {}, "weights": {} },
                    "tech": { "scores": {}, "weights": {} },
                    "recommendations": {
                        "biz": { "need": [
                            { "score": 4, "confidence": "Very High", "reason": "" },
                            { "score": 2.5, "confidence": "High", "reason": "" }
                        ]},
                        "tech": { "ops": [{ "score": 3, "confidence": "Medium", "reason": "on-call exists" }] }
                    },
                    "isCompleted": false
                }
            },
            "updatedAt": "2026-02-01T10:00:00Z"
        },
        {
            "id": "b2",
            "clientName": "Wayne",
            "dealName": "Fleet telemetry",
            "updatedAt": "2026-02-02T10:00:00Z"
        }
    ]);
    fs::write(&path, document.to_string()).expect("seed file");
    let repository = JsonFileDealRepository::new(&path);

    let other = repository
        .load(&DealId::new("b2"))
        .expect("file still decodes")
        .expect("deal present");
    assert_eq!(other.client_name, "Wayne");
    assert_eq!(repository.list().expect("list").len(), 2);

    let odd = repository
        .load(&DealId::new("a1"))
        .expect("load")
        .expect("deal present");
    let evaluation = odd
        .assessment
        .get(&StageId::Evaluation)
        .expect("evaluation record");
    assert!(evaluation.recommendation(Dimension::Biz, "need", 0).is_none());
    assert!(evaluation.recommendation(Dimension::Biz, "need", 1).is_none());
    assert_eq!(
        evaluation
            .recommendation(Dimension::Tech, "ops", 0)
            .map(|suggestion| suggestion.score),
        Some(3)
    );

    repository.save(&odd).expect("re-save");
    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).expect("file")).expect("json");
    assert_eq!(
        raw[0]["assessment"]["evaluation"]["recommendations"]["biz"]["need"][0]["confidence"],
        "Very High"
    );
}

#[test]
fn legacy_purchase_records_are_ignored_by_purchase_reads() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("deals.json");
    fs::write(&path, legacy_document().to_string()).expect("seed file");
    let repository = std::sync::Arc::new(JsonFileDealRepository::new(&path));
    let engine = crate::workflows::opportunity::AssessmentEngine::new(repository);

    let view = engine
        .record(&DealId::new("lx9c2k1"), StageId::Purchase)
        .expect("purchase view");

    assert_eq!(view.source, StageId::Evaluation);
    assert_eq!(view.record.item_score(Dimension::Biz, "need", 0), Some(4));
    assert!(view.record.is_completed);
}

#[test]
fn corrupt_files_surface_serialization_errors() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("deals.json");
    fs::write(&path, "{ not json").expect("seed file");

    match JsonFileDealRepository::new(&path).list() {
        Err(RepositoryError::Serialization(_)) => {}
        other => panic!("expected serialization error, got {other:?}"),
    }
}
