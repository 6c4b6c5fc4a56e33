use std::sync::{Arc, Mutex};

use chrono::Utc;

use crate::workflows::opportunity::domain::Deal;
use crate::workflows::opportunity::repository::{DealRepository, RepositoryError};
use crate::workflows::opportunity::{
    AssessmentEngine, DealId, DealProfile, DealService, InMemoryDealRepository, Solution,
    SolutionMapStore,
};

pub(super) struct Fixture {
    pub repository: Arc<InMemoryDealRepository>,
    pub deals: DealService<InMemoryDealRepository>,
    pub maps: SolutionMapStore<InMemoryDealRepository>,
    pub engine: AssessmentEngine<InMemoryDealRepository>,
    pub deal_id: DealId,
}

pub(super) fn profile() -> DealProfile {
    DealProfile {
        client_name: "Initech".to_string(),
        deal_name: "Core banking refresh".to_string(),
        client_contact: "Peter Gibbons".to_string(),
        internal_contact: "Account team".to_string(),
        solution: "Hybrid cloud".to_string(),
        purchase_date: "2026-03-31".to_string(),
        memo: String::new(),
    }
}

pub(super) fn setup() -> Fixture {
    let repository = Arc::new(InMemoryDealRepository::new());
    let deals = DealService::new(repository.clone());
    let maps = SolutionMapStore::new(repository.clone());
    let engine = AssessmentEngine::new(repository.clone());

    let deal_id = deals.create(profile()).expect("deal created").id;

    Fixture {
        repository,
        deals,
        maps,
        engine,
        deal_id,
    }
}

/// Fixture with one domain ("Infrastructure") holding an empty "Storage" category.
pub(super) fn setup_with_category() -> Fixture {
    let fixture = setup();
    fixture
        .maps
        .add_domain(&fixture.deal_id, "Infrastructure")
        .expect("domain added");
    fixture
        .maps
        .add_category(&fixture.deal_id, "Infrastructure", "Storage")
        .expect("category added");
    fixture
}

pub(super) fn solution(name: &str, share: u32) -> Solution {
    Solution {
        name: name.to_string(),
        share,
        manufacturer: "Acme".to_string(),
        pain_points: vec!["capacity".to_string()],
        note: String::new(),
    }
}

/// Answers every lookup with an existing deal, as if every generated id were taken.
#[derive(Default)]
pub(super) struct OccupiedRepository {
    pub saved: Mutex<Vec<DealId>>,
}

impl DealRepository for OccupiedRepository {
    fn load(&self, id: &DealId) -> Result<Option<Deal>, RepositoryError> {
        Ok(Some(Deal::new(id.clone(), profile(), Utc::now())))
    }

    fn save(&self, deal: &Deal) -> Result<(), RepositoryError> {
        self.saved.lock().expect("saved mutex").push(deal.id.clone());
        Ok(())
    }

    fn list(&self) -> Result<Vec<Deal>, RepositoryError> {
        Ok(Vec::new())
    }

    fn delete(&self, _id: &DealId) -> Result<(), RepositoryError> {
        Ok(())
    }
}
