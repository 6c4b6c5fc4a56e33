use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::content::{Solution, SolutionMapContent};
use super::{MapOutcome, SolutionMapError};
use crate::workflows::opportunity::domain::{unique_child_id, Deal, DealId};
use crate::workflows::opportunity::repository::DealRepository;

/// Immutable named copy of a working draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedMap {
    pub id: String,
    pub title: String,
    pub content: SolutionMapContent,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

/// Allocation overview of a draft, one entry per domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MapSummary {
    pub domains: Vec<DomainSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainSummary {
    pub name: String,
    pub categories: Vec<CategorySummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub name: String,
    pub solution_count: usize,
    pub allocated_share: u32,
    pub remaining_share: u32,
}

impl From<&SolutionMapContent> for MapSummary {
    fn from(content: &SolutionMapContent) -> Self {
        let domains = content
            .domains()
            .map(|(name, domain)| DomainSummary {
                name: name.to_string(),
                categories: domain
                    .categories()
                    .map(|(name, category)| CategorySummary {
                        name: name.to_string(),
                        solution_count: category.len(),
                        allocated_share: category.allocated_share(),
                        remaining_share: category.remaining_share(),
                    })
                    .collect(),
            })
            .collect();

        Self { domains }
    }
}

/// Edits one deal's working draft and manages its snapshots.
///
/// Every call reloads the deal, applies the edit in memory, and saves the whole
/// aggregate back before returning. Rejected edits are never saved.
pub struct SolutionMapStore<R> {
    repository: Arc<R>,
}

impl<R> SolutionMapStore<R>
where
    R: DealRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Deep copy of the current working draft.
    pub fn content(&self, deal_id: &DealId) -> Result<SolutionMapContent, SolutionMapError> {
        Ok(self.load(deal_id)?.solution_map_content)
    }

    pub fn summary(&self, deal_id: &DealId) -> Result<MapSummary, SolutionMapError> {
        let deal = self.load(deal_id)?;
        Ok(MapSummary::from(&deal.solution_map_content))
    }

    pub fn add_domain(
        &self,
        deal_id: &DealId,
        name: &str,
    ) -> Result<MapOutcome, SolutionMapError> {
        self.edit(deal_id, "add_domain", |content| content.add_domain(name))
    }

    pub fn rename_domain(
        &self,
        deal_id: &DealId,
        old: &str,
        new: &str,
    ) -> Result<MapOutcome, SolutionMapError> {
        self.edit(deal_id, "rename_domain", |content| {
            content.rename_domain(old, new)
        })
    }

    pub fn delete_domain(
        &self,
        deal_id: &DealId,
        name: &str,
    ) -> Result<MapOutcome, SolutionMapError> {
        self.edit(deal_id, "delete_domain", |content| {
            Ok(content.delete_domain(name))
        })
    }

    pub fn add_category(
        &self,
        deal_id: &DealId,
        domain: &str,
        name: &str,
    ) -> Result<MapOutcome, SolutionMapError> {
        self.edit(deal_id, "add_category", |content| {
            content.add_category(domain, name)
        })
    }

    pub fn rename_category(
        &self,
        deal_id: &DealId,
        domain: &str,
        old: &str,
        new: &str,
    ) -> Result<MapOutcome, SolutionMapError> {
        self.edit(deal_id, "rename_category", |content| {
            content.rename_category(domain, old, new)
        })
    }

    pub fn delete_category(
        &self,
        deal_id: &DealId,
        domain: &str,
        name: &str,
    ) -> Result<MapOutcome, SolutionMapError> {
        self.edit(deal_id, "delete_category", |content| {
            content.delete_category(domain, name)
        })
    }

    pub fn add_solution(
        &self,
        deal_id: &DealId,
        domain: &str,
        category: &str,
        solution: Solution,
    ) -> Result<MapOutcome, SolutionMapError> {
        self.edit(deal_id, "add_solution", |content| {
            content.add_solution(domain, category, solution)
        })
    }

    pub fn update_solution(
        &self,
        deal_id: &DealId,
        domain: &str,
        category: &str,
        index: usize,
        solution: Solution,
    ) -> Result<MapOutcome, SolutionMapError> {
        self.edit(deal_id, "update_solution", |content| {
            content.update_solution(domain, category, index, solution)
        })
    }

    pub fn delete_solution(
        &self,
        deal_id: &DealId,
        domain: &str,
        category: &str,
        index: usize,
    ) -> Result<MapOutcome, SolutionMapError> {
        self.edit(deal_id, "delete_solution", |content| {
            Ok(content.delete_solution(domain, category, index))
        })
    }

    /// Replaces the working draft with an empty map.
    pub fn reset(&self, deal_id: &DealId) -> Result<MapOutcome, SolutionMapError> {
        self.edit(deal_id, "reset", |content| {
            if content.is_empty() {
                return Ok(MapOutcome::Unchanged);
            }
            *content = SolutionMapContent::default();
            Ok(MapOutcome::Applied)
        })
    }

    pub fn snapshots(&self, deal_id: &DealId) -> Result<Vec<SavedMap>, SolutionMapError> {
        Ok(self.load(deal_id)?.saved_maps)
    }

    pub fn snapshot(&self, deal_id: &DealId, title: &str) -> Result<SavedMap, SolutionMapError> {
        self.snapshot_at(deal_id, title, Utc::now())
    }

    /// Copies the draft into a new snapshot. A blank title falls back to
    /// [`suggested_snapshot_title`].
    pub fn snapshot_at(
        &self,
        deal_id: &DealId,
        title: &str,
        at: DateTime<Utc>,
    ) -> Result<SavedMap, SolutionMapError> {
        let mut deal = self.load(deal_id)?;

        let title = if title.trim().is_empty() {
            suggested_snapshot_title(&deal, at.date_naive())
        } else {
            title.trim().to_string()
        };
        let id = unique_child_id(at, deal.saved_maps.iter().map(|map| map.id.as_str()));

        let saved = SavedMap {
            id,
            title,
            content: deal.solution_map_content.clone(),
            updated_at: at,
        };
        deal.saved_maps.push(saved.clone());
        deal.touch();
        self.repository.save(&deal)?;

        info!(deal_id = %deal_id, snapshot_id = %saved.id, title = %saved.title, "solution map snapshot saved");
        Ok(saved)
    }

    pub fn delete_snapshot(
        &self,
        deal_id: &DealId,
        snapshot_id: &str,
    ) -> Result<MapOutcome, SolutionMapError> {
        let mut deal = self.load(deal_id)?;
        let before = deal.saved_maps.len();
        deal.saved_maps.retain(|map| map.id != snapshot_id);
        if deal.saved_maps.len() == before {
            return Ok(MapOutcome::Unchanged);
        }

        deal.touch();
        self.repository.save(&deal)?;
        debug!(deal_id = %deal_id, snapshot_id, "solution map snapshot deleted");
        Ok(MapOutcome::Applied)
    }

    /// Overwrites the working draft with a copy of the snapshot.
    pub fn load_snapshot(
        &self,
        deal_id: &DealId,
        snapshot_id: &str,
    ) -> Result<MapOutcome, SolutionMapError> {
        let mut deal = self.load(deal_id)?;
        let Some(saved) = deal.saved_maps.iter().find(|map| map.id == snapshot_id) else {
            warn!(deal_id = %deal_id, snapshot_id, code = "INVALID_TARGET", "snapshot not found");
            return Err(SolutionMapError::InvalidTarget);
        };

        deal.solution_map_content = saved.content.clone();
        deal.touch();
        self.repository.save(&deal)?;
        debug!(deal_id = %deal_id, snapshot_id, "solution map snapshot loaded into draft");
        Ok(MapOutcome::Applied)
    }

    fn load(&self, deal_id: &DealId) -> Result<Deal, SolutionMapError> {
        self.repository
            .load(deal_id)?
            .ok_or_else(|| SolutionMapError::DealNotFound(deal_id.clone()))
    }

    fn edit<F>(
        &self,
        deal_id: &DealId,
        action: &'static str,
        apply: F,
    ) -> Result<MapOutcome, SolutionMapError>
    where
        F: FnOnce(&mut SolutionMapContent) -> Result<MapOutcome, SolutionMapError>,
    {
        let mut deal = self.load(deal_id)?;

        let outcome = match apply(&mut deal.solution_map_content) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(deal_id = %deal_id, action, code = err.code(), "solution map edit rejected");
                return Err(err);
            }
        };

        if outcome.is_applied() {
            deal.touch();
            self.repository.save(&deal)?;
            debug!(deal_id = %deal_id, action, "solution map updated");
        }

        Ok(outcome)
    }
}

/// Default snapshot name: first domain (or the deal name) plus the date.
pub fn suggested_snapshot_title(deal: &Deal, today: NaiveDate) -> String {
    let prefix = deal
        .solution_map_content
        .first_domain()
        .unwrap_or(deal.deal_name.as_str());
    format!("{}_{}", prefix, today.format("%Y.%m.%d"))
}
