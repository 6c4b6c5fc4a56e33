use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::domain::{next_deal_id, unique_child_id, Deal, DealId, DealProfile, SavedReport};
use super::repository::{DealRepository, RepositoryError};

pub const DEFAULT_REPORT_KIND: &str = "competitive_insight";

/// Deal lifecycle and the plain container fields that hang off a deal.
pub struct DealService<R> {
    repository: Arc<R>,
}

impl<R> DealService<R>
where
    R: DealRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn create(&self, profile: DealProfile) -> Result<Deal, DealServiceError> {
        self.create_at(profile, Utc::now())
    }

    pub fn create_at(
        &self,
        profile: DealProfile,
        now: DateTime<Utc>,
    ) -> Result<Deal, DealServiceError> {
        validate_profile(&profile)?;

        let id = next_deal_id(now);
        if self.repository.load(&id)?.is_some() {
            return Err(RepositoryError::Conflict.into());
        }

        let deal = Deal::new(id, profile, now);
        self.repository.save(&deal)?;

        info!(deal_id = %deal.id, client = %deal.client_name, "deal created");
        Ok(deal)
    }

    pub fn update_profile(
        &self,
        deal_id: &DealId,
        profile: DealProfile,
    ) -> Result<Deal, DealServiceError> {
        validate_profile(&profile)?;

        let mut deal = self.get(deal_id)?;
        deal.apply_profile(profile);
        deal.touch();
        self.repository.save(&deal)?;

        debug!(deal_id = %deal_id, "deal profile updated");
        Ok(deal)
    }

    pub fn get(&self, deal_id: &DealId) -> Result<Deal, DealServiceError> {
        self.repository
            .load(deal_id)?
            .ok_or_else(|| DealServiceError::DealNotFound(deal_id.clone()))
    }

    /// All deals, most recently updated first.
    pub fn list(&self) -> Result<Vec<Deal>, DealServiceError> {
        let mut deals = self.repository.list()?;
        deals.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(deals)
    }

    /// Drops the deal with every map, snapshot, and record it owns.
    pub fn delete(&self, deal_id: &DealId) -> Result<(), DealServiceError> {
        self.repository.delete(deal_id)?;
        info!(deal_id = %deal_id, "deal deleted");
        Ok(())
    }

    pub fn add_report(
        &self,
        deal_id: &DealId,
        title: &str,
        content_html: &str,
        kind: Option<&str>,
    ) -> Result<SavedReport, DealServiceError> {
        let mut deal = self.get(deal_id)?;
        let now = Utc::now();

        let report = SavedReport {
            id: unique_child_id(now, deal.reports.iter().map(|report| report.id.as_str())),
            title: title.to_string(),
            content_html: content_html.to_string(),
            kind: kind.unwrap_or(DEFAULT_REPORT_KIND).to_string(),
            created_at: now,
        };
        deal.reports.push(report.clone());
        deal.touch();
        self.repository.save(&deal)?;

        debug!(deal_id = %deal_id, report_id = %report.id, "report saved");
        Ok(report)
    }

    /// Removes a report; unknown ids are ignored.
    pub fn delete_report(&self, deal_id: &DealId, report_id: &str) -> Result<(), DealServiceError> {
        let mut deal = self.get(deal_id)?;
        let before = deal.reports.len();
        deal.reports.retain(|report| report.id != report_id);
        if deal.reports.len() != before {
            deal.touch();
            self.repository.save(&deal)?;
        }
        Ok(())
    }
}

fn validate_profile(profile: &DealProfile) -> Result<(), DealServiceError> {
    if profile.client_name.trim().is_empty() {
        return Err(DealServiceError::InvalidDeal(
            "client name is required".to_string(),
        ));
    }
    if profile.deal_name.trim().is_empty() {
        return Err(DealServiceError::InvalidDeal(
            "deal name is required".to_string(),
        ));
    }
    Ok(())
}

/// Error raised by the deal service.
#[derive(Debug, thiserror::Error)]
pub enum DealServiceError {
    #[error("invalid deal: {0}")]
    InvalidDeal(String),
    #[error("deal {0} not found")]
    DealNotFound(DealId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
