use indexmap::IndexMap;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

use super::{MapOutcome, SolutionMapError, MAX_CATEGORY_SHARE};

/// A product occupying part of a category's footprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Solution {
    pub name: String,
    pub share: u32,
    #[serde(default)]
    pub manufacturer: String,
    #[serde(default)]
    pub pain_points: Vec<String>,
    #[serde(default)]
    pub note: String,
}

/// Ordered solutions of one category. Names are unique and shares sum to at most 100.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category {
    solutions: Vec<Solution>,
}

impl Category {
    pub fn solutions(&self) -> &[Solution] {
        &self.solutions
    }

    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }

    pub fn allocated_share(&self) -> u32 {
        self.solutions.iter().map(|solution| solution.share).sum()
    }

    pub fn remaining_share(&self) -> u32 {
        MAX_CATEGORY_SHARE.saturating_sub(self.allocated_share())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.solutions.iter().any(|solution| solution.name == name)
    }

    fn push(&mut self, solution: Solution) -> Result<MapOutcome, SolutionMapError> {
        if solution.name.trim().is_empty() {
            return Err(SolutionMapError::InvalidTarget);
        }
        if self.contains(&solution.name) {
            return Err(SolutionMapError::Duplicate);
        }

        let allocated = self.allocated_share();
        check_allocation(allocated, solution.share)?;

        self.solutions.push(solution);
        Ok(MapOutcome::Applied)
    }

    fn replace(
        &mut self,
        index: usize,
        solution: Solution,
    ) -> Result<MapOutcome, SolutionMapError> {
        let current = self
            .solutions
            .get(index)
            .ok_or(SolutionMapError::InvalidIndex { index })?;

        // Only a changed name can collide; keeping the same name never does.
        if current.name != solution.name && self.contains(&solution.name) {
            return Err(SolutionMapError::Duplicate);
        }

        let others: u32 = self
            .solutions
            .iter()
            .enumerate()
            .filter(|(position, _)| *position != index)
            .map(|(_, existing)| existing.share)
            .sum();
        check_allocation(others, solution.share)?;

        self.solutions[index] = solution;
        Ok(MapOutcome::Applied)
    }

    fn remove(&mut self, index: usize) -> MapOutcome {
        if index < self.solutions.len() {
            self.solutions.remove(index);
            MapOutcome::Applied
        } else {
            MapOutcome::Unchanged
        }
    }
}

fn check_allocation(allocated: u32, requested: u32) -> Result<(), SolutionMapError> {
    if allocated.saturating_add(requested) > MAX_CATEGORY_SHARE {
        return Err(SolutionMapError::Overflow {
            allocated,
            requested,
        });
    }
    Ok(())
}

/// Categories of one architecture domain, keyed by unique name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Domain {
    categories: IndexMap<String, Category>,
}

impl Domain {
    pub fn categories(&self) -> impl Iterator<Item = (&str, &Category)> {
        self.categories
            .iter()
            .map(|(name, category)| (name.as_str(), category))
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.get(name)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    fn category_mut(&mut self, name: &str) -> Result<&mut Category, SolutionMapError> {
        self.categories
            .get_mut(name)
            .ok_or(SolutionMapError::InvalidTarget)
    }
}

/// The working draft: domain → category → ordered solutions.
///
/// All edits go through the methods below, which validate before they touch
/// anything, so a rejected call never leaves a partial change behind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SolutionMapContent {
    domains: IndexMap<String, Domain>,
}

impl SolutionMapContent {
    pub fn domains(&self) -> impl Iterator<Item = (&str, &Domain)> {
        self.domains
            .iter()
            .map(|(name, domain)| (name.as_str(), domain))
    }

    pub fn domain(&self, name: &str) -> Option<&Domain> {
        self.domains.get(name)
    }

    pub fn category(&self, domain: &str, category: &str) -> Option<&Category> {
        self.domain(domain)
            .and_then(|domain| domain.category(category))
    }

    pub fn first_domain(&self) -> Option<&str> {
        self.domains.keys().next().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    pub fn add_domain(&mut self, name: &str) -> Result<MapOutcome, SolutionMapError> {
        if name.trim().is_empty() || self.domains.contains_key(name) {
            return Err(SolutionMapError::Duplicate);
        }
        self.domains.insert(name.to_string(), Domain::default());
        Ok(MapOutcome::Applied)
    }

    pub fn rename_domain(&mut self, old: &str, new: &str) -> Result<MapOutcome, SolutionMapError> {
        if new.trim().is_empty() || old == new {
            return Ok(MapOutcome::Unchanged);
        }
        if self.domains.contains_key(new) {
            return Err(SolutionMapError::Duplicate);
        }
        rename_key(&mut self.domains, old, new)
    }

    pub fn delete_domain(&mut self, name: &str) -> MapOutcome {
        match self.domains.shift_remove(name) {
            Some(_) => MapOutcome::Applied,
            None => MapOutcome::Unchanged,
        }
    }

    pub fn add_category(
        &mut self,
        domain: &str,
        name: &str,
    ) -> Result<MapOutcome, SolutionMapError> {
        let domain = self.domain_mut(domain)?;
        if name.trim().is_empty() {
            return Err(SolutionMapError::InvalidTarget);
        }
        if domain.categories.contains_key(name) {
            return Err(SolutionMapError::Duplicate);
        }
        domain
            .categories
            .insert(name.to_string(), Category::default());
        Ok(MapOutcome::Applied)
    }

    pub fn rename_category(
        &mut self,
        domain: &str,
        old: &str,
        new: &str,
    ) -> Result<MapOutcome, SolutionMapError> {
        let domain = self.domain_mut(domain)?;
        if new.trim().is_empty() {
            return Err(SolutionMapError::InvalidTarget);
        }
        if old == new && domain.categories.contains_key(old) {
            return Ok(MapOutcome::Unchanged);
        }
        if domain.categories.contains_key(new) {
            return Err(SolutionMapError::Duplicate);
        }
        rename_key(&mut domain.categories, old, new)
    }

    pub fn delete_category(
        &mut self,
        domain: &str,
        name: &str,
    ) -> Result<MapOutcome, SolutionMapError> {
        let domain = self.domain_mut(domain)?;
        Ok(match domain.categories.shift_remove(name) {
            Some(_) => MapOutcome::Applied,
            None => MapOutcome::Unchanged,
        })
    }

    pub fn add_solution(
        &mut self,
        domain: &str,
        category: &str,
        solution: Solution,
    ) -> Result<MapOutcome, SolutionMapError> {
        self.category_mut(domain, category)?.push(solution)
    }

    pub fn update_solution(
        &mut self,
        domain: &str,
        category: &str,
        index: usize,
        solution: Solution,
    ) -> Result<MapOutcome, SolutionMapError> {
        // A missing parent means the slot cannot exist either.
        let target = self
            .category_mut(domain, category)
            .map_err(|_| SolutionMapError::InvalidIndex { index })?;
        target.replace(index, solution)
    }

    pub fn delete_solution(&mut self, domain: &str, category: &str, index: usize) -> MapOutcome {
        match self.category_mut(domain, category) {
            Ok(target) => target.remove(index),
            Err(_) => MapOutcome::Unchanged,
        }
    }

    fn domain_mut(&mut self, name: &str) -> Result<&mut Domain, SolutionMapError> {
        self.domains
            .get_mut(name)
            .ok_or(SolutionMapError::InvalidTarget)
    }

    fn category_mut(
        &mut self,
        domain: &str,
        category: &str,
    ) -> Result<&mut Category, SolutionMapError> {
        self.domain_mut(domain)?.category_mut(category)
    }
}

/// Moves `old` to `new` in place so siblings keep their display order.
fn rename_key<V>(
    map: &mut IndexMap<String, V>,
    old: &str,
    new: &str,
) -> Result<MapOutcome, SolutionMapError> {
    let (position, _, value) = map
        .shift_remove_full(old)
        .ok_or(SolutionMapError::InvalidTarget)?;
    map.shift_insert(position, new.to_string(), value);
    Ok(MapOutcome::Applied)
}

impl<'de> Deserialize<'de> for SolutionMapContent {
    /// Older documents sometimes stored the draft as an array or `null`; both load as empty.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Stored {
            Map(IndexMap<String, Domain>),
            Other(IgnoredAny),
        }

        Ok(match Stored::deserialize(deserializer)? {
            Stored::Map(domains) => Self { domains },
            Stored::Other(_) => Self::default(),
        })
    }
}
