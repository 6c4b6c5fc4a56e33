use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::assessment::AssessmentRecord;
use super::solution_map::{SavedMap, SolutionMapContent};

/// Identifier wrapper for tracked deals.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DealId(pub String);

impl DealId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DealId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle stage of a deal. `Purchase` shares the evaluation scoring record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    Awareness,
    Consideration,
    Evaluation,
    Purchase,
}

impl StageId {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::Awareness,
            Self::Consideration,
            Self::Evaluation,
            Self::Purchase,
        ]
    }

    /// Stages that own an assessment record of their own.
    pub const fn scoring() -> [Self; 3] {
        [Self::Awareness, Self::Consideration, Self::Evaluation]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Awareness => "awareness",
            Self::Consideration => "consideration",
            Self::Evaluation => "evaluation",
            Self::Purchase => "purchase",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Awareness => "1. Awareness",
            Self::Consideration => "2. Consideration",
            Self::Evaluation => "3. Evaluation",
            Self::Purchase => "4. Purchase",
        }
    }

    /// Stage whose assessment record backs reads for `self`.
    pub const fn effective(self) -> Self {
        match self {
            Self::Purchase => Self::Evaluation,
            other => other,
        }
    }

    pub const fn is_read_only(self) -> bool {
        matches!(self, Self::Purchase)
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for StageId {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "awareness" => Ok(Self::Awareness),
            "consideration" => Ok(Self::Consideration),
            "evaluation" => Ok(Self::Evaluation),
            "purchase" => Ok(Self::Purchase),
            other => Err(format!(
                "unknown stage '{other}' (expected awareness, consideration, evaluation or purchase)"
            )),
        }
    }
}

/// Editable header fields of a deal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealProfile {
    pub client_name: String,
    pub deal_name: String,
    #[serde(default)]
    pub client_contact: String,
    #[serde(default)]
    pub internal_contact: String,
    #[serde(default)]
    pub solution: String,
    #[serde(default)]
    pub purchase_date: String,
    #[serde(default)]
    pub memo: String,
}

/// Free-form discovery inputs captured per stage. Insight generation lives elsewhere.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryNotes {
    #[serde(default)]
    pub behavior: String,
    #[serde(default)]
    pub emotion: String,
    #[serde(default)]
    pub touchpoint: String,
    #[serde(default)]
    pub problem: String,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub frozen: bool,
}

/// Saved analysis report attached to a deal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedReport {
    pub id: String,
    pub title: String,
    #[serde(rename = "contentHTML")]
    pub content_html: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

/// The deal aggregate. Owns every map, snapshot, and assessment record beneath it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub id: DealId,
    #[serde(default)]
    pub client_name: String,
    #[serde(default)]
    pub deal_name: String,
    #[serde(default)]
    pub client_contact: String,
    #[serde(default)]
    pub internal_contact: String,
    #[serde(default)]
    pub solution: String,
    #[serde(default)]
    pub purchase_date: String,
    #[serde(default)]
    pub memo: String,
    #[serde(default)]
    pub discovery: BTreeMap<StageId, DiscoveryNotes>,
    #[serde(default)]
    pub assessment: BTreeMap<StageId, AssessmentRecord>,
    #[serde(default)]
    pub solution_map_content: SolutionMapContent,
    #[serde(default)]
    pub saved_maps: Vec<SavedMap>,
    #[serde(default)]
    pub reports: Vec<SavedReport>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
    /// Fields owned by collaborators outside this crate, carried through untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Deal {
    pub fn new(id: DealId, profile: DealProfile, now: DateTime<Utc>) -> Self {
        let discovery = StageId::ordered()
            .into_iter()
            .map(|stage| (stage, DiscoveryNotes::default()))
            .collect();

        let mut deal = Self {
            id,
            client_name: String::new(),
            deal_name: String::new(),
            client_contact: String::new(),
            internal_contact: String::new(),
            solution: String::new(),
            purchase_date: String::new(),
            memo: String::new(),
            discovery,
            assessment: BTreeMap::new(),
            solution_map_content: SolutionMapContent::default(),
            saved_maps: Vec::new(),
            reports: Vec::new(),
            updated_at: now,
            extra: BTreeMap::new(),
        };
        deal.apply_profile(profile);
        deal
    }

    pub fn profile(&self) -> DealProfile {
        DealProfile {
            client_name: self.client_name.clone(),
            deal_name: self.deal_name.clone(),
            client_contact: self.client_contact.clone(),
            internal_contact: self.internal_contact.clone(),
            solution: self.solution.clone(),
            purchase_date: self.purchase_date.clone(),
            memo: self.memo.clone(),
        }
    }

    pub fn apply_profile(&mut self, profile: DealProfile) {
        let DealProfile {
            client_name,
            deal_name,
            client_contact,
            internal_contact,
            solution,
            purchase_date,
            memo,
        } = profile;

        self.client_name = client_name;
        self.deal_name = deal_name;
        self.client_contact = client_contact;
        self.internal_contact = internal_contact;
        self.solution = solution;
        self.purchase_date = purchase_date;
        self.memo = memo;
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

static ID_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Base-36 millisecond timestamp followed by a process-wide sequence.
pub(crate) fn next_deal_id(now: DateTime<Utc>) -> DealId {
    let seq = ID_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    DealId(format!("{}{}", timestamp_id(now), to_base36(seq)))
}

/// Timestamp id for child entries (snapshots, reports), bumped until it is free.
pub(crate) fn unique_child_id<'a>(
    now: DateTime<Utc>,
    existing: impl Iterator<Item = &'a str> + Clone,
) -> String {
    let base = timestamp_id(now);
    if !existing.clone().any(|id| id == base) {
        return base;
    }

    (1u64..)
        .map(|n| format!("{base}-{}", to_base36(n)))
        .find(|candidate| !existing.clone().any(|id| id == candidate))
        .unwrap_or(base)
}

fn timestamp_id(now: DateTime<Utc>) -> String {
    to_base36(now.timestamp_millis().max(0) as u64)
}

pub(crate) fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }

    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}
