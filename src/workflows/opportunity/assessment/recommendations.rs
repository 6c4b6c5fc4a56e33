use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::config::Dimension;
use super::AssessmentError;

/// Divergence from a suggestion at which a score change needs explicit confirmation.
pub const OVERRIDE_CONFIRMATION_GAP: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    #[serde(alias = "high", alias = "HIGH")]
    High,
    #[serde(alias = "medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "low", alias = "LOW")]
    Low,
}

impl Confidence {
    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

/// Suggested score for a single line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecommendation {
    pub score: i32,
    pub confidence: Confidence,
    #[serde(default)]
    pub reason: String,
}

/// Category id → suggestions aligned by item index.
pub type DimensionRecommendations = BTreeMap<String, Vec<ItemRecommendation>>;

/// Suggestions stored on a record, kept apart from the confirmed scores.
///
/// Each dimension is kept as the JSON it arrived as, so documents written by
/// older tools load even when an entry no longer matches [`ItemRecommendation`].
/// Entries are decoded one at a time on lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendations {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biz: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tech: Option<Value>,
}

impl Recommendations {
    pub fn get(&self, dimension: Dimension) -> Option<&Value> {
        match dimension {
            Dimension::Biz => self.biz.as_ref(),
            Dimension::Tech => self.tech.as_ref(),
        }
    }

    pub fn set(&mut self, dimension: Dimension, payload: DimensionRecommendations) {
        let payload = serde_json::to_value(payload).unwrap_or_default();
        match dimension {
            Dimension::Biz => self.biz = Some(payload),
            Dimension::Tech => self.tech = Some(payload),
        }
    }

    /// Suggestion for one item; `None` when absent or not decodable.
    pub fn item(
        &self,
        dimension: Dimension,
        category_id: &str,
        index: usize,
    ) -> Option<ItemRecommendation> {
        let entry = self.get(dimension)?.get(category_id)?.get(index)?;
        ItemRecommendation::deserialize(entry).ok()
    }
}

/// Validated scoring-suggestion document from the language-model collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationResponse {
    pub biz: DimensionRecommendations,
    pub tech: DimensionRecommendations,
}

impl RecommendationResponse {
    /// Accepts a JSON document, optionally wrapped in a Markdown code fence.
    pub fn parse(raw: &str) -> Result<Self, AssessmentError> {
        let body = strip_code_fence(raw);
        let value: Value = serde_json::from_str(body)
            .map_err(|err| AssessmentError::MalformedRecommendations(err.to_string()))?;
        Self::from_value(&value)
    }

    /// Requires both `biz` and `tech` objects before anything is accepted.
    pub fn from_value(value: &Value) -> Result<Self, AssessmentError> {
        let object = value.as_object().ok_or_else(|| {
            AssessmentError::MalformedRecommendations("response is not a JSON object".to_string())
        })?;

        let biz = dimension_payload(object.get(Dimension::Biz.key()), Dimension::Biz)?;
        let tech = dimension_payload(object.get(Dimension::Tech.key()), Dimension::Tech)?;

        Ok(Self { biz, tech })
    }

    pub fn into_parts(self) -> [(Dimension, DimensionRecommendations); 2] {
        [(Dimension::Biz, self.biz), (Dimension::Tech, self.tech)]
    }
}

fn dimension_payload(
    value: Option<&Value>,
    dimension: Dimension,
) -> Result<DimensionRecommendations, AssessmentError> {
    let value = match value {
        Some(value) if value.is_object() => value,
        Some(_) => {
            return Err(AssessmentError::MalformedRecommendations(format!(
                "'{dimension}' must be an object of category arrays"
            )))
        }
        None => {
            return Err(AssessmentError::MalformedRecommendations(format!(
                "missing '{dimension}' section"
            )))
        }
    };

    serde_json::from_value(value.clone()).map_err(|err| {
        AssessmentError::MalformedRecommendations(format!("invalid '{dimension}' section: {err}"))
    })
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// True when the chosen score is far enough from the suggestion to need confirmation.
pub fn requires_override_confirmation(chosen: i32, recommended: i32) -> bool {
    (chosen - recommended).abs() >= OVERRIDE_CONFIRMATION_GAP
}
