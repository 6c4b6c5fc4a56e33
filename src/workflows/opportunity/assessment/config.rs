use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Evaluation axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Biz,
    Tech,
}

impl Dimension {
    pub const fn ordered() -> [Self; 2] {
        [Self::Biz, Self::Tech]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Biz => "biz",
            Self::Tech => "tech",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Biz => "Biz. Fit",
            Self::Tech => "Tech. Fit",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "biz" => Ok(Self::Biz),
            "tech" => Ok(Self::Tech),
            other => Err(format!("unknown dimension '{other}' (expected biz or tech)")),
        }
    }
}

/// A weighted cluster of line items within a dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryDefinition {
    pub id: &'static str,
    pub label: &'static str,
    pub items: &'static [&'static str],
    pub default_weight: i32,
}

impl CategoryDefinition {
    pub fn item_key(&self, index: usize) -> String {
        item_key(self.id, index)
    }
}

/// Stored score key for an item: `{category}_{index}`.
pub fn item_key(category_id: &str, index: usize) -> String {
    format!("{category_id}_{index}")
}

const BIZ_CATEGORIES: &[CategoryDefinition] = &[
    CategoryDefinition {
        id: "budget",
        label: "Budget",
        items: &["Budget secured", "Budget fit"],
        default_weight: 20,
    },
    CategoryDefinition {
        id: "authority",
        label: "Authority",
        items: &["Access to decision maker", "Internal champion strength"],
        default_weight: 25,
    },
    CategoryDefinition {
        id: "need",
        label: "Need",
        items: &["Problem fit", "Urgency of adoption"],
        default_weight: 35,
    },
    CategoryDefinition {
        id: "timeline",
        label: "Timeline",
        items: &["Decision timeline clarity", "Ease of adoption"],
        default_weight: 20,
    },
];

const TECH_CATEGORIES: &[CategoryDefinition] = &[
    CategoryDefinition {
        id: "req",
        label: "Requirement fit",
        items: &["Mandatory requirements coverage", "Use case fit"],
        default_weight: 30,
    },
    CategoryDefinition {
        id: "arch",
        label: "Architecture & infrastructure",
        items: &[
            "Compatibility with current infrastructure",
            "Security and policy compliance",
        ],
        default_weight: 25,
    },
    CategoryDefinition {
        id: "data",
        label: "Data & integration",
        items: &[
            "Data structure and format compatibility",
            "Integration effort with existing systems",
        ],
        default_weight: 25,
    },
    CategoryDefinition {
        id: "ops",
        label: "Delivery & operability",
        items: &["Implementation difficulty", "Operability and maintenance"],
        default_weight: 20,
    },
];

/// Fixed catalog of categories and line items per dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreConfig {
    biz: &'static [CategoryDefinition],
    tech: &'static [CategoryDefinition],
}

impl ScoreConfig {
    pub const STANDARD: ScoreConfig = ScoreConfig {
        biz: BIZ_CATEGORIES,
        tech: TECH_CATEGORIES,
    };

    pub const fn categories(&self, dimension: Dimension) -> &'static [CategoryDefinition] {
        match dimension {
            Dimension::Biz => self.biz,
            Dimension::Tech => self.tech,
        }
    }

    pub fn category(&self, dimension: Dimension, id: &str) -> Option<&'static CategoryDefinition> {
        self.categories(dimension)
            .iter()
            .find(|category| category.id == id)
    }

    pub fn default_weights(&self, dimension: Dimension) -> BTreeMap<String, i32> {
        self.categories(dimension)
            .iter()
            .map(|category| (category.id.to_string(), category.default_weight))
            .collect()
    }
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self::STANDARD
    }
}
