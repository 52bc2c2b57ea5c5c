//! Industry pattern registry.
//!
//! Maps each industry label to the category tags that matter for it and an
//! ordered list of curated catalog ids. The order is hand-tuned relevance and
//! is preserved by the selection engine. Adding an industry means adding a
//! row here (or in a registry TOML file), never a new code path.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::domain::catalog::{normalize_category, ItemId};
use crate::domain::profile::{IndustryLabel, DEFAULT_CATEGORIES};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndustryPattern {
    pub industry: IndustryLabel,
    pub categories: Vec<String>,
    pub candidate_ids: Vec<ItemId>,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("could not read registry file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse registry file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unknown industry label `{0}` in registry data")]
    UnknownIndustry(String),
    #[error("industry `{0}` must list at least one candidate id")]
    EmptyCandidates(String),
}

#[derive(Clone, Copy, Debug)]
struct PatternSeed {
    industry: IndustryLabel,
    categories: &'static [&'static str],
    candidate_ids: &'static [i64],
}

// Ids refer to the published module catalog. Restaurant and delivery rows
// lead with the Indonesia-specific payment modules (3 = QRIS, 4 = GoPay/OVO).
const PATTERN_SEEDS: &[PatternSeed] = &[
    PatternSeed {
        industry: IndustryLabel::Restaurant,
        categories: &["ORDERING", "PAYMENTS", "BOOKING", "LOYALTY"],
        candidate_ids: &[16, 3, 6, 17, 4, 14, 18, 24],
    },
    PatternSeed {
        industry: IndustryLabel::Travel,
        categories: &["BOOKING", "PAYMENTS", "MARKETING", "COMMUNICATION"],
        candidate_ids: &[41, 42, 11, 13, 24, 9],
    },
    PatternSeed {
        industry: IndustryLabel::Retail,
        categories: &["E-COMMERCE", "INVENTORY", "PAYMENTS", "LOYALTY"],
        candidate_ids: &[1, 21, 5, 14, 2, 15, 23],
    },
    PatternSeed {
        industry: IndustryLabel::Hotel,
        categories: &["BOOKING", "PAYMENTS", "MARKETING"],
        candidate_ids: &[8, 43, 3, 24, 11, 14],
    },
    PatternSeed {
        industry: IndustryLabel::Fitness,
        categories: &["BOOKING", "SUBSCRIPTIONS", "CRM"],
        candidate_ids: &[26, 25, 7, 11, 14, 9],
    },
    PatternSeed {
        industry: IndustryLabel::Beauty,
        categories: &["BOOKING", "LOYALTY", "MARKETING"],
        candidate_ids: &[7, 14, 15, 11, 13, 24],
    },
    PatternSeed {
        industry: IndustryLabel::Medical,
        categories: &["BOOKING", "RECORDS", "COMMUNICATION"],
        candidate_ids: &[7, 27, 28, 11, 37],
    },
    PatternSeed {
        industry: IndustryLabel::Education,
        categories: &["EDUCATION", "CRM", "PAYMENTS"],
        candidate_ids: &[29, 30, 26, 12, 5],
    },
    PatternSeed {
        industry: IndustryLabel::Auto,
        categories: &["OPERATIONS", "BOOKING", "INVOICING"],
        candidate_ids: &[31, 7, 37, 21, 11],
    },
    PatternSeed {
        industry: IndustryLabel::RealEstate,
        categories: &["LISTINGS", "CRM", "DOCUMENTS"],
        candidate_ids: &[32, 33, 10, 34, 11],
    },
    PatternSeed {
        industry: IndustryLabel::Logistics,
        categories: &["FLEET", "DELIVERY", "INVENTORY"],
        candidate_ids: &[20, 19, 44, 18, 37],
    },
    PatternSeed {
        industry: IndustryLabel::Legal,
        categories: &["DOCUMENTS", "INVOICING", "CRM"],
        candidate_ids: &[35, 34, 36, 9, 7],
    },
    PatternSeed {
        industry: IndustryLabel::Consulting,
        categories: &["CRM", "INVOICING", "DOCUMENTS"],
        candidate_ids: &[10, 36, 37, 34, 12],
    },
    PatternSeed {
        industry: IndustryLabel::Event,
        categories: &["EVENTS", "PAYMENTS", "MARKETING"],
        candidate_ids: &[38, 39, 5, 13, 12],
    },
    PatternSeed {
        industry: IndustryLabel::Delivery,
        categories: &["DELIVERY", "ORDERING", "PAYMENTS"],
        candidate_ids: &[18, 19, 16, 3, 4, 20],
    },
    PatternSeed {
        industry: IndustryLabel::General,
        categories: &["CRM", "PAYMENTS", "MARKETING"],
        candidate_ids: &[9, 5, 12, 23, 11, 37],
    },
];

impl From<&PatternSeed> for IndustryPattern {
    fn from(seed: &PatternSeed) -> Self {
        Self {
            industry: seed.industry,
            categories: seed.categories.iter().map(|tag| normalize_category(tag)).collect(),
            candidate_ids: seed.candidate_ids.iter().copied().map(ItemId).collect(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct PatternRegistry {
    patterns: HashMap<IndustryLabel, IndustryPattern>,
    generic: IndustryPattern,
}

impl Default for PatternRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PatternRegistry {
    pub fn builtin() -> Self {
        let mut patterns: HashMap<IndustryLabel, IndustryPattern> =
            PATTERN_SEEDS.iter().map(|seed| (seed.industry, IndustryPattern::from(seed))).collect();
        let generic = patterns.remove(&IndustryLabel::General).unwrap_or(IndustryPattern {
            industry: IndustryLabel::General,
            categories: DEFAULT_CATEGORIES.iter().map(|tag| normalize_category(tag)).collect(),
            candidate_ids: Vec::new(),
        });
        Self { patterns, generic }
    }

    /// Built-in table with rows from `path` replacing or adding entries.
    pub fn with_overrides_from(path: &Path) -> Result<Self, RegistryError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| RegistryError::ReadFile { path: path.to_path_buf(), source })?;
        let mut registry = Self::builtin();
        registry.apply_toml(&raw)?;
        Ok(registry)
    }

    pub fn apply_toml(&mut self, raw: &str) -> Result<(), RegistryError> {
        let file: RegistryFile = toml::from_str(raw)?;
        let mut staged = Vec::with_capacity(file.industry.len());

        for row in file.industry {
            let industry = IndustryLabel::from_slug(&row.label)
                .ok_or_else(|| RegistryError::UnknownIndustry(row.label.clone()))?;
            if row.candidate_ids.is_empty() {
                return Err(RegistryError::EmptyCandidates(row.label));
            }

            let mut candidate_ids = Vec::with_capacity(row.candidate_ids.len());
            for id in row.candidate_ids.into_iter().map(ItemId) {
                if !candidate_ids.contains(&id) {
                    candidate_ids.push(id);
                }
            }
            staged.push(IndustryPattern {
                industry,
                categories: row.categories.iter().map(|tag| normalize_category(tag)).collect(),
                candidate_ids,
            });
        }

        for pattern in staged {
            if pattern.industry.is_general() {
                self.generic = pattern;
            } else {
                self.patterns.insert(pattern.industry, pattern);
            }
        }
        Ok(())
    }

    /// Never empty: unknown and general labels resolve to the generic row.
    pub fn lookup(&self, industry: IndustryLabel) -> &IndustryPattern {
        self.patterns.get(&industry).unwrap_or_else(|| self.generic())
    }

    pub fn generic(&self) -> &IndustryPattern {
        &self.generic
    }

    pub fn industries(&self) -> Vec<IndustryLabel> {
        let mut labels = self.patterns.keys().copied().collect::<Vec<_>>();
        labels.push(IndustryLabel::General);
        labels.sort();
        labels
    }
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    industry: Vec<RegistryRow>,
}

#[derive(Debug, Deserialize)]
struct RegistryRow {
    label: String,
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default)]
    candidate_ids: Vec<i64>,
}
