use serde::{Deserialize, Serialize};

/// Age category reported by a behavioral classifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgeGroup {
    Minor,
    Adult,
    /// No confident estimate. Older classifiers report this as `uncertain`.
    #[serde(alias = "uncertain")]
    Unknown,
}

impl AgeGroup {
    pub fn is_minor(&self) -> bool {
        matches!(self, AgeGroup::Minor)
    }
}

impl std::fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            AgeGroup::Minor => "minor",
            AgeGroup::Adult => "adult",
            AgeGroup::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// A classifier estimate: the group plus the strength of the evidence behind it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeEstimate {
    pub group: AgeGroup,
    #[serde(default)]
    pub score: u32,
}

impl AgeEstimate {
    pub fn new(group: AgeGroup, score: u32) -> Self {
        Self { group, score }
    }

    pub fn unknown() -> Self {
        Self {
            group: AgeGroup::Unknown,
            score: 0,
        }
    }
}
