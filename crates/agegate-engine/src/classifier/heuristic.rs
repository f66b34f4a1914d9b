use agegate_types::{AgeEstimate, AgeGroup};
use async_trait::async_trait;

use super::AgeClassifier;
use crate::error::ClassifierError;

const CHILD_PATTERNS: &[&str] = &[
    "homework",
    "school",
    "math class",
    "teacher",
    "mom said",
    "dad said",
    "middle school",
    "high school",
    "exams",
    "roblox",
    "fortnite",
    "minecraft",
    "parents",
    "bus",
    "grade",
    "classmate",
    "lunch break",
    "playground",
    "toy",
    "kindergarten",
];

const ADULT_PATTERNS: &[&str] = &[
    "office",
    "work",
    "colleague",
    "salary",
    "taxes",
    "mortgage",
    "bills",
    "business",
    "meeting",
    "wine",
    "beer",
    "driving to work",
    "university",
    "career",
    "pension",
    "landlord",
];

/// Minimum number of distinct patterns before a group is reported.
const MIN_EVIDENCE: u32 = 2;

/// Local pattern scorer.
///
/// Counts distinct child and adult topic patterns in the text. A group is
/// reported only when it has at least two hits and strictly more than the
/// other group; anything else is `Unknown`.
#[derive(Clone, Debug, Default)]
pub struct HeuristicAgeClassifier;

impl HeuristicAgeClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Child-pattern hits in `text`.
    pub fn child_score(&self, text: &str) -> u32 {
        count_patterns(&text.to_lowercase(), CHILD_PATTERNS)
    }

    /// Adult-pattern hits in `text`.
    pub fn adult_score(&self, text: &str) -> u32 {
        count_patterns(&text.to_lowercase(), ADULT_PATTERNS)
    }

    pub fn estimate(&self, text: &str) -> AgeEstimate {
        let lowered = text.to_lowercase();
        let child = count_patterns(&lowered, CHILD_PATTERNS);
        let adult = count_patterns(&lowered, ADULT_PATTERNS);

        if child > adult && child >= MIN_EVIDENCE {
            AgeEstimate::new(AgeGroup::Minor, child)
        } else if adult > child && adult >= MIN_EVIDENCE {
            AgeEstimate::new(AgeGroup::Adult, adult)
        } else {
            AgeEstimate::unknown()
        }
    }
}

#[async_trait]
impl AgeClassifier for HeuristicAgeClassifier {
    async fn estimate_age_group(&self, text: &str) -> Result<AgeEstimate, ClassifierError> {
        Ok(self.estimate(text))
    }
}

fn count_patterns(lowered: &str, patterns: &[&str]) -> u32 {
    patterns.iter().filter(|p| lowered.contains(*p)).count() as u32
}
