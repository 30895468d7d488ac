//! Per-profile structural rule sets.
//!
//! A [`RuleSet`] is derived deterministically from a [`ContentProfile`]: every
//! profile starts from the same baseline and a few override individual
//! thresholds.

use contentforge_core::ContentProfile;
use serde::{Deserialize, Serialize};

/// How strongly the stylist should push subject-verb-object phrasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SvoPreference {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for SvoPreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "High"),
            Self::Medium => write!(f, "Medium"),
            Self::Low => write!(f, "Low"),
        }
    }
}

/// Structural thresholds applied by the stage agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub require_h2_questions: bool,
    pub require_answer_first_intro: bool,

    /// Inclusive word bounds for an answer-first introduction
    pub intro_min_words: usize,
    pub intro_max_words: usize,

    /// Inclusive word bounds for a chunk (paragraph under an H2)
    pub chunk_length_min: usize,
    pub chunk_length_max: usize,

    pub require_faq: bool,
    pub faq_min_entries: usize,

    pub title_max_chars: usize,

    /// Inclusive character bounds for the meta description
    pub meta_description_min_chars: usize,
    pub meta_description_max_chars: usize,

    pub max_sentence_words: usize,
    pub evidence_density_check: bool,
    pub svo_preference: SvoPreference,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            require_h2_questions: true,
            require_answer_first_intro: true,
            intro_min_words: 30,
            intro_max_words: 60,
            chunk_length_min: 75,
            chunk_length_max: 250,
            require_faq: true,
            faq_min_entries: 3,
            title_max_chars: 60,
            meta_description_min_chars: 140,
            meta_description_max_chars: 160,
            max_sentence_words: 30,
            evidence_density_check: true,
            svo_preference: SvoPreference::High,
        }
    }
}

impl RuleSet {
    /// The rule set for a content profile.
    pub fn for_profile(profile: ContentProfile) -> Self {
        let mut rules = Self::default();

        match profile {
            ContentProfile::ThoughtLeadership => {
                rules.require_h2_questions = false;
                rules.chunk_length_max = 300;
            }
            ContentProfile::ProductPage => {
                rules.require_answer_first_intro = false;
                rules.chunk_length_min = 50;
            }
            ContentProfile::KnowledgeBase => {
                rules.require_h2_questions = false;
                rules.svo_preference = SvoPreference::Medium;
            }
            ContentProfile::Blog | ContentProfile::ServicePage => {}
        }

        rules
    }

    pub fn intro_range(&self) -> std::ops::RangeInclusive<usize> {
        self.intro_min_words..=self.intro_max_words
    }

    pub fn meta_description_range(&self) -> std::ops::RangeInclusive<usize> {
        self.meta_description_min_chars..=self.meta_description_max_chars
    }
}
