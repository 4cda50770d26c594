//! Keyword scoring: maps a normalized posting to a 0–100 breakdown.
//!
//! Three capped sub-scores, summed and clamped:
//! - seniority (0–40): best single term match; title hits count full,
//!   raw-text hits count half; no match yields a small non-zero baseline
//!   so a posting is never dropped purely for missing text.
//! - domain (0–40): distinct-term coverage over title + raw text. Each
//!   configured term counts at most once — repeated hits do not keep
//!   adding score.
//! - location (0–20): allow-list exact/prefix match; a missing location
//!   scores the neutral mid-value instead of zero or max.
//!
//! Pure and total: every posting yields a breakdown, identical input
//! yields identical output. All vocabulary is injected via
//! `ScoringConfig`; nothing here reads ambient state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::posting::NormalizedPosting;

pub const SENIORITY_MAX: u8 = 40;
pub const DOMAIN_MAX: u8 = 40;
pub const LOCATION_MAX: u8 = 20;

/// Vocabulary and weights for the three sub-scores. Policy content — the
/// terms live in config, only the capped shape is structural.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    /// Term → points, matched against title (full) and raw text (half).
    pub seniority: BTreeMap<String, u8>,
    /// Sub-score when no seniority term matches at all.
    #[serde(default = "default_seniority_baseline")]
    pub seniority_baseline: u8,
    /// Term → points, each distinct term counted once.
    pub domain: BTreeMap<String, u8>,
    /// Allowed locations; an entry matches exactly or as a prefix
    /// (e.g. "remote" matches "Remote - EMEA").
    pub location_allow: Vec<String>,
}

fn default_seniority_baseline() -> u8 {
    5
}

impl ScoringConfig {
    /// A config with no vocabulary would silently score everything near
    /// zero; refuse it at startup instead.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.seniority.is_empty() {
            return Err(ConfigError::MissingVocabulary("scoring.seniority"));
        }
        if self.domain.is_empty() {
            return Err(ConfigError::MissingVocabulary("scoring.domain"));
        }
        if self.location_allow.is_empty() {
            return Err(ConfigError::MissingVocabulary("scoring.location_allow"));
        }
        Ok(())
    }
}

/// Sub-scores plus total. Invariant: `total = seniority + domain + location`
/// clamped to [0,100].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub seniority: u8,
    pub domain: u8,
    pub location: u8,
    pub total: u8,
}

#[derive(Debug, Clone)]
pub struct ScoreCalculator {
    cfg: ScoringConfig,
}

impl ScoreCalculator {
    pub fn new(cfg: ScoringConfig) -> Self {
        Self { cfg }
    }

    pub fn score(&self, posting: &NormalizedPosting) -> ScoreBreakdown {
        let title = posting.title.to_lowercase();
        let text = posting.raw_text.to_lowercase();

        let seniority = self.seniority_score(&title, &text);
        let domain = self.domain_score(&title, &text);
        let location = self.location_score(posting.location.as_deref());

        let total = (seniority as u16 + domain as u16 + location as u16).min(100) as u8;
        ScoreBreakdown {
            seniority,
            domain,
            location,
            total,
        }
    }

    /// Best single term wins; a title hit outweighs a raw-text hit.
    fn seniority_score(&self, title: &str, text: &str) -> u8 {
        let mut best: u8 = 0;
        let mut matched = false;
        for (term, &points) in &self.cfg.seniority {
            let term = term.to_lowercase();
            let candidate = if title.contains(&term) {
                points
            } else if text.contains(&term) {
                points / 2
            } else {
                continue;
            };
            matched = true;
            best = best.max(candidate);
        }
        if !matched {
            best = self.cfg.seniority_baseline;
        }
        best.min(SENIORITY_MAX)
    }

    /// Distinct-term coverage with a hard cap: diminishing, not linear.
    fn domain_score(&self, title: &str, text: &str) -> u8 {
        let mut sum: u16 = 0;
        for (term, &points) in &self.cfg.domain {
            let term = term.to_lowercase();
            if title.contains(&term) || text.contains(&term) {
                sum += points as u16;
            }
        }
        sum.min(DOMAIN_MAX as u16) as u8
    }

    /// Unknown location is neutral, not a penalty.
    fn location_score(&self, location: Option<&str>) -> u8 {
        let Some(loc) = location else {
            return LOCATION_MAX / 2;
        };
        let loc = loc.trim().to_lowercase();
        if loc.is_empty() {
            return LOCATION_MAX / 2;
        }
        let hit = self
            .cfg
            .location_allow
            .iter()
            .map(|a| a.trim().to_lowercase())
            .any(|a| !a.is_empty() && (loc == a || loc.starts_with(&a)));
        if hit {
            LOCATION_MAX
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> ScoringConfig {
        ScoringConfig {
            seniority: BTreeMap::from([
                ("principal".to_string(), 40),
                ("staff".to_string(), 36),
                ("senior".to_string(), 20),
            ]),
            seniority_baseline: 5,
            domain: BTreeMap::from([
                ("machine learning".to_string(), 14),
                ("llm".to_string(), 12),
                ("inference".to_string(), 10),
                ("distributed systems".to_string(), 8),
            ]),
            location_allow: vec!["remote".to_string(), "hyderabad".to_string()],
        }
    }

    fn posting(title: &str, location: Option<&str>, raw_text: &str) -> NormalizedPosting {
        NormalizedPosting {
            source_id: "t".into(),
            title: title.into(),
            company: "Acme".into(),
            location: location.map(Into::into),
            url: "https://acme.example/jobs/1".into(),
            posted_at: None,
            raw_text: raw_text.into(),
        }
    }

    #[test]
    fn scoring_is_deterministic() {
        let calc = ScoreCalculator::new(cfg());
        let p = posting("Principal Machine Learning Engineer", Some("Remote"), "LLM inference");
        assert_eq!(calc.score(&p), calc.score(&p));
    }

    #[test]
    fn title_hit_beats_raw_text_hit() {
        let calc = ScoreCalculator::new(cfg());
        let in_title = posting("Principal Engineer", None, "");
        let in_text = posting("Engineer", None, "principal-level scope");
        assert_eq!(calc.score(&in_title).seniority, 40);
        assert_eq!(calc.score(&in_text).seniority, 20);
    }

    #[test]
    fn missing_seniority_gets_baseline_not_zero() {
        let calc = ScoreCalculator::new(cfg());
        let p = posting("Software Engineer", None, "build things");
        assert_eq!(calc.score(&p).seniority, 5);
    }

    #[test]
    fn domain_terms_count_once_and_cap() {
        let calc = ScoreCalculator::new(cfg());
        let repeated = posting("LLM LLM LLM", None, "llm llm llm");
        assert_eq!(calc.score(&repeated).domain, 12);

        let all = posting(
            "Machine Learning",
            None,
            "llm inference on distributed systems",
        );
        // 14 + 12 + 10 + 8 = 44 → capped at 40
        assert_eq!(calc.score(&all).domain, 40);
    }

    #[test]
    fn location_prefix_match_and_neutral_missing() {
        let calc = ScoreCalculator::new(cfg());
        assert_eq!(calc.score(&posting("x", Some("Remote - EMEA"), "")).location, 20);
        assert_eq!(calc.score(&posting("x", Some("Hyderabad, India"), "")).location, 20);
        assert_eq!(calc.score(&posting("x", Some("Berlin"), "")).location, 0);
        assert_eq!(calc.score(&posting("x", None, "")).location, 10);
        assert_eq!(calc.score(&posting("x", Some("  "), "")).location, 10);
    }

    #[test]
    fn total_is_sum_of_parts() {
        let calc = ScoreCalculator::new(cfg());
        let p = posting("Principal LLM Engineer", Some("Remote"), "machine learning inference");
        let b = calc.score(&p);
        assert_eq!(b.total as u16, b.seniority as u16 + b.domain as u16 + b.location as u16);
        assert!(b.total <= 100);
    }

    #[test]
    fn empty_vocabulary_rejected() {
        let mut c = cfg();
        c.domain.clear();
        assert!(c.validate().is_err());
        assert!(cfg().validate().is_ok());
    }
}
