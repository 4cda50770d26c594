//! Priority tiers and the tier → notification channel route map.

use serde::{Deserialize, Serialize};

/// Coarse priority bucket. Ordered so that comparisons read naturally:
/// `Urgent > High > Medium > Low`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    Low,
    Medium,
    High,
    Urgent,
}

/// Notification delivery mechanism a decision routes to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Push,
    Digest,
    Weekly,
}

/// Inclusive lower bounds per tier, evaluated highest-first.
/// Boundary values belong to the higher tier.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TierThresholds {
    pub urgent: u8,
    pub high: u8,
    pub medium: u8,
}

impl TierThresholds {
    pub fn classify(&self, total: u8) -> Tier {
        if total >= self.urgent {
            Tier::Urgent
        } else if total >= self.high {
            Tier::High
        } else if total >= self.medium {
            Tier::Medium
        } else {
            Tier::Low
        }
    }

    /// Thresholds must be strictly decreasing or classification would not
    /// be monotonic.
    pub fn validate(&self) -> Result<(), String> {
        if self.urgent > self.high && self.high > self.medium && self.medium > 0 {
            Ok(())
        } else {
            Err(format!(
                "tier thresholds must satisfy urgent > high > medium > 0, got {}/{}/{}",
                self.urgent, self.high, self.medium
            ))
        }
    }
}

/// Which channel each tier routes to. Content lives in config, not code.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RouteMap {
    pub urgent: Channel,
    pub high: Channel,
    pub medium: Channel,
    pub low: Channel,
}

impl RouteMap {
    pub fn channel_for(&self, tier: Tier) -> Channel {
        match tier {
            Tier::Urgent => self.urgent,
            Tier::High => self.high,
            Tier::Medium => self.medium,
            Tier::Low => self.low,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> TierThresholds {
        TierThresholds {
            urgent: 80,
            high: 60,
            medium: 40,
        }
    }

    #[test]
    fn boundaries_belong_to_higher_tier() {
        let t = thresholds();
        assert_eq!(t.classify(80), Tier::Urgent);
        assert_eq!(t.classify(79), Tier::High);
        assert_eq!(t.classify(60), Tier::High);
        assert_eq!(t.classify(59), Tier::Medium);
        assert_eq!(t.classify(40), Tier::Medium);
        assert_eq!(t.classify(39), Tier::Low);
        assert_eq!(t.classify(0), Tier::Low);
        assert_eq!(t.classify(100), Tier::Urgent);
    }

    #[test]
    fn classification_is_monotonic() {
        let t = thresholds();
        for total in 0u8..100 {
            assert!(t.classify(total) <= t.classify(total + 1));
        }
    }

    #[test]
    fn tier_order_matches_priority() {
        assert!(Tier::Urgent > Tier::High);
        assert!(Tier::High > Tier::Medium);
        assert!(Tier::Medium > Tier::Low);
    }

    #[test]
    fn bad_thresholds_rejected() {
        let t = TierThresholds {
            urgent: 60,
            high: 60,
            medium: 40,
        };
        assert!(t.validate().is_err());
    }

    #[test]
    fn tier_serde_uses_uppercase() {
        let s = serde_json::to_string(&Tier::Urgent).unwrap();
        assert_eq!(s, "\"URGENT\"");
        let back: Tier = serde_json::from_str("\"MEDIUM\"").unwrap();
        assert_eq!(back, Tier::Medium);
    }
}
