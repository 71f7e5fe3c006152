/// Quality tier selects how much optional scene detail the host renders.
/// Tiers scale visual density and effects. They never change simulation.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    /// Integrated GPUs and phones: no shadows, no particles, short view distance.
    Low,
    #[default]
    Medium,
    High,
    /// Everything on, pixel ratio capped only by the device.
    Ultra,
}

impl QualityTier {
    /// All tiers in ascending order.
    pub const ALL: [QualityTier; 4] = [
        QualityTier::Low,
        QualityTier::Medium,
        QualityTier::High,
        QualityTier::Ultra,
    ];

    /// Position in `ALL`, used to index preset tables.
    pub fn index(self) -> usize {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
            Self::Ultra => 3,
        }
    }

    /// Short human-readable label for logs and overlays.
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Ultra => "Ultra",
        }
    }

    /// One tier cheaper, or `None` at the bottom.
    pub fn step_down(self) -> Option<Self> {
        match self {
            Self::Low => None,
            Self::Medium => Some(Self::Low),
            Self::High => Some(Self::Medium),
            Self::Ultra => Some(Self::High),
        }
    }

    /// One tier richer, or `None` at the top.
    pub fn step_up(self) -> Option<Self> {
        match self {
            Self::Low => Some(Self::Medium),
            Self::Medium => Some(Self::High),
            Self::High => Some(Self::Ultra),
            Self::Ultra => None,
        }
    }
}

impl std::fmt::Display for QualityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_medium() {
        assert_eq!(QualityTier::default(), QualityTier::Medium);
    }

    #[test]
    fn all_is_sorted_and_matches_index() {
        for (i, tier) in QualityTier::ALL.iter().enumerate() {
            assert_eq!(tier.index(), i);
        }
        assert!(QualityTier::ALL.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn steps_move_exactly_one_tier() {
        assert_eq!(QualityTier::Low.step_down(), None);
        assert_eq!(QualityTier::Ultra.step_up(), None);
        for &tier in &QualityTier::ALL {
            if let Some(down) = tier.step_down() {
                assert_eq!(down.index() + 1, tier.index());
            }
            if let Some(up) = tier.step_up() {
                assert_eq!(up.index(), tier.index() + 1);
            }
        }
    }

    #[test]
    fn display_matches_label() {
        for &tier in &QualityTier::ALL {
            assert_eq!(format!("{}", tier), tier.label());
        }
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&QualityTier::Ultra).expect("serialize tier");
        assert_eq!(json, "\"ultra\"");
        let parsed: QualityTier = serde_json::from_str("\"low\"").expect("parse tier");
        assert_eq!(parsed, QualityTier::Low);
    }
}
