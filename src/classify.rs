//! Six-way gap classification used to fill tracts and build the legend.

use crate::types::{TractRecord, MIN_APPLICATIONS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GapClass {
    InsufficientData,
    NoGapOrPositive,
    LowGap,
    MediumGap,
    HighGap,
    VeryHighGap,
}

/// Legend order, top to bottom.
pub const LEGEND_ORDER: [GapClass; 6] = [
    GapClass::VeryHighGap,
    GapClass::HighGap,
    GapClass::MediumGap,
    GapClass::LowGap,
    GapClass::NoGapOrPositive,
    GapClass::InsufficientData,
];

impl GapClass {
    pub fn color(self) -> &'static str {
        match self {
            GapClass::InsufficientData => "#cccccc",
            GapClass::NoGapOrPositive => "#4A90E2",
            GapClass::LowGap => "#FFE5CC",
            GapClass::MediumGap => "#FFB366",
            GapClass::HighGap => "#FF8000",
            GapClass::VeryHighGap => "#CC6600",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GapClass::InsufficientData => "Insufficient Data (<5 applications)",
            GapClass::NoGapOrPositive => "No Gap/Positive",
            GapClass::LowGap => "Low Gap (<5%)",
            GapClass::MediumGap => "Medium Gap (5-10%)",
            GapClass::HighGap => "High Gap (10-15%)",
            GapClass::VeryHighGap => "Very High Gap (>15%)",
        }
    }
}

/// Classifies a tract by its approval gap and application counts.
///
/// The sample-size check runs first, so a low-sample tract is never colored
/// by its gap. Bucket bounds are lower-inclusive: exactly `0.05` is
/// [`GapClass::MediumGap`]. A NaN gap fails every comparison and lands in
/// [`GapClass::VeryHighGap`].
pub fn classify(gap: f64, white_total: f64, black_total: f64) -> GapClass {
    if white_total + black_total < MIN_APPLICATIONS {
        return GapClass::InsufficientData;
    }

    if gap < 0.0 {
        GapClass::NoGapOrPositive
    } else if gap < 0.05 {
        GapClass::LowGap
    } else if gap < 0.10 {
        GapClass::MediumGap
    } else if gap < 0.15 {
        GapClass::HighGap
    } else {
        GapClass::VeryHighGap
    }
}

pub fn classify_tract(tract: &TractRecord) -> GapClass {
    classify(tract.gap, tract.white_total, tract.black_total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_sample_overrides_gap() {
        for gap in [-1.0, -0.01, 0.0, 0.07, 0.5, f64::NAN] {
            for (w, b) in [(0.0, 0.0), (4.0, 0.0), (0.0, 4.0), (2.0, 2.0), (3.0, 1.0), (2.5, 2.4)] {
                assert_eq!(classify(gap, w, b), GapClass::InsufficientData, "gap={gap} w={w} b={b}");
            }
        }
    }

    #[test]
    fn fractional_counts_use_the_unrounded_sum() {
        assert_eq!(classify(0.8, 2.5, 2.4), GapClass::InsufficientData);
        assert_eq!(classify(0.8, 2.5, 2.5), GapClass::VeryHighGap);
        assert_eq!(classify(0.02, 4.99, 0.0), GapClass::InsufficientData);
    }

    #[test]
    fn boundaries_are_lower_inclusive() {
        assert_eq!(classify(-0.01, 10.0, 10.0), GapClass::NoGapOrPositive);
        assert_eq!(classify(0.0, 10.0, 10.0), GapClass::LowGap);
        assert_eq!(classify(0.0499999, 10.0, 10.0), GapClass::LowGap);
        assert_eq!(classify(0.05, 10.0, 10.0), GapClass::MediumGap);
        assert_eq!(classify(0.0999, 10.0, 10.0), GapClass::MediumGap);
        assert_eq!(classify(0.10, 10.0, 10.0), GapClass::HighGap);
        assert_eq!(classify(0.15, 10.0, 10.0), GapClass::VeryHighGap);
        assert_eq!(classify(0.9, 3.0, 2.0), GapClass::VeryHighGap);
    }

    #[test]
    fn classification_is_monotonic_in_gap() {
        let rank = |c: GapClass| LEGEND_ORDER.len() - LEGEND_ORDER.iter().position(|&l| l == c).unwrap();
        let mut previous = rank(classify(-1.0, 50.0, 50.0));
        let mut gap = -1.0;
        while gap <= 1.0 {
            let current = rank(classify(gap, 50.0, 50.0));
            assert!(current >= previous, "rank dropped at gap={gap}");
            previous = current;
            gap += 0.001;
        }
    }

    #[test]
    fn legend_lists_every_class_once() {
        let colors: std::collections::HashSet<_> = LEGEND_ORDER.iter().map(|c| c.color()).collect();
        assert_eq!(colors.len(), 6);
        assert_eq!(LEGEND_ORDER[0].label(), "Very High Gap (>15%)");
        assert_eq!(LEGEND_ORDER[5], GapClass::InsufficientData);
    }
}
