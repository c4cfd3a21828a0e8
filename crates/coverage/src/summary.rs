//! Covered/total counters, percentages and threshold bands

use serde::{Deserialize, Serialize};

/// A covered/total pair for one unit kind (bytes, statements, lines...)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub covered: u64,
    pub total: u64,
}

impl Summary {
    /// Build a summary, clamping `covered` so it never exceeds `total`
    pub fn new(covered: u64, total: u64) -> Self {
        Self {
            covered: covered.min(total),
            total,
        }
    }

    /// Count how many hit counters are non-zero
    pub fn from_counts<'a>(counts: impl IntoIterator<Item = &'a u64>) -> Self {
        let mut summary = Self::default();
        for count in counts {
            summary.total += 1;
            if *count > 0 {
                summary.covered += 1;
            }
        }
        summary
    }

    pub fn pct(&self) -> f64 {
        percentage(self.covered, self.total)
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn add(&mut self, other: Summary) {
        self.covered += other.covered;
        self.total += other.total;
    }
}

/// Percentage of `covered` over `total`, 0 when there is nothing to cover
pub fn percentage(covered: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (covered as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
}

/// Visual band a percentage falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Threshold {
    High,
    Medium,
    Low,
}

impl Threshold {
    pub const HIGH: f64 = 80.0;
    pub const MEDIUM: f64 = 50.0;

    /// Classify a percentage. Anything that is not a number lands in `Low`.
    pub fn classify(pct: f64) -> Self {
        if pct >= Self::HIGH {
            Threshold::High
        } else if pct >= Self::MEDIUM {
            Threshold::Medium
        } else {
            Threshold::Low
        }
    }

    /// CSS class used by the HTML reports
    pub fn css_class(&self) -> &'static str {
        match self {
            Threshold::High => "high",
            Threshold::Medium => "medium",
            Threshold::Low => "low",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Threshold::High => "#4CAF50",
            Threshold::Medium => "#FF9800",
            Threshold::Low => "#f44336",
        }
    }
}

/// Arithmetic mean of the frontend and backend percentages.
///
/// Not weighted by size: a small backend and a large frontend count equally.
pub fn combined_percentage(frontend: Option<f64>, backend: Option<f64>) -> Option<f64> {
    match (frontend, backend) {
        (Some(fe), Some(be)) => Some((fe + be) / 2.0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_percentage_zero_total() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(Summary::default().pct(), 0.0);
    }

    #[test]
    fn test_percentage_bounds() {
        for total in [1u64, 3, 7, 1000] {
            for covered in 0..=total.min(50) {
                let pct = percentage(covered, total);
                assert!((0.0..=100.0).contains(&pct), "{covered}/{total} gave {pct}");
            }
        }
        assert_eq!(percentage(5, 5), 100.0);
    }

    #[test]
    fn test_summary_clamps_covered() {
        let summary = Summary::new(12, 10);
        assert_eq!(summary.covered, 10);
        assert_eq!(summary.pct(), 100.0);
    }

    #[test]
    fn test_from_counts() {
        let summary = Summary::from_counts(&[0, 3, 1, 0]);
        assert_eq!(summary, Summary { covered: 2, total: 4 });
    }

    #[test_case(100.0, Threshold::High)]
    #[test_case(80.0, Threshold::High)]
    #[test_case(79.99, Threshold::Medium)]
    #[test_case(50.0, Threshold::Medium)]
    #[test_case(49.9, Threshold::Low)]
    #[test_case(0.0, Threshold::Low)]
    #[test_case(f64::NAN, Threshold::Low)]
    fn test_classify(pct: f64, expected: Threshold) {
        assert_eq!(Threshold::classify(pct), expected);
    }

    #[test]
    fn test_combined_is_plain_mean() {
        assert_eq!(combined_percentage(Some(90.0), Some(10.0)), Some(50.0));
        assert_eq!(combined_percentage(Some(90.0), None), None);
        assert_eq!(combined_percentage(None, None), None);
    }
}
