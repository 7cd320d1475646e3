use serde::Serialize;
use std::fmt;

use super::CalculatedIndicator;
use crate::core::timeseries::{align_union, lagged_pairs, safe_div};
use crate::models::TimeSeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransformKind {
    Diff,
    PctChangeM,
    PctChangeY,
    Ratio,
}

/// How a derived indicator is computed from its base indicator(s).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Derivation {
    /// v[t] - v[t-1]
    Diff { base: String },
    /// (v[t] / v[t-1] - 1) * 100
    PctChangeM { base: String },
    /// (v[t] / v[t-12] - 1) * 100
    PctChangeY { base: String },
    /// a[t] / b[t] on the union of dates
    Ratio { numerator: String, denominator: String },
}

impl Derivation {
    pub fn kind(&self) -> TransformKind {
        match self {
            Derivation::Diff { .. } => TransformKind::Diff,
            Derivation::PctChangeM { .. } => TransformKind::PctChangeM,
            Derivation::PctChangeY { .. } => TransformKind::PctChangeY,
            Derivation::Ratio { .. } => TransformKind::Ratio,
        }
    }
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransformKind::Diff => "DIFF",
            TransformKind::PctChangeM => "PCT_CHANGE_M",
            TransformKind::PctChangeY => "PCT_CHANGE_Y",
            TransformKind::Ratio => "RATIO",
        };
        f.write_str(s)
    }
}

/// `PCT_CHANGE_Y(cpi)`, `RATIO(hicp_index, cpi)`
impl fmt::Display for Derivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind(), self.required_inputs().join(", "))
    }
}

impl CalculatedIndicator for Derivation {
    fn required_inputs(&self) -> Vec<&str> {
        match self {
            Derivation::Diff { base } | Derivation::PctChangeM { base } | Derivation::PctChangeY { base } => {
                vec![base.as_str()]
            }
            Derivation::Ratio { numerator, denominator } => vec![numerator.as_str(), denominator.as_str()],
        }
    }

    fn calculate(&self, inputs: &[TimeSeries]) -> TimeSeries {
        if inputs.len() < self.required_inputs().len() || inputs.iter().any(|s| s.is_empty()) {
            return TimeSeries::new();
        }

        match self {
            Derivation::Diff { .. } => difference(&inputs[0]),
            Derivation::PctChangeM { .. } => pct_change(&inputs[0], 1),
            Derivation::PctChangeY { .. } => pct_change(&inputs[0], 12),
            Derivation::Ratio { .. } => ratio(&inputs[0], &inputs[1]),
        }
    }
}

pub fn difference(series: &TimeSeries) -> TimeSeries {
    lagged_pairs(series, 1)
        .into_iter()
        .map(|(date, current, previous)| {
            let value = match (current, previous) {
                (Some(c), Some(p)) => Some(c - p),
                _ => None,
            };
            (date, value)
        })
        .collect()
}

/// Percent change against the observation `lag` periods earlier.
pub fn pct_change(series: &TimeSeries, lag: usize) -> TimeSeries {
    lagged_pairs(series, lag)
        .into_iter()
        .map(|(date, current, previous)| {
            let value = safe_div(current, previous).map(|r| (r - 1.0) * 100.0);
            (date, value)
        })
        .collect()
}

/// Dates present in only one input stay in the output as missing.
pub fn ratio(numerator: &TimeSeries, denominator: &TimeSeries) -> TimeSeries {
    align_union(numerator, denominator)
        .into_iter()
        .map(|(date, a, b)| (date, safe_div(a, b)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    fn series(points: &[(NaiveDate, f64)]) -> TimeSeries {
        points.iter().copied().collect()
    }

    fn approx(a: Option<f64>, b: f64) -> bool {
        a.map(|a| (a - b).abs() < 1e-9).unwrap_or(false)
    }

    #[test]
    fn test_diff_drops_first_period() {
        let base = series(&[(d(2024, 1), 10.0), (d(2024, 2), 15.0)]);
        let out = Derivation::Diff { base: "x".into() }.calculate(&[base]);

        assert_eq!(out.len(), 1);
        assert!(!out.contains(&d(2024, 1)));
        assert_eq!(out.get(&d(2024, 2)), Some(5.0));
    }

    #[test]
    fn test_pct_change_m() {
        let base = series(&[(d(2024, 1), 100.0), (d(2024, 2), 110.0)]);
        let out = Derivation::PctChangeM { base: "x".into() }.calculate(&[base]);

        assert_eq!(out.len(), 1);
        assert!(approx(out.get(&d(2024, 2)), 10.0));
    }

    #[test]
    fn test_pct_change_y_needs_thirteen_periods() {
        let short: TimeSeries = (1..=12).map(|m| (d(2023, m), 100.0 + m as f64)).collect();
        let out = Derivation::PctChangeY { base: "x".into() }.calculate(&[short.clone()]);
        assert_eq!(out.defined_len(), 0);

        let mut long = short;
        long.insert(d(2024, 1), Some(111.1));
        let out = Derivation::PctChangeY { base: "x".into() }.calculate(&[long]);
        assert_eq!(out.len(), 1);
        assert!(approx(out.get(&d(2024, 1)), 10.0)); // 111.1 / 101 - 1
    }

    #[test]
    fn test_ratio_on_union_of_dates() {
        let a = series(&[(d(2024, 1), 1.0), (d(2024, 2), 4.0), (d(2024, 3), 9.0)]);
        let b = series(&[(d(2024, 2), 2.0), (d(2024, 3), 3.0), (d(2024, 4), 4.0)]);
        let out = Derivation::Ratio { numerator: "a".into(), denominator: "b".into() }.calculate(&[a, b]);

        assert_eq!(out.len(), 4);
        assert_eq!(out.get(&d(2024, 1)), None);
        assert_eq!(out.get(&d(2024, 2)), Some(2.0));
        assert_eq!(out.get(&d(2024, 3)), Some(3.0));
        assert_eq!(out.get(&d(2024, 4)), None);
        assert_eq!(out.defined_len(), 2);
    }

    #[test]
    fn test_zero_and_missing_denominators() {
        let mut base = series(&[(d(2024, 1), 0.0), (d(2024, 2), 5.0)]);
        base.insert(d(2024, 3), None);
        base.insert(d(2024, 4), Some(7.0));

        let out = pct_change(&base, 1);
        assert_eq!(out.get(&d(2024, 2)), None); // divide by zero
        assert_eq!(out.get(&d(2024, 3)), None); // missing numerator
        assert_eq!(out.get(&d(2024, 4)), None); // missing denominator
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_empty_input_gives_empty_output() {
        let a = series(&[(d(2024, 1), 1.0)]);
        let ratio = Derivation::Ratio { numerator: "a".into(), denominator: "b".into() };
        assert!(ratio.calculate(&[a, TimeSeries::new()]).is_empty());
        assert!(Derivation::Diff { base: "x".into() }.calculate(&[TimeSeries::new()]).is_empty());
    }

    #[test]
    fn test_required_inputs_order() {
        let ratio = Derivation::Ratio { numerator: "hicp".into(), denominator: "cpi".into() };
        assert_eq!(ratio.required_inputs(), vec!["hicp", "cpi"]);
        assert_eq!(ratio.kind(), TransformKind::Ratio);
    }

    #[test]
    fn test_display_names_transform_and_inputs() {
        let yoy = Derivation::PctChangeY { base: "cpi".into() };
        assert_eq!(yoy.to_string(), "PCT_CHANGE_Y(cpi)");
        let ratio = Derivation::Ratio { numerator: "hicp_index".into(), denominator: "cpi".into() };
        assert_eq!(ratio.to_string(), "RATIO(hicp_index, cpi)");
    }
}
