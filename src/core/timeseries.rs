use crate::models::TimeSeries;
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Aligns two series on the union of their dates.
///
/// A date present in only one input yields `None` for the other side, so
/// callers can decide how to treat gaps. Output is ascending by date.
pub fn align_union(
    series_a: &TimeSeries,
    series_b: &TimeSeries,
) -> Vec<(NaiveDate, Option<f64>, Option<f64>)> {
    let dates: BTreeSet<NaiveDate> = series_a.dates().chain(series_b.dates()).copied().collect();

    dates
        .into_iter()
        .map(|date| (date, series_a.get(&date), series_b.get(&date)))
        .collect()
}

/// Pairs each observation with the one `lag` positions earlier.
///
/// The lag counts observations, not calendar months; the first `lag`
/// periods have no predecessor and are left out.
pub fn lagged_pairs(series: &TimeSeries, lag: usize) -> Vec<(NaiveDate, Option<f64>, Option<f64>)> {
    if lag == 0 {
        return series.iter().map(|(d, v)| (*d, *v, *v)).collect();
    }

    let points: Vec<(NaiveDate, Option<f64>)> = series.iter().map(|(d, v)| (*d, *v)).collect();

    points
        .windows(lag + 1)
        .map(|w| {
            let (date, current) = w[lag];
            let (_, previous) = w[0];
            (date, current, previous)
        })
        .collect()
}

/// Divides two optional values; zero or missing denominators give `None`.
pub fn safe_div(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d != 0.0 => Some(n / d).filter(|v| v.is_finite()),
        _ => None,
    }
}
