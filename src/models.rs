use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single observation as handed to the chart layer.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DataPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

/// Date-indexed series. `None` marks a period that exists upstream but has no
/// usable value. Keys are unique and iterate in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    points: BTreeMap<NaiveDate, Option<f64>>,
}

impl TimeSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites the value for `date`. Non-finite values are stored as missing.
    pub fn insert(&mut self, date: NaiveDate, value: Option<f64>) {
        self.points.insert(date, value.filter(|v| v.is_finite()));
    }

    pub fn get(&self, date: &NaiveDate) -> Option<f64> {
        self.points.get(date).copied().flatten()
    }

    pub fn contains(&self, date: &NaiveDate) -> bool {
        self.points.contains_key(date)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of periods carrying an actual value.
    pub fn defined_len(&self) -> usize {
        self.points.values().filter(|v| v.is_some()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDate, &Option<f64>)> {
        self.points.iter()
    }

    pub fn dates(&self) -> impl Iterator<Item = &NaiveDate> {
        self.points.keys()
    }

    /// The `n` most recent periods, newest first.
    pub fn latest(&self, n: usize) -> Vec<(NaiveDate, Option<f64>)> {
        self.points
            .iter()
            .rev()
            .take(n)
            .map(|(d, v)| (*d, *v))
            .collect()
    }

    pub fn to_points(&self) -> Vec<DataPoint> {
        self.points
            .iter()
            .map(|(date, value)| DataPoint { date: *date, value: *value })
            .collect()
    }
}

impl FromIterator<(NaiveDate, Option<f64>)> for TimeSeries {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, Option<f64>)>>(iter: I) -> Self {
        let mut series = TimeSeries::new();
        for (date, value) in iter {
            series.insert(date, value);
        }
        series
    }
}

impl FromIterator<(NaiveDate, f64)> for TimeSeries {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, f64)>>(iter: I) -> Self {
        iter.into_iter().map(|(d, v)| (d, Some(v))).collect()
    }
}
