use serde::{Deserialize, Serialize};

use crate::indicators::registry::{Registry, UnitType};
use crate::models::{DataPoint, TimeSeries};

/// One line of the chart: x = date, y = value.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChartLine {
    pub name: String,
    pub title: String,
    pub unit: Option<UnitType>,
    pub points: Vec<DataPoint>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChartData {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub lines: Vec<ChartLine>,
}

impl ChartData {
    /// Indicators without data get no line; missing periods stay in as gaps.
    pub fn build(registry: &Registry, resolved: &[(String, TimeSeries)]) -> Self {
        let lines = resolved
            .iter()
            .filter(|(_, series)| series.defined_len() > 0)
            .map(|(name, series)| {
                let spec = registry.get(name);
                ChartLine {
                    name: name.clone(),
                    title: spec.map(|s| s.title.clone()).unwrap_or_else(|| name.clone()),
                    unit: spec.map(|s| s.unit),
                    points: series.to_points(),
                }
            })
            .collect();

        Self {
            title: "Makroindikatoren Deutschland".to_string(),
            x_label: "Datum".to_string(),
            y_label: "Wert".to_string(),
            lines,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_empty_series_produce_no_line() {
        let registry = Registry::builtin();
        let cpi: TimeSeries = vec![(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 117.6)]
            .into_iter()
            .collect();
        let resolved = vec![
            ("cpi".to_string(), cpi),
            ("hicp_index".to_string(), TimeSeries::new()),
        ];

        let chart = ChartData::build(&registry, &resolved);
        assert_eq!(chart.lines.len(), 1);
        assert_eq!(chart.lines[0].name, "cpi");
        assert_eq!(chart.lines[0].title, "Verbraucherpreisindex (2020=100)");
        assert_eq!(chart.lines[0].unit, Some(UnitType::Index));

        let json = chart.to_json().unwrap();
        assert!(json.contains("\"2024-01-01\""));
        assert!(json.contains("\"unit\": \"Index\""));
    }
}
