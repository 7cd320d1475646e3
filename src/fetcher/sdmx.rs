//! SDMX-JSON payloads (OECD, ECB and Bundesbank all speak this dialect).
//!
//! Observations are keyed by their position in the time dimension's value
//! list, e.g. `"observations": {"0": [101.2, 0], "1": [null, 1]}` against
//! `structure.dimensions.observation[0].values = [{"id": "2024-01"}, ...]`.

use crate::core::periods::parse_period;
use crate::error::{Error, Result};
use crate::models::TimeSeries;
use serde_json::Value;
use tracing::debug;

/// Parses the first series of an SDMX-JSON data message.
pub fn parse_first_series(json: &Value) -> Result<TimeSeries> {
    let periods = period_labels(json)?;

    let series = json["dataSets"]
        .as_array()
        .and_then(|sets| sets.first())
        .and_then(|set| set["series"].as_object())
        .ok_or_else(|| Error::parse("SDMX payload has no dataSets[0].series"))?;

    // document order: serde_json is built with `preserve_order`
    let first = series
        .values()
        .next()
        .ok_or_else(|| Error::parse("SDMX dataSets[0].series is empty"))?;

    let observations = first["observations"]
        .as_object()
        .ok_or_else(|| Error::parse("SDMX series has no observations"))?;

    let mut result = TimeSeries::new();
    let mut skipped = 0usize;

    for (idx_str, obs) in observations {
        let period = idx_str
            .parse::<usize>()
            .ok()
            .and_then(|idx| periods.get(idx))
            .and_then(|label| parse_period(label));

        match period {
            Some(date) => result.insert(date, observation_value(obs)),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!(skipped, "SDMX observations without a usable period");
    }

    Ok(result)
}

/// Time period ids from the observation-level dimensions (series-level as a fallback).
fn period_labels(json: &Value) -> Result<Vec<String>> {
    let dims = &json["structure"]["dimensions"];
    let list = dims["observation"]
        .as_array()
        .filter(|a| !a.is_empty())
        .or_else(|| dims["series"].as_array().filter(|a| !a.is_empty()))
        .ok_or_else(|| Error::parse("SDMX payload has no structure.dimensions"))?;

    let time_dim = list
        .iter()
        .find(|d| {
            matches!(d["id"].as_str(), Some("TIME_PERIOD") | Some("TIME"))
                || d["role"].as_str() == Some("time")
        })
        .unwrap_or(&list[0]);

    let values = time_dim["values"]
        .as_array()
        .ok_or_else(|| Error::parse("SDMX time dimension has no values"))?;

    Ok(values
        .iter()
        .map(|v| v["id"].as_str().unwrap_or_default().to_string())
        .collect())
}

/// First element of the observation array; strings are coerced, anything else is missing.
fn observation_value(obs: &Value) -> Option<f64> {
    let raw = match obs {
        Value::Array(items) => items.first()?,
        other => other,
    };
    numeric(raw)
}

pub(crate) fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}
