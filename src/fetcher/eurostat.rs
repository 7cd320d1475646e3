use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::info;

use super::sdmx::numeric;
use super::{get_json, unsupported, DataSource, SourceQuery};
use crate::core::periods::parse_period;
use crate::error::{Error, Result};
use crate::indicators::registry::SourceKind;
use crate::models::TimeSeries;

/// Eurostat dissemination API (JSON-stat 2.0 responses).
pub struct EurostatFetcher {
    client: Client,
    base_url: String,
}

impl EurostatFetcher {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, dataset: &str, filter: &str) -> String {
        let filter = filter.trim_start_matches(['?', '&']);
        if filter.is_empty() {
            format!("{}/{}?format=JSON", self.base_url, dataset)
        } else {
            format!("{}/{}?format=JSON&{}", self.base_url, dataset, filter)
        }
    }

    /// Joins `dimension.time.category` positions with the flat `value` index.
    ///
    /// When the filter leaves other dimensions with more than one category,
    /// only their first category is read.
    fn parse_dataset(json: &Value) -> Result<TimeSeries> {
        let category = &json["dimension"]["time"]["category"];

        let positions: Vec<(String, usize)> = if let Some(index) = category["index"].as_object() {
            index
                .iter()
                .filter_map(|(label, pos)| Some((label.clone(), pos.as_u64()? as usize)))
                .collect()
        } else if let Some(index) = category["index"].as_array() {
            index
                .iter()
                .enumerate()
                .filter_map(|(pos, label)| Some((label.as_str()?.to_string(), pos)))
                .collect()
        } else if let Some(labels) = category["label"].as_object() {
            labels.keys().cloned().enumerate().map(|(pos, l)| (l, pos)).collect()
        } else {
            return Err(Error::parse("Eurostat payload has no dimension.time.category"));
        };

        let stride = time_stride(json);
        let values = &json["value"];
        if !(values.is_object() || values.is_array()) {
            return Err(Error::parse("Eurostat payload has no value map"));
        }

        let mut series = TimeSeries::new();
        for (label, pos) in positions {
            let Some(date) = parse_period(&label) else {
                continue;
            };
            let flat = pos * stride;
            let raw = match values {
                Value::Object(map) => map.get(&flat.to_string()),
                Value::Array(items) => items.get(flat),
                _ => None,
            };
            series.insert(date, raw.and_then(numeric));
        }

        Ok(series)
    }
}

/// Product of the sizes of all dimensions listed after `time` in `id`.
fn time_stride(json: &Value) -> usize {
    let (Some(ids), Some(sizes)) = (json["id"].as_array(), json["size"].as_array()) else {
        return 1;
    };

    let Some(time_idx) = ids.iter().position(|id| id.as_str() == Some("time")) else {
        return 1;
    };

    sizes
        .iter()
        .skip(time_idx + 1)
        .filter_map(|s| s.as_u64())
        .map(|s| s.max(1) as usize)
        .product()
}

#[async_trait]
impl DataSource for EurostatFetcher {
    fn name(&self) -> &str {
        "eurostat"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Eurostat
    }

    async fn fetch_data(&self, query: &SourceQuery) -> Result<TimeSeries> {
        let SourceQuery::Eurostat { dataset, filter } = query else {
            return Err(unsupported(self, query));
        };

        let url = self.url(dataset, filter);
        info!("Fetching Eurostat dataset: {}", url);

        let json = get_json(self.client.get(&url), &url).await?;
        Self::parse_dataset(&json)
    }
}
