use async_trait::async_trait;
use reqwest::Client;
use tracing::info;

use super::{get_json, sdmx, unsupported, DataSource, SourceQuery};
use crate::error::Result;
use crate::indicators::registry::SourceKind;
use crate::models::TimeSeries;

/// OECD.Stat SDMX-JSON endpoint, e.g. `.../data/KEI/CLI.DEU.M/all`.
pub struct OecdFetcher {
    client: Client,
    base_url: String,
}

impl OecdFetcher {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, dataset: &str, indicator: &str, country: &str, frequency: &str) -> String {
        format!(
            "{}/{}/{}.{}.{}/all",
            self.base_url, dataset, indicator, country, frequency
        )
    }
}

#[async_trait]
impl DataSource for OecdFetcher {
    fn name(&self) -> &str {
        "oecd"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Oecd
    }

    async fn fetch_data(&self, query: &SourceQuery) -> Result<TimeSeries> {
        let SourceQuery::Oecd { dataset, indicator, country, frequency } = query else {
            return Err(unsupported(self, query));
        };

        let url = self.url(dataset, indicator, country, frequency);
        info!("Fetching OECD data: {}", url);

        let json = get_json(self.client.get(&url), &url).await?;
        sdmx::parse_first_series(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::build_client;
    use chrono::NaiveDate;
    use mockito::Server;
    use std::time::Duration;

    fn cli_query() -> SourceQuery {
        SourceQuery::Oecd {
            dataset: "KEI".into(),
            indicator: "CLI".into(),
            country: "DEU".into(),
            frequency: "M".into(),
        }
    }

    const PAYLOAD: &str = r#"{
        "structure": { "dimensions": { "observation": [
            { "id": "TIME_PERIOD", "values": [ {"id": "2024-03"}, {"id": "2024-01"}, {"id": "2024-02"} ] }
        ]}},
        "dataSets": [{ "series": { "0:0:0": { "observations": {
            "0": [99.8], "1": [99.1], "2": [99.5]
        }}}}]
    }"#;

    #[test]
    fn test_url_layout() {
        let fetcher = OecdFetcher::new(Client::new(), "https://stats.oecd.org/SDMX-JSON/data/");
        assert_eq!(
            fetcher.url("KEI", "GDP", "DEU", "M"),
            "https://stats.oecd.org/SDMX-JSON/data/KEI/GDP.DEU.M/all"
        );
    }

    #[tokio::test]
    async fn test_fetch_sorted_ascending() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/KEI/CLI.DEU.M/all")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(PAYLOAD)
            .create_async()
            .await;

        let fetcher = OecdFetcher::new(build_client(Duration::from_secs(5)), &server.url());
        let series = fetcher.fetch_data(&cli_query()).await.unwrap();

        mock.assert_async().await;
        let dates: Vec<_> = series.dates().copied().collect();
        let mut sorted = dates.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(dates, sorted);
        assert_eq!(dates.len(), 3);
        assert_eq!(series.get(&NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()), Some(99.1));
    }

    #[tokio::test]
    async fn test_non_2xx_is_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/KEI/CLI.DEU.M/all")
            .with_status(404)
            .create_async()
            .await;

        let fetcher = OecdFetcher::new(build_client(Duration::from_secs(5)), &server.url());
        let err = fetcher.fetch_data(&cli_query()).await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Transport);
    }

    #[tokio::test]
    async fn test_wrong_query_kind_rejected() {
        let fetcher = OecdFetcher::new(Client::new(), "http://localhost");
        let query = SourceQuery::Destatis { code: "61111-0002".into() };
        assert!(fetcher.fetch_data(&query).await.is_err());
    }
}
