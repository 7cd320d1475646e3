use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use tracing::info;

use super::{get_json, sdmx, unsupported, DataSource, SourceQuery};
use crate::error::Result;
use crate::indicators::registry::SourceKind;
use crate::models::TimeSeries;

pub struct BundesbankFetcher {
    client: Client,
    base_url: String,
}

impl BundesbankFetcher {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl DataSource for BundesbankFetcher {
    fn name(&self) -> &str {
        "bundesbank"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Bundesbank
    }

    async fn fetch_data(&self, query: &SourceQuery) -> Result<TimeSeries> {
        let SourceQuery::Bundesbank { flow, key } = query else {
            return Err(unsupported(self, query));
        };

        // e.g. https://api.statistiken.bundesbank.de/rest/data/BBSIS/D.I.ZAR.ZI.EUR.S1311.B.A604.R10XX.R.A.A._Z._Z.A
        let url = format!("{}/{}/{}", self.base_url, flow, key);
        info!("Fetching Bundesbank series: {}", url);

        let request = self
            .client
            .get(&url)
            .header(ACCEPT, "application/vnd.sdmx.data+json;version=1.0.0")
            .query(&[("format", "sdmx_json")]);
        let json = get_json(request, &url).await?;
        sdmx::parse_first_series(&json)
    }
}
