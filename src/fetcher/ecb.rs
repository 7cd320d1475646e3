use async_trait::async_trait;
use reqwest::Client;
use tracing::info;

use super::{get_json, sdmx, unsupported, DataSource, SourceQuery};
use crate::error::Result;
use crate::indicators::registry::SourceKind;
use crate::models::TimeSeries;

/// ECB Data Portal (formerly SDW) REST API.
pub struct EcbFetcher {
    client: Client,
    base_url: String,
}

impl EcbFetcher {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl DataSource for EcbFetcher {
    fn name(&self) -> &str {
        "ecb"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Ecb
    }

    async fn fetch_data(&self, query: &SourceQuery) -> Result<TimeSeries> {
        let SourceQuery::Ecb { flow, key } = query else {
            return Err(unsupported(self, query));
        };

        // e.g. https://data-api.ecb.europa.eu/service/data/FM/B.U2.EUR.4F.KR.MRR_FR.LEV?format=jsondata
        let url = format!("{}/{}/{}", self.base_url, flow, key);
        info!("Fetching ECB series: {}", url);

        let request = self.client.get(&url).query(&[("format", "jsondata")]);
        let json = get_json(request, &url).await?;
        sdmx::parse_first_series(&json)
    }
}
