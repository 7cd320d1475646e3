use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::core::cache::SeriesCache;
use crate::error::{Error, Result};
use crate::indicators::registry::SourceKind;
use crate::models::TimeSeries;

pub mod bundesbank;
pub mod destatis;
pub mod ecb;
pub mod eurostat;
pub mod oecd;
pub mod sdmx;

/// Source-specific query parameters. Doubles as the cache key, so every
/// parameter that changes the upstream response must be part of the variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceQuery {
    Oecd {
        dataset: String,
        indicator: String,
        country: String,
        frequency: String,
    },
    Destatis {
        code: String,
    },
    Eurostat {
        dataset: String,
        filter: String,
    },
    Ecb {
        flow: String,
        key: String,
    },
    Bundesbank {
        flow: String,
        key: String,
    },
}

impl SourceQuery {
    pub fn kind(&self) -> SourceKind {
        match self {
            SourceQuery::Oecd { .. } => SourceKind::Oecd,
            SourceQuery::Destatis { .. } => SourceKind::Destatis,
            SourceQuery::Eurostat { .. } => SourceKind::Eurostat,
            SourceQuery::Ecb { .. } => SourceKind::Ecb,
            SourceQuery::Bundesbank { .. } => SourceKind::Bundesbank,
        }
    }
}

impl fmt::Display for SourceQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceQuery::Oecd { dataset, indicator, country, frequency } => {
                write!(f, "oecd:{}/{}.{}.{}", dataset, indicator, country, frequency)
            }
            SourceQuery::Destatis { code } => write!(f, "destatis:{}", code),
            SourceQuery::Eurostat { dataset, filter } => write!(f, "eurostat:{}?{}", dataset, filter),
            SourceQuery::Ecb { flow, key } => write!(f, "ecb:{}/{}", flow, key),
            SourceQuery::Bundesbank { flow, key } => write!(f, "bundesbank:{}/{}", flow, key),
        }
    }
}

/// One upstream statistics service.
#[async_trait]
pub trait DataSource: Send + Sync {
    fn name(&self) -> &str;
    fn kind(&self) -> SourceKind;
    async fn fetch_data(&self, query: &SourceQuery) -> Result<TimeSeries>;
}

/// Error for a query routed to the wrong adapter.
pub(crate) fn unsupported(source: &dyn DataSource, query: &SourceQuery) -> Error {
    Error::Unsupported {
        source_name: source.name().to_string(),
        query: query.to_string(),
    }
}

/// Shared HTTP client: fixed timeout, identifying user agent.
pub fn build_client(timeout: Duration) -> Client {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static("MacroDe/1.0"));

    Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            warn!("HTTP client builder failed ({}), falling back to defaults", e);
            Client::new()
        })
}

/// Sends the request and turns non-2xx statuses into `Error::Status`.
pub(crate) async fn send_checked(request: RequestBuilder, url: &str) -> Result<Response> {
    let resp = request.send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(Error::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    Ok(resp)
}

pub(crate) async fn get_json(request: RequestBuilder, url: &str) -> Result<Value> {
    let body = send_checked(request, url).await?.text().await?;
    Ok(serde_json::from_str(&body)?)
}

/// Routes queries to the matching source and caches successful results.
///
/// `fetch` never fails: transport, parse and configuration problems are
/// logged and surface as an empty series.
pub struct SeriesFetcher {
    sources: HashMap<SourceKind, Arc<dyn DataSource>>,
    cache: SeriesCache,
}

impl SeriesFetcher {
    /// Builds all five upstream adapters from the configuration.
    pub fn new(config: &AppConfig) -> Self {
        let client = build_client(config.http_timeout);
        let endpoints = &config.endpoints;

        let sources: Vec<Arc<dyn DataSource>> = vec![
            Arc::new(oecd::OecdFetcher::new(client.clone(), &endpoints.oecd)),
            Arc::new(destatis::DestatisFetcher::new(
                client.clone(),
                &endpoints.destatis,
                config.destatis.clone(),
            )),
            Arc::new(eurostat::EurostatFetcher::new(client.clone(), &endpoints.eurostat)),
            Arc::new(ecb::EcbFetcher::new(client.clone(), &endpoints.ecb)),
            Arc::new(bundesbank::BundesbankFetcher::new(client, &endpoints.bundesbank)),
        ];

        Self::with_sources(sources, config.cache_ttl)
    }

    /// Later sources replace earlier ones of the same kind.
    pub fn with_sources(sources: Vec<Arc<dyn DataSource>>, cache_ttl: Duration) -> Self {
        let sources = sources.into_iter().map(|s| (s.kind(), s)).collect();
        Self {
            sources,
            cache: SeriesCache::new(cache_ttl),
        }
    }

    pub fn cache(&self) -> &SeriesCache {
        &self.cache
    }

    pub async fn fetch(&self, query: &SourceQuery) -> TimeSeries {
        if let Some(cached) = self.cache.get(query) {
            return cached;
        }

        match self.try_fetch(query).await {
            Ok(series) => {
                info!(%query, points = series.len(), "fetched series");
                self.cache.insert(query.clone(), series.clone());
                series
            }
            Err(e) => {
                warn!(%query, kind = %e.kind(), "fetch failed, returning empty series: {}", e);
                TimeSeries::new()
            }
        }
    }

    async fn try_fetch(&self, query: &SourceQuery) -> Result<TimeSeries> {
        let source = self.sources.get(&query.kind()).ok_or_else(|| Error::Unsupported {
            source_name: query.kind().to_string(),
            query: query.to_string(),
        })?;
        source.fetch_data(query).await
    }
}
