use async_recursion::async_recursion;
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::fetcher::SeriesFetcher;
use crate::indicators::registry::{IndicatorSource, Registry};
use crate::indicators::CalculatedIndicator;
use crate::models::TimeSeries;

/// Resolves indicator names to series: fetched specs go to the fetcher,
/// derived specs are computed from their recursively resolved bases.
pub struct Resolver {
    registry: Arc<Registry>,
    fetcher: SeriesFetcher,
    max_depth: usize,
    reported: Mutex<HashSet<String>>,
}

impl Resolver {
    pub fn new(registry: Arc<Registry>, fetcher: SeriesFetcher, max_depth: usize) -> Self {
        Self {
            registry,
            fetcher,
            max_depth,
            reported: Mutex::new(HashSet::new()),
        }
    }

    /// Wires the standard fetchers from `config`.
    pub fn from_config(registry: Arc<Registry>, config: &AppConfig) -> Self {
        Self::new(registry, SeriesFetcher::new(config), config.max_derivation_depth)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn fetcher(&self) -> &SeriesFetcher {
        &self.fetcher
    }

    /// Never fails: unknown names, bad derivations and fetch failures all
    /// come back as an empty series.
    pub async fn resolve(&self, name: &str) -> TimeSeries {
        match self.resolve_at(name, 0).await {
            Ok(series) => series,
            Err(e) => {
                self.report(name, &e);
                TimeSeries::new()
            }
        }
    }

    /// Resolves all names concurrently; output keeps the input order.
    pub async fn resolve_many<S: AsRef<str>>(&self, names: &[S]) -> Vec<(String, TimeSeries)> {
        let futures = names.iter().map(|name| async move {
            let name = name.as_ref();
            (name.to_string(), self.resolve(name).await)
        });
        join_all(futures).await
    }

    #[async_recursion]
    async fn resolve_at(&self, name: &str, depth: usize) -> Result<TimeSeries> {
        let spec = self
            .registry
            .get(name)
            .ok_or_else(|| Error::UnknownIndicator(name.to_string()))?;

        match &spec.source {
            IndicatorSource::Fetched(query) => Ok(self.fetcher.fetch(query).await),
            IndicatorSource::Derived(derivation) => {
                if depth >= self.max_depth {
                    return Err(Error::DerivationTooDeep {
                        name: name.to_string(),
                        depth: self.max_depth,
                    });
                }

                let required = derivation.required_inputs();
                debug!(transform = %derivation.kind(), "Resolving inputs for {}: {:?}", name, required);

                let mut inputs = Vec::with_capacity(required.len());
                for input in required {
                    let series = self.resolve_at(input, depth + 1).await?;
                    if series.is_empty() {
                        info!("{}: input '{}' has no data, skipping calculation", name, input);
                        return Ok(TimeSeries::new());
                    }
                    inputs.push(series);
                }

                Ok(derivation.calculate(&inputs))
            }
        }
    }

    /// Config problems are logged once per indicator; repeats go to debug.
    fn report(&self, name: &str, error: &Error) {
        let first = self
            .reported
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.to_string());

        if first {
            warn!(indicator = name, kind = %error.kind(), "{}", error);
        } else {
            debug!(indicator = name, "{}", error);
        }
    }
}
