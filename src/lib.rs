//! Fetches German macroeconomic series from OECD, Destatis, Eurostat, the ECB
//! and the Bundesbank, derives calculated series, and prepares chart and
//! table output.

pub mod config;
pub mod core;
pub mod error;
pub mod fetcher;
pub mod indicators;
pub mod models;
pub mod report;

pub use crate::config::AppConfig;
pub use crate::core::orchestrator::Resolver;
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::fetcher::{DataSource, SeriesFetcher, SourceQuery};
pub use crate::indicators::registry::{IndicatorSource, IndicatorSpec, Registry, SourceKind};
pub use crate::indicators::transforms::Derivation;
pub use crate::models::{DataPoint, TimeSeries};
