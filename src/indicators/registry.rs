use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::transforms::Derivation;
use super::CalculatedIndicator;
use crate::error::{Error, Result};
use crate::fetcher::SourceQuery;

// ============================================================================
// ENUMS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SourceKind {
    Oecd,
    Destatis,
    Eurostat,
    Ecb,
    Bundesbank,
    Derived,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SourceKind::Oecd => "OECD",
            SourceKind::Destatis => "DESTATIS",
            SourceKind::Eurostat => "EUROSTAT",
            SourceKind::Ecb => "ECB",
            SourceKind::Bundesbank => "BUNDESBANK",
            SourceKind::Derived => "DERIVED",
        };
        f.write_str(s)
    }
}

/// Display hint only; values are never rescaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitType {
    /// Index level (e.g. 2020=100)
    Index,
    /// Percent or percentage points
    Percent,
    /// Dimensionless ratio
    Ratio,
    /// Exchange rate, quote currency per unit
    Rate,
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnitType::Index => "index",
            UnitType::Percent => "%",
            UnitType::Ratio => "ratio",
            UnitType::Rate => "rate",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorSource {
    Fetched(SourceQuery),
    Derived(Derivation),
}

/// Upstream query or derivation formula, as shown by `list`.
impl fmt::Display for IndicatorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorSource::Fetched(query) => write!(f, "{}", query),
            IndicatorSource::Derived(derivation) => write!(f, "{}", derivation),
        }
    }
}

// ============================================================================
// SPEC STRUCT
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSpec {
    pub name: String,
    pub title: String,
    pub description: Option<String>,
    pub unit: UnitType,
    pub source: IndicatorSource,
}

impl IndicatorSpec {
    pub fn source_kind(&self) -> SourceKind {
        match &self.source {
            IndicatorSource::Fetched(query) => query.kind(),
            IndicatorSource::Derived(_) => SourceKind::Derived,
        }
    }
}

macro_rules! ind {
    ($name:expr, $title:expr, $unit:expr, $desc:expr, $source:expr) => {
        IndicatorSpec {
            name: $name.to_string(),
            title: $title.to_string(),
            description: Some($desc.to_string()),
            unit: $unit,
            source: $source,
        }
    };
}

fn oecd_kei(indicator: &str) -> IndicatorSource {
    IndicatorSource::Fetched(SourceQuery::Oecd {
        dataset: "KEI".to_string(),
        indicator: indicator.to_string(),
        country: "DEU".to_string(),
        frequency: "M".to_string(),
    })
}

fn destatis(code: &str) -> IndicatorSource {
    IndicatorSource::Fetched(SourceQuery::Destatis { code: code.to_string() })
}

fn eurostat(dataset: &str, filter: &str) -> IndicatorSource {
    IndicatorSource::Fetched(SourceQuery::Eurostat {
        dataset: dataset.to_string(),
        filter: filter.to_string(),
    })
}

fn ecb(flow: &str, key: &str) -> IndicatorSource {
    IndicatorSource::Fetched(SourceQuery::Ecb { flow: flow.to_string(), key: key.to_string() })
}

fn bundesbank(flow: &str, key: &str) -> IndicatorSource {
    IndicatorSource::Fetched(SourceQuery::Bundesbank { flow: flow.to_string(), key: key.to_string() })
}

fn derived(derivation: Derivation) -> IndicatorSource {
    IndicatorSource::Derived(derivation)
}

// ============================================================================
// BUILTIN TABLE
// ============================================================================

static BUILTIN: Lazy<Vec<IndicatorSpec>> = Lazy::new(|| {
    vec![
        // =====================================================================
        // OECD - Key Economic Indicators, Germany, monthly
        // =====================================================================
        ind!("gdp_growth_yoy", "BIP Jahreswachstumsrate (y/y)", UnitType::Percent,
             "Real GDP growth over the same period of the previous year", oecd_kei("GDP")),
        ind!("labour_cost_index", "Arbeitskostenindex (LCI)", UnitType::Index,
             "Hourly labour cost index", oecd_kei("LCI")),
        ind!("business_confidence", "Business Confidence Index", UnitType::Index,
             "OECD business confidence, amplitude adjusted (long-term average = 100)", oecd_kei("BCI_CLI")),
        ind!("composite_leading", "Composite Leading Indicator", UnitType::Index,
             "OECD CLI; turning points lead the business cycle by 6-9 months", oecd_kei("CLI")),
        ind!("construction_confidence", "Bau-PMI", UnitType::Index,
             "Construction sector confidence", oecd_kei("BCI_CONS")),

        // =====================================================================
        // DESTATIS - GENESIS
        // =====================================================================
        ind!("cpi", "Verbraucherpreisindex (2020=100)", UnitType::Index,
             "Consumer price index, Germany", destatis("61111-0002")),

        // =====================================================================
        // EUROSTAT
        // =====================================================================
        ind!("hicp_index", "HVPI (2015=100)", UnitType::Index,
             "Harmonised index of consumer prices, all items",
             eurostat("prc_hicp_midx", "geo=DE&unit=I15&coicop=CP00&freq=M")),
        ind!("unemployment_rate", "Arbeitslosenquote", UnitType::Percent,
             "Unemployment rate, seasonally adjusted, share of active population",
             eurostat("une_rt_m", "geo=DE&s_adj=SA&age=TOTAL&sex=T&unit=PC_ACT&freq=M")),

        // =====================================================================
        // ECB
        // =====================================================================
        ind!("ecb_main_refi_rate", "EZB Hauptrefinanzierungssatz", UnitType::Percent,
             "Main refinancing operations fixed rate", ecb("FM", "B.U2.EUR.4F.KR.MRR_FR.LEV")),
        ind!("eur_usd", "EUR/USD", UnitType::Rate,
             "Monthly average reference rate, USD per EUR", ecb("EXR", "M.USD.EUR.SP00.A")),

        // =====================================================================
        // BUNDESBANK
        // =====================================================================
        ind!("bund_10y_yield", "Rendite 10J Bundesanleihen", UnitType::Percent,
             "Yield on listed federal securities, residual maturity 10 years, monthly average",
             bundesbank("BBSIS", "M.I.ZST.ZI.EUR.S1311.B.A604.R10XX.R.A.A._Z._Z.A")),

        // =====================================================================
        // DERIVED
        // =====================================================================
        ind!("cpi_inflation_yoy", "Inflationsrate VPI (y/y)", UnitType::Percent,
             "CPI change over 12 months", derived(Derivation::PctChangeY { base: "cpi".into() })),
        ind!("cpi_inflation_mom", "Inflationsrate VPI (m/m)", UnitType::Percent,
             "CPI change over the previous month", derived(Derivation::PctChangeM { base: "cpi".into() })),
        ind!("hicp_inflation_yoy", "Inflationsrate HVPI (y/y)", UnitType::Percent,
             "HICP change over 12 months", derived(Derivation::PctChangeY { base: "hicp_index".into() })),
        ind!("composite_leading_change", "CLI Veränderung", UnitType::Index,
             "Month-on-month change of the composite leading indicator",
             derived(Derivation::Diff { base: "composite_leading".into() })),
        ind!("unemployment_change", "Arbeitslosenquote Veränderung", UnitType::Percent,
             "Change in the unemployment rate, percentage points",
             derived(Derivation::Diff { base: "unemployment_rate".into() })),
        ind!("hicp_cpi_ratio", "HVPI / VPI", UnitType::Ratio,
             "Ratio of the harmonised to the national price index",
             derived(Derivation::Ratio { numerator: "hicp_index".into(), denominator: "cpi".into() })),
    ]
});

// ============================================================================
// REGISTRY
// ============================================================================

/// Read-only name -> spec table, built once at startup.
#[derive(Debug, Clone)]
pub struct Registry {
    specs: Vec<IndicatorSpec>,
    index: HashMap<String, usize>,
}

impl Registry {
    /// Rejects duplicate names. References between specs are checked by `validate`.
    pub fn new(specs: Vec<IndicatorSpec>) -> Result<Self> {
        let mut index = HashMap::with_capacity(specs.len());
        for (idx, spec) in specs.iter().enumerate() {
            if index.insert(spec.name.clone(), idx).is_some() {
                return Err(Error::DuplicateIndicator(spec.name.clone()));
            }
        }
        Ok(Self { specs, index })
    }

    /// The Germany indicator set shipped with the crate.
    pub fn builtin() -> Self {
        let specs = BUILTIN.clone();
        let index = specs
            .iter()
            .enumerate()
            .map(|(idx, spec)| (spec.name.clone(), idx))
            .collect();
        Self { specs, index }
    }

    pub fn get(&self, name: &str) -> Option<&IndicatorSpec> {
        self.index.get(name).and_then(|&idx| self.specs.get(idx))
    }

    /// All names in declaration order (the selection list).
    pub fn names(&self) -> Vec<&str> {
        self.specs.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn all(&self) -> &[IndicatorSpec] {
        &self.specs
    }

    pub fn by_source(&self, kind: SourceKind) -> Vec<&IndicatorSpec> {
        self.specs.iter().filter(|s| s.source_kind() == kind).collect()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Every derived spec whose chain references an unknown name, loops,
    /// or nests deeper than `max_depth` derivations.
    pub fn validate(&self, max_depth: usize) -> Vec<Error> {
        self.specs
            .iter()
            .filter(|s| matches!(s.source, IndicatorSource::Derived(_)))
            .filter_map(|s| self.derivation_levels(&s.name, &s.name, 0, max_depth).err())
            .collect()
    }

    fn derivation_levels(&self, root: &str, name: &str, depth: usize, max_depth: usize) -> Result<usize> {
        let spec = self
            .get(name)
            .ok_or_else(|| Error::UnknownIndicator(name.to_string()))?;

        let IndicatorSource::Derived(derivation) = &spec.source else {
            return Ok(0);
        };

        if depth >= max_depth {
            return Err(Error::DerivationTooDeep { name: root.to_string(), depth: max_depth });
        }

        let mut deepest = 0;
        for input in derivation.required_inputs() {
            deepest = deepest.max(self.derivation_levels(root, input, depth + 1, max_depth)?);
        }
        Ok(deepest + 1)
    }

    pub fn stats(&self) -> RegistryStats {
        let by_source = |k: SourceKind| self.specs.iter().filter(|s| s.source_kind() == k).count();

        RegistryStats {
            total: self.specs.len(),
            oecd: by_source(SourceKind::Oecd),
            destatis: by_source(SourceKind::Destatis),
            eurostat: by_source(SourceKind::Eurostat),
            ecb: by_source(SourceKind::Ecb),
            bundesbank: by_source(SourceKind::Bundesbank),
            derived: by_source(SourceKind::Derived),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegistryStats {
    pub total: usize,
    pub oecd: usize,
    pub destatis: usize,
    pub eurostat: usize,
    pub ecb: usize,
    pub bundesbank: usize,
    pub derived: usize,
}
