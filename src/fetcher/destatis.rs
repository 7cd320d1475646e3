use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde_json::Value;
use tracing::{debug, info};

use super::{send_checked, unsupported, DataSource, SourceQuery};
use crate::config::DestatisCredentials;
use crate::error::{Error, Result};
use crate::indicators::registry::SourceKind;
use crate::models::TimeSeries;

/// Turns a GENESIS response body into a series.
pub type PayloadParser = fn(&str) -> Result<TimeSeries>;

/// GENESIS-Online web service (Statistisches Bundesamt).
pub struct DestatisFetcher {
    client: Client,
    base_url: String,
    credentials: Option<DestatisCredentials>,
    parser: PayloadParser,
}

impl DestatisFetcher {
    pub fn new(client: Client, base_url: &str, credentials: Option<DestatisCredentials>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            parser: parse_flat_file,
        }
    }

    /// Swap in a parser for a different table layout.
    pub fn with_parser(mut self, parser: PayloadParser) -> Self {
        self.parser = parser;
        self
    }
}

#[async_trait]
impl DataSource for DestatisFetcher {
    fn name(&self) -> &str {
        "destatis"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Destatis
    }

    async fn fetch_data(&self, query: &SourceQuery) -> Result<TimeSeries> {
        let SourceQuery::Destatis { code } = query else {
            return Err(unsupported(self, query));
        };

        let creds = self
            .credentials
            .as_ref()
            .ok_or(Error::MissingCredentials("Destatis"))?;

        let url = format!("{}/data/tablefile", self.base_url);
        info!("Fetching Destatis table {} as {}", code, creds.username);

        let request = self
            .client
            .get(&url)
            .basic_auth(&creds.username, Some(creds.password.expose_secret()))
            .query(&[
                ("name", code.as_str()),
                ("area", "all"),
                ("format", "ffcsv"),
                ("compress", "false"),
                ("language", "de"),
            ]);

        let body = send_checked(request, &url).await?.text().await?;
        (self.parser)(unwrap_envelope(&body)?.as_str())
    }
}

/// GENESIS answers some requests with a JSON envelope (`Object.Content`) and
/// reports failures as HTTP 200 with a `Status` block.
fn unwrap_envelope(body: &str) -> Result<String> {
    let trimmed = body.trim_start();
    if !trimmed.starts_with('{') {
        return Ok(body.to_string());
    }

    let json: Value = serde_json::from_str(trimmed)?;
    if let Some(content) = json["Object"]["Content"].as_str() {
        return Ok(content.to_string());
    }

    let status = json["Status"]["Content"]
        .as_str()
        .or_else(|| json["Content"].as_str())
        .unwrap_or("no content");
    Err(Error::parse(format!("Destatis returned no table: {}", status)))
}

/// Default parser for the GENESIS flat-file CSV ("ffcsv") layout.
///
/// Needs a `time` column (year) and a `value` column; the month or quarter
/// comes from whichever `*_variable_attribute_code` cell holds `MONATnn` or
/// `QUARTn`. Values use a decimal comma; `...`, `-`, `.`, `x` and `/` are
/// missing. A table with several value rows per period keeps the first one.
pub fn parse_flat_file(body: &str) -> Result<TimeSeries> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let header: Vec<String> = reader.headers()?.iter().map(str::to_lowercase).collect();
    if header.iter().all(|h| h.is_empty()) {
        return Err(Error::parse("Destatis table is empty"));
    }

    let time_col = header
        .iter()
        .position(|h| h == "time" || h == "zeit")
        .ok_or_else(|| Error::parse("Destatis table has no time column"))?;
    let value_col = header
        .iter()
        .position(|h| h == "value" || h == "wert")
        .ok_or_else(|| Error::parse("Destatis table has no value column"))?;
    let attribute_cols: Vec<usize> = header
        .iter()
        .enumerate()
        .filter(|(_, h)| h.ends_with("_variable_attribute_code"))
        .map(|(i, _)| i)
        .collect();

    let mut series = TimeSeries::new();
    let mut skipped = 0usize;
    let mut duplicates = 0usize;

    for record in reader.records() {
        let record = record?;
        let Some(year) = record.get(time_col).and_then(|t| t.parse::<i32>().ok()) else {
            skipped += 1;
            continue;
        };

        let month = attribute_cols
            .iter()
            .filter_map(|&i| record.get(i))
            .find_map(sub_year_month)
            .unwrap_or(1);

        let Some(date) = NaiveDate::from_ymd_opt(year, month, 1) else {
            skipped += 1;
            continue;
        };
        if series.contains(&date) {
            duplicates += 1;
            continue;
        }
        series.insert(date, record.get(value_col).and_then(german_number));
    }

    if skipped > 0 {
        debug!(skipped, "Destatis rows without a usable period");
    }
    if duplicates > 0 {
        debug!(duplicates, "Destatis rows for an already filled period ignored");
    }

    Ok(series)
}

/// `MONAT03` -> 3, `QUART2` -> 4.
fn sub_year_month(code: &str) -> Option<u32> {
    if let Some(m) = code.strip_prefix("MONAT") {
        return m.parse().ok().filter(|m| (1..=12).contains(m));
    }
    if let Some(q) = code.strip_prefix("QUART") {
        return q
            .parse::<u32>()
            .ok()
            .filter(|q| (1..=4).contains(q))
            .map(|q| (q - 1) * 3 + 1);
    }
    None
}

fn german_number(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if matches!(raw, "" | "..." | "-" | "." | "x" | "/") {
        return None;
    }
    // `.` only ever groups thousands in German formatting
    raw.replace('.', "")
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::build_client;
    use mockito::{Matcher, Server};
    use std::time::Duration;

    const TABLE: &str = "statistics_code;time_code;time;2_variable_code;2_variable_attribute_code;value;value_unit\n\
        61111;JAHR;2024;MONAT;MONAT01;117,6;2020=100\n\
        61111;JAHR;2024;MONAT;MONAT02;118,1;2020=100\n\
        61111;JAHR;2024;MONAT;MONAT03;...;2020=100\n";

    fn d(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    fn cpi_query() -> SourceQuery {
        SourceQuery::Destatis { code: "61111-0002".into() }
    }

    #[test]
    fn test_parse_monthly_flat_file() {
        let series = parse_flat_file(TABLE).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.get(&d(2024, 1)), Some(117.6));
        assert_eq!(series.get(&d(2024, 2)), Some(118.1));
        assert!(series.contains(&d(2024, 3)));
        assert_eq!(series.get(&d(2024, 3)), None);
    }

    #[test]
    fn test_parse_quarterly_and_thousands() {
        let body = "time;1_variable_attribute_code;value\n2023;QUART3;1.234,5\n2023;QUART4;-\n";
        let series = parse_flat_file(body).unwrap();
        assert_eq!(series.get(&d(2023, 7)), Some(1234.5));
        assert_eq!(series.get(&d(2023, 10)), None);
    }

    #[test]
    fn test_quoted_label_with_delimiter() {
        let body = "time;2_variable_attribute_code;label;value\n\
            2024;MONAT01;\"Verbraucherpreisindex; Deutschland\";117,6\n\
            2024;MONAT02;\"Verbraucherpreisindex; Deutschland\";118,1\n";
        let series = parse_flat_file(body).unwrap();
        assert_eq!(series.defined_len(), 2);
        assert_eq!(series.get(&d(2024, 1)), Some(117.6));
        assert_eq!(series.get(&d(2024, 2)), Some(118.1));
    }

    #[test]
    fn test_first_row_per_period_wins() {
        let body = "time;2_variable_attribute_code;value_variable_code;value\n\
            2024;MONAT01;PREIS1;117,6\n\
            2024;MONAT01;PREIS2;3,1\n\
            2024;MONAT02;PREIS1;118,1\n";
        let series = parse_flat_file(body).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.get(&d(2024, 1)), Some(117.6));
    }

    #[test]
    fn test_german_number_grouping() {
        assert_eq!(german_number("1.234"), Some(1234.0));
        assert_eq!(german_number("1.234.567"), Some(1234567.0));
        assert_eq!(german_number("1.234,5"), Some(1234.5));
        assert_eq!(german_number("117,6"), Some(117.6));
        assert_eq!(german_number("42"), Some(42.0));
        assert_eq!(german_number("..."), None);
    }

    #[test]
    fn test_missing_columns_is_error() {
        assert!(parse_flat_file("a;b\n1;2\n").is_err());
        assert!(parse_flat_file("").is_err());
    }

    #[test]
    fn test_envelope_status_is_error() {
        let body = r#"{"Status": {"Code": 104, "Content": "Es gibt keine Objekte zum angegebenen Selektionskriterium"}}"#;
        assert!(unwrap_envelope(body).is_err());

        let wrapped = serde_json::json!({ "Object": { "Content": TABLE } }).to_string();
        assert_eq!(unwrap_envelope(&wrapped).unwrap(), TABLE);
    }

    #[tokio::test]
    async fn test_fetch_uses_basic_auth() {
        let mut server = Server::new_async().await;
        // base64("user:secret")
        let mock = server
            .mock("GET", "/data/tablefile")
            .match_header("authorization", "Basic dXNlcjpzZWNyZXQ=")
            .match_query(Matcher::UrlEncoded("name".into(), "61111-0002".into()))
            .with_status(200)
            .with_body(TABLE)
            .expect(1)
            .create_async()
            .await;

        let fetcher = DestatisFetcher::new(
            build_client(Duration::from_secs(5)),
            &server.url(),
            Some(DestatisCredentials::new("user", "secret")),
        );
        let series = fetcher.fetch_data(&cpi_query()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(series.defined_len(), 2);
    }

    #[tokio::test]
    async fn test_missing_credentials_is_config_error() {
        let fetcher = DestatisFetcher::new(Client::new(), "http://localhost", None);
        let err = fetcher.fetch_data(&cpi_query()).await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
    }

    #[tokio::test]
    async fn test_custom_parser() {
        fn constant(_: &str) -> Result<TimeSeries> {
            Ok(vec![(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(), 1.0)].into_iter().collect())
        }

        let mut server = Server::new_async().await;
        server
            .mock("GET", "/data/tablefile")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("anything")
            .create_async()
            .await;

        let fetcher = DestatisFetcher::new(
            build_client(Duration::from_secs(5)),
            &server.url(),
            Some(DestatisCredentials::new("user", "secret")),
        )
        .with_parser(constant);
        let series = fetcher.fetch_data(&cpi_query()).await.unwrap();
        assert_eq!(series.len(), 1);
    }
}
