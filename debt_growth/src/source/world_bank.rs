//! World Bank indicators API (v2) client
//!
//! Responses are a two-element JSON array: paging metadata followed by the
//! observations. Errors come back as a one-element array carrying a
//! `message` list, often with a 200 status.

use crate::config::SourceConfig;
use crate::error::{AnalysisError, Result};
use crate::panel::parse_year;
use crate::source::{IndicatorQuery, IndicatorSource, Observation};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct IndicatorRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Record {
    indicator: IndicatorRef,
    countryiso3code: String,
    date: String,
    value: Option<f64>,
}

/// One decoded response page
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub page: u64,
    pub pages: u64,
    pub observations: Vec<Observation>,
}

/// Read a paging field that the API emits either as a number or a string
fn meta_number(meta: &Value, field: &str) -> Option<u64> {
    match meta.get(field)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Decode one response body
pub fn parse_page(body: &str) -> Result<Page> {
    let value: Value = serde_json::from_str(body)?;
    let parts = value
        .as_array()
        .ok_or_else(|| AnalysisError::DataError("Expected a JSON array response".to_string()))?;

    let meta = parts
        .first()
        .ok_or_else(|| AnalysisError::DataError("Empty response".to_string()))?;

    if let Some(messages) = meta.get("message") {
        let text = messages
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|m| {
                        let key = m.get("key").and_then(Value::as_str).unwrap_or("error");
                        let detail = m.get("value").and_then(Value::as_str)?;
                        Some(format!("{}: {}", key, detail))
                    })
                    .collect::<Vec<_>>()
                    .join("; ")
            })
            .unwrap_or_else(|| messages.to_string());
        return Err(AnalysisError::DataError(format!(
            "Indicator source rejected the request ({})",
            text
        )));
    }

    let page = meta_number(meta, "page").unwrap_or(1);
    let pages = meta_number(meta, "pages").unwrap_or(1);

    let records: Vec<Record> = match parts.get(1) {
        Some(Value::Null) | None => Vec::new(),
        Some(records) => serde_json::from_value(records.clone())?,
    };

    let observations = records
        .into_iter()
        .map(|r| {
            Ok(Observation {
                indicator: r.indicator.id,
                economy: r.countryiso3code,
                year: parse_year(&r.date)?,
                value: r.value,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Page {
        page,
        pages,
        observations,
    })
}

/// Blocking client for the World Bank indicators API
#[derive(Debug, Clone)]
pub struct WorldBankClient {
    client: Client,
    config: SourceConfig,
}

impl WorldBankClient {
    /// Create a client with the configured timeout
    pub fn new(config: SourceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, config })
    }

    /// URL of one indicator across all queried economies
    pub fn indicator_url(&self, indicator: &str, economies: &[String]) -> String {
        format!(
            "{}/country/{}/indicator/{}",
            self.config.base_url.trim_end_matches('/'),
            economies.join(";"),
            indicator
        )
    }

    fn fetch_indicator(&self, indicator: &str, query: &IndicatorQuery) -> Result<Vec<Observation>> {
        let url = self.indicator_url(indicator, &query.economies);
        let date = format!("{}:{}", query.years.start, query.years.end);
        let per_page = self.config.per_page.to_string();

        let mut observations = Vec::new();
        let mut page = 1u64;
        loop {
            debug!(%url, page, "requesting indicator page");
            let body = self
                .client
                .get(&url)
                .query(&[
                    ("date", date.as_str()),
                    ("format", "json"),
                    ("per_page", per_page.as_str()),
                    ("page", page.to_string().as_str()),
                ])
                .send()?
                .error_for_status()?
                .text()?;

            let decoded = parse_page(&body)?;
            observations.extend(decoded.observations);

            if decoded.page >= decoded.pages {
                break;
            }
            page += 1;
        }

        Ok(observations)
    }
}

impl IndicatorSource for WorldBankClient {
    fn fetch(&self, query: &IndicatorQuery) -> Result<Vec<Observation>> {
        let mut observations = Vec::new();
        for indicator in &query.indicators {
            let fetched = self.fetch_indicator(indicator, query)?;
            info!(indicator = %indicator, rows = fetched.len(), "fetched indicator");
            observations.extend(fetched.into_iter().filter(|o| query.matches(o)));
        }

        Ok(observations)
    }

    fn name(&self) -> &str {
        "world-bank"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"[
        {"page": 1, "pages": 2, "per_page": "2", "total": 3, "sourceid": "2"},
        [
            {"indicator": {"id": "NY.GDP.MKTP.KD.ZG", "value": "GDP growth (annual %)"},
             "country": {"id": "KZ", "value": "Kazakhstan"},
             "countryiso3code": "KAZ", "date": "2021", "value": 4.3,
             "unit": "", "obs_status": "", "decimal": 1},
            {"indicator": {"id": "NY.GDP.MKTP.KD.ZG", "value": "GDP growth (annual %)"},
             "country": {"id": "KZ", "value": "Kazakhstan"},
             "countryiso3code": "KAZ", "date": "YR2020", "value": null,
             "unit": "", "obs_status": "", "decimal": 1}
        ]
    ]"#;

    #[test]
    fn test_parse_page() {
        let page = parse_page(BODY).unwrap();

        assert_eq!(page.page, 1);
        assert_eq!(page.pages, 2);
        assert_eq!(
            page.observations,
            vec![
                Observation::new("NY.GDP.MKTP.KD.ZG", "KAZ", 2021, Some(4.3)),
                Observation::new("NY.GDP.MKTP.KD.ZG", "KAZ", 2020, None),
            ]
        );
    }

    #[test]
    fn test_parse_error_payload() {
        let body = r#"[{"message": [{"id": "120", "key": "Invalid value",
            "value": "The provided parameter value is not valid"}]}]"#;

        let err = parse_page(body).unwrap_err();
        assert!(matches!(err, AnalysisError::DataError(_)));
        assert!(err.to_string().contains("Invalid value"));
    }

    #[test]
    fn test_parse_empty_page() {
        let body = r#"[{"page": 0, "pages": 0, "per_page": 50, "total": 0}, null]"#;
        let page = parse_page(body).unwrap();
        assert!(page.observations.is_empty());
    }

    #[test]
    fn test_indicator_url() {
        let client = WorldBankClient::new(SourceConfig {
            base_url: "https://example.org/v2/".to_string(),
            ..SourceConfig::default()
        })
        .unwrap();

        let url = client.indicator_url("FP.CPI.TOTL.ZG", &["KAZ".to_string(), "BLR".to_string()]);
        assert_eq!(url, "https://example.org/v2/country/KAZ;BLR/indicator/FP.CPI.TOTL.ZG");
    }
}
