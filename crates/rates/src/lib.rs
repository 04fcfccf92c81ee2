use std::{collections::HashMap, sync::Arc};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use shared::{domain::normalize_currency_code, error::PipelineError, protocol::LatestRatesResponse};
use tracing::{debug, info, warn};
use url::Url;

pub const DEFAULT_RATES_ENDPOINT: &str = "https://open.er-api.com/v6/latest/USD";
/// Placeholder an endpoint may carry to request a table for a specific base.
pub const BASE_PLACEHOLDER: &str = "{base}";

/// Exchange rates relative to a single base currency.
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    base: String,
    rates: HashMap<String, f64>,
}

impl RateTable {
    pub fn new(base: &str, rates: impl IntoIterator<Item = (String, f64)>) -> Self {
        Self {
            base: normalize_currency_code(base),
            rates: rates
                .into_iter()
                .map(|(code, rate)| (normalize_currency_code(&code), rate))
                .collect(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Rate for `code`; zero, negative and non-finite rates count as absent.
    pub fn rate(&self, code: &str) -> Option<f64> {
        self.rates
            .get(&normalize_currency_code(code))
            .copied()
            .filter(|rate| rate.is_finite() && *rate > 0.0)
    }

    /// Currency codes in the table, sorted.
    pub fn codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.rates.keys().cloned().collect();
        codes.sort();
        codes
    }

    /// `amount / rate[from] * rate[to]`, rounded to cents.
    pub fn convert(&self, amount: f64, from: &str, to: &str) -> Result<f64, PipelineError> {
        let from_rate = self.rate(from).ok_or_else(|| PipelineError::MissingRate {
            currency: normalize_currency_code(from),
        })?;
        let to_rate = self.rate(to).ok_or_else(|| PipelineError::MissingRate {
            currency: normalize_currency_code(to),
        })?;
        Ok(round_to_cents(amount / from_rate * to_rate))
    }
}

pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch_rates(&self, key: &str) -> Result<RateTable>;
}

/// Fetches rate tables with a single GET per request.
#[derive(Debug, Clone)]
pub struct HttpRateSource {
    http: Client,
    endpoint: String,
}

impl HttpRateSource {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let endpoint = endpoint.into();
        Url::parse(&endpoint.replace(BASE_PLACEHOLDER, "USD"))
            .with_context(|| format!("invalid rates endpoint '{endpoint}'"))?;
        Ok(Self {
            http: Client::new(),
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_url(&self, key: &str) -> String {
        self.endpoint
            .replace(BASE_PLACEHOLDER, &normalize_currency_code(key))
    }
}

#[async_trait]
impl RateSource for HttpRateSource {
    async fn fetch_rates(&self, key: &str) -> Result<RateTable> {
        let url = self.request_url(key);
        debug!(key, url = %url, "rates: fetching");
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?
            .error_for_status()?;
        let body: LatestRatesResponse = response
            .json()
            .await
            .context("rates response is not valid JSON")?;

        if body.is_error() {
            return Err(anyhow!(
                "rates endpoint reported an error: {}",
                body.error_type.as_deref().unwrap_or("unknown")
            ));
        }
        if body.rates.is_empty() {
            return Err(anyhow!("rates response carried no rates"));
        }

        let base = body.base_code.unwrap_or_else(|| key.to_string());
        Ok(RateTable::new(&base, body.rates))
    }
}

/// Serves a fixed table. Used offline and in tests.
#[derive(Debug, Clone)]
pub struct StaticRateSource {
    table: RateTable,
}

impl StaticRateSource {
    pub fn new(table: RateTable) -> Self {
        Self { table }
    }
}

#[async_trait]
impl RateSource for StaticRateSource {
    async fn fetch_rates(&self, _key: &str) -> Result<RateTable> {
        Ok(self.table.clone())
    }
}

/// Session-lifetime cache of fetched rate tables, one fetch per distinct key.
///
/// `current` is the table conversions read. A failed refresh leaves it as is.
pub struct RateCache {
    source: Arc<dyn RateSource>,
    tables: HashMap<String, RateTable>,
    current: Option<RateTable>,
}

impl RateCache {
    pub fn new(source: Arc<dyn RateSource>) -> Self {
        Self {
            source,
            tables: HashMap::new(),
            current: None,
        }
    }

    pub fn current(&self) -> Option<&RateTable> {
        self.current.as_ref()
    }

    pub fn is_cached(&self, key: &str) -> bool {
        self.tables.contains_key(&normalize_currency_code(key))
    }

    pub async fn refresh_lookup(&mut self, key: &str) -> Result<(), PipelineError> {
        let key = normalize_currency_code(key);
        if let Some(table) = self.tables.get(&key) {
            self.current = Some(table.clone());
            return Ok(());
        }

        match self.source.fetch_rates(&key).await {
            Ok(table) => {
                info!(key = %key, rates = table.len(), "rates: table cached");
                self.tables.insert(key, table.clone());
                self.current = Some(table);
                Ok(())
            }
            Err(err) => {
                warn!(
                    key = %key,
                    has_stale = self.current.is_some(),
                    "rates: lookup failed, keeping cached table: {err:#}"
                );
                Err(PipelineError::LookupUnavailable {
                    key,
                    reason: format!("{err:#}"),
                })
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
