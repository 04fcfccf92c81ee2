use std::sync::Arc;

use rates::{RateCache, RateSource, RateTable};
use shared::{domain::normalize_currency_code, error::PipelineError};
use tracing::debug;

use crate::{
    input::InputSet,
    reactive::{Derivation, ReactivePipeline},
};

pub const AMOUNT: &str = "amount";
pub const FROM: &str = "from";
pub const TO: &str = "to";
pub const DEFAULT_FROM: &str = "USD";
pub const DEFAULT_TO: &str = "INR";

/// Converts `amount` between currencies using the installed rate table.
#[derive(Debug, Default)]
pub struct ConversionDerivation {
    rates: Option<RateTable>,
}

impl ConversionDerivation {
    pub fn install(&mut self, rates: RateTable) {
        self.rates = Some(rates);
    }

    pub fn rates(&self) -> Option<&RateTable> {
        self.rates.as_ref()
    }
}

impl Derivation for ConversionDerivation {
    type Output = f64;

    fn derive(&mut self, inputs: &InputSet) -> Result<f64, PipelineError> {
        let amount = inputs.number(AMOUNT)?;
        let from = inputs.text(FROM)?;
        let to = inputs.text(TO)?;
        let Some(rates) = &self.rates else {
            return Err(PipelineError::MissingRate {
                currency: normalize_currency_code(from),
            });
        };
        rates.convert(amount, from, to)
    }
}

/// Amount and currency pair kept converted against a cached rate table.
///
/// The converted amount starts at zero. A missing rate leaves the previous
/// conversion showing.
pub struct CurrencyConverter {
    pipeline: ReactivePipeline<ConversionDerivation>,
    cache: RateCache,
}

impl CurrencyConverter {
    pub fn new(source: Arc<dyn RateSource>) -> Self {
        let inputs = InputSet::new()
            .with(AMOUNT, 0.0)
            .with(FROM, DEFAULT_FROM)
            .with(TO, DEFAULT_TO);
        Self {
            pipeline: ReactivePipeline::new("converter", ConversionDerivation::default(), inputs)
                .with_initial_output(0.0),
            cache: RateCache::new(source),
        }
    }

    pub fn amount(&self) -> f64 {
        self.pipeline.inputs().number(AMOUNT).unwrap_or(0.0)
    }

    pub fn from_currency(&self) -> &str {
        self.pipeline.inputs().text(FROM).unwrap_or(DEFAULT_FROM)
    }

    pub fn to_currency(&self) -> &str {
        self.pipeline.inputs().text(TO).unwrap_or(DEFAULT_TO)
    }

    pub fn converted_amount(&self) -> f64 {
        self.pipeline.output().copied().unwrap_or(0.0)
    }

    /// Converted amount with two decimals, e.g. `10.00`.
    pub fn formatted(&self) -> String {
        format!("{:.2}", self.converted_amount())
    }

    /// Codes offered for selection, from the table in use.
    pub fn currency_options(&self) -> Vec<String> {
        self.cache.current().map(RateTable::codes).unwrap_or_default()
    }

    pub fn rates(&self) -> Option<&RateTable> {
        self.pipeline.derivation().rates()
    }

    /// Fetches the table for the current source currency, if not cached yet,
    /// and reconverts. A failed lookup is logged by the cache and returned;
    /// the previous table stays installed.
    pub async fn load_rates(&mut self) -> Result<f64, PipelineError> {
        let from = self.from_currency().to_string();
        self.refresh_lookup(&from).await?;
        self.pipeline.recompute()
    }

    pub async fn set_from(&mut self, code: &str) -> Result<f64, PipelineError> {
        let code = normalize_currency_code(code);
        let _ = self.refresh_lookup(&code).await;
        self.pipeline.set_input(FROM, code)
    }

    pub fn set_to(&mut self, code: &str) -> Result<f64, PipelineError> {
        self.pipeline.set_input(TO, normalize_currency_code(code))
    }

    pub fn set_amount(&mut self, amount: f64) -> Result<f64, PipelineError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(PipelineError::invalid_input(
                AMOUNT,
                "must be a finite, non-negative number",
            ));
        }
        self.pipeline.set_input(AMOUNT, amount)
    }

    /// Exchanges source and target currencies along with the amount and the
    /// converted amount. No recompute happens, so swapping twice restores the
    /// exact previous state.
    pub fn swap(&mut self) {
        self.pipeline.restate(|inputs, output| {
            let amount = inputs.number(AMOUNT).unwrap_or(0.0);
            let converted = output.unwrap_or(0.0);
            inputs.swap(FROM, TO);
            inputs.set(AMOUNT, converted);
            *output = Some(amount);
        });
    }

    pub fn pipeline(&self) -> &ReactivePipeline<ConversionDerivation> {
        &self.pipeline
    }

    async fn refresh_lookup(&mut self, key: &str) -> Result<(), PipelineError> {
        self.cache.refresh_lookup(key).await?;
        if let Some(table) = self.cache.current() {
            debug!(key, base = table.base(), "converter: rate table installed");
            self.pipeline.derivation_mut().install(table.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/converter_tests.rs"]
mod tests;
