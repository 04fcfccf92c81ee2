use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Body of the latest-rates endpoint. Only `rates` is required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatestRatesResponse {
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub base_code: Option<String>,
    #[serde(default, rename = "error-type")]
    pub error_type: Option<String>,
    #[serde(default)]
    pub rates: HashMap<String, f64>,
}

impl LatestRatesResponse {
    pub fn is_error(&self) -> bool {
        self.result
            .as_deref()
            .is_some_and(|result| result.eq_ignore_ascii_case("error"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_open_er_api_body() {
        let body = r#"{
            "result": "success",
            "base_code": "USD",
            "time_last_update_unix": 1700000000,
            "rates": {"USD": 1, "INR": 83.2, "EUR": 0.92}
        }"#;
        let parsed: LatestRatesResponse = serde_json::from_str(body).expect("parse");
        assert!(!parsed.is_error());
        assert_eq!(parsed.base_code.as_deref(), Some("USD"));
        assert_eq!(parsed.rates.get("INR"), Some(&83.2));
        assert_eq!(parsed.rates.get("USD"), Some(&1.0));
    }

    #[test]
    fn flags_error_result() {
        let body = r#"{"result": "error", "error-type": "unsupported-code"}"#;
        let parsed: LatestRatesResponse = serde_json::from_str(body).expect("parse");
        assert!(parsed.is_error());
        assert_eq!(parsed.error_type.as_deref(), Some("unsupported-code"));
        assert!(parsed.rates.is_empty());
    }
}
