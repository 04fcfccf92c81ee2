use super::*;
use axum::{extract::State, http::StatusCode, routing::get, Router};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::net::TcpListener;

const USD_BODY: &str = r#"{
    "result": "success",
    "base_code": "USD",
    "rates": {"USD": 1, "INR": 83.0, "EUR": 0.5}
}"#;

#[derive(Clone, Default)]
struct ServerState {
    hits: Arc<AtomicUsize>,
}

async fn latest_usd(State(state): State<ServerState>) -> &'static str {
    state.hits.fetch_add(1, Ordering::SeqCst);
    USD_BODY
}

async fn unavailable(State(state): State<ServerState>) -> StatusCode {
    state.hits.fetch_add(1, Ordering::SeqCst);
    StatusCode::SERVICE_UNAVAILABLE
}

async fn garbage() -> &'static str {
    "<html>not json</html>"
}

async fn reported_error() -> &'static str {
    r#"{"result": "error", "error-type": "unsupported-code"}"#
}

async fn spawn_rates_server() -> Result<(String, ServerState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = ServerState::default();
    let app = Router::new()
        .route("/latest/USD", get(latest_usd))
        .route("/down", get(unavailable))
        .route("/garbage", get(garbage))
        .route("/error", get(reported_error))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), state))
}

fn usd_table() -> RateTable {
    RateTable::new(
        "USD",
        [
            ("USD".to_string(), 1.0),
            ("INR".to_string(), 83.0),
            ("EUR".to_string(), 0.5),
        ],
    )
}

struct FailingSource;

#[async_trait]
impl RateSource for FailingSource {
    async fn fetch_rates(&self, key: &str) -> Result<RateTable> {
        Err(anyhow!("network unreachable for {key}"))
    }
}

/// Succeeds for the first key it sees, fails afterwards.
struct FlakySource {
    calls: AtomicUsize,
}

#[async_trait]
impl RateSource for FlakySource {
    async fn fetch_rates(&self, _key: &str) -> Result<RateTable> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            Ok(usd_table())
        } else {
            Err(anyhow!("connection reset"))
        }
    }
}

#[test]
fn converts_through_base_rates() {
    let table = usd_table();
    assert_eq!(table.convert(10.0, "USD", "INR").expect("convert"), 830.0);
    assert_eq!(table.convert(830.0, "INR", "EUR").expect("convert"), 5.0);
    assert_eq!(table.convert(10.0, "usd", "usd").expect("convert"), 10.0);
}

#[test]
fn conversion_rounds_to_cents() {
    let table = RateTable::new(
        "USD",
        [("USD".to_string(), 1.0), ("JPY".to_string(), 3.0)],
    );
    assert_eq!(table.convert(1.0, "JPY", "USD").expect("convert"), 0.33);
}

#[test]
fn missing_rate_names_the_absent_code() {
    let table = usd_table();
    let err = table.convert(1.0, "USD", "GBP").expect_err("missing");
    assert_eq!(
        err,
        PipelineError::MissingRate {
            currency: "GBP".into()
        }
    );
    let err = table.convert(1.0, "xyz", "USD").expect_err("missing");
    assert_eq!(
        err,
        PipelineError::MissingRate {
            currency: "XYZ".into()
        }
    );
}

#[test]
fn zero_rate_counts_as_missing() {
    let table = RateTable::new("USD", [("USD".to_string(), 1.0), ("BAD".to_string(), 0.0)]);
    assert!(table.rate("BAD").is_none());
    assert!(table.convert(5.0, "BAD", "USD").is_err());
}

#[test]
fn codes_are_sorted() {
    assert_eq!(usd_table().codes(), vec!["EUR", "INR", "USD"]);
}

#[test]
fn rejects_malformed_endpoint() {
    assert!(HttpRateSource::new("not a url").is_err());
    assert!(HttpRateSource::new("https://rates.example/latest/{base}").is_ok());
}

#[test]
fn substitutes_base_placeholder() {
    let source = HttpRateSource::new("https://rates.example/latest/{base}").expect("source");
    assert_eq!(source.request_url("eur"), "https://rates.example/latest/EUR");

    let fixed = HttpRateSource::new(DEFAULT_RATES_ENDPOINT).expect("source");
    assert_eq!(fixed.request_url("INR"), DEFAULT_RATES_ENDPOINT);
}

#[tokio::test]
async fn http_source_parses_rates_body() {
    let (server_url, _state) = spawn_rates_server().await.expect("spawn server");
    let source = HttpRateSource::new(format!("{server_url}/latest/USD")).expect("source");

    let table = source.fetch_rates("USD").await.expect("fetch");
    assert_eq!(table.base(), "USD");
    assert_eq!(table.rate("INR"), Some(83.0));
}

#[tokio::test]
async fn http_source_rejects_error_status_and_bad_bodies() {
    let (server_url, _state) = spawn_rates_server().await.expect("spawn server");

    for path in ["down", "garbage", "error"] {
        let source = HttpRateSource::new(format!("{server_url}/{path}")).expect("source");
        assert!(
            source.fetch_rates("USD").await.is_err(),
            "{path} should fail"
        );
    }
}

#[tokio::test]
async fn cache_fetches_each_key_once() {
    let (server_url, state) = spawn_rates_server().await.expect("spawn server");
    let source = HttpRateSource::new(format!("{server_url}/latest/USD")).expect("source");
    let mut cache = RateCache::new(Arc::new(source));

    cache.refresh_lookup("USD").await.expect("first");
    cache.refresh_lookup("usd").await.expect("second");
    assert_eq!(state.hits.load(Ordering::SeqCst), 1);
    assert!(cache.is_cached("USD"));

    cache.refresh_lookup("INR").await.expect("new key");
    assert_eq!(state.hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failed_refresh_keeps_stale_table() {
    let mut cache = RateCache::new(Arc::new(FlakySource {
        calls: AtomicUsize::new(0),
    }));
    cache.refresh_lookup("USD").await.expect("first fetch");

    let err = cache.refresh_lookup("EUR").await.expect_err("second fetch");
    assert!(matches!(err, PipelineError::LookupUnavailable { ref key, .. } if key == "EUR"));
    assert_eq!(cache.current(), Some(&usd_table()));
    assert!(!cache.is_cached("EUR"));
}

#[tokio::test]
async fn failed_first_refresh_leaves_cache_empty() {
    let mut cache = RateCache::new(Arc::new(FailingSource));
    let err = cache.refresh_lookup("USD").await.expect_err("fails");
    assert_eq!(err.code(), shared::error::ErrorCode::LookupUnavailable);
    assert!(cache.current().is_none());
}

#[tokio::test]
async fn http_failure_keeps_previous_table() {
    let (server_url, state) = spawn_rates_server().await.expect("spawn server");
    let mut cache = RateCache::new(Arc::new(StaticRateSource::new(usd_table())));
    cache.refresh_lookup("USD").await.expect("static");

    cache.source = Arc::new(HttpRateSource::new(format!("{server_url}/down")).expect("source"));
    assert!(cache.refresh_lookup("EUR").await.is_err());
    assert_eq!(state.hits.load(Ordering::SeqCst), 1);
    assert_eq!(cache.current().map(RateTable::base), Some("USD"));
}
