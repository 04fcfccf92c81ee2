use axum::{routing::get, Router};
use pipeline::{
    generator::RandomSource, sinks::DocumentClassList, sinks::MemoryClipboard, AppState, Settings,
};
use shared::domain::{CharacterClass, ThemeMode};
use tokio::net::TcpListener;

const RATES_BODY: &str = r#"{
    "result": "success",
    "base_code": "USD",
    "rates": {"USD": 1, "INR": 80.0, "GBP": 0.8}
}"#;

async fn spawn_rates_server() -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = Router::new().route("/v6/latest/USD", get(|| async { RATES_BODY }));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}/v6/latest/USD")
}

fn settings_for(rates_endpoint: String, store: &std::path::Path) -> Settings {
    Settings {
        rates_endpoint,
        store_url: store.to_string_lossy().into_owned(),
        random_source: RandomSource::Seeded(11),
        password_length: 12,
    }
}

#[tokio::test]
async fn full_state_drives_every_pipeline_and_persists_todos() {
    let rates_endpoint = spawn_rates_server().await;
    let temp_root = tempfile::tempdir().expect("tempdir");
    let store_path = temp_root.path().join("profile").join("state.db");
    let settings = settings_for(rates_endpoint, &store_path);

    let mut state = AppState::from_settings(&settings).await.expect("state");

    assert_eq!(state.converter.currency_options(), vec!["GBP", "INR", "USD"]);
    state.converter.set_amount(10.0).expect("amount");
    assert_eq!(state.converter.formatted(), "800.00");
    state.converter.set_to("GBP").expect("to");
    assert_eq!(state.converter.formatted(), "8.00");

    let password = state.password.password().expect("password").to_string();
    assert_eq!(password.len(), 12);
    state
        .password
        .set_class(CharacterClass::Symbols, true)
        .expect("symbols");
    let mut clipboard = MemoryClipboard::new();
    assert!(state.password.copy_to(&mut clipboard));
    assert_eq!(clipboard.contents().as_deref(), state.password.password());

    let classes = DocumentClassList::new();
    state.theme.attach(classes.clone());
    state.theme.dark_theme();
    assert_eq!(state.theme.mode(), ThemeMode::Dark);
    assert_eq!(classes.classes(), vec!["dark"]);

    assert_eq!(state.counter.add_value(), 1);

    let id = state.todos.add("pack bags").await.expect("add");
    state.todos.toggle_complete(id).await;
    let saved = state.todos.todos().to_vec();
    drop(state);

    let restarted = AppState::from_settings(&settings).await.expect("restart");
    assert_eq!(restarted.todos.todos(), saved.as_slice());
    assert_eq!(restarted.counter.value(), 0);
}

#[tokio::test]
async fn unreachable_rates_endpoint_is_not_fatal() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let temp_root = tempfile::tempdir().expect("tempdir");
    let settings = settings_for(
        format!("http://{addr}/v6/latest/USD"),
        &temp_root.path().join("state.db"),
    );

    let mut state = AppState::from_settings(&settings).await.expect("state");
    assert!(state.converter.currency_options().is_empty());
    assert!(state.converter.set_amount(3.0).is_err());
    assert_eq!(state.converter.formatted(), "0.00");
    assert!(state.password.password().is_some());
}

#[tokio::test]
async fn invalid_settings_are_rejected() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let mut settings = settings_for(
        "http://127.0.0.1:9/v6/latest/USD".into(),
        &temp_root.path().join("state.db"),
    );
    settings.password_length = 3;
    assert!(AppState::from_settings(&settings).await.is_err());
}
