use std::sync::Arc;

use anyhow::Result;
use rates::{HttpRateSource, RateSource};
use shared::domain::ThemeMode;
use storage::{KeyValueStore, SqliteStore, TodoStore};
use tracing::{info, warn};

use crate::{
    config::Settings, converter::CurrencyConverter, counter::Counter,
    generator::PasswordGenerator, theme::ThemeSwitcher, todos::TodoList,
};

/// Owns every pipeline. Hand out `&mut` or read-only borrows of the parts a
/// consumer needs.
pub struct AppState {
    pub counter: Counter,
    pub password: PasswordGenerator,
    pub converter: CurrencyConverter,
    pub theme: ThemeSwitcher,
    pub todos: TodoList,
}

impl AppState {
    pub async fn from_settings(settings: &Settings) -> Result<Self> {
        settings.validate()?;
        let rate_source = Arc::new(HttpRateSource::new(settings.rates_endpoint.clone())?);
        let store = Arc::new(SqliteStore::new(&settings.store_url).await?);
        Self::with_services(settings, rate_source, store).await
    }

    /// Builds the state over injected services. A failed initial rate lookup
    /// is logged; the converter waits for a later refresh.
    pub async fn with_services(
        settings: &Settings,
        rate_source: Arc<dyn RateSource>,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self> {
        settings.validate()?;

        let mut converter = CurrencyConverter::new(rate_source);
        if let Err(err) = converter.load_rates().await {
            warn!("app: starting without exchange rates: {err}");
        }

        let todos = TodoList::load(TodoStore::new(store)).await;
        let state = Self {
            counter: Counter::new(),
            password: PasswordGenerator::with_length(
                settings.random_source,
                settings.password_length,
            ),
            converter,
            theme: ThemeSwitcher::new(ThemeMode::default()),
            todos,
        };
        info!(
            todos = state.todos.len(),
            currencies = state.converter.currency_options().len(),
            "app: state ready"
        );
        Ok(state)
    }
}
