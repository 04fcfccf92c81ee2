//! Reactive value pipelines: named inputs, a derived output recomputed on
//! every change, and sinks that receive each new output.

pub mod app_state;
pub mod config;
pub mod converter;
pub mod counter;
pub mod generator;
pub mod input;
pub mod reactive;
pub mod sinks;
pub mod theme;
pub mod todos;

pub use app_state::AppState;
pub use config::{load_settings, Settings};
pub use converter::CurrencyConverter;
pub use counter::Counter;
pub use generator::{PasswordGenerator, RandomSource};
pub use input::{InputSet, InputValue};
pub use reactive::{Derivation, ReactivePipeline, Sink};
pub use theme::ThemeSwitcher;
pub use todos::TodoList;
