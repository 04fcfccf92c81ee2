use shared::{domain::ThemeMode, error::PipelineError};

use crate::{
    input::InputSet,
    reactive::{Derivation, ReactivePipeline, Sink},
};

pub const THEME_MODE: &str = "theme_mode";

#[derive(Debug, Default)]
pub struct ThemeDerivation;

impl Derivation for ThemeDerivation {
    type Output = ThemeMode;

    fn derive(&mut self, inputs: &InputSet) -> Result<ThemeMode, PipelineError> {
        let raw = inputs.text(THEME_MODE)?;
        ThemeMode::parse(raw).ok_or_else(|| {
            PipelineError::invalid_input(THEME_MODE, format!("unknown theme '{raw}'"))
        })
    }
}

/// Light/dark mode, pushed to every attached sink on change.
pub struct ThemeSwitcher {
    pipeline: ReactivePipeline<ThemeDerivation>,
}

impl ThemeSwitcher {
    pub fn new(mode: ThemeMode) -> Self {
        let pipeline = ReactivePipeline::new(
            "theme",
            ThemeDerivation,
            InputSet::new().with(THEME_MODE, mode.as_str()),
        )
        .with_initial_output(mode);
        Self { pipeline }
    }

    pub fn mode(&self) -> ThemeMode {
        self.pipeline.output().copied().unwrap_or_default()
    }

    /// Attaches a sink; it is brought up to date straight away.
    pub fn attach(&mut self, sink: impl Sink<ThemeMode> + 'static) {
        self.pipeline.register_sink(sink);
    }

    pub fn light_theme(&mut self) {
        self.set_mode(ThemeMode::Light);
    }

    pub fn dark_theme(&mut self) {
        self.set_mode(ThemeMode::Dark);
    }

    pub fn toggle(&mut self) -> ThemeMode {
        let next = match self.mode() {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        };
        self.set_mode(next);
        next
    }

    fn set_mode(&mut self, mode: ThemeMode) {
        // Known modes always parse.
        let _ = self.pipeline.set_input(THEME_MODE, mode.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::{DocumentClassList, RecordingSink};

    #[test]
    fn attaching_syncs_current_mode() {
        let classes = DocumentClassList::new();
        let mut switcher = ThemeSwitcher::new(ThemeMode::Light);
        switcher.attach(classes.clone());
        assert_eq!(classes.classes(), vec!["light"]);

        switcher.dark_theme();
        assert_eq!(switcher.mode(), ThemeMode::Dark);
        assert_eq!(classes.classes(), vec!["dark"]);

        switcher.light_theme();
        assert_eq!(classes.classes(), vec!["light"]);
    }

    #[test]
    fn toggle_alternates_and_syncs_each_change() {
        let history = RecordingSink::new();
        let mut switcher = ThemeSwitcher::new(ThemeMode::Dark);
        switcher.attach(history.clone());

        assert_eq!(switcher.toggle(), ThemeMode::Light);
        assert_eq!(switcher.toggle(), ThemeMode::Dark);
        assert_eq!(
            history.values(),
            vec![ThemeMode::Dark, ThemeMode::Light, ThemeMode::Dark]
        );
    }

    #[test]
    fn unknown_mode_text_is_invalid_input() {
        let inputs = InputSet::new().with(THEME_MODE, "sepia");
        let err = ThemeDerivation.derive(&inputs).expect_err("unknown");
        assert_eq!(err.code(), shared::error::ErrorCode::InvalidInput);
    }
}
