use std::ops::RangeInclusive;

use rand::{
    rngs::{OsRng, StdRng},
    Rng, RngCore, SeedableRng,
};
use shared::{domain::CharacterClass, error::PipelineError};

use crate::{
    input::InputSet,
    reactive::{Derivation, ReactivePipeline, Sink},
};

pub const LENGTH: &str = "length";
pub const DEFAULT_LENGTH: usize = 8;
pub const LENGTH_RANGE: RangeInclusive<usize> = 6..=100;

/// Where sampled indices come from.
///
/// `Secure` (the operating system's CSPRNG) is the default; `Standard` is a
/// userspace generator seeded from entropy, for callers that opt out of the
/// stronger guarantee. `Seeded` gives reproducible output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RandomSource {
    #[default]
    Secure,
    Standard,
    Seeded(u64),
}

impl RandomSource {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("secure") || raw.eq_ignore_ascii_case("os") {
            return Some(RandomSource::Secure);
        }
        if raw.eq_ignore_ascii_case("standard") {
            return Some(RandomSource::Standard);
        }
        raw.strip_prefix("seeded:")
            .and_then(|seed| seed.trim().parse().ok())
            .map(RandomSource::Seeded)
    }

    fn rng(self) -> Box<dyn RngCore + Send> {
        match self {
            RandomSource::Secure => Box::new(OsRng),
            RandomSource::Standard => Box::new(StdRng::from_entropy()),
            RandomSource::Seeded(seed) => Box::new(StdRng::seed_from_u64(seed)),
        }
    }
}

/// Concatenation of the enabled classes, in [`CharacterClass::ALL`] order.
pub fn build_alphabet(inputs: &InputSet) -> Result<Vec<char>, PipelineError> {
    let mut alphabet = Vec::new();
    for class in CharacterClass::ALL {
        if inputs.flag_or(class.input_name(), false)? {
            alphabet.extend(class.characters().chars());
        }
    }
    if alphabet.is_empty() {
        return Err(PipelineError::EmptyDomain);
    }
    Ok(alphabet)
}

pub struct PasswordDerivation {
    rng: Box<dyn RngCore + Send>,
}

impl PasswordDerivation {
    pub fn new(source: RandomSource) -> Self {
        Self { rng: source.rng() }
    }
}

impl Derivation for PasswordDerivation {
    type Output = String;

    fn derive(&mut self, inputs: &InputSet) -> Result<String, PipelineError> {
        let length = usize::try_from(inputs.integer(LENGTH)?)
            .ok()
            .filter(|length| LENGTH_RANGE.contains(length))
            .ok_or_else(|| {
                PipelineError::invalid_input(
                    LENGTH,
                    format!(
                        "must be between {} and {}",
                        LENGTH_RANGE.start(),
                        LENGTH_RANGE.end()
                    ),
                )
            })?;
        let alphabet = build_alphabet(inputs)?;

        Ok((0..length)
            .map(|_| alphabet[self.rng.gen_range(0..alphabet.len())])
            .collect())
    }
}

pub fn default_inputs(length: usize) -> InputSet {
    InputSet::new()
        .with(LENGTH, length)
        .with(CharacterClass::Uppercase.input_name(), true)
        .with(CharacterClass::Lowercase.input_name(), true)
        .with(CharacterClass::Digits.input_name(), false)
        .with(CharacterClass::Symbols.input_name(), false)
}

/// Keeps a password in step with its length and character-class settings.
pub struct PasswordGenerator {
    pipeline: ReactivePipeline<PasswordDerivation>,
}

impl PasswordGenerator {
    pub fn new(source: RandomSource) -> Self {
        Self::with_length(source, DEFAULT_LENGTH)
    }

    /// Starts from the default classes and `length`. An out-of-range length
    /// leaves the generator without a password until it is corrected.
    pub fn with_length(source: RandomSource, length: usize) -> Self {
        let mut pipeline = ReactivePipeline::new(
            "password",
            PasswordDerivation::new(source),
            default_inputs(length),
        );
        let _ = pipeline.recompute();
        Self { pipeline }
    }

    pub fn password(&self) -> Option<&str> {
        self.pipeline.output().map(String::as_str)
    }

    pub fn length(&self) -> Option<usize> {
        self.pipeline
            .inputs()
            .integer(LENGTH)
            .ok()
            .and_then(|length| usize::try_from(length).ok())
    }

    pub fn is_enabled(&self, class: CharacterClass) -> bool {
        self.pipeline
            .inputs()
            .flag_or(class.input_name(), false)
            .unwrap_or(false)
    }

    pub fn set_length(&mut self, length: usize) -> Result<String, PipelineError> {
        self.pipeline.set_input(LENGTH, length)
    }

    pub fn set_class(
        &mut self,
        class: CharacterClass,
        enabled: bool,
    ) -> Result<String, PipelineError> {
        self.pipeline.set_input(class.input_name(), enabled)
    }

    pub fn toggle_class(&mut self, class: CharacterClass) -> Result<String, PipelineError> {
        let enabled = self.is_enabled(class);
        self.set_class(class, !enabled)
    }

    /// Draws a fresh password from the unchanged settings.
    pub fn regenerate(&mut self) -> Result<String, PipelineError> {
        self.pipeline.recompute()
    }

    /// Copies the current password into `sink`; a no-op without one.
    pub fn copy_to(&self, sink: &mut dyn Sink<String>) -> bool {
        match self.password() {
            Some(password) if !password.is_empty() => self.pipeline.sync_to(sink),
            _ => false,
        }
    }

    pub fn pipeline(&self) -> &ReactivePipeline<PasswordDerivation> {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut ReactivePipeline<PasswordDerivation> {
        &mut self.pipeline
    }
}

#[cfg(test)]
#[path = "tests/generator_tests.rs"]
mod tests;
