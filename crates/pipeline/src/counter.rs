use shared::error::PipelineError;

use crate::{
    input::InputSet,
    reactive::{Derivation, ReactivePipeline, Sink},
};

pub const COUNT: &str = "count";

#[derive(Debug, Default)]
pub struct CountDerivation;

impl Derivation for CountDerivation {
    type Output = i64;

    fn derive(&mut self, inputs: &InputSet) -> Result<i64, PipelineError> {
        inputs.integer(COUNT)
    }
}

/// Non-negative counter.
pub struct Counter {
    pipeline: ReactivePipeline<CountDerivation>,
}

impl Default for Counter {
    fn default() -> Self {
        Self::new()
    }
}

impl Counter {
    pub fn new() -> Self {
        Self {
            pipeline: ReactivePipeline::new(
                "counter",
                CountDerivation,
                InputSet::new().with(COUNT, 0_i64),
            )
            .with_initial_output(0),
        }
    }

    pub fn value(&self) -> i64 {
        self.pipeline.output().copied().unwrap_or(0)
    }

    pub fn attach(&mut self, sink: impl Sink<i64> + 'static) {
        self.pipeline.register_sink(sink);
    }

    pub fn add_value(&mut self) -> i64 {
        self.update(|count| count.saturating_add(1))
    }

    /// Decrements, never below zero.
    pub fn sub_value(&mut self) -> i64 {
        self.update(|count| count.saturating_sub(1).max(0))
    }

    pub fn reset_value(&mut self) -> i64 {
        self.update(|_| 0)
    }

    /// Applies `step` to the current count and recomputes once.
    pub fn update(&mut self, step: impl FnOnce(i64) -> i64) -> i64 {
        let next = step(self.value());
        self.pipeline.set_input(COUNT, next).unwrap_or(next)
    }
}
