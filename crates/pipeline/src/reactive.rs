use std::fmt::Debug;

use shared::error::PipelineError;
use tracing::debug;

use crate::input::{InputSet, InputValue};

/// Pure computation from the current inputs to a single output.
pub trait Derivation {
    type Output: Clone + Debug + PartialEq;

    fn derive(&mut self, inputs: &InputSet) -> Result<Self::Output, PipelineError>;
}

/// One-way side effect fed with each new output.
pub trait Sink<T>: Send {
    fn sync(&mut self, value: &T);
}

/// Owns an [`InputSet`], recomputes its derivation after every setter and
/// pushes successful results to the registered sinks.
///
/// A failed recompute clears the output unless the error keeps the prior
/// output (see [`PipelineError::keeps_prior_output`]); sinks never see a
/// failure.
pub struct ReactivePipeline<D: Derivation> {
    name: &'static str,
    inputs: InputSet,
    derivation: D,
    output: Option<D::Output>,
    last_error: Option<PipelineError>,
    sinks: Vec<Box<dyn Sink<D::Output>>>,
}

impl<D: Derivation> ReactivePipeline<D> {
    pub fn new(name: &'static str, derivation: D, inputs: InputSet) -> Self {
        Self {
            name,
            inputs,
            derivation,
            output: None,
            last_error: None,
            sinks: Vec::new(),
        }
    }

    /// Seeds the output before any recompute has run.
    pub fn with_initial_output(mut self, output: D::Output) -> Self {
        self.output = Some(output);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn inputs(&self) -> &InputSet {
        &self.inputs
    }

    pub fn output(&self) -> Option<&D::Output> {
        self.output.as_ref()
    }

    pub fn last_error(&self) -> Option<&PipelineError> {
        self.last_error.as_ref()
    }

    pub fn derivation(&self) -> &D {
        &self.derivation
    }

    /// Mutable access to the derivation, e.g. to install a fresh lookup
    /// table. Does not recompute.
    pub fn derivation_mut(&mut self) -> &mut D {
        &mut self.derivation
    }

    /// Registers a sink. It immediately receives the current output, if any.
    pub fn register_sink(&mut self, sink: impl Sink<D::Output> + 'static) {
        let mut sink = Box::new(sink);
        if let Some(output) = &self.output {
            sink.sync(output);
        }
        self.sinks.push(sink);
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    pub fn set_input(
        &mut self,
        name: &str,
        value: impl Into<InputValue>,
    ) -> Result<D::Output, PipelineError> {
        self.inputs.set(name, value);
        self.recompute()
    }

    /// Applies several input changes with a single recompute.
    pub fn set_inputs<I, V>(&mut self, values: I) -> Result<D::Output, PipelineError>
    where
        I: IntoIterator<Item = (&'static str, V)>,
        V: Into<InputValue>,
    {
        for (name, value) in values {
            self.inputs.set(name, value);
        }
        self.recompute()
    }

    pub fn recompute(&mut self) -> Result<D::Output, PipelineError> {
        match self.derivation.derive(&self.inputs) {
            Ok(output) => {
                for sink in &mut self.sinks {
                    sink.sync(&output);
                }
                self.output = Some(output.clone());
                self.last_error = None;
                Ok(output)
            }
            Err(err) => {
                if !err.keeps_prior_output() {
                    self.output = None;
                }
                debug!(
                    pipeline = self.name,
                    kept_output = self.output.is_some(),
                    "pipeline: recompute failed: {err}"
                );
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Pushes the current output to a sink that is not registered, such as a
    /// clipboard written on request. Returns whether anything was pushed.
    pub fn sync_to(&self, sink: &mut dyn Sink<D::Output>) -> bool {
        match &self.output {
            Some(output) => {
                sink.sync(output);
                true
            }
            None => false,
        }
    }

    /// Rewrites inputs and output together without recomputing or syncing.
    ///
    /// For state transitions whose result is already known, like swapping a
    /// conversion's direction.
    pub fn restate(&mut self, update: impl FnOnce(&mut InputSet, &mut Option<D::Output>)) {
        update(&mut self.inputs, &mut self.output);
    }
}

#[cfg(test)]
#[path = "tests/reactive_tests.rs"]
mod tests;
