use std::collections::HashMap;

use shared::error::PipelineError;

#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    Flag(bool),
    Integer(i64),
    Number(f64),
    Text(String),
}

impl InputValue {
    fn kind(&self) -> &'static str {
        match self {
            InputValue::Flag(_) => "flag",
            InputValue::Integer(_) => "integer",
            InputValue::Number(_) => "number",
            InputValue::Text(_) => "text",
        }
    }
}

impl From<bool> for InputValue {
    fn from(value: bool) -> Self {
        InputValue::Flag(value)
    }
}

impl From<i64> for InputValue {
    fn from(value: i64) -> Self {
        InputValue::Integer(value)
    }
}

impl From<usize> for InputValue {
    fn from(value: usize) -> Self {
        InputValue::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for InputValue {
    fn from(value: f64) -> Self {
        InputValue::Number(value)
    }
}

impl From<&str> for InputValue {
    fn from(value: &str) -> Self {
        InputValue::Text(value.to_string())
    }
}

impl From<String> for InputValue {
    fn from(value: String) -> Self {
        InputValue::Text(value)
    }
}

/// Current values of a pipeline's user-controlled parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSet {
    values: HashMap<String, InputValue>,
}

impl InputSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<InputValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Stores `value` under `name`, returning what was there before.
    pub fn set(&mut self, name: &str, value: impl Into<InputValue>) -> Option<InputValue> {
        self.values.insert(name.to_string(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&InputValue> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Exchanges the values stored under two names.
    pub fn swap(&mut self, a: &str, b: &str) {
        let first = self.values.remove(a);
        let second = self.values.remove(b);
        if let Some(value) = first {
            self.values.insert(b.to_string(), value);
        }
        if let Some(value) = second {
            self.values.insert(a.to_string(), value);
        }
    }

    pub fn flag(&self, name: &str) -> Result<bool, PipelineError> {
        match self.require(name)? {
            InputValue::Flag(value) => Ok(*value),
            other => Err(mismatch(name, "flag", other)),
        }
    }

    /// Like [`InputSet::flag`], but an absent flag reads as `default`.
    pub fn flag_or(&self, name: &str, default: bool) -> Result<bool, PipelineError> {
        match self.get(name) {
            None => Ok(default),
            Some(_) => self.flag(name),
        }
    }

    pub fn integer(&self, name: &str) -> Result<i64, PipelineError> {
        match self.require(name)? {
            InputValue::Integer(value) => Ok(*value),
            other => Err(mismatch(name, "integer", other)),
        }
    }

    /// Numeric input; integers widen to `f64`.
    pub fn number(&self, name: &str) -> Result<f64, PipelineError> {
        match self.require(name)? {
            InputValue::Number(value) => Ok(*value),
            InputValue::Integer(value) => Ok(*value as f64),
            other => Err(mismatch(name, "number", other)),
        }
    }

    pub fn text(&self, name: &str) -> Result<&str, PipelineError> {
        match self.require(name)? {
            InputValue::Text(value) => Ok(value),
            other => Err(mismatch(name, "text", other)),
        }
    }

    fn require(&self, name: &str) -> Result<&InputValue, PipelineError> {
        self.get(name)
            .ok_or_else(|| PipelineError::invalid_input(name, "not set"))
    }
}

fn mismatch(name: &str, expected: &str, found: &InputValue) -> PipelineError {
    PipelineError::invalid_input(name, format!("expected {expected}, found {}", found.kind()))
}
