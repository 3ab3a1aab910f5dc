use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::context::BindingError;
use crate::ids::IdError;
use crate::interpreter::ConditionKind;
use crate::node::{ActionNode, QName};

/// Position of an action element in its source document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LocationData {
    pub system_id: Option<String>,
    pub line: u32,
    pub column: u32,
}

impl LocationData {
    pub fn new(system_id: Option<String>, line: u32, column: u32) -> Self {
        Self { system_id, line, column }
    }
}

impl fmt::Display for LocationData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.system_id {
            Some(system_id) => write!(f, "{system_id}:{}:{}", self.line, self.column),
            None => write!(f, "line {}, column {}", self.line, self.column),
        }
    }
}

/// Failure reported by an expression evaluator.
#[derive(Debug, Clone, thiserror::Error)]
pub struct EvalError {
    pub expression: String,
    pub message: String,
    pub location: Option<LocationData>,
    #[source]
    pub source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl EvalError {
    pub fn new(expression: impl Into<String>, message: impl Into<String>) -> Self {
        Self { expression: expression.into(), message: message.into(), location: None, source: None }
    }

    pub fn with_location(mut self, location: Option<LocationData>) -> Self {
        self.location = location;
        self
    }

    /// Compose an error with a source cause.
    pub fn with_source(
        mut self,
        source: impl Into<Option<Arc<dyn std::error::Error + Send + Sync>>>,
    ) -> Self {
        self.source = source.into();
        self
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error evaluating `{}`: {}", self.expression, self.message)?;
        if let Some(location) = &self.location {
            write!(f, " ({location})")?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error(transparent)]
    Evaluation(#[from] EvalError),
    #[error(transparent)]
    Binding(#[from] BindingError),
    #[error(transparent)]
    Id(#[from] IdError),
    #[error("no action registered for `{0}`")]
    UnknownAction(QName),
    #[error("`{kind}` condition `{expression}` did not evaluate to a boolean")]
    NonBooleanCondition { kind: ConditionKind, expression: String },
    #[error("action failed: {message}")]
    Handler {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
    #[error("running action `{action}`{}: {source}", describe_position(.location, .iterate_index, .while_iteration))]
    InAction {
        action: String,
        location: Option<LocationData>,
        iterate_index: Option<usize>,
        while_iteration: Option<usize>,
        #[source]
        source: Box<ActionError>,
    },
}

fn describe_position(
    location: &Option<LocationData>,
    iterate_index: &Option<usize>,
    while_iteration: &Option<usize>,
) -> String {
    let mut out = String::new();
    if let Some(location) = location {
        out.push_str(&format!(" at {location}"));
    }
    if let Some(index) = iterate_index {
        out.push_str(&format!(" (iteration {index})"));
    }
    if let Some(pass) = while_iteration {
        out.push_str(&format!(" (while pass {pass})"));
    }
    out
}

/// Where inside one `run_action` call a failure happened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct IterationPosition {
    pub iterate_index: Option<usize>,
    pub while_iteration: Option<usize>,
}

impl ActionError {
    /// Failure raised by an action handler.
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler { message: message.into(), source: None }
    }

    pub fn handler_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Handler { message: message.into(), source: Some(Box::new(source)) }
    }

    pub(crate) fn within_action(self, action: &ActionNode, position: IterationPosition) -> Self {
        Self::InAction {
            action: action.name().qualified_name(),
            location: action.location().cloned(),
            iterate_index: position.iterate_index,
            while_iteration: position.while_iteration,
            source: Box::new(self),
        }
    }

    /// Qualified names of the actions this error was raised in, outermost first.
    pub fn action_trace(&self) -> Vec<&str> {
        let mut trace = Vec::new();
        let mut current = self;
        while let Self::InAction { action, source, .. } = current {
            trace.push(action.as_str());
            current = source;
        }
        trace
    }

    /// The innermost error, with all action wrappers removed.
    pub fn root_cause(&self) -> &ActionError {
        let mut current = self;
        while let Self::InAction { source, .. } = current {
            current = source;
        }
        current
    }
}
