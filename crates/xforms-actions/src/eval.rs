use std::collections::HashMap;

use crate::error::{EvalError, LocationData};
use crate::host::Host;
use crate::node::NamespaceMapping;

/// In-scope variables by name.
pub type Variables<I> = HashMap<String, Vec<I>>;

/// Host-specific state available to extension functions during evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionContext {
    pub source_effective_id: String,
    pub model_id: Option<String>,
}

impl FunctionContext {
    pub fn new(source_effective_id: impl Into<String>) -> Self {
        Self { source_effective_id: source_effective_id.into(), model_id: None }
    }

    pub fn with_model(mut self, model_id: Option<String>) -> Self {
        self.model_id = model_id;
        self
    }
}

/// Everything an evaluator needs for one expression.
pub struct EvalRequest<'r, H: Host> {
    pub sequence: &'r [H::Item],
    /// 1-based; 0 when the sequence is empty.
    pub position: usize,
    pub expression: &'r str,
    pub namespaces: &'r NamespaceMapping,
    pub variables: &'r Variables<H::Item>,
    pub function_context: &'r FunctionContext,
    pub location: Option<&'r LocationData>,
}

impl<H: Host> EvalRequest<'_, H> {
    /// Item at the request position.
    pub fn context_item(&self) -> Option<&H::Item> {
        self.position.checked_sub(1).and_then(|index| self.sequence.get(index))
    }

    /// Error for this request's expression.
    pub fn error(&self, message: impl Into<String>) -> EvalError {
        EvalError::new(self.expression, message).with_location(self.location.cloned())
    }
}

/// Query-language engine the interpreter evaluates expressions with.
pub trait Evaluator<H: Host> {
    /// String value of the result; `None` for an empty result.
    fn evaluate_as_string(&self, request: &EvalRequest<'_, H>) -> Result<Option<String>, EvalError>;

    fn evaluate_keep_items(&self, request: &EvalRequest<'_, H>) -> Result<Vec<H::Item>, EvalError>;

    /// Evaluate `request.expression` as an attribute value template.
    fn evaluate_as_avt(&self, request: &EvalRequest<'_, H>) -> Result<String, EvalError>;
}
