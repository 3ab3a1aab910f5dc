//! Interpreter for declarative action trees.
//!
//! An [`ActionInterpreter`] runs one action element against a dynamically
//! scoped [`ContextStack`]: it applies `model`/`context`/`iterate`, checks
//! `if`/`while` guards, binds `ref`/`bind` and dispatches to the handler
//! registered for the action's name. Expression evaluation, id resolution
//! and the handlers themselves are supplied by the embedding through the
//! traits in this crate.

pub mod config;
pub mod context;
pub mod dynamic;
pub mod error;
pub mod eval;
pub mod host;
pub mod ids;
pub mod interpreter;
pub mod node;
pub mod registry;
pub mod stack;

pub use config::InterpreterConfig;
pub use context::{BindingError, BindingFrame, BindingSpec, ContextStack};
pub use dynamic::DynamicActionContext;
pub use error::{ActionError, EvalError, LocationData};
pub use eval::{EvalRequest, Evaluator, FunctionContext, Variables};
pub use host::{Container, Host};
pub use interpreter::{
    ActionEnvironment, ActionInterpreter, ConditionKind, ConditionOutcome, Invocation, maybe_avt,
    run_handler_action,
};
pub use node::{ActionNode, ActionNodeBuilder, Attribute, AttributeKey, NamespaceMapping, QName, Scope};
pub use registry::{ActionHandler, ActionRegistry, HandlerRegistry};
pub use stack::BindingStack;
