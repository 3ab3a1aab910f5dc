#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use xforms_actions::{
    ActionEnvironment, ActionError, ActionInterpreter, ActionNode, BindingError, BindingFrame,
    BindingSpec, BindingStack, Container, ContextStack, EvalError, EvalRequest, Evaluator,
    HandlerRegistry, Host, InterpreterConfig, Invocation, QName, Scope, ids, run_handler_action,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Str(String),
}

impl Value {
    pub fn str(text: &str) -> Self {
        Value::Str(text.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Str(s) => f.write_str(s),
        }
    }
}

pub struct TestHost;

impl Host for TestHost {
    type Item = Value;
    type Object = String;
    type Event = String;

    fn boolean_value(item: &Value) -> Option<bool> {
        match item {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

type Rule = Box<dyn Fn(&EvalRequest<'_, TestHost>) -> Result<Vec<Value>, EvalError>>;

/// Evaluator answering only the expressions it was scripted with, and
/// recording every expression it is asked for.
#[derive(Default)]
pub struct ScriptedEvaluator {
    rules: HashMap<String, Rule>,
    calls: RefCell<Vec<String>>,
}

impl ScriptedEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(mut self, expression: &str, rule: F) -> Self
    where
        F: Fn(&EvalRequest<'_, TestHost>) -> Result<Vec<Value>, EvalError> + 'static,
    {
        self.rules.insert(expression.to_string(), Box::new(rule));
        self
    }

    pub fn constant(self, expression: &str, values: Vec<Value>) -> Self {
        self.on(expression, move |_| Ok(values.clone()))
    }

    /// `boolean(expression)` always yields `value`.
    pub fn condition(self, expression: &str, value: bool) -> Self {
        self.constant(&format!("boolean({expression})"), vec![Value::Bool(value)])
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self, expression: &str) -> usize {
        self.calls.borrow().iter().filter(|call| call.as_str() == expression).count()
    }

    fn eval_expression(
        &self,
        request: &EvalRequest<'_, TestHost>,
        expression: &str,
    ) -> Result<Vec<Value>, EvalError> {
        self.calls.borrow_mut().push(expression.to_string());
        match self.rules.get(expression) {
            Some(rule) => rule(request),
            None => Err(EvalError::new(expression, "no rule for expression")),
        }
    }
}

impl Evaluator<TestHost> for ScriptedEvaluator {
    fn evaluate_as_string(
        &self,
        request: &EvalRequest<'_, TestHost>,
    ) -> Result<Option<String>, EvalError> {
        let items = self.evaluate_keep_items(request)?;
        if items.is_empty() {
            return Ok(None);
        }
        Ok(Some(items.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ")))
    }

    fn evaluate_keep_items(
        &self,
        request: &EvalRequest<'_, TestHost>,
    ) -> Result<Vec<Value>, EvalError> {
        self.eval_expression(request, request.expression)
    }

    fn evaluate_as_avt(&self, request: &EvalRequest<'_, TestHost>) -> Result<String, EvalError> {
        self.calls.borrow_mut().push(format!("avt:{}", request.expression));
        let mut out = String::new();
        let mut rest = request.expression;
        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let Some(end) = rest[start..].find('}') else {
                return Err(request.error("unterminated template"));
            };
            let inner = &rest[start + 1..start + end];
            for item in self.eval_expression(request, inner)? {
                out.push_str(&item.to_string());
            }
            rest = &rest[start + end + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

/// Container whose objects are their own effective ids.
#[derive(Default)]
pub struct TestContainer {
    prefix: String,
    objects: HashSet<String>,
    scopes: HashMap<String, Scope>,
}

impl TestContainer {
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    pub fn with_object(mut self, effective_id: &str) -> Self {
        self.objects.insert(effective_id.to_string());
        self
    }

    pub fn with_scope(mut self, prefixed_id: &str, scope: Scope) -> Self {
        self.scopes.insert(prefixed_id.to_string(), scope);
        self
    }
}

impl Container<TestHost> for TestContainer {
    fn full_prefix(&self) -> &str {
        &self.prefix
    }

    fn scope_for_prefixed_id(&self, prefixed_id: &str) -> Option<Scope> {
        self.scopes.get(prefixed_id).cloned()
    }

    fn resolve_object_by_id_in_scope(
        &self,
        _source_effective_id: &str,
        target_id: &str,
        _indexes_hint: Option<&str>,
    ) -> Option<String> {
        let prefixed = format!("{}{target_id}", self.prefix);
        self.objects.get(&prefixed).cloned()
    }

    fn prefixed_id_of(&self, object: &String) -> String {
        ids::prefixed_id(object).to_string()
    }

    fn object_by_effective_id(&self, effective_id: &str) -> Option<String> {
        self.objects.get(effective_id).cloned()
    }
}

/// Stack wrapper counting pushes and pops.
pub struct CountingStack<'e> {
    pub inner: BindingStack<'e, TestHost>,
    pub bindings: usize,
    pub iterations: usize,
    pub pops: usize,
}

impl<'e> CountingStack<'e> {
    pub fn new(inner: BindingStack<'e, TestHost>) -> Self {
        Self { inner, bindings: 0, iterations: 0, pops: 0 }
    }
}

impl ContextStack<TestHost> for CountingStack<'_> {
    fn push_binding(&mut self, spec: &BindingSpec<'_>) -> Result<(), BindingError> {
        self.inner.push_binding(spec)?;
        self.bindings += 1;
        Ok(())
    }

    fn push_iteration(&mut self, index: usize) -> Result<(), BindingError> {
        self.inner.push_iteration(index)?;
        self.iterations += 1;
        Ok(())
    }

    fn pop_binding(&mut self) {
        self.pops += 1;
        self.inner.pop_binding();
    }

    fn current_frame(&self) -> &BindingFrame<Value> {
        self.inner.current_frame()
    }

    fn depth(&self) -> usize {
        self.inner.depth()
    }
}

/// What a recording handler saw on one dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub action: String,
    pub overridden: Option<Value>,
    pub bound: Option<Value>,
    pub depth: usize,
}

pub type Dispatches = Rc<RefCell<Vec<Dispatch>>>;

/// Register a handler for `local` that records each dispatch.
pub fn record(registry: &mut HandlerRegistry<TestHost>, local: &str) -> Dispatches {
    let dispatches: Dispatches = Rc::default();
    let sink = Rc::clone(&dispatches);
    registry.register_fn(QName::local(local), move |ctx| {
        sink.borrow_mut().push(Dispatch {
            action: ctx.action().name().qualified_name(),
            overridden: ctx.overridden_context().cloned(),
            bound: ctx.bound_item().cloned(),
            depth: ctx.interpreter().context_stack().depth(),
        });
        Ok(())
    });
    dispatches
}

/// Register the `action` block handler that runs nested actions.
pub fn register_block(registry: &mut HandlerRegistry<TestHost>) {
    registry.register_fn(QName::local("action"), |ctx| ctx.run_nested_actions());
}

pub fn action(local: &str, id: &str) -> xforms_actions::ActionNodeBuilder {
    ActionNode::builder(QName::local(local), id)
}

pub fn root_frame() -> BindingFrame<Value> {
    BindingFrame::root(vec![Value::str("doc")])
}

pub const HANDLER_ID: &str = "handler";

/// Run `action` as the outer action of an event handler.
pub fn run(
    evaluator: &ScriptedEvaluator,
    container: &TestContainer,
    registry: &HandlerRegistry<TestHost>,
    stack: &mut dyn ContextStack<TestHost>,
    action: &ActionNode,
) -> Result<(), ActionError> {
    let config = InterpreterConfig::default();
    let env = ActionEnvironment { container, evaluator, registry, config: &config };
    let event = "DOMActivate".to_string();
    let observer = "trigger".to_string();
    run_handler_action(
        env,
        stack,
        Invocation { action, handler_effective_id: HANDLER_ID, event: &event, observer: &observer },
    )
}

/// Build an interpreter for direct calls of its resolution helpers.
pub fn with_interpreter<R>(
    evaluator: &ScriptedEvaluator,
    container: &TestContainer,
    stack: &mut dyn ContextStack<TestHost>,
    handler_effective_id: &str,
    action: &ActionNode,
    body: impl FnOnce(&mut ActionInterpreter<'_, TestHost>, &ActionNode) -> R,
) -> R {
    let registry = HandlerRegistry::<TestHost>::new();
    let config = InterpreterConfig::default();
    let env = ActionEnvironment { container, evaluator, registry: &registry, config: &config };
    let event = "xforms-ready".to_string();
    let observer = "model".to_string();
    let mut interpreter = ActionInterpreter::new(
        env,
        stack,
        Invocation { action, handler_effective_id, event: &event, observer: &observer },
    );
    body(&mut interpreter, action)
}
