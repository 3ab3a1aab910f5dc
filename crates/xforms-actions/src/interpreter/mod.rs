//! Execution of one top-level action and the actions nested in it.

mod avt;
mod condition;
mod objects;

pub use avt::maybe_avt;
pub use condition::{ConditionKind, ConditionOutcome};

use tracing::{debug, debug_span};

use crate::config::InterpreterConfig;
use crate::context::{BindingSpec, ContextStack};
use crate::dynamic::DynamicActionContext;
use crate::error::{ActionError, IterationPosition};
use crate::eval::{EvalRequest, Evaluator, FunctionContext};
use crate::host::{Container, Host};
use crate::ids;
use crate::node::{ActionNode, NamespaceMapping, Scope};
use crate::registry::ActionRegistry;

/// Collaborators shared by all actions of one interpretation pass.
pub struct ActionEnvironment<'a, H: Host> {
    pub container: &'a dyn Container<H>,
    pub evaluator: &'a dyn Evaluator<H>,
    pub registry: &'a dyn ActionRegistry<H>,
    pub config: &'a InterpreterConfig,
}

impl<H: Host> Clone for ActionEnvironment<'_, H> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<H: Host> Copy for ActionEnvironment<'_, H> {}

/// What triggered the pass: the handler's outer action and its event.
pub struct Invocation<'a, H: Host> {
    pub action: &'a ActionNode,
    pub handler_effective_id: &'a str,
    pub event: &'a H::Event,
    pub observer: &'a H::Object,
}

/// Run the outer action of an event handler.
pub fn run_handler_action<'a, H: Host>(
    env: ActionEnvironment<'a, H>,
    stack: &'a mut dyn ContextStack<H>,
    invocation: Invocation<'a, H>,
) -> Result<(), ActionError> {
    let outer_action = invocation.action;
    ActionInterpreter::new(env, stack, invocation).run_action(outer_action)
}

#[derive(Clone, Copy)]
struct Guards<'n> {
    if_condition: Option<&'n str>,
    while_condition: Option<&'n str>,
}

pub struct ActionInterpreter<'a, H: Host> {
    env: ActionEnvironment<'a, H>,
    stack: &'a mut dyn ContextStack<H>,
    outer_action: &'a ActionNode,
    handler_effective_id: String,
    event: &'a H::Event,
    observer: &'a H::Object,
}

impl<'a, H: Host> ActionInterpreter<'a, H> {
    pub fn new(
        env: ActionEnvironment<'a, H>,
        stack: &'a mut dyn ContextStack<H>,
        invocation: Invocation<'a, H>,
    ) -> Self {
        Self {
            env,
            stack,
            outer_action: invocation.action,
            handler_effective_id: invocation.handler_effective_id.to_string(),
            event: invocation.event,
            observer: invocation.observer,
        }
    }

    pub fn container(&self) -> &'a dyn Container<H> {
        self.env.container
    }

    pub fn evaluator(&self) -> &'a dyn Evaluator<H> {
        self.env.evaluator
    }

    pub fn config(&self) -> &'a InterpreterConfig {
        self.env.config
    }

    pub fn context_stack(&self) -> &(dyn ContextStack<H> + 'a) {
        &*self.stack
    }

    pub fn context_stack_mut(&mut self) -> &mut (dyn ContextStack<H> + 'a) {
        &mut *self.stack
    }

    pub fn outer_action(&self) -> &'a ActionNode {
        self.outer_action
    }

    pub fn handler_effective_id(&self) -> &str {
        &self.handler_effective_id
    }

    pub fn event(&self) -> &'a H::Event {
        self.event
    }

    pub fn observer(&self) -> &'a H::Object {
        self.observer
    }

    /// Execute one action: push its iteration source, run it once per item
    /// (or once without `iterate`) and restore the context.
    ///
    /// Failures are returned wrapped with the action's name, location and
    /// iteration.
    pub fn run_action(&mut self, action: &ActionNode) -> Result<(), ActionError> {
        let mut position = IterationPosition::default();
        self.run_action_in_context(action, &mut position)
            .map_err(|err| err.within_action(action, position))
    }

    fn run_action_in_context(
        &mut self,
        action: &ActionNode,
        position: &mut IterationPosition,
    ) -> Result<(), ActionError> {
        let guards = Guards {
            if_condition: action.if_condition(),
            while_condition: action.while_condition(),
        };
        let iterate = action.iterate();

        let source_effective_id = self.source_effective_id(action);
        let spec = BindingSpec::for_action(action, &source_effective_id)
            .with_select(iterate)
            .with_context(action.context())
            .with_model(action.model());

        self.with_binding(&spec, |this| {
            if iterate.is_none() {
                let frame = this.stack.current_frame();
                let overridden = frame.has_overridden_context();
                let context_item = frame.context_item().cloned();
                return this.run_single_iteration(action, guards, overridden, context_item, position);
            }

            // `context` was applied before `iterate`; every iteration now
            // overrides the context with its own item.
            let sequence = this.stack.current_frame().sequence().to_vec();
            for (offset, item) in sequence.into_iter().enumerate() {
                let index = offset + 1;
                position.iterate_index = Some(index);
                this.with_iteration(index, |this| {
                    this.run_single_iteration(action, guards, true, Some(item), position)
                })?;
            }
            position.iterate_index = None;
            Ok(())
        })
    }

    /// Run the action body, repeating while the `while` guard holds.
    fn run_single_iteration(
        &mut self,
        action: &ActionNode,
        guards: Guards<'_>,
        has_overridden_context: bool,
        context_item: Option<H::Item>,
        position: &mut IterationPosition,
    ) -> Result<(), ActionError> {
        let name = action.name();
        let mut while_iteration = 1usize;
        loop {
            let pass = guards.while_condition.map(|_| while_iteration);
            position.while_iteration = pass;
            if let Some(condition) = guards.if_condition
                && !self
                    .evaluate_condition(action, condition, ConditionKind::If, context_item.as_ref())?
                    .passed()
            {
                break;
            }
            if let Some(condition) = guards.while_condition
                && !self
                    .evaluate_condition(action, condition, ConditionKind::While, context_item.as_ref())?
                    .passed()
            {
                break;
            }

            let _span = debug_span!("action", name = %name, while_iteration = pass).entered();
            debug!("executing");

            let registry = self.env.registry;
            let handler =
                registry.lookup(name).ok_or_else(|| ActionError::UnknownAction(name.clone()))?;
            let overridden = if has_overridden_context { context_item.clone() } else { None };

            // Re-evaluated on every pass: the previous pass may have changed
            // what `ref` points to.
            let source_effective_id = self.source_effective_id(action);
            let spec = BindingSpec::for_action(action, &source_effective_id)
                .with_select(action.reference())
                .with_bind(action.bind());
            self.with_binding(&spec, |this| {
                let mut dynamic = DynamicActionContext::new(this, action, overridden);
                handler.execute(&mut dynamic)
            })?;
            debug!("done");

            if guards.while_condition.is_none() {
                break;
            }
            while_iteration += 1;
        }
        position.while_iteration = None;
        Ok(())
    }

    /// Run `body` inside a pushed binding; the binding is popped on every
    /// return path.
    fn with_binding<R>(
        &mut self,
        spec: &BindingSpec<'_>,
        body: impl FnOnce(&mut Self) -> Result<R, ActionError>,
    ) -> Result<R, ActionError> {
        self.stack.push_binding(spec)?;
        let result = body(self);
        self.stack.pop_binding();
        result
    }

    fn with_iteration<R>(
        &mut self,
        index: usize,
        body: impl FnOnce(&mut Self) -> Result<R, ActionError>,
    ) -> Result<R, ActionError> {
        self.stack.push_iteration(index)?;
        let result = body(self);
        self.stack.pop_binding();
        result
    }

    /// Effective id that ids referenced by `action` are resolved against.
    pub fn source_effective_id(&self, action: &ActionNode) -> String {
        ids::related_effective_id(&self.handler_effective_id, action.static_id())
    }

    pub fn action_prefixed_id(&self, action: &ActionNode) -> String {
        format!("{}{}", self.env.container.full_prefix(), action.static_id())
    }

    pub fn action_scope(&self, action: &ActionNode) -> Option<Scope> {
        self.env.container.scope_for_prefixed_id(&self.action_prefixed_id(action))
    }

    pub fn namespace_mapping<'n>(&self, action: &'n ActionNode) -> &'n NamespaceMapping {
        action.namespaces()
    }

    fn function_context(&self, action: &ActionNode) -> FunctionContext {
        FunctionContext::new(self.source_effective_id(action))
            .with_model(self.stack.current_frame().model_id().map(str::to_string))
    }

    /// Evaluate as a string; an empty result yields `""`.
    pub fn evaluate_as_string(
        &self,
        action: &ActionNode,
        sequence: &[H::Item],
        position: usize,
        expression: &str,
    ) -> Result<String, ActionError> {
        let function_context = self.function_context(action);
        let request = self.request(action, sequence, position, expression, &function_context);
        Ok(self.env.evaluator.evaluate_as_string(&request)?.unwrap_or_default())
    }

    pub fn evaluate_keep_items(
        &self,
        action: &ActionNode,
        sequence: &[H::Item],
        position: usize,
        expression: &str,
    ) -> Result<Vec<H::Item>, ActionError> {
        let function_context = self.function_context(action);
        let request = self.request(action, sequence, position, expression, &function_context);
        Ok(self.env.evaluator.evaluate_keep_items(&request)?)
    }

    fn request<'r>(
        &'r self,
        action: &'r ActionNode,
        sequence: &'r [H::Item],
        position: usize,
        expression: &'r str,
        function_context: &'r FunctionContext,
    ) -> EvalRequest<'r, H> {
        EvalRequest {
            sequence,
            position,
            expression,
            namespaces: action.namespaces(),
            variables: self.stack.current_frame().variables(),
            function_context,
            location: action.location(),
        }
    }
}
