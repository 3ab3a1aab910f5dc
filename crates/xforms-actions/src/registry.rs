use std::collections::HashMap;

use crate::dynamic::DynamicActionContext;
use crate::error::ActionError;
use crate::host::Host;
use crate::node::QName;

/// Executable behavior of one kind of action.
pub trait ActionHandler<H: Host> {
    fn execute(&self, context: &mut DynamicActionContext<'_, '_, H>) -> Result<(), ActionError>;
}

impl<H, F> ActionHandler<H> for F
where
    H: Host,
    F: Fn(&mut DynamicActionContext<'_, '_, H>) -> Result<(), ActionError>,
{
    fn execute(&self, context: &mut DynamicActionContext<'_, '_, H>) -> Result<(), ActionError> {
        self(context)
    }
}

/// Maps action names to their handlers.
pub trait ActionRegistry<H: Host> {
    fn lookup(&self, name: &QName) -> Option<&dyn ActionHandler<H>>;
}

/// [`ActionRegistry`] backed by a hash map keyed by expanded name.
pub struct HandlerRegistry<H: Host> {
    handlers: HashMap<QName, Box<dyn ActionHandler<H>>>,
}

impl<H: Host> Default for HandlerRegistry<H> {
    fn default() -> Self {
        Self { handlers: HashMap::new() }
    }
}

impl<H: Host> HandlerRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `name`, replacing any previous registration.
    pub fn register(&mut self, name: QName, handler: Box<dyn ActionHandler<H>>) {
        self.handlers.insert(name, handler);
    }

    /// Convenience: register a plain closure.
    pub fn register_fn<F>(&mut self, name: QName, f: F)
    where
        F: 'static + Fn(&mut DynamicActionContext<'_, '_, H>) -> Result<(), ActionError>,
    {
        self.register(name, Box::new(f));
    }

    /// Convenience: register a closure in a namespace using ns URI and local name.
    pub fn register_ns<F>(&mut self, ns_uri: &str, local: &str, f: F)
    where
        F: 'static + Fn(&mut DynamicActionContext<'_, '_, H>) -> Result<(), ActionError>,
    {
        self.register_fn(QName::ns(ns_uri, "", local), f);
    }

    pub fn contains(&self, name: &QName) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<H: Host> ActionRegistry<H> for HandlerRegistry<H> {
    fn lookup(&self, name: &QName) -> Option<&dyn ActionHandler<H>> {
        self.handlers.get(name).map(|handler| handler.as_ref())
    }
}
