//! Context stack driven by an [`Evaluator`].

use std::collections::HashMap;

use tracing::warn;

use crate::context::{BindingError, BindingFrame, BindingSpec, ContextStack};
use crate::eval::{EvalRequest, Evaluator, FunctionContext};
use crate::host::Host;

struct ModelEntry<I> {
    root: Vec<I>,
}

struct BindEntry {
    model_id: String,
    reference: String,
}

/// Reference [`ContextStack`]: resolves `model`, `context`, `bind` and
/// `ref`/`iterate` by evaluating them through the given evaluator.
pub struct BindingStack<'e, H: Host> {
    evaluator: &'e dyn Evaluator<H>,
    frames: Vec<BindingFrame<H::Item>>,
    models: HashMap<String, ModelEntry<H::Item>>,
    binds: HashMap<String, BindEntry>,
}

impl<'e, H: Host> BindingStack<'e, H> {
    pub fn new(evaluator: &'e dyn Evaluator<H>, root: BindingFrame<H::Item>) -> Self {
        Self { evaluator, frames: vec![root], models: HashMap::new(), binds: HashMap::new() }
    }

    /// Register a model whose default evaluation context is `root`.
    pub fn with_model(mut self, model_id: impl Into<String>, root: Vec<H::Item>) -> Self {
        self.models.insert(model_id.into(), ModelEntry { root });
        self
    }

    /// Register a bind. Its `reference` is evaluated against the model root
    /// each time the bind is pushed.
    pub fn with_bind(
        mut self,
        bind_id: impl Into<String>,
        model_id: impl Into<String>,
        reference: impl Into<String>,
    ) -> Self {
        self.binds.insert(
            bind_id.into(),
            BindEntry { model_id: model_id.into(), reference: reference.into() },
        );
        self
    }

    fn model_root(&self, model_id: &str) -> Result<&[H::Item], BindingError> {
        self.models
            .get(model_id)
            .map(|model| model.root.as_slice())
            .ok_or_else(|| BindingError::UnknownModel(model_id.to_string()))
    }

    /// Evaluate against `sequence` at `position`; an absent context item
    /// yields an empty result without calling the evaluator.
    fn select(
        &self,
        sequence: &[H::Item],
        position: usize,
        expression: &str,
        spec: &BindingSpec<'_>,
        function_context: &FunctionContext,
    ) -> Result<Vec<H::Item>, BindingError> {
        if position == 0 || position > sequence.len() {
            return Ok(Vec::new());
        }
        let request = EvalRequest::<H> {
            sequence,
            position,
            expression,
            namespaces: spec.namespaces,
            variables: self.current_frame().variables(),
            function_context,
            location: spec.location,
        };
        Ok(self.evaluator.evaluate_keep_items(&request)?)
    }
}

impl<H: Host> ContextStack<H> for BindingStack<'_, H> {
    fn push_binding(&mut self, spec: &BindingSpec<'_>) -> Result<(), BindingError> {
        let base = self.current_frame();

        let (mut sequence, mut position, model_id) = match spec.model {
            Some(model_id) => {
                let root = self.model_root(model_id)?.to_vec();
                let position = usize::from(!root.is_empty());
                (root, position, Some(model_id.to_string()))
            }
            None => (base.sequence().to_vec(), base.position(), base.model_id().map(str::to_string)),
        };
        let function_context =
            FunctionContext::new(spec.source_effective_id).with_model(model_id.clone());

        let overridden = spec.context.is_some();
        if let Some(context) = spec.context {
            sequence = self.select(&sequence, position, context, spec, &function_context)?;
            position = usize::from(!sequence.is_empty());
        }
        let context_item = position.checked_sub(1).and_then(|index| sequence.get(index)).cloned();

        let (sequence, position) = if let Some(bind_id) = spec.bind {
            let bind = self
                .binds
                .get(bind_id)
                .ok_or_else(|| BindingError::UnknownBind(bind_id.to_string()))?;
            let root = self.model_root(&bind.model_id)?;
            let bound = self.select(root, 1, &bind.reference, spec, &function_context)?;
            let position = usize::from(!bound.is_empty());
            (bound, position)
        } else if let Some(select) = spec.select {
            let selected = self.select(&sequence, position, select, spec, &function_context)?;
            let position = usize::from(!selected.is_empty());
            (selected, position)
        } else {
            (sequence, position)
        };

        let variables = self.current_frame().shared_variables();
        self.frames.push(
            BindingFrame::new(sequence, position, context_item)
                .with_variables(variables)
                .with_overridden_context(overridden)
                .with_model(model_id),
        );
        Ok(())
    }

    fn push_iteration(&mut self, index: usize) -> Result<(), BindingError> {
        let base = self.current_frame();
        let len = base.sequence().len();
        if index == 0 || index > len {
            return Err(BindingError::IterationOutOfRange { index, len });
        }
        let sequence = base.sequence().to_vec();
        let context_item = sequence.get(index - 1).cloned();
        let frame = BindingFrame::new(sequence, index, context_item)
            .with_variables(base.shared_variables())
            .with_model(base.model_id().map(str::to_string));
        self.frames.push(frame);
        Ok(())
    }

    fn pop_binding(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        } else {
            warn!("attempt to pop the root binding frame ignored");
        }
    }

    fn current_frame(&self) -> &BindingFrame<H::Item> {
        // The root frame is never popped.
        &self.frames[self.frames.len() - 1]
    }

    fn depth(&self) -> usize {
        self.frames.len()
    }
}
