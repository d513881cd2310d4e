//! Reconciliation context.
//!
//! One context is built per process and passed by reference into every
//! operation. It carries the API backend and the cancellation signal; there
//! is no global client.

use crate::desired::Locator;
use crate::diagnostics::{OpResult, failed};
use cmakit::backend::{Backend, ContentTypes, Entries, Environments, Webhooks};
use cmakit::{CallContext, Environment};

/// A resolved environment plus the call context, handed to core logic.
pub struct Scope<'a> {
    pub call: &'a CallContext,
    pub env: Environment,
}

/// Context passed to every reconciliation operation
pub struct ReconcileContext<'a> {
    backend: &'a dyn Backend,
    call: CallContext,
}

impl<'a> ReconcileContext<'a> {
    /// Create a context with a fresh cancellation signal
    pub fn new(backend: &'a dyn Backend) -> Self {
        Self::with_call(backend, CallContext::new())
    }

    /// Create a context sharing an existing cancellation signal
    pub fn with_call(backend: &'a dyn Backend, call: CallContext) -> Self {
        Self { backend, call }
    }

    pub fn call(&self) -> &CallContext {
        &self.call
    }

    pub fn environments(&self) -> &'a dyn Environments {
        self.backend.environments()
    }

    pub fn content_types(&self) -> &'a dyn ContentTypes {
        self.backend.content_types()
    }

    pub fn entries(&self) -> &'a dyn Entries {
        self.backend.entries()
    }

    pub fn webhooks(&self) -> &'a dyn Webhooks {
        self.backend.webhooks()
    }

    /// Resolve the environment of `locator` once and run `op` inside it.
    ///
    /// Lookup failures (including an unknown environment) become a single
    /// error diagnostic and `op` is not run.
    pub fn with_environment<T>(
        &self,
        locator: &Locator,
        op: impl FnOnce(&Scope<'_>) -> OpResult<T>,
    ) -> OpResult<T> {
        let env_id = locator
            .env_id()
            .map_err(failed(format!("resolve environment of {locator}")))?;
        let env = self
            .environments()
            .get(&self.call, &locator.space_id, env_id)
            .map_err(failed(format!("resolve environment {locator}")))?;
        log::trace!("Resolved environment {}/{}", env.space_id(), env.id());

        op(&Scope {
            call: &self.call,
            env,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::backend;
    use cmakit::backend::memory::Op;

    #[test]
    fn test_with_environment_resolves_once() {
        let backend = backend();
        let ctx = ReconcileContext::new(&backend);

        let id = ctx
            .with_environment(&Locator::environment("sp1", "master"), |scope| {
                Ok(scope.env.id().to_string())
            })
            .unwrap();
        assert_eq!(id, "master");
        assert_eq!(backend.ops(), [Op::GetEnvironment]);
    }

    #[test]
    fn test_unknown_environment_skips_op() {
        let backend = backend();
        let ctx = ReconcileContext::new(&backend);

        let result: OpResult<()> = ctx
            .with_environment(&Locator::environment("sp1", "staging"), |_| {
                panic!("op must not run")
            });
        let diags = result.unwrap_err();
        assert_eq!(diags.len(), 1);
        assert!(diags.has_errors());
    }

    #[test]
    fn test_missing_environment_id() {
        let backend = backend();
        let ctx = ReconcileContext::new(&backend);

        let result: OpResult<()> = ctx.with_environment(&Locator::space("sp1"), |_| Ok(()));
        assert!(result.is_err());
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_cancelled_context() {
        let backend = backend();
        let call = CallContext::new();
        call.cancel();
        let ctx = ReconcileContext::with_call(&backend, call);

        let result: OpResult<()> =
            ctx.with_environment(&Locator::environment("sp1", "master"), |_| Ok(()));
        let diags = result.unwrap_err();
        assert_eq!(diags.iter().next().unwrap().detail, "operation cancelled");
        assert!(backend.calls().is_empty());
    }
}
