//! Advice traits
//!
//! One unit of cross-cutting behavior takes one of four shapes: around an
//! invocation, before it, after it returns, or after it throws. Closures
//! of the matching signature implement each trait directly.

use std::sync::Arc;

use veil_core::{CallResult, Fault, Invocation, Value};

/// Wraps the rest of the chain; decides if and when to proceed
pub trait AroundAdvice: Send + Sync {
    /// Handle the invocation; `proceed` runs the rest of the chain down
    /// to the original implementation
    fn invoke(&self, invocation: &Invocation<'_>, proceed: &dyn Fn() -> CallResult) -> CallResult;
}

/// Runs immediately before the innermost call; a fault aborts the call
pub trait BeforeAdvice: Send + Sync {
    /// Inspect the invocation before the innermost call runs
    fn before(&self, invocation: &Invocation<'_>) -> Result<(), Fault>;
}

/// Runs as the call unwinds successfully; a fault replaces the result
pub trait AfterReturningAdvice: Send + Sync {
    /// Observe the successful result
    fn after_returning(&self, invocation: &Invocation<'_>, result: &Value) -> Result<(), Fault>;
}

/// Observes faults as the call unwinds; the fault propagates unchanged
pub trait AfterThrowingAdvice: Send + Sync {
    /// Observe the fault
    fn after_throwing(&self, invocation: &Invocation<'_>, fault: &Fault);
}

impl<F> AroundAdvice for F
where
    F: Fn(&Invocation<'_>, &dyn Fn() -> CallResult) -> CallResult + Send + Sync,
{
    fn invoke(&self, invocation: &Invocation<'_>, proceed: &dyn Fn() -> CallResult) -> CallResult {
        self(invocation, proceed)
    }
}

impl<F> BeforeAdvice for F
where
    F: Fn(&Invocation<'_>) -> Result<(), Fault> + Send + Sync,
{
    fn before(&self, invocation: &Invocation<'_>) -> Result<(), Fault> {
        self(invocation)
    }
}

impl<F> AfterReturningAdvice for F
where
    F: Fn(&Invocation<'_>, &Value) -> Result<(), Fault> + Send + Sync,
{
    fn after_returning(&self, invocation: &Invocation<'_>, result: &Value) -> Result<(), Fault> {
        self(invocation, result)
    }
}

impl<F> AfterThrowingAdvice for F
where
    F: Fn(&Invocation<'_>, &Fault) + Send + Sync,
{
    fn after_throwing(&self, invocation: &Invocation<'_>, fault: &Fault) {
        self(invocation, fault)
    }
}

/// One unit of cross-cutting behavior
#[derive(Clone)]
pub enum Advice {
    /// Around-invocation advice
    Around(Arc<dyn AroundAdvice>),
    /// Before-invocation advice
    Before(Arc<dyn BeforeAdvice>),
    /// After-returning advice
    AfterReturning(Arc<dyn AfterReturningAdvice>),
    /// After-throwing advice
    AfterThrowing(Arc<dyn AfterThrowingAdvice>),
}

impl Advice {
    /// Wrap around-invocation advice
    pub fn around(advice: impl AroundAdvice + 'static) -> Self {
        Advice::Around(Arc::new(advice))
    }

    /// Wrap before-invocation advice
    pub fn before(advice: impl BeforeAdvice + 'static) -> Self {
        Advice::Before(Arc::new(advice))
    }

    /// Wrap after-returning advice
    pub fn after_returning(advice: impl AfterReturningAdvice + 'static) -> Self {
        Advice::AfterReturning(Arc::new(advice))
    }

    /// Wrap after-throwing advice
    pub fn after_throwing(advice: impl AfterThrowingAdvice + 'static) -> Self {
        Advice::AfterThrowing(Arc::new(advice))
    }
}
