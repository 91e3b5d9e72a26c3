//! Advice pipeline composition
//!
//! Composes an ordered advisor chain into a single dispatch handler. For
//! a given member the chain filters to advisors whose pointcut matches,
//! then executes around-advice outermost-first (each wrapping the next),
//! before-advice in order immediately prior to the innermost call, and
//! after-returning / after-throwing advice in reverse order as the call
//! unwinds. When nothing matches, dispatch falls through to the member's
//! original implementation — the transparent passthrough default.
//!
//! Scopes resolve once per proxy instantiation, never per call: `bind`
//! produces the handler for exactly one instance, materializing every
//! per-instance advisor's fresh advice.

use std::sync::Arc;

use veil_core::{
    CallResult, DispatchHandler, Invocation, ProxyFactory, ProxyHandle, ProxyResult, Value,
};

use crate::advice::{
    Advice, AfterReturningAdvice, AfterThrowingAdvice, AroundAdvice, BeforeAdvice,
};
use crate::advisor::{Advisor, Pointcut};

/// An ordered advisor chain, composable into dispatch handlers
pub struct AdvicePipeline {
    advisors: Vec<Advisor>,
}

impl AdvicePipeline {
    /// Compose advisors into a pipeline; order is execution order
    pub fn compose(advisors: Vec<Advisor>) -> Self {
        Self { advisors }
    }

    /// The composed advisors, in order
    pub fn advisors(&self) -> &[Advisor] {
        &self.advisors
    }

    /// Resolve every advisor's scope for one proxy instance and return
    /// the bound dispatch handler.
    ///
    /// Call once per instantiation: per-instance advisors mint fresh
    /// advice here, closed over the instance the handler is given to.
    pub fn bind(&self) -> Arc<BoundPipeline> {
        let entries = self
            .advisors
            .iter()
            .map(|advisor| BoundAdvisor {
                pointcut: advisor.pointcut().clone(),
                advice: advisor.resolve(),
            })
            .collect();
        Arc::new(BoundPipeline { entries })
    }

    /// Instantiate a proxy from the factory with a freshly bound
    /// pipeline handler
    pub fn instantiate(&self, factory: &ProxyFactory, args: &[Value]) -> ProxyResult<ProxyHandle> {
        factory.instantiate(self.bind(), args)
    }
}

struct BoundAdvisor {
    pointcut: Pointcut,
    advice: Advice,
}

/// A pipeline with every scope resolved, serving one proxy instance
pub struct BoundPipeline {
    entries: Vec<BoundAdvisor>,
}

/// The non-around stages of a matched chain, in declaration order
struct ChainStages<'a> {
    befores: Vec<&'a Arc<dyn BeforeAdvice>>,
    after_returning: Vec<&'a Arc<dyn AfterReturningAdvice>>,
    after_throwing: Vec<&'a Arc<dyn AfterThrowingAdvice>>,
}

impl DispatchHandler for BoundPipeline {
    fn invoke(&self, invocation: &Invocation<'_>) -> CallResult {
        let mut arounds: Vec<&Arc<dyn AroundAdvice>> = Vec::new();
        let mut stages = ChainStages {
            befores: Vec::new(),
            after_returning: Vec::new(),
            after_throwing: Vec::new(),
        };

        for entry in &self.entries {
            if !entry.pointcut.matches(invocation.token()) {
                continue;
            }
            match &entry.advice {
                Advice::Around(a) => arounds.push(a),
                Advice::Before(a) => stages.befores.push(a),
                Advice::AfterReturning(a) => stages.after_returning.push(a),
                Advice::AfterThrowing(a) => stages.after_throwing.push(a),
            }
        }

        if arounds.is_empty()
            && stages.befores.is_empty()
            && stages.after_returning.is_empty()
            && stages.after_throwing.is_empty()
        {
            // Transparent passthrough
            return invocation.proceed();
        }

        run_chain(invocation, &arounds, &stages)
    }
}

fn run_chain(
    invocation: &Invocation<'_>,
    arounds: &[&Arc<dyn AroundAdvice>],
    stages: &ChainStages<'_>,
) -> CallResult {
    match arounds.split_first() {
        Some((outermost, rest)) => {
            outermost.invoke(invocation, &|| run_chain(invocation, rest, stages))
        }
        None => {
            for advice in &stages.befores {
                advice.before(invocation)?;
            }
            match invocation.proceed() {
                Ok(value) => {
                    for advice in stages.after_returning.iter().rev() {
                        advice.after_returning(invocation, &value)?;
                    }
                    Ok(value)
                }
                Err(fault) => {
                    for advice in stages.after_throwing.iter().rev() {
                        advice.after_throwing(invocation, &fault);
                    }
                    Err(fault)
                }
            }
        }
    }
}
