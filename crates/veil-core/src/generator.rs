//! Generation engine
//!
//! Walks a definition's member plan, consults the interception filter, and
//! drives the type emitter to produce a [`ProxyFactory`]. Each engine owns
//! its own monotonic type-id counter, so synthetic names stay unique for
//! the engine's lifetime without any process-wide state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::definition::ProxyDefinition;
use crate::emitter::{EmitError, MemberDispatch, MemberRequest, TypeEmitter, TypeSpec};
use crate::factory::ProxyFactory;
use crate::filter::InterceptionFilter;
use crate::{ProxyError, ProxyResult};

/// Namespace prefix for synthetic type names
const DYNAMIC_NAMESPACE: &str = "veil.dynamic";

/// Turns proxy definitions into proxy factories
pub struct ProxyGenerator {
    /// The next type identifier
    next_type_id: AtomicU64,
}

impl ProxyGenerator {
    /// Create a new engine with a fresh type-id counter
    pub fn new() -> Self {
        Self {
            next_type_id: AtomicU64::new(0),
        }
    }

    /// Generate a proxy factory for the definition.
    ///
    /// The filter's verdicts are baked into the emitted type; emitter
    /// failures surface as [`ProxyError::UnsupportedMember`] naming the
    /// offending token and are structural — retrying the same definition
    /// fails identically.
    pub fn generate(
        &self,
        definition: &ProxyDefinition,
        filter: &dyn InterceptionFilter,
        emitter: &dyn TypeEmitter,
    ) -> ProxyResult<ProxyFactory> {
        let plan = definition.member_plan()?;
        let kind = definition.kind();

        let type_id = self.next_type_id.fetch_add(1, Ordering::Relaxed);
        let type_name = format!(
            "{}.{}${:x}",
            DYNAMIC_NAMESPACE,
            definition.base_name(),
            type_id
        );

        let mut members = Vec::with_capacity(plan.overridable.len() + plan.passthrough.len());
        for member in plan.overridable {
            let dispatch = if filter.should_intercept(&member.token, kind) {
                MemberDispatch::ForwardToHandler
            } else {
                MemberDispatch::ForwardToBase
            };
            members.push(MemberRequest {
                token: member.token,
                dispatch,
                base_body: member.base_body,
            });
        }
        // Mirrored base members bypass the filter entirely
        for member in plan.passthrough {
            members.push(MemberRequest {
                token: member.token,
                dispatch: MemberDispatch::ForwardToBase,
                base_body: member.base_body,
            });
        }

        let spec = TypeSpec {
            type_name,
            parent: definition.base_ident().clone(),
            kind,
            field_count: plan.field_count,
            members,
            constructors: plan.constructors,
        };

        let emitted = emitter.emit(spec).map_err(|e| match e {
            EmitError::UnsupportedMember { token } => ProxyError::UnsupportedMember { token },
            EmitError::DuplicateSlot { name } => ProxyError::InvalidArgument(format!(
                "emitter rejected duplicate member slot {}",
                name
            )),
        })?;

        Ok(ProxyFactory::new(Arc::new(emitted)))
    }
}

impl Default for ProxyGenerator {
    fn default() -> Self {
        Self::new()
    }
}
