//! Type-emitter boundary and the default dispatch-table emitter
//!
//! The generation engine hands an emitter a [`TypeSpec`] — unique type
//! name, parent identity, ordered member requests, constructor replay
//! specifications — and receives back an [`EmittedType`] exposing the
//! uniform instance-creation entry point. The default implementation
//! builds an interpreted dispatch table: one trampoline per member slot.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::contract::{ConstructorBody, ContractDecl, MethodBody};
use crate::definition::DefinitionKind;
use crate::token::{MemberKind, MemberToken};
use crate::value::{TypeIdent, TypeTag};

/// Where a member's calls are routed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberDispatch {
    /// Package the call and forward it to the dispatch handler
    ForwardToHandler,
    /// Call the original implementation directly
    ForwardToBase,
}

/// One member-definition request
pub struct MemberRequest {
    /// The member's token
    pub token: MemberToken,
    /// Routing decision, baked in at generation time
    pub dispatch: MemberDispatch,
    /// The original implementation, when one exists
    pub base_body: Option<MethodBody>,
}

/// One constructor-replay specification
#[derive(Clone)]
pub struct ConstructorSpec {
    /// Parameter shapes in order
    pub params: Vec<TypeTag>,
    /// The original constructor body
    pub body: ConstructorBody,
}

/// Everything an emitter needs to produce one type
pub struct TypeSpec {
    /// Unique synthetic type name
    pub type_name: String,
    /// Identity of the type being extended or implemented
    pub parent: TypeIdent,
    /// Definition variant
    pub kind: DefinitionKind,
    /// Instance field count
    pub field_count: usize,
    /// Ordered member-definition requests
    pub members: Vec<MemberRequest>,
    /// Constructors to replay
    pub constructors: Vec<ConstructorSpec>,
}

/// Emitter failure
#[derive(Debug, Clone, thiserror::Error)]
pub enum EmitError {
    /// The emitter cannot represent the member's shape
    #[error("unsupported member shape: {token}")]
    UnsupportedMember {
        /// The offending token
        token: MemberToken,
    },

    /// Two requests landed on the same member slot
    #[error("duplicate member slot: {name}")]
    DuplicateSlot {
        /// The colliding slot name
        name: String,
    },
}

/// Produces loadable types from type specifications
pub trait TypeEmitter: Send + Sync {
    /// Emit one type
    fn emit(&self, spec: TypeSpec) -> Result<EmittedType, EmitError>;
}

/// Per-slot routing, fixed at generation time
pub(crate) enum Trampoline {
    /// Package token, instance, and arguments; invoke the handler
    Forward {
        /// The member's token
        token: MemberToken,
        /// Original implementation reachable via `proceed`, if any
        base: Option<MethodBody>,
    },
    /// Call the original implementation directly
    Base {
        /// The member's token
        token: MemberToken,
        /// The original implementation
        body: MethodBody,
    },
    /// No implementation exists; raise at call time
    Unimplemented {
        /// The member's token
        token: MemberToken,
    },
}

impl Trampoline {
    pub(crate) fn token(&self) -> &MemberToken {
        match self {
            Trampoline::Forward { token, .. } => token,
            Trampoline::Base { token, .. } => token,
            Trampoline::Unimplemented { token } => token,
        }
    }
}

/// A loadable generated type: the dispatch table plus replayed
/// constructors
pub struct EmittedType {
    type_name: String,
    parent: TypeIdent,
    kind: DefinitionKind,
    field_count: usize,
    /// Trampolines in emission order
    members: Vec<Trampoline>,
    /// Member name to (kind, member index) slots
    index: FxHashMap<Arc<str>, Vec<(MemberKind, usize)>>,
    constructors: Vec<ConstructorSpec>,
}

impl EmittedType {
    /// The synthetic type name
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Identity of the extended/implemented base type
    pub fn parent(&self) -> &TypeIdent {
        &self.parent
    }

    /// Definition variant this type was generated from
    pub fn kind(&self) -> DefinitionKind {
        self.kind
    }

    /// Instance field count
    pub fn field_count(&self) -> usize {
        self.field_count
    }

    /// Member tokens in emission order
    pub fn member_tokens(&self) -> impl Iterator<Item = &MemberToken> {
        self.members.iter().map(Trampoline::token)
    }

    /// Replayed constructor specifications
    pub(crate) fn constructors(&self) -> &[ConstructorSpec] {
        &self.constructors
    }

    /// Look up the trampoline for a member slot
    pub(crate) fn slot(&self, name: &str, kind: MemberKind) -> Option<&Trampoline> {
        self.index
            .get(name)?
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, i)| &self.members[*i])
    }

    /// Whether every member a contract requires has a slot of matching
    /// shape
    pub fn satisfies(&self, contract: &ContractDecl) -> bool {
        contract.member_tokens().iter().all(|required| {
            self.slot(required.name(), required.kind())
                .map(|t| t.token().shape_matches(required))
                .unwrap_or(false)
        })
    }
}

/// The default emitter: an interpreted dispatch table.
///
/// Generic members cannot be represented — a fixed trampoline has no
/// dynamic stand-in for type parameters — and are rejected as
/// [`EmitError::UnsupportedMember`].
pub struct DispatchTableEmitter;

impl TypeEmitter for DispatchTableEmitter {
    fn emit(&self, spec: TypeSpec) -> Result<EmittedType, EmitError> {
        let mut members: Vec<Trampoline> = Vec::with_capacity(spec.members.len());
        let mut index: FxHashMap<Arc<str>, Vec<(MemberKind, usize)>> = FxHashMap::default();

        for request in spec.members {
            if request.token.generic_arity() > 0 {
                return Err(EmitError::UnsupportedMember {
                    token: request.token,
                });
            }

            let (name, kind) = request.token.slot();
            let slots = index.entry(name).or_default();
            if slots.iter().any(|(k, _)| *k == kind) {
                return Err(EmitError::DuplicateSlot {
                    name: request.token.name().to_string(),
                });
            }
            slots.push((kind, members.len()));

            members.push(match request.dispatch {
                MemberDispatch::ForwardToHandler => Trampoline::Forward {
                    token: request.token,
                    base: request.base_body,
                },
                MemberDispatch::ForwardToBase => match request.base_body {
                    Some(body) => Trampoline::Base {
                        token: request.token,
                        body,
                    },
                    None => Trampoline::Unimplemented {
                        token: request.token,
                    },
                },
            });
        }

        Ok(EmittedType {
            type_name: spec.type_name,
            parent: spec.parent,
            kind: spec.kind,
            field_count: spec.field_count,
            members,
            index,
            constructors: spec.constructors,
        })
    }
}
