//! Member tokens — stable identity keys for method-shaped members
//!
//! Every dispatchable member is method-shaped: properties expand into
//! get/set accessor tokens and events into add/remove tokens. A token is
//! both the generation-time deduplication key and the runtime dispatch key
//! handed to the handler; it never exposes emitter internals.

use std::fmt;
use std::sync::Arc;

use crate::contract::MethodSig;
use crate::value::TypeTag;

/// The shape category of a member token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// Ordinary method
    Method,
    /// Property read accessor
    PropertyGet,
    /// Property write accessor
    PropertySet,
    /// Event listener registration
    EventAdd,
    /// Event listener removal
    EventRemove,
}

/// Identity of a method-shaped member.
///
/// Two tokens are equal iff kind, name, parameter shapes (in order), return
/// shape, and generic arity are pairwise equal. The name and kind are part
/// of the identity: they are the member's constant across declaring and
/// overriding contexts, and the handler needs them to tell members apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberToken {
    kind: MemberKind,
    name: Arc<str>,
    params: Vec<TypeTag>,
    ret: TypeTag,
    generic_arity: usize,
}

impl MemberToken {
    /// Token for an ordinary method signature
    pub fn method(sig: &MethodSig) -> Self {
        Self {
            kind: MemberKind::Method,
            name: sig.name.clone(),
            params: sig.params.clone(),
            ret: sig.ret.clone(),
            generic_arity: sig.generic_arity,
        }
    }

    /// Token for a property read accessor: `() -> ty`
    pub fn property_get(name: &Arc<str>, ty: &TypeTag) -> Self {
        Self {
            kind: MemberKind::PropertyGet,
            name: name.clone(),
            params: Vec::new(),
            ret: ty.clone(),
            generic_arity: 0,
        }
    }

    /// Token for a property write accessor: `(ty) -> void`
    pub fn property_set(name: &Arc<str>, ty: &TypeTag) -> Self {
        Self {
            kind: MemberKind::PropertySet,
            name: name.clone(),
            params: vec![ty.clone()],
            ret: TypeTag::Void,
            generic_arity: 0,
        }
    }

    /// Token for an event listener registration: `(callable) -> void`
    pub fn event_add(name: &Arc<str>) -> Self {
        Self {
            kind: MemberKind::EventAdd,
            name: name.clone(),
            params: vec![TypeTag::Callable],
            ret: TypeTag::Void,
            generic_arity: 0,
        }
    }

    /// Token for an event listener removal: `(callable) -> void`
    pub fn event_remove(name: &Arc<str>) -> Self {
        Self {
            kind: MemberKind::EventRemove,
            name: name.clone(),
            params: vec![TypeTag::Callable],
            ret: TypeTag::Void,
            generic_arity: 0,
        }
    }

    /// The member kind
    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    /// The member name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter shapes in declaration order
    pub fn params(&self) -> &[TypeTag] {
        &self.params
    }

    /// Declared return shape
    pub fn ret(&self) -> &TypeTag {
        &self.ret
    }

    /// Number of generic parameters (zero for all concrete members)
    pub fn generic_arity(&self) -> usize {
        self.generic_arity
    }

    /// Dispatch-table slot key: (name, kind)
    pub(crate) fn slot(&self) -> (Arc<str>, MemberKind) {
        (self.name.clone(), self.kind)
    }

    /// Whether two tokens for the same slot carry the same shape
    /// (parameters, return, generic arity)
    pub fn shape_matches(&self, other: &Self) -> bool {
        self.params == other.params
            && self.ret == other.ret
            && self.generic_arity == other.generic_arity
    }
}

impl fmt::Display for MemberToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            MemberKind::Method => {
                write!(f, "{}", self.name)?;
                if self.generic_arity > 0 {
                    write!(f, "<{}>", self.generic_arity)?;
                }
                write!(f, "(")?;
                for (i, p) in self.params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ") -> {}", self.ret)
            }
            MemberKind::PropertyGet => write!(f, "get {}: {}", self.name, self.ret),
            MemberKind::PropertySet => write!(f, "set {}: {}", self.name, self.params[0]),
            MemberKind::EventAdd => write!(f, "add {}", self.name),
            MemberKind::EventRemove => write!(f, "remove {}", self.name),
        }
    }
}
