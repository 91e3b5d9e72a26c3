//! Proxy definitions
//!
//! A [`ProxyDefinition`] normalizes a (base target, additional contracts)
//! pair into one of three variants and derives the ordered member plan the
//! generation engine consumes. Definitions are immutable, constructed fresh
//! per request, and serve as the structural cache key: equality and hashing
//! cover the base identity and the *set* of contract identities only —
//! contract order, the derived plan, and the variant never participate.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::contract::{
    CallableDecl, ClassDecl, ConstructorBody, ContractDecl, MethodBody,
};
use crate::emitter::ConstructorSpec;
use crate::token::{MemberKind, MemberToken};
use crate::value::TypeIdent;
use crate::{ProxyError, ProxyResult};

/// The base target a proxy is requested for
#[derive(Clone)]
pub enum TargetType {
    /// A stateless contract
    Contract(Arc<ContractDecl>),
    /// An extensible class
    Class(Arc<ClassDecl>),
    /// A single-method callable signature
    Callable(Arc<CallableDecl>),
}

impl TargetType {
    /// The base type's identity
    pub fn ident(&self) -> &TypeIdent {
        match self {
            TargetType::Contract(c) => c.ident(),
            TargetType::Class(c) => c.ident(),
            TargetType::Callable(c) => c.ident(),
        }
    }

    /// The base type's display name
    pub fn name(&self) -> &str {
        self.ident().name()
    }
}

impl fmt::Debug for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetType::Contract(c) => write!(f, "Contract({})", c.name()),
            TargetType::Class(c) => write!(f, "Class({})", c.name()),
            TargetType::Callable(c) => write!(f, "Callable({})", c.name()),
        }
    }
}

/// Definition variant, a pure function of the base target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefinitionKind {
    /// Base is a stateless contract
    Interface,
    /// Base is an extensible class with replayed constructors
    Class,
    /// Base is a single-method callable signature
    Callable,
}

/// A member the generation engine must consider
pub(crate) struct PlannedMember {
    /// The member's token
    pub token: MemberToken,
    /// The original implementation backing the slot, if any
    pub base_body: Option<MethodBody>,
}

/// The derived generation input for one definition
pub(crate) struct MemberPlan {
    /// Members eligible for interception, in declaration order
    pub overridable: Vec<PlannedMember>,
    /// Non-overridable base members mirrored as forward-to-base slots
    pub passthrough: Vec<PlannedMember>,
    /// Constructors to replay
    pub constructors: Vec<ConstructorSpec>,
    /// Instance field count
    pub field_count: usize,
}

/// A normalized (base target, contract set) pair
pub struct ProxyDefinition {
    base: TargetType,
    contracts: Vec<Arc<ContractDecl>>,
}

impl ProxyDefinition {
    /// Normalize a base target and additional contracts into a definition.
    ///
    /// Contracts are deduplicated by identity; a callable base admits no
    /// additional contracts.
    pub fn new(base: TargetType, contracts: &[Arc<ContractDecl>]) -> ProxyResult<Self> {
        if matches!(base, TargetType::Callable(_)) && !contracts.is_empty() {
            return Err(ProxyError::InvalidArgument(format!(
                "callable target {} admits no additional contracts",
                base.name()
            )));
        }

        let mut deduped: Vec<Arc<ContractDecl>> = Vec::with_capacity(contracts.len());
        for contract in contracts {
            if !deduped.iter().any(|c| c.ident() == contract.ident()) {
                deduped.push(contract.clone());
            }
        }

        Ok(Self {
            base,
            contracts: deduped,
        })
    }

    /// The definition variant
    pub fn kind(&self) -> DefinitionKind {
        match self.base {
            TargetType::Contract(_) => DefinitionKind::Interface,
            TargetType::Class(_) => DefinitionKind::Class,
            TargetType::Callable(_) => DefinitionKind::Callable,
        }
    }

    /// The base target
    pub fn base(&self) -> &TargetType {
        &self.base
    }

    /// The base type's identity
    pub fn base_ident(&self) -> &TypeIdent {
        self.base.ident()
    }

    /// The base type's display name
    pub fn base_name(&self) -> &str {
        self.base.name()
    }

    /// The deduplicated additional contracts, in first-seen order
    pub fn contracts(&self) -> &[Arc<ContractDecl>] {
        &self.contracts
    }

    /// Derive the ordered member plan.
    ///
    /// Members from the base and every contract merge by slot (name +
    /// kind): identical shapes collapse into one overridable slot keeping
    /// the first implementation seen; incompatible shapes are a
    /// [`ProxyError::Conflict`]. A class with nothing to override and no
    /// contracts to implement is [`ProxyError::NotProxyable`].
    pub(crate) fn member_plan(&self) -> ProxyResult<MemberPlan> {
        let mut merger = SlotMerger::default();

        match &self.base {
            TargetType::Contract(contract) => {
                for member in contract.members() {
                    for (token, body) in member.expand() {
                        merger.merge(token, body)?;
                    }
                }
                self.merge_contracts(&mut merger)?;

                Ok(MemberPlan {
                    overridable: merger.finish(),
                    passthrough: Vec::new(),
                    constructors: vec![default_constructor(0)],
                    field_count: 0,
                })
            }
            TargetType::Class(class) => {
                let mut passthrough: Vec<PlannedMember> = Vec::new();
                for method in class.methods() {
                    if method.is_static {
                        continue;
                    }
                    let token = MemberToken::method(&method.sig);
                    if method.is_overridable() && !class.is_sealed() {
                        merger.merge(token, Some(method.body.clone()))?;
                    } else {
                        passthrough.push(PlannedMember {
                            token,
                            base_body: Some(method.body.clone()),
                        });
                    }
                }
                self.merge_contracts(&mut merger)?;

                // A contract slot shadowing a non-overridable base member
                // of the same shape takes the base body and becomes the
                // overridable slot.
                let mut kept = Vec::with_capacity(passthrough.len());
                for p in passthrough {
                    match merger.index.get(&p.token.slot()).copied() {
                        Some(i) => {
                            let planned = &mut merger.members[i];
                            if !planned.token.shape_matches(&p.token) {
                                return Err(ProxyError::Conflict {
                                    member: p.token.name().to_string(),
                                    first: planned.token.to_string(),
                                    second: p.token.to_string(),
                                });
                            }
                            if planned.base_body.is_none() {
                                planned.base_body = p.base_body;
                            }
                        }
                        None => kept.push(p),
                    }
                }
                let passthrough = kept;

                if merger.members.is_empty() && self.contracts.is_empty() {
                    return Err(ProxyError::NotProxyable {
                        type_name: class.name().to_string(),
                    });
                }

                let constructors = class
                    .constructors()
                    .iter()
                    .map(|c| ConstructorSpec {
                        params: c.params.clone(),
                        body: c.body.clone(),
                    })
                    .collect();

                Ok(MemberPlan {
                    overridable: merger.finish(),
                    passthrough,
                    constructors,
                    field_count: class.field_count(),
                })
            }
            TargetType::Callable(callable) => {
                merger.merge(MemberToken::method(callable.sig()), None)?;
                Ok(MemberPlan {
                    overridable: merger.finish(),
                    passthrough: Vec::new(),
                    constructors: vec![default_constructor(0)],
                    field_count: 0,
                })
            }
        }
    }

    fn merge_contracts(&self, merger: &mut SlotMerger) -> ProxyResult<()> {
        for contract in &self.contracts {
            for member in contract.members() {
                for (token, body) in member.expand() {
                    merger.merge(token, body)?;
                }
            }
        }
        Ok(())
    }
}

impl PartialEq for ProxyDefinition {
    fn eq(&self, other: &Self) -> bool {
        if self.base_ident() != other.base_ident() {
            return false;
        }
        if self.contracts.len() != other.contracts.len() {
            return false;
        }
        self.contracts.iter().all(|c| {
            other
                .contracts
                .iter()
                .any(|o| o.ident() == c.ident())
        })
    }
}

impl Eq for ProxyDefinition {}

impl Hash for ProxyDefinition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.base_ident().hash(state);
        // Order-independent over the contract set
        let mut ids: Vec<u64> = self.contracts.iter().map(|c| c.ident().id()).collect();
        ids.sort_unstable();
        for id in ids {
            id.hash(state);
        }
    }
}

impl Clone for ProxyDefinition {
    fn clone(&self) -> Self {
        Self {
            base: self.base.clone(),
            contracts: self.contracts.clone(),
        }
    }
}

impl fmt::Debug for ProxyDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let contracts: Vec<&str> = self.contracts.iter().map(|c| c.name()).collect();
        f.debug_struct("ProxyDefinition")
            .field("base", &self.base)
            .field("contracts", &contracts)
            .finish()
    }
}

/// Slot-keyed member merging with conflict detection
#[derive(Default)]
struct SlotMerger {
    members: Vec<PlannedMember>,
    index: FxHashMap<(Arc<str>, MemberKind), usize>,
}

impl SlotMerger {
    fn merge(&mut self, token: MemberToken, base_body: Option<MethodBody>) -> ProxyResult<()> {
        match self.index.get(&token.slot()) {
            Some(&i) => {
                let existing = &mut self.members[i];
                if !existing.token.shape_matches(&token) {
                    return Err(ProxyError::Conflict {
                        member: token.name().to_string(),
                        first: existing.token.to_string(),
                        second: token.to_string(),
                    });
                }
                if existing.base_body.is_none() {
                    existing.base_body = base_body;
                }
                Ok(())
            }
            None => {
                self.index.insert(token.slot(), self.members.len());
                self.members.push(PlannedMember { token, base_body });
                Ok(())
            }
        }
    }

    fn finish(self) -> Vec<PlannedMember> {
        self.members
    }
}

fn default_constructor(field_count: usize) -> ConstructorSpec {
    ConstructorSpec {
        params: Vec::new(),
        body: default_constructor_body(field_count),
    }
}

fn default_constructor_body(field_count: usize) -> ConstructorBody {
    Arc::new(move |_args| Ok(vec![crate::value::Value::Null; field_count]))
}
