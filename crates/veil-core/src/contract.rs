//! Runtime type descriptors
//!
//! Proxy targets are declared at run time as value-level descriptors:
//! [`ContractDecl`] for stateless contracts, [`ClassDecl`] for extensible
//! classes with fields and constructors, and [`CallableDecl`] for
//! single-method signatures. Member and constructor bodies are plain
//! closures over the instance's field slice, the dynamic analogue of a
//! compiled function id in a vtable.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::handler::{CallResult, Fault};
use crate::token::MemberToken;
use crate::value::{TypeIdent, TypeTag, Value};
use crate::{ProxyError, ProxyResult};

/// Implementation of a member: receives the instance fields and the call
/// arguments, produces a value or a fault
pub type MethodBody = Arc<dyn Fn(&mut [Value], &[Value]) -> CallResult + Send + Sync>;

/// Implementation of a constructor: receives the arguments, produces the
/// initial field values or a fault
pub type ConstructorBody = Arc<dyn Fn(&[Value]) -> Result<Vec<Value>, Fault> + Send + Sync>;

/// Signature of a method-shaped member
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSig {
    /// Member name
    pub name: Arc<str>,
    /// Parameter shapes in order
    pub params: Vec<TypeTag>,
    /// Return shape
    pub ret: TypeTag,
    /// Number of generic parameters
    pub generic_arity: usize,
}

impl MethodSig {
    /// Create a concrete (non-generic) signature
    pub fn new(name: &str, params: Vec<TypeTag>, ret: TypeTag) -> Self {
        Self {
            name: Arc::from(name),
            params,
            ret,
            generic_arity: 0,
        }
    }

    /// Set the generic arity
    pub fn with_generic_arity(mut self, arity: usize) -> Self {
        self.generic_arity = arity;
        self
    }
}

/// One declared member of a contract
#[derive(Clone)]
pub enum ContractMember {
    /// A method; `default_body` is present for non-abstract members
    Method {
        /// The signature
        sig: MethodSig,
        /// Default implementation, if the contract supplies one
        default_body: Option<MethodBody>,
    },
    /// A property, expanded into get (and set when writable) accessors
    Property {
        /// Property name
        name: Arc<str>,
        /// Property shape
        ty: TypeTag,
        /// Whether a write accessor exists
        writable: bool,
    },
    /// An event, expanded into add/remove listener accessors
    Event {
        /// Event name
        name: Arc<str>,
    },
}

impl ContractMember {
    fn name(&self) -> &str {
        match self {
            ContractMember::Method { sig, .. } => &sig.name,
            ContractMember::Property { name, .. } => name,
            ContractMember::Event { name } => name,
        }
    }

    /// Expand into method-shaped tokens paired with their default bodies
    pub(crate) fn expand(&self) -> Vec<(MemberToken, Option<MethodBody>)> {
        match self {
            ContractMember::Method { sig, default_body } => {
                vec![(MemberToken::method(sig), default_body.clone())]
            }
            ContractMember::Property { name, ty, writable } => {
                let mut tokens = vec![(MemberToken::property_get(name, ty), None)];
                if *writable {
                    tokens.push((MemberToken::property_set(name, ty), None));
                }
                tokens
            }
            ContractMember::Event { name } => vec![
                (MemberToken::event_add(name), None),
                (MemberToken::event_remove(name), None),
            ],
        }
    }
}

/// A named, stateless set of member declarations
pub struct ContractDecl {
    ident: TypeIdent,
    members: Vec<ContractMember>,
}

impl ContractDecl {
    /// Start building a contract
    pub fn builder(name: &str) -> ContractBuilder {
        ContractBuilder {
            ident: TypeIdent::new(name),
            members: Vec::new(),
        }
    }

    /// The contract's identity
    pub fn ident(&self) -> &TypeIdent {
        &self.ident
    }

    /// The contract's display name
    pub fn name(&self) -> &str {
        self.ident.name()
    }

    /// Declared members in order
    pub fn members(&self) -> &[ContractMember] {
        &self.members
    }

    /// All method-shaped tokens this contract requires
    pub fn member_tokens(&self) -> Vec<MemberToken> {
        self.members
            .iter()
            .flat_map(|m| m.expand().into_iter().map(|(token, _)| token))
            .collect()
    }
}

impl fmt::Debug for ContractDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractDecl")
            .field("name", &self.name())
            .field("members", &self.members.len())
            .finish()
    }
}

/// Builder for [`ContractDecl`]
pub struct ContractBuilder {
    ident: TypeIdent,
    members: Vec<ContractMember>,
}

impl ContractBuilder {
    /// Declare an abstract method
    pub fn method(mut self, sig: MethodSig) -> Self {
        self.members.push(ContractMember::Method {
            sig,
            default_body: None,
        });
        self
    }

    /// Declare a method carrying a default implementation
    pub fn default_method(mut self, sig: MethodSig, body: MethodBody) -> Self {
        self.members.push(ContractMember::Method {
            sig,
            default_body: Some(body),
        });
        self
    }

    /// Declare a read-only property
    pub fn property(mut self, name: &str, ty: TypeTag) -> Self {
        self.members.push(ContractMember::Property {
            name: Arc::from(name),
            ty,
            writable: false,
        });
        self
    }

    /// Declare a read-write property
    pub fn writable_property(mut self, name: &str, ty: TypeTag) -> Self {
        self.members.push(ContractMember::Property {
            name: Arc::from(name),
            ty,
            writable: true,
        });
        self
    }

    /// Declare an event
    pub fn event(mut self, name: &str) -> Self {
        self.members.push(ContractMember::Event {
            name: Arc::from(name),
        });
        self
    }

    /// Finish the declaration, rejecting duplicate member names
    pub fn build(self) -> ProxyResult<Arc<ContractDecl>> {
        check_unique_names(self.ident.name(), self.members.iter().map(|m| m.name()))?;
        Ok(Arc::new(ContractDecl {
            ident: self.ident,
            members: self.members,
        }))
    }
}

/// One declared method of a class
#[derive(Clone)]
pub struct ClassMethod {
    /// The signature
    pub sig: MethodSig,
    /// The original implementation
    pub body: MethodBody,
    /// Whether the member participates in virtual dispatch
    pub is_virtual: bool,
    /// Whether overriding is forbidden
    pub is_final: bool,
    /// Whether the member is static (never instance-dispatched)
    pub is_static: bool,
}

impl ClassMethod {
    /// Whether a proxy may override this member
    pub fn is_overridable(&self) -> bool {
        self.is_virtual && !self.is_final && !self.is_static
    }
}

/// One declared constructor of a class
#[derive(Clone)]
pub struct ConstructorDecl {
    /// Parameter shapes in order
    pub params: Vec<TypeTag>,
    /// The original constructor body
    pub body: ConstructorBody,
}

/// A named extensible type with fields, constructors, and methods
pub struct ClassDecl {
    ident: TypeIdent,
    field_count: usize,
    sealed: bool,
    methods: Vec<ClassMethod>,
    constructors: Vec<ConstructorDecl>,
}

impl ClassDecl {
    /// Start building a class
    pub fn builder(name: &str) -> ClassBuilder {
        ClassBuilder {
            ident: TypeIdent::new(name),
            field_count: 0,
            sealed: false,
            methods: Vec::new(),
            constructors: Vec::new(),
        }
    }

    /// The class's identity
    pub fn ident(&self) -> &TypeIdent {
        &self.ident
    }

    /// The class's display name
    pub fn name(&self) -> &str {
        self.ident.name()
    }

    /// Number of instance fields
    pub fn field_count(&self) -> usize {
        self.field_count
    }

    /// Whether the class forbids extension
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Declared methods in order
    pub fn methods(&self) -> &[ClassMethod] {
        &self.methods
    }

    /// Declared constructors in order
    pub fn constructors(&self) -> &[ConstructorDecl] {
        &self.constructors
    }
}

impl fmt::Debug for ClassDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDecl")
            .field("name", &self.name())
            .field("fields", &self.field_count)
            .field("sealed", &self.sealed)
            .field("methods", &self.methods.len())
            .field("constructors", &self.constructors.len())
            .finish()
    }
}

/// Builder for [`ClassDecl`]
pub struct ClassBuilder {
    ident: TypeIdent,
    field_count: usize,
    sealed: bool,
    methods: Vec<ClassMethod>,
    constructors: Vec<ConstructorDecl>,
}

impl ClassBuilder {
    /// Set the number of instance fields
    pub fn fields(mut self, count: usize) -> Self {
        self.field_count = count;
        self
    }

    /// Forbid extension
    pub fn sealed(mut self) -> Self {
        self.sealed = true;
        self
    }

    /// Declare a constructor
    pub fn constructor(mut self, params: Vec<TypeTag>, body: ConstructorBody) -> Self {
        self.constructors.push(ConstructorDecl { params, body });
        self
    }

    /// Declare a virtual (overridable) method
    pub fn virtual_method(mut self, sig: MethodSig, body: MethodBody) -> Self {
        self.methods.push(ClassMethod {
            sig,
            body,
            is_virtual: true,
            is_final: false,
            is_static: false,
        });
        self
    }

    /// Declare a virtual method that forbids overriding
    pub fn final_method(mut self, sig: MethodSig, body: MethodBody) -> Self {
        self.methods.push(ClassMethod {
            sig,
            body,
            is_virtual: true,
            is_final: true,
            is_static: false,
        });
        self
    }

    /// Declare a non-virtual method
    pub fn method(mut self, sig: MethodSig, body: MethodBody) -> Self {
        self.methods.push(ClassMethod {
            sig,
            body,
            is_virtual: false,
            is_final: false,
            is_static: false,
        });
        self
    }

    /// Declare a static method
    pub fn static_method(mut self, sig: MethodSig, body: MethodBody) -> Self {
        self.methods.push(ClassMethod {
            sig,
            body,
            is_virtual: false,
            is_final: false,
            is_static: true,
        });
        self
    }

    /// Finish the declaration.
    ///
    /// Rejects duplicate member names and duplicate constructor parameter
    /// lists. A class declared without constructors receives the implicit
    /// zero-argument constructor producing null fields.
    pub fn build(self) -> ProxyResult<Arc<ClassDecl>> {
        check_unique_names(
            self.ident.name(),
            self.methods.iter().map(|m| m.sig.name.as_ref()),
        )?;

        for (i, a) in self.constructors.iter().enumerate() {
            for b in &self.constructors[i + 1..] {
                if a.params == b.params {
                    return Err(ProxyError::InvalidArgument(format!(
                        "class {} declares two constructors with the same parameter list",
                        self.ident.name()
                    )));
                }
            }
        }

        let mut constructors = self.constructors;
        if constructors.is_empty() {
            let field_count = self.field_count;
            constructors.push(ConstructorDecl {
                params: Vec::new(),
                body: Arc::new(move |_args| Ok(vec![Value::Null; field_count])),
            });
        }

        Ok(Arc::new(ClassDecl {
            ident: self.ident,
            field_count: self.field_count,
            sealed: self.sealed,
            methods: self.methods,
            constructors,
        }))
    }
}

/// A named single-method signature
pub struct CallableDecl {
    ident: TypeIdent,
    sig: MethodSig,
}

/// The member name carried by every callable's single invocable shape
pub const CALLABLE_MEMBER: &str = "invoke";

impl CallableDecl {
    /// Declare a callable shape: `invoke(params) -> ret`
    pub fn new(name: &str, params: Vec<TypeTag>, ret: TypeTag) -> Arc<Self> {
        Arc::new(Self {
            ident: TypeIdent::new(name),
            sig: MethodSig::new(CALLABLE_MEMBER, params, ret),
        })
    }

    /// The callable's identity
    pub fn ident(&self) -> &TypeIdent {
        &self.ident
    }

    /// The callable's display name
    pub fn name(&self) -> &str {
        self.ident.name()
    }

    /// The single invocable signature
    pub fn sig(&self) -> &MethodSig {
        &self.sig
    }
}

impl fmt::Debug for CallableDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallableDecl")
            .field("name", &self.name())
            .finish()
    }
}

fn check_unique_names<'a>(
    type_name: &str,
    names: impl Iterator<Item = &'a str>,
) -> ProxyResult<()> {
    let mut seen = FxHashSet::default();
    for name in names {
        if !seen.insert(name) {
            return Err(ProxyError::InvalidArgument(format!(
                "type {} declares member {} more than once",
                type_name, name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_body() -> MethodBody {
        Arc::new(|_fields, _args| Ok(Value::Null))
    }

    #[test]
    fn test_contract_builder_expands_members() {
        let contract = ContractDecl::builder("Observable")
            .method(MethodSig::new("notify", vec![TypeTag::Str], TypeTag::Void))
            .writable_property("enabled", TypeTag::Bool)
            .event("changed")
            .build()
            .unwrap();

        // notify + get/set enabled + add/remove changed
        assert_eq!(contract.member_tokens().len(), 5);
    }

    #[test]
    fn test_duplicate_member_names_rejected() {
        let result = ContractDecl::builder("Bad")
            .method(MethodSig::new("x", vec![], TypeTag::Int))
            .property("x", TypeTag::Int)
            .build();
        assert!(matches!(result, Err(ProxyError::InvalidArgument(_))));
    }

    #[test]
    fn test_class_implicit_default_constructor() {
        let class = ClassDecl::builder("Plain")
            .fields(2)
            .virtual_method(MethodSig::new("run", vec![], TypeTag::Void), noop_body())
            .build()
            .unwrap();

        assert_eq!(class.constructors().len(), 1);
        let fields = (class.constructors()[0].body)(&[]).unwrap();
        assert_eq!(fields, vec![Value::Null, Value::Null]);
    }

    #[test]
    fn test_duplicate_constructor_shapes_rejected() {
        let ctor: ConstructorBody = Arc::new(|_| Ok(vec![]));
        let result = ClassDecl::builder("Bad")
            .constructor(vec![TypeTag::Int], ctor.clone())
            .constructor(vec![TypeTag::Int], ctor)
            .build();
        assert!(matches!(result, Err(ProxyError::InvalidArgument(_))));
    }

    #[test]
    fn test_overridable_flags() {
        let class = ClassDecl::builder("Mixed")
            .virtual_method(MethodSig::new("a", vec![], TypeTag::Void), noop_body())
            .final_method(MethodSig::new("b", vec![], TypeTag::Void), noop_body())
            .method(MethodSig::new("c", vec![], TypeTag::Void), noop_body())
            .static_method(MethodSig::new("d", vec![], TypeTag::Void), noop_body())
            .build()
            .unwrap();

        let overridable: Vec<&str> = class
            .methods()
            .iter()
            .filter(|m| m.is_overridable())
            .map(|m| m.sig.name.as_ref())
            .collect();
        assert_eq!(overridable, vec!["a"]);
    }

    #[test]
    fn test_callable_single_member() {
        let callable = CallableDecl::new("Transform", vec![TypeTag::Str], TypeTag::Str);
        assert_eq!(callable.sig().name.as_ref(), CALLABLE_MEMBER);
        assert_eq!(callable.sig().params, vec![TypeTag::Str]);
    }
}
