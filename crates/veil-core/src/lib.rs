//! Veil Proxy Engine
//!
//! This crate synthesizes, at process run time, concrete implementations of
//! a target contract — an interface-like contract, an extensible base
//! class, or a single-method callable signature — whose every overridable
//! member is redirected through a caller-supplied dispatch handler:
//! - **Definition model**: normalizes (base target, contracts) pairs
//!   (`definition` module)
//! - **Generation engine**: turns definitions into dispatch-table types
//!   (`generator`, `emitter` modules)
//! - **Structural cache**: at-most-once generation per definition
//!   (`cache` module)
//! - **Dispatch boundary**: handlers, invocations, faults (`handler` module)
//!
//! # Example
//!
//! ```rust,ignore
//! use veil_core::{ContractDecl, MethodSig, ProxyRepository, TargetType, TypeTag, Value};
//!
//! let greeter = ContractDecl::builder("Greeter")
//!     .method(MethodSig::new("greet", vec![TypeTag::Str], TypeTag::Str))
//!     .build()?;
//!
//! let repository = ProxyRepository::new();
//! let proxy = repository.create_proxy(
//!     TargetType::Contract(greeter),
//!     &[],
//!     veil_core::handler_fn(|inv| Ok(Value::str(format!("hi {:?}", inv.args())))),
//!     &[],
//! )?;
//!
//! let reply = proxy.invoke("greet", &[Value::str("world")])?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod cache;
pub mod contract;
pub mod definition;
pub mod emitter;
pub mod factory;
pub mod filter;
pub mod generator;
pub mod handler;
pub mod repository;
pub mod token;
pub mod value;

pub use cache::LockOnWriteCache;
pub use contract::{
    CallableDecl, ClassBuilder, ClassDecl, ClassMethod, ConstructorBody, ConstructorDecl,
    ContractBuilder, ContractDecl, ContractMember, MethodBody, MethodSig, CALLABLE_MEMBER,
};
pub use definition::{DefinitionKind, ProxyDefinition, TargetType};
pub use emitter::{
    ConstructorSpec, DispatchTableEmitter, EmitError, EmittedType, MemberDispatch, MemberRequest,
    TypeEmitter, TypeSpec,
};
pub use factory::{ProxyFactory, ProxyHandle, ProxyInstance};
pub use filter::{DefaultInterceptionFilter, InterceptionFilter};
pub use generator::ProxyGenerator;
pub use handler::{handler_fn, CallResult, DispatchHandler, Fault, Invocation, PassthroughHandler};
pub use repository::ProxyRepository;
pub use token::{MemberKind, MemberToken};
pub use value::{TypeIdent, TypeTag, Value};

/// Proxy generation and instantiation errors.
///
/// `Clone` so a failed generation can be cached as the definitive outcome
/// for its definition and re-raised identically to every caller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProxyError {
    /// Malformed input to a public entry point
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The base type admits no contract to implement and no overridable
    /// members
    #[error("type {type_name} is not proxyable")]
    NotProxyable {
        /// The offending base type
        type_name: String,
    },

    /// Two sources impose incompatible signatures on one member slot
    #[error("conflicting signatures for member {member}: {first} vs {second}")]
    Conflict {
        /// The contested member name
        member: String,
        /// Shape declared first
        first: String,
        /// The incompatible shape
        second: String,
    },

    /// The emitter cannot represent a required member shape
    #[error("unsupported member shape: {token}")]
    UnsupportedMember {
        /// The offending token
        token: MemberToken,
    },

    /// Instantiation arguments match no replayed constructor
    #[error("no constructor of {type_name} accepts ({supplied})")]
    ConstructorNotFound {
        /// The generated type
        type_name: String,
        /// Shapes of the supplied arguments
        supplied: String,
    },

    /// A fault raised while replaying a constructor, propagated unchanged
    #[error(transparent)]
    Fault(#[from] Fault),
}

/// Result of proxy generation and instantiation operations
pub type ProxyResult<T> = Result<T, ProxyError>;
