//! Proxy factories and live proxy instances
//!
//! A [`ProxyFactory`] wraps one emitted type and instantiates proxies
//! bound to a dispatch handler. Instances hold their field values behind a
//! lock; dispatch resolves the member's trampoline, checks the argument
//! shapes, and either forwards to the handler or runs the original body.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::contract::{ContractDecl, MethodBody};
use crate::definition::DefinitionKind;
use crate::emitter::{ConstructorSpec, EmittedType, Trampoline};
use crate::handler::{CallResult, DispatchHandler, Fault, Invocation};
use crate::token::{MemberKind, MemberToken};
use crate::value::{TypeIdent, Value};
use crate::{ProxyError, ProxyResult};

/// Global counter for generating unique proxy instance IDs
static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Instantiates proxies of one generated type.
///
/// Immutable and shared: the structural cache hands the same factory to
/// every caller requesting the same definition.
pub struct ProxyFactory {
    emitted: Arc<EmittedType>,
}

impl ProxyFactory {
    pub(crate) fn new(emitted: Arc<EmittedType>) -> Self {
        Self { emitted }
    }

    /// The synthetic name of the generated type
    pub fn type_name(&self) -> &str {
        self.emitted.type_name()
    }

    /// Identity of the extended/implemented base type
    pub fn parent(&self) -> &TypeIdent {
        self.emitted.parent()
    }

    /// The definition variant this factory was generated from
    pub fn kind(&self) -> DefinitionKind {
        self.emitted.kind()
    }

    /// Member tokens of the generated type, in emission order
    pub fn member_tokens(&self) -> Vec<&MemberToken> {
        self.emitted.member_tokens().collect()
    }

    /// Whether instances satisfy every member the contract requires
    pub fn implements(&self, contract: &ContractDecl) -> bool {
        self.emitted.satisfies(contract)
    }

    /// Create a proxy instance bound to the handler.
    ///
    /// Constructor selection requires an exact arity and parameter-shape
    /// match — no implicit widening — and fails with
    /// [`ProxyError::ConstructorNotFound`] otherwise. A fault raised while
    /// replaying the selected constructor propagates unchanged.
    pub fn instantiate(
        &self,
        handler: Arc<dyn DispatchHandler>,
        args: &[Value],
    ) -> ProxyResult<ProxyHandle> {
        let constructor = self.select_constructor(args)?;
        let fields = (constructor.body)(args)?;

        Ok(ProxyHandle {
            inner: Arc::new(ProxyInstance {
                instance_id: NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed),
                emitted: self.emitted.clone(),
                handler,
                fields: Mutex::new(fields),
            }),
        })
    }

    fn select_constructor(&self, args: &[Value]) -> ProxyResult<&ConstructorSpec> {
        for constructor in self.emitted.constructors() {
            if constructor.params.len() == args.len()
                && args
                    .iter()
                    .zip(&constructor.params)
                    .all(|(arg, tag)| arg.matches(tag))
            {
                return Ok(constructor);
            }
        }

        let supplied: Vec<&str> = args.iter().map(Value::type_name).collect();
        Err(ProxyError::ConstructorNotFound {
            type_name: self.type_name().to_string(),
            supplied: supplied.join(", "),
        })
    }
}

/// A live proxy instance
pub struct ProxyInstance {
    /// Unique instance ID (assigned on creation)
    instance_id: u64,
    emitted: Arc<EmittedType>,
    handler: Arc<dyn DispatchHandler>,
    /// Field values, replayed by the selected constructor
    fields: Mutex<Vec<Value>>,
}

impl ProxyInstance {
    /// The unique instance ID
    pub fn instance_id(&self) -> u64 {
        self.instance_id
    }

    /// The generated type's synthetic name
    pub fn type_name(&self) -> &str {
        self.emitted.type_name()
    }

    /// Identity of the extended/implemented base type
    pub fn parent(&self) -> &TypeIdent {
        self.emitted.parent()
    }

    /// Read a field value by index
    pub fn field(&self, index: usize) -> Option<Value> {
        self.fields.lock().get(index).cloned()
    }

    /// Write a field value by index
    pub fn set_field(&self, index: usize, value: Value) -> Result<(), Fault> {
        let mut fields = self.fields.lock();
        match fields.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(Fault::raised(format!(
                "field index {} out of bounds (instance has {} fields)",
                index,
                fields.len()
            ))),
        }
    }

    /// Run a member body against this instance's fields
    pub(crate) fn call_body(&self, body: &MethodBody, args: &[Value]) -> CallResult {
        let mut fields = self.fields.lock();
        body(&mut fields, args)
    }

    fn dispatch(&self, name: &str, kind: MemberKind, args: &[Value]) -> CallResult {
        let trampoline = self
            .emitted
            .slot(name, kind)
            .ok_or_else(|| Fault::UnknownMember {
                member: name.to_string(),
            })?;
        let token = trampoline.token();

        if args.len() != token.params().len() {
            return Err(Fault::ArityMismatch {
                member: token.name().to_string(),
                expected: token.params().len(),
                got: args.len(),
            });
        }
        for (arg, tag) in args.iter().zip(token.params()) {
            if !arg.matches(tag) {
                return Err(Fault::TypeMismatch {
                    expected: tag.to_string(),
                    got: arg.type_name().to_string(),
                });
            }
        }

        match trampoline {
            Trampoline::Forward { token, base } => {
                let invocation = Invocation {
                    token,
                    instance: self,
                    args,
                    base: base.as_ref(),
                };
                let result = self.handler.invoke(&invocation)?;
                // Coerce the handler's result to the declared return shape
                if result.matches(token.ret()) {
                    Ok(result)
                } else {
                    Err(Fault::TypeMismatch {
                        expected: token.ret().to_string(),
                        got: result.type_name().to_string(),
                    })
                }
            }
            Trampoline::Base { body, .. } => self.call_body(body, args),
            Trampoline::Unimplemented { token } => Err(Fault::NotImplemented {
                member: token.name().to_string(),
            }),
        }
    }
}

/// Shared handle to a live proxy instance
#[derive(Clone)]
pub struct ProxyHandle {
    inner: Arc<ProxyInstance>,
}

impl ProxyHandle {
    /// The underlying instance
    pub fn instance(&self) -> &ProxyInstance {
        &self.inner
    }

    /// The unique instance ID
    pub fn instance_id(&self) -> u64 {
        self.inner.instance_id
    }

    /// The generated type's synthetic name
    pub fn type_name(&self) -> &str {
        self.inner.type_name()
    }

    /// Call a method member
    pub fn invoke(&self, name: &str, args: &[Value]) -> CallResult {
        self.inner.dispatch(name, MemberKind::Method, args)
    }

    /// Read a property member
    pub fn get(&self, name: &str) -> CallResult {
        self.inner.dispatch(name, MemberKind::PropertyGet, &[])
    }

    /// Write a property member
    pub fn set(&self, name: &str, value: Value) -> CallResult {
        self.inner
            .dispatch(name, MemberKind::PropertySet, &[value])
    }

    /// Register an event listener
    pub fn add_listener(&self, name: &str, listener: Value) -> CallResult {
        self.inner.dispatch(name, MemberKind::EventAdd, &[listener])
    }

    /// Remove an event listener
    pub fn remove_listener(&self, name: &str, listener: Value) -> CallResult {
        self.inner
            .dispatch(name, MemberKind::EventRemove, &[listener])
    }

    /// Whether this instance satisfies every member the contract requires
    pub fn satisfies(&self, contract: &ContractDecl) -> bool {
        self.inner.emitted.satisfies(contract)
    }
}
