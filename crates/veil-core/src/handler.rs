//! Dispatch handler boundary
//!
//! Every intercepted member of a generated proxy forwards to a
//! [`DispatchHandler`]. The handler receives an [`Invocation`] packaging the
//! member token, the receiving instance, and the call arguments; when the
//! member has an original implementation, `proceed()` escapes to it.
//! Faults returned by a handler propagate to the proxy's caller unchanged,
//! so a proxied call is indistinguishable from a direct one with respect to
//! fault identity.

use std::sync::Arc;

use crate::contract::MethodBody;
use crate::factory::ProxyInstance;
use crate::token::MemberToken;
use crate::value::Value;

/// Result of a dispatched member call
pub type CallResult = Result<Value, Fault>;

/// Dispatch-time fault raised by a trampoline, handler, or advice
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Fault {
    /// A value did not satisfy a declared shape
    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Expected shape
        expected: String,
        /// Actual value type
        got: String,
    },

    /// Wrong number of arguments for a member
    #[error("{member}: expected {expected} arguments, got {got}")]
    ArityMismatch {
        /// Member name
        member: String,
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        got: usize,
    },

    /// No member slot under the requested name and kind
    #[error("unknown member: {member}")]
    UnknownMember {
        /// Member name
        member: String,
    },

    /// The member has no implementation to fall through to
    #[error("member {member} has no implementation")]
    NotImplemented {
        /// Member name
        member: String,
    },

    /// Fault raised by user code (handler, advice, or member body)
    #[error("{message}")]
    Raised {
        /// Fault message
        message: String,
        /// Fault payload, if any
        payload: Value,
    },
}

impl Fault {
    /// A user fault with no payload
    pub fn raised(message: impl Into<String>) -> Self {
        Fault::Raised {
            message: message.into(),
            payload: Value::Null,
        }
    }

    /// A user fault carrying a payload value
    pub fn raised_with(message: impl Into<String>, payload: Value) -> Self {
        Fault::Raised {
            message: message.into(),
            payload,
        }
    }
}

/// A single dispatched member call
pub struct Invocation<'a> {
    pub(crate) token: &'a MemberToken,
    pub(crate) instance: &'a ProxyInstance,
    pub(crate) args: &'a [Value],
    pub(crate) base: Option<&'a MethodBody>,
}

impl<'a> Invocation<'a> {
    /// The invoked member's token
    pub fn token(&self) -> &MemberToken {
        self.token
    }

    /// The receiving proxy instance
    pub fn instance(&self) -> &ProxyInstance {
        self.instance
    }

    /// The call arguments
    pub fn args(&self) -> &[Value] {
        self.args
    }

    /// Whether the member has an original implementation to fall
    /// through to
    pub fn has_base(&self) -> bool {
        self.base.is_some()
    }

    /// Invoke the member's original implementation with the original
    /// arguments.
    ///
    /// Fails with [`Fault::NotImplemented`] when the member is purely
    /// abstract.
    pub fn proceed(&self) -> CallResult {
        match self.base {
            Some(body) => self.instance.call_body(body, self.args),
            None => Err(Fault::NotImplemented {
                member: self.token.name().to_string(),
            }),
        }
    }
}

/// The terminal abstraction every intercepted member forwards to
pub trait DispatchHandler: Send + Sync {
    /// Handle one member call
    fn invoke(&self, invocation: &Invocation<'_>) -> CallResult;
}

impl<F> DispatchHandler for F
where
    F: Fn(&Invocation<'_>) -> CallResult + Send + Sync,
{
    fn invoke(&self, invocation: &Invocation<'_>) -> CallResult {
        self(invocation)
    }
}

/// Wrap a closure as a shared dispatch handler
pub fn handler_fn<F>(f: F) -> Arc<dyn DispatchHandler>
where
    F: Fn(&Invocation<'_>) -> CallResult + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A handler that always falls through to the original implementation
pub struct PassthroughHandler;

impl DispatchHandler for PassthroughHandler {
    fn invoke(&self, invocation: &Invocation<'_>) -> CallResult {
        invocation.proceed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_identity_is_observable() {
        let payload = Value::list(vec![Value::Int(1), Value::Int(2)]);
        let a = Fault::raised_with("boom", payload.clone());
        let b = Fault::raised_with("boom", payload);
        assert_eq!(a, b);
        assert_ne!(a, Fault::raised("boom"));
    }

    #[test]
    fn test_fault_display() {
        let fault = Fault::ArityMismatch {
            member: "greet".to_string(),
            expected: 1,
            got: 3,
        };
        assert_eq!(fault.to_string(), "greet: expected 1 arguments, got 3");
    }
}
