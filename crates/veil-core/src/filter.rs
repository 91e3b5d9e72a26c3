//! Interception policy
//!
//! The filter's verdict for each member is consulted once, at generation
//! time, and baked permanently into the emitted type. Policies must be
//! pure functions of the member token and definition variant.

use crate::definition::DefinitionKind;
use crate::token::{MemberKind, MemberToken};

/// Decides, per member, whether to proxy or pass through
pub trait InterceptionFilter: Send + Sync {
    /// Whether calls to this member should be forwarded to the handler
    fn should_intercept(&self, token: &MemberToken, kind: DefinitionKind) -> bool;
}

impl<F> InterceptionFilter for F
where
    F: Fn(&MemberToken) -> bool + Send + Sync,
{
    fn should_intercept(&self, token: &MemberToken, _kind: DefinitionKind) -> bool {
        self(token)
    }
}

/// Destructor-like members are never forwarded
const DESTRUCTOR_MEMBERS: &[&str] = &["finalize", "dispose"];

/// Identity members skipped on class-based proxies by default
const IDENTITY_MEMBERS: &[&str] = &["equals", "hash_code"];

/// The default policy: intercept every member except the built-in
/// deny-list.
///
/// Destructor-like members (`finalize`, `dispose`) are never intercepted.
/// The identity members (`equals`, `hash_code`) of class-based proxies are
/// left on their base implementation unless explicitly requested via
/// [`DefaultInterceptionFilter::with_identity_members`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultInterceptionFilter {
    intercept_identity_members: bool,
}

impl DefaultInterceptionFilter {
    /// The default policy
    pub fn new() -> Self {
        Self::default()
    }

    /// A policy that also intercepts `equals`/`hash_code` on class-based
    /// proxies
    pub fn with_identity_members() -> Self {
        Self {
            intercept_identity_members: true,
        }
    }
}

impl InterceptionFilter for DefaultInterceptionFilter {
    fn should_intercept(&self, token: &MemberToken, kind: DefinitionKind) -> bool {
        if token.kind() == MemberKind::Method && DESTRUCTOR_MEMBERS.contains(&token.name()) {
            return false;
        }
        if kind == DefinitionKind::Class
            && !self.intercept_identity_members
            && token.kind() == MemberKind::Method
            && IDENTITY_MEMBERS.contains(&token.name())
        {
            return false;
        }
        true
    }
}
