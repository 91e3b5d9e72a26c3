//! Advisors and pointcuts
//!
//! An advisor is a named advice plus a scope: *shared* (one advice
//! instance backs the pipeline for every proxy built from it) or
//! *per-instance* (a fresh advice instance is bound at each proxy
//! instantiation, enabling stateful per-target behavior such as mixins).
//! The pointcut selects which members the advisor applies to.

use std::fmt;
use std::sync::Arc;

use veil_core::MemberToken;

use crate::advice::Advice;

/// Predicate selecting the members an advisor applies to
#[derive(Clone)]
pub struct Pointcut(Arc<dyn Fn(&MemberToken) -> bool + Send + Sync>);

impl Pointcut {
    /// Matches every member
    pub fn all() -> Self {
        Self(Arc::new(|_| true))
    }

    /// Matches members selected by the predicate
    pub fn of(predicate: impl Fn(&MemberToken) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(predicate))
    }

    /// Matches members whose name starts with the prefix
    pub fn name_prefix(prefix: &str) -> Self {
        let prefix = prefix.to_string();
        Self(Arc::new(move |token| token.name().starts_with(&prefix)))
    }

    /// Whether the member is selected
    pub fn matches(&self, token: &MemberToken) -> bool {
        (self.0)(token)
    }
}

impl Default for Pointcut {
    fn default() -> Self {
        Self::all()
    }
}

impl fmt::Debug for Pointcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pointcut(..)")
    }
}

/// How an advisor's advice instance relates to proxy instances
#[derive(Clone)]
pub enum AdviceScope {
    /// One advice instance shared by every proxy built from the pipeline
    Shared(Advice),
    /// A fresh advice instance per proxy instantiation
    PerInstance(Arc<dyn Fn() -> Advice + Send + Sync>),
}

/// A named cross-cutting behavior: advice + scope + pointcut
#[derive(Clone)]
pub struct Advisor {
    name: Arc<str>,
    scope: AdviceScope,
    pointcut: Pointcut,
}

impl Advisor {
    /// An advisor whose single advice instance backs every proxy
    pub fn shared(name: &str, advice: Advice) -> Self {
        Self {
            name: Arc::from(name),
            scope: AdviceScope::Shared(advice),
            pointcut: Pointcut::all(),
        }
    }

    /// An advisor binding a fresh advice instance at each proxy
    /// instantiation
    pub fn per_instance(name: &str, factory: impl Fn() -> Advice + Send + Sync + 'static) -> Self {
        Self {
            name: Arc::from(name),
            scope: AdviceScope::PerInstance(Arc::new(factory)),
            pointcut: Pointcut::all(),
        }
    }

    /// Restrict the advisor to members the pointcut selects
    pub fn with_pointcut(mut self, pointcut: Pointcut) -> Self {
        self.pointcut = pointcut;
        self
    }

    /// The advisor's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a fresh advice instance is bound per proxy instantiation
    pub fn is_per_instance(&self) -> bool {
        matches!(self.scope, AdviceScope::PerInstance(_))
    }

    /// The advisor's scope
    pub fn scope(&self) -> &AdviceScope {
        &self.scope
    }

    /// The advisor's pointcut
    pub fn pointcut(&self) -> &Pointcut {
        &self.pointcut
    }

    /// Resolve the advice instance for one proxy instantiation
    pub(crate) fn resolve(&self) -> Advice {
        match &self.scope {
            AdviceScope::Shared(advice) => advice.clone(),
            AdviceScope::PerInstance(factory) => factory(),
        }
    }
}

impl fmt::Debug for Advisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Advisor")
            .field("name", &self.name)
            .field("per_instance", &self.is_per_instance())
            .finish()
    }
}
