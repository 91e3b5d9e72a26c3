//! Dynamic values and declared type shapes
//!
//! Proxied members are dispatched dynamically, so arguments, results, and
//! instance fields are represented as [`Value`]s and member signatures as
//! [`TypeTag`]s. Matching is exact: an `Int` never satisfies a `Float` slot
//! and vice versa, so constructor selection and return coercion behave the
//! same way an overload-resolved direct call would.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Global counter for generating unique type identities
static NEXT_TYPE_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a declared runtime type.
///
/// Each declaration (contract, class, callable) receives a process-unique
/// id on creation; equality and hashing use the id only, so two
/// declarations with the same display name are still distinct types.
#[derive(Debug, Clone)]
pub struct TypeIdent {
    id: u64,
    name: Arc<str>,
}

impl TypeIdent {
    /// Allocate a fresh identity with the given display name
    pub fn new(name: &str) -> Self {
        Self {
            id: NEXT_TYPE_ID.fetch_add(1, Ordering::Relaxed),
            name: Arc::from(name),
        }
    }

    /// The unique id
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The display name
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for TypeIdent {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeIdent {}

impl std::hash::Hash for TypeIdent {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Declared shape of a parameter, return, property, or field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// No value (return position only)
    Void,
    /// Boolean
    Bool,
    /// 64-bit integer
    Int,
    /// 64-bit float
    Float,
    /// String
    Str,
    /// Homogeneous list of the element shape
    List(Box<TypeTag>),
    /// Reference to a declared type
    Object(TypeIdent),
    /// Callable reference (event listeners, function-typed members)
    Callable,
    /// Any value
    Any,
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Void => write!(f, "void"),
            TypeTag::Bool => write!(f, "bool"),
            TypeTag::Int => write!(f, "int"),
            TypeTag::Float => write!(f, "float"),
            TypeTag::Str => write!(f, "string"),
            TypeTag::List(elem) => write!(f, "{}[]", elem),
            TypeTag::Object(ident) => write!(f, "{}", ident.name()),
            TypeTag::Callable => write!(f, "callable"),
            TypeTag::Any => write!(f, "any"),
        }
    }
}

/// Dynamic value flowing through proxied member calls
#[derive(Clone)]
pub enum Value {
    /// Null reference
    Null,
    /// Boolean
    Bool(bool),
    /// 64-bit integer
    Int(i64),
    /// 64-bit float
    Float(f64),
    /// String
    Str(Arc<str>),
    /// List of values
    List(Arc<Vec<Value>>),
    /// Opaque foreign object reference (listener, collaborator, payload)
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl Value {
    /// Create a string value
    pub fn str(s: impl AsRef<str>) -> Self {
        Value::Str(Arc::from(s.as_ref()))
    }

    /// Create a list value
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Arc::new(items))
    }

    /// Create an opaque value wrapping a foreign object
    pub fn opaque(obj: impl Any + Send + Sync) -> Self {
        Value::Opaque(Arc::new(obj))
    }

    /// Check whether this value satisfies the declared shape.
    ///
    /// Exact matching: no numeric widening. `Null` satisfies only
    /// reference-shaped tags (and `Void` in return position).
    pub fn matches(&self, tag: &TypeTag) -> bool {
        match (self, tag) {
            (_, TypeTag::Any) => true,
            (Value::Null, TypeTag::Void) => true,
            (Value::Null, TypeTag::Str | TypeTag::List(_) | TypeTag::Object(_) | TypeTag::Callable) => true,
            (Value::Bool(_), TypeTag::Bool) => true,
            (Value::Int(_), TypeTag::Int) => true,
            (Value::Float(_), TypeTag::Float) => true,
            (Value::Str(_), TypeTag::Str) => true,
            (Value::List(items), TypeTag::List(elem)) => items.iter().all(|v| v.matches(elem)),
            (Value::Opaque(_), TypeTag::Object(_) | TypeTag::Callable) => true,
            _ => false,
        }
    }

    /// Get type name for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Opaque(_) => "object",
        }
    }

    /// Extract boolean value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract integer value
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Extract float value
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    /// Extract string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            // Opaque references compare by identity
            (Value::Opaque(a), Value::Opaque(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Int(i) => write!(f, "Int({})", i),
            Value::Float(x) => write!(f, "Float({})", x),
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::List(items) => write!(f, "List({:?})", items),
            Value::Opaque(_) => write!(f, "Opaque(..)"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::str(s)
    }
}
