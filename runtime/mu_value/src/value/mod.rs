//! The tagged value type and its dispatch layer.
//!
//! Every runtime value is one of seven kinds. Operations here select the
//! behavior of the kind: scalar kinds answer directly, container and
//! callable kinds forward to [`Table`], [`Builtin`] and [`Closure`].
//!
//! Container operations on a value that is not a table (and `call` on a
//! value that is not callable) are programming errors and panic; only
//! runtime failures are reported as [`Error`].

use std::fmt;
use std::rc::Rc;

use crate::error::Error;
use crate::function::{Builtin, BuiltinFn, Callable, Closure};
use crate::num;
use crate::string::Str;
use crate::table::Table;

/// 32-bit hash of a value.
pub type Hash = u32;

/// Value kind tags. The numbering is stable; tag 5 is reserved and no value
/// ever carries it.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    Nil = 0,
    Error = 1,
    Number = 2,
    Builtin = 3,
    Table = 4,
    Reserved = 5,
    Str = 6,
    Closure = 7,
}

impl ValueType {
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Nil => "nil",
            ValueType::Error => "error",
            ValueType::Number => "number",
            ValueType::Builtin => "builtin",
            ValueType::Table => "table",
            ValueType::Reserved => "reserved",
            ValueType::Str => "string",
            ValueType::Closure => "closure",
        }
    }
}

/// A runtime value.
///
/// Cloning a heap kind shares it (reference count +1); dropping releases
/// that share. `Nil` is the default and the "absent" marker everywhere.
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Nil,
    Error(Error),
    Number(f64),
    Builtin(Builtin),
    Table(Table),
    Str(Str),
    Closure(Closure),
}

#[cold]
#[track_caller]
fn unsupported(op: &str, value: &Value) -> ! {
    panic!("{op} is not supported on a {} value", value.value_type().name())
}

#[inline]
pub(crate) fn fold_addr(addr: usize) -> Hash {
    let addr = addr as u64;
    #[allow(clippy::cast_possible_truncation, reason = "hashes keep 32 bits")]
    let folded = (addr ^ (addr >> 32)) as u32;
    folded
}

impl Value {
    // ── Constructors ──

    #[inline]
    pub fn number(n: f64) -> Value {
        Value::Number(n)
    }

    /// Number value of a position.
    #[inline]
    #[allow(clippy::cast_precision_loss, reason = "positions are far below 2^53")]
    pub fn index(i: usize) -> Value {
        Value::Number(i as f64)
    }

    /// Heap string copied from `s`.
    pub fn string(s: &str) -> Result<Value, Error> {
        Ok(Value::Str(Str::new(s)?))
    }

    pub fn builtin(func: BuiltinFn, scope: Option<Table>) -> Value {
        Value::Builtin(Builtin::new(func, scope))
    }

    pub fn closure(code: Rc<dyn Callable>, scope: Option<Table>) -> Value {
        Value::Closure(Closure::new(code, scope))
    }

    /// Fold a fallible result into a value; failures become error values.
    pub fn from_result(result: Result<Value, Error>) -> Value {
        result.unwrap_or_else(Value::Error)
    }

    // ── Queries ──

    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Nil => ValueType::Nil,
            Value::Error(_) => ValueType::Error,
            Value::Number(_) => ValueType::Number,
            Value::Builtin(_) => ValueType::Builtin,
            Value::Table(_) => ValueType::Table,
            Value::Str(_) => ValueType::Str,
            Value::Closure(_) => ValueType::Closure,
        }
    }

    #[inline]
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[inline]
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&Str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn as_error(&self) -> Option<Error> {
        match self {
            Value::Error(e) => Some(*e),
            _ => None,
        }
    }

    // ── Dispatch ──

    /// Kind-specific equality: numbers numerically, strings by content,
    /// everything else by identity. Values of different kinds are unequal.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => num::equals(*a, *b),
            (Value::Builtin(a), Value::Builtin(b)) => a.same(b),
            (Value::Table(a), Value::Table(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a.equals(b),
            (Value::Closure(a), Value::Closure(b)) => a.same(b),
            _ => false,
        }
    }

    /// Kind-specific hash, consistent with [`Value::equals`].
    pub fn hash(&self) -> Hash {
        match self {
            Value::Nil => 0,
            Value::Error(e) => *e as Hash,
            Value::Number(n) => num::hash(*n),
            Value::Builtin(b) => b.hash(),
            Value::Table(t) => t.hash(),
            Value::Str(s) => s.hash(),
            Value::Closure(c) => c.hash(),
        }
    }

    /// Textual rendering.
    pub fn repr(&self) -> Result<Str, Error> {
        match self {
            Value::Nil => Ok(Str::from_static("nil")),
            Value::Error(e) => Str::new(&format!("error({})", e.kind())),
            Value::Number(n) => num::repr(*n),
            Value::Builtin(b) => b.repr(),
            Value::Table(t) => t.repr(),
            Value::Str(s) => s.repr(),
            Value::Closure(c) => c.repr(),
        }
    }

    /// Write the rendering to standard output, followed by a newline.
    pub fn print(&self) {
        println!("{self}");
    }

    /// Iteration function over a table.
    ///
    /// # Panics
    /// If the value is not a table.
    #[track_caller]
    pub fn iterate(&self) -> Result<Value, Error> {
        match self {
            Value::Table(t) => t.iterate(),
            _ => unsupported("iteration", self),
        }
    }

    /// # Panics
    /// If the value is not a table.
    #[track_caller]
    pub fn lookup(&self, key: &Value) -> Value {
        match self {
            Value::Table(t) => t.lookup(key),
            _ => unsupported("lookup", self),
        }
    }

    /// # Panics
    /// If the value is not a table.
    #[track_caller]
    pub fn lookdn(&self, key: &Value, index: usize) -> Value {
        match self {
            Value::Table(t) => t.lookdn(key, index),
            _ => unsupported("lookup", self),
        }
    }

    /// # Panics
    /// If the value is not a table.
    #[track_caller]
    pub fn insert(&self, key: Value, val: Value) -> Result<(), Error> {
        match self {
            Value::Table(t) => t.insert(key, val),
            _ => unsupported("insert", self),
        }
    }

    /// # Panics
    /// If the value is not a table.
    #[track_caller]
    pub fn assign(&self, key: Value, val: Value) -> Result<(), Error> {
        match self {
            Value::Table(t) => t.assign(key, val),
            _ => unsupported("assignment", self),
        }
    }

    /// # Panics
    /// If the value is not a table.
    #[track_caller]
    pub fn add(&self, val: Value) -> Result<(), Error> {
        match self {
            Value::Table(t) => t.add(val),
            _ => unsupported("append", self),
        }
    }

    /// Invoke a callable with an argument table.
    ///
    /// # Panics
    /// If the value is neither a builtin nor a closure.
    #[track_caller]
    pub fn call(&self, args: &Table) -> Result<Value, Error> {
        match self {
            Value::Builtin(b) => b.call(args),
            Value::Closure(c) => c.call(args),
            _ => unsupported("call", self),
        }
    }
}

impl PartialEq for Value {
    #[inline]
    fn eq(&self, other: &Value) -> bool {
        self.equals(other)
    }
}

impl From<f64> for Value {
    #[inline]
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&'static str> for Value {
    #[inline]
    fn from(s: &'static str) -> Self {
        Value::Str(Str::from_static(s))
    }
}

impl From<Str> for Value {
    #[inline]
    fn from(s: Str) -> Self {
        Value::Str(s)
    }
}

impl From<Table> for Value {
    #[inline]
    fn from(t: Table) -> Self {
        Value::Table(t)
    }
}

impl From<Error> for Value {
    #[inline]
    fn from(e: Error) -> Self {
        Value::Error(e)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.repr() {
            Ok(text) => write!(f, "{text}"),
            Err(err) => write!(f, "<{err}>"),
        }
    }
}
