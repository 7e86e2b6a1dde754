//! Callable values.
//!
//! A [`Builtin`] is a native function pointer with an optional scope table;
//! a [`Closure`] is any [`Callable`] behind shared ownership, also with an
//! optional scope. Both are invoked with an argument table.

use std::fmt;
use std::rc::Rc;

use crate::error::Error;
use crate::string::Str;
use crate::table::Table;
use crate::value::{fold_addr, Hash, Value};

/// Signature of native functions: `(args, scope) -> result`.
pub type BuiltinFn = fn(&Table, Option<&Table>) -> Result<Value, Error>;

/// Native function value.
#[derive(Clone)]
pub struct Builtin {
    func: BuiltinFn,
    scope: Option<Table>,
}

impl Builtin {
    pub fn new(func: BuiltinFn, scope: Option<Table>) -> Self {
        Builtin { func, scope }
    }

    #[inline]
    pub fn call(&self, args: &Table) -> Result<Value, Error> {
        (self.func)(args, self.scope.as_ref())
    }

    #[inline]
    pub fn scope(&self) -> Option<&Table> {
        self.scope.as_ref()
    }

    #[inline]
    fn addr(&self) -> usize {
        self.func as usize
    }

    /// Identity: same function and same scope.
    pub fn same(&self, other: &Builtin) -> bool {
        self.addr() == other.addr() && same_scope(self.scope.as_ref(), other.scope.as_ref())
    }

    pub fn hash(&self) -> Hash {
        fold_addr(self.addr())
    }

    pub fn repr(&self) -> Result<Str, Error> {
        Str::new(&format!("bfn 0x{:x}", self.addr()))
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Builtin(0x{:x})", self.addr())
    }
}

/// Code that can be called as a closure body.
pub trait Callable {
    fn call(&self, args: &Table, scope: Option<&Table>) -> Result<Value, Error>;
}

/// Shared callable plus captured scope.
#[derive(Clone)]
pub struct Closure {
    code: Rc<dyn Callable>,
    scope: Option<Table>,
}

impl Closure {
    pub fn new(code: Rc<dyn Callable>, scope: Option<Table>) -> Self {
        Closure { code, scope }
    }

    #[inline]
    pub fn call(&self, args: &Table) -> Result<Value, Error> {
        self.code.call(args, self.scope.as_ref())
    }

    #[inline]
    pub fn scope(&self) -> Option<&Table> {
        self.scope.as_ref()
    }

    #[inline]
    fn addr(&self) -> usize {
        Rc::as_ptr(&self.code).cast::<()>() as usize
    }

    /// Identity: same code object and same scope.
    pub fn same(&self, other: &Closure) -> bool {
        self.addr() == other.addr() && same_scope(self.scope.as_ref(), other.scope.as_ref())
    }

    pub fn hash(&self) -> Hash {
        fold_addr(self.addr())
    }

    pub fn repr(&self) -> Result<Str, Error> {
        Str::new(&format!("fn 0x{:x}", self.addr()))
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Closure(0x{:x})", self.addr())
    }
}

fn same_scope(a: Option<&Table>, b: Option<&Table>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a == b,
        (None, None) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests;
