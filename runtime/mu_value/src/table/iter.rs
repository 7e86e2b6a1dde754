//! Iteration over tables.
//!
//! Two forms: [`Entries`], a Rust iterator for host code, and
//! [`Table::iterate`], which builds the builtin a script calls repeatedly.
//!
//! The builtin keeps its state in a scope table:
//!
//! ```text
//! scope[0]  table being iterated
//! scope[1]  result table, reused on every call: {0: value, 1: key, 2: i}
//! scope[2]  entries produced so far
//! scope[3]  next slot to scan (Hash tables only)
//! ```
//!
//! The builtin returns the result table per entry and nil once exhausted.

use super::{Stride, Table};
use crate::error::Error;
use crate::function::{Builtin, BuiltinFn};
use crate::value::Value;

const SOURCE: usize = 0;
const RESULT: usize = 1;
const POS: usize = 2;
const SLOT: usize = 3;

/// Iterator over the live `(key, value)` pairs of a table.
///
/// Positional tables yield in index order; `Hash` tables in slot order.
/// Mutating the table while iterating is allowed but may skip or repeat
/// entries.
pub struct Entries {
    table: Table,
    slot: usize,
}

impl Iterator for Entries {
    type Item = (Value, Value);

    fn next(&mut self) -> Option<(Value, Value)> {
        let data = self.table.data.borrow();
        match data.stride {
            Stride::Range | Stride::List => {
                if self.slot >= data.len {
                    return None;
                }
                let i = self.slot;
                self.slot += 1;
                Some((Value::index(i), data.positional(i)))
            }
            Stride::Hash => {
                while self.slot < data.capacity() {
                    let j = self.slot;
                    self.slot += 1;
                    let (key, val) = (&data.array[2 * j], &data.array[2 * j + 1]);
                    if !key.is_nil() && !val.is_nil() {
                        return Some((key.clone(), val.clone()));
                    }
                }
                None
            }
        }
    }
}

impl Table {
    /// Iterator over the live entries of this table (not the tail).
    pub fn entries(&self) -> Entries {
        Entries {
            table: self.clone(),
            slot: 0,
        }
    }

    /// Build the script-facing iteration builtin for this table.
    ///
    /// The strategy is fixed by the representation at creation time.
    pub fn iterate(&self) -> Result<Value, Error> {
        let step: BuiltinFn = match self.stride() {
            Stride::Range => step_range,
            Stride::List => step_list,
            Stride::Hash => step_hash,
        };

        let scope = Table::with_list(4)?;
        let result = Table::with_list(3)?;
        scope.insert(Value::index(SOURCE), Value::Table(self.clone()))?;
        scope.insert(Value::index(RESULT), Value::Table(result))?;
        scope.insert(Value::index(POS), Value::index(0))?;
        scope.insert(Value::index(SLOT), Value::index(0))?;

        Ok(Value::Builtin(Builtin::new(step, Some(scope))))
    }
}

struct Cursor {
    scope: Table,
    source: Table,
    result: Table,
    pos: usize,
}

impl Cursor {
    fn load(scope: Option<&Table>) -> Option<Cursor> {
        let scope = scope?;
        let source = scope.get_local(&Value::index(SOURCE)).as_table()?.clone();
        let result = scope.get_local(&Value::index(RESULT)).as_table()?.clone();
        let pos = counter(scope, POS)?;
        Some(Cursor {
            scope: scope.clone(),
            source,
            result,
            pos,
        })
    }

    /// Publish one entry and advance the position.
    fn emit(&self, key: Value, val: Value) -> Result<Value, Error> {
        self.result.insert(Value::index(0), val)?;
        self.result.insert(Value::index(1), key)?;
        self.result.insert(Value::index(2), Value::index(self.pos))?;
        self.scope.insert(Value::index(POS), Value::index(self.pos + 1))?;
        Ok(Value::Table(self.result.clone()))
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "counters are non-negative integers written by this module"
)]
fn counter(scope: &Table, at: usize) -> Option<usize> {
    let n = scope.get_local(&Value::index(at)).as_number()?;
    Some(n as usize)
}

fn step_positional(scope: Option<&Table>) -> Result<Value, Error> {
    let Some(cursor) = Cursor::load(scope) else {
        return Ok(Value::Nil);
    };

    let val = {
        let data = cursor.source.data.borrow();
        if cursor.pos >= data.len || data.stride == Stride::Hash {
            None
        } else {
            Some(data.positional(cursor.pos))
        }
    };
    match val {
        Some(val) => cursor.emit(Value::index(cursor.pos), val),
        None => Ok(Value::Nil),
    }
}

fn step_range(_args: &Table, scope: Option<&Table>) -> Result<Value, Error> {
    step_positional(scope)
}

fn step_list(_args: &Table, scope: Option<&Table>) -> Result<Value, Error> {
    step_positional(scope)
}

fn step_hash(_args: &Table, scope: Option<&Table>) -> Result<Value, Error> {
    let Some(cursor) = Cursor::load(scope) else {
        return Ok(Value::Nil);
    };
    let Some(mut slot) = scope.and_then(|scope| counter(scope, SLOT)) else {
        return Ok(Value::Nil);
    };

    let found = {
        let data = cursor.source.data.borrow();
        let mut found = None;
        if data.stride == Stride::Hash {
            while slot < data.capacity() {
                let (key, val) = (&data.array[2 * slot], &data.array[2 * slot + 1]);
                slot += 1;
                if !key.is_nil() && !val.is_nil() {
                    found = Some((key.clone(), val.clone()));
                    break;
                }
            }
        }
        found
    };

    let Some((key, val)) = found else {
        return Ok(Value::Nil);
    };
    cursor.scope.insert(Value::index(SLOT), Value::index(slot))?;
    cursor.emit(key, val)
}
