//! Tables: the hybrid array / hash map / scope container.
//!
//! # Representations
//!
//! A table picks the cheapest representation its contents allow and only
//! ever moves forward (`Range` → `List` → `Hash`):
//!
//! ```text
//! Range  no array; entries 0..len are offset, offset+1, ...
//! List   array[i] holds the value of index i (capacity slots)
//! Hash   array[2i], array[2i+1] hold key, value (2 * capacity slots)
//! ```
//!
//! Hash tables probe with `i = 5i + 1 (mod capacity)`, which visits every
//! slot of a power-of-two table, and keep the load (live entries plus
//! tombstones) at most 2/3 of capacity. A tombstone is a slot with a key and
//! a nil value.
//!
//! # Handles
//!
//! [`Table`] is a shared handle to one storage. A handle is either
//! read-write or read-only; both kinds may point at the same storage, and
//! mutation through a read-only handle fails with [`Error::ReadOnly`].
//! Each table may have a tail table that lookups fall back to, forming a
//! scope chain.

mod insert;
mod iter;
mod repr;

use std::cell::RefCell;
use std::fmt;
use std::mem;
use std::rc::Rc;

use mu_mem::Slots;

use crate::error::Error;
use crate::num;
use crate::value::{fold_addr, Hash, Value};

pub use iter::Entries;

/// Table representation, in the order a table moves through them.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stride {
    /// Arithmetic sequence with no backing array.
    Range = 0,
    /// Dense array of values.
    List = 1,
    /// Open-addressed key/value pairs.
    Hash = 2,
}

/// Write permission carried by a handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Access {
    ReadWrite,
    ReadOnly,
}

/// Shared handle to a table.
#[derive(Clone)]
pub struct Table {
    data: Rc<RefCell<TableData>>,
    access: Access,
}

struct TableData {
    /// `capacity - 1`; capacity is always a power of two.
    mask: usize,
    /// Live entries.
    len: usize,
    /// Tombstones (`Hash` only).
    nils: usize,
    /// First value of a `Range` table.
    offset: i64,
    stride: Stride,
    array: Slots<Value>,
    tail: Option<Table>,
}

/// Largest power-of-two capacity; hints past it are clamped.
const MAX_CAPACITY: usize = 1 << (usize::BITS - 1);

/// Capacity needed to keep `n` entries at or below the 2/3 load factor.
#[inline]
fn load_capacity(n: usize) -> Option<usize> {
    n.checked_add(n.div_ceil(2))
}

/// Power-of-two capacity for `n` entries, `None` past [`MAX_CAPACITY`].
#[inline]
fn capacity_for(n: usize) -> Option<usize> {
    load_capacity(n)?.checked_next_power_of_two()
}

/// Next slot of the probe sequence.
#[inline]
fn next_probe(i: usize, mask: usize) -> usize {
    i.wrapping_mul(5).wrapping_add(1) & mask
}

impl TableData {
    fn new(cap: usize) -> Self {
        debug_assert!(cap.is_power_of_two());
        TableData {
            mask: cap - 1,
            len: 0,
            nils: 0,
            offset: 0,
            stride: Stride::Range,
            array: Slots::empty(),
            tail: None,
        }
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.mask + 1
    }

    /// Value at position `i` of a `Range` table.
    #[allow(clippy::cast_precision_loss, reason = "range values stay well inside f64 precision")]
    fn range_value(&self, i: usize) -> f64 {
        let i = i64::try_from(i).unwrap_or(i64::MAX);
        self.offset.saturating_add(i) as f64
    }

    /// Value at position `i` of a `Range` or `List` table.
    fn positional(&self, i: usize) -> Value {
        match self.stride {
            Stride::Range => Value::Number(self.range_value(i)),
            Stride::List => self.array[i].clone(),
            Stride::Hash => Value::Nil,
        }
    }

    /// Slot of `key` in a `Hash` table, live or tombstoned.
    fn find_slot(&self, key: &Value, hash: Hash) -> Option<usize> {
        let mask = self.mask;
        let mut i = hash as usize & mask;
        for _ in 0..=mask {
            let k = &self.array[2 * i];
            if k.is_nil() {
                return None;
            }
            if k.equals(key) {
                return Some(i);
            }
            i = next_probe(i, mask);
        }
        None
    }

    /// Local (non-chained) lookup.
    fn get(&self, key: &Value, hash: Hash) -> Option<Value> {
        if self.stride < Stride::Hash {
            let i = num::index_of(key, hash).filter(|&i| i < self.len)?;
            return Some(self.positional(i));
        }

        let i = self.find_slot(key, hash)?;
        let val = &self.array[2 * i + 1];
        (!val.is_nil()).then(|| val.clone())
    }
}

impl TableData {
    /// Move the tail and every table held in the array into `out`.
    fn detach_tables(&mut self, out: &mut Vec<Table>) {
        out.extend(self.tail.take());
        for slot in self.array.iter_mut() {
            if matches!(slot, Value::Table(_)) {
                if let Value::Table(table) = mem::take(slot) {
                    out.push(table);
                }
            }
        }
    }
}

impl Drop for TableData {
    fn drop(&mut self) {
        tracing::trace!(len = self.len, stride = ?self.stride, "table released");

        // Uniquely owned children are released from a work list so long
        // chains and deep nesting do not recurse.
        let mut pending = Vec::new();
        self.detach_tables(&mut pending);
        while let Some(table) = pending.pop() {
            if let Ok(cell) = Rc::try_unwrap(table.data) {
                cell.into_inner().detach_tables(&mut pending);
            }
        }
    }
}

impl Table {
    // ── Construction ──

    /// Empty table sized for about `hint` entries. Does not allocate a
    /// backing array.
    ///
    /// Hints too large for any capacity are clamped; the first write that
    /// needs the array then fails with [`Error::OutOfMemory`].
    pub fn new(hint: usize) -> Table {
        let cap = capacity_for(hint.saturating_add(1)).unwrap_or(MAX_CAPACITY);
        Table::from_data(TableData::new(cap))
    }

    /// Empty table that already has a `List` array for `size` entries.
    pub fn with_list(size: usize) -> Result<Table, Error> {
        let mut data = TableData::new(Table::sized(size)?);
        data.realize_list()?;
        Ok(Table::from_data(data))
    }

    /// Empty table that already has a `Hash` array for `size` entries.
    pub fn with_hash(size: usize) -> Result<Table, Error> {
        let mut data = TableData::new(Table::sized(size)?);
        data.realize_hash()?;
        Ok(Table::from_data(data))
    }

    fn sized(size: usize) -> Result<usize, Error> {
        size.checked_add(1)
            .and_then(capacity_for)
            .ok_or(Error::OutOfMemory)
    }

    fn from_data(data: TableData) -> Table {
        Table {
            data: Rc::new(RefCell::new(data)),
            access: Access::ReadWrite,
        }
    }

    /// A read-only handle to the same storage.
    #[must_use]
    pub fn read_only(&self) -> Table {
        Table {
            data: Rc::clone(&self.data),
            access: Access::ReadOnly,
        }
    }

    // ── Accessors ──

    #[inline]
    pub fn access(&self) -> Access {
        self.access
    }

    #[inline]
    pub fn is_read_only(&self) -> bool {
        self.access == Access::ReadOnly
    }

    /// Number of live entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.borrow().len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn stride(&self) -> Stride {
        self.data.borrow().stride
    }

    /// Slot capacity (a power of two).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.borrow().capacity()
    }

    /// Tombstone count.
    #[inline]
    pub fn tombstones(&self) -> usize {
        self.data.borrow().nils
    }

    /// First value of a `Range` table.
    #[inline]
    pub fn offset(&self) -> i64 {
        self.data.borrow().offset
    }

    /// Number of handles sharing this storage.
    #[inline]
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.data)
    }

    // ── Scope chain ──

    pub fn tail(&self) -> Option<Table> {
        self.data.borrow().tail.clone()
    }

    /// Replace the fallback table. Chains must stay acyclic.
    pub fn set_tail(&self, tail: Option<Table>) -> Result<(), Error> {
        self.check_writable()?;
        let old = mem::replace(&mut self.data.borrow_mut().tail, tail);
        drop(old);
        Ok(())
    }

    // ── Lookup ──

    /// Value of `key` here or, failing that, along the tail chain.
    /// Nil when absent anywhere.
    pub fn lookup(&self, key: &Value) -> Value {
        if key.is_nil() {
            return Value::Nil;
        }

        let hash = key.hash();
        let mut link = Some(self.clone());
        while let Some(table) = link {
            let data = table.data.borrow();
            if let Some(val) = data.get(key, hash) {
                return val;
            }
            link = data.tail.clone();
        }
        Value::Nil
    }

    /// Value of `key` in this table only, ignoring the tail.
    pub fn get_local(&self, key: &Value) -> Value {
        if key.is_nil() {
            return Value::Nil;
        }
        self.data
            .borrow()
            .get(key, key.hash())
            .unwrap_or_default()
    }

    /// Lookup used by destructuring: try `key`, then position `index`.
    ///
    /// A table without a tail that is still positional answers from
    /// position `index` directly.
    pub fn lookdn(&self, key: &Value, index: usize) -> Value {
        {
            let data = self.data.borrow();
            if data.tail.is_none() && data.stride < Stride::Hash {
                return if index < data.len {
                    data.positional(index)
                } else {
                    Value::Nil
                };
            }
        }

        let val = self.lookup(key);
        if !val.is_nil() {
            return val;
        }
        self.lookup(&Value::index(index))
    }

    // ── Identity ──

    #[inline]
    fn addr(&self) -> usize {
        Rc::as_ptr(&self.data) as usize
    }

    /// Whether both handles share one storage, regardless of access.
    #[inline]
    pub fn ptr_eq(a: &Table, b: &Table) -> bool {
        Rc::ptr_eq(&a.data, &b.data)
    }

    /// Identity hash of the handle.
    pub fn hash(&self) -> Hash {
        fold_addr(self.addr()) ^ u32::from(self.is_read_only())
    }

    #[inline]
    fn check_writable(&self) -> Result<(), Error> {
        match self.access {
            Access::ReadWrite => Ok(()),
            Access::ReadOnly => Err(Error::ReadOnly),
        }
    }
}

/// Handle identity: same storage and same access.
impl PartialEq for Table {
    fn eq(&self, other: &Table) -> bool {
        Table::ptr_eq(self, other) && self.access == other.access
    }
}

impl Eq for Table {}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.data.borrow();
        f.debug_struct("Table")
            .field("addr", &format_args!("0x{:x}", self.addr()))
            .field("access", &self.access)
            .field("stride", &data.stride)
            .field("len", &data.len)
            .field("capacity", &data.capacity())
            .finish()
    }
}
