//! Table mutation: insert, assign, append, and the representation changes
//! (realization and resizing) they trigger.

use std::mem;

use mu_mem::Slots;

use super::{capacity_for, load_capacity, next_probe, Stride, Table, TableData};
use crate::error::Error;
use crate::num;
use crate::value::{Hash, Value};

impl TableData {
    /// `Range` → `List`: materialize the sequence into an array.
    pub(super) fn realize_list(&mut self) -> Result<(), Error> {
        debug_assert_eq!(self.stride, Stride::Range);
        let mut array = Slots::new(self.capacity())?;
        for (i, slot) in array.iter_mut().take(self.len).enumerate() {
            *slot = Value::Number(self.range_value(i));
        }

        self.array = array;
        self.stride = Stride::List;
        tracing::debug!(len = self.len, capacity = self.capacity(), "table realized as list");
        Ok(())
    }

    /// `Range`/`List` → `Hash`: every index `i` becomes the key of the pair
    /// in slot `i`, which is its home slot.
    pub(super) fn realize_hash(&mut self) -> Result<(), Error> {
        debug_assert!(self.stride < Stride::Hash);
        let slots = self.capacity().checked_mul(2).ok_or(Error::OutOfMemory)?;
        let mut pairs: Slots<Value> = Slots::new(slots)?;
        for i in 0..self.len {
            pairs[2 * i] = Value::index(i);
            pairs[2 * i + 1] = match self.stride {
                Stride::Range => Value::Number(self.range_value(i)),
                _ => mem::take(&mut self.array[i]),
            };
        }

        self.array = pairs;
        self.stride = Stride::Hash;
        tracing::debug!(len = self.len, capacity = self.capacity(), "table realized as hash");
        Ok(())
    }

    /// Resize for `size` live entries, rehashing a `Hash` table and
    /// discarding its tombstones.
    fn resize(&mut self, size: usize) -> Result<(), Error> {
        let cap = capacity_for(size).ok_or(Error::OutOfMemory)?;
        match self.stride {
            Stride::Range => {}
            Stride::List => {
                let cap = cap.max(self.capacity());
                self.array.grow(cap)?;
                self.mask = cap - 1;
            }
            Stride::Hash => {
                let slots = cap.checked_mul(2).ok_or(Error::OutOfMemory)?;
                let mut pairs: Slots<Value> = Slots::new(slots)?;
                let mask = cap - 1;
                for j in 0..self.capacity() {
                    let key = mem::take(&mut self.array[2 * j]);
                    let val = mem::take(&mut self.array[2 * j + 1]);
                    if key.is_nil() || val.is_nil() {
                        continue;
                    }

                    let mut i = key.hash() as usize & mask;
                    while !pairs[2 * i].is_nil() {
                        i = next_probe(i, mask);
                    }
                    pairs[2 * i] = key;
                    pairs[2 * i + 1] = val;
                }
                self.array = pairs;
                self.nils = 0;
            }
        }
        if self.stride != Stride::List {
            self.mask = cap - 1;
        }

        tracing::debug!(
            stride = ?self.stride,
            len = self.len,
            capacity = self.capacity(),
            "table resized"
        );
        Ok(())
    }

    /// Make room for one more entry.
    fn reserve_one(&mut self) -> Result<(), Error> {
        let load = self.nils.saturating_add(self.len).saturating_add(1);
        if !load_capacity(load).is_some_and(|need| need <= self.capacity()) {
            self.resize(self.len.saturating_add(1))?;
        }
        Ok(())
    }

    /// Insert or overwrite a non-nil value.
    fn store(&mut self, key: Value, hash: Hash, val: Value) -> Result<(), Error> {
        self.reserve_one()?;

        if self.stride < Stride::Hash {
            if let Some(i) = num::index_of(&key, hash) {
                if i == self.len {
                    if self.stride == Stride::Range {
                        if let Some(n) = val.as_number() {
                            if self.len == 0 {
                                if let Some(first) = num::integral(n) {
                                    self.offset = first;
                                }
                            }
                            if num::equals(n, self.range_value(i)) {
                                self.len += 1;
                                return Ok(());
                            }
                        }
                        self.realize_list()?;
                    }
                    self.array[i] = val;
                    self.len += 1;
                    return Ok(());
                }

                if i < self.len {
                    if self.stride == Stride::Range {
                        if val.as_number().is_some_and(|n| num::equals(n, self.range_value(i))) {
                            return Ok(());
                        }
                        self.realize_list()?;
                    }
                    self.array[i] = val;
                    return Ok(());
                }
            }
            self.realize_hash()?;
        }

        let mask = self.mask;
        let mut i = hash as usize & mask;
        for _ in 0..=mask {
            let k = &self.array[2 * i];
            if k.is_nil() {
                self.array[2 * i] = key;
                self.array[2 * i + 1] = val;
                self.len += 1;
                return Ok(());
            }
            if k.equals(&key) {
                if self.array[2 * i + 1].is_nil() {
                    self.nils -= 1;
                    self.len += 1;
                }
                self.array[2 * i + 1] = val;
                return Ok(());
            }
            i = next_probe(i, mask);
        }
        unreachable!("probe found no free slot in a table below its load factor")
    }

    /// Delete `key` from this table. Returns whether an entry was removed.
    ///
    /// Removing the last position of a positional table just shortens it;
    /// removing any other position first converts the table to `Hash`.
    fn remove(&mut self, key: &Value, hash: Hash) -> Result<bool, Error> {
        if self.stride < Stride::Hash {
            let Some(i) = num::index_of(key, hash).filter(|&i| i < self.len) else {
                return Ok(false);
            };
            if i + 1 == self.len {
                if self.stride == Stride::List {
                    drop(mem::take(&mut self.array[i]));
                }
                self.len -= 1;
                return Ok(true);
            }
            self.realize_hash()?;
        }

        let Some(i) = self.find_slot(key, hash) else {
            return Ok(false);
        };
        if self.array[2 * i + 1].is_nil() {
            return Ok(false);
        }
        drop(mem::take(&mut self.array[2 * i + 1]));
        self.nils += 1;
        self.len -= 1;
        Ok(true)
    }

    /// Overwrite `key` only if it already has a live entry here.
    fn update(&mut self, key: &Value, hash: Hash, val: &Value) -> Result<bool, Error> {
        if self.stride < Stride::Hash {
            let Some(i) = num::index_of(key, hash).filter(|&i| i < self.len) else {
                return Ok(false);
            };
            if self.stride == Stride::Range {
                if val.as_number().is_some_and(|n| num::equals(n, self.range_value(i))) {
                    return Ok(true);
                }
                self.realize_list()?;
            }
            self.array[i] = val.clone();
            return Ok(true);
        }

        match self.find_slot(key, hash) {
            Some(i) if !self.array[2 * i + 1].is_nil() => {
                self.array[2 * i + 1] = val.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

impl Table {
    /// Set `key` to `val` in this table, ignoring the tail.
    ///
    /// A nil `val` deletes the key; a nil `key` is ignored. Fails with
    /// [`Error::ReadOnly`] through a read-only handle and with
    /// [`Error::OutOfMemory`] when growth fails, leaving the table as it was.
    pub fn insert(&self, key: Value, val: Value) -> Result<(), Error> {
        self.check_writable()?;
        if key.is_nil() {
            return Ok(());
        }

        let hash = key.hash();
        let mut data = self.data.borrow_mut();
        if val.is_nil() {
            data.remove(&key, hash).map(|_| ())
        } else {
            data.store(key, hash, val)
        }
    }

    /// Append `val` at position `len`.
    pub fn add(&self, val: Value) -> Result<(), Error> {
        let at = Value::index(self.len());
        self.insert(at, val)
    }

    /// Scope assignment: overwrite `key` in the nearest link of the chain
    /// that has it, otherwise insert it here.
    ///
    /// Read-only links are passed over while searching. A nil `val`
    /// deletes the nearest writable occurrence and is a no-op when there is
    /// none.
    pub fn assign(&self, key: Value, val: Value) -> Result<(), Error> {
        if key.is_nil() {
            return Ok(());
        }

        let hash = key.hash();
        let mut link = Some(self.clone());
        while let Some(table) = link {
            if !table.is_read_only() {
                let mut data = table.data.borrow_mut();
                let done = if val.is_nil() {
                    data.remove(&key, hash)?
                } else {
                    data.update(&key, hash, &val)?
                };
                if done {
                    return Ok(());
                }
            }
            link = table.tail();
        }

        if val.is_nil() {
            return Ok(());
        }
        self.check_writable()?;
        self.data.borrow_mut().store(key, hash, val)
    }
}
