//! Property-based tests for tables.
//!
//! Random sequences of inserts, deletes and appends are replayed against a
//! plain map model and the table is checked to agree with it after every
//! step. Structural invariants (load factor, stride order, resize) and the
//! ownership of shared children are checked alongside.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]
#![allow(
    clippy::cast_precision_loss,
    clippy::redundant_closure_for_method_calls,
    reason = "Proptest strategies generate code with these patterns"
)]

use mu_value::{Stride, Table, Value};
use proptest::prelude::*;
use rustc_hash::FxHashMap;

// ── Model ──

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum Key {
    Index(u8),
    Fraction(i8),
    Name(String),
}

impl Key {
    fn value(&self) -> Value {
        match self {
            Key::Index(i) => Value::Number(f64::from(*i)),
            Key::Fraction(n) => Value::Number(f64::from(*n) + 0.5),
            Key::Name(s) => Value::string(s).expect("string allocation"),
        }
    }
}

#[derive(Clone, Debug)]
enum Op {
    Insert(Key, i16),
    Delete(Key),
    Append(i16),
}

fn key_strategy() -> impl Strategy<Value = Key> {
    prop_oneof![
        4 => (0u8..24).prop_map(Key::Index),
        1 => any::<i8>().prop_map(Key::Fraction),
        2 => "[a-d]{1,3}".prop_map(Key::Name),
    ]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (key_strategy(), any::<i16>()).prop_map(|(k, v)| Op::Insert(k, v)),
        2 => key_strategy().prop_map(Op::Delete),
        3 => any::<i16>().prop_map(Op::Append),
    ]
}

fn apply(table: &Table, model: &mut FxHashMap<Key, i16>, op: &Op) {
    match op {
        Op::Insert(key, v) => {
            table
                .insert(key.value(), Value::Number(f64::from(*v)))
                .unwrap();
            model.insert(key.clone(), *v);
        }
        Op::Delete(key) => {
            table.insert(key.value(), Value::Nil).unwrap();
            model.remove(key);
        }
        Op::Append(v) => {
            let at = table.len();
            table.add(Value::Number(f64::from(*v))).unwrap();
            model.insert(Key::Index(u8::try_from(at).unwrap_or(u8::MAX)), *v);
        }
    }
}

fn agrees(table: &Table, model: &FxHashMap<Key, i16>) -> bool {
    table.len() == model.len()
        && model
            .iter()
            .all(|(k, v)| table.lookup(&k.value()) == Value::Number(f64::from(*v)))
}

/// Sorted `(key, value)` renderings of every live entry.
fn snapshot(table: &Table) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = table
        .entries()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    pairs.sort();
    pairs
}

// ── Properties ──

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Every live key maps to its last inserted value.
    #[test]
    fn matches_map_model(ops in prop::collection::vec(op_strategy(), 0..120)) {
        let table = Table::new(0);
        let mut model = FxHashMap::default();
        for op in &ops {
            // Appends beyond the model's key range would alias u8::MAX
            if matches!(op, Op::Append(_)) && table.len() >= usize::from(u8::MAX) {
                continue;
            }
            apply(&table, &mut model, op);
            prop_assert!(agrees(&table, &model), "diverged after {op:?}");
        }
    }

    /// Deleted keys read as nil and leave every other key intact.
    #[test]
    fn delete_removes_only_the_key(
        keys in prop::collection::hash_set(key_strategy(), 1..40),
        pick in any::<prop::sample::Index>(),
    ) {
        let keys: Vec<Key> = keys.into_iter().collect();
        let table = Table::new(0);
        for (i, key) in keys.iter().enumerate() {
            table.insert(key.value(), Value::Number(i as f64)).unwrap();
        }

        let victim = pick.index(keys.len());
        table.insert(keys[victim].value(), Value::Nil).unwrap();

        prop_assert_eq!(table.lookup(&keys[victim].value()), Value::Nil);
        prop_assert_eq!(table.len(), keys.len() - 1);
        for (i, key) in keys.iter().enumerate().filter(|(i, _)| *i != victim) {
            prop_assert_eq!(table.lookup(&key.value()), Value::Number(i as f64));
        }
    }

    /// Representations only move forward, and the load stays bounded.
    #[test]
    fn stride_is_monotonic_and_load_bounded(ops in prop::collection::vec(op_strategy(), 0..120)) {
        let table = Table::new(0);
        let mut model = FxHashMap::default();
        let mut stride = table.stride();
        for op in &ops {
            apply(&table, &mut model, op);
            prop_assert!(table.stride() >= stride);
            stride = table.stride();

            prop_assert!(table.capacity().is_power_of_two());
            if stride == Stride::Hash {
                let load = table.len() + table.tombstones();
                prop_assert!(3 * load <= 2 * table.capacity());
            }
        }
    }

    /// The entries seen by iteration survive every resize unchanged.
    #[test]
    fn resize_preserves_entries(ops in prop::collection::vec(op_strategy(), 1..150)) {
        let table = Table::new(0);
        let mut model = FxHashMap::default();
        for op in &ops {
            let capacity = table.capacity();
            let len = table.len();
            let before = snapshot(&table);
            apply(&table, &mut model, op);
            if table.capacity() == capacity {
                continue;
            }

            // A resize happens before the triggering write lands
            let mut after = snapshot(&table);
            let written = match op {
                Op::Insert(key, _) => Some(key.value()),
                Op::Append(_) => Some(Value::index(len)),
                Op::Delete(_) => None,
            };
            if let Some(key) = written {
                let key = key.to_string();
                after.retain(|(k, _)| *k != key);
                let mut trimmed = before.clone();
                trimmed.retain(|(k, _)| *k != key);
                prop_assert_eq!(after, trimmed);
            } else {
                prop_assert_eq!(after, before);
            }
        }
    }

    /// A key missing locally is found in the tail; local keys shadow it.
    #[test]
    fn tail_fallback(
        parent_keys in prop::collection::hash_set("[a-f]{1,2}", 0..20),
        child_keys in prop::collection::hash_set("[a-f]{1,2}", 0..20),
    ) {
        let parent = Table::new(0);
        for k in &parent_keys {
            parent.insert(Value::string(k).unwrap(), Value::from("parent")).unwrap();
        }
        let child = Table::new(0);
        child.set_tail(Some(parent.clone())).unwrap();
        for k in &child_keys {
            child.insert(Value::string(k).unwrap(), Value::from("child")).unwrap();
        }

        for k in parent_keys.union(&child_keys) {
            let expected = if child_keys.contains(k) { "child" } else { "parent" };
            prop_assert_eq!(child.lookup(&Value::string(k).unwrap()), Value::from(expected));
        }
    }

    /// Shared children are released exactly when their last owner goes.
    #[test]
    fn shared_children_are_released(
        links in prop::collection::vec(prop::collection::vec(0usize..8, 0..8), 1..8),
    ) {
        let before = mu_mem::stats().live_bytes;
        let children: Vec<Table> = (0..8)
            .map(|i| {
                let child = Table::new(0);
                child.insert(Value::from("id"), Value::Number(i as f64)).unwrap();
                child
            })
            .collect();

        let parents: Vec<Table> = links
            .iter()
            .map(|picks| {
                let parent = Table::new(0);
                for &c in picks {
                    parent.add(Value::Table(children[c].clone())).unwrap();
                }
                parent
            })
            .collect();

        for (c, child) in children.iter().enumerate() {
            let owners = links.iter().flatten().filter(|&&p| p == c).count();
            prop_assert_eq!(child.ref_count(), 1 + owners);
        }

        drop(parents);
        for child in &children {
            prop_assert_eq!(child.ref_count(), 1);
        }

        drop(children);
        prop_assert_eq!(mu_mem::stats().live_bytes, before);
    }
}
