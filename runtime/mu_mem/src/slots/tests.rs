use std::cell::Cell;
use std::rc::Rc;

use pretty_assertions::assert_eq;

use super::*;
use crate::{configure, stats, MemConfig};

#[test]
fn new_slots_are_default() {
    let slots = Slots::<u64>::new(4);
    let Ok(slots) = slots else {
        panic!("allocation failed");
    };
    assert_eq!(slots.capacity(), 4);
    assert_eq!(&*slots, &[0, 0, 0, 0]);
}

#[test]
fn empty_does_not_allocate() {
    let slots = Slots::<u64>::empty();
    assert_eq!(slots.capacity(), 0);
    assert!(slots.is_empty());
    assert_eq!(stats().allocations, 0);

    let zero = Slots::<u64>::new(0);
    assert!(zero.is_ok_and(|s| s.capacity() == 0));
    assert_eq!(stats().allocations, 0);
}

#[test]
fn grow_keeps_values_and_defaults_tail() {
    let Ok(mut slots) = Slots::<u64>::new(2) else {
        panic!("allocation failed");
    };
    slots[0] = 7;
    slots[1] = 9;

    assert!(slots.grow(5).is_ok());
    assert_eq!(&*slots, &[7, 9, 0, 0, 0]);

    // shrinking requests are ignored
    assert!(slots.grow(1).is_ok());
    assert_eq!(slots.capacity(), 5);
}

#[test]
fn grow_from_empty_allocates() {
    let mut slots = Slots::<u64>::empty();
    assert!(slots.grow(3).is_ok());
    assert_eq!(slots.capacity(), 3);
}

#[test]
fn failed_grow_leaves_buffer_intact() {
    let Ok(mut slots) = Slots::<u64>::new(2) else {
        panic!("allocation failed");
    };
    slots[1] = 42;

    configure(MemConfig::with_limit(stats().live_bytes));
    assert!(slots.grow(64).is_err());
    assert_eq!(slots.capacity(), 2);
    assert_eq!(slots[1], 42);
}

#[derive(Default)]
struct DropProbe(Option<Rc<Cell<usize>>>);

impl Drop for DropProbe {
    fn drop(&mut self) {
        if let Some(counter) = &self.0 {
            counter.set(counter.get() + 1);
        }
    }
}

#[test]
fn drop_releases_every_slot_and_block() {
    let drops = Rc::new(Cell::new(0));
    {
        let Ok(mut slots) = Slots::<DropProbe>::new(3) else {
            panic!("allocation failed");
        };
        slots[0] = DropProbe(Some(Rc::clone(&drops)));
        slots[2] = DropProbe(Some(Rc::clone(&drops)));
        assert!(slots.grow(8).is_ok());
    }
    assert_eq!(drops.get(), 2);
    assert_eq!(stats().live_bytes, 0);
}
