//! Property-Based Tests for the Priority Heap
//!
//! Random interleavings of set/pop/delete are replayed against a sorted
//! `BTreeMap` oracle, with a full structural check after every step.

use proptest::prelude::*;
use std::collections::{BTreeMap, HashMap};

use crate::error::HeapError;
use crate::heap::PriorityHeap;

// == Strategies ==
#[derive(Debug, Clone)]
enum HeapOp {
    Set { key: u8, priority: i32 },
    Pop,
    Delete { key: u8 },
}

fn heap_op_strategy() -> impl Strategy<Value = HeapOp> {
    prop_oneof![
        4 => (0u8..48, -500i32..500).prop_map(|(key, priority)| HeapOp::Set { key, priority }),
        2 => Just(HeapOp::Pop),
        1 => (0u8..48).prop_map(|key| HeapOp::Delete { key }),
    ]
}

// == Oracle ==
/// Reference model: key -> priority plus the ordered priority set.
#[derive(Default)]
struct Oracle {
    by_key: HashMap<u8, i32>,
    by_priority: BTreeMap<i32, u8>,
}

impl Oracle {
    fn set(&mut self, key: u8, priority: i32) -> Result<(), HeapError> {
        if let Some(&current) = self.by_key.get(&key) {
            if priority >= current {
                return Err(HeapError::PriorityNotDecreased);
            }
        }
        if self.by_priority.contains_key(&priority) {
            return Err(HeapError::DuplicatePriority);
        }
        if let Some(current) = self.by_key.insert(key, priority) {
            self.by_priority.remove(&current);
        }
        self.by_priority.insert(priority, key);
        Ok(())
    }

    fn pop(&mut self) -> Option<(u8, i32)> {
        let (&priority, &key) = self.by_priority.iter().next()?;
        self.by_priority.remove(&priority);
        self.by_key.remove(&key);
        Some((key, priority))
    }

    fn delete(&mut self, key: u8) -> Option<i32> {
        let priority = self.by_key.remove(&key)?;
        self.by_priority.remove(&priority);
        Some(priority)
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    // Every operation agrees with the oracle and leaves the structure valid.
    #[test]
    fn prop_matches_sorted_oracle(ops in prop::collection::vec(heap_op_strategy(), 1..300)) {
        let mut heap = PriorityHeap::new();
        let mut oracle = Oracle::default();

        for op in ops {
            match op {
                HeapOp::Set { key, priority } => {
                    prop_assert_eq!(heap.set(key, priority), oracle.set(key, priority));
                }
                HeapOp::Pop => {
                    prop_assert_eq!(heap.pop(), oracle.pop());
                }
                HeapOp::Delete { key } => {
                    prop_assert_eq!(heap.delete(&key), oracle.delete(key));
                }
            }

            prop_assert!(heap.check_invariants().is_ok(), "{:?}", heap.check_invariants());
            prop_assert_eq!(heap.len(), oracle.by_key.len());
            prop_assert_eq!(
                heap.peek().map(|(key, priority)| (*key, *priority)),
                oracle.by_priority.iter().next().map(|(priority, key)| (*key, *priority))
            );
        }

        // Drain: strictly increasing priorities
        let mut last = None;
        while let Some((key, priority)) = heap.pop() {
            prop_assert_eq!(Some((key, priority)), oracle.pop());
            if let Some(previous) = last {
                prop_assert!(priority > previous);
            }
            last = Some(priority);
        }
        prop_assert!(oracle.by_key.is_empty());
    }

    // Decrease-heavy workloads exercise cuts and cascading cuts.
    #[test]
    fn prop_decrease_after_consolidation(
        count in 8usize..120,
        decreases in prop::collection::vec((0usize..120, 1i64..1000), 1..200),
    ) {
        let mut heap = PriorityHeap::new();
        let mut oracle: HashMap<usize, i64> = HashMap::new();
        for key in 0..count {
            let priority = (key as i64 + 1) * 1_000_000;
            heap.set(key, priority).unwrap();
            oracle.insert(key, priority);
        }
        // Pop once so the root ring gets consolidated into trees
        heap.pop();
        oracle.remove(&0);

        let mut used: std::collections::HashSet<i64> = oracle.values().copied().collect();
        for (key, delta) in decreases {
            let key = key % count;
            let Some(&current) = oracle.get(&key) else { continue };
            let next = current - delta;
            if used.contains(&next) {
                continue;
            }
            heap.set(key, next).unwrap();
            used.remove(&current);
            used.insert(next);
            oracle.insert(key, next);
            prop_assert!(heap.check_invariants().is_ok(), "{:?}", heap.check_invariants());
        }

        let mut expected: Vec<(usize, i64)> = oracle.into_iter().collect();
        expected.sort_by_key(|&(_, priority)| priority);
        let drained: Vec<(usize, i64)> = std::iter::from_fn(|| heap.pop()).collect();
        prop_assert_eq!(drained, expected);
    }

    // Iteration reports every live key by descending priority.
    #[test]
    fn prop_iter_descending(priorities in prop::collection::hash_set(-1000i32..1000, 0..64)) {
        let mut heap = PriorityHeap::new();
        for (key, &priority) in priorities.iter().enumerate() {
            heap.set(key, priority).unwrap();
        }

        let seen: Vec<i32> = heap.iter().map(|(_, priority)| *priority).collect();
        let mut expected: Vec<i32> = priorities.into_iter().collect();
        expected.sort_unstable_by(|a, b| b.cmp(a));
        prop_assert_eq!(seen, expected);
    }
}
