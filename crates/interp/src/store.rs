//! The stack store: an infinite family of value stacks indexed by signed
//! integer, one of which is active.
//!
//! Indices that were never touched behave as empty, non-sticky stacks.
//! Popping an empty stack yields integer 0; popping a sticky stack returns
//! the top without removing it.

use std::collections::{HashMap, HashSet};

use aceto_common::Value;
use rand::seq::SliceRandom;
use rand::Rng;

/// All stacks, the sticky flags, and the active index.
#[derive(Debug, Default)]
pub struct StackStore {
    stacks: HashMap<i64, Vec<Value>>,
    sticky: HashSet<i64>,
    active: i64,
}

impl StackStore {
    pub fn new() -> Self {
        StackStore::default()
    }

    /// Index of the active stack.
    pub fn active_index(&self) -> i64 {
        self.active
    }

    /// Move the active index left (negative) or right (positive).
    pub fn shift_active(&mut self, delta: i64) {
        self.active = self.active.wrapping_add(delta);
    }

    /// Push onto the active stack.
    pub fn push(&mut self, value: Value) {
        self.stacks.entry(self.active).or_default().push(value);
    }

    /// Push onto an arbitrary stack without changing the active index.
    pub fn push_to(&mut self, index: i64, value: Value) {
        self.stacks.entry(index).or_default().push(value);
    }

    /// Pop from the active stack. Sticky stacks keep their top; empty
    /// stacks yield integer 0.
    pub fn pop(&mut self) -> Value {
        let stack = self.stacks.entry(self.active).or_default();
        if self.sticky.contains(&self.active) {
            stack.last().cloned().unwrap_or_else(|| Value::int(0))
        } else {
            stack.pop().unwrap_or_else(|| Value::int(0))
        }
    }

    /// Mark the active stack sticky (or not).
    pub fn set_sticky(&mut self, sticky: bool) {
        if sticky {
            self.sticky.insert(self.active);
        } else {
            self.sticky.remove(&self.active);
        }
    }

    /// Number of values on the active stack.
    pub fn len(&self) -> usize {
        self.stacks.get(&self.active).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop everything on the active stack.
    pub fn clear(&mut self) {
        self.stacks.entry(self.active).or_default().clear();
    }

    /// Read-only view of the active stack, bottom first.
    pub fn values(&self) -> &[Value] {
        match self.stacks.get(&self.active) {
            Some(stack) => stack,
            None => &[],
        }
    }

    /// Whether a value occurs anywhere on the active stack.
    pub fn contains(&self, value: &Value) -> bool {
        self.values().iter().any(|v| v.loose_eq(value))
    }

    /// Swap the two topmost values (via pop/push, so sticky and underflow
    /// defaults apply).
    pub fn swap(&mut self) {
        let b = self.pop();
        let a = self.pop();
        self.push(b);
        self.push(a);
    }

    /// Duplicate the top value.
    pub fn dup(&mut self) {
        let v = self.pop();
        self.push(v.clone());
        self.push(v);
    }

    /// Drop everything but the top value.
    pub fn head(&mut self) {
        let v = self.pop();
        self.clear();
        self.push(v);
    }

    /// Reverse the active stack in place.
    pub fn reverse(&mut self) {
        self.stacks.entry(self.active).or_default().reverse();
    }

    /// Move the bottom value to the top (`Q`).
    pub fn rotate_up(&mut self) {
        let stack = self.stacks.entry(self.active).or_default();
        if stack.len() > 1 {
            let bottom = stack.remove(0);
            stack.push(bottom);
        }
    }

    /// Move the top value to the bottom (`q`).
    pub fn rotate_down(&mut self) {
        let stack = self.stacks.entry(self.active).or_default();
        if let Some(top) = stack.pop() {
            stack.insert(0, top);
        }
    }

    /// Replace the stack with `count` concatenated copies of itself.
    pub fn repeat(&mut self, count: usize) {
        let stack = self.stacks.entry(self.active).or_default();
        if count == 0 {
            stack.clear();
        } else {
            let original = stack.clone();
            for _ in 1..count {
                stack.extend(original.iter().cloned());
            }
        }
    }

    /// Shuffle the active stack with the interpreter's PRNG.
    pub fn shuffle<R: Rng>(&mut self, rng: &mut R) {
        self.stacks.entry(self.active).or_default().shuffle(rng);
    }
}
