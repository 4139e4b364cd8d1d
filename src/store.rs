//! The abstract store: a mapping from variable names to intervals.
//!
//! A store is a value, threaded through evaluation; branch evaluation clones
//! it and joins the results back at the merge point. A missing key means
//! "unconstrained" and reads as ⊤, so store equality, join and meet are all
//! *extensional*: they compare and combine effective lookups over the union
//! of keys, not the raw maps.
//!
//! Next to the working map lives the precondition slot. It is written once,
//! while the pre-condition block at the top of the program is processed, and
//! consulted afterwards whenever a variable read misses the working map.
//!
//! Assigning ⊥ to any variable makes the whole store ⊥ (the program point is
//! unreachable); further updates are no-ops.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::domain::Lattice;
use crate::interval::Interval;

/// Abstract store for one program point.
///
/// `BTreeMap` keeps iteration (and thus joins, equality checks, and rendered
/// output) deterministic.
#[derive(Debug, Clone, Default)]
pub struct IntervalStore {
    vars: BTreeMap<String, Interval>,
    pre: BTreeMap<String, Interval>,
    unreachable: bool,
}

impl IntervalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Effective lookup: working map, then the precondition slot, then ⊤.
    /// On a ⊥ store every variable reads as ⊥.
    pub fn get(&self, var: &str) -> Interval {
        if self.unreachable {
            return Interval::EMPTY;
        }
        self.vars
            .get(var)
            .or_else(|| self.pre.get(var))
            .copied()
            .unwrap_or(Interval::TOP)
    }

    /// Update a variable. Assigning ⊥ marks the whole store unreachable;
    /// updates on a ⊥ store are no-ops.
    pub fn set(&mut self, var: &str, value: Interval) {
        if self.unreachable {
            return;
        }
        if value.is_empty() {
            self.unreachable = true;
        } else {
            self.vars.insert(var.to_string(), value);
        }
    }

    /// Whether the working map has an entry for `var` (the precondition slot
    /// does not count).
    pub fn is_set(&self, var: &str) -> bool {
        self.vars.contains_key(var)
    }

    /// Mark this program point unreachable (the whole store becomes ⊥).
    pub fn mark_unreachable(&mut self) {
        self.unreachable = true;
    }

    /// Narrow `var`'s precondition interval by `value`, seeding both the
    /// precondition slot and the working map. Only used while the
    /// pre-condition block is being processed; the slot is read-only
    /// afterwards.
    pub fn constrain(&mut self, var: &str, value: Interval) {
        let narrowed = self.pre.get(var).copied().unwrap_or(Interval::TOP).meet(&value);
        self.pre.insert(var.to_string(), narrowed);
        self.set(var, narrowed);
    }

    /// The precondition interval of `var`, if the pre-condition block
    /// constrained it.
    pub fn precondition(&self, var: &str) -> Option<Interval> {
        self.pre.get(var).copied()
    }

    /// Union of the keys of both stores (working maps and precondition slots).
    fn key_union<'a>(&'a self, other: &'a IntervalStore) -> BTreeSet<&'a str> {
        self.vars
            .keys()
            .chain(self.pre.keys())
            .chain(other.vars.keys())
            .chain(other.pre.keys())
            .map(String::as_str)
            .collect()
    }

    fn pointwise(&self, other: &IntervalStore, op: impl Fn(&Interval, &Interval) -> Interval) -> IntervalStore {
        let mut result = IntervalStore {
            vars: BTreeMap::new(),
            pre: self.pre.clone(),
            unreachable: false,
        };
        for var in self.key_union(other) {
            result.set(var, op(&self.get(var), &other.get(var)));
            if result.unreachable {
                break;
            }
        }
        result
    }
}

/// Extensional equality: ⊥ is unique, and otherwise all keys of either store
/// must read equal (missing ≡ ⊤).
impl PartialEq for IntervalStore {
    fn eq(&self, other: &Self) -> bool {
        if self.unreachable || other.unreachable {
            return self.unreachable == other.unreachable;
        }
        self.key_union(other).into_iter().all(|var| self.get(var) == other.get(var))
    }
}

impl Eq for IntervalStore {}

impl Lattice for IntervalStore {
    fn bottom() -> Self {
        Self {
            vars: BTreeMap::new(),
            pre: BTreeMap::new(),
            unreachable: true,
        }
    }

    /// The empty store: every variable reads as ⊤.
    fn top() -> Self {
        Self::new()
    }

    fn is_bottom(&self) -> bool {
        self.unreachable
    }

    fn le(&self, other: &Self) -> bool {
        if self.unreachable {
            return true;
        }
        if other.unreachable {
            return false;
        }
        self.key_union(other).into_iter().all(|var| self.get(var).le(&other.get(var)))
    }

    /// Pointwise join; ⊥ is the identity.
    fn join(&self, other: &Self) -> Self {
        if self.unreachable {
            return other.clone();
        }
        if other.unreachable {
            return self.clone();
        }
        self.pointwise(other, Interval::join)
    }

    /// Pointwise meet; any empty entry collapses the store to ⊥.
    fn meet(&self, other: &Self) -> Self {
        if self.unreachable || other.unreachable {
            return Self::bottom();
        }
        self.pointwise(other, Interval::meet)
    }

    fn widen(&self, other: &Self) -> Self {
        if self.unreachable {
            return other.clone();
        }
        if other.unreachable {
            return self.clone();
        }
        self.pointwise(other, Interval::widen)
    }
}

impl fmt::Display for IntervalStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unreachable {
            return write!(f, "⊥");
        }
        if self.vars.is_empty() {
            return write!(f, "⊤");
        }
        let mut first = true;
        for (var, interval) in &self.vars {
            if !first {
                writeln!(f)?;
            }
            write!(f, "{} -> {}", var, interval)?;
            first = false;
        }
        Ok(())
    }
}
