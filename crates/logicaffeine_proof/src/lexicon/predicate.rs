//! Predicates: user-defined and the two fixed system predicates.

use std::collections::HashMap;

use crate::error::ProofError;
use crate::lexicon::coords::TriCoords;

/// The two predicates every logic gets for free. They occupy a reserved
/// negative-index range so they can never collide with a user predicate,
/// whose `index` is always non-negative.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum SystemPredicate {
    /// Binary identity, `a = b`.
    Identity,
    /// Unary existence, `!a` ("a exists").
    Existence,
}

impl SystemPredicate {
    pub const fn arity(self) -> u8 {
        match self {
            SystemPredicate::Identity => 2,
            SystemPredicate::Existence => 1,
        }
    }

    /// Reserved index, always negative so it never aliases a user predicate.
    const fn index(self) -> i32 {
        match self {
            SystemPredicate::Identity => -1,
            SystemPredicate::Existence => -2,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            SystemPredicate::Identity => "Identity",
            SystemPredicate::Existence => "Existence",
        }
    }
}

/// A predicate: either one of the two fixed system predicates, or a
/// user-defined `(index, subscript, arity)` triple.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Predicate {
    System(SystemPredicate),
    User(TriCoords),
}

impl Predicate {
    pub const fn arity(self) -> u8 {
        match self {
            Predicate::System(s) => s.arity(),
            Predicate::User(c) => c.arity,
        }
    }

    /// A single key identifying this predicate for equality/hashing purposes
    /// independent of how it was looked up — the sort index used by
    /// [`PredicateStore`] to detect redefinitions.
    fn index(self) -> i32 {
        match self {
            Predicate::System(s) => s.index(),
            Predicate::User(c) => c.index,
        }
    }

    fn subscript(self) -> i32 {
        match self {
            Predicate::System(_) => 0,
            Predicate::User(c) => c.subscript,
        }
    }
}

/// A store of user-defined predicates, keyed by `(index, subscript)` so that
/// re-adding the same coordinates with a different arity is caught as a
/// [`ProofError::ValueConflict`] rather than silently shadowing the earlier
/// definition. System predicates are always present and can never be
/// registered by a caller.
#[derive(Default)]
pub struct PredicateStore {
    by_coords: HashMap<(i32, i32), Predicate>,
}

impl PredicateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user predicate, or returns the existing one if the exact
    /// same triple was already added.
    pub fn add(&mut self, coords: TriCoords) -> Result<Predicate, ProofError> {
        if coords.index < 0 {
            return Err(ProofError::ValueConflict(format!(
                "predicate index {} is reserved for system predicates",
                coords.index
            )));
        }
        let key = (coords.index, coords.subscript);
        let candidate = Predicate::User(coords);
        match self.by_coords.get(&key) {
            Some(existing) if *existing == candidate => Ok(candidate),
            Some(existing) => Err(ProofError::ValueConflict(format!(
                "predicate at ({}, {}) already has arity {}, cannot redefine with arity {}",
                coords.index,
                coords.subscript,
                existing.arity(),
                coords.arity
            ))),
            None => {
                self.by_coords.insert(key, candidate);
                Ok(candidate)
            }
        }
    }

    pub fn get(&self, index: i32, subscript: i32) -> Option<Predicate> {
        if index < 0 {
            return [SystemPredicate::Identity, SystemPredicate::Existence]
                .into_iter()
                .map(Predicate::System)
                .find(|p| p.index() == index && p.subscript() == subscript);
        }
        self.by_coords.get(&(index, subscript)).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_predicates_have_fixed_arity() {
        assert_eq!(SystemPredicate::Identity.arity(), 2);
        assert_eq!(SystemPredicate::Existence.arity(), 1);
    }

    #[test]
    fn store_dedupes_identical_redefinition() {
        let mut store = PredicateStore::new();
        let coords = TriCoords::new(0, 0, 2);
        let p1 = store.add(coords).unwrap();
        let p2 = store.add(coords).unwrap();
        assert_eq!(p1, p2);
    }

    #[test]
    fn store_rejects_arity_conflict() {
        let mut store = PredicateStore::new();
        store.add(TriCoords::new(0, 0, 2)).unwrap();
        let err = store.add(TriCoords::new(0, 0, 3)).unwrap_err();
        assert!(matches!(err, ProofError::ValueConflict(_)));
    }

    #[test]
    fn store_rejects_negative_index() {
        let mut store = PredicateStore::new();
        let err = store.add(TriCoords::new(-1, 0, 2)).unwrap_err();
        assert!(matches!(err, ProofError::ValueConflict(_)));
    }
}
