//! Sentences: atomic, predicated, quantified, and operated, plus the
//! [`Lexicon`] that canonically interns them.
//!
//! Every [`Sentence`] reaching a caller was built by a [`Lexicon`] method, so
//! two sentences with the same spec are always the same `Rc` allocation.
//! Equality and hashing are therefore pointer comparisons — the "canonically
//! interned by identity" guarantee the lexical algebra promises regardless of
//! how deep the sentence tree is.

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::ProofError;
use crate::lexicon::coords::{BiCoords, Constant, Parameter, Variable};
use crate::lexicon::predicate::{Predicate, PredicateStore};

/// Operators and their fixed arities.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Operator {
    Assertion,
    Negation,
    Conjunction,
    Disjunction,
    MaterialConditional,
    MaterialBiconditional,
    Conditional,
    Biconditional,
    Possibility,
    Necessity,
}

impl Operator {
    pub const fn arity(self) -> u8 {
        match self {
            Operator::Assertion
            | Operator::Negation
            | Operator::Possibility
            | Operator::Necessity => 1,
            _ => 2,
        }
    }

    pub const fn is_modal(self) -> bool {
        matches!(self, Operator::Possibility | Operator::Necessity)
    }
}

/// Quantifiers.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Quantifier {
    Existential,
    Universal,
}

/// Rank used as the first component of every item's total order, so that
/// items of different kinds compare in a fixed, well-defined sequence.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(u8)]
pub enum LexRank {
    Predicate = 10,
    Constant = 20,
    Variable = 30,
    Quantifier = 33,
    Operator = 35,
    Atomic = 40,
    Predicated = 50,
    Quantified = 60,
    Operated = 70,
}

/// Pointer identity of an interned sentence, used as a cache key for parent
/// nodes without re-hashing the whole subtree.
type SentenceKey = usize;

fn key_of(s: &Sentence) -> SentenceKey {
    Rc::as_ptr(&s.0) as SentenceKey
}

/// The shape of a sentence, carrying real child handles (not just interning
/// keys) so accessors can hand back borrowed children directly.
enum SentenceShape {
    Atomic(BiCoords),
    Predicated { predicate: Predicate, params: Vec<Parameter> },
    Quantified { quantifier: Quantifier, variable: Variable, inner: Sentence },
    Operated { operator: Operator, operands: Vec<Sentence> },
}

#[derive(Default, Clone)]
struct Derived {
    predicates: Vec<Predicate>,
    constants: Vec<Constant>,
    variables: Vec<Variable>,
    atomics: Vec<Sentence>,
    quantifiers: Vec<Quantifier>,
    operators: Vec<Operator>,
}

struct SentenceCore {
    shape: SentenceShape,
    derived: Derived,
}

/// A canonically-interned sentence. Cheap to clone (`Rc` bump); compares and
/// hashes in O(1) via pointer identity.
#[derive(Clone)]
pub struct Sentence(Rc<SentenceCore>);

impl PartialEq for Sentence {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for Sentence {}

impl std::hash::Hash for Sentence {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        key_of(self).hash(state)
    }
}

/// Total order consistent with equality and hash (§3.1/§4.1's `sort_tuple`):
/// first by [`LexRank`], then by kind-specific components, recursing into
/// operands/inner sentences rather than falling back to pointer identity.
impl PartialOrd for Sentence {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Sentence {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        if Rc::ptr_eq(&self.0, &other.0) {
            return std::cmp::Ordering::Equal;
        }
        self.rank().cmp(&other.rank()).then_with(|| match (&self.0.shape, &other.0.shape) {
            (SentenceShape::Atomic(a), SentenceShape::Atomic(b)) => a.cmp(b),
            (
                SentenceShape::Predicated { predicate: p1, params: a1 },
                SentenceShape::Predicated { predicate: p2, params: a2 },
            ) => p1.cmp(p2).then_with(|| a1.cmp(a2)),
            (
                SentenceShape::Quantified { quantifier: q1, variable: v1, inner: i1 },
                SentenceShape::Quantified { quantifier: q2, variable: v2, inner: i2 },
            ) => q1.cmp(q2).then_with(|| v1.cmp(v2)).then_with(|| i1.cmp(i2)),
            (
                SentenceShape::Operated { operator: o1, operands: ops1 },
                SentenceShape::Operated { operator: o2, operands: ops2 },
            ) => o1.cmp(o2).then_with(|| ops1.cmp(ops2)),
            _ => unreachable!("same LexRank implies same SentenceShape variant"),
        })
    }
}

impl std::fmt::Debug for Sentence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0.shape {
            SentenceShape::Atomic(c) => write!(f, "Atomic({},{})", c.index, c.subscript),
            SentenceShape::Predicated { predicate, params } => {
                write!(f, "Predicated({:?}, {} params)", predicate, params.len())
            }
            SentenceShape::Quantified { quantifier, variable, .. } => {
                write!(f, "Quantified({:?}, {:?})", quantifier, variable)
            }
            SentenceShape::Operated { operator, operands } => {
                write!(f, "Operated({:?}, {} operands)", operator, operands.len())
            }
        }
    }
}

/// Tag of a sentence's top-level shape, analogous to Python's `type(s)`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SentenceKind {
    Atomic,
    Predicated,
    Quantified,
    Operated,
}

impl Sentence {
    pub fn kind(&self) -> SentenceKind {
        match &self.0.shape {
            SentenceShape::Atomic(_) => SentenceKind::Atomic,
            SentenceShape::Predicated { .. } => SentenceKind::Predicated,
            SentenceShape::Quantified { .. } => SentenceKind::Quantified,
            SentenceShape::Operated { .. } => SentenceKind::Operated,
        }
    }

    pub fn rank(&self) -> LexRank {
        match self.kind() {
            SentenceKind::Atomic => LexRank::Atomic,
            SentenceKind::Predicated => LexRank::Predicated,
            SentenceKind::Quantified => LexRank::Quantified,
            SentenceKind::Operated => LexRank::Operated,
        }
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.0.derived.predicates
    }

    pub fn constants(&self) -> &[Constant] {
        &self.0.derived.constants
    }

    pub fn variables(&self) -> &[Variable] {
        &self.0.derived.variables
    }

    pub fn atomics(&self) -> &[Sentence] {
        &self.0.derived.atomics
    }

    pub fn quantifiers(&self) -> &[Quantifier] {
        &self.0.derived.quantifiers
    }

    pub fn operators(&self) -> &[Operator] {
        &self.0.derived.operators
    }

    pub fn as_atomic(&self) -> Option<BiCoords> {
        match self.0.shape {
            SentenceShape::Atomic(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_predicated(&self) -> Option<(Predicate, &[Parameter])> {
        match &self.0.shape {
            SentenceShape::Predicated { predicate, params } => Some((*predicate, params.as_slice())),
            _ => None,
        }
    }

    pub fn as_quantified(&self) -> Option<(Quantifier, Variable, &Sentence)> {
        match &self.0.shape {
            SentenceShape::Quantified { quantifier, variable, inner } => {
                Some((*quantifier, *variable, inner))
            }
            _ => None,
        }
    }

    pub fn as_operated(&self) -> Option<(Operator, &[Sentence])> {
        match &self.0.shape {
            SentenceShape::Operated { operator, operands } => Some((*operator, operands.as_slice())),
            _ => None,
        }
    }

    pub fn is_negation(&self) -> bool {
        matches!(self.as_operated(), Some((Operator::Negation, _)))
    }

    /// The negation of this sentence. Does not strip an existing negation —
    /// stripping double negation is a rule's job, not this constructor's.
    pub fn negate(&self, lex: &mut Lexicon) -> Sentence {
        lex.operated(Operator::Negation, vec![self.clone()])
    }

    /// If this is a negation, its operand; otherwise its own negation.
    /// Matches the common "negative of s" helper used by closure rules.
    pub fn negative(&self, lex: &mut Lexicon) -> Sentence {
        match self.as_operated() {
            Some((Operator::Negation, operands)) => operands[0].clone(),
            _ => self.negate(lex),
        }
    }

    /// Structural substitution `self[new/old]`. Identity when `old` does not
    /// occur. Rebuilds through the lexicon so the result stays interned.
    pub fn substitute(&self, old: Parameter, new: Parameter, lex: &mut Lexicon) -> Sentence {
        if old == new {
            return self.clone();
        }
        match &self.0.shape {
            SentenceShape::Atomic(_) => self.clone(),
            SentenceShape::Predicated { predicate, params } => {
                let substituted: Vec<Parameter> =
                    params.iter().map(|&p| if p == old { new } else { p }).collect();
                if substituted == *params {
                    self.clone()
                } else {
                    lex.predicated(*predicate, substituted).expect("arity preserved by substitution")
                }
            }
            SentenceShape::Quantified { quantifier, variable, inner } => {
                let new_inner = inner.substitute(old, new, lex);
                if new_inner == *inner {
                    self.clone()
                } else {
                    lex.quantified(*quantifier, *variable, new_inner)
                }
            }
            SentenceShape::Operated { operator, operands } => {
                let new_operands: Vec<Sentence> =
                    operands.iter().map(|s| s.substitute(old, new, lex)).collect();
                if new_operands == *operands {
                    self.clone()
                } else {
                    lex.operated(*operator, new_operands)
                }
            }
        }
    }

    /// `quantified.unquantify(c) = inner[c/variable]`.
    pub fn unquantify(&self, constant: Constant, lex: &mut Lexicon) -> Sentence {
        let (_, variable, inner) =
            self.as_quantified().expect("unquantify on non-quantified sentence");
        inner
            .clone()
            .substitute(Parameter::Variable(variable), Parameter::Constant(constant), lex)
    }
}

/// Canonically interns sentences and predicates for one proof session. All
/// sentence construction goes through a `Lexicon` so that equal specs always
/// yield the same `Rc` allocation, giving O(1) equality regardless of depth.
pub struct Lexicon {
    pub predicates: PredicateStore,
    atomics: HashMap<BiCoords, Sentence>,
    predicated: HashMap<(Predicate, Vec<Parameter>), Sentence>,
    quantified: HashMap<(Quantifier, Variable, SentenceKey), Sentence>,
    operated: HashMap<(Operator, Vec<SentenceKey>), Sentence>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::new()
    }
}

fn unique_sentences(iter: impl IntoIterator<Item = Sentence>) -> Vec<Sentence> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for s in iter {
        if seen.insert(key_of(&s)) {
            out.push(s);
        }
    }
    out
}

fn unique_sorted<T: Ord + Copy>(iter: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut v: Vec<T> = iter.into_iter().collect();
    v.sort();
    v.dedup();
    v
}

impl Lexicon {
    pub fn new() -> Self {
        Self {
            predicates: PredicateStore::new(),
            atomics: HashMap::new(),
            predicated: HashMap::new(),
            quantified: HashMap::new(),
            operated: HashMap::new(),
        }
    }

    pub fn atomic(&mut self, coords: BiCoords) -> Sentence {
        if let Some(s) = self.atomics.get(&coords) {
            return s.clone();
        }
        // Two-pass construction: the atom's own `atomics` set is `{self}`,
        // which needs the `Rc` to exist before it can be referenced.
        let placeholder = Sentence(Rc::new(SentenceCore {
            shape: SentenceShape::Atomic(coords),
            derived: Derived::default(),
        }));
        let s = Sentence(Rc::new(SentenceCore {
            shape: SentenceShape::Atomic(coords),
            derived: Derived { atomics: vec![placeholder], ..Default::default() },
        }));
        self.atomics.insert(coords, s.clone());
        s
    }

    pub fn predicated(
        &mut self,
        predicate: Predicate,
        params: Vec<Parameter>,
    ) -> Result<Sentence, ProofError> {
        if params.len() != predicate.arity() as usize {
            return Err(ProofError::ArityMismatch {
                expected: predicate.arity() as usize,
                found: params.len(),
            });
        }
        let key = (predicate, params.clone());
        if let Some(s) = self.predicated.get(&key) {
            return Ok(s.clone());
        }
        let derived = Derived {
            predicates: vec![predicate],
            constants: unique_sorted(params.iter().filter_map(|p| p.as_constant())),
            variables: unique_sorted(params.iter().filter_map(|p| p.as_variable())),
            ..Default::default()
        };
        let s = Sentence(Rc::new(SentenceCore {
            shape: SentenceShape::Predicated { predicate, params: params.clone() },
            derived,
        }));
        self.predicated.insert(key, s.clone());
        Ok(s)
    }

    pub fn quantified(
        &mut self,
        quantifier: Quantifier,
        variable: Variable,
        inner: Sentence,
    ) -> Sentence {
        let ikey = key_of(&inner);
        let key = (quantifier, variable, ikey);
        if let Some(s) = self.quantified.get(&key) {
            return s.clone();
        }
        let variables = unique_sorted(inner.variables().iter().copied().chain([variable]));
        let quantifiers = unique_sorted(inner.quantifiers().iter().copied().chain([quantifier]));
        let derived = Derived {
            predicates: inner.predicates().to_vec(),
            constants: inner.constants().to_vec(),
            variables,
            atomics: inner.atomics().to_vec(),
            quantifiers,
            operators: inner.operators().to_vec(),
        };
        let s = Sentence(Rc::new(SentenceCore {
            shape: SentenceShape::Quantified { quantifier, variable, inner },
            derived,
        }));
        self.quantified.insert(key, s.clone());
        s
    }

    pub fn operated(&mut self, operator: Operator, operands: Vec<Sentence>) -> Sentence {
        debug_assert_eq!(operands.len(), operator.arity() as usize);
        let okeys: Vec<SentenceKey> = operands.iter().map(key_of).collect();
        let key = (operator, okeys.clone());
        if let Some(s) = self.operated.get(&key) {
            return s.clone();
        }
        let predicates = unique_sorted(operands.iter().flat_map(|o| o.predicates().iter().copied()));
        let constants = unique_sorted(operands.iter().flat_map(|o| o.constants().iter().copied()));
        let variables = unique_sorted(operands.iter().flat_map(|o| o.variables().iter().copied()));
        let atomics = unique_sentences(operands.iter().flat_map(|o| o.atomics().iter().cloned()));
        let quantifiers =
            unique_sorted(operands.iter().flat_map(|o| o.quantifiers().iter().copied()));
        let operators = unique_sorted(
            operands.iter().flat_map(|o| o.operators().iter().copied()).chain([operator]),
        );
        let derived = Derived { predicates, constants, variables, atomics, quantifiers, operators };
        let s = Sentence(Rc::new(SentenceCore {
            shape: SentenceShape::Operated { operator, operands },
            derived,
        }));
        self.operated.insert((operator, okeys), s.clone());
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::coords::TriCoords;

    #[test]
    fn atomic_interning_is_identity() {
        let mut lex = Lexicon::new();
        let a1 = lex.atomic(BiCoords::first());
        let a2 = lex.atomic(BiCoords::first());
        assert_eq!(a1, a2);
        assert!(Rc::ptr_eq(&a1.0, &a2.0));
    }

    #[test]
    fn operated_interning_dedupes_by_children_identity() {
        let mut lex = Lexicon::new();
        let a = lex.atomic(BiCoords::first());
        let not_a_1 = a.negate(&mut lex);
        let not_a_2 = a.negate(&mut lex);
        assert_eq!(not_a_1, not_a_2);
    }

    #[test]
    fn substitute_is_identity_when_absent() {
        let mut lex = Lexicon::new();
        let a = lex.atomic(BiCoords::first());
        let c = Constant::first();
        let d = c.next();
        let result = a.substitute(Parameter::Constant(d), Parameter::Constant(c), &mut lex);
        assert_eq!(result, a);
    }

    #[test]
    fn substitute_round_trips() {
        let mut lex = Lexicon::new();
        let pred = lex.predicates.add(TriCoords::first(1)).unwrap();
        let c = Constant::first();
        let d = c.next();
        let s = lex.predicated(pred, vec![Parameter::Constant(c)]).unwrap();
        let substituted = s.substitute(Parameter::Constant(c), Parameter::Constant(d), &mut lex);
        let back = substituted.substitute(Parameter::Constant(d), Parameter::Constant(c), &mut lex);
        assert_eq!(back, s);
    }

    #[test]
    fn unquantify_substitutes_variable() {
        let mut lex = Lexicon::new();
        let pred = lex.predicates.add(TriCoords::first(1)).unwrap();
        let v = Variable::first();
        let inner = lex.predicated(pred, vec![Parameter::Variable(v)]).unwrap();
        let quantified = lex.quantified(Quantifier::Universal, v, inner);
        let c = Constant::first();
        let instantiated = quantified.unquantify(c, &mut lex);
        let expected = lex.predicated(pred, vec![Parameter::Constant(c)]).unwrap();
        assert_eq!(instantiated, expected);
    }

    #[test]
    fn derived_sets_propagate_through_operators() {
        let mut lex = Lexicon::new();
        let a = lex.atomic(BiCoords::first());
        let b = lex.atomic(BiCoords::first().next());
        let conj = lex.operated(Operator::Conjunction, vec![a.clone(), b.clone()]);
        assert_eq!(conj.atomics().len(), 2);
        assert_eq!(conj.operators(), &[Operator::Conjunction]);
    }

    #[test]
    fn ordering_is_total_across_ranks() {
        let mut lex = Lexicon::new();
        let a = lex.atomic(BiCoords::first());
        let pred = lex.predicates.add(TriCoords::first(1)).unwrap();
        let pa = lex.predicated(pred, vec![Parameter::Constant(Constant::first())]).unwrap();
        let na = a.negate(&mut lex);
        assert!(a < pa);
        assert!(pa < na);
    }

    #[test]
    fn ordering_is_consistent_with_equality() {
        let mut lex = Lexicon::new();
        let a1 = lex.atomic(BiCoords::first());
        let a2 = lex.atomic(BiCoords::first());
        assert_eq!(a1.cmp(&a2), std::cmp::Ordering::Equal);
    }

    #[test]
    fn predicated_arity_mismatch_errors() {
        let mut lex = Lexicon::new();
        let pred = lex.predicates.add(TriCoords::first(2)).unwrap();
        let c = Constant::first();
        let err = lex.predicated(pred, vec![Parameter::Constant(c)]).unwrap_err();
        assert!(matches!(err, ProofError::ArityMismatch { expected: 2, found: 1 }));
    }
}
