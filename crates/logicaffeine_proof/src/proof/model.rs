//! Model construction: reading an open branch back into a truth-value
//! assignment, grounded in `pytableaux`'s `models/__init__.py`.

use std::collections::HashMap;

use crate::error::ProofError;
use crate::lexicon::{BiCoords, Operator, Parameter, Predicate, Quantifier, Sentence};
use crate::proof::branch::Branch;
use crate::proof::node::World;

/// A truth value encoded as `(verified, falsified)` bits — the standard
/// Belnap/Dunn bilattice encoding, from which every connective's truth
/// table is a pointwise min/max rather than a hand-written table per value:
/// `F=(0,1)`, `N=(0,0)`, `B=(1,1)`, `T=(1,0)`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Mval {
    verified: bool,
    falsified: bool,
}

impl Mval {
    pub const F: Mval = Mval { verified: false, falsified: true };
    pub const N: Mval = Mval { verified: false, falsified: false };
    pub const B: Mval = Mval { verified: true, falsified: true };
    pub const T: Mval = Mval { verified: true, falsified: false };

    pub fn not(self) -> Mval {
        Mval { verified: self.falsified, falsified: self.verified }
    }
    pub fn and(self, other: Mval) -> Mval {
        Mval { verified: self.verified && other.verified, falsified: self.falsified || other.falsified }
    }
    pub fn or(self, other: Mval) -> Mval {
        Mval { verified: self.verified || other.verified, falsified: self.falsified && other.falsified }
    }
    /// Identity element for [`Mval::or`] — the value an empty possibility
    /// (no accessible worlds) collapses to.
    pub fn or_identity() -> Mval {
        Mval::F
    }
    /// Identity element for [`Mval::and`] — the value an empty necessity
    /// (no accessible worlds) collapses to.
    pub fn and_identity() -> Mval {
        Mval::T
    }
}

impl std::fmt::Display for Mval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let c = match *self {
            Mval::F => 'F',
            Mval::N => 'N',
            Mval::B => 'B',
            Mval::T => 'T',
            _ => unreachable!(),
        };
        write!(f, "{c}")
    }
}

/// Which values a logic treats as "the argument holds" for countermodel
/// checking (§4.8): `{T}` for classical/K3, `{T,B}` for LP/FDE.
#[derive(Clone, Copy, Debug)]
pub struct DesignatedSet {
    pub includes_b: bool,
}

impl DesignatedSet {
    pub fn is_designated(self, v: Mval) -> bool {
        v == Mval::T || (self.includes_b && v == Mval::B)
    }
}

/// A predicate's extension: the discipline of §4.8 keeps `pos`/`neg`
/// disjoint unless the logic permits gluts, and `get_value` reconstructs a
/// value from membership rather than storing one directly.
#[derive(Default, Clone)]
pub struct PredicateInterpretation {
    pos: std::collections::HashSet<Vec<Parameter>>,
    neg: std::collections::HashSet<Vec<Parameter>>,
}

impl PredicateInterpretation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_value(&mut self, params: Vec<Parameter>, value: Mval) -> Result<(), ProofError> {
        match value {
            Mval::T => {
                if self.neg.contains(&params) {
                    return Err(ProofError::ValueConflict("predicate already false at params".into()));
                }
                self.pos.insert(params);
            }
            Mval::F => {
                if self.pos.contains(&params) {
                    return Err(ProofError::ValueConflict("predicate already true at params".into()));
                }
                self.neg.insert(params);
            }
            Mval::N => {
                if self.pos.contains(&params) || self.neg.contains(&params) {
                    return Err(ProofError::ValueConflict("predicate already assigned at params".into()));
                }
            }
            Mval::B => {
                self.pos.insert(params.clone());
                self.neg.insert(params);
            }
            _ => unreachable!(),
        }
        Ok(())
    }

    pub fn get_value(&self, params: &[Parameter]) -> Mval {
        let p = params.to_vec();
        match (self.pos.contains(&p), self.neg.contains(&p)) {
            (true, true) => Mval::B,
            (true, false) => Mval::T,
            (false, true) => Mval::F,
            (false, false) => Mval::N,
        }
    }
}

/// `world -> set of visible worlds`.
#[derive(Default, Clone)]
pub struct AccessGraph {
    edges: HashMap<World, std::collections::HashSet<World>>,
}

impl AccessGraph {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn add(&mut self, w1: World, w2: World) {
        self.edges.entry(w1).or_default().insert(w2);
    }
    pub fn has(&self, w1: World, w2: World) -> bool {
        self.edges.get(&w1).map(|s| s.contains(&w2)).unwrap_or(false)
    }
    pub fn visible(&self, w1: World) -> Vec<World> {
        let mut v: Vec<World> = self.edges.get(&w1).map(|s| s.iter().copied().collect()).unwrap_or_default();
        v.sort_unstable();
        v
    }
    pub fn flat(&self) -> Vec<(World, World)> {
        let mut out: Vec<(World, World)> =
            self.edges.iter().flat_map(|(w1, vs)| vs.iter().map(move |w2| (*w1, *w2))).collect();
        out.sort_unstable();
        out
    }
    pub fn worlds(&self) -> std::collections::HashSet<World> {
        let mut s = std::collections::HashSet::new();
        for (w1, vs) in &self.edges {
            s.insert(*w1);
            s.extend(vs.iter().copied());
        }
        s
    }
}

/// One world's assignment.
#[derive(Default)]
pub struct Frame {
    atomics: HashMap<BiCoords, Mval>,
    opaques: HashMap<Sentence, Mval>,
    predicates: HashMap<Predicate, PredicateInterpretation>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A full model: one [`Frame`] per world plus an [`AccessGraph`].
pub struct Model {
    frames: HashMap<World, Frame>,
    access: AccessGraph,
    designated: DesignatedSet,
    unassigned: Mval,
    finished: bool,
}

impl Model {
    pub fn new(designated: DesignatedSet, unassigned: Mval) -> Self {
        Self { frames: HashMap::new(), access: AccessGraph::new(), designated, unassigned, finished: false }
    }

    fn frame_mut(&mut self, world: World) -> &mut Frame {
        self.frames.entry(world).or_insert_with(Frame::new)
    }

    pub fn frame(&self, world: World) -> Option<&Frame> {
        self.frames.get(&world)
    }

    pub fn access(&self) -> &AccessGraph {
        &self.access
    }

    fn literal_of(sentence: &Sentence) -> Option<(BiCoords, bool)> {
        if let Some(c) = sentence.as_atomic() {
            return Some((c, true));
        }
        if let Some((Operator::Negation, ops)) = sentence.as_operated() {
            if let Some(c) = ops[0].as_atomic() {
                return Some((c, false));
            }
        }
        None
    }

    /// Reads an open branch's nodes into this model: access edges, then
    /// every literal/predicated/opaque sentence node, keyed by its world
    /// (world 0 when untracked).
    pub fn read_branch(&mut self, branch: &Branch) {
        for node in branch.nodes() {
            if let Some((w1, w2)) = node.access() {
                self.access.add(w1, w2);
                self.frame_mut(w1);
                self.frame_mut(w2);
                continue;
            }
            let Some(sentence) = node.sentence() else { continue };
            let world = node.world().unwrap_or(0);
            let designated = node.designated();
            self.frame_mut(world);

            if let Some((coords, positive)) = Self::literal_of(sentence) {
                let asserts_true = designated.unwrap_or(true) == positive;
                let frame = self.frame_mut(world);
                let prior = frame.atomics.get(&coords).copied();
                let v = match (prior, asserts_true) {
                    (None, true) => Mval::T,
                    (None, false) => Mval::F,
                    (Some(Mval::F), true) | (Some(Mval::T), false) => Mval::B,
                    (Some(Mval::T), true) => Mval::T,
                    (Some(Mval::F), false) => Mval::F,
                    (Some(existing), _) => existing,
                };
                frame.atomics.insert(coords, v);
                continue;
            }

            if let Some((predicate, params)) = sentence.as_predicated() {
                let value = if designated.unwrap_or(true) { Mval::T } else { Mval::F };
                let frame = self.frame_mut(world);
                let entry = frame.predicates.entry(predicate).or_default();
                let _ = entry.set_value(params.to_vec(), value);
                continue;
            }

            if matches!(sentence.as_quantified(), Some(_))
                || sentence.operators().iter().any(|op| op.is_modal())
            {
                let value = if designated.unwrap_or(true) { Mval::T } else { Mval::F };
                self.frame_mut(world).opaques.insert(sentence.clone(), value);
            }
        }
    }

    /// Propagates: every world reachable via access gets a frame; every
    /// atomic/predicate mentioned anywhere is filled with `unassigned` in
    /// frames missing it. Fails with `IllegalState` if already finished.
    pub fn finish(&mut self) -> Result<(), ProofError> {
        if self.finished {
            return Err(ProofError::IllegalState("model already finished".into()));
        }
        for w in self.access.worlds() {
            self.frame_mut(w);
        }
        let all_atomics: std::collections::HashSet<BiCoords> =
            self.frames.values().flat_map(|f| f.atomics.keys().copied()).collect();
        let all_predicates: std::collections::HashSet<Predicate> =
            self.frames.values().flat_map(|f| f.predicates.keys().copied()).collect();
        for frame in self.frames.values_mut() {
            for coords in &all_atomics {
                frame.atomics.entry(*coords).or_insert(self.unassigned);
            }
            for pred in &all_predicates {
                frame.predicates.entry(*pred).or_default();
            }
        }
        self.finished = true;
        Ok(())
    }

    pub fn value_of(&self, sentence: &Sentence, world: World) -> Result<Mval, ProofError> {
        if !self.finished {
            return Err(ProofError::IllegalState("model is not finished".into()));
        }
        self.value_of_inner(sentence, world)
    }

    fn value_of_inner(&self, sentence: &Sentence, world: World) -> Result<Mval, ProofError> {
        if let Some(coords) = sentence.as_atomic() {
            return Ok(self.frame(world).and_then(|f| f.atomics.get(&coords)).copied().unwrap_or(self.unassigned));
        }
        if let Some(frame) = self.frame(world) {
            if let Some(v) = frame.opaques.get(sentence) {
                return Ok(*v);
            }
        }
        if let Some((predicate, params)) = sentence.as_predicated() {
            for p in params {
                if !p.is_constant() {
                    return Err(ProofError::DenotationError("unbound variable in model evaluation".into()));
                }
            }
            let frame = self
                .frame(world)
                .ok_or_else(|| ProofError::DenotationError(format!("world {world} has no frame")))?;
            return Ok(frame.predicates.get(&predicate).map(|pi| pi.get_value(params)).unwrap_or(self.unassigned));
        }
        if let Some((quantifier, _, _)) = sentence.as_quantified() {
            return match quantifier {
                Quantifier::Universal => Ok(Mval::T),
                Quantifier::Existential => Ok(Mval::F),
            };
        }
        if let Some((operator, operands)) = sentence.as_operated() {
            return self.value_of_operated(operator, operands, world);
        }
        unreachable!("sentence is one of atomic/predicated/quantified/operated")
    }

    fn value_of_operated(&self, operator: Operator, operands: &[Sentence], world: World) -> Result<Mval, ProofError> {
        Ok(match operator {
            Operator::Negation => self.value_of_inner(&operands[0], world)?.not(),
            Operator::Assertion => self.value_of_inner(&operands[0], world)?,
            Operator::Conjunction => {
                self.value_of_inner(&operands[0], world)?.and(self.value_of_inner(&operands[1], world)?)
            }
            Operator::Disjunction => {
                self.value_of_inner(&operands[0], world)?.or(self.value_of_inner(&operands[1], world)?)
            }
            Operator::MaterialConditional | Operator::Conditional => {
                self.value_of_inner(&operands[0], world)?.not().or(self.value_of_inner(&operands[1], world)?)
            }
            Operator::MaterialBiconditional | Operator::Biconditional => {
                let a = self.value_of_inner(&operands[0], world)?;
                let b = self.value_of_inner(&operands[1], world)?;
                (a.not().or(b)).and(b.not().or(a))
            }
            Operator::Possibility => {
                let mut acc = Mval::or_identity();
                for w2 in self.access.visible(world) {
                    acc = acc.or(self.value_of_inner(&operands[0], w2)?);
                }
                acc
            }
            Operator::Necessity => {
                let mut acc = Mval::and_identity();
                for w2 in self.access.visible(world) {
                    acc = acc.and(self.value_of_inner(&operands[0], w2)?);
                }
                acc
            }
        })
    }

    /// `true` iff every premise is designated and the conclusion is not.
    pub fn is_countermodel_to(&self, argument: &crate::lexicon::Argument) -> Result<bool, ProofError> {
        for premise in argument.premises() {
            if !self.designated.is_designated(self.value_of(premise, 0)?) {
                return Ok(false);
            }
        }
        Ok(!self.designated.is_designated(self.value_of(argument.conclusion(), 0)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::{Argument, Lexicon};

    #[test]
    fn negation_swaps_truth_and_falsity() {
        assert_eq!(Mval::T.not(), Mval::F);
        assert_eq!(Mval::B.not(), Mval::B);
        assert_eq!(Mval::N.not(), Mval::N);
    }

    #[test]
    fn conjunction_is_false_if_either_conjunct_false() {
        assert_eq!(Mval::F.and(Mval::T), Mval::F);
        assert_eq!(Mval::N.and(Mval::B), Mval::N);
    }

    #[test]
    fn predicate_interpretation_detects_glut() {
        let mut pi = PredicateInterpretation::new();
        let c = crate::lexicon::Constant::first();
        pi.set_value(vec![c.into()], Mval::T).unwrap();
        pi.set_value(vec![c.into()], Mval::F).unwrap();
        assert_eq!(pi.get_value(&[c.into()]), Mval::B);
    }

    #[test]
    fn predicate_interpretation_rejects_conflict() {
        let mut pi = PredicateInterpretation::new();
        let c = crate::lexicon::Constant::first();
        pi.set_value(vec![c.into()], Mval::T).unwrap();
        pi.set_value(vec![c.into()], Mval::N).unwrap_err();
    }

    #[test]
    fn finish_twice_is_illegal_state() {
        let mut m = Model::new(DesignatedSet { includes_b: false }, Mval::F);
        m.finish().unwrap();
        assert!(matches!(m.finish(), Err(ProofError::IllegalState(_))));
    }

    #[test]
    fn countermodel_check_rejects_designated_conclusion() {
        let mut lex = Lexicon::new();
        let a = lex.atomic(crate::lexicon::BiCoords::first());
        let b = lex.atomic(crate::lexicon::BiCoords::first().next());
        let arg = Argument::new(b.clone(), vec![a.clone()]);
        let mut m = Model::new(DesignatedSet { includes_b: false }, Mval::F);
        m.frame_mut(0).atomics.insert(a.as_atomic().unwrap(), Mval::T);
        m.frame_mut(0).atomics.insert(b.as_atomic().unwrap(), Mval::T);
        m.finish().unwrap();
        assert!(!m.is_countermodel_to(&arg).unwrap());
    }
}
