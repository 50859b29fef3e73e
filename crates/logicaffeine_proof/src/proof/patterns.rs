//! Reusable rule shapes (§4.4): every concrete logic's rule catalogue is
//! built by instantiating these with a connective, a quantifier, or an
//! accessibility constraint rather than writing a bespoke struct per rule.

use std::collections::{HashMap, HashSet};

use crate::lexicon::{Constant, Lexicon, Operator, Parameter, Predicate, Quantifier, Sentence, SystemPredicate};
use crate::proof::branch::{Branch, Query};
use crate::proof::helpers::{MaxConsts, MaxWorlds, WorldIndex};
use crate::proof::node::{NodeSpec, World};
use crate::proof::rule::{Legend, Rule};
use crate::proof::target::Target;

fn unticked_sentence_nodes<'b>(branch: &'b Branch) -> impl Iterator<Item = &'b crate::proof::node::Node> {
    branch.nodes().iter().filter(|n| n.is_sentence_node() && !branch.is_ticked(n.id()))
}

// ---------------------------------------------------------------------
// Closure rules
// ---------------------------------------------------------------------

/// Finds a node whose sentence is the negation of some other node's
/// sentence (same designation, where designation is tracked at all).
pub struct ContradictionClosure;

impl Rule for ContradictionClosure {
    fn name(&self) -> &'static str {
        "ContradictionClosure"
    }
    fn is_closure(&self) -> bool {
        true
    }
    fn legend(&self) -> Legend {
        Legend { closure: true, ..Default::default() }
    }
    fn example_nodes(&self, lex: &mut Lexicon) -> Vec<NodeSpec> {
        let a = lex.atomic(crate::lexicon::BiCoords::first());
        let na = a.negate(lex);
        vec![NodeSpec::sentence(a), NodeSpec::sentence(na)]
    }
    fn get_targets(&mut self, branch_id: usize, branch: &Branch, lex: &mut Lexicon) -> Vec<Target> {
        for node in branch.nodes().iter().filter(|n| n.is_sentence_node()) {
            let s = node.sentence().unwrap();
            let neg = s.negative(lex);
            let hit = branch
                .find(&Query::new().sentence(neg))
                .into_iter()
                .any(|other| other.designated() == node.designated());
            if hit {
                return vec![Target::new(branch_id)];
            }
        }
        vec![]
    }
}

/// Finds `¬Iaa` for some constant `a` occurring on the branch.
pub struct SelfIdentityClosure;

impl Rule for SelfIdentityClosure {
    fn name(&self) -> &'static str {
        "SelfIdentityClosure"
    }
    fn is_closure(&self) -> bool {
        true
    }
    fn legend(&self) -> Legend {
        Legend { closure: true, ..Default::default() }
    }
    fn example_nodes(&self, lex: &mut Lexicon) -> Vec<NodeSpec> {
        let c = Constant::first();
        let ident = lex
            .predicated(Predicate::System(SystemPredicate::Identity), vec![c.into(), c.into()])
            .unwrap();
        vec![NodeSpec::sentence(ident.negate(lex))]
    }
    fn get_targets(&mut self, branch_id: usize, branch: &Branch, lex: &mut Lexicon) -> Vec<Target> {
        for node in branch.nodes().iter().filter(|n| n.is_sentence_node()) {
            let s = node.sentence().unwrap();
            if let Some((Operator::Negation, ops)) = s.as_operated() {
                if let Some((Predicate::System(SystemPredicate::Identity), params)) = ops[0].as_predicated() {
                    if params[0] == params[1] && matches!(node.designated(), None | Some(true)) {
                        let _ = lex;
                        return vec![Target::new(branch_id)];
                    }
                }
            }
        }
        vec![]
    }
}

/// Finds `¬E!a` for some constant `a` occurring on the branch — this port
/// assumes every constant denotes, so asserting non-existence always closes.
pub struct NonExistenceClosure;

impl Rule for NonExistenceClosure {
    fn name(&self) -> &'static str {
        "NonExistenceClosure"
    }
    fn is_closure(&self) -> bool {
        true
    }
    fn legend(&self) -> Legend {
        Legend { closure: true, ..Default::default() }
    }
    fn example_nodes(&self, lex: &mut Lexicon) -> Vec<NodeSpec> {
        let c = Constant::first();
        let exist = lex.predicated(Predicate::System(SystemPredicate::Existence), vec![c.into()]).unwrap();
        vec![NodeSpec::sentence(exist.negate(lex))]
    }
    fn get_targets(&mut self, branch_id: usize, branch: &Branch, _lex: &mut Lexicon) -> Vec<Target> {
        for node in branch.nodes().iter().filter(|n| n.is_sentence_node()) {
            let s = node.sentence().unwrap();
            if let Some((Operator::Negation, ops)) = s.as_operated() {
                if matches!(ops[0].as_predicated(), Some((Predicate::System(SystemPredicate::Existence), _)))
                    && matches!(node.designated(), None | Some(true))
                {
                    return vec![Target::new(branch_id)];
                }
            }
        }
        vec![]
    }
}

/// Finds a sentence occurring on the branch both designated and
/// undesignated — the fourth mandatory closure pattern, for logics that
/// track designation (FDE and its relatives).
pub struct DesignationClosure;

impl Rule for DesignationClosure {
    fn name(&self) -> &'static str {
        "DesignationClosure"
    }
    fn is_closure(&self) -> bool {
        true
    }
    fn legend(&self) -> Legend {
        Legend { closure: true, ..Default::default() }
    }
    fn example_nodes(&self, lex: &mut Lexicon) -> Vec<NodeSpec> {
        let a = lex.atomic(crate::lexicon::BiCoords::first());
        vec![NodeSpec::sentence(a.clone()).with_designated(true), NodeSpec::sentence(a).with_designated(false)]
    }
    fn get_targets(&mut self, branch_id: usize, branch: &Branch, _lex: &mut Lexicon) -> Vec<Target> {
        for node in branch.nodes().iter().filter(|n| n.is_sentence_node()) {
            if node.designated() != Some(true) {
                continue;
            }
            let s = node.sentence().unwrap().clone();
            if !branch.find(&Query::new().sentence(s).designated(false)).is_empty() {
                return vec![Target::new(branch_id)];
            }
        }
        vec![]
    }
}

// ---------------------------------------------------------------------
// Structural operator rules (no designation tracking: CPL/CFOL/K/D)
// ---------------------------------------------------------------------

/// Expands a matched operator's operands into the groups of new nodes the
/// rule should add: each inner `Vec` is one branch (one group), each tuple
/// is `(sentence, designated)` for one new node.
pub type ExpandFn = fn(operands: &[Sentence], designated: Option<bool>, lex: &mut Lexicon) -> Vec<Vec<(Sentence, Option<bool>)>>;

fn operator_operands(sentence: &Sentence, operator: Operator, negated: bool) -> Option<Vec<Sentence>> {
    if negated {
        let (op, ops) = sentence.as_operated()?;
        if op != Operator::Negation {
            return None;
        }
        let (inner_op, inner_ops) = ops[0].as_operated()?;
        (inner_op == operator).then(|| inner_ops.to_vec())
    } else {
        let (op, ops) = sentence.as_operated()?;
        (op == operator).then(|| ops.to_vec())
    }
}

/// A rule keyed on a structural sentence shape (operator, optionally
/// negated), producing new nodes via `expand`. Covers Conjunction,
/// Disjunction, the material/assertion reductions, biconditional
/// conjunction-reduction, and double negation — every "operator node rule"
/// sub-pattern in §4.4.2 for logics that don't track designation.
pub struct StructuralOperatorRule {
    pub rule_name: &'static str,
    pub operator: Operator,
    pub negated: bool,
    pub branching: usize,
    pub ticking: bool,
    pub expand: ExpandFn,
}

impl Rule for StructuralOperatorRule {
    fn name(&self) -> &'static str {
        self.rule_name
    }
    fn ticking(&self) -> bool {
        self.ticking
    }
    fn branching(&self) -> usize {
        self.branching
    }
    fn legend(&self) -> Legend {
        Legend { operator: Some(self.operator), negated: self.negated, ..Default::default() }
    }
    fn example_nodes(&self, lex: &mut Lexicon) -> Vec<NodeSpec> {
        let a = lex.atomic(crate::lexicon::BiCoords::first());
        let b = lex.atomic(crate::lexicon::BiCoords::first().next());
        let arity = self.operator.arity();
        let operands = if arity == 1 { vec![a] } else { vec![a, b] };
        let s = lex.operated(self.operator, operands);
        let s = if self.negated { s.negate(lex) } else { s };
        vec![NodeSpec::sentence(s)]
    }
    fn get_targets(&mut self, branch_id: usize, branch: &Branch, lex: &mut Lexicon) -> Vec<Target> {
        let mut out = Vec::new();
        for node in unticked_sentence_nodes(branch) {
            let s = node.sentence().unwrap();
            if let Some(operands) = operator_operands(s, self.operator, self.negated) {
                let groups = (self.expand)(&operands, node.designated(), lex);
                let groups: Vec<Vec<NodeSpec>> = groups
                    .into_iter()
                    .map(|g| {
                        g.into_iter()
                            .map(|(s, d)| {
                                let spec = NodeSpec::sentence(s);
                                if let Some(d) = d {
                                    spec.with_designated(d)
                                } else {
                                    spec
                                }
                            })
                            .collect()
                    })
                    .collect();
                out.push(Target::new(branch_id).with_node(node.id()).with_groups(groups));
            }
        }
        out
    }
    fn score_candidate(&self, _target: &Target) -> f64 {
        0.0
    }
}

pub fn expand_conjunction(ops: &[Sentence], d: Option<bool>, _lex: &mut Lexicon) -> Vec<Vec<(Sentence, Option<bool>)>> {
    vec![ops.iter().map(|s| (s.clone(), d)).collect()]
}

pub fn expand_conjunction_negated(ops: &[Sentence], d: Option<bool>, lex: &mut Lexicon) -> Vec<Vec<(Sentence, Option<bool>)>> {
    ops.iter().map(|s| vec![(s.negative(lex), d)]).collect()
}

pub fn expand_disjunction(ops: &[Sentence], d: Option<bool>, _lex: &mut Lexicon) -> Vec<Vec<(Sentence, Option<bool>)>> {
    ops.iter().map(|s| vec![(s.clone(), d)]).collect()
}

pub fn expand_disjunction_negated(ops: &[Sentence], d: Option<bool>, lex: &mut Lexicon) -> Vec<Vec<(Sentence, Option<bool>)>> {
    vec![ops.iter().map(|s| (s.negative(lex), d)).collect()]
}

pub fn expand_material_conditional(ops: &[Sentence], d: Option<bool>, lex: &mut Lexicon) -> Vec<Vec<(Sentence, Option<bool>)>> {
    vec![vec![(ops[0].negative(lex), d)], vec![(ops[1].clone(), d)]]
}

pub fn expand_material_conditional_negated(ops: &[Sentence], d: Option<bool>, lex: &mut Lexicon) -> Vec<Vec<(Sentence, Option<bool>)>> {
    vec![vec![(ops[0].clone(), d), (ops[1].negative(lex), d)]]
}

pub fn expand_biconditional(ops: &[Sentence], d: Option<bool>, lex: &mut Lexicon) -> Vec<Vec<(Sentence, Option<bool>)>> {
    let c1 = lex.operated(Operator::MaterialConditional, vec![ops[0].clone(), ops[1].clone()]);
    let c2 = lex.operated(Operator::MaterialConditional, vec![ops[1].clone(), ops[0].clone()]);
    vec![vec![(c1, d), (c2, d)]]
}

pub fn expand_biconditional_negated(ops: &[Sentence], d: Option<bool>, lex: &mut Lexicon) -> Vec<Vec<(Sentence, Option<bool>)>> {
    let c1 = lex.operated(Operator::MaterialConditional, vec![ops[0].clone(), ops[1].clone()]);
    let c2 = lex.operated(Operator::MaterialConditional, vec![ops[1].clone(), ops[0].clone()]);
    vec![vec![(c1.negative(lex), d)], vec![(c2.negative(lex), d)]]
}

pub fn expand_assertion(ops: &[Sentence], d: Option<bool>, _lex: &mut Lexicon) -> Vec<Vec<(Sentence, Option<bool>)>> {
    vec![vec![(ops[0].clone(), d)]]
}

pub fn expand_assertion_negated(ops: &[Sentence], d: Option<bool>, lex: &mut Lexicon) -> Vec<Vec<(Sentence, Option<bool>)>> {
    vec![vec![(ops[0].negative(lex), d)]]
}

pub fn expand_double_negation(ops: &[Sentence], d: Option<bool>, _lex: &mut Lexicon) -> Vec<Vec<(Sentence, Option<bool>)>> {
    vec![vec![(ops[0].clone(), d)]]
}

/// `Iab` together with `Fa` yields `Fb` — the one genuinely first-order
/// closure-adjacent rule kept independent of `SelfIdentityClosure` (§9).
pub struct IdentityIndiscernability;

impl Rule for IdentityIndiscernability {
    fn name(&self) -> &'static str {
        "IdentityIndiscernability"
    }
    fn legend(&self) -> Legend {
        Legend { predicate: Some(Predicate::System(SystemPredicate::Identity)), ..Default::default() }
    }
    fn example_nodes(&self, lex: &mut Lexicon) -> Vec<NodeSpec> {
        let (c1, c2) = (Constant::first(), Constant::first().next());
        let ident =
            lex.predicated(Predicate::System(SystemPredicate::Identity), vec![c1.into(), c2.into()]).unwrap();
        vec![NodeSpec::sentence(ident)]
    }
    fn get_targets(&mut self, branch_id: usize, branch: &Branch, lex: &mut Lexicon) -> Vec<Target> {
        for node in unticked_sentence_nodes(branch) {
            let s = node.sentence().unwrap();
            if let Some((Predicate::System(SystemPredicate::Identity), params)) = s.as_predicated() {
                let (a, b) = (params[0], params[1]);
                if a == b {
                    continue;
                }
                for other in branch.nodes().iter().filter(|n| n.is_sentence_node()) {
                    let os = other.sentence().unwrap();
                    if let Some((pred, oparams)) = os.as_predicated() {
                        if oparams.contains(&a) && pred != Predicate::System(SystemPredicate::Identity) {
                            let swapped: Vec<Parameter> =
                                oparams.iter().map(|&p| if p == a { b } else { p }).collect();
                            let new_s = lex.predicated(pred, swapped).expect("arity preserved");
                            return vec![Target::new(branch_id)
                                .with_node(node.id())
                                .with_groups(vec![vec![NodeSpec::sentence(new_s)]])];
                        }
                    }
                }
            }
        }
        vec![]
    }
}

// ---------------------------------------------------------------------
// Designation-tracking operator rules + universal negation flip (FDE)
// ---------------------------------------------------------------------

/// `¬A @ d  ⟹  A @ ¬d`, generic over any negated sentence. The single rule
/// that lets designation-tracking logics avoid a separate "Negated" variant
/// of every connective rule.
pub struct NegationFlip;

impl Rule for NegationFlip {
    fn name(&self) -> &'static str {
        "NegationFlip"
    }
    fn legend(&self) -> Legend {
        Legend { operator: Some(Operator::Negation), negated: true, ..Default::default() }
    }
    fn example_nodes(&self, lex: &mut Lexicon) -> Vec<NodeSpec> {
        let a = lex.atomic(crate::lexicon::BiCoords::first());
        vec![NodeSpec::sentence(a.negate(lex)).with_designated(true)]
    }
    fn get_targets(&mut self, branch_id: usize, branch: &Branch, _lex: &mut Lexicon) -> Vec<Target> {
        let mut out = Vec::new();
        for node in unticked_sentence_nodes(branch) {
            let s = node.sentence().unwrap();
            if let Some((Operator::Negation, ops)) = s.as_operated() {
                let d = !node.designated().unwrap_or(true);
                let spec = NodeSpec::sentence(ops[0].clone()).with_designated(d);
                out.push(Target::new(branch_id).with_node(node.id()).with_groups(vec![vec![spec]]));
            }
        }
        out
    }
}

/// A connective rule keyed on the CURRENT designation (not on whether the
/// sentence is negated — negation is handled entirely by [`NegationFlip`]).
pub struct DesignatedOperatorRule {
    pub rule_name: &'static str,
    pub operator: Operator,
    pub designated: bool,
    pub branching: usize,
    pub expand: ExpandFn,
}

impl Rule for DesignatedOperatorRule {
    fn name(&self) -> &'static str {
        self.rule_name
    }
    fn branching(&self) -> usize {
        self.branching
    }
    fn legend(&self) -> Legend {
        Legend { operator: Some(self.operator), designation: Some(self.designated), ..Default::default() }
    }
    fn example_nodes(&self, lex: &mut Lexicon) -> Vec<NodeSpec> {
        let a = lex.atomic(crate::lexicon::BiCoords::first());
        let b = lex.atomic(crate::lexicon::BiCoords::first().next());
        let operands = if self.operator.arity() == 1 { vec![a] } else { vec![a, b] };
        let s = lex.operated(self.operator, operands);
        vec![NodeSpec::sentence(s).with_designated(self.designated)]
    }
    fn get_targets(&mut self, branch_id: usize, branch: &Branch, lex: &mut Lexicon) -> Vec<Target> {
        let mut out = Vec::new();
        for node in unticked_sentence_nodes(branch) {
            let s = node.sentence().unwrap();
            if node.designated() != Some(self.designated) {
                continue;
            }
            if let Some((op, ops)) = s.as_operated() {
                if op == self.operator {
                    let groups = (self.expand)(ops, Some(self.designated), lex);
                    let groups: Vec<Vec<NodeSpec>> = groups
                        .into_iter()
                        .map(|g| {
                            g.into_iter()
                                .map(|(s, d)| {
                                    let spec = NodeSpec::sentence(s);
                                    if let Some(d) = d {
                                        spec.with_designated(d)
                                    } else {
                                        spec
                                    }
                                })
                                .collect()
                        })
                        .collect();
                    out.push(Target::new(branch_id).with_node(node.id()).with_groups(groups));
                }
            }
        }
        out
    }
}

pub fn expand_conj_designated_true(ops: &[Sentence], _d: Option<bool>, _lex: &mut Lexicon) -> Vec<Vec<(Sentence, Option<bool>)>> {
    vec![ops.iter().map(|s| (s.clone(), Some(true))).collect()]
}
pub fn expand_conj_designated_false(ops: &[Sentence], _d: Option<bool>, _lex: &mut Lexicon) -> Vec<Vec<(Sentence, Option<bool>)>> {
    ops.iter().map(|s| vec![(s.clone(), Some(false))]).collect()
}
pub fn expand_disj_designated_true(ops: &[Sentence], _d: Option<bool>, _lex: &mut Lexicon) -> Vec<Vec<(Sentence, Option<bool>)>> {
    ops.iter().map(|s| vec![(s.clone(), Some(true))]).collect()
}
pub fn expand_disj_designated_false(ops: &[Sentence], _d: Option<bool>, _lex: &mut Lexicon) -> Vec<Vec<(Sentence, Option<bool>)>> {
    vec![ops.iter().map(|s| (s.clone(), Some(false))).collect()]
}

// ---------------------------------------------------------------------
// Quantifier rules
// ---------------------------------------------------------------------

fn branch_constants(branch: &Branch) -> HashSet<Constant> {
    branch.nodes().iter().filter_map(|n| n.sentence()).flat_map(|s| s.constants().iter().copied()).collect()
}

/// `¬Qx.A ⟹ Q'x.¬A` where `Q'` is the dual quantifier — reduces a negated
/// quantified sentence to operator shape (§4.4 group 1).
pub struct QuantifierNegated;

impl Rule for QuantifierNegated {
    fn name(&self) -> &'static str {
        "QuantifierNegated"
    }
    fn legend(&self) -> Legend {
        Legend { negated: true, ..Default::default() }
    }
    fn example_nodes(&self, lex: &mut Lexicon) -> Vec<NodeSpec> {
        let v = crate::lexicon::Variable::first();
        let pred = lex.predicates.add(crate::lexicon::TriCoords::first(1)).unwrap();
        let body = lex.predicated(pred, vec![v.into()]).unwrap();
        let q = lex.quantified(Quantifier::Existential, v, body);
        vec![NodeSpec::sentence(q.negate(lex))]
    }
    fn get_targets(&mut self, branch_id: usize, branch: &Branch, lex: &mut Lexicon) -> Vec<Target> {
        let mut out = Vec::new();
        for node in unticked_sentence_nodes(branch) {
            let s = node.sentence().unwrap();
            if let Some((Operator::Negation, ops)) = s.as_operated() {
                if let Some((q, v, body)) = ops[0].as_quantified() {
                    let dual = match q {
                        Quantifier::Existential => Quantifier::Universal,
                        Quantifier::Universal => Quantifier::Existential,
                    };
                    let negated_body = body.negate(lex);
                    let new_s = lex.quantified(dual, v, negated_body);
                    let spec = NodeSpec::sentence(new_s).with_designated_if(node.designated());
                    out.push(Target::new(branch_id).with_node(node.id()).with_groups(vec![vec![spec]]));
                }
            }
        }
        out
    }
}

/// Existential-instantiation-like: introduces one fresh constant, ticks.
pub struct QuantifierNarrow {
    pub quantifier: Quantifier,
    pub max_consts: MaxConsts,
}

impl QuantifierNarrow {
    pub fn new(quantifier: Quantifier) -> Self {
        Self { quantifier, max_consts: MaxConsts::new() }
    }
}

impl Rule for QuantifierNarrow {
    fn name(&self) -> &'static str {
        "QuantifierNarrow"
    }
    fn legend(&self) -> Legend {
        Legend { quantifier: Some(self.quantifier), ..Default::default() }
    }
    fn example_nodes(&self, lex: &mut Lexicon) -> Vec<NodeSpec> {
        let v = crate::lexicon::Variable::first();
        let pred = lex.predicates.add(crate::lexicon::TriCoords::first(1)).unwrap();
        let body = lex.predicated(pred, vec![v.into()]).unwrap();
        vec![NodeSpec::sentence(lex.quantified(self.quantifier, v, body))]
    }
    fn get_targets(&mut self, branch_id: usize, branch: &Branch, lex: &mut Lexicon) -> Vec<Target> {
        self.max_consts.project(branch_id, branch.nodes());
        if self.max_consts.max_constants_reached(branch_id, branch_constants(branch).len()) {
            return if self.max_consts.quit_flag(branch_id) {
                vec![Target::quit_flag(branch_id, "max-constants")]
            } else {
                vec![]
            };
        }
        let mut out = Vec::new();
        for node in unticked_sentence_nodes(branch) {
            let s = node.sentence().unwrap();
            if let Some((q, _, _)) = s.as_quantified() {
                if q == self.quantifier {
                    let c = branch.new_constant();
                    let instantiated = s.unquantify(c, lex);
                    let spec = NodeSpec::sentence(instantiated).with_designated_if(node.designated());
                    out.push(
                        Target::new(branch_id)
                            .with_node(node.id())
                            .with_groups(vec![vec![spec]])
                            .with_constant(c),
                    );
                }
            }
        }
        out
    }
    fn score_candidate(&self, _target: &Target) -> f64 {
        0.0
    }
}

/// Universal-instantiation-like: tracks per-node applied constants itself
/// (the "fat" pattern of §4.4.3); never ticks.
pub struct QuantifierFat {
    pub quantifier: Quantifier,
    pub max_consts: MaxConsts,
    applied: HashMap<(usize, u64), HashSet<Constant>>,
}

impl QuantifierFat {
    pub fn new(quantifier: Quantifier) -> Self {
        Self { quantifier, max_consts: MaxConsts::new(), applied: HashMap::new() }
    }
}

impl Rule for QuantifierFat {
    fn name(&self) -> &'static str {
        "QuantifierFat"
    }
    fn ticking(&self) -> bool {
        false
    }
    fn legend(&self) -> Legend {
        Legend { quantifier: Some(self.quantifier), ..Default::default() }
    }
    fn example_nodes(&self, lex: &mut Lexicon) -> Vec<NodeSpec> {
        let v = crate::lexicon::Variable::first();
        let pred = lex.predicates.add(crate::lexicon::TriCoords::first(1)).unwrap();
        let body = lex.predicated(pred, vec![v.into()]).unwrap();
        vec![NodeSpec::sentence(lex.quantified(self.quantifier, v, body))]
    }
    fn get_targets(&mut self, branch_id: usize, branch: &Branch, lex: &mut Lexicon) -> Vec<Target> {
        self.max_consts.project(branch_id, branch.nodes());
        let consts = branch_constants(branch);
        if self.max_consts.max_constants_reached(branch_id, consts.len()) {
            return if self.max_consts.quit_flag(branch_id) {
                vec![Target::quit_flag(branch_id, "max-constants")]
            } else {
                vec![]
            };
        }
        let witness_consts: Vec<Constant> =
            if consts.is_empty() { vec![Constant::first()] } else { consts.into_iter().collect() };

        for node in branch.nodes().iter().filter(|n| n.is_sentence_node()) {
            let s = node.sentence().unwrap();
            if let Some((q, _, _)) = s.as_quantified() {
                if q != self.quantifier {
                    continue;
                }
                let key = (branch_id, node.id());
                let done = self.applied.entry(key).or_default();
                if let Some(c) = witness_consts.iter().find(|c| !done.contains(c)) {
                    let c = *c;
                    done.insert(c);
                    let instantiated = s.unquantify(c, lex);
                    let spec = NodeSpec::sentence(instantiated).with_designated_if(node.designated());
                    return vec![Target::new(branch_id)
                        .with_node(node.id())
                        .with_groups(vec![vec![spec]])
                        .with_constant(c)];
                }
            }
        }
        vec![]
    }
    fn score_candidate(&self, _target: &Target) -> f64 {
        1.0
    }
}

// ---------------------------------------------------------------------
// Modal rules
// ---------------------------------------------------------------------

/// Existential-modal: `◇A @ w1 ⟹` fresh `w2`, `A @ w2`, access `(w1, w2)`.
pub struct ModalPossibility {
    pub max_worlds: MaxWorlds,
}

impl ModalPossibility {
    pub fn new() -> Self {
        Self { max_worlds: MaxWorlds::new() }
    }
}

impl Rule for ModalPossibility {
    fn name(&self) -> &'static str {
        "Possibility"
    }
    fn legend(&self) -> Legend {
        Legend { operator: Some(Operator::Possibility), ..Default::default() }
    }
    fn example_nodes(&self, lex: &mut Lexicon) -> Vec<NodeSpec> {
        let a = lex.atomic(crate::lexicon::BiCoords::first());
        vec![NodeSpec::sentence(lex.operated(Operator::Possibility, vec![a])).with_world(0)]
    }
    fn get_targets(&mut self, branch_id: usize, branch: &Branch, lex: &mut Lexicon) -> Vec<Target> {
        self.max_worlds.project(branch_id, branch.nodes());
        let world_count = (0..branch.next_world()).count();
        if self.max_worlds.max_worlds_reached(branch_id, world_count) {
            return if self.max_worlds.quit_flag(branch_id) {
                vec![Target::quit_flag(branch_id, "max-worlds")]
            } else {
                vec![]
            };
        }
        for node in unticked_sentence_nodes(branch) {
            let s = node.sentence().unwrap();
            if let Some((Operator::Possibility, ops)) = s.as_operated() {
                let w1 = node.world().unwrap_or(0);
                let w2 = branch.next_world();
                let inner = NodeSpec::sentence(ops[0].clone()).with_world(w2);
                let access = NodeSpec::access(w1, w2);
                let _ = lex;
                return vec![Target::new(branch_id).with_node(node.id()).with_groups(vec![vec![inner, access]])];
            }
        }
        vec![]
    }
}

/// Universal-modal: for each world visible from `w1` not yet processed for
/// this node, add the inner sentence there. Never ticks.
pub struct ModalNecessity {
    applied: HashMap<(usize, u64), HashSet<World>>,
}

impl ModalNecessity {
    pub fn new() -> Self {
        Self { applied: HashMap::new() }
    }
}

impl Rule for ModalNecessity {
    fn name(&self) -> &'static str {
        "Necessity"
    }
    fn ticking(&self) -> bool {
        false
    }
    fn legend(&self) -> Legend {
        Legend { operator: Some(Operator::Necessity), ..Default::default() }
    }
    fn example_nodes(&self, lex: &mut Lexicon) -> Vec<NodeSpec> {
        let a = lex.atomic(crate::lexicon::BiCoords::first());
        vec![
            NodeSpec::sentence(lex.operated(Operator::Necessity, vec![a])).with_world(0),
            NodeSpec::access(0, 1),
        ]
    }
    fn get_targets(&mut self, branch_id: usize, branch: &Branch, _lex: &mut Lexicon) -> Vec<Target> {
        let world_index = collect_world_index(branch);
        for node in branch.nodes().iter().filter(|n| n.is_sentence_node()) {
            let s = node.sentence().unwrap();
            if let Some((Operator::Necessity, ops)) = s.as_operated() {
                let w1 = node.world().unwrap_or(0);
                let key = (branch_id, node.id());
                let done = self.applied.entry(key).or_default();
                for w2 in world_index.visible_worlds(branch_id, w1) {
                    if !done.contains(&w2) {
                        done.insert(w2);
                        let spec = NodeSpec::sentence(ops[0].clone()).with_world(w2);
                        return vec![Target::new(branch_id).with_node(node.id()).with_groups(vec![vec![spec]])];
                    }
                }
            }
        }
        vec![]
    }
}

/// Rebuilds a throwaway [`WorldIndex`] from one branch's access nodes,
/// keyed under a scratch id of `0` since the index never outlives this call.
fn collect_world_index(branch: &Branch) -> WorldIndex {
    let mut wi = WorldIndex::new();
    for node in branch.nodes() {
        if node.access().is_some() {
            wi.add_access(0, node);
        }
    }
    wi
}

/// Adds a reflexive access edge `(w, w)` for every world missing one.
pub struct AccessReflexive;

impl Rule for AccessReflexive {
    fn name(&self) -> &'static str {
        "Reflexive"
    }
    fn example_nodes(&self, lex: &mut Lexicon) -> Vec<NodeSpec> {
        let a = lex.atomic(crate::lexicon::BiCoords::first());
        vec![NodeSpec::sentence(a).with_world(0)]
    }
    fn get_targets(&mut self, branch_id: usize, branch: &Branch, _lex: &mut Lexicon) -> Vec<Target> {
        let worlds: HashSet<World> = branch.nodes().iter().filter_map(|n| n.world()).collect();
        let wi = collect_world_index(branch);
        for w in worlds {
            if !wi.has_access(0, w, w) {
                return vec![Target::new(branch_id).with_groups(vec![vec![NodeSpec::access(w, w)]])];
            }
        }
        vec![]
    }
}

/// Adds `(w1, w3)` whenever `(w1, w2)` and `(w2, w3)` are both present.
pub struct AccessTransitive;

impl Rule for AccessTransitive {
    fn name(&self) -> &'static str {
        "Transitive"
    }
    fn example_nodes(&self, _lex: &mut Lexicon) -> Vec<NodeSpec> {
        vec![NodeSpec::access(0, 1), NodeSpec::access(1, 2)]
    }
    fn get_targets(&mut self, branch_id: usize, branch: &Branch, _lex: &mut Lexicon) -> Vec<Target> {
        let wi = collect_world_index(branch);
        let worlds: HashSet<World> = branch.nodes().iter().filter_map(|n| n.world()).collect();
        for &w1 in &worlds {
            for w2 in wi.visible_worlds(0, w1) {
                for w3 in wi.visible_worlds(0, w2) {
                    if !wi.has_access(0, w1, w3) {
                        return vec![Target::new(branch_id).with_groups(vec![vec![NodeSpec::access(w1, w3)]])];
                    }
                }
            }
        }
        vec![]
    }
}

/// Adds `(w2, w1)` whenever `(w1, w2)` is present but its converse is not.
pub struct AccessSymmetric;

impl Rule for AccessSymmetric {
    fn name(&self) -> &'static str {
        "Symmetric"
    }
    fn example_nodes(&self, _lex: &mut Lexicon) -> Vec<NodeSpec> {
        vec![NodeSpec::access(0, 1)]
    }
    fn get_targets(&mut self, branch_id: usize, branch: &Branch, _lex: &mut Lexicon) -> Vec<Target> {
        for node in branch.nodes() {
            if let Some((w1, w2)) = node.access() {
                let wi = collect_world_index(branch);
                if !wi.has_access(0, w2, w1) {
                    return vec![Target::new(branch_id).with_groups(vec![vec![NodeSpec::access(w2, w1)]])];
                }
            }
        }
        vec![]
    }
}

/// Guarantees every world has at least one successor. Ordered last in a
/// logic's rule groups so it fires only once no consumer can make progress
/// otherwise (§4.4, final bullet).
pub struct AccessSerial {
    pub max_worlds: MaxWorlds,
}

impl AccessSerial {
    pub fn new() -> Self {
        Self { max_worlds: MaxWorlds::new() }
    }
}

impl Rule for AccessSerial {
    fn name(&self) -> &'static str {
        "Serial"
    }
    fn example_nodes(&self, lex: &mut Lexicon) -> Vec<NodeSpec> {
        let a = lex.atomic(crate::lexicon::BiCoords::first());
        vec![NodeSpec::sentence(a).with_world(0)]
    }
    fn get_targets(&mut self, branch_id: usize, branch: &Branch, _lex: &mut Lexicon) -> Vec<Target> {
        self.max_worlds.project(branch_id, branch.nodes());
        let worlds: HashSet<World> = branch.nodes().iter().filter_map(|n| n.world()).collect();
        let wi = collect_world_index(branch);
        for w in worlds {
            if wi.visible_worlds(0, w).is_empty() {
                if self.max_worlds.max_worlds_reached(branch_id, branch.next_world() as usize) {
                    return if self.max_worlds.quit_flag(branch_id) {
                        vec![Target::quit_flag(branch_id, "max-worlds")]
                    } else {
                        vec![]
                    };
                }
                let w2 = branch.next_world();
                return vec![Target::new(branch_id).with_groups(vec![vec![NodeSpec::access(w, w2)]])];
            }
        }
        vec![]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::BiCoords;

    #[test]
    fn contradiction_closure_finds_negation_pair() {
        let mut lex = Lexicon::new();
        let mut branch = Branch::new_root();
        let a = lex.atomic(BiCoords::first());
        let na = a.negate(&mut lex);
        branch.append(0, NodeSpec::sentence(a));
        branch.append(1, NodeSpec::sentence(na));
        let mut rule = ContradictionClosure;
        let targets = rule.get_targets(0, &branch, &mut lex);
        assert_eq!(targets.len(), 1);
    }

    #[test]
    fn conjunction_rule_splits_operands() {
        let mut lex = Lexicon::new();
        let mut branch = Branch::new_root();
        let a = lex.atomic(BiCoords::first());
        let b = lex.atomic(BiCoords::first().next());
        let conj = lex.operated(Operator::Conjunction, vec![a, b]);
        branch.append(0, NodeSpec::sentence(conj));
        let mut rule = StructuralOperatorRule {
            rule_name: "Conjunction",
            operator: Operator::Conjunction,
            negated: false,
            branching: 0,
            ticking: true,
            expand: expand_conjunction,
        };
        let targets = rule.get_targets(0, &branch, &mut lex);
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].groups.len(), 1);
        assert_eq!(targets[0].groups[0].len(), 2);
    }

    #[test]
    fn legend_carries_operator_and_designation() {
        let rule = DesignatedOperatorRule {
            rule_name: "ConjunctionDesignated",
            operator: Operator::Conjunction,
            designated: true,
            branching: 0,
            expand: expand_conj_designated_true,
        };
        let legend = rule.legend();
        assert_eq!(legend.operator, Some(Operator::Conjunction));
        assert_eq!(legend.designation, Some(true));
    }

    #[test]
    fn legend_carries_quantifier() {
        let rule = QuantifierNarrow::new(Quantifier::Existential);
        assert_eq!(rule.legend().quantifier, Some(Quantifier::Existential));
    }

    #[test]
    fn legend_carries_identity_predicate() {
        let legend = IdentityIndiscernability.legend();
        assert_eq!(legend.predicate, Some(Predicate::System(SystemPredicate::Identity)));
    }

    #[test]
    fn disjunction_rule_branches() {
        let mut lex = Lexicon::new();
        let mut branch = Branch::new_root();
        let a = lex.atomic(BiCoords::first());
        let b = lex.atomic(BiCoords::first().next());
        let disj = lex.operated(Operator::Disjunction, vec![a, b]);
        branch.append(0, NodeSpec::sentence(disj));
        let mut rule = StructuralOperatorRule {
            rule_name: "Disjunction",
            operator: Operator::Disjunction,
            negated: false,
            branching: 1,
            ticking: true,
            expand: expand_disjunction,
        };
        let targets = rule.get_targets(0, &branch, &mut lex);
        assert_eq!(targets[0].groups.len(), 2);
    }
}
