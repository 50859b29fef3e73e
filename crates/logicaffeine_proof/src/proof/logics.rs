//! Concrete logics: each one is data — a [`Meta`] descriptor plus an
//! ordered [`RuleGroups`] built from the shared patterns of
//! [`crate::proof::patterns`] (§10.6). `pytableaux`'s own logic modules are
//! themselves thin descriptor tables over these same shared rule patterns
//! (confirmed by reading `logics/k.py` and `logics/cpl.py`).

use crate::lexicon::{Operator, Quantifier};
use crate::proof::model::Mval;
use crate::proof::patterns::*;
use crate::proof::rule::{Rule, RuleGroup, RuleGroups};

/// Per-logic descriptor, mirroring `pytableaux.logics.LogicType.Meta`.
#[derive(Clone, Copy, Debug)]
pub struct Meta {
    pub name: &'static str,
    pub title: &'static str,
    /// `false`: trunk negates the conclusion and nodes carry no
    /// designation. `true`: trunk marks premises designated and the
    /// (non-negated) conclusion undesignated (§4.5).
    pub tracks_designation: bool,
    pub is_modal: bool,
    pub is_quantified: bool,
    /// Whether `B` counts as a designated value for countermodel checking.
    pub designated_includes_b: bool,
    pub unassigned: Mval,
}

fn structural(
    rule_name: &'static str,
    operator: Operator,
    negated: bool,
    branching: usize,
    expand: ExpandFn,
) -> Box<dyn Rule> {
    Box::new(StructuralOperatorRule { rule_name, operator, negated, branching, ticking: true, expand })
}

fn designated(rule_name: &'static str, operator: Operator, designated: bool, branching: usize, expand: ExpandFn) -> Box<dyn Rule> {
    Box::new(DesignatedOperatorRule { rule_name, operator, designated, branching, expand })
}

/// Closure group shared by every first-order logic that tracks bivalent
/// (non-designated) truth: contradiction, self-identity, non-existence.
fn classical_closure_group() -> RuleGroup {
    vec![Box::new(ContradictionClosure), Box::new(SelfIdentityClosure), Box::new(NonExistenceClosure)]
}

/// Non-branching structural operator rules, shared by CPL/CFOL/K/D, plus
/// `QuantifierNegated`/`IdentityIndiscernability` which reduce to the same
/// "doesn't split the branch" tier (§4.4 group 1).
fn propositional_group1() -> RuleGroup {
    vec![
        structural("Conjunction", Operator::Conjunction, false, 0, expand_conjunction),
        structural("DisjunctionNegated", Operator::Disjunction, true, 0, expand_disjunction_negated),
        structural("MaterialConditionalNegated", Operator::MaterialConditional, true, 0, expand_material_conditional_negated),
        structural("ConditionalNegated", Operator::Conditional, true, 0, expand_material_conditional_negated),
        structural("Biconditional", Operator::Biconditional, false, 0, expand_biconditional),
        structural("MaterialBiconditional", Operator::MaterialBiconditional, false, 0, expand_biconditional),
        structural("Assertion", Operator::Assertion, false, 0, expand_assertion),
        structural("AssertionNegated", Operator::Assertion, true, 0, expand_assertion_negated),
        structural("DoubleNegation", Operator::Negation, true, 0, expand_double_negation),
        Box::new(QuantifierNegated),
        Box::new(IdentityIndiscernability),
    ]
}

/// Branching structural operator rules, shared by CPL/CFOL/K/D (§4.4 group 2).
fn propositional_group2() -> RuleGroup {
    vec![
        structural("Disjunction", Operator::Disjunction, false, 1, expand_disjunction),
        structural("ConjunctionNegated", Operator::Conjunction, true, 1, expand_conjunction_negated),
        structural("MaterialConditional", Operator::MaterialConditional, false, 1, expand_material_conditional),
        structural("Conditional", Operator::Conditional, false, 1, expand_material_conditional),
        structural("BiconditionalNegated", Operator::Biconditional, true, 1, expand_biconditional_negated),
        structural("MaterialBiconditionalNegated", Operator::MaterialBiconditional, true, 1, expand_biconditional_negated),
    ]
}

fn quantifier_group() -> RuleGroup {
    vec![
        Box::new(QuantifierNarrow::new(Quantifier::Existential)),
        Box::new(QuantifierFat::new(Quantifier::Universal)),
    ]
}

/// Classical propositional logic: bivalent, non-modal, non-quantified.
pub fn cpl() -> (Meta, RuleGroups) {
    let meta = Meta {
        name: "CPL",
        title: "Classical Propositional Logic",
        tracks_designation: false,
        is_modal: false,
        is_quantified: false,
        designated_includes_b: false,
        unassigned: Mval::F,
    };
    let groups = vec![classical_closure_group(), propositional_group1(), propositional_group2()];
    (meta, groups)
}

/// Classical first-order logic: CPL plus quantifier rules.
pub fn cfol() -> (Meta, RuleGroups) {
    let meta = Meta {
        name: "CFOL",
        title: "Classical First-Order Logic",
        tracks_designation: false,
        is_modal: false,
        is_quantified: true,
        designated_includes_b: false,
        unassigned: Mval::F,
    };
    let groups =
        vec![classical_closure_group(), propositional_group1(), propositional_group2(), quantifier_group()];
    (meta, groups)
}

/// First-degree entailment: 4-valued, paraconsistent/paracomplete. Has no
/// `ContradictionClosure` (no explosion), but still closes on a sentence
/// that is both designated and undesignated on the same branch.
pub fn fde() -> (Meta, RuleGroups) {
    let meta = Meta {
        name: "FDE",
        title: "First-Degree Entailment",
        tracks_designation: true,
        is_modal: false,
        is_quantified: false,
        designated_includes_b: true,
        unassigned: Mval::N,
    };
    let group0: RuleGroup = vec![Box::new(DesignationClosure)];
    let group1 = vec![
        Box::new(NegationFlip) as Box<dyn Rule>,
        designated("ConjunctionDesignated", Operator::Conjunction, true, 0, expand_conj_designated_true),
        designated("DisjunctionUndesignated", Operator::Disjunction, false, 0, expand_disj_designated_false),
    ];
    let group2 = vec![
        designated("ConjunctionUndesignated", Operator::Conjunction, false, 1, expand_conj_designated_false),
        designated("DisjunctionDesignated", Operator::Disjunction, true, 1, expand_disj_designated_true),
    ];
    (meta, vec![group0, group1, group2])
}

/// Normal modal logic K, built over CFOL's operator/quantifier rules plus
/// unrestricted modal rules (§10.6, mirroring `k.py`'s `K = CFOL + KFDE`
/// modal-rule composition without reproducing the fuller hierarchy).
pub fn k() -> (Meta, RuleGroups) {
    let meta = Meta {
        name: "K",
        title: "Modal Logic K",
        tracks_designation: false,
        is_modal: true,
        is_quantified: true,
        designated_includes_b: false,
        unassigned: Mval::F,
    };
    let modal_group: RuleGroup = vec![Box::new(ModalPossibility::new()), Box::new(ModalNecessity::new())];
    let groups = vec![
        classical_closure_group(),
        propositional_group1(),
        propositional_group2(),
        modal_group,
        quantifier_group(),
    ];
    (meta, groups)
}

/// K plus the Serial accessibility constraint, ordered last so it only
/// fires once nothing else can make progress (§4.4, final bullet).
pub fn d() -> (Meta, RuleGroups) {
    let meta = Meta { name: "D", title: "Modal Logic D", ..k().0 };
    let modal_group: RuleGroup = vec![Box::new(ModalPossibility::new()), Box::new(ModalNecessity::new())];
    let serial_group: RuleGroup = vec![Box::new(AccessSerial::new())];
    let groups = vec![
        classical_closure_group(),
        propositional_group1(),
        propositional_group2(),
        modal_group,
        quantifier_group(),
        serial_group,
    ];
    (meta, groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpl_has_a_closure_group_first() {
        let (_, groups) = cpl();
        assert!(groups[0].iter().any(|r| r.is_closure()));
    }

    #[test]
    fn fde_has_no_contradiction_closure_but_does_close_on_designation_conflict() {
        let (_, groups) = fde();
        assert!(groups.iter().flatten().all(|r| r.name() != "ContradictionClosure"));
        assert!(groups[0].iter().any(|r| r.name() == "DesignationClosure"));
    }

    #[test]
    fn d_orders_serial_last() {
        let (_, groups) = d();
        assert_eq!(groups.last().unwrap()[0].name(), "Serial");
    }
}
