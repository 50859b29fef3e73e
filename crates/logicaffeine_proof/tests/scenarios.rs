//! End-to-end scenarios exercised entirely through the public API: lexical
//! construction, argument assembly, and a full `Tableau::build()` (§8).

use logicaffeine_proof::lexicon::{BiCoords, Lexicon, Operator, Quantifier, TriCoords, Variable};
use logicaffeine_proof::proof::logics::{cfol, cpl, d, fde, k};
use logicaffeine_proof::{Argument, Tableau, TableauOptions};

#[test]
fn classical_modus_ponens() {
    let mut lex = Lexicon::new();
    let a = lex.atomic(BiCoords::first());
    let b = lex.atomic(BiCoords::first().next());
    let cond = lex.operated(Operator::MaterialConditional, vec![a.clone(), b.clone()]);
    let argument = Argument::new(b, vec![cond, a]);

    let (meta, groups) = cpl();
    let mut tableau = Tableau::new(argument, lex, meta, groups, TableauOptions::new());
    tableau.build().unwrap();

    assert_eq!(tableau.valid(), Some(true));
    assert_eq!(tableau.stats().open_branches, 0);
}

#[test]
fn classical_affirming_the_consequent_is_invalid() {
    let mut lex = Lexicon::new();
    let a = lex.atomic(BiCoords::first());
    let b = lex.atomic(BiCoords::first().next());
    let cond = lex.operated(Operator::MaterialConditional, vec![a.clone(), b.clone()]);
    let argument = Argument::new(a, vec![cond, b]);

    let (meta, groups) = cpl();
    let mut tableau =
        Tableau::new(argument.clone(), lex, meta, groups, TableauOptions::new().with_build_models(true));
    tableau.build().unwrap();

    assert_eq!(tableau.valid(), Some(false));
    assert!(tableau.models().iter().any(|m| m.is_countermodel_to(&argument).unwrap()));
}

#[test]
fn fde_explosion_is_invalid() {
    let mut lex = Lexicon::new();
    let a = lex.atomic(BiCoords::first());
    let b = lex.atomic(BiCoords::first().next());
    let na = a.negate(&mut lex);
    let conjunction = lex.operated(Operator::Conjunction, vec![a, na]);
    let argument = Argument::new(b, vec![conjunction]);

    let (meta, groups) = fde();
    let mut tableau = Tableau::new(argument, lex, meta, groups, TableauOptions::new().with_build_models(true));
    tableau.build().unwrap();

    assert_eq!(tableau.valid(), Some(false));
    assert!(!tableau.models().is_empty());
}

#[test]
fn k_necessity_distributes_over_conditional() {
    let mut lex = Lexicon::new();
    let a = lex.atomic(BiCoords::first());
    let b = lex.atomic(BiCoords::first().next());
    let cond = lex.operated(Operator::MaterialConditional, vec![a.clone(), b.clone()]);
    let premise = lex.operated(Operator::Necessity, vec![cond]);
    let la = lex.operated(Operator::Necessity, vec![a]);
    let lb = lex.operated(Operator::Necessity, vec![b]);
    let conclusion = lex.operated(Operator::MaterialConditional, vec![la, lb]);
    let argument = Argument::new(conclusion, vec![premise]);

    let (meta, groups) = k();
    let mut tableau = Tableau::new(argument, lex, meta, groups, TableauOptions::new());
    tableau.build().unwrap();

    assert_eq!(tableau.valid(), Some(true));
}

#[test]
fn existential_from_universal_in_cfol() {
    let mut lex = Lexicon::new();
    let pred = lex.predicates.add(TriCoords::first(1)).unwrap();
    let v = Variable::first();
    let body = lex.predicated(pred, vec![v.into()]).unwrap();
    let universal = lex.quantified(Quantifier::Universal, v, body.clone());
    let existential = lex.quantified(Quantifier::Existential, v, body);
    let argument = Argument::new(existential, vec![universal]);

    let (meta, groups) = cfol();
    let mut tableau = Tableau::new(argument, lex, meta, groups, TableauOptions::new());
    tableau.build().unwrap();

    assert_eq!(tableau.valid(), Some(true));
}

#[test]
fn serial_box_to_diamond_in_d() {
    let mut lex = Lexicon::new();
    let a = lex.atomic(BiCoords::first());
    let premise = lex.operated(Operator::Necessity, vec![a.clone()]);
    let conclusion = lex.operated(Operator::Possibility, vec![a]);
    let argument = Argument::new(conclusion, vec![premise]);

    let (meta, groups) = d();
    let mut tableau = Tableau::new(argument, lex, meta, groups, TableauOptions::new());
    tableau.build().unwrap();

    assert_eq!(tableau.valid(), Some(true));
}

#[test]
fn empty_premises_reduce_trunk_to_the_conclusion_alone() {
    let mut lex = Lexicon::new();
    let a = lex.atomic(BiCoords::first());
    let argument = Argument::new(a, vec![]);

    let (meta, groups) = cpl();
    let mut tableau = Tableau::new(argument, lex, meta, groups, TableauOptions::new());
    tableau.build().unwrap();

    // A bare atomic's negation never closes: the argument is invalid.
    assert_eq!(tableau.valid(), Some(false));
}

#[test]
fn build_emits_a_tree_with_every_branch_reachable() {
    let mut lex = Lexicon::new();
    let a = lex.atomic(BiCoords::first());
    let b = lex.atomic(BiCoords::first().next());
    let disjunction = lex.operated(Operator::Disjunction, vec![a.clone(), b.clone()]);
    let argument = Argument::new(disjunction.clone(), vec![disjunction]);

    let (meta, groups) = cpl();
    let mut tableau = Tableau::new(argument, lex, meta, groups, TableauOptions::new());
    tableau.build().unwrap();

    let tree = tableau.tree().expect("tree is built after a non-timed-out run");
    assert_eq!(tree.width, tableau.branches().len());
}
