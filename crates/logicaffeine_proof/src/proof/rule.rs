//! The rule contract every logic's rule catalogue implements (§4.3).
//!
//! Rust has no metaclass-driven rule discovery (§9): each logic ships a
//! static `Vec` of boxed rules instead of relying on subclass registration,
//! and a rule's `branching` is a declared constant rather than something
//! inferred by probing the rule once at class-creation time.

use crate::lexicon::{Lexicon, Operator, Predicate, Quantifier};
use crate::proof::branch::Branch;
use crate::proof::node::NodeSpec;
use crate::proof::target::Target;

/// A legend used only for presentation/sorting, inferred in `pytableaux`
/// from rule attributes (`operator`, `negated`, `designation`, `quantifier`,
/// `predicate`, `closure`); kept here as an explicit small struct rather
/// than introspected.
#[derive(Clone, Copy, Default, Debug)]
pub struct Legend {
    pub operator: Option<Operator>,
    pub negated: bool,
    pub designation: Option<bool>,
    pub quantifier: Option<Quantifier>,
    pub predicate: Option<Predicate>,
    pub closure: bool,
}

/// One concrete rule in a logic's catalogue.
pub trait Rule {
    fn name(&self) -> &'static str;

    /// `true` ⇒ a successful application ticks its target node.
    fn ticking(&self) -> bool {
        true
    }

    /// Additional branches this rule creates per application (0 for a
    /// non-branching rule). Declared per concrete rule rather than probed.
    fn branching(&self) -> usize {
        0
    }

    fn legend(&self) -> Legend {
        Legend::default()
    }

    /// `true` for a rule whose only action is `branch.close()`.
    fn is_closure(&self) -> bool {
        false
    }

    /// Witness nodes that trigger this rule; used by branching-induction
    /// tests and as example material.
    fn example_nodes(&self, lex: &mut Lexicon) -> Vec<NodeSpec>;

    /// Every candidate application this rule would make against `branch`.
    fn get_targets(&mut self, branch_id: usize, branch: &Branch, lex: &mut Lexicon) -> Vec<Target>;

    /// Heuristic used for rank-optimisation among this rule's own
    /// candidates (§4.6 step 3).
    fn score_candidate(&self, _target: &Target) -> f64 {
        0.0
    }

    /// Heuristic used for group-optimisation among rules in the same group
    /// (§4.6 step 2). Defaults to the candidate score.
    fn group_score(&self, target: &Target) -> f64 {
        target.candidate_score.unwrap_or(0.0)
    }
}

/// A group of rules tried together; step selection considers the whole
/// group before moving to the next one (§4.6).
pub type RuleGroup = Vec<Box<dyn Rule>>;

/// The ordered list of rule groups a logic declares.
pub type RuleGroups = Vec<RuleGroup>;
