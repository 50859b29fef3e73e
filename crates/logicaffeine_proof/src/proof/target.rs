//! Targets: what a rule proposes to do, before and after engine scoring.

use crate::lexicon::{Constant, Sentence};
use crate::proof::node::{NodeSpec, World};

/// What a rule's `_get_targets` yields for a candidate application, and what
/// `_apply` consumes to mutate the branch. Scoring fields are filled in by
/// the engine during step selection (§4.6), not by the rule itself.
#[derive(Clone, Debug)]
pub struct Target {
    pub branch: usize,
    pub node: Option<u64>,
    pub nodes: Vec<NodeSpec>,
    /// When set, `_apply` should fork once per inner `Vec<NodeSpec>` rather
    /// than appending everything to one branch — the "adds(group(...), ...)"
    /// shape from §4.4.2.
    pub groups: Vec<Vec<NodeSpec>>,
    pub designated: Option<bool>,
    pub world: Option<World>,
    pub constant: Option<Constant>,
    pub sentence: Option<Sentence>,
    /// Set only for a quit-flag pseudo-application (§9): the engine appends
    /// a `QuitFlagNode` without scoring and does not treat this as a normal
    /// rule application.
    pub flag: Option<&'static str>,

    // Filled in by the engine during step selection, never by a rule.
    pub rule_name: Option<&'static str>,
    pub candidate_score: Option<f64>,
    pub total_candidates: Option<usize>,
    pub min_candidate_score: Option<f64>,
    pub max_candidate_score: Option<f64>,
    pub is_rank_optim: bool,
    pub group_score: Option<f64>,
    pub total_group_targets: Option<usize>,
    pub is_group_optim: bool,
}

impl Target {
    pub fn new(branch: usize) -> Self {
        Self {
            branch,
            node: None,
            nodes: Vec::new(),
            groups: Vec::new(),
            designated: None,
            world: None,
            constant: None,
            sentence: None,
            flag: None,
            rule_name: None,
            candidate_score: None,
            total_candidates: None,
            min_candidate_score: None,
            max_candidate_score: None,
            is_rank_optim: false,
            group_score: None,
            total_group_targets: None,
            is_group_optim: false,
        }
    }

    pub fn with_node(mut self, node: u64) -> Self {
        self.node = Some(node);
        self
    }

    pub fn with_nodes(mut self, nodes: Vec<NodeSpec>) -> Self {
        self.nodes = nodes;
        self
    }

    pub fn with_groups(mut self, groups: Vec<Vec<NodeSpec>>) -> Self {
        self.groups = groups;
        self
    }

    pub fn with_designated(mut self, designated: bool) -> Self {
        self.designated = Some(designated);
        self
    }

    pub fn with_world(mut self, world: World) -> Self {
        self.world = Some(world);
        self
    }

    pub fn with_constant(mut self, constant: Constant) -> Self {
        self.constant = Some(constant);
        self
    }

    pub fn with_sentence(mut self, sentence: Sentence) -> Self {
        self.sentence = Some(sentence);
        self
    }

    pub fn quit_flag(branch: usize, flag: &'static str) -> Self {
        let mut t = Self::new(branch);
        t.flag = Some(flag);
        t
    }

    pub fn is_quit_flag(&self) -> bool {
        self.flag.is_some()
    }
}
