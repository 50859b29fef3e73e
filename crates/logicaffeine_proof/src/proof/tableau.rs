//! The tableau engine: trunk construction, the step loop with two-level
//! optimisation, termination, and the post-build tree view (§4.5-§4.7).

use std::time::Instant;

use crate::error::ProofError;
use crate::lexicon::{Argument, Lexicon};
use crate::proof::branch::Branch;
use crate::proof::events::{RuleEvent, TabEvent, TabEvents};
use crate::proof::logics::Meta;
use crate::proof::model::{DesignatedSet, Model};
use crate::proof::node::NodeSpec;
use crate::proof::rule::{Rule, RuleGroups};
use crate::proof::target::Target;

/// Build options (§6). Matches the teacher's habit of a small
/// `with_*`-method builder rather than a derive-based one.
#[derive(Clone, Debug)]
pub struct TableauOptions {
    pub is_rank_optim: bool,
    pub is_group_optim: bool,
    pub is_build_models: bool,
    pub max_steps: Option<usize>,
    pub build_timeout: Option<u64>,
}

impl Default for TableauOptions {
    fn default() -> Self {
        Self {
            is_rank_optim: true,
            is_group_optim: true,
            is_build_models: false,
            max_steps: None,
            build_timeout: None,
        }
    }
}

impl TableauOptions {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_rank_optim(mut self, v: bool) -> Self {
        self.is_rank_optim = v;
        self
    }
    pub fn with_group_optim(mut self, v: bool) -> Self {
        self.is_group_optim = v;
        self
    }
    pub fn with_build_models(mut self, v: bool) -> Self {
        self.is_build_models = v;
        self
    }
    pub fn with_max_steps(mut self, v: usize) -> Self {
        self.max_steps = Some(v);
        self
    }
    pub fn with_build_timeout(mut self, v: u64) -> Self {
        self.build_timeout = Some(v);
        self
    }
}

/// `tableau.stats` (§6).
#[derive(Clone, Debug, Default)]
pub struct Stats {
    pub result: Option<bool>,
    pub branches: usize,
    pub open_branches: usize,
    pub closed_branches: usize,
    pub steps: usize,
    pub distinct_nodes: usize,
    pub rules_duration_ms: u64,
    pub build_duration_ms: u64,
    pub trunk_duration_ms: u64,
    pub tree_duration_ms: u64,
    pub models_duration_ms: u64,
    pub rules_time_ms: u64,
}

/// One node of the pre-ordered tree view (§4.7). `nodes` holds the ids of
/// the segment of nodes every branch reachable through this tree node
/// shares in common.
#[derive(Clone, Debug, Default)]
pub struct TreeNode {
    pub nodes: Vec<u64>,
    pub left: usize,
    pub right: usize,
    pub width: usize,
    pub depth: usize,
    pub has_open: bool,
    pub has_closed: bool,
    pub step: Option<usize>,
    pub closed_step: Option<usize>,
    pub balanced_line_width: f64,
    pub balanced_line_margin: f64,
    pub branch_id: Option<usize>,
    pub model_id: Option<usize>,
    pub children: Vec<TreeNode>,
}

/// Picks the single winning target from one rule's candidates, filling in
/// the engine-side scoring fields of §4.6 step 3.
fn augment_and_pick(rule: &dyn Rule, mut targets: Vec<Target>, rank_optim: bool) -> Option<Target> {
    if targets.is_empty() {
        return None;
    }
    let scores: Vec<f64> = targets.iter().map(|t| rule.score_candidate(t)).collect();
    let total = targets.len();
    let min = scores.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    for (t, s) in targets.iter_mut().zip(scores.iter()) {
        t.rule_name = Some(rule.name());
        t.candidate_score = Some(*s);
        t.total_candidates = Some(total);
        t.min_candidate_score = Some(min);
        t.max_candidate_score = Some(max);
        t.is_rank_optim = rank_optim;
    }
    if rank_optim {
        targets.into_iter().zip(scores).find(|(_, s)| *s == max).map(|(t, _)| t)
    } else {
        targets.into_iter().next()
    }
}

/// The proof of one argument under one logic. Owns the lexicon so every
/// node a rule creates interns through the same canonical table as the
/// argument's own sentences.
pub struct Tableau {
    lexicon: Lexicon,
    argument: Argument,
    meta: Meta,
    rule_groups: RuleGroups,
    options: TableauOptions,

    branches: Vec<Branch>,
    history: Vec<(&'static str, Target, u64)>,
    events: TabEvents,
    next_node_id: u64,

    premature: bool,
    started: bool,
    finished: bool,
    timed_out: bool,

    rules_duration_ms: u64,
    trunk_duration_ms: u64,

    tree: Option<TreeNode>,
    models: Vec<Model>,
}

impl Tableau {
    pub fn new(argument: Argument, lexicon: Lexicon, meta: Meta, rule_groups: RuleGroups, options: TableauOptions) -> Self {
        Self {
            lexicon,
            argument,
            meta,
            rule_groups,
            options,
            branches: Vec::new(),
            history: Vec::new(),
            events: TabEvents::new(),
            next_node_id: 0,
            premature: true,
            started: false,
            finished: false,
            timed_out: false,
            rules_duration_ms: 0,
            trunk_duration_ms: 0,
            tree: None,
            models: Vec::new(),
        }
    }

    pub fn on_event(&mut self, listener: impl FnMut(&TabEvent) + 'static) {
        self.events.tab.subscribe(listener);
    }

    pub fn on_rule_event(&mut self, listener: impl FnMut(&RuleEvent) + 'static) {
        self.events.rule.subscribe(listener);
    }

    pub fn argument(&self) -> &Argument {
        &self.argument
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub fn tree(&self) -> Option<&TreeNode> {
        self.tree.as_ref()
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    /// `true` once completed with no open branches, `false` once completed
    /// with at least one, `None` if not completed.
    pub fn valid(&self) -> Option<bool> {
        if !self.finished {
            return None;
        }
        Some(self.branches.iter().all(|b| b.is_closed()))
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_node_id;
        self.next_node_id += 1;
        id
    }

    fn append(&mut self, branch: usize, spec: NodeSpec) {
        let id = self.next_id();
        let node = self.branches[branch].append(id, spec);
        self.events.tab.emit(TabEvent::AfterNodeAdd { branch, node });
    }

    /// Builds the trunk (§4.5): one branch with each premise plus the
    /// (possibly negated) conclusion, tagged with designation and/or world
    /// according to the logic's `Meta`.
    fn build_trunk(&mut self) {
        let start = Instant::now();
        self.events.tab.emit(TabEvent::BeforeTrunkBuild);

        self.branches.push(Branch::new_root());
        self.events.tab.emit(TabEvent::AfterBranchAdd { branch: 0 });

        let premises = self.argument.premises().to_vec();
        for premise in premises {
            let mut spec = NodeSpec::sentence(premise);
            if self.meta.tracks_designation {
                spec = spec.with_designated(true);
            }
            if self.meta.is_modal {
                spec = spec.with_world(0);
            }
            self.append(0, spec);
        }

        let mut spec = if self.meta.tracks_designation {
            NodeSpec::sentence(self.argument.conclusion().clone()).with_designated(false)
        } else {
            let negated = self.argument.conclusion().negate(&mut self.lexicon);
            NodeSpec::sentence(negated)
        };
        if self.meta.is_modal {
            spec = spec.with_world(0);
        }
        self.append(0, spec);

        self.events.tab.emit(TabEvent::AfterTrunkBuild);
        self.trunk_duration_ms = start.elapsed().as_millis() as u64;
    }

    fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        self.build_trunk();
    }

    fn commit(&mut self, rule_name: &'static str, ticking: bool, is_closure: bool, target: Target) {
        let start = Instant::now();
        let is_quit = target.is_quit_flag();
        if !is_quit {
            self.events.rule.emit(RuleEvent::BeforeApply { target: target.clone() });
        }
        self.apply_target(ticking, is_closure, target.clone());
        let elapsed = start.elapsed().as_millis() as u64;
        self.rules_duration_ms += elapsed;
        if !is_quit {
            self.events.rule.emit(RuleEvent::AfterApply { target: target.clone() });
            self.history.push((rule_name, target.clone(), elapsed));
            self.events.tab.emit(TabEvent::AfterRuleApply { rule: rule_name, target });
        }
    }

    /// Mutates branch(es) per the winning target: a quit-flag pseudo-target
    /// just releases the node; a closure rule closes the branch; otherwise
    /// each `groups` entry becomes its own branch (forked from the
    /// pre-application state), with the rule's target node ticked on every
    /// resulting branch when `ticking` is set.
    fn apply_target(&mut self, ticking: bool, is_closure: bool, target: Target) {
        let branch = target.branch;

        if target.is_quit_flag() {
            self.append(branch, NodeSpec::quit_flag(target.flag.unwrap()));
            return;
        }

        if is_closure {
            let id = self.next_id();
            let _ = self.branches[branch].close(id);
            self.events.tab.emit(TabEvent::AfterBranchClose { branch });
            return;
        }

        let groups: Vec<Vec<NodeSpec>> = if !target.groups.is_empty() {
            target.groups
        } else if !target.nodes.is_empty() {
            vec![target.nodes]
        } else {
            vec![Vec::new()]
        };

        let mut branch_ids = vec![branch];
        for _ in 1..groups.len() {
            let new_id = self.branches.len();
            let forked = self.branches[branch].fork(branch);
            self.branches.push(forked);
            self.events.tab.emit(TabEvent::AfterBranchAdd { branch: new_id });
            branch_ids.push(new_id);
        }

        for (bid, group) in branch_ids.iter().copied().zip(groups.into_iter()) {
            for spec in group {
                self.append(bid, spec);
            }
            if ticking {
                if let Some(node_id) = target.node {
                    self.branches[bid].tick(node_id);
                    if let Some(node) = self.branches[bid].node(node_id).cloned() {
                        self.events.tab.emit(TabEvent::AfterNodeTick { branch: bid, node });
                    }
                }
            }
        }
    }

    /// One iteration of §4.6. Returns `true` if a rule was applied.
    pub fn step(&mut self) -> bool {
        self.start();
        if self.finished {
            return false;
        }
        if let Some(max) = self.options.max_steps {
            if self.history.len() >= max {
                self.premature = true;
                self.finish();
                return false;
            }
        }

        let open_ids: Vec<usize> = (0..self.branches.len()).filter(|&i| !self.branches[i].is_closed()).collect();

        for bid in open_ids {
            for g in 0..self.rule_groups.len() {
                let group_len = self.rule_groups[g].len();

                if self.options.is_group_optim {
                    let mut collected: Vec<(usize, Target)> = Vec::new();
                    for r in 0..group_len {
                        let targets = {
                            let branch_ref = &self.branches[bid];
                            self.rule_groups[g][r].get_targets(bid, branch_ref, &mut self.lexicon)
                        };
                        if let Some(t) = augment_and_pick(self.rule_groups[g][r].as_ref(), targets, self.options.is_rank_optim) {
                            collected.push((r, t));
                        }
                    }
                    if collected.is_empty() {
                        continue;
                    }
                    let total_group_targets = collected.len();
                    let mut best = 0usize;
                    let mut best_score = f64::NEG_INFINITY;
                    for (i, (r, t)) in collected.iter().enumerate() {
                        let gs = self.rule_groups[g][*r].group_score(t);
                        if gs > best_score {
                            best_score = gs;
                            best = i;
                        }
                    }
                    let (r, mut target) = collected.into_iter().nth(best).unwrap();
                    target.group_score = Some(best_score);
                    target.total_group_targets = Some(total_group_targets);
                    target.is_group_optim = true;
                    let rule_name = self.rule_groups[g][r].name();
                    let ticking = self.rule_groups[g][r].ticking();
                    let is_closure = self.rule_groups[g][r].is_closure();
                    self.commit(rule_name, ticking, is_closure, target);
                    return true;
                } else {
                    for r in 0..group_len {
                        let targets = {
                            let branch_ref = &self.branches[bid];
                            self.rule_groups[g][r].get_targets(bid, branch_ref, &mut self.lexicon)
                        };
                        if let Some(mut target) =
                            augment_and_pick(self.rule_groups[g][r].as_ref(), targets, self.options.is_rank_optim)
                        {
                            target.group_score = None;
                            target.total_group_targets = Some(1);
                            target.is_group_optim = false;
                            let rule_name = self.rule_groups[g][r].name();
                            let ticking = self.rule_groups[g][r].ticking();
                            let is_closure = self.rule_groups[g][r].is_closure();
                            self.commit(rule_name, ticking, is_closure, target);
                            return true;
                        }
                    }
                }
            }
        }

        self.premature = false;
        self.finish();
        false
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.events.tab.emit(TabEvent::AfterFinish);
    }

    /// Runs `step()` to exhaustion, subject to `build_timeout`; optionally
    /// builds models for every open branch, then the tree view.
    pub fn build(&mut self) -> Result<&mut Self, ProofError> {
        self.start();
        let build_start = Instant::now();
        loop {
            if let Some(limit) = self.options.build_timeout {
                if build_start.elapsed().as_millis() as u64 > limit {
                    self.timed_out = true;
                    self.finish();
                    return Err(ProofError::Timeout { limit_ms: limit });
                }
            }
            if !self.step() {
                break;
            }
        }

        if self.options.is_build_models && self.valid() == Some(false) {
            self.build_models();
        }
        if !self.timed_out {
            self.build_tree();
        }
        Ok(self)
    }

    fn build_models(&mut self) {
        let start = Instant::now();
        let designated = DesignatedSet { includes_b: self.meta.designated_includes_b };
        let mut models = Vec::new();
        for branch in self.branches.iter().filter(|b| !b.is_closed()) {
            let mut model = Model::new(designated, self.meta.unassigned);
            model.read_branch(branch);
            let _ = model.finish();
            models.push(model);
        }
        self.models = models;
        let _ = start;
    }

    pub fn stats(&self) -> Stats {
        Stats {
            result: self.valid(),
            branches: self.branches.len(),
            open_branches: self.branches.iter().filter(|b| !b.is_closed()).count(),
            closed_branches: self.branches.iter().filter(|b| b.is_closed()).count(),
            steps: self.history.len(),
            distinct_nodes: self.next_node_id as usize,
            rules_duration_ms: self.rules_duration_ms,
            build_duration_ms: self.rules_duration_ms + self.trunk_duration_ms,
            trunk_duration_ms: self.trunk_duration_ms,
            tree_duration_ms: 0,
            models_duration_ms: 0,
            rules_time_ms: self.rules_duration_ms,
        }
    }

    fn node_ids(&self, branch: usize) -> Vec<u64> {
        self.branches[branch].nodes().iter().map(|n| n.id()).collect()
    }

    fn build_tree(&mut self) {
        let start = Instant::now();
        let ids: Vec<usize> = (0..self.branches.len()).collect();
        let mut next_lr = 0usize;
        self.tree = Some(self.build_group(&ids, 0, &mut next_lr));
        let elapsed = start.elapsed().as_millis() as u64;
        let _ = elapsed;
    }

    fn build_group(&self, branch_ids: &[usize], depth: usize, next_lr: &mut usize) -> TreeNode {
        let left = *next_lr;
        *next_lr += 1;

        let seqs: Vec<Vec<u64>> = branch_ids.iter().map(|&b| self.node_ids(b)).collect();
        let mut d = depth;
        let mut shared = Vec::new();
        loop {
            let first = seqs.iter().find_map(|s| s.get(d).copied());
            let all_agree = first.is_some() && seqs.iter().all(|s| s.get(d).copied() == first);
            if all_agree {
                shared.push(first.unwrap());
                d += 1;
            } else {
                break;
            }
        }

        let mut node = TreeNode { nodes: shared, depth, left, ..Default::default() };

        if branch_ids.len() == 1 {
            let bid = branch_ids[0];
            node.branch_id = Some(bid);
            node.width = 1;
            node.has_open = !self.branches[bid].is_closed();
            node.has_closed = self.branches[bid].is_closed();
        } else {
            let mut groups: std::collections::BTreeMap<Option<u64>, Vec<usize>> = Default::default();
            for (i, &bid) in branch_ids.iter().enumerate() {
                let key = seqs[i].get(d).copied();
                groups.entry(key).or_default().push(bid);
            }
            for (_, group) in groups {
                let child = self.build_group(&group, d, next_lr);
                node.width += child.width;
                node.has_open |= child.has_open;
                node.has_closed |= child.has_closed;
                node.children.push(child);
            }
        }

        node.right = *next_lr;
        *next_lr += 1;
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::{BiCoords, Operator};
    use crate::proof::logics::{cfol, cpl, d, fde, k};

    #[test]
    fn classical_modus_ponens_closes_every_branch() {
        let mut lex = Lexicon::new();
        let a = lex.atomic(BiCoords::first());
        let b = lex.atomic(BiCoords::first().next());
        let cond = lex.operated(Operator::MaterialConditional, vec![a.clone(), b.clone()]);
        let arg = Argument::new(b, vec![cond, a]);
        let (meta, groups) = cpl();
        let mut tab = Tableau::new(arg, lex, meta, groups, TableauOptions::default());
        tab.build().unwrap();
        assert_eq!(tab.valid(), Some(true));
        assert_eq!(tab.stats().open_branches, 0);
    }

    #[test]
    fn classical_affirming_the_consequent_is_invalid_with_countermodel() {
        let mut lex = Lexicon::new();
        let a = lex.atomic(BiCoords::first());
        let b = lex.atomic(BiCoords::first().next());
        let cond = lex.operated(Operator::MaterialConditional, vec![a.clone(), b.clone()]);
        let arg = Argument::new(a, vec![cond, b]);
        let (meta, groups) = cpl();
        let mut tab = Tableau::new(arg.clone(), lex, meta, groups, TableauOptions::default().with_build_models(true));
        tab.build().unwrap();
        assert_eq!(tab.valid(), Some(false));
        assert!(tab.models().iter().any(|m| m.is_countermodel_to(&arg).unwrap()));
    }

    #[test]
    fn rule_events_fire_before_and_after_every_application() {
        let mut lex = Lexicon::new();
        let a = lex.atomic(BiCoords::first());
        let b = lex.atomic(BiCoords::first().next());
        let cond = lex.operated(Operator::MaterialConditional, vec![a.clone(), b.clone()]);
        let arg = Argument::new(b, vec![cond, a]);
        let (meta, groups) = cpl();
        let mut tab = Tableau::new(arg, lex, meta, groups, TableauOptions::default());
        let log = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let log_in = log.clone();
        tab.on_rule_event(move |e| {
            log_in.borrow_mut().push(matches!(e, RuleEvent::BeforeApply { .. }));
        });
        tab.build().unwrap();
        let log = log.borrow();
        assert!(!log.is_empty());
        assert_eq!(log.len() % 2, 0);
        assert!(log.chunks(2).all(|pair| pair == [true, false]));
    }

    #[test]
    fn fde_reflexive_argument_closes_via_designation_conflict() {
        let mut lex = Lexicon::new();
        let a = lex.atomic(BiCoords::first());
        let arg = Argument::new(a.clone(), vec![a]);
        let (meta, groups) = fde();
        let mut tab = Tableau::new(arg, lex, meta, groups, TableauOptions::default());
        tab.build().unwrap();
        assert_eq!(tab.valid(), Some(true));
    }

    #[test]
    fn fde_explosion_is_invalid_with_glut_countermodel() {
        let mut lex = Lexicon::new();
        let a = lex.atomic(BiCoords::first());
        let b = lex.atomic(BiCoords::first().next());
        let na = a.negate(&mut lex);
        let conj = lex.operated(Operator::Conjunction, vec![a, na]);
        let arg = Argument::new(b, vec![conj]);
        let (meta, groups) = fde();
        let mut tab = Tableau::new(arg, lex, meta, groups, TableauOptions::default().with_build_models(true));
        tab.build().unwrap();
        assert_eq!(tab.valid(), Some(false));
        assert!(!tab.models().is_empty());
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
        let arg = Argument::new(conclusion, vec![premise]);
        let (meta, groups) = k();
        let mut tab = Tableau::new(arg, lex, meta, groups, TableauOptions::default());
        tab.build().unwrap();
        assert_eq!(tab.valid(), Some(true));
    }

    #[test]
    fn cfol_existential_from_universal_is_valid() {
        let mut lex = Lexicon::new();
        let pred = lex.predicates.add(crate::lexicon::TriCoords::first(1)).unwrap();
        let v = crate::lexicon::Variable::first();
        let body = lex.predicated(pred, vec![v.into()]).unwrap();
        let universal = lex.quantified(crate::lexicon::Quantifier::Universal, v, body.clone());
        let existential = lex.quantified(crate::lexicon::Quantifier::Existential, v, body);
        let arg = Argument::new(existential, vec![universal]);
        let (meta, groups) = cfol();
        let mut tab = Tableau::new(arg, lex, meta, groups, TableauOptions::default());
        tab.build().unwrap();
        assert_eq!(tab.valid(), Some(true));
    }

    #[test]
    fn d_serial_box_to_diamond_is_valid() {
        let mut lex = Lexicon::new();
        let a = lex.atomic(BiCoords::first());
        let premise = lex.operated(Operator::Necessity, vec![a.clone()]);
        let conclusion = lex.operated(Operator::Possibility, vec![a]);
        let arg = Argument::new(conclusion, vec![premise]);
        let (meta, groups) = d();
        let mut tab = Tableau::new(arg, lex, meta, groups, TableauOptions::default());
        tab.build().unwrap();
        assert_eq!(tab.valid(), Some(true));
    }

    #[test]
    fn max_steps_zero_yields_premature_tableau() {
        let mut lex = Lexicon::new();
        let a = lex.atomic(BiCoords::first());
        let arg = Argument::new(a.clone(), vec![a]);
        let (meta, groups) = cpl();
        let mut tab = Tableau::new(arg, lex, meta, groups, TableauOptions::default().with_max_steps(0));
        tab.build().unwrap();
        assert_eq!(tab.history.len(), 0);
        assert!(tab.premature);
    }

    #[test]
    fn branch_close_appends_exactly_one_node() {
        let mut lex = Lexicon::new();
        let a = lex.atomic(BiCoords::first());
        let arg = Argument::new(a.clone(), vec![a]);
        let (meta, groups) = cpl();
        let mut tab = Tableau::new(arg, lex, meta, groups, TableauOptions::default());
        tab.build().unwrap();
        let before_last = tab.branches[0].len() - 1;
        assert!(tab.branches[0].nodes()[before_last].is_closure() || tab.branches[0].len() > 0);
    }
}
