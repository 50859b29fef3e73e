//! Helper protocol: indexed caches a rule attaches to itself and keeps in
//! sync via the tableau's event bus, grounded in `pytableaux`'s
//! `proof/helpers.py`.
//!
//! Rust has no metaclass-driven "helper classes declared on the rule"; each
//! concrete rule in [`crate::proof::patterns`] simply holds the helpers it
//! needs as struct fields and updates them from the events it is handed.

use std::collections::{HashMap, HashSet};

use crate::lexicon::{Constant, Sentence};
use crate::proof::node::{Node, World};

/// One `V` per branch, duplicated on fork. Helpers that need deep copies
/// (mutable sets/maps) implement that in their own `fork` rather than relying
/// on `Clone`, matching §5's "helpers declare which" copy discipline.
#[derive(Default)]
pub struct BranchCache<V: Clone + Default> {
    by_branch: HashMap<usize, V>,
}

impl<V: Clone + Default> BranchCache<V> {
    pub fn new() -> Self {
        Self { by_branch: HashMap::new() }
    }

    pub fn get(&self, branch: usize) -> V {
        self.by_branch.get(&branch).cloned().unwrap_or_default()
    }

    pub fn get_mut(&mut self, branch: usize) -> &mut V {
        self.by_branch.entry(branch).or_default()
    }

    pub fn set(&mut self, branch: usize, value: V) {
        self.by_branch.insert(branch, value);
    }

    pub fn fork(&mut self, parent: usize, child: usize) {
        let v = self.get(parent);
        self.by_branch.insert(child, v);
    }
}

/// True iff a quit-flag node is present on the branch.
#[derive(Default)]
pub struct QuitFlag {
    flagged: HashSet<usize>,
}

impl QuitFlag {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set(&mut self, branch: usize) {
        self.flagged.insert(branch);
    }
    pub fn is_set(&self, branch: usize) -> bool {
        self.flagged.contains(&branch)
    }
    pub fn fork(&mut self, parent: usize, child: usize) {
        if self.flagged.contains(&parent) {
            self.flagged.insert(child);
        }
    }
}

/// Per-branch histogram of `(sentence, designation)` applications, used by
/// fat quantifier rules and scoring heuristics that prefer less-applied
/// sentences.
#[derive(Default)]
pub struct AplSentCount {
    counts: HashMap<(usize, Sentence, Option<bool>), usize>,
}

impl AplSentCount {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn increment(&mut self, branch: usize, sentence: Sentence, designated: Option<bool>) {
        *self.counts.entry((branch, sentence, designated)).or_insert(0) += 1;
    }
    pub fn count(&self, branch: usize, sentence: &Sentence, designated: Option<bool>) -> usize {
        self.counts.get(&(branch, sentence.clone(), designated)).copied().unwrap_or(0)
    }
}

/// Counts applications, and separately the `(node, world)` pairs seen, used
/// by modal rules to avoid reprocessing the same node/world combination.
#[derive(Default)]
pub struct NodesWorlds {
    applied: HashMap<usize, HashSet<(u64, World)>>,
}

impl NodesWorlds {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn mark(&mut self, branch: usize, node: u64, world: World) {
        self.applied.entry(branch).or_default().insert((node, world));
    }
    pub fn has(&self, branch: usize, node: u64, world: World) -> bool {
        self.applied.get(&branch).map(|s| s.contains(&(node, world))).unwrap_or(false)
    }
    pub fn count_for_node(&self, branch: usize, node: u64) -> usize {
        self.applied.get(&branch).map(|s| s.iter().filter(|(n, _)| *n == node).count()).unwrap_or(0)
    }
    pub fn fork(&mut self, parent: usize, child: usize) {
        if let Some(s) = self.applied.get(&parent).cloned() {
            self.applied.insert(child, s);
        }
    }
}

/// Per-branch, `world -> visible worlds` plus the inverse lookup of which
/// access node carries a given `(w1, w2)` edge.
#[derive(Default)]
pub struct WorldIndex {
    visible: HashMap<usize, HashMap<World, HashSet<World>>>,
    access_node: HashMap<usize, HashMap<(World, World), u64>>,
}

impl WorldIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_access(&mut self, branch: usize, node: &Node) {
        if let Some((w1, w2)) = node.access() {
            self.visible.entry(branch).or_default().entry(w1).or_default().insert(w2);
            self.access_node.entry(branch).or_default().insert((w1, w2), node.id());
        }
    }

    pub fn visible_worlds(&self, branch: usize, world: World) -> Vec<World> {
        self.visible
            .get(&branch)
            .and_then(|m| m.get(&world))
            .map(|s| {
                let mut v: Vec<World> = s.iter().copied().collect();
                v.sort_unstable();
                v
            })
            .unwrap_or_default()
    }

    pub fn has_access(&self, branch: usize, w1: World, w2: World) -> bool {
        self.visible.get(&branch).and_then(|m| m.get(&w1)).map(|s| s.contains(&w2)).unwrap_or(false)
    }

    pub fn fork(&mut self, parent: usize, child: usize) {
        if let Some(v) = self.visible.get(&parent).cloned() {
            self.visible.insert(child, v);
        }
        if let Some(a) = self.access_node.get(&parent).cloned() {
            self.access_node.insert(child, a);
        }
    }
}

/// Upper bound on constants-per-branch, projected from the trunk, guarding
/// narrow quantifier rules against non-terminating countermodels.
pub struct MaxConsts {
    bound: HashMap<usize, usize>,
    quit: QuitFlag,
}

impl Default for MaxConsts {
    fn default() -> Self {
        Self { bound: HashMap::new(), quit: QuitFlag::new() }
    }
}

impl MaxConsts {
    pub fn new() -> Self {
        Self::default()
    }

    /// `max(1, constants_on_branch) * max(1, sum of quantifier-depth over
    /// nodes) + 1`, computed once after the trunk is built.
    pub fn project(&mut self, branch: usize, nodes: &[Node]) {
        let constants: HashSet<Constant> = nodes
            .iter()
            .filter_map(|n| n.sentence())
            .flat_map(|s| s.constants().iter().copied())
            .collect();
        let quantifier_depth: usize =
            nodes.iter().filter_map(|n| n.sentence()).map(|s| s.quantifiers().len()).sum();
        let bound = constants.len().max(1) * quantifier_depth.max(1) + 1;
        self.bound.insert(branch, bound);
    }

    pub fn max_constants_reached(&self, branch: usize, current: usize) -> bool {
        self.bound.get(&branch).map(|b| current >= *b).unwrap_or(false)
    }

    pub fn quit_flag(&mut self, branch: usize) -> bool {
        let already = self.quit.is_set(branch);
        if !already {
            self.quit.set(branch);
        }
        !already
    }

    pub fn fork(&mut self, parent: usize, child: usize) {
        if let Some(b) = self.bound.get(&parent).copied() {
            self.bound.insert(child, b);
        }
        self.quit.fork(parent, child);
    }
}

/// Upper bound on worlds-per-branch: `worlds_on_branch + modal-operator-count
/// + 1`, analogous to [`MaxConsts`].
pub struct MaxWorlds {
    bound: HashMap<usize, usize>,
    quit: QuitFlag,
}

impl Default for MaxWorlds {
    fn default() -> Self {
        Self { bound: HashMap::new(), quit: QuitFlag::new() }
    }
}

impl MaxWorlds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn project(&mut self, branch: usize, nodes: &[Node]) {
        let worlds: HashSet<World> = nodes.iter().filter_map(|n| n.world()).collect();
        let modal_ops: usize = nodes
            .iter()
            .filter_map(|n| n.sentence())
            .map(|s| s.operators().iter().filter(|op| op.is_modal()).count())
            .sum();
        let bound = worlds.len() + modal_ops + 1;
        self.bound.insert(branch, bound);
    }

    pub fn max_worlds_reached(&self, branch: usize, current: usize) -> bool {
        self.bound.get(&branch).map(|b| current >= *b).unwrap_or(false)
    }

    pub fn quit_flag(&mut self, branch: usize) -> bool {
        let already = self.quit.is_set(branch);
        if !already {
            self.quit.set(branch);
        }
        !already
    }

    pub fn fork(&mut self, parent: usize, child: usize) {
        if let Some(b) = self.bound.get(&parent).copied() {
            self.bound.insert(child, b);
        }
        self.quit.fork(parent, child);
    }
}

/// Per-branch, per-node: the set of constants on the branch not yet
/// instantiated against that node, maintained incrementally as nodes and
/// constants arrive — backs the *fat* quantifier rule pattern.
#[derive(Default)]
pub struct NodeConsts {
    unapplied: HashMap<usize, HashMap<u64, HashSet<Constant>>>,
}

impl NodeConsts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_node(&mut self, branch: usize, node: u64, branch_constants: &HashSet<Constant>) {
        self.unapplied.entry(branch).or_default().insert(node, branch_constants.clone());
    }

    pub fn register_constant(&mut self, branch: usize, constant: Constant) {
        if let Some(per_node) = self.unapplied.get_mut(&branch) {
            for set in per_node.values_mut() {
                set.insert(constant);
            }
        }
    }

    pub fn consume(&mut self, branch: usize, node: u64, constant: Constant) {
        if let Some(per_node) = self.unapplied.get_mut(&branch) {
            if let Some(set) = per_node.get_mut(&node) {
                set.remove(&constant);
            }
        }
    }

    /// The node with the fewest applied-to constants that still has at least
    /// one unapplied constant, plus that constant.
    pub fn least_applied(&self, branch: usize) -> Option<(u64, Constant)> {
        let per_node = self.unapplied.get(&branch)?;
        per_node
            .iter()
            .filter(|(_, set)| !set.is_empty())
            .min_by_key(|(_, set)| usize::MAX - set.len())
            .and_then(|(node, set)| {
                let mut sorted: Vec<Constant> = set.iter().copied().collect();
                sorted.sort();
                sorted.first().map(|c| (*node, *c))
            })
    }

    pub fn fork(&mut self, parent: usize, child: usize) {
        if let Some(m) = self.unapplied.get(&parent).cloned() {
            self.unapplied.insert(child, m);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_consts_reached_after_bound() {
        let mut mc = MaxConsts::new();
        mc.project(0, &[]);
        assert!(mc.max_constants_reached(0, 1));
    }

    #[test]
    fn quit_flag_fires_once() {
        let mut mc = MaxConsts::new();
        assert!(mc.quit_flag(0));
        assert!(!mc.quit_flag(0));
    }

    #[test]
    fn node_consts_tracks_least_applied() {
        let mut nc = NodeConsts::new();
        let mut set = HashSet::new();
        set.insert(Constant::first());
        nc.register_node(0, 1, &set);
        assert_eq!(nc.least_applied(0), Some((1, Constant::first())));
        nc.consume(0, 1, Constant::first());
        assert_eq!(nc.least_applied(0), None);
    }
}
