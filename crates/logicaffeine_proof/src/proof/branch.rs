//! Branches: an ordered node log plus the multi-key index that makes rule
//! search tractable (§4.2).

use std::collections::HashMap;

use crate::error::ProofError;
use crate::lexicon::{Constant, Sentence};
use crate::proof::node::{Node, NodeShape, NodeSpec, World};

/// One of the keys the branch index maintains. Rules query by these, not by
/// scanning the node log directly.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum IndexKey {
    Sentence,
    Designated(bool),
    World(World),
    World1(World),
    World2(World),
    Access(World, World),
}

/// A query over the index: every listed key must match the same node.
#[derive(Clone, Default)]
pub struct Query {
    pub sentence: Option<Sentence>,
    pub designated: Option<bool>,
    pub world: Option<World>,
    pub world1: Option<World>,
    pub world2: Option<World>,
    pub ticked: Option<bool>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn sentence(mut self, s: Sentence) -> Self {
        self.sentence = Some(s);
        self
    }
    pub fn designated(mut self, d: bool) -> Self {
        self.designated = Some(d);
        self
    }
    pub fn world(mut self, w: World) -> Self {
        self.world = Some(w);
        self
    }
    pub fn world1(mut self, w: World) -> Self {
        self.world1 = Some(w);
        self
    }
    pub fn world2(mut self, w: World) -> Self {
        self.world2 = Some(w);
        self
    }
    pub fn ticked(mut self, t: bool) -> Self {
        self.ticked = Some(t);
        self
    }
}

/// An ordered sequence of nodes plus the index over them. Owned by a
/// [`crate::proof::tableau::Tableau`], which assigns branch ids and emits
/// events around mutation — the branch itself only maintains its own state.
pub struct Branch {
    nodes: Vec<Node>,
    ticked: std::collections::HashSet<u64>,
    closed: bool,
    next_world: World,
    parent: Option<usize>,

    by_sentence: HashMap<Sentence, Vec<usize>>,
    by_designated: HashMap<bool, Vec<usize>>,
    by_world: HashMap<World, Vec<usize>>,
    by_world1: HashMap<World, Vec<usize>>,
    by_world2: HashMap<World, Vec<usize>>,
    by_access: HashMap<(World, World), Vec<usize>>,
}

impl Branch {
    pub fn new_root() -> Self {
        Self {
            nodes: Vec::new(),
            ticked: Default::default(),
            closed: false,
            next_world: 0,
            parent: None,
            by_sentence: HashMap::new(),
            by_designated: HashMap::new(),
            by_world: HashMap::new(),
            by_world1: HashMap::new(),
            by_world2: HashMap::new(),
            by_access: HashMap::new(),
        }
    }

    /// A logically independent copy: nodes and scalar counters are cloned,
    /// the index is rebuilt, and `parent` points at the forking branch.
    /// Event listeners are never copied — they live on the tableau.
    pub fn fork(&self, parent_id: usize) -> Self {
        let mut copy = Self {
            nodes: self.nodes.clone(),
            ticked: self.ticked.clone(),
            closed: self.closed,
            next_world: self.next_world,
            parent: Some(parent_id),
            by_sentence: HashMap::new(),
            by_designated: HashMap::new(),
            by_world: HashMap::new(),
            by_world1: HashMap::new(),
            by_world2: HashMap::new(),
            by_access: HashMap::new(),
        };
        for i in 0..copy.nodes.len() {
            copy.reindex(i);
        }
        copy
    }

    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: u64) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_ticked(&self, id: u64) -> bool {
        self.ticked.contains(&id)
    }

    pub fn next_world(&self) -> World {
        self.next_world
    }

    /// The lexically-first constant not occurring as a parameter of any
    /// sentence on this branch.
    pub fn new_constant(&self) -> Constant {
        let used: std::collections::HashSet<Constant> = self
            .nodes
            .iter()
            .filter_map(|n| n.sentence())
            .flat_map(|s| s.constants().iter().copied())
            .collect();
        let mut candidate = Constant::first();
        while used.contains(&candidate) {
            candidate = candidate.next();
        }
        candidate
    }

    fn reindex(&mut self, pos: usize) {
        let node = &self.nodes[pos];
        match node.shape() {
            NodeShape::Sentence { sentence, designated, world } => {
                self.by_sentence.entry(sentence.clone()).or_default().push(pos);
                if let Some(d) = designated {
                    self.by_designated.entry(*d).or_default().push(pos);
                }
                if let Some(w) = world {
                    self.by_world.entry(*w).or_default().push(pos);
                }
            }
            NodeShape::Access { world1, world2 } => {
                self.by_world1.entry(*world1).or_default().push(pos);
                self.by_world2.entry(*world2).or_default().push(pos);
                self.by_access.entry((*world1, *world2)).or_default().push(pos);
            }
            NodeShape::Closure | NodeShape::QuitFlag { .. } | NodeShape::Ellipsis => {}
        }
    }

    /// Appends `spec` as a new node, assigning it the next id, updating the
    /// index, and bumping `next_world` as required. Returns the appended node
    /// for the caller (the tableau) to emit `AFTER_NODE_ADD`.
    pub fn append(&mut self, next_id: u64, spec: NodeSpec) -> Node {
        let node = Node::new(next_id, spec.0);
        let pos = self.nodes.len();
        if let Some(w) = node.world() {
            if w + 1 > self.next_world {
                self.next_world = w + 1;
            }
        }
        if let Some((w1, w2)) = node.access() {
            let hi = w1.max(w2);
            if hi + 1 > self.next_world {
                self.next_world = hi + 1;
            }
        }
        self.nodes.push(node.clone());
        self.reindex(pos);
        node
    }

    /// Marks `id` ticked. A no-op if already ticked.
    pub fn tick(&mut self, id: u64) {
        self.ticked.insert(id);
    }

    /// Closes the branch, appending a `ClosureNode`. Fails with
    /// `IllegalState` if already closed.
    pub fn close(&mut self, next_id: u64) -> Result<Node, ProofError> {
        if self.closed {
            return Err(ProofError::IllegalState("branch is already closed".into()));
        }
        let node = Node::new(next_id, NodeShape::Closure);
        self.nodes.push(node.clone());
        self.closed = true;
        Ok(node)
    }

    /// Picks the smallest candidate set among the query's indexed keys, then
    /// linearly filters by the remaining predicates and `ticked`.
    pub fn find(&self, query: &Query) -> Vec<&Node> {
        let mut candidate_sets: Vec<&Vec<usize>> = Vec::new();
        if let Some(s) = &query.sentence {
            if let Some(v) = self.by_sentence.get(s) {
                candidate_sets.push(v);
            } else {
                return Vec::new();
            }
        }
        if let Some(d) = query.designated {
            if let Some(v) = self.by_designated.get(&d) {
                candidate_sets.push(v);
            } else {
                return Vec::new();
            }
        }
        if let Some(w) = query.world {
            if let Some(v) = self.by_world.get(&w) {
                candidate_sets.push(v);
            } else {
                return Vec::new();
            }
        }
        if let (Some(w1), Some(w2)) = (query.world1, query.world2) {
            if let Some(v) = self.by_access.get(&(w1, w2)) {
                candidate_sets.push(v);
            } else {
                return Vec::new();
            }
        } else {
            if let Some(w1) = query.world1 {
                if let Some(v) = self.by_world1.get(&w1) {
                    candidate_sets.push(v);
                } else {
                    return Vec::new();
                }
            }
            if let Some(w2) = query.world2 {
                if let Some(v) = self.by_world2.get(&w2) {
                    candidate_sets.push(v);
                } else {
                    return Vec::new();
                }
            }
        }

        let positions: Vec<usize> = if candidate_sets.is_empty() {
            (0..self.nodes.len()).collect()
        } else {
            let smallest = candidate_sets.iter().min_by_key(|v| v.len()).unwrap();
            smallest.iter().copied().filter(|p| candidate_sets.iter().all(|s| s.contains(p))).collect()
        };

        positions
            .into_iter()
            .map(|p| &self.nodes[p])
            .filter(|n| query.ticked.map(|t| self.ticked.contains(&n.id()) == t).unwrap_or(true))
            .collect()
    }

    pub fn any(&self, queries: &[Query]) -> bool {
        queries.iter().any(|q| !self.find(q).is_empty())
    }

    pub fn all(&self, queries: &[Query]) -> bool {
        queries.iter().all(|q| !self.find(q).is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::{BiCoords, Lexicon};

    #[test]
    fn append_updates_sentence_index() {
        let mut lex = Lexicon::new();
        let a = lex.atomic(BiCoords::first());
        let mut b = Branch::new_root();
        b.append(0, NodeSpec::sentence(a.clone()));
        let found = b.find(&Query::new().sentence(a));
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn close_is_rejected_twice() {
        let mut b = Branch::new_root();
        b.close(0).unwrap();
        let err = b.close(1).unwrap_err();
        assert!(matches!(err, ProofError::IllegalState(_)));
    }

    #[test]
    fn close_appends_exactly_one_node() {
        let mut b = Branch::new_root();
        let before = b.len();
        b.close(0).unwrap();
        assert_eq!(b.len(), before + 1);
        assert!(b.is_closed());
    }

    #[test]
    fn tick_is_idempotent() {
        let mut lex = Lexicon::new();
        let a = lex.atomic(BiCoords::first());
        let mut b = Branch::new_root();
        let node = b.append(0, NodeSpec::sentence(a));
        b.tick(node.id());
        b.tick(node.id());
        assert!(b.is_ticked(node.id()));
    }

    #[test]
    fn new_constant_skips_used_constants() {
        let mut lex = Lexicon::new();
        let pred = lex.predicates.add(crate::lexicon::TriCoords::first(1)).unwrap();
        let c0 = Constant::first();
        let s = lex.predicated(pred, vec![c0.into()]).unwrap();
        let mut b = Branch::new_root();
        b.append(0, NodeSpec::sentence(s));
        assert_eq!(b.new_constant(), c0.next());
    }

    #[test]
    fn fork_is_independent() {
        let mut lex = Lexicon::new();
        let a = lex.atomic(BiCoords::first());
        let mut b = Branch::new_root();
        b.append(0, NodeSpec::sentence(a.clone()));
        let mut child = b.fork(0);
        let b2 = lex.atomic(BiCoords::first().next());
        child.append(1, NodeSpec::sentence(b2.clone()));
        assert_eq!(b.len(), 1);
        assert_eq!(child.len(), 2);
        assert!(child.find(&Query::new().sentence(a)).len() == 1);
    }
}
