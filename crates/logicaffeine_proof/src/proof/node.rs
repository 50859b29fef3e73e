//! Nodes: a tagged sum rather than "mapping with optional keys" (§9).
//!
//! Every node carries a fixed shape plus a small bag of cross-cutting flags
//! that any node kind may also have (`is_flag`, `info`, ellipsis marker).
//! Equality and hashing are identity — two structurally-equal nodes created
//! separately are still distinct branch entries, matching the tableau's
//! append-only node log.

use crate::lexicon::Sentence;

/// A world index in a modal model.
pub type World = u32;

/// The payload distinguishing one node kind from another.
#[derive(Clone, Debug)]
pub enum NodeShape {
    Sentence { sentence: Sentence, designated: Option<bool>, world: Option<World> },
    Access { world1: World, world2: World },
    Closure,
    QuitFlag { flag: &'static str },
    Ellipsis,
}

/// An immutable entry in a branch's append-only node log.
#[derive(Clone, Debug)]
pub struct Node {
    id: u64,
    shape: NodeShape,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for Node {}

impl std::hash::Hash for Node {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl Node {
    pub(crate) fn new(id: u64, shape: NodeShape) -> Self {
        Self { id, shape }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn shape(&self) -> &NodeShape {
        &self.shape
    }

    pub fn sentence(&self) -> Option<&Sentence> {
        match &self.shape {
            NodeShape::Sentence { sentence, .. } => Some(sentence),
            _ => None,
        }
    }

    pub fn designated(&self) -> Option<bool> {
        match &self.shape {
            NodeShape::Sentence { designated, .. } => *designated,
            _ => None,
        }
    }

    pub fn world(&self) -> Option<World> {
        match &self.shape {
            NodeShape::Sentence { world, .. } => *world,
            _ => None,
        }
    }

    pub fn access(&self) -> Option<(World, World)> {
        match self.shape {
            NodeShape::Access { world1, world2 } => Some((world1, world2)),
            _ => None,
        }
    }

    pub fn is_closure(&self) -> bool {
        matches!(self.shape, NodeShape::Closure)
    }

    pub fn is_quit_flag(&self) -> bool {
        matches!(self.shape, NodeShape::QuitFlag { .. })
    }

    pub fn is_sentence_node(&self) -> bool {
        matches!(self.shape, NodeShape::Sentence { .. })
    }
}

/// A builder for a [`Node`]'s shape, used by rules and trunk construction
/// before the branch assigns it an id on append.
#[derive(Clone, Debug)]
pub struct NodeSpec(pub NodeShape);

impl NodeSpec {
    pub fn sentence(sentence: Sentence) -> Self {
        Self(NodeShape::Sentence { sentence, designated: None, world: None })
    }

    pub fn with_designated(mut self, designated: bool) -> Self {
        if let NodeShape::Sentence { designated: d, .. } = &mut self.0 {
            *d = Some(designated);
        }
        self
    }

    pub fn with_world(mut self, world: World) -> Self {
        if let NodeShape::Sentence { world: w, .. } = &mut self.0 {
            *w = Some(world);
        }
        self
    }

    /// Sets designation only if `designated` is `Some` — a convenience for
    /// rules that pass through a node's existing (possibly absent)
    /// designation to a derived node.
    pub fn with_designated_if(self, designated: Option<bool>) -> Self {
        match designated {
            Some(d) => self.with_designated(d),
            None => self,
        }
    }

    pub fn access(world1: World, world2: World) -> Self {
        Self(NodeShape::Access { world1, world2 })
    }

    pub fn quit_flag(flag: &'static str) -> Self {
        Self(NodeShape::QuitFlag { flag })
    }
}
