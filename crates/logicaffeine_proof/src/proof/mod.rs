//! The tableau engine: branches of nodes expanded by rules until every
//! branch closes (the argument is valid) or the rules run out (a
//! countermodel can be read off an open branch).

pub mod branch;
pub mod events;
pub mod helpers;
pub mod logics;
pub mod model;
pub mod node;
pub mod patterns;
pub mod rule;
pub mod target;
pub mod tableau;

pub use branch::{Branch, Query};
pub use events::{EventBus, RuleEvent, TabEvent, TabEvents};
pub use logics::Meta;
pub use model::{AccessGraph, DesignatedSet, Frame, Model, Mval, PredicateInterpretation};
pub use node::{Node, NodeShape, NodeSpec, World};
pub use rule::{Legend, Rule, RuleGroup, RuleGroups};
pub use tableau::{Stats, Tableau, TableauOptions, TreeNode};
pub use target::Target;
