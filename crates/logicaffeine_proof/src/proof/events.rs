//! The tableau's event bus: named moments, ordered synchronous subscribers.
//!
//! Helpers subscribe here instead of a language-level metaclass hook; the
//! tableau owns every subscriber list, so there are no cycles between rules,
//! helpers, and the tableau they observe.

use crate::proof::node::Node;
use crate::proof::target::Target;

/// Moments the tableau or a rule announces to subscribed helpers.
#[derive(Clone, Debug)]
pub enum TabEvent {
    AfterBranchAdd { branch: usize },
    AfterBranchClose { branch: usize },
    AfterNodeAdd { branch: usize, node: Node },
    AfterNodeTick { branch: usize, node: Node },
    BeforeTrunkBuild,
    AfterTrunkBuild,
    AfterRuleApply { rule: &'static str, target: Target },
    AfterFinish,
}

/// Moments a rule announces around its own application.
#[derive(Clone, Debug)]
pub enum RuleEvent {
    BeforeApply { target: Target },
    AfterApply { target: Target },
}

/// An ordered list of synchronous subscribers for one event stream.
///
/// Subscribers are boxed closures rather than a trait object hierarchy —
/// this mirrors the teacher's preference for small closures over bespoke
/// listener traits where only one method is ever needed.
pub struct EventBus<E> {
    subscribers: Vec<Box<dyn FnMut(&E)>>,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self { subscribers: Vec::new() }
    }
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the subscription's index, usable for diagnostics; there is no
    /// unsubscribe path because helpers live exactly as long as their rule.
    pub fn subscribe(&mut self, listener: impl FnMut(&E) + 'static) -> usize {
        self.subscribers.push(Box::new(listener));
        self.subscribers.len() - 1
    }

    /// Dispatches `event` to every subscriber in subscription order. Every
    /// listener observes the same event value — there is no mutation of the
    /// event between listeners.
    pub fn emit(&mut self, event: E) {
        for sub in self.subscribers.iter_mut() {
            sub(&event);
        }
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

/// The tableau-level bus plus the rule-application bus, both owned by the
/// [`Tableau`] (see [`crate::proof::tableau::Tableau`]) so there are no
/// reference cycles.
#[derive(Default)]
pub struct TabEvents {
    pub tab: EventBus<TabEvent>,
    pub rule: EventBus<RuleEvent>,
}

impl TabEvents {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribers_fire_in_order() {
        let mut bus: EventBus<i32> = EventBus::new();
        let log = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let log1 = log.clone();
        bus.subscribe(move |e| log1.borrow_mut().push(("a", *e)));
        let log2 = log.clone();
        bus.subscribe(move |e| log2.borrow_mut().push(("b", *e)));
        bus.emit(42);
        assert_eq!(*log.borrow(), vec![("a", 42), ("b", 42)]);
    }
}
