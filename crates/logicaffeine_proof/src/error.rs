//! Error types for the tableau proof engine.
//!
//! This module defines [`ProofError`], the single error type surfaced by the
//! public API. Internal control-flow signals used while a rule iterates its
//! candidate targets (analogous to `break`/`continue` across a search) never
//! reach this type — they are resolved before a rule's search returns.
//!
//! # Example
//!
//! ```
//! use logicaffeine_proof::ProofError;
//!
//! fn report(result: Result<(), ProofError>) {
//!     match result {
//!         Ok(()) => println!("done"),
//!         Err(ProofError::Timeout { limit_ms }) => println!("exceeded {limit_ms}ms"),
//!         Err(e) => println!("error: {}", e),
//!     }
//! }
//! ```

use std::fmt;

/// Errors that can occur while constructing or running a tableau.
#[derive(Debug, Clone)]
pub enum ProofError {
    /// The argument, logic identifier, or build option was malformed.
    InputError(String),

    /// An operation was attempted that the object's current lifecycle state
    /// forbids (mutating a started tableau, double-closing a branch, building
    /// a trunk with no logic or argument set, re-finishing a model).
    IllegalState(String),

    /// Two values conflict: an inconsistent model assignment, a redefined
    /// system predicate, or a predicate whose lookup keys collide with an
    /// existing one.
    ValueConflict(String),

    /// A predicated sentence or rule application received the wrong number
    /// of arguments for its predicate or operator.
    ArityMismatch { expected: usize, found: usize },

    /// A model was asked to evaluate a predicated sentence containing a
    /// parameter it never introduced.
    DenotationError(String),

    /// `Tableau::build` exceeded its wall-clock budget.
    Timeout { limit_ms: u64 },
}

impl fmt::Display for ProofError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProofError::InputError(msg) => write!(f, "invalid input: {msg}"),
            ProofError::IllegalState(msg) => write!(f, "illegal state: {msg}"),
            ProofError::ValueConflict(msg) => write!(f, "value conflict: {msg}"),
            ProofError::ArityMismatch { expected, found } => {
                write!(f, "arity mismatch: expected {expected} arguments, found {found}")
            }
            ProofError::DenotationError(msg) => write!(f, "denotation error: {msg}"),
            ProofError::Timeout { limit_ms } => {
                write!(f, "build timed out after {limit_ms}ms")
            }
        }
    }
}

impl std::error::Error for ProofError {}

/// Result type for tableau operations.
pub type ProofResult<T> = Result<T, ProofError>;

/// Internal control-flow signal raised while a rule enumerates candidate
/// targets over a branch's nodes. Never returned from a public function —
/// callers of [`crate::proof::rule::Rule::get_targets`] see only the
/// resulting target list.
#[derive(Debug, Clone, Copy)]
pub(crate) enum TreePruning {
    /// Stop considering the current node; move to the next one.
    SkipNode,
    /// Stop considering the current branch departure entirely.
    SkipDeparture,
}
