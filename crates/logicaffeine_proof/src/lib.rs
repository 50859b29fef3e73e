//! `logicaffeine-proof`: the core proof engine of a multi-logic analytic
//! tableau theorem prover.
//!
//! A [`lexicon::Lexicon`] interns sentences built from predicates,
//! constants, and variables; a [`proof::Tableau`] expands an
//! [`lexicon::Argument`] against one of [`proof::logics`]'s rule sets until
//! every branch closes (the argument is valid) or an open completed branch
//! yields a [`proof::Model`] countermodel.
//!
//! ```
//! use logicaffeine_proof::lexicon::{Lexicon, BiCoords, Operator, Argument};
//! use logicaffeine_proof::proof::{Tableau, TableauOptions};
//! use logicaffeine_proof::proof::logics::cpl;
//!
//! let mut lex = Lexicon::new();
//! let a = lex.atomic(BiCoords::first());
//! let b = lex.atomic(BiCoords::first().next());
//! let premise = lex.operated(Operator::MaterialConditional, vec![a.clone(), b.clone()]);
//! let argument = Argument::new(b, vec![premise, a]);
//!
//! let (meta, groups) = cpl();
//! let mut tableau = Tableau::new(argument, lex, meta, groups, TableauOptions::new());
//! tableau.build().unwrap();
//! assert_eq!(tableau.valid(), Some(true));
//! ```

pub mod error;
pub mod lexicon;
pub mod proof;

pub use error::{ProofError, ProofResult};
pub use lexicon::{Argument, Lexicon, Sentence};
pub use proof::{Branch, Model, Mval, Tableau, TableauOptions};
