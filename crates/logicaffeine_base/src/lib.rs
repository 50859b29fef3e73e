#![cfg_attr(docsrs, feature(doc_cfg))]

//! # logicaffeine-base
//!
//! Pure structural atoms for the logicaffeine ecosystem.
//!
//! This crate provides the foundational types used throughout logicaffeine:
//!
//! - [`Arena`] — Bump allocation for stable AST references
//! - [`Interner`]/[`Symbol`] — String interning for O(1) equality
//!
//! # Design Principles
//!
//! This crate has **no knowledge of logic vocabulary or I/O**. It provides
//! only generic, reusable infrastructure that higher-level crates build upon.
//!
//! # Example
//!
//! ```
//! use logicaffeine_base::{Arena, Interner};
//!
//! let arena: Arena<&str> = Arena::new();
//! let mut interner = Interner::new();
//!
//! let hello = interner.intern("hello");
//! let allocated = arena.alloc("hello");
//! assert_eq!(*allocated, "hello");
//! assert_eq!(interner.resolve(hello), "hello");
//! ```

pub mod arena;
pub mod intern;

pub use arena::Arena;
pub use intern::{Interner, Symbol, SymbolEq};
