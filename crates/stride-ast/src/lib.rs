//! # Stride AST
//!
//! Shared data model for the Stride compiler middle-end.
//!
//! This crate holds the pieces every other compiler crate consumes:
//!
//! - [`Node`] / [`NodeKind`] - the parsed syntax tree, one tagged union
//! - [`Declaration`] - named, typed entities (signals, modules, types, ...)
//! - [`ScopeStack`] - lexical scope frames used during resolution
//! - [`Error`] / [`ErrorKind`] - collected diagnostics with source locations
//! - [`walk`] - closure-based tree traversal
//!
//! # Architecture
//!
//! The compiler is split into crates for clear dependency edges:
//!
//! ```text
//! stride-ast              - AST + foundation types (this crate)
//!     ↓
//! stride-resolve          - Resolution, constant folding, validation
//!     ↓
//! stride-codegen          - Per-domain code accumulation
//!     ↓
//! stride-build            - Builders, system loading, orchestration
//!     ↓
//! stride-compiler (facade) - Validate-then-build entry points
//! ```
//!
//! This crate has no in-workspace dependencies and no algorithms beyond
//! simple accessors; every pass that *does* something lives downstream.

pub mod decl;
pub mod error;
pub mod foundation;
pub mod node;
pub mod scope;
pub mod walk;

pub use decl::{Declaration, DeclarationMeta};
pub use error::{sort_by_location, Error, ErrorKind};
pub use foundation::Location;
pub use node::{
    BlockRef, BundleRef, Expression, FunctionCall, ImportDecl, Node, NodeKind, PlatformRef,
    PortProperty, Range, SystemRef,
};
pub use scope::{ScopeFrame, ScopeStack};
