//! # Stride Compiler
//!
//! Unified entry point for the Stride middle-end pipeline.
//!
//! This crate is a facade over the compiler crates:
//! - `stride-ast` - tree, scope stacks, diagnostics
//! - `stride-resolve` - resolution, constant folding, validation
//! - `stride-codegen` - per-domain code accumulation
//! - `stride-build` - builders, system loading, orchestration
//!
//! ## Control flow
//!
//! ```text
//! parsed tree ──→ object set merge ──→ validate ──→ errors? ──→ report
//!                                                     │
//!                                                   empty
//!                                                     ↓
//!                                      one builder per framework
//!                                 generate → build → deploy → run
//! ```
//!
//! A non-empty error list prevents builder creation entirely: no code
//! generation is ever attempted against an invalid tree.

use stride_ast::{sort_by_location, Error, Node};
use stride_build::{BuildOutcome, Orchestrator};
use stride_resolve::validate_tree;
use tracing::info;

pub use stride_ast as ast;
pub use stride_build as build;
pub use stride_codegen as codegen;
pub use stride_resolve as resolve;

/// Compile options beyond the system definition itself.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Substitute testing-tree declarations for built-ins.
    pub testing: bool,
    /// Frameworks to build; empty means every targeted framework.
    pub frameworks: Vec<String>,
    /// Also deploy each successfully built framework.
    pub deploy: bool,
}

/// Validate a user tree against a system's merged object set.
///
/// Returns the full, source-ordered diagnostic list; empty means the
/// tree is ready for code generation.
pub fn check(
    user_tree: &[Node],
    orchestrator: &Orchestrator<'_>,
    options: &CompileOptions,
) -> Vec<Error> {
    let (object_set, mut errors) = orchestrator.object_set(options.testing);
    let merged = object_set.merged_tree(user_tree);
    errors.extend(validate_tree(&merged));
    sort_by_location(&mut errors);
    errors
}

/// Validate, then drive every targeted framework through its pipeline.
///
/// If validation (or object-set loading) produced any error, the outcome
/// carries those errors and no builder is created.
pub async fn compile_and_build(
    user_tree: &[Node],
    orchestrator: &Orchestrator<'_>,
    options: &CompileOptions,
) -> BuildOutcome {
    let (object_set, mut errors) = orchestrator.object_set(options.testing);
    let merged = object_set.merged_tree(user_tree);
    errors.extend(validate_tree(&merged));
    sort_by_location(&mut errors);

    if !errors.is_empty() {
        info!(count = errors.len(), "validation failed; skipping build");
        return BuildOutcome {
            success: false,
            errors,
            frameworks: Vec::new(),
        };
    }

    orchestrator
        .build_all(&merged, &options.frameworks, options.deploy)
        .await
}

/// Render a diagnostic list for terminal output, one line per error.
pub fn format_errors(errors: &[Error]) -> String {
    errors
        .iter()
        .map(Error::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse a tree from the external parser's JSON output.
pub fn parse_tree_json(text: &str) -> serde_json::Result<Vec<Node>> {
    serde_json::from_str(text)
}
