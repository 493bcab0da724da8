//! Validation pipeline entry point.
//!
//! One call validates a whole tree: the walker collects every diagnostic,
//! and the final list is sorted by source location so a user sees all
//! defects from one compile in source order. An empty list means the tree
//! is ready for code generation.

use crate::validation::Validator;
use stride_ast::{sort_by_location, Error, Node};

/// Validate a parsed tree (user program plus any merged library objects).
///
/// Fail-soft, collect-all: no error aborts sibling processing, and the
/// result is ordered by (file, line).
pub fn validate_tree(tree: &[Node]) -> Vec<Error> {
    let mut errors = Validator::run(tree);
    sort_by_location(&mut errors);
    errors
}
