//! Explicit resolution context.
//!
//! Everything a lookup needs travels in one value: the global tree, the
//! scope stack, the caller's namespace segments, and the caller's current
//! framework. The last two are plain parameters rather than ambient state
//! mutated during traversal, so a resolution can never observe context
//! some other traversal left behind.

use stride_ast::{Node, ScopeStack};

/// Borrowed context for one resolution query.
///
/// Cheap to construct per call; callers that descend into child scopes
/// build a fresh context with the extended namespace/framework values.
#[derive(Clone, Copy)]
pub struct ResolveContext<'a> {
    /// Top-level tree, the outermost fallback after all scope frames.
    pub tree: &'a [Node],
    /// Lexical frames, innermost last.
    pub scope: &'a ScopeStack,
    /// Namespace segments the caller is resolving under.
    pub namespaces: &'a [String],
    /// Framework the caller is currently generating/validating for.
    pub framework: Option<&'a str>,
}

impl<'a> ResolveContext<'a> {
    /// Context with no namespace or framework qualification.
    pub fn unqualified(tree: &'a [Node], scope: &'a ScopeStack) -> Self {
        Self {
            tree,
            scope,
            namespaces: &[],
            framework: None,
        }
    }

    /// Same context with the framework constraint removed.
    ///
    /// Used by the root-namespace fallback retry.
    pub fn without_framework(self) -> Self {
        Self {
            framework: None,
            ..self
        }
    }
}
