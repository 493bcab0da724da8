//! Stream member checks and access-set extraction.
//!
//! Stream members connect left-to-right; adjacent members whose static
//! sizes are both known and differ are a wiring error. Sizes come from
//! bundle declarations (declared size), bundle references (index span),
//! and list literals; everything else counts as one channel. A member
//! whose size cannot be determined statically is skipped rather than
//! guessed at.
//!
//! This module also derives the read/write sets a stream induces, used
//! when the object set caches access metadata on declarations.

use crate::consteval::{declared_bundle_size, index_span};
use crate::context::ResolveContext;
use crate::resolver::find_declaration;
use stride_ast::{Error, ErrorKind, Node, NodeKind};

/// Check adjacent stream member sizes.
pub fn check_stream(members: &[Node], ctx: ResolveContext<'_>) -> Vec<Error> {
    let mut errors = Vec::new();

    for pair in members.windows(2) {
        let (left, right) = (&pair[0], &pair[1]);
        let (Some(left_size), Some(right_size)) =
            (member_size(left, ctx), member_size(right, ctx))
        else {
            continue;
        };
        if left_size != right_size {
            errors.push(
                Error::new(ErrorKind::StreamMemberSizeMismatch, right.loc.clone())
                    .with_token(member_name(left))
                    .with_token(member_name(right))
                    .with_token(left_size.to_string())
                    .with_token(right_size.to_string()),
            );
        }
    }

    errors
}

/// Static size of one stream member, if it can be determined.
pub fn member_size(node: &Node, ctx: ResolveContext<'_>) -> Option<i64> {
    match &node.kind {
        NodeKind::Block(block) => {
            let decl = find_declaration(&block.qualified_name(), ctx)?;
            if decl.size.is_some() {
                declared_bundle_size(&decl, ctx).ok()
            } else {
                Some(1)
            }
        }
        NodeKind::Bundle(bundle) => {
            // Unresolved references are reported elsewhere; no size here.
            find_declaration(&bundle.qualified_name(), ctx)?;
            index_span(&bundle.index, ctx).ok()
        }
        NodeKind::List(items) => Some(items.len() as i64),
        NodeKind::Function(_)
        | NodeKind::Expression(_)
        | NodeKind::Int(_)
        | NodeKind::Real(_)
        | NodeKind::String(_)
        | NodeKind::Switch(_)
        | NodeKind::PortProperty(_) => Some(1),
        _ => None,
    }
}

/// Display name for one stream member.
pub fn member_name(node: &Node) -> String {
    match &node.kind {
        NodeKind::Block(b) => b.qualified_name(),
        NodeKind::Bundle(b) => b.qualified_name(),
        NodeKind::Function(f) => f.qualified_name(),
        NodeKind::List(_) => "[list]".to_string(),
        NodeKind::Expression(_) => "[expression]".to_string(),
        other => format!("{other:?}"),
    }
}

/// The names a stream reads from and writes to.
///
/// The first member is read, the last is written, and every intermediate
/// member is both: it consumes its upstream value and produces for the
/// next hop.
pub fn stream_access_sets(members: &[Node]) -> (Vec<String>, Vec<String>) {
    let mut reads = Vec::new();
    let mut writes = Vec::new();
    let last = members.len().saturating_sub(1);

    for (i, member) in members.iter().enumerate() {
        let name = match &member.kind {
            NodeKind::Block(b) => b.qualified_name(),
            NodeKind::Bundle(b) => b.qualified_name(),
            _ => continue,
        };
        if i < last && !reads.contains(&name) {
            reads.push(name.clone());
        }
        if i > 0 && !writes.contains(&name) {
            writes.push(name);
        }
    }

    (reads, writes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stride_ast::{BlockRef, BundleRef, Declaration, Location, Range, ScopeStack};

    fn loc() -> Location {
        Location::new("t.stride", 1)
    }

    fn int(v: i64) -> Node {
        Node::new(NodeKind::Int(v), loc())
    }

    fn bundle_decl_node(name: &str, size: i64) -> Node {
        let mut d = Declaration::new(name, "signal");
        d.size = Some(Box::new(int(size)));
        Node::new(NodeKind::BundleDeclaration(d), loc())
    }

    fn block(name: &str) -> Node {
        Node::new(NodeKind::Block(BlockRef::new(name)), loc())
    }

    #[test]
    fn test_matching_sizes_pass() {
        let tree = vec![bundle_decl_node("A", 4), bundle_decl_node("B", 4)];
        let scope = ScopeStack::new();
        let ctx = ResolveContext::unqualified(&tree, &scope);

        let errors = check_stream(&[block("A"), block("B")], ctx);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_mismatch_carries_names_and_sizes() {
        let tree = vec![bundle_decl_node("A", 4), bundle_decl_node("B", 2)];
        let scope = ScopeStack::new();
        let ctx = ResolveContext::unqualified(&tree, &scope);

        let errors = check_stream(&[block("A"), block("B")], ctx);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::StreamMemberSizeMismatch);
        assert_eq!(
            errors[0].tokens,
            vec![
                "A".to_string(),
                "B".to_string(),
                "4".to_string(),
                "2".to_string(),
            ]
        );
    }

    #[test]
    fn test_range_slice_matches_scalar_count() {
        let tree = vec![bundle_decl_node("A", 8), bundle_decl_node("B", 3)];
        let scope = ScopeStack::new();
        let ctx = ResolveContext::unqualified(&tree, &scope);

        let slice = Node::new(
            NodeKind::Bundle(BundleRef {
                name: "A".to_string(),
                namespace: Vec::new(),
                index: Box::new(Node::new(
                    NodeKind::Range(Range {
                        start: Box::new(int(1)),
                        end: Box::new(int(3)),
                    }),
                    loc(),
                )),
            }),
            loc(),
        );

        let errors = check_stream(&[slice, block("B")], ctx);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_unresolved_member_is_skipped() {
        let scope = ScopeStack::new();
        let ctx = ResolveContext::unqualified(&[], &scope);

        // UndeclaredSymbol is someone else's report; no size mismatch here.
        let errors = check_stream(&[block("Ghost"), block("Ghost2")], ctx);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_access_sets() {
        let members = vec![block("In"), block("Gain"), block("Out")];
        let (reads, writes) = stream_access_sets(&members);

        assert_eq!(reads, vec!["In".to_string(), "Gain".to_string()]);
        assert_eq!(writes, vec!["Gain".to_string(), "Out".to_string()]);
    }
}
