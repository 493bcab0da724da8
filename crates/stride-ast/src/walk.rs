//! Tree walking utilities.
//!
//! Shared pre-order traversal so validation and codegen passes don't each
//! duplicate the recursion over every node kind. The visitor is a plain
//! `FnMut(&Node)` - a trait hierarchy would be over-engineered when every
//! pass needs the same order and owns its own state.

use crate::decl::Declaration;
use crate::node::{Node, NodeKind};

/// Walk a node tree in pre-order, calling `visitor` for every node.
///
/// Recurses into declaration properties (including bundle sizes), list
/// elements, stream members, expression operands, bundle indexes, and
/// range endpoints. Literals and references are leaves.
pub fn walk_node<V>(node: &Node, visitor: &mut V)
where
    V: FnMut(&Node),
{
    visitor(node);

    match &node.kind {
        NodeKind::Declaration(d) | NodeKind::BundleDeclaration(d) => {
            walk_declaration(d, visitor);
        }
        NodeKind::Bundle(b) => walk_node(&b.index, visitor),
        NodeKind::Function(f) => {
            for value in f.properties.values() {
                walk_node(value, visitor);
            }
        }
        NodeKind::Stream(members) | NodeKind::List(members) => {
            for member in members {
                walk_node(member, visitor);
            }
        }
        NodeKind::Expression(e) => {
            for operand in &e.operands {
                walk_node(operand, visitor);
            }
        }
        NodeKind::Range(r) => {
            walk_node(&r.start, visitor);
            walk_node(&r.end, visitor);
        }
        NodeKind::Block(_)
        | NodeKind::Int(_)
        | NodeKind::Real(_)
        | NodeKind::String(_)
        | NodeKind::Switch(_)
        | NodeKind::PortProperty(_)
        | NodeKind::Platform(_)
        | NodeKind::Import(_)
        | NodeKind::System(_)
        | NodeKind::None => {}
    }
}

/// Walk every property value of a declaration, including its size node.
pub fn walk_declaration<V>(decl: &Declaration, visitor: &mut V)
where
    V: FnMut(&Node),
{
    if let Some(size) = &decl.size {
        walk_node(size, visitor);
    }
    for value in decl.properties.values() {
        walk_node(value, visitor);
    }
}

/// Walk a whole tree (a slice of top-level nodes).
pub fn walk_tree<V>(tree: &[Node], visitor: &mut V)
where
    V: FnMut(&Node),
{
    for node in tree {
        walk_node(node, visitor);
    }
}
