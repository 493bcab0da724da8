//! Declaration resolution.
//!
//! Resolves names against the scope stack and the global tree, honoring
//! namespace qualification and framework origin.
//!
//! # What This Pass Does
//!
//! 1. **Name splitting** - a space-qualified name (`"Gen Osc"`) is split
//!    into leading scope segments plus a base identifier
//! 2. **Scope scan** - frames are searched innermost→outermost, then the
//!    top-level tree; inner declarations shadow outer ones
//! 3. **Namespace matching** - a candidate matches when its *effective*
//!    namespace path (stored namespace tree, normalized against the
//!    caller's framework) equals the requested path element-wise
//! 4. **Inheritance chasing** - `inherits` references are followed
//!    transitively by name, collecting ancestor types and their ports
//!
//! # Failure Mode
//!
//! Lookup failure is `None`, never an error. Callers decide whether
//! absence is fatal; the validator reports `UndeclaredSymbol` or
//! `UnknownType`, codegen may fall back.
//!
//! # Examples
//!
//! ```
//! use stride_ast::{Declaration, Location, Node, NodeKind, ScopeStack};
//! use stride_resolve::resolver::find_declaration;
//! use stride_resolve::ResolveContext;
//!
//! let tree = vec![Node::new(
//!     NodeKind::Declaration(Declaration::new("Out", "signal")),
//!     Location::new("main.stride", 1),
//! )];
//! let scope = ScopeStack::new();
//!
//! let found = find_declaration("Out", ResolveContext::unqualified(&tree, &scope));
//! assert!(found.is_some());
//! ```

use crate::context::ResolveContext;
use stride_ast::{Declaration, Node};
use tracing::debug;

/// Split a space-qualified name into (scope segments, base identifier).
///
/// `"Gen Osc"` → (`["Gen"]`, `"Osc"`); an unqualified name has no
/// leading segments.
pub fn split_qualified_name(name: &str) -> (Vec<String>, String) {
    let mut parts: Vec<String> = name.split_whitespace().map(String::from).collect();
    match parts.pop() {
        Some(base) => (parts, base),
        None => (Vec::new(), String::new()),
    }
}

/// The requested scope path for one lookup: the segments split from the
/// name, with the caller's namespace segments appended.
fn requested_path(name_scopes: Vec<String>, namespaces: &[String]) -> Vec<String> {
    let mut path = name_scopes;
    path.extend(namespaces.iter().cloned());
    // An all-empty requested path normalizes to root.
    path.retain(|segment| !segment.is_empty());
    path
}

/// Test whether a declaration is visible under a requested scope path.
///
/// The declaration's effective namespace path is its stored namespace
/// tree, adjusted for framework origin when the caller resolves *from
/// within* a framework:
///
/// - originating framework differs from the caller's current framework →
///   the framework name is prefixed;
/// - originating framework equals the current framework → a leading
///   self-reference segment is stripped.
///
/// A caller with no framework context sees stored namespace trees
/// unadjusted. The requested path must equal the effective path
/// element-wise; both sides empty means root, which matches.
pub fn namespace_match(
    requested: &[String],
    decl: &Declaration,
    current_framework: Option<&str>,
) -> bool {
    let mut effective: Vec<&str> = decl
        .meta
        .namespace_tree
        .iter()
        .map(String::as_str)
        .filter(|segment| !segment.is_empty())
        .collect();

    if let (Some(origin), Some(current)) = (decl.meta.framework.as_deref(), current_framework) {
        if origin != current {
            effective.insert(0, origin);
        } else if effective.first() == Some(&origin) {
            effective.remove(0);
        }
    }

    effective.len() == requested.len()
        && effective
            .iter()
            .zip(requested.iter())
            .all(|(have, want)| *have == want)
}

/// Find the first declaration matching `name` under the given context.
///
/// Scans scope frames innermost→outermost, then the top-level tree.
/// The first structural match wins, so inner scopes always shadow outer
/// ones and the global tree.
///
/// If nothing matches and a framework was specified, the lookup is
/// retried once with no framework constraint (root-namespace fallback).
pub fn find_declaration(name: &str, ctx: ResolveContext<'_>) -> Option<Declaration> {
    let (name_scopes, base) = split_qualified_name(name);
    if base.is_empty() {
        return None;
    }
    let requested = requested_path(name_scopes, ctx.namespaces);

    if let Some(found) = scan(&base, &requested, ctx, |_| true) {
        return Some(found);
    }

    // Root-namespace fallback: an unmatched framework-qualified lookup is
    // retried unconstrained so root-library declarations stay reachable.
    if ctx.framework.is_some() {
        debug!(name, "declaration lookup falling back to root namespace");
        return find_declaration(name, ctx.without_framework());
    }

    None
}

/// Find *every* distinct declaration matching `name`.
///
/// Same matching as [`find_declaration`] but collects all matches across
/// the scope stack and the tree, preserving scan order. Used where
/// overload resolution across frameworks needs the full candidate set.
pub fn find_all_declarations(name: &str, ctx: ResolveContext<'_>) -> Vec<Declaration> {
    let (name_scopes, base) = split_qualified_name(name);
    if base.is_empty() {
        return Vec::new();
    }
    let requested = requested_path(name_scopes, ctx.namespaces);

    let mut matches = Vec::new();
    let mut consider = |decl: &Declaration| {
        if decl.name == base
            && namespace_match(&requested, decl, ctx.framework)
            && !matches.contains(decl)
        {
            matches.push(decl.clone());
        }
    };

    for frame in ctx.scope.iter_inner_first() {
        for decl in &frame.declarations {
            consider(decl);
        }
    }
    for decl in tree_declarations(ctx.tree) {
        consider(decl);
    }

    matches
}

/// Find the declaration *defining* a type named `type_name`.
///
/// Restricted to type-defining object kinds (`"type"`, `"platformBlock"`,
/// `"platformModule"`) whose declared `typeName` equals the query.
pub fn find_type_declaration(type_name: &str, ctx: ResolveContext<'_>) -> Option<Declaration> {
    let (name_scopes, base) = split_qualified_name(type_name);
    if base.is_empty() {
        return None;
    }
    let requested = requested_path(name_scopes, ctx.namespaces);

    let matches_type = |decl: &Declaration| {
        decl.is_type_defining() && decl.defined_type_name() == Some(base.as_str())
    };

    if let Some(found) = scan_with(&requested, ctx, &matches_type) {
        return Some(found);
    }
    if ctx.framework.is_some() {
        debug!(
            type_name,
            "type declaration lookup falling back to root namespace"
        );
        return find_type_declaration(type_name, ctx.without_framework());
    }
    None
}

/// Collect the transitive ancestor type declarations of `decl`.
///
/// Follows the `inherits` property (single reference or ordered list)
/// depth-first in declaration order. Each ancestor appears once; a
/// repeated name terminates that branch, so reference cycles cannot
/// recurse forever.
pub fn inherited_types(decl: &Declaration, ctx: ResolveContext<'_>) -> Vec<Declaration> {
    let mut ancestors = Vec::new();
    let mut visited = vec![decl.name.clone()];
    collect_ancestors(decl, ctx, &mut ancestors, &mut visited);
    ancestors
}

fn collect_ancestors(
    decl: &Declaration,
    ctx: ResolveContext<'_>,
    ancestors: &mut Vec<Declaration>,
    visited: &mut Vec<String>,
) {
    for parent_ref in decl.inherits_refs() {
        let name = parent_ref.qualified_name();
        if visited.contains(&name) {
            continue;
        }
        visited.push(name.clone());

        if let Some(parent) = find_type_declaration(&name, ctx) {
            collect_ancestors(&parent, ctx, ancestors, visited);
            ancestors.push(parent);
        }
    }
}

/// Collect a type declaration's ports, own ports first, then inherited
/// ones, de-duplicated by port name.
///
/// Multiple inheritance walks the `inherits` list in declaration order;
/// on a name collision the first occurrence wins and later ports are
/// dropped (see DESIGN.md for the precedence decision).
pub fn inherited_ports(decl: &Declaration, ctx: ResolveContext<'_>) -> Vec<Declaration> {
    let mut ports: Vec<Declaration> = Vec::new();
    let mut push_unique = |port: &Declaration| {
        let name = port_name(port).to_string();
        if !ports.iter().any(|p| port_name(p) == name) {
            ports.push(port.clone());
        }
    };

    for port in decl.ports() {
        push_unique(port);
    }
    for ancestor in inherited_types(decl, ctx) {
        for port in ancestor.ports() {
            push_unique(port);
        }
    }

    ports
}

/// The user-facing name of a port declaration: its `name` property if
/// present, otherwise the declaration's own name.
pub fn port_name(port: &Declaration) -> &str {
    port.string_property("name").unwrap_or(&port.name)
}

// ---------------------------------------------------------------------------
// Scan helpers
// ---------------------------------------------------------------------------

fn scan<F>(
    base: &str,
    requested: &[String],
    ctx: ResolveContext<'_>,
    extra: F,
) -> Option<Declaration>
where
    F: Fn(&Declaration) -> bool,
{
    scan_with(requested, ctx, &|decl: &Declaration| {
        decl.name == base && extra(decl)
    })
}

fn scan_with<F>(requested: &[String], ctx: ResolveContext<'_>, accept: &F) -> Option<Declaration>
where
    F: Fn(&Declaration) -> bool,
{
    let namespace_ok = |decl: &Declaration| namespace_match(requested, decl, ctx.framework);

    for frame in ctx.scope.iter_inner_first() {
        for decl in &frame.declarations {
            if accept(decl) && namespace_ok(decl) {
                return Some(decl.clone());
            }
        }
    }
    for decl in tree_declarations(ctx.tree) {
        if accept(decl) && namespace_ok(decl) {
            return Some(decl.clone());
        }
    }
    None
}

/// Iterate the declarations at the top level of a tree.
pub fn tree_declarations(tree: &[Node]) -> impl Iterator<Item = &Declaration> {
    tree.iter().filter_map(Node::as_declaration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stride_ast::{Location, NodeKind, ScopeFrame, ScopeStack};

    fn loc() -> Location {
        Location::new("t.stride", 1)
    }

    fn decl_node(name: &str, object_type: &str) -> Node {
        Node::new(
            NodeKind::Declaration(Declaration::new(name, object_type)),
            loc(),
        )
    }

    fn type_decl(name: &str, type_name: &str) -> Declaration {
        let mut d = Declaration::new(name, "type");
        d.set_property(
            "typeName",
            Node::new(NodeKind::String(type_name.to_string()), loc()),
        );
        d
    }

    #[test]
    fn test_split_qualified_name() {
        assert_eq!(
            split_qualified_name("Gen Osc"),
            (vec!["Gen".to_string()], "Osc".to_string())
        );
        assert_eq!(split_qualified_name("Osc"), (vec![], "Osc".to_string()));
    }

    #[test]
    fn test_find_in_tree() {
        let tree = vec![decl_node("Out", "signal")];
        let scope = ScopeStack::new();

        let found = find_declaration("Out", ResolveContext::unqualified(&tree, &scope));
        assert_eq!(found.unwrap().name, "Out");

        let missing = find_declaration("In", ResolveContext::unqualified(&tree, &scope));
        assert!(missing.is_none());
    }

    #[test]
    fn test_inner_scope_shadows_outer_and_tree() {
        let tree = vec![decl_node("Out", "signal")];
        let mut scope = ScopeStack::new();
        scope.push(ScopeFrame::new(
            Some("outer".to_string()),
            vec![Declaration::new("Out", "constant")],
        ));
        scope.push(ScopeFrame::new(
            Some("inner".to_string()),
            vec![Declaration::new("Out", "switch")],
        ));

        let found = find_declaration("Out", ResolveContext::unqualified(&tree, &scope)).unwrap();
        assert_eq!(found.object_type, "switch");
    }

    #[test]
    fn test_namespace_match_empty_is_root() {
        let decl = Declaration::new("Out", "signal");
        assert!(namespace_match(&[], &decl, None));
        assert!(!namespace_match(&["Gen".to_string()], &decl, None));
    }

    #[test]
    fn test_namespace_match_framework_prefix() {
        let mut decl = Declaration::new("Sine", "module");
        decl.meta.framework = Some("Gamma".to_string());

        // From inside another framework, Gamma must be named.
        assert!(namespace_match(
            &["Gamma".to_string()],
            &decl,
            Some("Beta")
        ));
        assert!(!namespace_match(&[], &decl, Some("Beta")));

        // Same framework, or no framework context: no prefix required.
        assert!(namespace_match(&[], &decl, Some("Gamma")));
        assert!(namespace_match(&[], &decl, None));
    }

    #[test]
    fn test_namespace_match_strips_self_reference() {
        let mut decl = Declaration::new("Sine", "module");
        decl.meta.framework = Some("Gamma".to_string());
        decl.meta.namespace_tree = vec!["Gamma".to_string(), "Osc".to_string()];

        // Inside Gamma the leading self-reference disappears.
        assert!(namespace_match(&["Osc".to_string()], &decl, Some("Gamma")));
        // From another framework the origin is prefixed onto the stored
        // tree as written.
        assert!(namespace_match(
            &["Gamma".to_string(), "Gamma".to_string(), "Osc".to_string()],
            &decl,
            Some("Beta")
        ));
        // With no framework context the stored tree is matched as-is.
        assert!(namespace_match(
            &["Gamma".to_string(), "Osc".to_string()],
            &decl,
            None
        ));
    }

    #[test]
    fn test_root_namespace_fallback() {
        // A root-library declaration from another framework is invisible
        // under the caller's framework constraint, but the fallback retry
        // (no framework) still reaches it.
        let mut foreign = Declaration::new("Out", "signal");
        foreign.meta.framework = Some("Beta".to_string());
        let tree = vec![Node::new(NodeKind::Declaration(foreign), loc())];
        let scope = ScopeStack::new();
        let ctx = ResolveContext {
            tree: &tree,
            scope: &scope,
            namespaces: &[],
            framework: Some("Gamma"),
        };

        let found = find_declaration("Out", ctx);
        assert!(found.is_some());
    }

    #[test]
    fn test_space_qualified_lookup() {
        let mut d = Declaration::new("Sine", "module");
        d.meta.namespace_tree = vec!["Gen".to_string()];
        let tree = vec![Node::new(NodeKind::Declaration(d), loc())];
        let scope = ScopeStack::new();

        let found = find_declaration("Gen Sine", ResolveContext::unqualified(&tree, &scope));
        assert!(found.is_some());

        let unqualified = find_declaration("Sine", ResolveContext::unqualified(&tree, &scope));
        assert!(unqualified.is_none());
    }

    #[test]
    fn test_find_all_collects_across_scopes() {
        let tree = vec![decl_node("Osc", "module")];
        let mut scope = ScopeStack::new();
        let mut gamma_osc = Declaration::new("Osc", "module");
        gamma_osc.meta.framework = Some("Gamma".to_string());
        scope.push(ScopeFrame::new(None, vec![gamma_osc]));

        // Under framework Gamma both the framework copy (effective root)
        // and the tree copy match an empty requested path.
        let ctx = ResolveContext {
            tree: &tree,
            scope: &scope,
            namespaces: &[],
            framework: Some("Gamma"),
        };
        let all = find_all_declarations("Osc", ctx);
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_find_type_declaration() {
        let tree = vec![
            Node::new(NodeKind::Declaration(type_decl("SignalType", "signal")), loc()),
            decl_node("Out", "signal"),
        ];
        let scope = ScopeStack::new();

        let found =
            find_type_declaration("signal", ResolveContext::unqualified(&tree, &scope)).unwrap();
        assert_eq!(found.name, "SignalType");

        // Plain declarations never define types.
        assert!(
            find_type_declaration("Out", ResolveContext::unqualified(&tree, &scope)).is_none()
        );
    }

    #[test]
    fn test_inherited_ports_dedup_first_wins() {
        fn port(decl_name: &str, port_name: &str, direction: &str) -> Node {
            let mut p = Declaration::new(decl_name, "typeProperty");
            p.set_property(
                "name",
                Node::new(NodeKind::String(port_name.to_string()), loc()),
            );
            p.set_property(
                "direction",
                Node::new(NodeKind::String(direction.to_string()), loc()),
            );
            Node::new(NodeKind::Declaration(p), loc())
        }

        let mut base = type_decl("BaseType", "base");
        base.set_property(
            "ports",
            Node::new(
                NodeKind::List(vec![port("p1", "rate", "base"), port("p2", "domain", "base")]),
                loc(),
            ),
        );

        let mut child = type_decl("ChildType", "child");
        child.set_property(
            "inherits",
            Node::new(NodeKind::Block(stride_ast::BlockRef::new("base")), loc()),
        );
        child.set_property(
            "ports",
            Node::new(NodeKind::List(vec![port("p3", "rate", "child")]), loc()),
        );

        let tree = vec![
            Node::new(NodeKind::Declaration(base), loc()),
            Node::new(NodeKind::Declaration(child.clone()), loc()),
        ];
        let scope = ScopeStack::new();
        let ctx = ResolveContext::unqualified(&tree, &scope);

        let ports = inherited_ports(&child, ctx);
        let names: Vec<_> = ports.iter().map(|p| port_name(p).to_string()).collect();
        assert_eq!(names, vec!["rate", "domain"]);

        // The child's own `rate` shadows the inherited one.
        let rate = ports.iter().find(|p| port_name(p) == "rate").unwrap();
        assert_eq!(rate.string_property("direction"), Some("child"));
    }

    #[test]
    fn test_inheritance_cycle_terminates() {
        let mut a = type_decl("A", "a");
        a.set_property(
            "inherits",
            Node::new(NodeKind::Block(stride_ast::BlockRef::new("b")), loc()),
        );
        let mut b = type_decl("B", "b");
        b.set_property(
            "inherits",
            Node::new(NodeKind::Block(stride_ast::BlockRef::new("a")), loc()),
        );

        let tree = vec![
            Node::new(NodeKind::Declaration(a.clone()), loc()),
            Node::new(NodeKind::Declaration(b), loc()),
        ];
        let scope = ScopeStack::new();
        let ctx = ResolveContext::unqualified(&tree, &scope);

        let ancestors = inherited_types(&a, ctx);
        // Terminates, and collects each ancestor once.
        assert_eq!(ancestors.len(), 2);
    }
}
