//! Reference domain-code synthesis.
//!
//! Walks a validated tree and accumulates one [`DomainCode`] fragment per
//! contribution into a [`DomainCodeMap`]. This is the synthesis the
//! process-backed reference builder uses; framework-specific builders
//! replace it wholesale but keep the same accumulation model.
//!
//! Routing: a declaration lands in the domain named by its `domain`
//! property, falling back to the builder's default domain. A stream lands
//! in the domain of its first resolvable member, so connected code stays
//! together.

use stride_ast::{Declaration, Node, NodeKind, ScopeStack};
use stride_codegen::{DomainCode, DomainCodeMap};
use stride_resolve::consteval::initializer;
use stride_resolve::resolver::find_declaration;
use stride_resolve::validation::constraints::node_text;
use stride_resolve::validation::streams::member_name;
use stride_resolve::ResolveContext;

/// Generate the domain-code map for a whole tree.
pub fn generate_domain_code(tree: &[Node], default_domain: &str) -> DomainCodeMap {
    let scope = ScopeStack::new();
    let mut map = DomainCodeMap::new();

    for node in tree {
        match &node.kind {
            NodeKind::Declaration(decl) | NodeKind::BundleDeclaration(decl) => {
                let domain = declaration_domain(decl, default_domain);
                map.append(&domain, declaration_fragment(decl));
            }
            NodeKind::Stream(members) => {
                let ctx = ResolveContext::unqualified(tree, &scope);
                let domain = stream_domain(members, ctx, default_domain);
                map.append(&domain, stream_fragment(members, ctx));
            }
            _ => {}
        }
    }

    map
}

/// The domain a declaration's code belongs to.
fn declaration_domain(decl: &Declaration, default_domain: &str) -> String {
    decl.string_property("domain")
        .map(str::to_string)
        .unwrap_or_else(|| default_domain.to_string())
}

/// A stream runs in the domain of its first member that resolves to a
/// domain-carrying declaration.
fn stream_domain(members: &[Node], ctx: ResolveContext<'_>, default_domain: &str) -> String {
    for member in members {
        let name = match &member.kind {
            NodeKind::Block(b) => b.qualified_name(),
            NodeKind::Bundle(b) => b.qualified_name(),
            NodeKind::Function(f) => f.qualified_name(),
            _ => continue,
        };
        if let Some(decl) = find_declaration(&name, ctx) {
            if let Some(domain) = decl.string_property("domain") {
                return domain.to_string();
            }
        }
    }
    default_domain.to_string()
}

fn declaration_fragment(decl: &Declaration) -> DomainCode {
    let mut code = DomainCode::new();
    code.header_code = format!("// {} {}\n", decl.object_type, decl.name);
    if let Some(value) = initializer(decl) {
        code.init_code = format!("{} = {};\n", decl.name, node_text(value));
    }
    code.add_global_reference(decl.clone());
    code
}

fn stream_fragment(members: &[Node], ctx: ResolveContext<'_>) -> DomainCode {
    let mut code = DomainCode::new();

    let names: Vec<String> = members.iter().map(member_name).collect();
    code.processing_code = format!("{};\n", names.join(" >> "));

    // Every resolvable member becomes a global reference, so the emitting
    // builder declares it exactly once no matter how many streams touch it.
    for member in members {
        let name = match &member.kind {
            NodeKind::Block(b) => b.qualified_name(),
            NodeKind::Bundle(b) => b.qualified_name(),
            NodeKind::Function(f) => f.qualified_name(),
            _ => continue,
        };
        if let Some(decl) = find_declaration(&name, ctx) {
            code.add_global_reference(decl);
        }
    }

    code
}

#[cfg(test)]
mod tests {
    use super::*;
    use stride_ast::{BlockRef, Location};

    fn loc() -> Location {
        Location::new("t.stride", 1)
    }

    fn signal(name: &str, domain: Option<&str>) -> Node {
        let mut d = Declaration::new(name, "signal");
        if let Some(domain) = domain {
            d.set_property(
                "domain",
                Node::new(NodeKind::String(domain.to_string()), loc()),
            );
        }
        Node::new(NodeKind::Declaration(d), loc())
    }

    fn stream(names: &[&str]) -> Node {
        Node::new(
            NodeKind::Stream(
                names
                    .iter()
                    .map(|n| Node::new(NodeKind::Block(BlockRef::new(*n)), loc()))
                    .collect(),
            ),
            loc(),
        )
    }

    #[test]
    fn test_declarations_route_by_domain_property() {
        let tree = vec![
            signal("A", Some("audio")),
            signal("B", None),
        ];

        let map = generate_domain_code(&tree, "main");
        assert!(map.get("audio").unwrap().header_code.contains("signal A"));
        assert!(map.get("main").unwrap().header_code.contains("signal B"));
    }

    #[test]
    fn test_stream_follows_first_member_domain() {
        let tree = vec![
            signal("In", Some("audio")),
            signal("Out", Some("audio")),
            stream(&["In", "Out"]),
        ];

        let map = generate_domain_code(&tree, "main");
        let audio = map.get("audio").unwrap();
        assert_eq!(audio.processing_code, "In >> Out;\n");
        assert!(map.get("main").is_none());
    }

    #[test]
    fn test_stream_members_become_global_references() {
        let tree = vec![
            signal("In", None),
            signal("Out", None),
            stream(&["In", "Out"]),
            stream(&["Out", "In"]),
        ];

        let map = generate_domain_code(&tree, "main");
        let main = map.get("main").unwrap();
        // Referenced from two streams, declared once.
        assert_eq!(main.global_references.len(), 2);
        assert_eq!(main.processing_code, "In >> Out;\nOut >> In;\n");
    }
}
