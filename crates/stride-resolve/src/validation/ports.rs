//! Port name and port type checking.
//!
//! A declaration's properties must each name a port of its resolved type
//! (own or inherited), and each supplied value must structurally match one
//! of the port's accepted type names. Function calls get the same port-name
//! check against their callee module.
//!
//! Valid-type entries that resolve to `constrained*` declarations widen
//! the accepted set to the corresponding literal kind and additionally
//! trigger the constraint checks in [`super::constraints`].

use super::constraints;
use crate::consteval::resolve_node_out_type;
use crate::context::ResolveContext;
use crate::resolver::{find_declaration, inherited_ports, port_name};
use stride_ast::{Declaration, Error, ErrorKind, FunctionCall, Node, NodeKind};

/// Check every property of `decl` against the resolved type's port set.
pub fn check_declaration_ports(
    decl: &Declaration,
    valid_ports: &[Declaration],
    ctx: ResolveContext<'_>,
) -> Vec<Error> {
    let mut errors = Vec::new();

    for (prop_name, value) in &decl.properties {
        if prop_name == "inherits" {
            continue;
        }

        let Some(port) = valid_ports.iter().find(|p| port_name(p) == prop_name) else {
            errors.push(
                Error::new(ErrorKind::InvalidPort, value.loc.clone())
                    .with_token(&decl.object_type)
                    .with_token(prop_name),
            );
            continue;
        };

        errors.extend(check_port_value(
            &decl.object_type,
            prop_name,
            port,
            value,
            ctx,
        ));
    }

    errors
}

/// Check a function call's supplied property names against the callee
/// module's declared port-name set.
pub fn check_function_ports(
    call: &FunctionCall,
    module: &Declaration,
    node: &Node,
    ctx: ResolveContext<'_>,
) -> Vec<Error> {
    let mut errors = Vec::new();
    let ports = inherited_ports(module, ctx);

    for prop_name in call.properties.keys() {
        if !ports.iter().any(|p| port_name(p) == prop_name) {
            errors.push(
                Error::new(ErrorKind::InvalidPort, node.loc.clone())
                    .with_token(&call.name)
                    .with_token(prop_name),
            );
        }
    }

    errors
}

/// The accepted set for one port, as computed from its `types` entries.
struct ValidSet {
    /// Entry names as written on the port (for diagnostics).
    entries: Vec<String>,
    /// Expanded structural names accepted for membership testing.
    accepted: Vec<String>,
    /// Resolved `constrained*` declarations to run value checks against.
    constrained: Vec<Declaration>,
}

fn port_valid_set(port: &Declaration, ctx: ResolveContext<'_>) -> ValidSet {
    let mut set = ValidSet {
        entries: Vec::new(),
        accepted: Vec::new(),
        constrained: Vec::new(),
    };

    let entry_names: Vec<String> = match port.property("types").map(|n| &n.kind) {
        Some(NodeKind::List(items)) => items
            .iter()
            .filter_map(|item| match &item.kind {
                NodeKind::String(s) => Some(s.clone()),
                NodeKind::Block(b) => Some(b.qualified_name()),
                _ => None,
            })
            .collect(),
        Some(NodeKind::String(s)) => vec![s.clone()],
        Some(NodeKind::Block(b)) => vec![b.qualified_name()],
        _ => Vec::new(),
    };

    for entry in entry_names {
        set.accepted.push(entry.clone());

        if let Some(target) = find_declaration(&entry, ctx) {
            match target.object_type.as_str() {
                "constrainedInt" => {
                    set.accepted.push("_IntLiteral".to_string());
                    set.constrained.push(target);
                }
                "constrainedReal" => {
                    set.accepted.push("_IntLiteral".to_string());
                    set.accepted.push("_RealLiteral".to_string());
                    set.constrained.push(target);
                }
                "constrainedString" => {
                    set.accepted.push("_StringLiteral".to_string());
                    set.constrained.push(target);
                }
                "constrainedList" => {
                    set.constrained.push(target);
                }
                _ => {}
            }
        }
        set.entries.push(entry);
    }

    set
}

/// Check one supplied port value against the port's accepted set.
fn check_port_value(
    declared_type: &str,
    prop_name: &str,
    port: &Declaration,
    value: &Node,
    ctx: ResolveContext<'_>,
) -> Vec<Error> {
    let set = port_valid_set(port, ctx);
    // A port with no declared types accepts anything.
    if set.entries.is_empty() {
        return Vec::new();
    }

    let mut errors = Vec::new();
    let has_list_constraint = set
        .constrained
        .iter()
        .any(|c| c.object_type == "constrainedList");

    match &value.kind {
        NodeKind::List(items) => {
            let promoted = resolve_node_out_type(value, ctx);
            if promoted == crate::consteval::StructuralType::Invalid {
                errors.push(
                    Error::new(ErrorKind::InconsistentList, value.loc.clone())
                        .with_token(prop_name),
                );
            } else if !has_list_constraint {
                // Every element's type must belong to the valid set.
                for item in items {
                    let item_type = resolve_node_out_type(item, ctx);
                    if !accepts(&set, &item_type.name()) {
                        errors.push(invalid_port_type(
                            declared_type,
                            prop_name,
                            &item_type.name(),
                            &set,
                            item,
                        ));
                    }
                }
            }
        }
        _ => {
            let value_type = resolve_node_out_type(value, ctx);
            let name = value_type.name();
            // Unresolved references come back Invalid and are reported as
            // UndeclaredSymbol by the reference walk, not here.
            if value_type != crate::consteval::StructuralType::Invalid && !accepts(&set, &name) {
                errors.push(invalid_port_type(
                    declared_type,
                    prop_name,
                    &name,
                    &set,
                    value,
                ));
            }
        }
    }

    for constrained in &set.constrained {
        errors.extend(constraints::check_value(
            declared_type,
            prop_name,
            constrained,
            value,
        ));
    }

    errors
}

fn accepts(set: &ValidSet, type_name: &str) -> bool {
    set.accepted.iter().any(|a| a == type_name)
}

fn invalid_port_type(
    declared_type: &str,
    prop_name: &str,
    offending: &str,
    set: &ValidSet,
    value: &Node,
) -> Error {
    Error::new(ErrorKind::InvalidPortType, value.loc.clone())
        .with_token(declared_type)
        .with_token(prop_name)
        .with_token(offending)
        .with_token(set.entries.join(", "))
}
