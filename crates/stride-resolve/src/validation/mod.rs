//! Type and constraint validation.
//!
//! A pure recursive walk over the tree that accumulates an error list and
//! never aborts early: every defect in one compile surfaces at once.
//!
//! # What This Pass Does
//!
//! 1. **Type resolution** - every declaration's object type must resolve
//!    to a known type declaration (`UnknownType` otherwise)
//! 2. **Port checking** - every property must name a declared or inherited
//!    port (`InvalidPort`) and carry a structurally valid value
//!    (`InvalidPortType`), see [`ports`]
//! 3. **Constraint checking** - constrained types bound their literal
//!    values (`ConstraintFail`), see [`constraints`]
//! 4. **Reference checking** - block/bundle references and function
//!    callees must resolve (`UndeclaredSymbol`)
//! 5. **Bundle sizing** - declared sizes must match initializer element
//!    counts (`BundleSizeMismatch`), see [`bundles`]
//! 6. **Duplicate detection** - declaration names are unique within one
//!    scope frame (`DuplicateSymbol`)
//! 7. **Stream sizing** - adjacent stream members agree on static size
//!    (`StreamMemberSizeMismatch`), see [`streams`]
//!
//! # Scoping
//!
//! Visiting a declaration pushes a scope frame holding its sub-blocks and
//! declared ports, so nested validation resolves against the correct local
//! scope. Namespace and framework context propagate to children by value;
//! nothing is mutated on the tree.
//!
//! Sub-passes return their errors as values (`Vec<Error>`) and the walker
//! appends them, so each check stays independently testable.

pub mod bundles;
pub mod constraints;
pub mod ports;
pub mod streams;

use crate::consteval::{resolve_node_out_data_type, StructuralType};
use crate::context::ResolveContext;
use crate::resolver::{find_declaration, find_type_declaration, inherited_ports};
use stride_ast::{Declaration, Error, ErrorKind, Node, NodeKind, ScopeFrame, ScopeStack};

/// Tree walker that accumulates validation errors.
pub struct Validator<'a> {
    tree: &'a [Node],
    errors: Vec<Error>,
}

impl<'a> Validator<'a> {
    /// Validate a whole tree; returns the unsorted error list.
    pub fn run(tree: &'a [Node]) -> Vec<Error> {
        let mut validator = Validator {
            tree,
            errors: Vec::new(),
        };
        let mut scope = ScopeStack::new();

        let top_level: Vec<Declaration> = tree
            .iter()
            .filter_map(Node::as_declaration)
            .cloned()
            .collect();
        validator.errors.extend(check_duplicates(&top_level));

        for node in tree {
            validator.node(node, &mut scope, &[], None);
        }
        validator.errors
    }

    fn ctx<'s>(
        &'s self,
        scope: &'s ScopeStack,
        namespaces: &'s [String],
        framework: Option<&'s str>,
    ) -> ResolveContext<'s> {
        ResolveContext {
            tree: self.tree,
            scope,
            namespaces,
            framework,
        }
    }

    fn node(
        &mut self,
        node: &Node,
        scope: &mut ScopeStack,
        namespaces: &[String],
        framework: Option<&str>,
    ) {
        match &node.kind {
            NodeKind::Declaration(decl) | NodeKind::BundleDeclaration(decl) => {
                self.declaration(node, decl, scope, namespaces, framework);
            }
            NodeKind::Block(block) => {
                let errs = {
                    let ctx = self.ctx(scope, namespaces, framework);
                    check_block_ref(&block.qualified_name(), node, ctx)
                };
                self.errors.extend(errs);
            }
            NodeKind::Bundle(bundle) => {
                let errs = {
                    let ctx = self.ctx(scope, namespaces, framework);
                    check_bundle_ref(bundle, node, ctx)
                };
                self.errors.extend(errs);
                self.node(&bundle.index, scope, namespaces, framework);
            }
            NodeKind::Function(call) => {
                let errs = {
                    let ctx = self.ctx(scope, namespaces, framework);
                    match find_declaration(&call.qualified_name(), ctx) {
                        None => vec![Error::new(ErrorKind::UndeclaredSymbol, node.loc.clone())
                            .with_token(call.qualified_name())],
                        Some(module) => ports::check_function_ports(call, &module, node, ctx),
                    }
                };
                self.errors.extend(errs);
                for value in call.properties.values() {
                    self.node(value, scope, namespaces, framework);
                }
            }
            NodeKind::Stream(members) => {
                let errs = {
                    let ctx = self.ctx(scope, namespaces, framework);
                    streams::check_stream(members, ctx)
                };
                self.errors.extend(errs);
                for member in members {
                    self.node(member, scope, namespaces, framework);
                }
            }
            NodeKind::List(items) => {
                for item in items {
                    self.node(item, scope, namespaces, framework);
                }
            }
            NodeKind::Expression(expr) => {
                for operand in &expr.operands {
                    self.node(operand, scope, namespaces, framework);
                }
            }
            NodeKind::Range(range) => {
                self.node(&range.start, scope, namespaces, framework);
                self.node(&range.end, scope, namespaces, framework);
            }
            NodeKind::Int(_)
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

    fn declaration(
        &mut self,
        node: &Node,
        decl: &Declaration,
        scope: &mut ScopeStack,
        namespaces: &[String],
        framework: Option<&str>,
    ) {
        // Framework context follows the declaration's origin downward.
        let owned_framework = decl.meta.framework.clone();
        let child_framework = owned_framework.as_deref().or(framework);

        // Type-defining and vocabulary declarations are intrinsic;
        // everything else must resolve to a known type declaration.
        if !decl.is_type_defining() && !is_intrinsic_kind(&decl.object_type) {
            let errs = {
                let ctx = self.ctx(scope, namespaces, child_framework);
                match find_type_declaration(&decl.object_type, ctx) {
                    None => vec![Error::new(ErrorKind::UnknownType, node.loc.clone())
                        .with_token(&decl.object_type)],
                    Some(type_decl) => {
                        let valid_ports = inherited_ports(&type_decl, ctx);
                        ports::check_declaration_ports(decl, &valid_ports, ctx)
                    }
                }
            };
            self.errors.extend(errs);
        }

        if matches!(node.kind, NodeKind::BundleDeclaration(_)) {
            let errs = {
                let ctx = self.ctx(scope, namespaces, child_framework);
                bundles::check_bundle(decl, ctx)
            };
            self.errors.extend(errs);
        }

        if decl.property("rate").is_some() {
            let errs = {
                let ctx = self.ctx(scope, namespaces, child_framework);
                check_rate(decl, ctx)
            };
            self.errors.extend(errs);
        }

        // Local scope for children: the declaration's sub-blocks and ports.
        let mut frame_decls: Vec<Declaration> = decl.blocks().into_iter().cloned().collect();
        frame_decls.extend(decl.ports().into_iter().cloned());
        self.errors.extend(check_duplicates(&frame_decls));

        scope.push(ScopeFrame::new(Some(decl.name.clone()), frame_decls));
        for (name, value) in &decl.properties {
            // `inherits` holds type names resolved by the type lookup, not
            // block references; skip it to avoid phantom UndeclaredSymbol.
            if name == "inherits" {
                continue;
            }
            self.node(value, scope, namespaces, child_framework);
        }
        scope.pop();
    }
}

/// Object kinds that are part of the validator's own vocabulary rather
/// than library-defined types: port declarations inside type definitions
/// and the constrained value kinds.
fn is_intrinsic_kind(object_type: &str) -> bool {
    matches!(
        object_type,
        "typeProperty"
            | "mainInputPort"
            | "mainOutputPort"
            | "propertyInputPort"
            | "propertyOutputPort"
            | "constrainedInt"
            | "constrainedReal"
            | "constrainedString"
            | "constrainedList"
    )
}

fn check_block_ref(name: &str, node: &Node, ctx: ResolveContext<'_>) -> Vec<Error> {
    if find_declaration(name, ctx).is_none() {
        vec![Error::new(ErrorKind::UndeclaredSymbol, node.loc.clone()).with_token(name)]
    } else {
        Vec::new()
    }
}

fn check_bundle_ref(
    bundle: &stride_ast::BundleRef,
    node: &Node,
    ctx: ResolveContext<'_>,
) -> Vec<Error> {
    let mut errors = check_block_ref(&bundle.qualified_name(), node, ctx);

    let index_type = resolve_node_out_data_type(&bundle.index, ctx);
    // Invalid means the index itself failed to resolve; that defect is
    // reported on its own walk, not double-reported here.
    let integral = matches!(
        index_type,
        StructuralType::Int | StructuralType::Invalid
    ) || matches!(&index_type, StructuralType::List(e) if **e == StructuralType::Int)
        || matches!(bundle.index.kind, NodeKind::Range(_));
    if !integral {
        errors.push(
            Error::new(ErrorKind::IndexMustBeInteger, node.loc.clone())
                .with_token(bundle.qualified_name())
                .with_token(index_type.name()),
        );
    }
    errors
}

/// A rate must fold to a number or resolve to a declared entity.
fn check_rate(decl: &Declaration, ctx: ResolveContext<'_>) -> Vec<Error> {
    let Some(rate) = decl.property("rate") else {
        return Vec::new();
    };

    let resolved = match &rate.kind {
        NodeKind::Block(block) => find_declaration(&block.qualified_name(), ctx).is_some(),
        NodeKind::PortProperty(_) => true,
        _ => resolve_node_out_data_type(rate, ctx).is_numeric(),
    };
    if resolved {
        Vec::new()
    } else {
        vec![Error::new(ErrorKind::UnresolvedRate, rate.loc.clone()).with_token(rate_text(rate))]
    }
}

/// Duplicate declaration names within one frame's member list.
fn check_duplicates(declarations: &[Declaration]) -> Vec<Error> {
    let mut errors = Vec::new();
    for (i, decl) in declarations.iter().enumerate() {
        if declarations[..i].iter().any(|d| d.name == decl.name) {
            errors.push(
                Error::new(ErrorKind::DuplicateSymbol, decl.loc.clone()).with_token(&decl.name),
            );
        }
    }
    errors
}

fn rate_text(rate: &Node) -> String {
    match &rate.kind {
        NodeKind::Block(b) => b.qualified_name(),
        NodeKind::Int(v) => v.to_string(),
        NodeKind::Real(v) => v.to_string(),
        NodeKind::String(s) => s.clone(),
        other => format!("{other:?}"),
    }
}
