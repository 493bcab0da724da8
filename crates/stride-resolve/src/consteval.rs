//! Structural type inference and compile-time constant evaluation.
//!
//! Two closely related jobs live here:
//!
//! 1. **Out-type inference** - the structural type a node contributes when
//!    used as a port value or stream member ([`resolve_node_out_type`]).
//!    Pure and non-reporting: invalid shapes come back as
//!    [`StructuralType::Invalid`] and the *caller* decides what to report.
//! 2. **Constant folding** - the integer value of size expressions
//!    ([`evaluate_const_integer`]), bundle declared/actual sizes, and
//!    1-based list member access. These return `Result` because a failed
//!    fold is a real diagnostic (`InvalidType`, `ArrayIndexOutOfRange`).
//!
//! Bundle members are indexed **1-based** throughout, matching the source
//! language.

use crate::context::ResolveContext;
use crate::resolver::find_declaration;
use stride_ast::{Declaration, Error, ErrorKind, Node, NodeKind};

/// Structural type of a node, as seen by port-type validation.
///
/// Literal kinds map to the synthetic `_*Literal` names; references take
/// the declared type name of what they resolve to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralType {
    Int,
    Real,
    Str,
    Switch,
    PortProperty,
    NoneLiteral,
    /// A reference whose declaration has the given object type
    /// (`"signal"`, `"module"`, ...).
    Named(String),
    /// Homogeneous (or numerically promoted) list of one element type.
    List(Box<StructuralType>),
    /// No valid structural type (unresolved reference, bad promotion).
    Invalid,
}

impl StructuralType {
    /// The type name used in diagnostics and valid-type sets.
    pub fn name(&self) -> String {
        match self {
            StructuralType::Int => "_IntLiteral".to_string(),
            StructuralType::Real => "_RealLiteral".to_string(),
            StructuralType::Str => "_StringLiteral".to_string(),
            StructuralType::Switch => "_SwitchLiteral".to_string(),
            StructuralType::PortProperty => "_PortProperty".to_string(),
            StructuralType::NoneLiteral => "_NoneLiteral".to_string(),
            StructuralType::Named(n) => n.clone(),
            StructuralType::List(element) => element.name(),
            StructuralType::Invalid => "_Invalid".to_string(),
        }
    }

    /// Whether this is one of the numeric literal types.
    pub fn is_numeric(&self) -> bool {
        matches!(self, StructuralType::Int | StructuralType::Real)
    }
}

/// Infer the structural type of a node used as a value.
///
/// References are chased through the resolver to the declared type of
/// their target; an unresolved reference is `Invalid` (the validator
/// reports `UndeclaredSymbol` on its own walk).
pub fn resolve_node_out_type(node: &Node, ctx: ResolveContext<'_>) -> StructuralType {
    match &node.kind {
        NodeKind::Int(_) => StructuralType::Int,
        NodeKind::Real(_) => StructuralType::Real,
        NodeKind::String(_) => StructuralType::Str,
        NodeKind::Switch(_) => StructuralType::Switch,
        NodeKind::PortProperty(_) => StructuralType::PortProperty,
        NodeKind::None => StructuralType::NoneLiteral,
        NodeKind::List(items) => promote_list(items, ctx),
        NodeKind::Range(_) => StructuralType::Int,
        NodeKind::Block(b) => named_type(&b.qualified_name(), ctx),
        NodeKind::Bundle(b) => named_type(&b.qualified_name(), ctx),
        NodeKind::Expression(e) => {
            // An expression's type is the numeric promotion of its operands.
            let operand_types: Vec<_> = e
                .operands
                .iter()
                .map(|operand| resolve_node_out_type(operand, ctx))
                .collect();
            promote_numeric(&operand_types)
        }
        NodeKind::Function(f) => named_type(&f.qualified_name(), ctx),
        NodeKind::Declaration(d) | NodeKind::BundleDeclaration(d) => {
            StructuralType::Named(d.object_type.clone())
        }
        NodeKind::Stream(_)
        | NodeKind::Platform(_)
        | NodeKind::Import(_)
        | NodeKind::System(_) => StructuralType::Invalid,
    }
}

/// Infer the *value* type a reference ultimately carries.
///
/// Like [`resolve_node_out_type`], but block and bundle references chase
/// into the referenced declaration's `value` (or `default`) property, so
/// a constant holding `5` comes back as `Int` rather than `"constant"`.
/// Used by constant folding and rate checking.
pub fn resolve_node_out_data_type(node: &Node, ctx: ResolveContext<'_>) -> StructuralType {
    match &node.kind {
        NodeKind::Block(b) => reference_data_type(&b.qualified_name(), ctx),
        NodeKind::Bundle(b) => reference_data_type(&b.qualified_name(), ctx),
        _ => resolve_node_out_type(node, ctx),
    }
}

fn reference_data_type(name: &str, ctx: ResolveContext<'_>) -> StructuralType {
    match find_declaration(name, ctx) {
        Some(decl) => match initializer(&decl) {
            Some(value) => resolve_node_out_data_type(value, ctx),
            None => StructuralType::Named(decl.object_type.clone()),
        },
        None => StructuralType::Invalid,
    }
}

fn named_type(name: &str, ctx: ResolveContext<'_>) -> StructuralType {
    match find_declaration(name, ctx) {
        Some(decl) => StructuralType::Named(decl.object_type.clone()),
        None => StructuralType::Invalid,
    }
}

/// List-type promotion: a list of only integers and reals is promoted to
/// real; a homogeneous list keeps its element type; anything else is
/// invalid (reported by the caller, not here).
fn promote_list(items: &[Node], ctx: ResolveContext<'_>) -> StructuralType {
    let element_types: Vec<_> = items
        .iter()
        .map(|item| resolve_node_out_type(item, ctx))
        .collect();

    match element_types.first() {
        None => StructuralType::List(Box::new(StructuralType::NoneLiteral)),
        Some(first) => {
            if element_types.iter().all(|t| t == first) {
                return StructuralType::List(Box::new(first.clone()));
            }
            let promoted = promote_numeric(&element_types);
            match promoted {
                StructuralType::Invalid => StructuralType::Invalid,
                other => StructuralType::List(Box::new(other)),
            }
        }
    }
}

/// Numeric promotion over a set of types: all-int stays int, int+real
/// promotes to real, anything else is invalid.
fn promote_numeric(types: &[StructuralType]) -> StructuralType {
    if types.is_empty() || !types.iter().all(StructuralType::is_numeric) {
        return StructuralType::Invalid;
    }
    if types.iter().any(|t| *t == StructuralType::Real) {
        StructuralType::Real
    } else {
        StructuralType::Int
    }
}

/// Evaluate a compile-time integer constant.
///
/// Integer literals evaluate directly. A bundle reference evaluates its
/// index, looks up the referenced bundle declaration, and recursively
/// evaluates the member at that 1-based index of the declaration's
/// initializer list. Any other node kind fails with `InvalidType`
/// carrying the resolved type name.
pub fn evaluate_const_integer(node: &Node, ctx: ResolveContext<'_>) -> Result<i64, Error> {
    match &node.kind {
        NodeKind::Int(v) => Ok(*v),
        NodeKind::Bundle(bundle) => {
            let index = evaluate_const_integer(&bundle.index, ctx)?;
            let name = bundle.qualified_name();

            let decl = find_declaration(&name, ctx).ok_or_else(|| {
                Error::new(ErrorKind::UndeclaredSymbol, node.loc.clone()).with_token(&name)
            })?;
            let items = initializer_list(&decl).ok_or_else(|| {
                Error::new(ErrorKind::InvalidType, node.loc.clone())
                    .with_token(StructuralType::Named(decl.object_type.clone()).name())
            })?;

            let member = get_member_from_list(items, index, &name, &node.loc)?;
            evaluate_const_integer(member, ctx)
        }
        _ => Err(Error::new(ErrorKind::InvalidType, node.loc.clone())
            .with_token(resolve_node_out_type(node, ctx).name())),
    }
}

/// The declared size of a bundle declaration, from its own index literal.
///
/// Fails with `InvalidType` when the size expression is not a foldable
/// integer.
pub fn declared_bundle_size(decl: &Declaration, ctx: ResolveContext<'_>) -> Result<i64, Error> {
    match &decl.size {
        Some(size) => evaluate_const_integer(size, ctx),
        None => Err(Error::new(ErrorKind::InvalidType, decl.loc.clone())
            .with_token(StructuralType::NoneLiteral.name())),
    }
}

/// The effective element count of a declaration's initializer.
///
/// - a `List` counts its elements;
/// - a `Bundle` reference spans its index (a range covers
///   `end - start + 1` members, a list of indexes counts them);
/// - a `Block` reference chases into the referenced declaration's own
///   declared size;
/// - any scalar value counts as one element.
pub fn const_block_data_size(decl: &Declaration, ctx: ResolveContext<'_>) -> Result<i64, Error> {
    let Some(value) = initializer(decl) else {
        return Ok(0);
    };
    node_span(value, ctx)
}

fn node_span(node: &Node, ctx: ResolveContext<'_>) -> Result<i64, Error> {
    match &node.kind {
        NodeKind::List(items) => Ok(items.len() as i64),
        NodeKind::Bundle(bundle) => index_span(&bundle.index, ctx),
        NodeKind::Block(block) => {
            let name = block.qualified_name();
            match find_declaration(&name, ctx) {
                Some(target) if target.size.is_some() => declared_bundle_size(&target, ctx),
                Some(_) => Ok(1),
                None => Err(Error::new(ErrorKind::UndeclaredSymbol, node.loc.clone())
                    .with_token(&name)),
            }
        }
        _ => Ok(1),
    }
}

/// The number of members a bundle index addresses: one for a scalar
/// index, `end - start + 1` for a range, the sum for an index list.
pub fn index_span(index: &Node, ctx: ResolveContext<'_>) -> Result<i64, Error> {
    match &index.kind {
        NodeKind::Range(range) => {
            let start = evaluate_const_integer(&range.start, ctx)?;
            let end = evaluate_const_integer(&range.end, ctx)?;
            Ok((end - start + 1).max(0))
        }
        NodeKind::List(items) => {
            let mut span = 0;
            for item in items {
                span += index_span(item, ctx)?;
            }
            Ok(span)
        }
        _ => {
            evaluate_const_integer(index, ctx)?;
            Ok(1)
        }
    }
}

/// Fetch the member at a 1-based index; index `<= 0` or beyond the list
/// fails with `ArrayIndexOutOfRange` carrying the owner name and index.
pub fn get_member_from_list<'a>(
    items: &'a [Node],
    index: i64,
    owner: &str,
    loc: &stride_ast::Location,
) -> Result<&'a Node, Error> {
    if index <= 0 || index as usize > items.len() {
        return Err(Error::new(ErrorKind::ArrayIndexOutOfRange, loc.clone())
            .with_token(owner)
            .with_token(index.to_string()));
    }
    Ok(&items[(index - 1) as usize])
}

/// A declaration's initializer node: its `value` property, falling back
/// to `default`.
pub fn initializer(decl: &Declaration) -> Option<&Node> {
    decl.property("value").or_else(|| decl.property("default"))
}

fn initializer_list(decl: &Declaration) -> Option<&[Node]> {
    match initializer(decl).map(|n| &n.kind) {
        Some(NodeKind::List(items)) => Some(items),
        _ => None,
    }
}
