//! The syntax tree: one `Node` structure, one tagged union of kinds.
//!
//! Every tree shape the external parser can produce is a [`NodeKind`]
//! variant, and every consumer matches exhaustively. There is no dynamic
//! dispatch and no downcasting anywhere in the pipeline: adding a node kind
//! is a compile error at each match site until it is handled.
//!
//! # Examples
//!
//! ```
//! use stride_ast::{Location, Node, NodeKind};
//!
//! let n = Node::new(NodeKind::Int(440), Location::new("osc.stride", 3));
//! assert!(matches!(n.kind, NodeKind::Int(440)));
//! ```

use crate::decl::Declaration;
use crate::foundation::Location;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single tree node: a kind plus the source location it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// What this node is.
    pub kind: NodeKind,
    /// Where it was parsed from.
    pub loc: Location,
}

impl Node {
    /// Create a new node.
    pub fn new(kind: NodeKind, loc: Location) -> Self {
        Self { kind, loc }
    }

    /// The declaration payload, if this node declares something.
    ///
    /// Covers both scalar and bundle declarations; the two kinds share the
    /// [`Declaration`] payload and differ only in the presence of a size.
    pub fn as_declaration(&self) -> Option<&Declaration> {
        match &self.kind {
            NodeKind::Declaration(d) | NodeKind::BundleDeclaration(d) => Some(d),
            _ => None,
        }
    }

    /// True for `Declaration` and `BundleDeclaration` nodes.
    pub fn is_declaration(&self) -> bool {
        self.as_declaration().is_some()
    }
}

/// Tagged union over every tree shape the parser produces.
///
/// Literal variants carry their value directly; reference variants carry
/// the referenced name plus any scope qualification; declaration variants
/// carry a full [`Declaration`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// A named, typed entity (`signal Out {}`, `constant Size {}`, ...).
    Declaration(Declaration),
    /// An array-like entity with a statically-sized bundle (`signal Out[4] {}`).
    ///
    /// The declared size lives in [`Declaration::size`].
    BundleDeclaration(Declaration),
    /// Reference to a declared block by name (`Out`).
    Block(BlockRef),
    /// Indexed reference into a bundle (`Out[2]`, `Out[1:3]`).
    Bundle(BundleRef),
    /// Module invocation with named ports (`Osc(frequency: 440)`).
    Function(FunctionCall),
    /// A stream expression: members connected left-to-right.
    Stream(Vec<Node>),
    /// Operator expression over sub-nodes.
    Expression(Expression),
    /// Ordered list of values (`[1, 2, 3]`).
    List(Vec<Node>),
    /// Integer literal.
    Int(i64),
    /// Real literal.
    Real(f64),
    /// String literal.
    String(String),
    /// Switch literal (`on` / `off`).
    Switch(bool),
    /// Access to a port's property (`Osc.frequency`).
    PortProperty(PortProperty),
    /// Half-open range used as a bundle index (`[1:3]`).
    Range(Range),
    /// Platform selection in the system header (`use Gamma version 1.0`).
    Platform(PlatformRef),
    /// Namespace import (`import Generators as Gen`).
    Import(ImportDecl),
    /// System selection (`system Desktop version 1.0`).
    System(SystemRef),
    /// Explicit absence of a value.
    None,
}

/// Reference to a declared block by (possibly qualified) name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRef {
    /// Base identifier.
    pub name: String,
    /// Leading scope segments, outermost first. Empty for unqualified names.
    pub namespace: Vec<String>,
}

impl BlockRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: Vec::new(),
        }
    }

    /// Fully-qualified display name (`Ns.Name`).
    pub fn qualified_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace.join("."), self.name)
        }
    }
}

/// Indexed reference into a bundle declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleRef {
    pub name: String,
    pub namespace: Vec<String>,
    /// Index expression: an integer, a range, or a list of either.
    pub index: Box<Node>,
}

impl BundleRef {
    pub fn qualified_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace.join("."), self.name)
        }
    }
}

/// Module invocation: callee name plus named port values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub namespace: Vec<String>,
    /// Supplied ports in source order. Names are unique within one call.
    pub properties: IndexMap<String, Node>,
}

impl FunctionCall {
    pub fn qualified_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace.join("."), self.name)
        }
    }
}

/// Operator expression. The grammar is owned by the external parser; the
/// middle-end only needs to recurse into operands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    /// Operator spelling as parsed (`+`, `*`, `not`, ...).
    pub operator: String,
    /// One operand for unary operators, two for binary.
    pub operands: Vec<Node>,
}

/// Access to a named property of a port (`Osc.frequency`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortProperty {
    /// Block or port owner name.
    pub name: String,
    /// Property being read.
    pub port: String,
}

/// Bundle index range. Both ends are expressions and both are inclusive,
/// matching the 1-based indexing of bundle members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub start: Box<Node>,
    pub end: Box<Node>,
}

/// Platform selection from the system header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformRef {
    /// Framework name (`Gamma`, `Arduino`, ...).
    pub framework: String,
    /// Requested version, `major.minor`.
    pub version: String,
    /// Optional hardware binding.
    pub hardware: Option<String>,
}

/// Namespace import, optionally aliased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportDecl {
    pub name: String,
    pub alias: Option<String>,
}

impl ImportDecl {
    /// The scope segment this import introduces: the alias if present,
    /// otherwise the imported name itself.
    pub fn scope_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// System selection from the system header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemRef {
    pub name: String,
    pub version: String,
}
