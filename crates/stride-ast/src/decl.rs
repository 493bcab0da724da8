//! Declarations: the named, typed entities of a Stride program.
//!
//! A declaration pairs a name with an object type tag (`"signal"`,
//! `"module"`, `"type"`, `"constant"`, ...) and an ordered set of named
//! properties whose values are arbitrary sub-trees. Declarations are the
//! unit of resolution: scope frames hold them, the resolver looks them up,
//! and the validator checks their properties against the port set of their
//! resolved type.
//!
//! Declarations are acyclic except through the `inherits` property, which
//! is stored and resolved *by name* - never as a direct reference - so the
//! tree itself can never contain a structural cycle.

use crate::foundation::Location;
use crate::node::{Node, NodeKind};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A named, typed entity in the tree.
///
/// Shared by `Declaration` and `BundleDeclaration` nodes; a bundle
/// additionally carries its declared size expression in [`size`](Self::size).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    /// Declared name, unique within one scope frame (checked by the
    /// validator, not enforced structurally).
    pub name: String,
    /// Object type tag: `"type"`, `"module"`, `"constant"`, `"signal"`,
    /// `"constrainedInt"`, ...
    pub object_type: String,
    /// Named properties in source order. Names are unique per declaration.
    pub properties: IndexMap<String, Node>,
    /// Lexical scope segments recorded by the parser, outermost first.
    pub scope: Vec<String>,
    /// Source position of the declaration itself. Duplicated from the
    /// carrying node so scope frames can report on detached declarations.
    #[serde(default)]
    pub loc: Location,
    /// Compiler-injected metadata. Empty on freshly parsed trees.
    #[serde(default)]
    pub meta: DeclarationMeta,
    /// Declared bundle size expression. `Some` iff this declaration arrived
    /// as a `BundleDeclaration` node.
    #[serde(default)]
    pub size: Option<Box<Node>>,
}

/// Metadata injected while library trees are merged into the object set.
///
/// Never produced by the parser; populated by the orchestrator (framework,
/// namespace tree) and the validator (read/write sets).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclarationMeta {
    /// Name of the framework whose library this declaration came from.
    /// `None` for declarations written by the user.
    pub framework: Option<String>,
    /// Import-time scoping: the namespace segments under which this
    /// declaration became visible. Drives namespace matching.
    pub namespace_tree: Vec<String>,
    /// Names this declaration's streams read from. Cached by validation.
    pub reads: Vec<String>,
    /// Names this declaration's streams write to. Cached by validation.
    pub writes: Vec<String>,
}

impl Declaration {
    /// Create a bare declaration with no properties.
    pub fn new(name: impl Into<String>, object_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            object_type: object_type.into(),
            properties: IndexMap::new(),
            scope: Vec::new(),
            loc: Location::internal(),
            meta: DeclarationMeta::default(),
            size: None,
        }
    }

    /// Add a property, replacing any previous value under the same name.
    pub fn set_property(&mut self, name: impl Into<String>, value: Node) {
        self.properties.insert(name.into(), value);
    }

    /// Look up a property value by name.
    pub fn property(&self, name: &str) -> Option<&Node> {
        self.properties.get(name)
    }

    /// Property value as a string literal, if it is one.
    pub fn string_property(&self, name: &str) -> Option<&str> {
        match self.property(name).map(|n| &n.kind) {
            Some(NodeKind::String(s)) => Some(s),
            _ => None,
        }
    }

    /// The type name this declaration *defines*, for type-defining
    /// declarations (`typeName` property on `"type"` / `"platformBlock"` /
    /// `"platformModule"` declarations).
    pub fn defined_type_name(&self) -> Option<&str> {
        self.string_property("typeName")
    }

    /// Sub-declarations from the `blocks` property, in order.
    ///
    /// Modules and platform blocks keep their internal declarations here;
    /// validation pushes them as a scope frame before descending.
    pub fn blocks(&self) -> Vec<&Declaration> {
        list_declarations(self.property("blocks"))
    }

    /// Port declarations from the `ports` property, in order.
    pub fn ports(&self) -> Vec<&Declaration> {
        list_declarations(self.property("ports"))
    }

    /// References named by the `inherits` property.
    ///
    /// Accepts a single block reference or an ordered list of them; any
    /// other shape yields nothing (the validator reports it separately).
    pub fn inherits_refs(&self) -> Vec<&crate::node::BlockRef> {
        match self.property("inherits").map(|n| &n.kind) {
            Some(NodeKind::Block(b)) => vec![b],
            Some(NodeKind::List(items)) => items
                .iter()
                .filter_map(|n| match &n.kind {
                    NodeKind::Block(b) => Some(b),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Whether this declaration defines a type other declarations can have.
    pub fn is_type_defining(&self) -> bool {
        matches!(
            self.object_type.as_str(),
            "type" | "platformBlock" | "platformModule"
        )
    }
}

/// Pull the declarations out of a list-valued property.
fn list_declarations(node: Option<&Node>) -> Vec<&Declaration> {
    match node.map(|n| &n.kind) {
        Some(NodeKind::List(items)) => items.iter().filter_map(|n| n.as_declaration()).collect(),
        // A single declaration is accepted where a list is expected.
        Some(NodeKind::Declaration(d)) | Some(NodeKind::BundleDeclaration(d)) => vec![d],
        _ => Vec::new(),
    }
}
