//! System definitions and the merged object set.
//!
//! A *system* names the platforms a program targets: each platform binds
//! a framework, a version, and optionally hardware. Loading a system
//! pulls every targeted framework's library tree from the store and
//! merges them into one object set the resolver can fall back to.
//!
//! Testing configurations substitute same-named testing-tree declarations
//! for their built-in counterparts before the merged set is exposed. The
//! switch is an explicit parameter on [`ObjectSet::build`]; there is no
//! global testing mode.

use crate::error::BuildError;
use crate::store::PlatformStore;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use stride_ast::{Error, ErrorKind, Location, Node, NodeKind};
use stride_resolve::validation::streams::stream_access_sets;
use tracing::{debug, info};

/// One targeted platform: a named framework + version + hardware binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformTarget {
    /// Platform name as written in the system file.
    pub name: String,
    /// Framework backing this platform.
    pub framework: String,
    /// Framework version, `major.minor`.
    pub version: String,
    /// Optional hardware identifier.
    #[serde(default)]
    pub hardware: Option<String>,
}

/// A system definition: the list of named platforms a program targets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemDefinition {
    pub name: String,
    pub platforms: Vec<PlatformTarget>,
}

impl SystemDefinition {
    /// Load a system definition record from a JSON file.
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| BuildError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| BuildError::MalformedTree {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The frameworks this system targets, in platform order.
    pub fn frameworks(&self) -> Vec<&str> {
        self.platforms
            .iter()
            .map(|p| p.framework.as_str())
            .collect()
    }
}

/// Per-framework key/value overrides and substitutions applied to
/// generated artifacts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    /// framework → (key → value) overrides for builder configuration.
    #[serde(default)]
    pub overrides: IndexMap<String, IndexMap<String, String>>,
    /// framework → (key → value) text substitutions for generated code.
    #[serde(default)]
    pub substitutions: IndexMap<String, IndexMap<String, String>>,
}

impl SystemConfig {
    /// Substitutions for one framework; empty map when none configured.
    pub fn substitutions_for(&self, framework: &str) -> IndexMap<String, String> {
        self.substitutions
            .get(framework)
            .cloned()
            .unwrap_or_default()
    }
}

/// The merged library object set for one compile.
#[derive(Debug, Clone, Default)]
pub struct ObjectSet {
    /// Library declarations from every targeted framework.
    pub objects: Vec<Node>,
}

impl ObjectSet {
    /// Load and merge every targeted framework's library tree.
    ///
    /// Load failures surface as `UnknownPlatform` / `SystemError`
    /// diagnostics and do not abort the remaining platforms. With
    /// `testing` set, same-named testing-tree declarations replace their
    /// built-in counterparts.
    pub fn build(
        system: &SystemDefinition,
        store: &dyn PlatformStore,
        testing: bool,
    ) -> (Self, Vec<Error>) {
        let mut objects = Vec::new();
        let mut errors = Vec::new();

        for platform in &system.platforms {
            let mut tree = match store.load_library(&platform.framework, &platform.version) {
                Ok(tree) => tree,
                Err(BuildError::MissingLibrary { framework, .. }) => {
                    errors.push(
                        Error::new(ErrorKind::UnknownPlatform, Location::internal())
                            .with_token(framework),
                    );
                    continue;
                }
                Err(err) => {
                    errors.push(
                        Error::new(ErrorKind::SystemError, Location::internal())
                            .with_token(err.to_string()),
                    );
                    continue;
                }
            };
            stamp_framework(&mut tree, &platform.framework);

            if testing {
                match store.load_testing_library(&platform.framework, &platform.version) {
                    Ok(Some(mut testing_tree)) => {
                        stamp_framework(&mut testing_tree, &platform.framework);
                        let replaced = substitute_testing(&mut tree, testing_tree);
                        info!(
                            framework = %platform.framework,
                            replaced, "substituted testing declarations"
                        );
                    }
                    Ok(None) => {}
                    Err(err) => {
                        errors.push(
                            Error::new(ErrorKind::SystemError, Location::internal())
                                .with_token(err.to_string()),
                        );
                    }
                }
            }

            debug!(
                framework = %platform.framework,
                count = tree.len(),
                "merged library objects"
            );
            objects.extend(tree);
        }

        (Self { objects }, errors)
    }

    /// The full tree one compile resolves against: library objects first
    /// (outermost fallback), then the user program. Import nodes in the
    /// user tree alias library namespaces, and declarations get their
    /// stream access sets cached.
    pub fn merged_tree(&self, user_tree: &[Node]) -> Vec<Node> {
        let mut merged = self.objects.clone();
        apply_imports(&mut merged, user_tree);
        merged.extend(user_tree.iter().cloned());
        annotate_access_sets(&mut merged);
        merged
    }
}

/// Stamp every declaration in a library tree with its origin framework.
fn stamp_framework(tree: &mut [Node], framework: &str) {
    for node in tree {
        if let NodeKind::Declaration(decl) | NodeKind::BundleDeclaration(decl) = &mut node.kind {
            decl.meta.framework = Some(framework.to_string());
            if decl.meta.namespace_tree.is_empty() && !decl.scope.is_empty() {
                decl.meta.namespace_tree = decl.scope.clone();
            }
        }
    }
}

/// Replace same-named built-in declarations with testing ones; testing
/// declarations with no built-in counterpart are added.
fn substitute_testing(tree: &mut Vec<Node>, testing_tree: Vec<Node>) -> usize {
    let mut replaced = 0;
    for testing_node in testing_tree {
        let Some(name) = testing_node.as_declaration().map(|d| d.name.clone()) else {
            continue;
        };
        let slot = tree.iter_mut().find(|n| {
            n.as_declaration()
                .is_some_and(|d| d.name == name)
        });
        match slot {
            Some(node) => {
                *node = testing_node;
                replaced += 1;
            }
            None => tree.push(testing_node),
        }
    }
    replaced
}

/// Apply Import nodes from the user tree: every object declaration
/// reachable under the imported namespace becomes visible under the
/// import's scope name (its alias, or the name itself).
fn apply_imports(objects: &mut Vec<Node>, user_tree: &[Node]) {
    for node in user_tree {
        let NodeKind::Import(import) = &node.kind else {
            continue;
        };
        let alias = import.scope_name();

        let mut aliased = Vec::new();
        for object in objects.iter() {
            let Some(decl) = object.as_declaration() else {
                continue;
            };
            if decl.meta.namespace_tree.first().map(String::as_str) == Some(import.name.as_str())
                && alias != import.name
            {
                let mut copy = object.clone();
                if let NodeKind::Declaration(d) | NodeKind::BundleDeclaration(d) = &mut copy.kind {
                    d.meta.namespace_tree[0] = alias.to_string();
                }
                aliased.push(copy);
            }
        }
        objects.extend(aliased);
    }
}

/// Cache read/write sets on declarations that carry internal streams.
///
/// Streams can sit at any nesting depth inside a declaration (in a
/// `streams` list, inside sub-blocks), so this walks the whole
/// declaration rather than one property.
fn annotate_access_sets(tree: &mut [Node]) {
    for node in tree {
        let (NodeKind::Declaration(decl) | NodeKind::BundleDeclaration(decl)) = &mut node.kind
        else {
            continue;
        };

        let mut reads = Vec::new();
        let mut writes = Vec::new();
        stride_ast::walk::walk_declaration(decl, &mut |inner: &Node| {
            if let NodeKind::Stream(members) = &inner.kind {
                let (r, w) = stream_access_sets(members);
                for name in r {
                    if !reads.contains(&name) {
                        reads.push(name);
                    }
                }
                for name in w {
                    if !writes.contains(&name) {
                        writes.push(name);
                    }
                }
            }
        });
        decl.meta.reads = reads;
        decl.meta.writes = writes;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::JsonPlatformStore;
    use std::path::PathBuf;
    use stride_ast::{BlockRef, Declaration, ImportDecl};

    fn loc() -> Location {
        Location::new("t.stride", 1)
    }

    fn decl_node(name: &str) -> Node {
        Node::new(NodeKind::Declaration(Declaration::new(name, "module")), loc())
    }

    fn temp_store(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("stride-system-{tag}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn write_json(dir: &Path, file: &str, tree: &[Node]) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join(file), serde_json::to_string(tree).unwrap()).unwrap();
    }

    fn gamma_system() -> SystemDefinition {
        SystemDefinition {
            name: "Desktop".to_string(),
            platforms: vec![PlatformTarget {
                name: "audio".to_string(),
                framework: "Gamma".to_string(),
                version: "1.0".to_string(),
                hardware: None,
            }],
        }
    }

    #[test]
    fn test_object_set_stamps_framework() {
        let root = temp_store("stamp");
        write_json(&root.join("Gamma").join("1.0"), "library.json", &[decl_node("Sine")]);

        let store = JsonPlatformStore::new(&root);
        let (set, errors) = ObjectSet::build(&gamma_system(), &store, false);

        assert!(errors.is_empty());
        assert_eq!(set.objects.len(), 1);
        assert_eq!(
            set.objects[0].as_declaration().unwrap().meta.framework.as_deref(),
            Some("Gamma")
        );

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn test_missing_platform_surfaces_unknown_platform() {
        let root = temp_store("missing");
        let store = JsonPlatformStore::new(&root);

        let (set, errors) = ObjectSet::build(&gamma_system(), &store, false);
        assert!(set.objects.is_empty());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::UnknownPlatform);
        assert_eq!(errors[0].tokens, vec!["Gamma".to_string()]);
    }

    #[test]
    fn test_testing_substitution_replaces_same_named() {
        let root = temp_store("substitute");
        let dir = root.join("Gamma").join("1.0");
        write_json(&dir, "library.json", &[decl_node("Sine"), decl_node("Noise")]);

        let mut testing_sine = Declaration::new("Sine", "module");
        testing_sine.set_property(
            "testing",
            Node::new(NodeKind::Switch(true), loc()),
        );
        write_json(
            &dir,
            "testing.json",
            &[Node::new(NodeKind::Declaration(testing_sine), loc())],
        );

        let store = JsonPlatformStore::new(&root);

        let (builtin, _) = ObjectSet::build(&gamma_system(), &store, false);
        assert!(builtin.objects[0]
            .as_declaration()
            .unwrap()
            .property("testing")
            .is_none());

        let (testing, _) = ObjectSet::build(&gamma_system(), &store, true);
        assert_eq!(testing.objects.len(), 2);
        assert!(testing.objects[0]
            .as_declaration()
            .unwrap()
            .property("testing")
            .is_some());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn test_import_aliasing() {
        let mut sine = Declaration::new("Sine", "module");
        sine.meta.namespace_tree = vec!["Generators".to_string()];
        let objects = vec![Node::new(NodeKind::Declaration(sine), loc())];

        let user_tree = vec![Node::new(
            NodeKind::Import(ImportDecl {
                name: "Generators".to_string(),
                alias: Some("Gen".to_string()),
            }),
            loc(),
        )];

        let set = ObjectSet { objects };
        let merged = set.merged_tree(&user_tree);

        let aliased: Vec<_> = merged
            .iter()
            .filter_map(Node::as_declaration)
            .filter(|d| d.meta.namespace_tree.first().map(String::as_str) == Some("Gen"))
            .collect();
        assert_eq!(aliased.len(), 1);
        assert_eq!(aliased[0].name, "Sine");
    }

    #[test]
    fn test_access_set_annotation() {
        let mut module = Declaration::new("Mixer", "module");
        module.set_property(
            "streams",
            Node::new(
                NodeKind::List(vec![Node::new(
                    NodeKind::Stream(vec![
                        Node::new(NodeKind::Block(BlockRef::new("In")), loc()),
                        Node::new(NodeKind::Block(BlockRef::new("Out")), loc()),
                    ]),
                    loc(),
                )]),
                loc(),
            ),
        );

        let set = ObjectSet {
            objects: vec![Node::new(NodeKind::Declaration(module), loc())],
        };
        let merged = set.merged_tree(&[]);

        let annotated = merged[0].as_declaration().unwrap();
        assert_eq!(annotated.meta.reads, vec!["In".to_string()]);
        assert_eq!(annotated.meta.writes, vec!["Out".to_string()]);
    }

    #[test]
    fn test_system_definition_round_trip() {
        let system = gamma_system();
        let json = serde_json::to_string(&system).unwrap();
        let back: SystemDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(system, back);
    }
}
