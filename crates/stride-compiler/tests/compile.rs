//! End-to-end pipeline tests: library store → validation → builders.

use std::path::{Path, PathBuf};
use stride_ast::{Declaration, ErrorKind, Location, Node, NodeKind};
use stride_build::{
    BuilderRegistry, JsonPlatformStore, Orchestrator, PlatformTarget, ProcessBuilderFactory,
    ProjectPaths, SystemConfig, SystemDefinition,
};
use stride_compiler::{check, compile_and_build, CompileOptions};

fn loc(line: u32) -> Location {
    Location::new("main.stride", line)
}

fn temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("stride-e2e-{tag}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

/// Library tree: a `type` declaration defining `signal` with `rate` and
/// `value` ports, plus a built-in `Osc` module.
fn library_tree() -> Vec<Node> {
    let library_loc = Location::new("library.stride", 1);

    let mut rate_port = Declaration::new("p_rate", "typeProperty");
    rate_port.set_property(
        "name",
        Node::new(NodeKind::String("rate".to_string()), library_loc.clone()),
    );
    rate_port.set_property(
        "types",
        Node::new(
            NodeKind::List(vec![
                Node::new(
                    NodeKind::String("_IntLiteral".to_string()),
                    library_loc.clone(),
                ),
                Node::new(
                    NodeKind::String("_RealLiteral".to_string()),
                    library_loc.clone(),
                ),
            ]),
            library_loc.clone(),
        ),
    );

    let mut value_port = Declaration::new("p_value", "typeProperty");
    value_port.set_property(
        "name",
        Node::new(NodeKind::String("value".to_string()), library_loc.clone()),
    );

    let mut signal_type = Declaration::new("SignalType", "type");
    signal_type.set_property(
        "typeName",
        Node::new(NodeKind::String("signal".to_string()), library_loc.clone()),
    );
    signal_type.set_property(
        "ports",
        Node::new(
            NodeKind::List(vec![
                Node::new(NodeKind::Declaration(rate_port), library_loc.clone()),
                Node::new(NodeKind::Declaration(value_port), library_loc.clone()),
            ]),
            library_loc.clone(),
        ),
    );

    let mut module_type = Declaration::new("ModuleType", "type");
    module_type.set_property(
        "typeName",
        Node::new(NodeKind::String("module".to_string()), library_loc.clone()),
    );

    let osc = Declaration::new("Osc", "module");

    vec![
        Node::new(NodeKind::Declaration(signal_type), library_loc.clone()),
        Node::new(NodeKind::Declaration(module_type), library_loc.clone()),
        Node::new(NodeKind::Declaration(osc), library_loc),
    ]
}

fn write_store(root: &Path) {
    let dir = root.join("Gamma").join("1.0");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("library.json"),
        serde_json::to_string(&library_tree()).unwrap(),
    )
    .unwrap();
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

fn registry() -> BuilderRegistry {
    let mut registry = BuilderRegistry::new();
    registry.register(Box::new(ProcessBuilderFactory::source_only("Gamma")));
    registry
}

/// A valid program: one signal declaration and one stream using it.
fn valid_program() -> Vec<Node> {
    let mut out = Declaration::new("Out", "signal");
    out.loc = loc(2);
    out.set_property("rate", Node::new(NodeKind::Int(44100), loc(2)));

    vec![
        Node::new(NodeKind::Declaration(out), loc(2)),
        Node::new(
            NodeKind::Stream(vec![
                Node::new(
                    NodeKind::Block(stride_ast::BlockRef::new("Osc")),
                    loc(4),
                ),
                Node::new(NodeKind::Block(stride_ast::BlockRef::new("Out")), loc(4)),
            ]),
            loc(4),
        ),
    ]
}

#[tokio::test]
async fn test_valid_program_builds() {
    let store_root = temp_dir("ok-store");
    write_store(&store_root);
    let store = JsonPlatformStore::new(&store_root);
    let registry = registry();
    let project = temp_dir("ok-project");

    let orchestrator = Orchestrator::new(
        &registry,
        &store,
        gamma_system(),
        SystemConfig::default(),
        ProjectPaths {
            project_dir: project.clone(),
            stride_root: PathBuf::new(),
        },
    );

    let options = CompileOptions::default();
    let errors = check(&valid_program(), &orchestrator, &options);
    assert!(errors.is_empty(), "unexpected: {errors:?}");

    let outcome = compile_and_build(&valid_program(), &orchestrator, &options).await;
    assert!(outcome.success);
    assert_eq!(outcome.frameworks.len(), 1);
    assert!(outcome.frameworks[0].built);

    // The generated source names the stream connection.
    let generated = std::fs::read_to_string(project.join("audio").join("main.gen")).unwrap();
    assert!(generated.contains("Osc >> Out;"));

    let _ = std::fs::remove_dir_all(&store_root);
    let _ = std::fs::remove_dir_all(&project);
}

#[tokio::test]
async fn test_errors_prevent_builder_creation() {
    let store_root = temp_dir("err-store");
    write_store(&store_root);
    let store = JsonPlatformStore::new(&store_root);
    let registry = registry();

    let orchestrator = Orchestrator::new(
        &registry,
        &store,
        gamma_system(),
        SystemConfig::default(),
        ProjectPaths {
            project_dir: temp_dir("err-project"),
            stride_root: PathBuf::new(),
        },
    );

    // Unresolved reference: validation must fail and no framework runs.
    let program = vec![Node::new(
        NodeKind::Stream(vec![Node::new(
            NodeKind::Block(stride_ast::BlockRef::new("bar")),
            loc(3),
        )]),
        loc(3),
    )];

    let outcome = compile_and_build(&program, &orchestrator, &CompileOptions::default()).await;
    assert!(!outcome.success);
    assert!(outcome.frameworks.is_empty());
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].kind, ErrorKind::UndeclaredSymbol);
    assert_eq!(outcome.errors[0].tokens, vec!["bar".to_string()]);

    let _ = std::fs::remove_dir_all(&store_root);
}

#[tokio::test]
async fn test_library_declarations_resolve_from_user_code() {
    let store_root = temp_dir("lib-store");
    write_store(&store_root);
    let store = JsonPlatformStore::new(&store_root);
    let registry = registry();

    let orchestrator = Orchestrator::new(
        &registry,
        &store,
        gamma_system(),
        SystemConfig::default(),
        ProjectPaths {
            project_dir: temp_dir("lib-project"),
            stride_root: PathBuf::new(),
        },
    );

    // `Osc` only exists in the Gamma library; the merged object set must
    // make it resolvable.
    let program = vec![Node::new(
        NodeKind::Stream(vec![Node::new(
            NodeKind::Block(stride_ast::BlockRef::new("Osc")),
            loc(1),
        )]),
        loc(1),
    )];

    let errors = check(&program, &orchestrator, &CompileOptions::default());
    assert!(errors.is_empty(), "unexpected: {errors:?}");

    let _ = std::fs::remove_dir_all(&store_root);
}

#[tokio::test]
async fn test_unknown_system_framework_fails_before_build() {
    let store_root = temp_dir("unknown-store");
    // Store exists but has no Ghost framework directory.
    std::fs::create_dir_all(&store_root).unwrap();
    let store = JsonPlatformStore::new(&store_root);
    let registry = registry();

    let system = SystemDefinition {
        name: "Broken".to_string(),
        platforms: vec![PlatformTarget {
            name: "ghost".to_string(),
            framework: "Ghost".to_string(),
            version: "1.0".to_string(),
            hardware: None,
        }],
    };

    let orchestrator = Orchestrator::new(
        &registry,
        &store,
        system,
        SystemConfig::default(),
        ProjectPaths {
            project_dir: temp_dir("unknown-project"),
            stride_root: PathBuf::new(),
        },
    );

    let outcome = compile_and_build(&[], &orchestrator, &CompileOptions::default()).await;
    assert!(!outcome.success);
    assert!(outcome.frameworks.is_empty());
    assert!(outcome
        .errors
        .iter()
        .any(|e| e.kind == ErrorKind::UnknownPlatform));

    let _ = std::fs::remove_dir_all(&store_root);
}
