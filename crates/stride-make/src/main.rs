//! Stride Make - drives a parsed tree through validate → generate → build.
//!
//! Takes the external parser's JSON tree output plus a system definition,
//! validates, and builds every targeted framework. The exit code is the
//! AND of all per-framework results.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use stride_build::{
    BuilderRegistry, JsonPlatformStore, Orchestrator, ProcessBuilderFactory, ProjectPaths,
    SystemConfig, SystemDefinition,
};
use stride_compiler::{compile_and_build, format_errors, parse_tree_json, CompileOptions};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "stride-make")]
#[command(about = "Validate and build a parsed Stride program")]
struct Cli {
    /// Parsed tree (JSON) produced by the external parser
    tree: PathBuf,

    /// System definition record (JSON)
    #[arg(long)]
    system: PathBuf,

    /// Root of the platform store (library trees per framework/version)
    #[arg(long)]
    stores: PathBuf,

    /// Output directory for generated sources and artifacts
    #[arg(long, default_value = "build")]
    project_dir: PathBuf,

    /// Root of the Stride installation
    #[arg(long, default_value = "")]
    stride_root: PathBuf,

    /// Optional per-framework configuration record (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Restrict the build to these frameworks (repeatable; default all)
    #[arg(long = "framework")]
    frameworks: Vec<String>,

    /// Substitute testing-tree declarations for built-ins
    #[arg(long)]
    testing: bool,

    /// Deploy each framework after a successful build
    #[arg(long)]
    deploy: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stride_make=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let tree_text = match std::fs::read_to_string(&cli.tree) {
        Ok(text) => text,
        Err(err) => {
            error!("cannot read tree {}: {err}", cli.tree.display());
            return ExitCode::FAILURE;
        }
    };
    let tree = match parse_tree_json(&tree_text) {
        Ok(tree) => tree,
        Err(err) => {
            error!("malformed tree {}: {err}", cli.tree.display());
            return ExitCode::FAILURE;
        }
    };

    let system = match SystemDefinition::load(&cli.system) {
        Ok(system) => system,
        Err(err) => {
            error!("cannot load system definition: {err}");
            return ExitCode::FAILURE;
        }
    };

    let config = match &cli.config {
        Some(path) => match std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|text| serde_json::from_str::<SystemConfig>(&text).map_err(|e| e.to_string()))
        {
            Ok(config) => config,
            Err(err) => {
                error!("cannot load config {}: {err}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => SystemConfig::default(),
    };

    info!(system = %system.name, "loaded system definition");

    let store = JsonPlatformStore::new(&cli.stores);
    let mut registry = BuilderRegistry::new();
    for framework in system.frameworks() {
        registry.register(Box::new(ProcessBuilderFactory::source_only(framework)));
    }

    let orchestrator = Orchestrator::new(
        &registry,
        &store,
        system,
        config,
        ProjectPaths {
            project_dir: cli.project_dir.clone(),
            stride_root: cli.stride_root.clone(),
        },
    );

    let options = CompileOptions {
        testing: cli.testing,
        frameworks: cli.frameworks.clone(),
        deploy: cli.deploy,
    };

    let outcome = compile_and_build(&tree, &orchestrator, &options).await;

    if !outcome.errors.is_empty() {
        eprintln!("{}", format_errors(&outcome.errors));
    }
    for framework in &outcome.frameworks {
        if framework.built {
            info!(framework = %framework.framework, "build succeeded");
        } else {
            error!(framework = %framework.framework, "build failed");
            if !framework.stderr.is_empty() {
                eprintln!("{}", framework.stderr);
            }
        }
    }

    if outcome.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
