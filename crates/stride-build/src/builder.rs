//! The per-framework builder contract and the process-backed reference
//! implementation.
//!
//! # Lifecycle
//!
//! ```text
//! Idle → generate_code(tree) → build(artifact) → Built | BuildFailed
//!                                      ↓
//!                               deploy() [optional]
//!                                      ↓
//!                            run(true) → Running → run(false) → Idle
//! ```
//!
//! At most one active build and one active run exist per builder
//! instance; starting a new run first cancels the one in flight.
//! `run(false)` requests cancellation of the current run.
//!
//! Captured stdout/stderr accumulate across phases until
//! [`Builder::clear_buffers`] and must be surfaced on failure rather than
//! swallowed.

use crate::error::Result;
use crate::generate::generate_domain_code;
use crate::process::{run_command, CommandSpec, ManagedProcess, TickCallback};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use stride_ast::Node;
use stride_codegen::GeneratedArtifact;
use tracing::{debug, info, warn};

/// Builder phase state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderState {
    Idle,
    Generating,
    Built,
    BuildFailed,
    Deployed,
    Running,
}

/// One framework's code-to-artifact pipeline.
#[async_trait]
pub trait Builder: Send {
    /// Framework this builder targets.
    fn framework_name(&self) -> &str;

    /// Post-construction health; invalid builders are discarded (and
    /// reported) by the orchestrator.
    fn is_valid(&self) -> bool;

    /// Current lifecycle state.
    fn state(&self) -> BuilderState;

    /// Synthesize per-domain source text from a validated tree.
    fn generate_code(&mut self, tree: &[Node]) -> Result<GeneratedArtifact>;

    /// Turn generated sources into a built artifact. Returns success.
    async fn build(&mut self, artifact: &GeneratedArtifact) -> bool;

    /// Deploy the built artifact to its target. Returns success.
    async fn deploy(&mut self) -> bool;

    /// `run(true)` starts execution; `run(false)` cancels the current
    /// run (or build) with a bounded wait.
    async fn run(&mut self, pressed: bool) -> bool;

    /// Captured standard output from external phases.
    fn stdout(&self) -> String;

    /// Captured standard error from external phases.
    fn stderr(&self) -> String;

    /// Drop captured output.
    fn clear_buffers(&mut self);
}

/// Binds a framework name to a concrete builder implementation.
///
/// This is the system's plugin boundary: the orchestrator only ever sees
/// this four-function contract, whether the factory is a registry entry
/// or something loaded at runtime.
pub trait BuilderFactory: Send + Sync {
    fn name(&self) -> &str;
    fn version_major(&self) -> i32;
    fn version_minor(&self) -> i32;
    fn create(
        &self,
        project_dir: &Path,
        stride_root: &Path,
        platform_path: &Path,
    ) -> Box<dyn Builder>;
}

/// Reference builder: writes generated sources into the project directory
/// and shells out to configured build/deploy/run commands.
///
/// Framework toolchains get their own `Builder` implementations; this one
/// exists so the whole pipeline can be driven (and tested) with plain
/// commands.
pub struct ProcessBuilder {
    framework: String,
    project_dir: PathBuf,
    #[allow(dead_code)]
    stride_root: PathBuf,
    platform_path: PathBuf,
    default_domain: String,
    build_command: Option<Vec<String>>,
    deploy_command: Option<Vec<String>>,
    run_command: Option<Vec<String>>,
    state: BuilderState,
    stdout: String,
    stderr: String,
    active_run: Option<ManagedProcess>,
    tick: Option<TickCallback>,
}

impl ProcessBuilder {
    /// Install the periodic yield hook used during long process waits.
    pub fn set_tick(&mut self, tick: TickCallback) {
        self.tick = Some(tick);
    }

    fn command_spec(&self, parts: &[String]) -> CommandSpec {
        let mut spec = CommandSpec::new(parts[0].clone()).current_dir(&self.project_dir);
        for arg in &parts[1..] {
            spec = spec.arg(arg.clone());
        }
        spec
    }

    async fn run_phase(&mut self, parts: &[String]) -> bool {
        let spec = self.command_spec(parts);
        match run_command(&spec, self.tick.as_ref()).await {
            Ok(output) => {
                self.stdout.push_str(&output.stdout);
                self.stderr.push_str(&output.stderr);
                output.success
            }
            Err(err) => {
                self.stderr.push_str(&format!("{err}\n"));
                false
            }
        }
    }

    /// Write one generated source file per domain into the project dir.
    fn write_sources(&mut self, artifact: &GeneratedArtifact) -> bool {
        if let Err(err) = std::fs::create_dir_all(&self.project_dir) {
            self.stderr
                .push_str(&format!("cannot create {}: {err}\n", self.project_dir.display()));
            return false;
        }
        for (domain_id, source) in &artifact.sources {
            let path = self.project_dir.join(format!("{domain_id}.gen"));
            if let Err(err) = std::fs::write(&path, source) {
                self.stderr
                    .push_str(&format!("cannot write {}: {err}\n", path.display()));
                return false;
            }
        }
        true
    }

    async fn cancel_active_run(&mut self) -> bool {
        let Some(process) = self.active_run.take() else {
            return true;
        };
        info!(framework = %self.framework, "cancelling active run");
        match process.stop().await {
            Ok(_) => true,
            Err(err) => {
                warn!(framework = %self.framework, "run cancellation: {err}");
                self.stderr.push_str(&format!("{err}\n"));
                false
            }
        }
    }
}

#[async_trait]
impl Builder for ProcessBuilder {
    fn framework_name(&self) -> &str {
        &self.framework
    }

    fn is_valid(&self) -> bool {
        // A builder bound to a platform path that doesn't exist cannot
        // generate against that platform's templates.
        self.platform_path.as_os_str().is_empty() || self.platform_path.exists()
    }

    fn state(&self) -> BuilderState {
        self.state
    }

    fn generate_code(&mut self, tree: &[Node]) -> Result<GeneratedArtifact> {
        self.state = BuilderState::Generating;
        debug!(framework = %self.framework, "generating domain code");
        let map = generate_domain_code(tree, &self.default_domain);
        Ok(map.into_artifact())
    }

    async fn build(&mut self, artifact: &GeneratedArtifact) -> bool {
        if !self.write_sources(artifact) {
            self.state = BuilderState::BuildFailed;
            return false;
        }

        let success = match self.build_command.clone() {
            Some(parts) if !parts.is_empty() => self.run_phase(&parts).await,
            // No external toolchain configured: generated sources are the
            // artifact.
            _ => true,
        };

        self.state = if success {
            BuilderState::Built
        } else {
            BuilderState::BuildFailed
        };
        success
    }

    async fn deploy(&mut self) -> bool {
        let success = match self.deploy_command.clone() {
            Some(parts) if !parts.is_empty() => self.run_phase(&parts).await,
            _ => true,
        };
        if success {
            self.state = BuilderState::Deployed;
        }
        success
    }

    async fn run(&mut self, pressed: bool) -> bool {
        if !pressed {
            let cancelled = self.cancel_active_run().await;
            self.state = BuilderState::Idle;
            return cancelled;
        }

        // Starting a new run first cancels the one in flight.
        self.cancel_active_run().await;

        let Some(parts) = self.run_command.clone().filter(|p| !p.is_empty()) else {
            self.stderr.push_str("no run command configured\n");
            return false;
        };

        match ManagedProcess::spawn(&self.command_spec(&parts)) {
            Ok(process) => {
                self.active_run = Some(process);
                self.state = BuilderState::Running;
                true
            }
            Err(err) => {
                self.stderr.push_str(&format!("{err}\n"));
                false
            }
        }
    }

    fn stdout(&self) -> String {
        self.stdout.clone()
    }

    fn stderr(&self) -> String {
        self.stderr.clone()
    }

    fn clear_buffers(&mut self) {
        self.stdout.clear();
        self.stderr.clear();
    }
}

/// Factory for [`ProcessBuilder`] instances.
pub struct ProcessBuilderFactory {
    pub name: String,
    pub version_major: i32,
    pub version_minor: i32,
    /// Domain id used when a declaration names none.
    pub default_domain: String,
    /// External build command (program + args), run in the project dir.
    pub build_command: Option<Vec<String>>,
    pub deploy_command: Option<Vec<String>>,
    pub run_command: Option<Vec<String>>,
}

impl ProcessBuilderFactory {
    /// A factory with no external commands: generated sources are the
    /// whole artifact. Useful as a default and in tests.
    pub fn source_only(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version_major: 1,
            version_minor: 0,
            default_domain: "main".to_string(),
            build_command: None,
            deploy_command: None,
            run_command: None,
        }
    }
}

impl BuilderFactory for ProcessBuilderFactory {
    fn name(&self) -> &str {
        &self.name
    }

    fn version_major(&self) -> i32 {
        self.version_major
    }

    fn version_minor(&self) -> i32 {
        self.version_minor
    }

    fn create(
        &self,
        project_dir: &Path,
        stride_root: &Path,
        platform_path: &Path,
    ) -> Box<dyn Builder> {
        Box::new(ProcessBuilder {
            framework: self.name.clone(),
            project_dir: project_dir.to_path_buf(),
            stride_root: stride_root.to_path_buf(),
            platform_path: platform_path.to_path_buf(),
            default_domain: self.default_domain.clone(),
            build_command: self.build_command.clone(),
            deploy_command: self.deploy_command.clone(),
            run_command: self.run_command.clone(),
            state: BuilderState::Idle,
            stdout: String::new(),
            stderr: String::new(),
            active_run: None,
            tick: None,
        })
    }
}
