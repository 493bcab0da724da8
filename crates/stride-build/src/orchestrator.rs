//! Driving builders through generate → build → deploy → run.
//!
//! One [`Orchestrator`] owns a compile's build side: it loads the object
//! set for the targeted system, constructs exactly one builder per
//! targeted framework, and drives each through its phases. Frameworks are
//! independent: a failure in one never suppresses the others, and the
//! overall result is the logical AND of the per-framework results.
//!
//! Builder construction failures are *surfaced*, not dropped: an invalid
//! builder is discarded and reported as a `SystemError` diagnostic naming
//! the framework.

use crate::builder::Builder;
use crate::registry::BuilderRegistry;
use crate::store::PlatformStore;
use crate::system::{ObjectSet, SystemConfig, SystemDefinition};
use std::path::PathBuf;
use stride_ast::{Error, ErrorKind, Location, Node};
use tracing::{error, info, warn};

/// Filesystem roots a builder is bound to.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    /// Output directory for generated sources and built artifacts.
    pub project_dir: PathBuf,
    /// Root of the Stride installation (library trees, templates).
    pub stride_root: PathBuf,
}

/// Per-framework result of one pipeline drive.
#[derive(Debug, Clone)]
pub struct FrameworkOutput {
    pub framework: String,
    pub built: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Result of driving every targeted framework.
#[derive(Debug, Clone, Default)]
pub struct BuildOutcome {
    /// Logical AND of every per-framework build result, and of builder
    /// creation itself.
    pub success: bool,
    /// Orchestration diagnostics (unknown platforms, invalid builders).
    pub errors: Vec<Error>,
    /// Captured per-framework results, failures included.
    pub frameworks: Vec<FrameworkOutput>,
}

/// Owns builder construction and phase driving for one system.
pub struct Orchestrator<'a> {
    registry: &'a BuilderRegistry,
    store: &'a dyn PlatformStore,
    system: SystemDefinition,
    config: SystemConfig,
    paths: ProjectPaths,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        registry: &'a BuilderRegistry,
        store: &'a dyn PlatformStore,
        system: SystemDefinition,
        config: SystemConfig,
        paths: ProjectPaths,
    ) -> Self {
        Self {
            registry,
            store,
            system,
            config,
            paths,
        }
    }

    /// The system being driven.
    pub fn system(&self) -> &SystemDefinition {
        &self.system
    }

    /// Load the merged library object set for this system.
    pub fn object_set(&self, testing: bool) -> (ObjectSet, Vec<Error>) {
        ObjectSet::build(&self.system, self.store, testing)
    }

    /// Construct one builder per targeted framework.
    ///
    /// An empty filter means "all targeted frameworks". Unregistered
    /// frameworks and invalid builders are reported; valid builders are
    /// returned in platform order.
    pub fn create_builders(&self, filter: &[String]) -> (Vec<Box<dyn Builder>>, Vec<Error>) {
        let mut builders: Vec<Box<dyn Builder>> = Vec::new();
        let mut errors = Vec::new();

        for platform in &self.system.platforms {
            if !filter.is_empty() && !filter.contains(&platform.framework) {
                continue;
            }

            let Some(factory) = self.registry.get(&platform.framework) else {
                warn!(framework = %platform.framework, "no registered builder factory");
                errors.push(
                    Error::new(ErrorKind::UnknownPlatform, Location::internal())
                        .with_token(&platform.framework),
                );
                continue;
            };

            let platform_path = self
                .store
                .platform_path(&platform.framework, &platform.version);
            let builder = factory.create(
                &self.paths.project_dir.join(&platform.name),
                &self.paths.stride_root,
                &platform_path,
            );

            if !builder.is_valid() {
                error!(framework = %platform.framework, "builder failed post-construction validation");
                errors.push(
                    Error::new(ErrorKind::SystemError, Location::internal()).with_token(format!(
                        "builder for framework '{}' failed post-construction validation",
                        platform.framework
                    )),
                );
                continue;
            }

            info!(
                framework = %platform.framework,
                version = factory.version_major(),
                "created builder"
            );
            builders.push(builder);
        }

        (builders, errors)
    }

    /// Drive generate → build (→ deploy) for every targeted framework.
    ///
    /// The tree must already have passed validation; the facade enforces
    /// that no builders are created against a tree with errors. With
    /// `deploy` set, each successfully built framework is also deployed
    /// and the deploy result folds into that framework's result.
    pub async fn build_all(&self, tree: &[Node], filter: &[String], deploy: bool) -> BuildOutcome {
        let (builders, errors) = self.create_builders(filter);
        let mut outcome = BuildOutcome {
            success: errors.is_empty(),
            errors,
            frameworks: Vec::new(),
        };

        for mut builder in builders {
            let framework = builder.framework_name().to_string();

            let mut built = match builder.generate_code(tree) {
                Ok(mut artifact) => {
                    artifact.substitute(&self.config.substitutions_for(&framework));
                    builder.build(&artifact).await
                }
                Err(err) => {
                    outcome.errors.push(
                        Error::new(ErrorKind::SystemError, Location::internal())
                            .with_token(format!("code generation for '{framework}' failed: {err}")),
                    );
                    false
                }
            };

            if built && deploy {
                built = builder.deploy().await;
            }

            if !built {
                error!(framework = %framework, "build failed");
            }
            outcome.success &= built;
            outcome.frameworks.push(FrameworkOutput {
                framework,
                built,
                stdout: builder.stdout(),
                stderr: builder.stderr(),
            });
            builder.clear_buffers();
        }

        outcome
    }
}
