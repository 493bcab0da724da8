//! Builder orchestration for Stride.
//!
//! Everything between a validated tree and a built, deployable, runnable
//! artifact:
//!
//! - [`builder`] - the per-framework [`Builder`](builder::Builder) contract
//!   and the process-backed reference implementation
//! - [`registry`] - explicit framework-name → factory registry (the
//!   plugin boundary)
//! - [`store`] - pre-parsed library trees keyed by framework + version
//! - [`system`] - system definitions, config overrides, and the merged
//!   object set
//! - [`process`] - owned child processes with bounded cancellation
//! - [`orchestrator`] - drives every targeted framework through
//!   generate → build → deploy → run
//!
//! Builders are logically independent per framework; the orchestrator
//! drives them sequentially (concurrent driving stays a valid
//! optimization since builders only share read-only inputs).

pub mod builder;
pub mod error;
pub mod generate;
pub mod orchestrator;
pub mod process;
pub mod registry;
pub mod store;
pub mod system;

pub use builder::{Builder, BuilderFactory, BuilderState, ProcessBuilder, ProcessBuilderFactory};
pub use error::{BuildError, Result};
pub use orchestrator::{BuildOutcome, FrameworkOutput, Orchestrator, ProjectPaths};
pub use registry::BuilderRegistry;
pub use store::{JsonPlatformStore, PlatformStore};
pub use system::{ObjectSet, PlatformTarget, SystemConfig, SystemDefinition};
