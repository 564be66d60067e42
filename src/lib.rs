//! modelcompass - hardware-aware local AI model advisor
//!
//! This library matches raw hardware facts (GPU, VRAM, RAM, memory
//! bandwidth) against a catalog of locally-runnable models, estimates
//! runtime throughput, and drives a verified download pipeline with
//! third-party runtime registration.
//!
//! # Core Concepts
//!
//! - **Hardware snapshot**: an immutable view of the machine, replaced
//!   wholesale on refresh so concurrent readers never see a torn update
//! - **Fit assessment**: a pure computation of tier, headroom and estimated
//!   tokens/second for one (hardware, model) pair
//! - **Download orchestration**: a FIFO queue where exactly one transfer is
//!   active, every job walks an explicit state machine, and terminal
//!   outcomes land in a bounded history
//! - **Registration**: idempotent hand-off of completed artifacts to local
//!   runtimes (Ollama, LM Studio)
//!
//! # Example Usage
//!
//! ```ignore
//! use modelcompass::config::EngineConfig;
//! use modelcompass::engine::Engine;
//! use modelcompass::catalog::UseCase;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = Engine::init(EngineConfig::default()).await;
//!
//! for pick in engine.recommend(&[UseCase::Coding], Some(5)) {
//!     println!(
//!         "{} ~{:.0} tok/s (fits: {})",
//!         pick.record.name,
//!         pick.assessment.estimated_tok_s,
//!         pick.assessment.fits
//!     );
//! }
//!
//! let job = engine.enqueue_download("qwen3-8b")?;
//! # Ok(())
//! # }
//! ```
//!
//! # Project Structure
//!
//! - [`hardware`]: snapshot type and probe seam
//! - [`catalog`]: curated records, packs, remote search
//! - [`assess`]: fit estimation and ranking
//! - [`download`]: queue, transfer, verification
//! - [`integrate`]: runtime tool registration
//! - [`bench`]: local runtime benchmarking
//! - [`persist`]: per-concern JSON state

// Public modules
pub mod assess;
pub mod bench;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod download;
pub mod engine;
pub mod hardware;
pub mod integrate;
pub mod persist;
pub mod util;

// Re-export key types for convenient access
pub use assess::{assess, rank, FitAssessment, FitTier};
pub use catalog::{Catalog, ModelRecord, UseCase};
pub use config::{EngineConfig, Settings};
pub use download::{DownloadJob, JobId, JobState, Orchestrator};
pub use engine::{Engine, EngineError};
pub use hardware::{HardwareSnapshot, SnapshotCell};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
