//! Registration of downloaded models with local runtime tools
//!
//! Each supported runtime implements [`RuntimeTool`] with a declared
//! capability set; registration is idempotent per target and partial failure
//! is reported per target, never as one aggregate error.

pub mod detect;
pub mod lmstudio;
pub mod ollama;
pub mod registrar;

pub use detect::{detect_tools, CommandInstaller, DetectedTool, InstallError, ToolInstaller};
pub use lmstudio::LmStudioTool;
pub use ollama::OllamaTool;
pub use registrar::{
    register, Capability, Registration, RegistrationOutcome, RegistrationStatus, RegistrarError,
    RuntimeTool,
};
