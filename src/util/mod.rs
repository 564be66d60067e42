//! Utility modules for modelcompass
//!
//! Currently this covers structured logging setup; shared helpers that do not
//! belong to a single component land here.

pub mod logging;

// Re-export commonly used items
pub use logging::{init_default, init_from_env, init_logging, LoggingConfig};
