//! Hardware facts used to size model recommendations
//!
//! The engine never issues OS-specific system calls itself: a
//! [`HardwareProbe`] collaborator produces an immutable [`HardwareSnapshot`],
//! and a refresh replaces the snapshot wholesale via [`SnapshotCell`].

pub mod probe;
pub mod snapshot;

pub use probe::{HardwareProbe, SystemProbe};
pub use snapshot::{GpuVendor, HardwareSnapshot, SnapshotCell};
