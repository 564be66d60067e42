//! Immutable hardware snapshot and its atomic holder

use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// GPU vendor, as far as the probe could tell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GpuVendor {
    Nvidia,
    Amd,
    Intel,
    None,
}

impl std::fmt::Display for GpuVendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GpuVendor::Nvidia => write!(f, "NVIDIA"),
            GpuVendor::Amd => write!(f, "AMD"),
            GpuVendor::Intel => write!(f, "Intel"),
            GpuVendor::None => write!(f, "none"),
        }
    }
}

/// A point-in-time view of the machine the engine is running on
///
/// Snapshots are immutable values: a hardware refresh produces a brand-new
/// snapshot and swaps it in whole, so concurrent readers never observe a
/// half-updated mix of old and new fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HardwareSnapshot {
    /// Marketing name of the discrete GPU, if one was found
    pub gpu_name: Option<String>,
    /// Total VRAM in bytes (0 when no discrete GPU)
    pub vram_bytes: u64,
    /// Total system RAM in bytes
    pub ram_bytes: u64,
    /// Memory bandwidth estimate in GB/s (0.0 when unknown)
    pub mem_bandwidth_gbs: f64,
    /// Human-readable CPU description
    pub cpu_description: String,
    /// Physical core count
    pub cpu_cores: usize,
    pub gpu_vendor: GpuVendor,
    pub is_gpu_present: bool,
}

impl HardwareSnapshot {
    /// A CPU-only snapshot used when probing fails or finds no GPU
    pub fn cpu_only(ram_bytes: u64, cpu_description: String, cpu_cores: usize) -> Self {
        Self {
            gpu_name: None,
            vram_bytes: 0,
            ram_bytes,
            mem_bandwidth_gbs: 0.0,
            cpu_description,
            cpu_cores,
            gpu_vendor: GpuVendor::None,
            is_gpu_present: false,
        }
    }

    pub fn vram_gb(&self) -> f64 {
        self.vram_bytes as f64 / BYTES_PER_GB
    }

    pub fn ram_gb(&self) -> f64 {
        self.ram_bytes as f64 / BYTES_PER_GB
    }

    /// One-paste system profile for forums/support requests
    pub fn profile_text(&self) -> String {
        let vram = if self.is_gpu_present {
            format!("{:.1} GB", self.vram_gb())
        } else {
            "N/A".to_string()
        };
        format!(
            "CPU: {} ({} cores)\nRAM: {:.1} GB\nGPU: {}\nVRAM: {}\nVendor: {}\nBandwidth: ~{:.0} GB/s",
            self.cpu_description,
            self.cpu_cores,
            self.ram_gb(),
            self.gpu_name.as_deref().unwrap_or("No dedicated GPU"),
            vram,
            self.gpu_vendor,
            self.mem_bandwidth_gbs,
        )
    }
}

/// Shared holder for the current snapshot
///
/// Readers get an `Arc` clone; `replace` swaps the whole value. The lock is
/// held only for the pointer exchange, never across a probe.
#[derive(Debug)]
pub struct SnapshotCell {
    inner: RwLock<Arc<HardwareSnapshot>>,
}

impl SnapshotCell {
    pub fn new(snapshot: HardwareSnapshot) -> Self {
        Self {
            inner: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Current snapshot; cheap, never blocks on a refresh in progress
    pub fn load(&self) -> Arc<HardwareSnapshot> {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Replaces the snapshot wholesale
    pub fn replace(&self, snapshot: HardwareSnapshot) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(snapshot);
    }
}
