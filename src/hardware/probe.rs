//! Hardware detection for model sizing
//!
//! RAM and CPU facts come from `sysinfo`; discrete-GPU facts come from
//! `nvidia-smi` when available. Probe failures are never fatal: the engine
//! degrades to a CPU-only snapshot and keeps working.

use super::snapshot::{GpuVendor, HardwareSnapshot};
use async_trait::async_trait;
use sysinfo::System;
use tracing::{debug, info, warn};

/// Known memory bandwidth figures (GB/s) by GPU model substring.
///
/// Matched case-insensitively against the reported GPU name; first hit wins,
/// so more specific names ("4070 ti super") sort before their prefixes.
const GPU_BANDWIDTH_TABLE: &[(&str, f64)] = &[
    ("4090", 1008.0),
    ("4080 super", 736.0),
    ("4080", 717.0),
    ("4070 ti super", 672.0),
    ("4070 ti", 504.0),
    ("4070 super", 504.0),
    ("4070", 504.0),
    ("4060 ti", 288.0),
    ("4060", 272.0),
    ("3090 ti", 1008.0),
    ("3090", 936.0),
    ("3080 ti", 912.0),
    ("3080", 760.0),
    ("3070 ti", 608.0),
    ("3070", 448.0),
    ("3060 ti", 448.0),
    ("3060", 360.0),
    ("3050", 224.0),
    ("2080 ti", 616.0),
    ("2080 super", 496.0),
    ("2080", 448.0),
    ("2070 super", 448.0),
    ("2070", 448.0),
    ("2060 super", 448.0),
    ("2060", 336.0),
    ("1660 ti", 288.0),
    ("1660 super", 336.0),
    ("1660", 192.0),
    ("1650 super", 192.0),
    ("1650", 128.0),
    ("1080 ti", 484.0),
    ("1080", 320.0),
    ("1070 ti", 256.0),
    ("1070", 256.0),
    ("1060", 192.0),
    ("7900 xtx", 960.0),
    ("7900 xt", 800.0),
    ("7800 xt", 624.0),
    ("7700 xt", 432.0),
    ("7600", 288.0),
    ("6950 xt", 576.0),
    ("6900 xt", 512.0),
    ("6800 xt", 512.0),
    ("6700 xt", 384.0),
    ("6600 xt", 256.0),
];

/// Fallback bandwidth when the GPU is unknown to the table
const NVIDIA_FALLBACK_BW: f64 = 300.0;
const AMD_FALLBACK_BW: f64 = 400.0;

/// Supplies hardware snapshots to the engine
///
/// Implementations must degrade rather than fail: when GPU facts cannot be
/// obtained, return a CPU-only snapshot.
#[async_trait]
pub trait HardwareProbe: Send + Sync {
    async fn probe(&self) -> HardwareSnapshot;
}

/// Default probe backed by `sysinfo` and `nvidia-smi`
#[derive(Debug, Default)]
pub struct SystemProbe;

impl SystemProbe {
    pub fn new() -> Self {
        Self
    }

    fn ram_and_cpu() -> (u64, String, usize) {
        let mut sys = System::new_all();
        sys.refresh_all();

        let ram_bytes = sys.total_memory();
        let cpu_cores = sys.cpus().len();
        let cpu_description = sys
            .cpus()
            .first()
            .map(|c| c.brand().trim().to_string())
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| "Unknown CPU".to_string());

        (ram_bytes, cpu_description, cpu_cores)
    }

    /// Queries `nvidia-smi` for the GPU name and total VRAM
    async fn detect_nvidia() -> Option<(String, u64)> {
        let output = tokio::process::Command::new("nvidia-smi")
            .args([
                "--query-gpu=name,memory.total",
                "--format=csv,noheader,nounits",
            ])
            .output()
            .await
            .ok()?;

        if !output.status.success() {
            debug!("nvidia-smi exited with {}", output.status);
            return None;
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let line = stdout.lines().next()?;
        let mut parts = line.split(',');
        let name = parts.next()?.trim().to_string();
        let vram_mib: u64 = parts.next()?.trim().parse().ok()?;

        if name.is_empty() || vram_mib == 0 {
            return None;
        }
        Some((name, vram_mib * 1024 * 1024))
    }

    /// Looks up the bandwidth estimate for a GPU name
    pub fn bandwidth_for(gpu_name: &str, vendor: GpuVendor) -> f64 {
        let lower = gpu_name.to_lowercase();
        for (key, bw) in GPU_BANDWIDTH_TABLE {
            if lower.contains(key) {
                return *bw;
            }
        }
        match vendor {
            GpuVendor::Nvidia => NVIDIA_FALLBACK_BW,
            GpuVendor::Amd => AMD_FALLBACK_BW,
            _ => 0.0,
        }
    }
}

#[async_trait]
impl HardwareProbe for SystemProbe {
    async fn probe(&self) -> HardwareSnapshot {
        let (ram_bytes, cpu_description, cpu_cores) = Self::ram_and_cpu();

        match Self::detect_nvidia().await {
            Some((gpu_name, vram_bytes)) => {
                let bandwidth = Self::bandwidth_for(&gpu_name, GpuVendor::Nvidia);
                info!(
                    "GPU detected: {} ({:.1} GB VRAM, ~{:.0} GB/s)",
                    gpu_name,
                    vram_bytes as f64 / (1024.0 * 1024.0 * 1024.0),
                    bandwidth
                );
                HardwareSnapshot {
                    gpu_name: Some(gpu_name),
                    vram_bytes,
                    ram_bytes,
                    mem_bandwidth_gbs: bandwidth,
                    cpu_description,
                    cpu_cores,
                    gpu_vendor: GpuVendor::Nvidia,
                    is_gpu_present: true,
                }
            }
            None => {
                warn!("no discrete GPU found, assuming CPU-only inference");
                HardwareSnapshot::cpu_only(ram_bytes, cpu_description, cpu_cores)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bandwidth_lookup_known_gpus() {
        assert_eq!(
            SystemProbe::bandwidth_for("NVIDIA GeForce RTX 4090", GpuVendor::Nvidia),
            1008.0
        );
        assert_eq!(
            SystemProbe::bandwidth_for("Radeon RX 7900 XTX", GpuVendor::Amd),
            960.0
        );
    }

    #[test]
    fn test_bandwidth_specific_variant_wins() {
        // "4070 ti super" must not fall through to the plain "4070" entry
        assert_eq!(
            SystemProbe::bandwidth_for("RTX 4070 Ti Super", GpuVendor::Nvidia),
            672.0
        );
        assert_eq!(
            SystemProbe::bandwidth_for("RTX 4070", GpuVendor::Nvidia),
            504.0
        );
    }

    #[test]
    fn test_bandwidth_vendor_fallback() {
        assert_eq!(
            SystemProbe::bandwidth_for("NVIDIA H200 NVL", GpuVendor::Nvidia),
            NVIDIA_FALLBACK_BW
        );
        assert_eq!(
            SystemProbe::bandwidth_for("Radeon Pro W6300", GpuVendor::Amd),
            AMD_FALLBACK_BW
        );
        assert_eq!(SystemProbe::bandwidth_for("Iris Xe", GpuVendor::Intel), 0.0);
    }

    #[tokio::test]
    async fn test_probe_always_yields_snapshot() {
        // Regardless of the machine this runs on, probing must not fail and
        // the consistency invariant must hold.
        let snap = SystemProbe::new().probe().await;
        assert!(snap.ram_bytes > 0);
        assert!(snap.cpu_cores > 0);
        if snap.vram_bytes == 0 {
            assert!(!snap.is_gpu_present);
        }
    }
}
