//! Capacity and speed estimation
//!
//! All functions here are pure: identical inputs always produce identical
//! outputs, and nothing is cached between calls. The estimate intentionally
//! models only the dominant effect, memory bandwidth divided by the bytes
//! touched per token, which tracks real GGUF inference within a small
//! factor.

use crate::catalog::ModelRecord;
use crate::hardware::HardwareSnapshot;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fraction of VRAM usable for weights; the rest is reserved for
/// context/KV-cache and the runtime itself
const VRAM_USABLE_FACTOR: f64 = 0.82;

/// Fraction of system RAM usable for weights on CPU-only machines
const RAM_USABLE_FACTOR: f64 = 0.55;

/// Per-token read amplification from attention/KV-cache traffic
const ATTENTION_OVERHEAD: f64 = 1.15;

/// DDR-class bandwidth (GB/s) substituted when no figure is known
const DDR_CLASS_BANDWIDTH_GBS: f64 = 40.0;

/// A model larger than this fraction of VRAM spills layers to system RAM
const VRAM_SPILL_FRACTION: f64 = 0.95;

/// Offloaded inference is limited by system RAM throughput; empirically
/// close to 0.8 tok/s per GB of RAM for Q4 models
const OFFLOAD_TOKS_PER_RAM_GB: f64 = 0.8;

/// Estimation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssessError {
    /// The record carries no usable size; catalog validation normally
    /// rejects these before they get here
    #[error("invalid model data for '{0}': size must be positive")]
    InvalidModelData(String),
}

/// Discrete VRAM capacity bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FitTier {
    Ultra,
    High,
    MidHigh,
    Mid,
    LowMid,
    Low,
    CpuOnly,
}

impl FitTier {
    /// Breakpoints in GB of raw VRAM, largest first
    const BREAKPOINTS: &'static [(f64, FitTier)] = &[
        (24.0, FitTier::Ultra),
        (16.0, FitTier::High),
        (12.0, FitTier::MidHigh),
        (8.0, FitTier::Mid),
        (6.0, FitTier::LowMid),
        (4.0, FitTier::Low),
    ];

    /// Classifies a hardware snapshot into its capacity bucket
    pub fn for_hardware(hw: &HardwareSnapshot) -> FitTier {
        if !hw.is_gpu_present {
            return FitTier::CpuOnly;
        }
        let vram_gb = hw.vram_gb();
        for (threshold, tier) in Self::BREAKPOINTS {
            if vram_gb >= *threshold {
                return *tier;
            }
        }
        FitTier::CpuOnly
    }

    pub fn label(&self) -> &'static str {
        match self {
            FitTier::Ultra => "Ultra (24 GB+)",
            FitTier::High => "High (16 GB)",
            FitTier::MidHigh => "Mid-High (12 GB)",
            FitTier::Mid => "Mid (8 GB)",
            FitTier::LowMid => "Low-Mid (6 GB)",
            FitTier::Low => "Low (4 GB)",
            FitTier::CpuOnly => "CPU Only",
        }
    }
}

impl std::fmt::Display for FitTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Qualitative throughput bucket for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeedClass {
    Blazing,
    Conversational,
    Comfortable,
    Usable,
    Slow,
}

impl SpeedClass {
    pub fn for_tok_s(tok_s: f64) -> SpeedClass {
        if tok_s >= 40.0 {
            SpeedClass::Blazing
        } else if tok_s >= 20.0 {
            SpeedClass::Conversational
        } else if tok_s >= 10.0 {
            SpeedClass::Comfortable
        } else if tok_s >= 5.0 {
            SpeedClass::Usable
        } else {
            SpeedClass::Slow
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SpeedClass::Blazing => "Blazing fast",
            SpeedClass::Conversational => "Conversational",
            SpeedClass::Comfortable => "Comfortable",
            SpeedClass::Usable => "Usable",
            SpeedClass::Slow => "Slow",
        }
    }
}

/// Derived fit verdict for one (hardware, model) pair
///
/// Ephemeral: recomputed whenever either input changes, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitAssessment {
    pub model_id: String,
    pub tier: FitTier,
    pub fits: bool,
    pub estimated_tok_s: f64,
    /// Usable capacity minus model size; negative when the model does not fit
    pub headroom_gb: f64,
}

impl FitAssessment {
    pub fn speed_class(&self) -> SpeedClass {
        SpeedClass::for_tok_s(self.estimated_tok_s)
    }
}

/// Usable weight capacity in GB for a snapshot
///
/// GPU machines reserve 18% of VRAM for context and runtime overhead;
/// CPU-only machines can realistically dedicate about 55% of system RAM.
pub fn usable_capacity_gb(hw: &HardwareSnapshot) -> f64 {
    if hw.is_gpu_present {
        hw.vram_gb() * VRAM_USABLE_FACTOR
    } else {
        hw.ram_gb() * RAM_USABLE_FACTOR
    }
}

/// Assesses how a model fits the given hardware
///
/// Deterministic and pure. The only failure is a non-positive model size
/// ([`AssessError::InvalidModelData`]); unknown or nonsensical bandwidth
/// figures substitute a DDR-class constant instead of failing.
pub fn assess(hw: &HardwareSnapshot, model: &ModelRecord) -> Result<FitAssessment, AssessError> {
    if !model.size_gb.is_finite() || model.size_gb <= 0.0 {
        return Err(AssessError::InvalidModelData(model.id.clone()));
    }

    let usable_gb = usable_capacity_gb(hw);
    let fits = model.size_gb <= usable_gb;
    let headroom_gb = usable_gb - model.size_gb;

    let bandwidth = if hw.mem_bandwidth_gbs > 0.0 && hw.mem_bandwidth_gbs.is_finite() {
        hw.mem_bandwidth_gbs
    } else {
        DDR_CLASS_BANDWIDTH_GBS
    };

    let mut tok_s = bandwidth / (model.size_gb * ATTENTION_OVERHEAD);

    // Layers that spill out of VRAM run at system-RAM speed
    if !hw.is_gpu_present || model.size_gb > hw.vram_gb() * VRAM_SPILL_FRACTION {
        tok_s = tok_s.min(hw.ram_gb() * OFFLOAD_TOKS_PER_RAM_GB);
    }

    Ok(FitAssessment {
        model_id: model.id.clone(),
        tier: FitTier::for_hardware(hw),
        fits,
        estimated_tok_s: tok_s.max(0.0),
        headroom_gb,
    })
}

/// Break-down of a what-if VRAM estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VramEstimate {
    pub weights_gb: f64,
    pub kv_cache_gb: f64,
    pub overhead_gb: f64,
    pub total_gb: f64,
}

/// Estimates VRAM needed for an arbitrary parameter count and quantization
///
/// `params_b` is the parameter count in billions, `bits_per_weight` the
/// effective quantization width (4.83 for Q4_K_M), `context_k` the context
/// window in thousands of tokens.
pub fn estimate_vram_gb(params_b: f64, bits_per_weight: f64, context_k: u32) -> VramEstimate {
    let weights_gb = params_b * bits_per_weight / 8.0;
    let kv_cache_gb = context_k as f64 * 0.5 / 1024.0 * 8.0;
    let overhead_gb = 0.5;
    VramEstimate {
        weights_gb,
        kv_cache_gb,
        overhead_gb,
        total_gb: weights_gb + kv_cache_gb + overhead_gb,
    }
}
