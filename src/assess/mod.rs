//! Fit assessment and recommendation ranking
//!
//! [`estimator`] turns a hardware snapshot and a model record into a
//! [`FitAssessment`] (tier, fits, headroom, estimated throughput) with pure
//! arithmetic. [`ranker`] orders the catalog by those assessments for a set
//! of use cases.

pub mod estimator;
pub mod ranker;

pub use estimator::{
    assess, estimate_vram_gb, usable_capacity_gb, AssessError, FitAssessment, FitTier, SpeedClass,
    VramEstimate,
};
pub use ranker::{rank, RankedModel};
