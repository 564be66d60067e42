//! Recommendation ranking
//!
//! Orders catalog records for a hardware snapshot and a set of use cases.
//! Nothing is cached across calls: hardware or catalog may change between
//! invocations, so every call ranks from scratch.

use super::estimator::{assess, FitAssessment};
use crate::catalog::{Catalog, ModelRecord, UseCase};
use crate::hardware::HardwareSnapshot;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;

/// One ranked candidate
#[derive(Debug, Clone)]
pub struct RankedModel {
    pub record: Arc<ModelRecord>,
    pub assessment: FitAssessment,
}

/// Ranks the catalog for the given hardware and use cases
///
/// Filtering keeps records whose category satisfies any requested use case;
/// an empty `use_cases` slice applies no category filter. Ordering is
/// (fits, score, estimated tok/s) descending with catalog insertion order as
/// the final tie-break; the sort is stable, so equal keys never reorder.
/// Models that do not fit are ranked after all fitting ones rather than
/// dropped, and `limit` truncates only after sorting.
pub fn rank(
    hw: &HardwareSnapshot,
    catalog: &Catalog,
    use_cases: &[UseCase],
    limit: Option<usize>,
) -> Vec<RankedModel> {
    let wanted: HashSet<_> = use_cases
        .iter()
        .flat_map(|uc| uc.categories().iter().copied())
        .collect();

    let mut ranked: Vec<RankedModel> = catalog
        .snapshot()
        .into_iter()
        .filter(|record| wanted.is_empty() || wanted.contains(&record.category))
        .filter_map(|record| match assess(hw, &record) {
            Ok(assessment) => Some(RankedModel { record, assessment }),
            Err(err) => {
                // A single malformed entry never aborts the ranking
                warn!("skipping unrankable model: {}", err);
                None
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.assessment
            .fits
            .cmp(&a.assessment.fits)
            .then_with(|| b.record.score.cmp(&a.record.score))
            .then_with(|| {
                b.assessment
                    .estimated_tok_s
                    .partial_cmp(&a.assessment.estimated_tok_s)
                    .unwrap_or(Ordering::Equal)
            })
    });

    if let Some(limit) = limit {
        ranked.truncate(limit);
    }
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ModelCategory, RawModelRecord};
    use crate::hardware::GpuVendor;

    fn gb(n: f64) -> u64 {
        (n * 1024.0 * 1024.0 * 1024.0) as u64
    }

    fn hw_16gb() -> HardwareSnapshot {
        HardwareSnapshot {
            gpu_name: Some("test".into()),
            vram_bytes: gb(16.0),
            ram_bytes: gb(32.0),
            mem_bandwidth_gbs: 500.0,
            cpu_description: "cpu".into(),
            cpu_cores: 8,
            gpu_vendor: GpuVendor::Nvidia,
            is_gpu_present: true,
        }
    }

    fn raw(id: &str, size_gb: f64, score: i64, category: ModelCategory) -> RawModelRecord {
        RawModelRecord {
            id: Some(id.into()),
            name: Some(id.into()),
            size_gb,
            score,
            category: Some(category),
            ..Default::default()
        }
    }

    fn catalog(entries: Vec<RawModelRecord>) -> Catalog {
        let c = Catalog::empty();
        c.merge_raw(entries);
        c
    }

    #[test]
    fn test_fitting_models_precede_non_fitting() {
        // 16GB card -> 13.12GB usable. The huge model has the top score but
        // must still rank below every fitting model.
        let cat = catalog(vec![
            raw("huge", 60.0, 99, ModelCategory::GeneralPurpose),
            raw("small", 5.0, 70, ModelCategory::GeneralPurpose),
            raw("medium", 12.0, 85, ModelCategory::GeneralPurpose),
        ]);
        let ranked = rank(&hw_16gb(), &cat, &[], None);
        let ids: Vec<_> = ranked.iter().map(|r| r.record.id.as_str()).collect();
        assert_eq!(ids, vec!["medium", "small", "huge"]);
        assert!(ranked[0].assessment.fits);
        assert!(!ranked[2].assessment.fits);
    }

    #[test]
    fn test_score_orders_within_fit_group() {
        let cat = catalog(vec![
            raw("b", 5.0, 80, ModelCategory::Coding),
            raw("a", 5.0, 90, ModelCategory::Coding),
        ]);
        let ranked = rank(&hw_16gb(), &cat, &[], None);
        assert_eq!(ranked[0].record.id, "a");
    }

    #[test]
    fn test_tok_s_breaks_score_ties() {
        // Same score; the smaller model is faster and ranks first
        let cat = catalog(vec![
            raw("slow", 10.0, 85, ModelCategory::Coding),
            raw("fast", 5.0, 85, ModelCategory::Coding),
        ]);
        let ranked = rank(&hw_16gb(), &cat, &[], None);
        assert_eq!(ranked[0].record.id, "fast");
    }

    #[test]
    fn test_insertion_order_breaks_full_ties() {
        let cat = catalog(vec![
            raw("first", 5.0, 85, ModelCategory::Coding),
            raw("second", 5.0, 85, ModelCategory::Coding),
        ]);
        let ranked = rank(&hw_16gb(), &cat, &[], None);
        assert_eq!(ranked[0].record.id, "first");
        assert_eq!(ranked[1].record.id, "second");
    }

    #[test]
    fn test_rank_is_reproducible() {
        let cat = Catalog::with_curated();
        let hw = hw_16gb();
        let a: Vec<String> = rank(&hw, &cat, &[], None)
            .iter()
            .map(|r| r.record.id.clone())
            .collect();
        let b: Vec<String> = rank(&hw, &cat, &[], None)
            .iter()
            .map(|r| r.record.id.clone())
            .collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_use_case_filter() {
        let cat = catalog(vec![
            raw("coder", 5.0, 80, ModelCategory::Coding),
            raw("chatty", 5.0, 90, ModelCategory::GeneralPurpose),
            raw("eyes", 5.0, 95, ModelCategory::Vision),
        ]);
        let ranked = rank(&hw_16gb(), &cat, &[UseCase::Coding], None);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].record.id, "coder");
    }

    #[test]
    fn test_empty_use_cases_means_no_filter() {
        let cat = catalog(vec![
            raw("coder", 5.0, 80, ModelCategory::Coding),
            raw("eyes", 5.0, 95, ModelCategory::Vision),
        ]);
        assert_eq!(rank(&hw_16gb(), &cat, &[], None).len(), 2);
    }

    #[test]
    fn test_limit_truncates_after_sorting() {
        // The best-fitting entry is inserted last; a pre-filter truncation
        // would lose it.
        let cat = catalog(vec![
            raw("nofit-a", 60.0, 99, ModelCategory::Coding),
            raw("nofit-b", 55.0, 98, ModelCategory::Coding),
            raw("fits", 5.0, 50, ModelCategory::Coding),
        ]);
        let ranked = rank(&hw_16gb(), &cat, &[], Some(1));
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].record.id, "fits");
    }
}
