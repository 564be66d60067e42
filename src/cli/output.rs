//! Output formatting helpers for the CLI
//!
//! Two formats: human-readable text for the terminal and JSON for scripts.
//! Handlers serialize their own payloads; this module keeps the shared
//! plumbing (format selection, byte/size rendering, table-ish rows).

use super::commands::OutputFormatArg;
use crate::assess::RankedModel;
use crate::download::DownloadJob;
use anyhow::Result;
use serde::Serialize;

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
        }
    }
}

impl OutputFormat {
    /// Prints either the JSON payload or the prepared human text
    pub fn emit<T: Serialize>(&self, payload: &T, human: impl FnOnce() -> String) -> Result<()> {
        match self {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(payload)?),
            OutputFormat::Human => println!("{}", human()),
        }
        Ok(())
    }
}

/// Renders a byte count as a human figure
pub fn format_bytes(bytes: u64) -> String {
    const GB: f64 = 1024.0 * 1024.0 * 1024.0;
    const MB: f64 = 1024.0 * 1024.0;
    let bytes = bytes as f64;
    if bytes >= GB {
        format!("{:.2} GB", bytes / GB)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes / MB)
    } else {
        format!("{} B", bytes as u64)
    }
}

/// One-line rendering of a ranked recommendation
pub fn format_ranked_line(index: usize, ranked: &RankedModel) -> String {
    let fit = if ranked.assessment.fits {
        "fits"
    } else {
        "too large"
    };
    format!(
        "{:>2}. {:<24} {:>6.1} GB  score {:>3}  ~{:>5.1} tok/s ({})  [{}]  {}",
        index + 1,
        ranked.record.name,
        ranked.record.size_gb,
        ranked.record.score,
        ranked.assessment.estimated_tok_s,
        ranked.assessment.speed_class().label(),
        fit,
        ranked.record.id,
    )
}

/// One-line rendering of a download job
pub fn format_job_line(job: &DownloadJob) -> String {
    let progress = match job.percent() {
        Some(pct) => format!(
            "{:>5.1}% ({} / {})",
            pct,
            format_bytes(job.bytes_done),
            format_bytes(job.bytes_total)
        ),
        None => format_bytes(job.bytes_done),
    };
    let error = job
        .error
        .map(|e| format!("  [{}]", e))
        .unwrap_or_default();
    format!(
        "{}  {:<12} {:<24} {}{}",
        job.job_id, job.state, job.model_ref.display_name, progress, error
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.00 GB");
    }
}
