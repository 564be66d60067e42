//! Command handlers
//!
//! Thin glue between parsed arguments and the [`Engine`]: each handler runs
//! one operation, prints in the requested format and returns a process exit
//! code.

use super::commands::*;
use super::output::{format_bytes, format_job_line, format_ranked_line, OutputFormat};
use crate::assess::estimate_vram_gb;
use crate::engine::Engine;
use crate::integrate::detect_tools;
use anyhow::{anyhow, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use std::time::Duration;
use tracing::error;

/// Converts a handler result into a process exit code
fn exit_code(result: Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

pub async fn handle_hardware(engine: &Engine, args: &HardwareArgs) -> i32 {
    exit_code(hardware(engine, args).await)
}

async fn hardware(engine: &Engine, args: &HardwareArgs) -> Result<()> {
    let snapshot = if args.refresh {
        engine.refresh_hardware().await
    } else {
        engine.hardware()
    };
    let tier = crate::assess::FitTier::for_hardware(&snapshot);
    let usable = crate::assess::usable_capacity_gb(&snapshot);

    let payload = json!({
        "hardware": &*snapshot,
        "tier": tier,
        "usable_model_gb": usable,
    });
    OutputFormat::from(args.format).emit(&payload, || {
        format!(
            "{}\nTier: {}\nMax GGUF: ~{:.1} GB",
            snapshot.profile_text(),
            tier.label(),
            usable
        )
    })
}

pub async fn handle_models(engine: &Engine, args: &ModelsArgs) -> i32 {
    exit_code(models(engine, args))
}

fn models(engine: &Engine, args: &ModelsArgs) -> Result<()> {
    let needle = args.search.as_deref().map(str::to_lowercase);
    let ranked: Vec<_> = engine
        .recommend(&[], None)
        .into_iter()
        .filter(|r| !args.fits || r.assessment.fits)
        .filter(|r| match &needle {
            None => true,
            Some(q) => {
                r.record.name.to_lowercase().contains(q)
                    || r.record.description.to_lowercase().contains(q)
                    || r.record.tags.iter().any(|t| t.to_lowercase().contains(q))
            }
        })
        .collect();

    let payload: Vec<_> = ranked
        .iter()
        .map(|r| json!({ "model": &*r.record, "assessment": r.assessment }))
        .collect();
    OutputFormat::from(args.format).emit(&payload, || {
        let mut lines: Vec<String> = ranked
            .iter()
            .enumerate()
            .map(|(i, r)| format_ranked_line(i, r))
            .collect();
        lines.push(format!("{} models", ranked.len()));
        lines.join("\n")
    })
}

pub async fn handle_recommend(engine: &Engine, args: &RecommendArgs) -> i32 {
    exit_code(recommend(engine, args))
}

fn recommend(engine: &Engine, args: &RecommendArgs) -> Result<()> {
    let ranked = engine.recommend(&args.use_cases, Some(args.limit));

    let payload: Vec<_> = ranked
        .iter()
        .map(|r| json!({ "model": &*r.record, "assessment": r.assessment }))
        .collect();
    OutputFormat::from(args.format).emit(&payload, || {
        if ranked.is_empty() {
            return "No matching models in the catalog.".to_string();
        }
        let mut lines = vec![format!("Top picks for your hardware:")];
        lines.extend(
            ranked
                .iter()
                .enumerate()
                .map(|(i, r)| format_ranked_line(i, r)),
        );
        lines.join("\n")
    })
}

pub async fn handle_download(engine: &Engine, args: &DownloadArgs) -> i32 {
    exit_code(download(engine, args).await)
}

async fn download(engine: &Engine, args: &DownloadArgs) -> Result<()> {
    let job_id = engine.enqueue_download(&args.model_id)?;
    println!("Queued download {} for '{}'", job_id, args.model_id);

    if args.no_wait {
        return Ok(());
    }

    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} {msg} {wide_bar} {bytes}/{total_bytes}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    loop {
        let job = engine
            .job(job_id)
            .ok_or_else(|| anyhow!("job {} vanished", job_id))?;

        if job.bytes_total > 0 {
            bar.set_length(job.bytes_total);
        }
        bar.set_position(job.bytes_done);
        bar.set_message(format!("{} ({})", job.model_ref.display_name, job.state));

        if job.state.is_terminal() {
            bar.finish_and_clear();
            return match job.error {
                None if job.state == crate::download::JobState::Completed => {
                    println!(
                        "Completed: {} ({}) -> {}",
                        job.model_ref.display_name,
                        format_bytes(job.bytes_done),
                        job.target_path.display()
                    );
                    println!("Register it with: modelcompass register {}", job.job_id);
                    Ok(())
                }
                None => {
                    println!("Download {}.", job.state);
                    Ok(())
                }
                Some(kind) => Err(anyhow!("download failed: {}", kind)),
            };
        }
        tokio::time::sleep(Duration::from_millis(150)).await;
    }
}

pub async fn handle_queue(engine: &Engine, args: &FormatOnlyArgs) -> i32 {
    exit_code(queue(engine, args))
}

fn queue(engine: &Engine, args: &FormatOnlyArgs) -> Result<()> {
    let jobs = engine.jobs();
    OutputFormat::from(args.format).emit(&jobs, || {
        if jobs.is_empty() {
            return "Queue is empty.".to_string();
        }
        jobs.iter().map(format_job_line).collect::<Vec<_>>().join("\n")
    })
}

pub async fn handle_cancel(engine: &Engine, args: &CancelArgs) -> i32 {
    exit_code(cancel(engine, args))
}

fn cancel(engine: &Engine, args: &CancelArgs) -> Result<()> {
    let job_id = args.job_id.parse()?;
    engine.cancel_download(job_id)?;
    println!("Cancellation requested for {}", job_id);
    Ok(())
}

pub async fn handle_history(engine: &Engine, args: &HistoryArgs) -> i32 {
    exit_code(history(engine, args))
}

fn history(engine: &Engine, args: &HistoryArgs) -> Result<()> {
    let format = OutputFormat::from(args.format);
    if args.benchmarks {
        let results = engine.bench_history();
        return format.emit(&results, || {
            if results.is_empty() {
                return "No benchmarks recorded yet.".to_string();
            }
            results
                .iter()
                .map(|r| {
                    format!(
                        "{}  {:<24} {:>6.1} tok/s  ttft {:>6.0} ms  {} tokens",
                        r.timestamp.format("%Y-%m-%d %H:%M"),
                        r.model_id,
                        r.tok_s,
                        r.ttft_ms,
                        r.tokens
                    )
                })
                .collect::<Vec<_>>()
                .join("\n")
        });
    }

    let records = engine.download_history();
    format.emit(&records, || {
        if records.is_empty() {
            return "No downloads recorded yet.".to_string();
        }
        records.iter().map(format_job_line).collect::<Vec<_>>().join("\n")
    })
}

pub async fn handle_register(engine: &Engine, args: &RegisterArgs) -> i32 {
    exit_code(register(engine, args).await)
}

async fn register(engine: &Engine, args: &RegisterArgs) -> Result<()> {
    let job_id = args.job_id.parse()?;
    let outcomes = engine.register_download(job_id, &args.tools).await?;

    let mut failures = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(reg) => println!("{}: {:?}: {}", outcome.tool, reg.status, reg.detail),
            Err(e) => {
                failures += 1;
                println!("{}: failed: {}", outcome.tool, e);
            }
        }
    }
    if failures == outcomes.len() && !outcomes.is_empty() {
        return Err(anyhow!("registration failed for every target"));
    }
    Ok(())
}

pub async fn handle_bench(engine: &Engine, args: &BenchArgs) -> i32 {
    exit_code(bench(engine, args).await)
}

async fn bench(engine: &Engine, args: &BenchArgs) -> Result<()> {
    let result = engine.benchmark(&args.model, args.prompt.as_deref()).await?;
    OutputFormat::from(args.format).emit(&result, || {
        format!(
            "{}: {:.1} tok/s ({}), ttft {:.0} ms over {} tokens",
            result.model_id,
            result.tok_s,
            crate::assess::SpeedClass::for_tok_s(result.tok_s).label(),
            result.ttft_ms,
            result.tokens
        )
    })
}

pub async fn handle_favorites(engine: &Engine, args: &FavoritesArgs) -> i32 {
    exit_code(favorites(engine, args))
}

fn favorites(engine: &Engine, args: &FavoritesArgs) -> Result<()> {
    if let Some(model_id) = &args.toggle {
        let starred = engine.toggle_favorite(model_id)?;
        println!(
            "{} '{}'",
            if starred { "Starred" } else { "Unstarred" },
            model_id
        );
    }
    if let Some(pair) = &args.note {
        let (model_id, text) = (&pair[0], &pair[1]);
        if engine.set_favorite_note(model_id, Some(text.clone())) {
            println!("Noted '{}'", model_id);
        } else {
            return Err(anyhow!("'{}' is not starred; star it first", model_id));
        }
    }

    let entries = engine.favorites();
    OutputFormat::from(args.format).emit(&entries, || {
        if entries.is_empty() {
            return "No favorites yet.".to_string();
        }
        entries
            .iter()
            .map(|e| {
                let note = e.note.as_deref().map(|n| format!(" ({})", n)).unwrap_or_default();
                format!("* {}{}", e.model_id, note)
            })
            .collect::<Vec<_>>()
            .join("\n")
    })
}

pub async fn handle_search(engine: &Engine, args: &SearchArgs) -> i32 {
    exit_code(search(engine, args).await)
}

async fn search(engine: &Engine, args: &SearchArgs) -> Result<()> {
    let format = OutputFormat::from(args.format);

    if let Some(pair) = &args.import {
        let (repo, file) = (&pair[0], &pair[1]);
        let id = engine.import_search_result(repo, file).await?;
        println!("Imported as '{}'", id);
        return Ok(());
    }

    if let Some(repo) = &args.files {
        let files = engine.search_files(repo).await?;
        let payload: Vec<_> = files
            .iter()
            .map(|f| json!({ "name": f.name, "quant": f.quant, "size_bytes": f.size_bytes }))
            .collect();
        return format.emit(&payload, || {
            files
                .iter()
                .map(|f| format!("{:<56} {:>8}  {}", f.name, f.quant, format_bytes(f.size_bytes)))
                .collect::<Vec<_>>()
                .join("\n")
        });
    }

    let query = args
        .query
        .as_deref()
        .ok_or_else(|| anyhow!("provide a query, --files or --import"))?;
    let hits = engine.search_models(query, args.limit).await?;
    let payload: Vec<_> = hits
        .iter()
        .map(|h| json!({ "id": h.id, "downloads": h.downloads, "likes": h.likes, "tags": h.tags }))
        .collect();
    format.emit(&payload, || {
        hits.iter()
            .map(|h| format!("{:<56} {:>10} downloads  {:>6} likes", h.id, h.downloads, h.likes))
            .collect::<Vec<_>>()
            .join("\n")
    })
}

pub async fn handle_tools(engine: &Engine, args: &ToolsArgs) -> i32 {
    exit_code(tools(engine, args).await)
}

async fn tools(_engine: &Engine, args: &ToolsArgs) -> Result<()> {
    let detected = detect_tools().await;

    if let Some(tool_id) = &args.install {
        let tool = detected
            .iter()
            .find(|t| t.id == tool_id)
            .ok_or_else(|| anyhow!("unknown tool '{}'", tool_id))?;
        if tool.installed {
            println!("{} is already installed.", tool.name);
            return Ok(());
        }
        let install_id = tool
            .install_id
            .ok_or_else(|| anyhow!("no installer id known for '{}'", tool_id))?;
        use crate::integrate::ToolInstaller;
        crate::integrate::CommandInstaller::winget()
            .install(install_id)
            .await?;
        println!("Installed {}.", tool.name);
        return Ok(());
    }

    let payload: Vec<_> = detected
        .iter()
        .map(|t| {
            json!({
                "id": t.id,
                "name": t.name,
                "installed": t.installed,
                "version": t.version,
            })
        })
        .collect();
    OutputFormat::from(args.format).emit(&payload, || {
        detected
            .iter()
            .map(|t| {
                let status = if t.installed {
                    match &t.version {
                        Some(v) => format!("installed (v{})", v),
                        None => "installed".to_string(),
                    }
                } else {
                    "not found".to_string()
                };
                format!("{:<12} {}", t.name, status)
            })
            .collect::<Vec<_>>()
            .join("\n")
    })
}

pub async fn handle_updates(engine: &Engine, args: &FormatOnlyArgs) -> i32 {
    exit_code(updates(engine, args))
}

fn updates(engine: &Engine, args: &FormatOnlyArgs) -> Result<()> {
    let entries = engine.update_manifest();
    let payload: Vec<_> = entries
        .iter()
        .map(|(id, e)| json!({ "model_id": id, "entry": e }))
        .collect();
    OutputFormat::from(args.format).emit(&payload, || {
        if entries.is_empty() {
            return "No tracked installs yet.".to_string();
        }
        entries
            .iter()
            .map(|(id, e)| {
                format!(
                    "{:<24} {:<40} {}  {}",
                    id,
                    e.source_repo,
                    e.registered_at.format("%Y-%m-%d"),
                    e.local_path.display()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    })
}

pub async fn handle_vram_calc(args: &VramCalcArgs) -> i32 {
    let estimate = estimate_vram_gb(args.params, args.bpw, args.context);
    println!(
        "Model weights: {:.1} GB\nKV cache ({}K): {:.1} GB\nOverhead: {:.1} GB\nTotal: {:.1} GB",
        estimate.weights_gb, args.context, estimate.kv_cache_gb, estimate.overhead_gb, estimate.total_gb
    );
    0
}
