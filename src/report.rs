// src/report.rs
//
// Human-readable statistics report built from a metrics snapshot

use std::fmt::{self, Write};

use crate::config::{ActorProfile, DeliveryMode};
use crate::disk::DiskVerdict;
use crate::metrics::{LatencySummary, MetricsSnapshot};

/// Context that is not part of the counters
#[derive(Debug, Clone)]
pub struct ReportContext<'a> {
    pub free_gb: Option<f64>,
    pub verdict: DiskVerdict,
    pub target_files_per_bucket: u64,
    pub actors: &'a [ActorProfile],
    pub title: &'a str,
}

/// Format a byte count the way the report shows it (KB/MB/GB, 1024-based)
pub fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;
    let b = bytes as f64;
    if b > GB {
        format!("{:.2} GB", b / GB)
    } else if b > MB {
        format!("{:.2} MB", b / MB)
    } else {
        format!("{:.2} KB", b / KB)
    }
}

fn latency_line(label: &str, l: &LatencySummary) -> String {
    if l.count == 0 {
        return format!("  {:<9} no samples", label);
    }
    format!(
        "  {:<9} n={:<7} mean={:.1}ms p50={:.1}ms p95={:.1}ms p99={:.1}ms max={:.1}ms",
        label,
        l.count,
        l.mean_us / 1000.0,
        l.p50_us as f64 / 1000.0,
        l.p95_us as f64 / 1000.0,
        l.p99_us as f64 / 1000.0,
        l.max_us as f64 / 1000.0,
    )
}

/// Render the multi-line report. Pure: reads the snapshot only.
pub fn render(snapshot: &MetricsSnapshot, ctx: &ReportContext<'_>) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    write_report(&mut out, snapshot, ctx).ok();
    out
}

/// Write the report into any `fmt::Write` sink, stopping at the first error.
pub fn write_report<W: Write>(out: &mut W, snapshot: &MetricsSnapshot, ctx: &ReportContext<'_>) -> fmt::Result {
    let g = &snapshot.global;

    writeln!(out, "{}", ctx.title)?;
    writeln!(out, "{}", "=".repeat(60))?;
    writeln!(out, "Uptime: {}s ({:.2} ops/s)", snapshot.uptime.as_secs(), snapshot.ops_per_second())?;

    writeln!(out, "\nGLOBAL OPERATIONS:")?;
    writeln!(out, "  Total Operations:     {}", g.operations)?;
    writeln!(out, "  Uploads:              {}", g.uploads)?;
    writeln!(out, "  Downloads:            {}", g.downloads)?;
    writeln!(out, "  Errors:               {}", g.errors)?;
    writeln!(out, "  Files Created:        {}", g.files_created)?;
    writeln!(out, "  Large Files Created:  {}", g.large_files_created)?;
    writeln!(out, "  TTL Policies Applied: {}", g.ttl_policies_applied)?;
    writeln!(out, "  Subfolders Used:      {}", g.subfolders_used)?;
    writeln!(out, "  Disk Checks:          {}", g.disk_checks)?;
    writeln!(out, "  Data Transferred:     {}", format_bytes(g.bytes_transferred))?;

    writeln!(out, "\nCLIENT LATENCY:")?;
    writeln!(out, "{}", latency_line("upload", &snapshot.upload_latency))?;
    writeln!(out, "{}", latency_line("download", &snapshot.download_latency))?;

    writeln!(out, "\nDISK SPACE:")?;
    match ctx.free_gb {
        Some(gb) => writeln!(out, "  Free Space: {:.1} GB ({})", gb, ctx.verdict)?,
        None => writeln!(out, "  Free Space: unknown")?,
    }

    let total_target = ctx.target_files_per_bucket.saturating_mul(ctx.actors.len() as u64);
    let current = snapshot.actor_total().files_created;
    let pct = if total_target > 0 {
        current as f64 / total_target as f64 * 100.0
    } else {
        0.0
    };
    writeln!(out, "\nPOPULATION PROGRESS:")?;
    writeln!(out, "  Target:    {} files across all buckets", total_target)?;
    writeln!(out, "  Current:   {} files ({:.1}%)", current, pct)?;
    writeln!(out, "  Remaining: {} files", total_target.saturating_sub(current))?;

    writeln!(out, "\nPER-ACTOR STATISTICS:")?;
    let mut env_actors = Vec::new();
    let mut file_actors = Vec::new();
    for (id, c) in &snapshot.per_actor {
        let mode = ctx
            .actors
            .iter()
            .find(|a| &a.id == id)
            .map(|a| a.delivery)
            .unwrap_or_default();
        match mode {
            DeliveryMode::Env => env_actors.push(id.as_str()),
            DeliveryMode::Files => file_actors.push(id.as_str()),
        }
        writeln!(
            out,
            "  {:<16} [{:<5}] ops={} up={} down={} err={} files={} bytes={}",
            id,
            mode,
            c.operations,
            c.uploads,
            c.downloads,
            c.errors,
            c.files_created,
            format_bytes(c.bytes_transferred)
        )?;
    }

    writeln!(out, "\nCONFIG DELIVERY:")?;
    writeln!(out, "  env   ({}): {}", env_actors.len(), env_actors.join(", "))?;
    writeln!(out, "  files ({}): {}", file_actors.len(), file_actors.join(", "))?;

    Ok(())
}
