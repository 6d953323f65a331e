//! Plain-text rendering of users and batch results.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::Path;

use anyhow::Context;
use corelib::{BatchSummary, ClaimStatus, User};
use executor::BatchReport;

/// Lists shorter than this are printed in full.
const PREVIEW_ALL_UP_TO: usize = 20;
const PREVIEW_HEAD: usize = 10;

pub fn user_preview(users: &[User]) -> String {
    let mut out = String::new();
    let shown = if users.len() <= PREVIEW_ALL_UP_TO {
        users.len()
    } else {
        PREVIEW_HEAD
    };

    for (i, u) in users.iter().take(shown).enumerate() {
        let _ = writeln!(out, "{:>4}. {:<10} {:<24} [{}]", i + 1, u.short_id(8), u.name, u.status);
    }
    if users.len() > shown {
        let _ = writeln!(out, "      ... and {} more users", users.len() - shown);
    }
    out
}

pub fn summary(report: &BatchReport, coupon_id: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Test results for coupon {coupon_id}");
    let _ = writeln!(out, "  total requests   {}", report.total_requests);
    let _ = writeln!(out, "  successful       {}", report.successful_requests);
    let _ = writeln!(out, "  failed           {}", report.failed_requests);
    let _ = writeln!(out, "  duration         {} ms", report.duration_ms);
    let _ = writeln!(out, "  success ratio    {:.1}%", report.success_percent());

    if report.failed_requests > 0 {
        let f = &report.failures;
        let _ = writeln!(
            out,
            "  failures         {} server, {} timeout, {} transport",
            f.server, f.timeout, f.transport
        );
    }

    let _ = writeln!(out);
    if report.limit_respected {
        let _ = writeln!(
            out,
            "Coupon limit respected: {} issued, limit {}",
            report.successful_requests, report.coupon_limit
        );
    } else {
        let _ = writeln!(
            out,
            "Coupon limit EXCEEDED: {} issued, limit {} ({} over)",
            report.successful_requests, report.coupon_limit, report.over_issued
        );
    }
    out
}

/// One line per outcome, in snapshot order.
pub fn details(summary: &BatchSummary, users: &[User]) -> String {
    let names: HashMap<&str, &str> = users
        .iter()
        .map(|u| (u.id.as_str(), u.name.as_str()))
        .collect();

    let mut out = String::new();
    for (i, o) in summary.outcomes.iter().enumerate() {
        let name = names.get(o.user_id.as_str()).copied().unwrap_or("?");
        let time = o.timestamp.format("%H:%M:%S%.3f");

        let detail = match o.status {
            ClaimStatus::Success => o
                .response
                .as_ref()
                .map(|v| v.to_string())
                .unwrap_or_default(),
            _ => o.error.clone().unwrap_or_default(),
        };
        let status = match o.status {
            ClaimStatus::Success => "success",
            ClaimStatus::Failed => "failed",
            ClaimStatus::Pending => "pending",
        };

        let _ = writeln!(out, "{:>5}. {time} {:<24} {:<8} {detail}", i + 1, name, status);
    }
    out
}

/// Writes `{ "summary": ..., "report": ... }` to `path`.
pub fn write_json(path: &Path, summary: &BatchSummary, report: &BatchReport) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let body = serde_json::json!({ "summary": summary, "report": report });

    let mut w = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut w, &body)
        .with_context(|| format!("writing {}", path.display()))?;
    w.flush()
        .with_context(|| format!("flushing {}", path.display()))?;
    Ok(())
}
