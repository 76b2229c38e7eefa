//! Leaf formatters: schedules, relative times, status, previews.
//!
//! All durations share one unit table with millisecond thresholds.
//! Seconds and minutes are whole (truncated); hours and days keep one
//! truncated decimal and drop a trailing `.0`. Truncation means a value
//! never rounds up into the next unit (59_999ms is `59s`, never `60s`).

use cronview_types::{CronDelivery, CronJob, CronSchedule, RunStatus};

const SECOND_MS: u64 = 1_000;
const MINUTE_MS: u64 = 60 * SECOND_MS;
const HOUR_MS: u64 = 60 * MINUTE_MS;
const DAY_MS: u64 = 24 * HOUR_MS;

/// Max characters of payload text shown before the ellipsis.
pub const PREVIEW_MAX_CHARS: usize = 80;

/// Label for a distance in ms: `42s`, `5m`, `1.5h`, `2d`.
pub fn duration_label(ms: u64) -> String {
    if ms < MINUTE_MS {
        format!("{}s", ms / SECOND_MS)
    } else if ms < HOUR_MS {
        format!("{}m", ms / MINUTE_MS)
    } else if ms < DAY_MS {
        tenths_label(ms, HOUR_MS, 'h')
    } else {
        tenths_label(ms, DAY_MS, 'd')
    }
}

fn tenths_label(ms: u64, unit_ms: u64, suffix: char) -> String {
    let tenths = ms / (unit_ms / 10);
    let (whole, frac) = (tenths / 10, tenths % 10);
    if frac == 0 {
        format!("{whole}{suffix}")
    } else {
        format!("{whole}.{frac}{suffix}")
    }
}

/// Short phrase for a schedule. Never fails.
pub fn format_schedule(schedule: &CronSchedule) -> String {
    match schedule {
        CronSchedule::At { at } => format!("at {at}"),
        CronSchedule::Every { every_ms } if *every_ms < SECOND_MS => {
            format!("every {every_ms}ms")
        }
        CronSchedule::Every { every_ms } => format!("every {}", duration_label(*every_ms)),
        CronSchedule::Cron { expr, tz: Some(tz) } => format!("cron: {expr} ({tz})"),
        CronSchedule::Cron { expr, tz: None } => format!("cron: {expr}"),
        CronSchedule::Unknown { kind } if kind.is_empty() => "unknown schedule".to_string(),
        CronSchedule::Unknown { kind } => format!("unknown schedule ({kind})"),
    }
}

/// `in 30m` / `1.5h ago` relative to `now_ms`; `n/a` when absent.
pub fn format_relative(timestamp_ms: Option<i64>, now_ms: i64) -> String {
    let Some(ts) = timestamp_ms else {
        return "n/a".to_string();
    };
    let delta = ts.saturating_sub(now_ms);
    let label = duration_label(delta.unsigned_abs());
    if delta >= 0 {
        format!("in {label}")
    } else {
        format!("{label} ago")
    }
}

/// Display status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Disabled,
    Running,
    Ok,
    Error,
    Skipped,
    Idle,
}

impl JobStatus {
    /// First match wins: disabled, running, then the last run outcome.
    pub fn classify(job: &CronJob) -> Self {
        if !job.enabled {
            return JobStatus::Disabled;
        }
        if job.state.running_at_ms.is_some() {
            return JobStatus::Running;
        }
        match job.state.last_status {
            Some(RunStatus::Ok) => JobStatus::Ok,
            Some(RunStatus::Error) => JobStatus::Error,
            Some(RunStatus::Skipped) => JobStatus::Skipped,
            _ => JobStatus::Idle,
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            JobStatus::Disabled => "⏸",
            JobStatus::Running => "🔄",
            JobStatus::Ok => "✅",
            JobStatus::Error => "❌",
            JobStatus::Skipped => "⏭",
            JobStatus::Idle => "⬜",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            JobStatus::Disabled => "disabled",
            JobStatus::Running => "running",
            JobStatus::Ok => "ok",
            JobStatus::Error => "error",
            JobStatus::Skipped => "skipped",
            JobStatus::Idle => "idle",
        }
    }
}

/// Marker for the last-run line.
pub fn last_run_marker(status: Option<&RunStatus>) -> &'static str {
    match status {
        Some(RunStatus::Ok) => "🟢",
        Some(RunStatus::Error) => "🔴",
        _ => "⚪",
    }
}

/// `announce: telegram → 12345`, or `None` when nothing is delivered.
pub fn delivery_summary(delivery: Option<&CronDelivery>) -> Option<String> {
    match delivery? {
        CronDelivery::None => None,
        CronDelivery::Announce { mode, channel, to } => {
            let target = [channel.as_deref(), to.as_deref()]
                .into_iter()
                .flatten()
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(" → ");
            if target.is_empty() {
                Some(mode.clone())
            } else {
                Some(format!("{mode}: {target}"))
            }
        }
    }
}

/// Single-line preview of payload text, `None` for empty text.
///
/// Each line break becomes one space; the result is at most
/// [`PREVIEW_MAX_CHARS`] characters plus an ellipsis.
pub fn payload_preview(text: &str) -> Option<String> {
    if text.is_empty() {
        return None;
    }
    let flattened = text.replace("\r\n", " ").replace(['\r', '\n'], " ");
    let mut chars = flattened.chars();
    let head: String = chars.by_ref().take(PREVIEW_MAX_CHARS).collect();
    if chars.next().is_some() {
        Some(format!("{head}…"))
    } else {
        Some(head)
    }
}
