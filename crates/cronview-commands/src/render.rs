//! Job blocks and the assembled report.

use cronview_types::{CronJob, CronPayload};

use crate::format::{
    JobStatus, delivery_summary, format_relative, format_schedule, last_run_marker,
    payload_preview,
};

/// Reply text when there is nothing to list.
pub const NO_JOBS_TEXT: &str = "🕐 No cron jobs configured.";

const INDENT: &str = "   ";

/// Render one job as a multi-line block. `index` is 1-based.
pub fn render_job(job: &CronJob, index: usize, now_ms: i64) -> String {
    let status = JobStatus::classify(job);
    let mut lines = vec![
        format!(
            "{} *{index}. {}* ({})",
            status.icon(),
            display_name(job),
            status.label()
        ),
        format!("{INDENT}📅 {}", format_schedule(&job.schedule)),
    ];

    if let Some(auth) = job.auth_profile.as_deref().filter(|s| !s.is_empty()) {
        lines.push(format!("{INDENT}🔑 Auth: {auth}"));
    }

    if let CronPayload::AgentTurn {
        model: Some(model), ..
    } = &job.payload
    {
        if !model.is_empty() {
            lines.push(format!("{INDENT}🤖 Model: {model}"));
        }
    }

    let last_status = job.state.last_status.as_ref();
    lines.push(format!(
        "{INDENT}{} Last: {} {}",
        last_run_marker(last_status),
        last_status.map(|s| s.as_str()).unwrap_or("n/a"),
        format_relative(job.state.last_run_at_ms, now_ms)
    ));

    if job.enabled && job.state.next_run_at_ms.is_some() {
        lines.push(format!(
            "{INDENT}⏭ Next: {}",
            format_relative(job.state.next_run_at_ms, now_ms)
        ));
    }

    if let Some(delivery) = delivery_summary(job.delivery.as_ref()) {
        lines.push(format!("{INDENT}📨 {delivery}"));
    }

    let preview = match &job.payload {
        CronPayload::AgentTurn { message, .. } => payload_preview(message).map(|p| ("💬", p)),
        CronPayload::SystemEvent { text } => payload_preview(text).map(|p| ("📝", p)),
        CronPayload::Other { .. } => None,
    };
    if let Some((marker, preview)) = preview {
        lines.push(format!("{INDENT}{marker} {preview}"));
    }

    lines.join("\n")
}

fn display_name(job: &CronJob) -> &str {
    if !job.name.is_empty() {
        &job.name
    } else if !job.id.is_empty() {
        &job.id
    } else {
        "(unnamed)"
    }
}

/// Join rendered blocks under a header carrying the count.
pub fn assemble_report(blocks: &[String]) -> String {
    if blocks.is_empty() {
        return NO_JOBS_TEXT.to_string();
    }
    format!(
        "🕐 *Cron Jobs ({})*\n\n{}",
        blocks.len(),
        blocks.join("\n\n")
    )
}

/// Render every job in source order and assemble the report.
pub fn render_report(jobs: &[CronJob], now_ms: i64) -> String {
    let blocks: Vec<String> = jobs
        .iter()
        .enumerate()
        .map(|(i, job)| render_job(job, i + 1, now_ms))
        .collect();
    assemble_report(&blocks)
}
