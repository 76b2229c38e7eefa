//! `/cron` command handler.

use std::sync::Arc;

use tracing::{debug, warn};

use cronview_cron::JobSource;
use cronview_types::{CommandContext, CommandOutcome, ReplyPayload};

use crate::log::{CommandLog, TracingLog};
use crate::render::render_report;

/// Command tokens this handler answers to (after normalization).
pub const COMMAND_ALIASES: [&str; 2] = ["/cron", "/cronjobs"];

/// Trim, lowercase, and drop a `@botname` suffix from the command token
/// ("/CronJobs@my_bot" → "/cronjobs"). Arguments are kept.
pub fn normalize_command_body(body: &str) -> String {
    let trimmed = body.trim();
    let (token, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((token, rest)) => (token, rest.trim()),
        None => (trimmed, ""),
    };
    let token = token.split('@').next().unwrap_or(token);

    let mut normalized = token.to_lowercase();
    if !rest.is_empty() {
        normalized.push(' ');
        normalized.push_str(&rest.to_lowercase());
    }
    normalized
}

/// Whether `body` is exactly one of [`COMMAND_ALIASES`].
pub fn is_cron_command(body: &str) -> bool {
    let normalized = normalize_command_body(body);
    COMMAND_ALIASES.contains(&normalized.as_str())
}

/// Lists cron jobs from one injected [`JobSource`].
///
/// Outcomes:
/// - `None`: text commands are off, or the text is not `/cron`/`/cronjobs`.
/// - stop without reply: the sender is not authorized (logged only).
/// - stop with reply: the report, or an error-flagged reply when the
///   source fails.
pub struct CronJobsCommand {
    source: Arc<dyn JobSource>,
    log: Arc<dyn CommandLog>,
}

impl CronJobsCommand {
    pub fn new(source: Arc<dyn JobSource>) -> Self {
        Self {
            source,
            log: Arc::new(TracingLog),
        }
    }

    /// Replace the verbose log sink.
    pub fn with_log(mut self, log: Arc<dyn CommandLog>) -> Self {
        self.log = log;
        self
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    pub async fn handle(
        &self,
        ctx: &CommandContext,
        allow_text_commands: bool,
    ) -> Option<CommandOutcome> {
        self.handle_with_clock(ctx, allow_text_commands, || {
            chrono::Utc::now().timestamp_millis()
        })
        .await
    }

    /// Same as [`handle`](Self::handle) with an explicit clock.
    pub async fn handle_at(
        &self,
        ctx: &CommandContext,
        allow_text_commands: bool,
        now_ms: i64,
    ) -> Option<CommandOutcome> {
        self.handle_with_clock(ctx, allow_text_commands, || now_ms)
            .await
    }

    /// The clock is read once, after the jobs are acquired.
    async fn handle_with_clock(
        &self,
        ctx: &CommandContext,
        allow_text_commands: bool,
        now_ms: impl FnOnce() -> i64,
    ) -> Option<CommandOutcome> {
        if !allow_text_commands || !is_cron_command(&ctx.command_body) {
            return None;
        }

        if !ctx.is_authorized_sender {
            let sender = ctx
                .sender_id
                .as_deref()
                .filter(|s| !s.is_empty())
                .unwrap_or("<unknown>");
            self.log.verbose(&format!(
                "Ignoring /cronjobs from unauthorized sender: {sender}"
            ));
            return Some(CommandOutcome::stop());
        }

        let reply = match self.source.list_jobs(true).await {
            Ok(jobs) => {
                debug!(source = self.source.name(), jobs = jobs.len(), "Rendering cron report");
                ReplyPayload::text(render_report(&jobs, now_ms()))
            }
            Err(e) => {
                warn!(source = self.source.name(), "Failed to load cron jobs: {e}");
                self.log
                    .verbose(&format!("cron source {} failed: {e}", self.source.name()));
                ReplyPayload::error(format!("❌ Failed to load cron jobs: {e}"))
            }
        };

        Some(CommandOutcome::reply(reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use cronview_cron::{SourceError, StoreJobSource};
    use cronview_types::CronJob;
    use serde_json::json;

    use crate::render::NO_JOBS_TEXT;

    const NOW: i64 = 1_700_000_000_000;

    #[derive(Default)]
    struct RecordingLog(Mutex<Vec<String>>);

    impl CommandLog for RecordingLog {
        fn verbose(&self, message: &str) {
            self.0.lock().unwrap().push(message.to_string());
        }
    }

    struct StaticSource {
        jobs: Vec<CronJob>,
        calls: AtomicUsize,
        saw_include_disabled: Mutex<Option<bool>>,
    }

    impl StaticSource {
        fn new(jobs: Vec<CronJob>) -> Self {
            Self {
                jobs,
                calls: AtomicUsize::new(0),
                saw_include_disabled: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl JobSource for StaticSource {
        fn name(&self) -> &'static str {
            "static"
        }

        async fn list_jobs(&self, include_disabled: bool) -> Result<Vec<CronJob>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.saw_include_disabled.lock().unwrap() = Some(include_disabled);
            Ok(self.jobs.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl JobSource for FailingSource {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn list_jobs(&self, _include_disabled: bool) -> Result<Vec<CronJob>, SourceError> {
            Err(SourceError::Timeout(10_000))
        }
    }

    fn ctx(body: &str, authorized: bool) -> CommandContext {
        CommandContext {
            command_body: body.to_string(),
            sender_id: Some("user-42".to_string()),
            is_authorized_sender: authorized,
        }
    }

    fn backup_job() -> CronJob {
        serde_json::from_value(json!({
            "id": "backup",
            "name": "Backup",
            "schedule": {"kind": "every", "everyMs": 3_600_000},
            "payload": {"kind": "systemEvent", "text": "Run nightly backup"},
            "state": {"lastStatus": "ok", "lastRunAtMs": NOW - 5_400_000, "nextRunAtMs": NOW + 1_800_000}
        }))
        .unwrap()
    }

    #[test]
    fn test_normalize_command_body() {
        assert_eq!(normalize_command_body("  /CRON  "), "/cron");
        assert_eq!(normalize_command_body("/CronJobs@my_bot"), "/cronjobs");
        assert_eq!(normalize_command_body("/cron  List"), "/cron list");
    }

    #[test]
    fn test_is_cron_command() {
        assert!(is_cron_command("/cron"));
        assert!(is_cron_command("/CRONJOBS"));
        assert!(is_cron_command("/cron@bot"));
        assert!(!is_cron_command("/cron list"));
        assert!(!is_cron_command("/crontab"));
        assert!(!is_cron_command("cron"));
        assert!(!is_cron_command(""));
    }

    #[tokio::test]
    async fn test_clock_read_after_listing() {
        let source = Arc::new(StaticSource::new(vec![backup_job()]));
        let cmd = CronJobsCommand::new(source.clone());
        let calls_at_clock = AtomicUsize::new(usize::MAX);

        let outcome = cmd
            .handle_with_clock(&ctx("/cron", true), true, || {
                calls_at_clock.store(source.calls.load(Ordering::SeqCst), Ordering::SeqCst);
                NOW
            })
            .await
            .unwrap();
        assert!(!outcome.reply.unwrap().is_error);
        assert_eq!(calls_at_clock.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_text_commands_disabled() {
        let source = Arc::new(StaticSource::new(vec![backup_job()]));
        let cmd = CronJobsCommand::new(source.clone());
        assert!(cmd.handle_at(&ctx("/cron", true), false, NOW).await.is_none());
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_other_command_not_handled() {
        let source = Arc::new(StaticSource::new(vec![]));
        let cmd = CronJobsCommand::new(source.clone());
        assert!(cmd.handle_at(&ctx("/help", true), true, NOW).await.is_none());
        assert!(cmd.handle_at(&ctx("/help", false), true, NOW).await.is_none());
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unauthorized_sender_is_suppressed() {
        let source = Arc::new(StaticSource::new(vec![backup_job()]));
        let log = Arc::new(RecordingLog::default());
        let cmd = CronJobsCommand::new(source.clone()).with_log(log.clone());

        let outcome = cmd.handle_at(&ctx("/cronjobs", false), true, NOW).await.unwrap();
        assert_eq!(outcome, CommandOutcome::stop());
        assert!(outcome.reply.is_none());
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);

        let logged = log.0.lock().unwrap();
        assert_eq!(
            logged.as_slice(),
            ["Ignoring /cronjobs from unauthorized sender: user-42"]
        );
    }

    #[tokio::test]
    async fn test_unauthorized_unknown_sender() {
        let log = Arc::new(RecordingLog::default());
        let cmd = CronJobsCommand::new(Arc::new(StaticSource::new(vec![]))).with_log(log.clone());
        let context = CommandContext {
            command_body: "/cron".into(),
            sender_id: None,
            is_authorized_sender: false,
        };

        assert!(cmd.handle_at(&context, true, NOW).await.is_some());
        assert!(log.0.lock().unwrap()[0].ends_with("<unknown>"));
    }

    #[tokio::test]
    async fn test_authorized_report() {
        let source = Arc::new(StaticSource::new(vec![backup_job()]));
        let cmd = CronJobsCommand::new(source.clone());

        let outcome = cmd.handle_at(&ctx("/cron", true), true, NOW).await.unwrap();
        assert!(!outcome.should_continue);
        let reply = outcome.reply.unwrap();
        assert!(!reply.is_error);
        assert!(reply.text.starts_with("🕐 *Cron Jobs (1)*"));
        assert!(reply.text.contains("✅ *1. Backup*"));
        assert!(reply.text.contains("every 1h"));
        assert!(reply.text.contains("1.5h ago"));
        assert!(reply.text.contains("in 30m"));
        assert!(reply.text.contains("📝 Run nightly backup"));
        assert_eq!(*source.saw_include_disabled.lock().unwrap(), Some(true));
    }

    #[tokio::test]
    async fn test_empty_source() {
        let cmd = CronJobsCommand::new(Arc::new(StaticSource::new(vec![])));
        let outcome = cmd.handle_at(&ctx("/cron", true), true, NOW).await.unwrap();
        assert_eq!(outcome.reply, Some(ReplyPayload::text(NO_JOBS_TEXT)));
    }

    #[tokio::test]
    async fn test_source_failure_becomes_error_reply() {
        let log = Arc::new(RecordingLog::default());
        let cmd = CronJobsCommand::new(Arc::new(FailingSource)).with_log(log.clone());

        let outcome = cmd.handle_at(&ctx("/cron", true), true, NOW).await.unwrap();
        assert!(!outcome.should_continue);
        let reply = outcome.reply.unwrap();
        assert!(reply.is_error);
        assert_eq!(
            reply.text,
            "❌ Failed to load cron jobs: gateway timed out after 10000ms"
        );
        assert_eq!(log.0.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_store_becomes_error_reply() {
        let dir = tempfile::tempdir().unwrap();
        // Pointing the store at a directory makes the read fail.
        let cmd = CronJobsCommand::new(Arc::new(StoreJobSource::new(dir.path())));

        let outcome = cmd.handle(&ctx("/cron", true), true).await.unwrap();
        let reply = outcome.reply.unwrap();
        assert!(reply.is_error);
        assert!(reply.text.starts_with("❌ Failed to load cron jobs: cannot read"));
    }

    #[tokio::test]
    async fn test_store_backed_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.json");
        std::fs::write(
            &path,
            r#"{ version: 1, jobs: [
                { id: "a", name: "Alpha", enabled: false, schedule: { kind: "every", everyMs: 60000 } },
                { id: "b", name: "Beta", schedule: { kind: "cron", expr: "0 * * * *" } },
            ] }"#,
        )
        .unwrap();
        let cmd = CronJobsCommand::new(Arc::new(StoreJobSource::new(&path)));
        assert_eq!(cmd.source_name(), "store");

        let reply = cmd
            .handle_at(&ctx("/cronjobs", true), true, NOW)
            .await
            .unwrap()
            .reply
            .unwrap();
        assert!(reply.text.starts_with("🕐 *Cron Jobs (2)*"));
        assert!(reply.text.contains("⏸ *1. Alpha* (disabled)"));
        assert!(reply.text.contains("⬜ *2. Beta* (idle)"));
    }
}
