use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ──────────────────── Job Types ────────────────────

/// A scheduled cron job as seen by the report.
///
/// The same camelCase shape is used by the local store file and by the
/// gateway `cron.list` response. Every substructure decodes leniently so a
/// single odd field never fails the whole list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CronJob {
    /// Unique job ID. Numeric IDs are kept as their decimal text.
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    /// Display name.
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    /// Whether this job is enabled.
    #[serde(default = "default_true", deserialize_with = "lenient_enabled")]
    pub enabled: bool,
    /// When the job fires.
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub schedule: CronSchedule,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub session_target: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub wake_mode: Option<String>,
    /// Agent the job runs on.
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    /// Auth profile used when the job runs.
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub auth_profile: Option<String>,
    /// What the job does when it runs.
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub payload: CronPayload,
    /// Where the job's output is announced.
    #[serde(default, deserialize_with = "lenient_or_default", skip_serializing_if = "Option::is_none")]
    pub delivery: Option<CronDelivery>,
    /// Run status snapshot, owned by the scheduler.
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub state: CronJobState,
}

fn default_true() -> bool {
    true
}

/// When a job fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawSchedule", into = "RawSchedule")]
pub enum CronSchedule {
    /// Fires once at an absolute time (raw value, not parsed).
    At { at: String },
    /// Fires on a fixed period.
    Every { every_ms: u64 },
    /// Fires per a cron expression.
    Cron { expr: String, tz: Option<String> },
    /// Unrecognized or incomplete schedule.
    Unknown { kind: String },
}

impl Default for CronSchedule {
    fn default() -> Self {
        CronSchedule::Unknown {
            kind: String::new(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSchedule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kind: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    at: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    at_ms: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    every_ms: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expr: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tz: Option<Value>,
}

impl From<RawSchedule> for CronSchedule {
    fn from(raw: RawSchedule) -> Self {
        let kind = text_of(raw.kind.as_ref()).unwrap_or_default();
        match kind.as_str() {
            "at" => {
                let at = raw
                    .at
                    .as_ref()
                    .or(raw.at_ms.as_ref())
                    .and_then(|v| match v {
                        Value::String(s) if !s.is_empty() => Some(s.clone()),
                        Value::Number(n) => Some(n.to_string()),
                        _ => None,
                    });
                match at {
                    Some(at) => CronSchedule::At { at },
                    None => CronSchedule::Unknown { kind },
                }
            }
            "every" => match raw.every_ms.as_ref().and_then(millis_of) {
                Some(ms) if ms >= 0 => CronSchedule::Every {
                    every_ms: ms as u64,
                },
                _ => CronSchedule::Unknown { kind },
            },
            "cron" => match text_of(raw.expr.as_ref()) {
                Some(expr) => CronSchedule::Cron {
                    expr,
                    tz: text_of(raw.tz.as_ref()),
                },
                None => CronSchedule::Unknown { kind },
            },
            _ => CronSchedule::Unknown { kind },
        }
    }
}

impl From<CronSchedule> for RawSchedule {
    fn from(schedule: CronSchedule) -> Self {
        match schedule {
            CronSchedule::At { at } => RawSchedule {
                kind: Some("at".into()),
                at: Some(at.into()),
                ..Default::default()
            },
            CronSchedule::Every { every_ms } => RawSchedule {
                kind: Some("every".into()),
                every_ms: Some(every_ms.into()),
                ..Default::default()
            },
            CronSchedule::Cron { expr, tz } => RawSchedule {
                kind: Some("cron".into()),
                expr: Some(expr.into()),
                tz: tz.map(Value::from),
                ..Default::default()
            },
            CronSchedule::Unknown { kind } => RawSchedule {
                kind: Some(kind.into()),
                ..Default::default()
            },
        }
    }
}

/// What a job does when it runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawPayload", into = "RawPayload")]
pub enum CronPayload {
    /// An agent invocation with a text prompt.
    AgentTurn {
        message: String,
        model: Option<String>,
    },
    /// A system-level text event.
    SystemEvent { text: String },
    /// Any other payload kind; rendered without a preview.
    Other { kind: String },
}

impl Default for CronPayload {
    fn default() -> Self {
        CronPayload::Other {
            kind: String::new(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RawPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kind: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    model: Option<Value>,
}

impl From<RawPayload> for CronPayload {
    fn from(raw: RawPayload) -> Self {
        let kind = text_of(raw.kind.as_ref()).unwrap_or_default();
        match kind.as_str() {
            "agentTurn" => CronPayload::AgentTurn {
                message: text_of(raw.message.as_ref()).unwrap_or_default(),
                model: text_of(raw.model.as_ref()),
            },
            "systemEvent" => CronPayload::SystemEvent {
                text: text_of(raw.text.as_ref()).unwrap_or_default(),
            },
            _ => CronPayload::Other { kind },
        }
    }
}

impl From<CronPayload> for RawPayload {
    fn from(payload: CronPayload) -> Self {
        match payload {
            CronPayload::AgentTurn { message, model } => RawPayload {
                kind: Some("agentTurn".into()),
                message: Some(message.into()),
                model: model.map(Value::from),
                ..Default::default()
            },
            CronPayload::SystemEvent { text } => RawPayload {
                kind: Some("systemEvent".into()),
                text: Some(text.into()),
                ..Default::default()
            },
            CronPayload::Other { kind } => RawPayload {
                kind: Some(kind.into()),
                ..Default::default()
            },
        }
    }
}

/// Where a job's output is announced after it runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawDelivery", into = "RawDelivery")]
pub enum CronDelivery {
    /// Mode `"none"`: nothing is broadcast.
    None,
    /// Broadcast to a channel/recipient.
    Announce {
        mode: String,
        channel: Option<String>,
        to: Option<String>,
    },
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RawDelivery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mode: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    channel: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    to: Option<Value>,
}

impl From<RawDelivery> for CronDelivery {
    fn from(raw: RawDelivery) -> Self {
        let mode = text_of(raw.mode.as_ref()).unwrap_or_else(|| "announce".to_string());
        if mode == "none" {
            return CronDelivery::None;
        }
        CronDelivery::Announce {
            mode,
            channel: text_of(raw.channel.as_ref()),
            to: text_of(raw.to.as_ref()),
        }
    }
}

impl From<CronDelivery> for RawDelivery {
    fn from(delivery: CronDelivery) -> Self {
        match delivery {
            CronDelivery::None => RawDelivery {
                mode: Some("none".into()),
                ..Default::default()
            },
            CronDelivery::Announce { mode, channel, to } => RawDelivery {
                mode: Some(mode.into()),
                channel: channel.map(Value::from),
                to: to.map(Value::from),
            },
        }
    }
}

/// Outcome of the most recent run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RunStatus {
    Ok,
    Error,
    Skipped,
    Other(String),
}

impl RunStatus {
    pub fn as_str(&self) -> &str {
        match self {
            RunStatus::Ok => "ok",
            RunStatus::Error => "error",
            RunStatus::Skipped => "skipped",
            RunStatus::Other(s) => s,
        }
    }
}

impl From<String> for RunStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "ok" => RunStatus::Ok,
            "error" => RunStatus::Error,
            "skipped" => RunStatus::Skipped,
            _ => RunStatus::Other(s),
        }
    }
}

impl From<RunStatus> for String {
    fn from(status: RunStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Run status snapshot. Timestamps are unix millis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CronJobState {
    /// Set while the job is executing.
    #[serde(default, deserialize_with = "lenient_millis", skip_serializing_if = "Option::is_none")]
    pub running_at_ms: Option<i64>,
    #[serde(default, deserialize_with = "lenient_millis", skip_serializing_if = "Option::is_none")]
    pub last_run_at_ms: Option<i64>,
    #[serde(default, deserialize_with = "lenient_status", skip_serializing_if = "Option::is_none")]
    pub last_status: Option<RunStatus>,
    #[serde(default, deserialize_with = "lenient_millis", skip_serializing_if = "Option::is_none")]
    pub last_duration_ms: Option<i64>,
    #[serde(default, deserialize_with = "lenient_millis", skip_serializing_if = "Option::is_none")]
    pub next_run_at_ms: Option<i64>,
}

fn lenient_millis<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(millis_of))
}

fn lenient_status<'de, D>(deserializer: D) -> Result<Option<RunStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(text_of(value.as_ref()).map(RunStatus::from))
}

/// `null` or a value of the wrong shape decodes as `T::default()`.
fn lenient_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Strings as-is, numbers as decimal text, anything else empty.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(text_of(value.as_ref()))
}

/// Truthiness of a present `enabled` value; `null` counts as disabled.
fn lenient_enabled<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
        Some(Value::Null) | None => false,
    })
}

/// Integer or finite float millis; anything else is treated as absent.
fn millis_of(value: &Value) -> Option<i64> {
    if let Some(ms) = value.as_i64() {
        return Some(ms);
    }
    value
        .as_f64()
        .filter(|f| f.is_finite() && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
        .map(|f| f as i64)
}

/// Non-empty string value.
fn text_of(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

// ──────────────────── Command Types ────────────────────

/// Reply handed back to the caller for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyPayload {
    /// Reply text.
    pub text: String,
    /// Whether the reply reports a failure.
    #[serde(default)]
    pub is_error: bool,
}

impl ReplyPayload {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

/// The inbound command as seen by a command handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandContext {
    /// Raw command text (e.g. "/cron").
    pub command_body: String,
    /// External sender identifier, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<String>,
    /// Computed upstream; handlers only branch on it.
    #[serde(default)]
    pub is_authorized_sender: bool,
}

/// Result of a handled command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutcome {
    /// Whether the pipeline should keep processing the message.
    pub should_continue: bool,
    /// Reply to deliver, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<ReplyPayload>,
}

impl CommandOutcome {
    /// Stop processing without replying.
    pub fn stop() -> Self {
        Self {
            should_continue: false,
            reply: None,
        }
    }

    /// Stop processing and deliver `reply`.
    pub fn reply(reply: ReplyPayload) -> Self {
        Self {
            should_continue: false,
            reply: Some(reply),
        }
    }
}
