//! cronview-commands: The `/cron` chat command.
//!
//! Provides:
//! - Leaf formatters for schedules, relative times, status, and previews
//! - Job block rendering and report assembly
//! - The command handler, parameterized over a job source and a log sink
//! - Source selection from config

pub mod format;
pub mod handler;
pub mod log;
pub mod render;
pub mod source;

pub use handler::{COMMAND_ALIASES, CronJobsCommand, is_cron_command, normalize_command_body};
pub use log::{CommandLog, TracingLog};
pub use render::{assemble_report, render_job, render_report};
pub use source::job_source_from_config;
