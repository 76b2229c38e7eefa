use std::io::Write;

use anyhow::Result;
use tracing::info;

use cronview_commands::{CronJobsCommand, job_source_from_config};
use cronview_config::CronViewConfig;
use cronview_types::{CommandContext, CommandOutcome};

/// One simulated chat command.
pub struct CommandRequest {
    pub text: String,
    pub sender: Option<String>,
    pub authorized: bool,
    pub allow_text_commands: bool,
}

/// Run the `/cron` handler once against the configured source.
pub async fn run_command(
    config: &CronViewConfig,
    request: CommandRequest,
) -> Result<Option<CommandOutcome>> {
    let handler = CronJobsCommand::new(job_source_from_config(config));

    let ctx = CommandContext {
        command_body: request.text,
        sender_id: request.sender,
        is_authorized_sender: request.authorized,
    };

    Ok(handler.handle(&ctx, request.allow_text_commands).await)
}

/// Write the reply text, if any. Returns whether the reply is an error.
pub fn print_outcome(outcome: Option<&CommandOutcome>, out: &mut impl Write) -> Result<bool> {
    let Some(outcome) = outcome else {
        info!("Not a cron command, nothing to do");
        return Ok(false);
    };
    match &outcome.reply {
        Some(reply) => {
            writeln!(out, "{}", reply.text)?;
            Ok(reply.is_error)
        }
        None => {
            info!("Command handled without a reply");
            Ok(false)
        }
    }
}
