//! Setup command handler.

use anyhow::{Context, Result};

use tgrelay::forward::JobStatus;
use tgrelay::lifecycle::SetupDraft;

use super::common::{mask_token, RelayContext};

/// Validate both chats against the Bot API and persist the job setup.
pub(crate) async fn cmd_setup(
    source: String,
    target: String,
    start: u64,
    keep_originals: bool,
) -> Result<()> {
    let mut ctx = RelayContext::open().await?;

    if ctx.engine.status() == JobStatus::Paused {
        anyhow::bail!(
            "A forwarding job is paused at message {}. Resume it with `tgrelay forward --resume` \
             or discard it with `tgrelay reset` first.",
            ctx.engine.run_state().current_message_id.unwrap_or_default()
        );
    }

    let draft = SetupDraft {
        source_chat: source,
        target_chat: target,
        start_message_id: start,
        delete_original_after_forward: !keep_originals,
    };

    println!("Validating chats with bot {}...", mask_token(&ctx.config.telegram.bot_token));
    let job = ctx
        .lifecycle
        .complete_setup(
            ctx.transport.as_ref(),
            &ctx.config.telegram.bot_token,
            draft,
            &mut ctx.engine,
        )
        .await
        .with_context(|| "Setup failed")?;

    println!();
    println!("Setup saved");
    println!("  Source chat:      {}", job.source_chat);
    println!("  Target chat:      {}", job.target_chat);
    println!("  First message id: {}", job.range_start());
    println!(
        "  Originals:        {}",
        if job.delete_original_after_forward {
            "deleted after forwarding"
        } else {
            "kept"
        }
    );
    println!();
    println!("Run `tgrelay forward` to start.");
    Ok(())
}
