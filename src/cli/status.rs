//! Status and senders command handlers.

use anyhow::Result;

use tgrelay::config::Config;
use tgrelay::forward::JobStatus;
use tgrelay::lifecycle::Mounted;

use super::common::{mask_token, RelayContext};

/// Show setup, run state and result statistics.
pub(crate) async fn cmd_status() -> Result<()> {
    let ctx = RelayContext::open().await?;
    let job = ctx.engine.job_config();
    let run = ctx.engine.run_state();
    let stats = ctx.engine.results().stats();

    println!("tgrelay Status");
    println!("==============");
    println!();
    println!("Config:  {}", Config::path().display());
    println!("Session: {}", ctx.config.storage_dir().display());
    println!("Bot:     {}", mask_token(&ctx.config.telegram.bot_token));
    if matches!(ctx.mounted, Mounted::Fresh) {
        println!("         (new session, no stored progress)");
    }
    println!();

    println!("Setup");
    println!("-----");
    if job.setup_completed {
        println!("  Source chat:      {}", job.source_chat);
        println!("  Target chat:      {}", job.target_chat);
        println!("  First message id: {}", job.range_start());
        println!(
            "  Delete originals: {}",
            if job.delete_original_after_forward {
                "yes"
            } else {
                "no"
            }
        );
    } else {
        println!("  Not configured. Run `tgrelay setup --source <id> --target <id>`.");
    }
    println!();

    println!("Job");
    println!("---");
    println!("  Status:    {}", run.status);
    if run.status != JobStatus::Idle {
        if let Some(anchor) = run.target_anchor_message_id {
            println!("  Anchor:    {}", anchor);
        }
        println!("  Range:     {}..={}", run.range_start, run.range_end);
        println!("  Processed: {}/{}", run.processed_count, run.range_len());
        if run.status == JobStatus::Paused {
            if let Some(next) = run.current_message_id {
                println!("  Next id:   {}", next);
            }
        }
        println!("  Result:    {}", run.summary());
    }
    println!();

    println!("Results");
    println!("-------");
    println!("  Total:      {}", stats.total);
    println!("  Successful: {}", stats.successful);
    println!("  Failed:     {}", stats.failed);
    if let (Some(earliest), Some(latest)) = (stats.earliest, stats.latest) {
        println!(
            "  Dates:      {} .. {}",
            earliest.format("%Y-%m-%d %H:%M"),
            latest.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

/// List distinct original senders with message counts.
pub(crate) async fn cmd_senders() -> Result<()> {
    let ctx = RelayContext::open().await?;
    let senders = ctx.engine.results().unique_senders();

    if senders.is_empty() {
        println!("No forwarded messages yet.");
        return Ok(());
    }

    println!("Senders ({})", senders.len());
    println!();
    for sender in &senders {
        let handle = sender
            .username
            .as_deref()
            .map(|u| format!("@{}", u))
            .unwrap_or_else(|| "--".to_string());
        println!(
            "  {:<28} {:<20} {:<12} {:>5} message(s)",
            sender.name,
            handle,
            sender.origin_type.as_str(),
            sender.message_count
        );
    }
    Ok(())
}
