//! Export command handler.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;

use tgrelay::export::{default_file_name, export_to_path, ExportMeta};

use super::common::{expand_tilde, RelayContext};

/// Write successfully forwarded messages to a CSV file.
pub(crate) async fn cmd_export(output: Option<PathBuf>) -> Result<()> {
    let ctx = RelayContext::open().await?;
    let now = Utc::now();
    let path = output
        .map(|p| expand_tilde(&p.to_string_lossy()))
        .unwrap_or_else(|| PathBuf::from(default_file_name(now)));

    let job = ctx.engine.job_config();
    let meta = ExportMeta {
        bot_token: ctx.config.telegram.bot_token.clone(),
        source_chat: job.source_chat.to_string(),
        target_chat: job.target_chat.to_string(),
        start_message_id: job.start_message_id,
        exported_at: now,
    };

    let rows = export_to_path(&path, &meta, ctx.engine.results())
        .with_context(|| format!("Failed to write {}", path.display()))?;

    if rows == 0 {
        println!("No successfully forwarded messages; wrote header only.");
    }
    println!("Exported {} message(s) to {}", rows, path.display());
    Ok(())
}
