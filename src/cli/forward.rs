//! Forward command handler: runs the job and renders its progress.
//!
//! Ctrl-C counts as leaving the forwarding view: a running job is paused at
//! the next safe point and can be continued with `tgrelay forward --resume`.

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{mpsc, watch};

use tgrelay::error::JobError;
use tgrelay::forward::{ForwardEvent, JobStatus, RunOutcome};
use tgrelay::lifecycle::SessionLifecycle;

use super::common::RelayContext;

/// Start (or resume) forwarding and block until the job pauses or completes.
pub(crate) async fn cmd_forward(resume: bool) -> Result<()> {
    let RelayContext { mut engine, .. } = RelayContext::open().await?;

    let paused = engine.status() == JobStatus::Paused;
    if !resume && !paused && !engine.job_config().setup_completed {
        anyhow::bail!(
            "No chats configured. Run `tgrelay setup --source <id> --target <id>` first."
        );
    }

    let control = engine.control();
    let interrupt = {
        let control = Arc::clone(&control);
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if SessionLifecycle::leave_view(&control) {
                    eprintln!();
                    eprintln!("Pausing after the current message...");
                }
            }
        })
    };
    let renderer = tokio::spawn(render(engine.subscribe_events(), engine.status_line()));

    let outcome = if resume || paused {
        engine.resume().await
    } else {
        let job = engine.job_config().clone();
        engine.start(job).await
    };

    interrupt.abort();
    // Closes the event channel so the renderer drains and exits.
    drop(engine);
    let _ = renderer.await;
    println!();

    match outcome.map_err(report)? {
        RunOutcome::Paused { at } => {
            println!("Paused at message {}.", at);
            println!("Run `tgrelay forward --resume` to continue.");
        }
        RunOutcome::Completed(summary) => {
            println!("Forwarding completed: {}", summary);
        }
    }
    Ok(())
}

/// User-facing job errors are reported as-is; anything else gets context.
fn report(err: JobError) -> anyhow::Error {
    if err.is_user_facing() {
        anyhow::Error::new(err)
    } else {
        anyhow::Error::new(err).context("Forwarding stopped unexpectedly")
    }
}

async fn render(
    mut events: mpsc::UnboundedReceiver<ForwardEvent>,
    mut status: watch::Receiver<Option<String>>,
) {
    let mut status_open = true;
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => render_event(&event),
                None => break,
            },
            changed = status.changed(), if status_open => {
                if changed.is_err() {
                    status_open = false;
                    continue;
                }
                if let Some(line) = status.borrow_and_update().clone() {
                    overwrite_line(&line);
                }
            }
        }
    }
}

fn render_event(event: &ForwardEvent) {
    match event {
        ForwardEvent::Started {
            anchor_message_id,
            range_start,
            range_end,
        } => {
            if range_end < range_start {
                println!("Anchor message {} sent; nothing to forward.", anchor_message_id);
            } else {
                println!(
                    "Anchor message {} sent; forwarding messages {}..={}",
                    anchor_message_id, range_start, range_end
                );
            }
        }
        ForwardEvent::Resumed { from } => {
            println!("Resuming from message {}", from);
        }
        ForwardEvent::Forwarded { .. } => {}
        ForwardEvent::Failed {
            original_id,
            kind,
            error,
        } => {
            println!();
            println!("  message {} ({}): {}", original_id, kind, error);
        }
        ForwardEvent::Throttled {
            message_id,
            retry_after_seconds,
        } => {
            println!();
            println!(
                "  rate limited at message {}, waiting {}s",
                message_id, retry_after_seconds
            );
        }
        ForwardEvent::Countdown { remaining_seconds } => {
            overwrite_line(&format!("Retrying in {}s...", remaining_seconds));
        }
        ForwardEvent::Paused { .. } | ForwardEvent::Completed(_) => {}
    }
}

fn overwrite_line(line: &str) {
    let mut out = std::io::stdout().lock();
    let _ = write!(out, "\r{:<78}", line);
    let _ = out.flush();
}
