//! Reset and session command handlers.

use anyhow::Result;

use super::common::{unmounted_lifecycle, RelayContext};
use super::SessionAction;

/// Discard job state, results, setup and the remembered bot credential.
pub(crate) async fn cmd_reset() -> Result<()> {
    let mut ctx = RelayContext::open().await?;
    let before = ctx.engine.status();
    ctx.lifecycle.reset_setup(&mut ctx.engine).await;
    println!("Reset complete (job was {}).", before);
    println!("Run `tgrelay setup` to configure a new job.");
    Ok(())
}

/// Manage the progress session.
pub(crate) async fn cmd_session(action: SessionAction) -> Result<()> {
    match action {
        SessionAction::New => {
            unmounted_lifecycle()?.end_session().await;
            println!("Session ended. The next command starts with no stored progress.");
        }
    }
    Ok(())
}
