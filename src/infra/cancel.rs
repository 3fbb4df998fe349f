// ============================================================
// Layer 6: Cancellation
// ============================================================
// Bridges Ctrl+C into a flag the supervisor polls between
// iterations.
//
//   first Ctrl+C   → token cancelled, loop stops after the
//                    current iteration and saves
//   second Ctrl+C  → process exits immediately (code 130)

use anyhow::{Context, Result};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Exit code for a process terminated by SIGINT.
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Cloneable stop flag shared between a signal handler and the loop.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Install a process-wide Ctrl+C handler driving a fresh token.
///
/// Can be called once per process.
pub fn cancel_on_interrupt() -> Result<CancellationToken> {
    let token = CancellationToken::new();
    let handler_token = token.clone();

    ctrlc::set_handler(move || {
        if handler_token.is_cancelled() {
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
        handler_token.cancel();
        println!("\nCaught interrupt. Ctrl+C again to terminate.");
    })
    .context("Failed to install the Ctrl+C handler")?;

    Ok(token)
}
