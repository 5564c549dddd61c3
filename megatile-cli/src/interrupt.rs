//! Scoped Ctrl+C handling.
//!
//! The handler is installed once per process. While a dispatch is running
//! the switch is armed with that dispatch's [`CancellationToken`], and an
//! interrupt cancels it so the coordinator can shut the worker pool down.
//! Outside that window, or on a second interrupt, the process exits with
//! code 130.

use std::process;
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::{CliError, INTERRUPTED_EXIT_CODE};

/// What an interrupt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// The armed token was cancelled.
    Cancelled,
    /// Nothing to cancel; the process should exit.
    Exit,
}

/// Routes Ctrl+C to the dispatch currently in progress, if any.
#[derive(Debug, Clone, Default)]
pub struct InterruptSwitch {
    armed: Arc<Mutex<Option<CancellationToken>>>,
}

impl InterruptSwitch {
    /// A switch that is not connected to any signal handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the process-wide Ctrl+C handler and returns its switch.
    pub fn install() -> Result<Self, CliError> {
        let switch = Self::new();
        let handler = switch.clone();

        ctrlc::set_handler(move || {
            if handler.trip() == Interrupt::Exit {
                eprintln!();
                eprintln!("Interrupted!");
                process::exit(INTERRUPTED_EXIT_CODE);
            }
        })
        .map_err(|e| CliError::SignalHandler(e.to_string()))?;

        Ok(switch)
    }

    /// Arms the switch with `token` until the returned guard is dropped.
    pub fn arm(&self, token: CancellationToken) -> ArmedGuard<'_> {
        *self.lock() = Some(token);
        ArmedGuard { switch: self }
    }

    pub fn is_armed(&self) -> bool {
        self.lock().is_some()
    }

    /// Handles one interrupt.
    pub fn trip(&self) -> Interrupt {
        match self.lock().as_ref() {
            Some(token) if !token.is_cancelled() => {
                info!("Interrupt received, cancelling dispatch");
                token.cancel();
                Interrupt::Cancelled
            }
            _ => Interrupt::Exit,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<CancellationToken>> {
        self.armed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Disarms the switch when dropped.
#[must_use = "the switch is disarmed as soon as the guard is dropped"]
pub struct ArmedGuard<'a> {
    switch: &'a InterruptSwitch,
}

impl Drop for ArmedGuard<'_> {
    fn drop(&mut self) {
        *self.switch.lock() = None;
    }
}
