//! Interrupt handling for the removal phase (SIGINT/SIGTERM)
//!
//! On the first signal the removal loop finishes the path it is working on
//! and stops, reporting how far it got. A second signal exits immediately.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

/// Exit code for interrupted runs (128 + SIGINT)
pub const EXIT_CODE_INTERRUPTED: u8 = 130;

/// Shared interrupt state
#[derive(Debug, Default)]
pub struct SignalState {
    /// First signal received
    cancel_requested: AtomicBool,
    /// Second signal received
    immediate_exit: AtomicBool,
    /// Signals received so far
    signal_count: AtomicU8,
}

impl SignalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if cancellation has been requested
    pub fn is_cancel_requested(&self) -> bool {
        self.cancel_requested.load(Ordering::SeqCst)
    }

    /// Check if immediate exit has been requested
    pub fn is_immediate_exit(&self) -> bool {
        self.immediate_exit.load(Ordering::SeqCst)
    }

    pub fn signal_count(&self) -> u8 {
        self.signal_count.load(Ordering::SeqCst)
    }

    /// Record a signal and return what to do about it
    pub fn handle_signal(&self) -> SignalAction {
        let count = self.signal_count.fetch_add(1, Ordering::SeqCst);
        match count {
            0 => {
                self.cancel_requested.store(true, Ordering::SeqCst);
                SignalAction::StopAfterCurrent
            }
            1 => {
                self.immediate_exit.store(true, Ordering::SeqCst);
                SignalAction::ImmediateExit
            }
            _ => SignalAction::Ignore,
        }
    }
}

/// Action to take after receiving a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    /// Finish the removal in progress, then stop
    StopAfterCurrent,
    /// Exit the process now
    ImmediateExit,
    /// Third+ signal
    Ignore,
}

/// Installs the process-wide handler
pub struct SignalHandler {
    state: Arc<SignalState>,
}

impl SignalHandler {
    pub fn new() -> Self {
        Self {
            state: Arc::new(SignalState::new()),
        }
    }

    pub fn state(&self) -> Arc<SignalState> {
        Arc::clone(&self.state)
    }

    /// Install handlers for SIGINT and SIGTERM. Call once at startup.
    pub fn install(&self) -> Result<(), ctrlc::Error> {
        let state = Arc::clone(&self.state);
        ctrlc::set_handler(move || match state.handle_signal() {
            SignalAction::StopAfterCurrent => {
                tracing::warn!("interrupt received, stopping after the current removal");
            }
            SignalAction::ImmediateExit => {
                eprintln!("\nReceived second interrupt, exiting immediately");
                std::process::exit(i32::from(EXIT_CODE_INTERRUPTED));
            }
            SignalAction::Ignore => {}
        })
    }
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}
