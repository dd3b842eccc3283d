//! Terminal rendering of lock events

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use passlock_core::{Denial, LockError, LockListener};

/// How an interactive session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Succeeded,
    Cancelled,
}

/// Prints lock events and tracks when the session is over
#[derive(Debug, Default)]
pub struct ConsoleListener {
    entered: AtomicUsize,
    succeeded: AtomicBool,
    cancelled: AtomicBool,
    prompt_stale: AtomicBool,
}

impl ConsoleListener {
    pub fn new() -> Self {
        Self {
            prompt_stale: AtomicBool::new(true),
            ..Default::default()
        }
    }

    /// The session outcome, once there is one
    pub fn end(&self) -> Option<SessionEnd> {
        if self.succeeded.load(Ordering::SeqCst) {
            Some(SessionEnd::Succeeded)
        } else if self.cancelled.load(Ordering::SeqCst) {
            Some(SessionEnd::Cancelled)
        } else {
            None
        }
    }

    /// Whether the prompt must be printed again; clears the flag
    pub fn take_prompt_stale(&self) -> bool {
        self.prompt_stale.swap(false, Ordering::SeqCst)
    }

    fn render_dots(&self) {
        let n = self.entered.load(Ordering::SeqCst);
        println!("[{}]", "*".repeat(n));
    }
}

impl LockListener for ConsoleListener {
    fn on_sign_added(&self, index: usize) {
        self.entered.store(index + 1, Ordering::SeqCst);
        self.render_dots();
    }

    fn on_sign_removed(&self, index: usize) {
        self.entered.store(index, Ordering::SeqCst);
        self.render_dots();
    }

    fn on_success(&self) {
        self.entered.store(0, Ordering::SeqCst);
        self.succeeded.store(true, Ordering::SeqCst);
    }

    fn on_failure(&self, denial: Denial) {
        self.entered.store(0, Ordering::SeqCst);
        match denial {
            Denial::Mismatch { attempts } => {
                println!("Wrong passcode ({} incorrect)", attempts)
            }
            Denial::ConfirmationMismatch => println!("Passcodes did not match, start over"),
            Denial::ConfirmationRequired => {
                println!("Type ? to confirm the reset")
            }
        }
    }

    fn on_mode_changed(&self) {
        self.entered.store(0, Ordering::SeqCst);
        self.prompt_stale.store(true, Ordering::SeqCst);
    }

    fn on_lockout_threshold_reached(&self) {
        println!("Too many incorrect attempts");
    }

    fn on_error(&self, error: &LockError) {
        self.entered.store(0, Ordering::SeqCst);
        eprintln!("Error: {}", error);
    }

    fn on_cancelled(&self) {
        self.entered.store(0, Ordering::SeqCst);
        self.cancelled.store(true, Ordering::SeqCst);
    }

    fn on_biometric_failed(&self, error: &LockError) {
        println!("{}; enter your passcode instead", error);
    }
}
