//! Ctrl-C handling
//!
//! The first interrupt cancels the run at the next step boundary. A second
//! one exits at once, even while a model call is still in flight.

use agent_core::CancelToken;

/// Conventional exit status for SIGINT
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Debug, PartialEq, Eq)]
pub enum Interrupt {
    Cancel,
    Exit,
}

pub struct InterruptHandler {
    cancel: CancelToken,
    seen: usize,
}

impl InterruptHandler {
    pub fn new(cancel: CancelToken) -> Self {
        Self { cancel, seen: 0 }
    }

    pub fn interrupt(&mut self) -> Interrupt {
        self.seen += 1;
        if self.seen == 1 {
            self.cancel.cancel();
            Interrupt::Cancel
        } else {
            Interrupt::Exit
        }
    }
}

/// Listen for Ctrl-C for the rest of the process lifetime.
pub fn spawn_listener(cancel: CancelToken) {
    tokio::spawn(async move {
        let mut handler = InterruptHandler::new(cancel);
        while tokio::signal::ctrl_c().await.is_ok() {
            match handler.interrupt() {
                Interrupt::Cancel => tracing::warn!(
                    "Interrupted, stopping after the current step (Ctrl-C again to quit now)"
                ),
                Interrupt::Exit => {
                    tracing::warn!("Interrupted again, exiting");
                    std::process::exit(INTERRUPTED_EXIT_CODE);
                }
            }
        }
    });
}
