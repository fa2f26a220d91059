use crate::error::{PlistPngError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Counts Ctrl+C presses. The pipeline polls it between source files; the
/// second press exits immediately with status 130.
pub struct GracefulShutdown {
    interrupts: Arc<AtomicUsize>,
}

impl GracefulShutdown {
    pub fn new() -> Result<Self> {
        let interrupts = Arc::new(AtomicUsize::new(0));
        let handler_interrupts = Arc::clone(&interrupts);

        ctrlc::set_handler(move || {
            if handler_interrupts.fetch_add(1, Ordering::SeqCst) == 0 {
                eprintln!("\n🛑 Finishing the current file and cleaning up... (press Ctrl+C again to force exit)");
            } else {
                eprintln!("\n💀 Force stopping...");
                std::process::exit(130);
            }
        })
        .map_err(|e| PlistPngError::Config {
            message: format!("Failed to set signal handler: {}", e),
        })?;

        Ok(Self { interrupts })
    }

    /// No handler is registered, so tests can build as many as they like.
    pub fn new_for_test() -> Self {
        Self {
            interrupts: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.interrupts.load(Ordering::SeqCst) == 0
    }

    pub fn check_shutdown(&self) -> Result<()> {
        if self.is_running() {
            Ok(())
        } else {
            Err(PlistPngError::Cancelled)
        }
    }

    /// Behaves like a first Ctrl+C press.
    pub fn request_shutdown(&self) {
        let _ = self
            .interrupts
            .compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst);
    }

    pub fn reset(&self) {
        self.interrupts.store(0, Ordering::SeqCst);
    }
}

impl Default for GracefulShutdown {
    fn default() -> Self {
        // Only one handler can be registered per process.
        Self::new().unwrap_or_else(|_| Self::new_for_test())
    }
}
