//! Cooperative shutdown on SIGINT/SIGTERM.
//!
//! Instead of force-exiting from a signal handler, the handler only records
//! that a signal arrived; the serve loop polls the flag between requests and
//! returns, letting `main` unwind normally so the staging directory guard
//! gets to remove the tree.

use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

static SIGNALED: AtomicBool = AtomicBool::new(false);

extern "C" fn record_signal(_signal: libc::c_int) {
    SIGNALED.store(true, Ordering::SeqCst);
}

/// Shared flag polled by long-running loops to decide when to stop.
#[derive(Clone, Default)]
pub struct ShutdownFlag {
    requested: Arc<AtomicBool>,
}

impl ShutdownFlag {
    /// A flag that only triggers via [`ShutdownFlag::trigger`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Install SIGINT and SIGTERM handlers and return a flag they trip.
    pub fn install() -> Result<Self> {
        for signal in [libc::SIGINT, libc::SIGTERM] {
            // SAFETY: the handler only stores to an atomic, which is
            // async-signal-safe; the sigaction struct is fully initialized
            // before registration.
            let rc = unsafe {
                let mut action: libc::sigaction = std::mem::zeroed();
                libc::sigemptyset(&mut action.sa_mask);
                // SA_RESTART keeps a signal from surfacing as EINTR in the
                // server's blocking accept; shutdown goes through the flag.
                action.sa_flags = libc::SA_RESTART;
                action.sa_sigaction =
                    record_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
                libc::sigaction(signal, &action, std::ptr::null_mut())
            };
            if rc != 0 {
                return Err(std::io::Error::last_os_error())
                    .with_context(|| format!("installing handler for signal {signal}"));
            }
        }
        Ok(Self::new())
    }

    /// True once a signal has arrived or [`ShutdownFlag::trigger`] was called.
    pub fn is_triggered(&self) -> bool {
        SIGNALED.load(Ordering::SeqCst) || self.requested.load(Ordering::SeqCst)
    }

    /// Request shutdown programmatically.
    pub fn trigger(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }
}
