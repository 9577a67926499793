// SPDX-License-Identifier: GPL-3.0-only

//! Thread lifecycle management for the pipeline worker loops
//!
//! Capture, processing and preview all run the same shape: a named thread
//! polling a stop flag between iterations. Shutdown is best-effort: a
//! worker that misses its join deadline is logged and leaked rather than
//! blocking the kiosk.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Action returned by the loop callback to control loop behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    /// Continue running the loop
    Continue,
    /// Stop the loop gracefully
    Stop,
}

/// Controller for a worker loop running in a separate thread
pub struct LoopController {
    /// Thread handle for joining
    thread_handle: Option<JoinHandle<()>>,
    /// Signal to stop the loop
    stop_signal: Arc<AtomicBool>,
    /// Name for logging
    name: String,
}

impl LoopController {
    /// Start a new worker loop in a separate thread
    ///
    /// The closure is called repeatedly until it returns `LoopAction::Stop`
    /// or `request_stop` is called. The stop flag is checked before every
    /// iteration, so the closure must not block unboundedly.
    pub fn start<F>(name: &str, mut loop_fn: F) -> Self
    where
        F: FnMut() -> LoopAction + Send + 'static,
    {
        Self::start_with_init(name, || Ok(()), move |_: &mut ()| loop_fn())
    }

    /// Start a worker loop with thread-owned state
    ///
    /// `init_fn` runs once on the new thread to set up resources that must
    /// live and die there (device handles, streams). If it fails the thread
    /// exits immediately. The state is dropped on the worker thread when
    /// the loop ends, which is where device release happens.
    pub fn start_with_init<S, I, F>(name: &str, init_fn: I, mut loop_fn: F) -> Self
    where
        S: 'static,
        I: FnOnce() -> Result<S, String> + Send + 'static,
        F: FnMut(&mut S) -> LoopAction + Send + 'static,
    {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let stop_signal_clone = Arc::clone(&stop_signal);
        let name_clone = name.to_string();

        info!(name = %name, "Starting worker loop");

        let thread_handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                debug!(name = %name_clone, "Worker thread started");

                let mut state = match init_fn() {
                    Ok(s) => s,
                    Err(e) => {
                        warn!(name = %name_clone, error = %e, "Worker initialization failed");
                        return;
                    }
                };

                loop {
                    if stop_signal_clone.load(Ordering::SeqCst) {
                        debug!(name = %name_clone, "Stop signal received");
                        break;
                    }

                    match loop_fn(&mut state) {
                        LoopAction::Continue => {}
                        LoopAction::Stop => {
                            debug!(name = %name_clone, "Loop requested stop");
                            break;
                        }
                    }
                }

                info!(name = %name_clone, "Worker thread exiting");
            })
            .unwrap_or_else(|e| {
                // Spawn only fails when the OS is out of threads; the
                // kiosk cannot run at all in that state.
                panic!("failed to spawn worker thread: {}", e)
            });

        Self {
            thread_handle: Some(thread_handle),
            stop_signal,
            name: name.to_string(),
        }
    }

    /// Check if the loop is still running
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Signal the loop to stop (non-blocking)
    pub fn request_stop(&self) {
        debug!(name = %self.name, "Requesting worker loop stop");
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Stop the loop and wait up to `timeout` for the thread to finish
    ///
    /// A thread still alive at the deadline is leaked with a warning; it
    /// will exit on its next stop-flag check, it just no longer blocks
    /// shutdown.
    pub fn stop_with_timeout(&mut self, timeout: Duration) {
        self.request_stop();
        self.join_timeout(timeout);
    }

    /// Wait up to `timeout` for the thread without sending a stop signal
    pub fn join_timeout(&mut self, timeout: Duration) {
        let Some(handle) = self.thread_handle.take() else {
            return;
        };

        let deadline = Instant::now() + timeout;
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                warn!(
                    name = %self.name,
                    timeout_ms = timeout.as_millis() as u64,
                    "Worker thread did not stop in time, leaking it"
                );
                return;
            }
            thread::sleep(Duration::from_millis(5));
        }

        if let Err(e) = handle.join() {
            warn!(name = %self.name, "Worker thread panicked: {:?}", e);
        } else {
            debug!(name = %self.name, "Worker thread finished");
        }
    }

    /// Wait for the thread to finish without a deadline
    ///
    /// Useful in tests when the loop stops itself via `LoopAction::Stop`.
    pub fn join(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            if let Err(e) = handle.join() {
                warn!(name = %self.name, "Worker thread panicked: {:?}", e);
            }
        }
    }
}

impl Drop for LoopController {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            debug!(name = %self.name, "LoopController dropped, stopping loop");
            self.stop_with_timeout(Duration::from_secs(2));
        }
    }
}
