// SPDX-License-Identifier: GPL-3.0-only

//! Capture source backends
//!
//! A capture source produces raw sensor-orientation frames. The real
//! backend talks V4L2; the synthetic backend generates deterministic
//! frames for tests and for running the kiosk logic without hardware.

pub mod synthetic;
pub mod v4l2;

pub use synthetic::SyntheticSource;
pub use v4l2::V4l2Source;

use crate::constants::camera;
use crate::errors::BoothResult;
use crate::pipeline::frame::Frame;
use tracing::{debug, info};

/// A device producing raw frames
///
/// Implementations follow the same open protocol: open the device, wait
/// out the auto-exposure settle delay, then read one probe frame. Only a
/// successful probe counts as open; any failure leaves the device
/// released.
pub trait CaptureSource: Send {
    /// Open the device, settle, and probe one frame
    fn open(&mut self) -> BoothResult<()>;

    /// Read the next frame (raw sensor orientation)
    fn read(&mut self) -> BoothResult<Frame>;

    /// Release the device. Idempotent; safe to call when never opened.
    fn release(&mut self);

    /// True between a successful `open` and `release`
    fn is_open(&self) -> bool;

    /// Human-readable source name for logging
    fn name(&self) -> String;
}

/// Scan camera ports and return those that pass the open/probe protocol
///
/// Each candidate is released again immediately; this only answers "which
/// ports have a working camera right now".
pub fn scan_ports() -> Vec<usize> {
    let mut working = Vec::new();

    for port in 0..camera::MAX_SCAN_PORTS {
        let mut source = V4l2Source::new(port);
        match source.open() {
            Ok(()) => {
                info!(port, "Camera responded to probe");
                source.release();
                working.push(port);
            }
            Err(e) => {
                debug!(port, error = %e, "No camera on port");
            }
        }
    }

    working
}
