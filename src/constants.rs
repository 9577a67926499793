// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Capture pipeline constants
pub mod pipeline {
    use super::Duration;

    /// Raw capture queue depth (absorbs bursts, oldest dropped first)
    pub const CAPTURE_QUEUE_CAPACITY: usize = 30;

    /// Preview queue depth (kept tiny for low latency)
    pub const PREVIEW_QUEUE_CAPACITY: usize = 2;

    /// Sleep between capture loop iterations (~100fps ceiling)
    pub const CAPTURE_LOOP_DELAY: Duration = Duration::from_millis(10);

    /// Blocking receive timeout so consumer loops can poll their stop flag
    pub const QUEUE_RECV_TIMEOUT: Duration = Duration::from_millis(100);

    /// Bounded wait for a worker thread on shutdown before leaking it
    pub const THREAD_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

    /// Frames retained for shutter capture
    pub const DEFAULT_FRAME_BUFFER_DEPTH: usize = 3;
}

/// Camera device constants
pub mod camera {
    use super::Duration;

    /// Sensor auto-exposure settle time after opening a device
    pub const SETTLE_DELAY: Duration = Duration::from_secs(1);

    /// Wait after releasing a device before it may be reopened
    pub const RELEASE_DELAY: Duration = Duration::from_millis(500);

    /// Ports scanned when enumerating cameras (0..MAX_SCAN_PORTS)
    pub const MAX_SCAN_PORTS: usize = 5;

    /// Capture resolution requested from the device
    pub const CAPTURE_WIDTH: u32 = 1280;
    pub const CAPTURE_HEIGHT: u32 = 720;

    /// Number of mmap buffers for the V4L2 stream
    pub const STREAM_BUFFERS: u32 = 4;
}

/// Session flow constants
pub mod session {
    /// JPEG quality for saved shots
    pub const JPEG_QUALITY: u8 = 95;

    /// Ticks after a successful shot before the shutter re-arms and the
    /// idle auto-countdown restarts
    pub const SHUTTER_REARM_TICKS: u32 = 2;

    /// Session folder timestamp format
    pub const FOLDER_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

    /// Length of the public session hash (lowercase hex)
    pub const HASH_LEN: usize = 12;
}

/// Compositing constants
pub mod compositing {
    /// Preview canvas size, same aspect as the final print
    pub const PREVIEW_WIDTH: u32 = 600;
    pub const PREVIEW_HEIGHT: u32 = 900;

    /// Live preview crop aspect before portrait rotation
    pub const PREVIEW_ASPECT: (u32, u32) = (16, 9);

    /// Bounded filter cache size (filtered full-resolution photos)
    pub const FILTER_CACHE_CAPACITY: usize = 64;

    /// Default QR code edge length on the final canvas
    pub const DEFAULT_QR_SIZE: u32 = 100;

    /// Built-in 2x2 slot layout for templates without a sidecar,
    /// in final-canvas coordinates (x, y, width, height)
    pub const FALLBACK_SLOTS: [(u32, u32, u32, u32); 4] = [
        (120, 220, 410, 710),
        (660, 220, 410, 710),
        (120, 1000, 410, 710),
        (660, 1000, 410, 710),
    ];

    /// Built-in QR placement for templates without a sidecar
    pub const FALLBACK_QR_POSITION: (u32, u32) = (1000, 50);
}
