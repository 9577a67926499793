// SPDX-License-Identifier: GPL-3.0-only

//! Real-time capture pipeline
//!
//! Three worker loops connected by bounded queues:
//!
//! ```text
//! capture ──(raw, cap 30)──▶ processing ──▶ FrameBuffer + sink
//!                                │
//!                                └─(raw, cap 2)──▶ preview ──▶ sink
//! ```
//!
//! Every queue drops the newest frame when full; a stale preview is worse
//! than a skipped one. All loops poll a stop flag, so shutdown never waits
//! on a frame that is not coming.

pub mod frame;
pub mod frame_buffer;
pub mod loop_controller;

pub use frame::Frame;
pub use frame_buffer::FrameBuffer;
pub use loop_controller::{LoopAction, LoopController};

use crate::backends::CaptureSource;
use crate::constants::pipeline as consts;
use crate::errors::{BoothResult, CameraError};
use crate::pipeline::frame::{orient_capture, orient_preview};
use std::sync::Arc;
use std::sync::mpsc::{RecvTimeoutError, TrySendError, sync_channel};
use std::thread;
use tracing::{debug, info, trace, warn};

/// Receiver of processed frames, implemented by whatever renders the booth
/// screen. Callbacks run on pipeline worker threads and must not block.
pub trait DisplaySink: Send + Sync {
    /// A capture-oriented frame was processed (portrait, full sensor area)
    fn on_frame(&self, frame: &Frame) {
        let _ = frame;
    }

    /// A preview-oriented frame is ready (portrait, 9:16 crop)
    fn on_preview_frame(&self, frame: &Frame) {
        let _ = frame;
    }
}

/// Running capture pipeline
///
/// Owns its three worker loops and the shared frame buffer. There is no
/// restart: shutdown consumes the pipeline, a new session builds a fresh
/// one with empty queues and an empty buffer.
pub struct Pipeline {
    frame_buffer: Arc<FrameBuffer>,
    capture_loop: LoopController,
    processing_loop: LoopController,
    preview_loop: LoopController,
}

impl Pipeline {
    /// Start the pipeline over an already-open capture source
    ///
    /// The source moves onto the capture thread and is released there when
    /// the loop exits. Rejects a source that is not open; the open protocol
    /// (settle + probe) is the caller's job so open failures surface
    /// synchronously.
    pub fn start(
        source: Box<dyn CaptureSource>,
        buffer_depth: usize,
        sink: Option<Arc<dyn DisplaySink>>,
    ) -> BoothResult<Self> {
        if !source.is_open() {
            warn!(source = %source.name(), "Refusing to start pipeline over a closed source");
            return Err(CameraError::NotOpen.into());
        }

        info!(source = %source.name(), buffer_depth, "Starting capture pipeline");

        let frame_buffer = Arc::new(FrameBuffer::new(buffer_depth));

        let (capture_tx, capture_rx) = sync_channel::<Frame>(consts::CAPTURE_QUEUE_CAPACITY);
        let (preview_tx, preview_rx) = sync_channel::<Frame>(consts::PREVIEW_QUEUE_CAPACITY);

        let capture_loop = LoopController::start_with_init(
            "booth-capture",
            move || Ok(source),
            move |source| {
                match source.read() {
                    Ok(frame) => {
                        match capture_tx.try_send(frame) {
                            Ok(()) => {}
                            Err(TrySendError::Full(_)) => {
                                trace!("Capture queue full, dropping frame");
                            }
                            Err(TrySendError::Disconnected(_)) => {
                                debug!("Processing side gone, capture loop stopping");
                                return LoopAction::Stop;
                            }
                        }
                    }
                    Err(e) => {
                        // Transient read failures are expected (device
                        // timing, USB hiccups); keep the loop alive
                        debug!(error = %e, "Frame read failed");
                    }
                }
                thread::sleep(consts::CAPTURE_LOOP_DELAY);
                LoopAction::Continue
            },
        );

        let buffer_for_processing = Arc::clone(&frame_buffer);
        let sink_for_processing = sink.clone();
        let processing_loop = LoopController::start("booth-processing", move || {
            match capture_rx.recv_timeout(consts::QUEUE_RECV_TIMEOUT) {
                Ok(raw) => {
                    // Preview works from the raw sensor frame; forward a
                    // copy before orienting for capture
                    match preview_tx.try_send(raw.clone()) {
                        Ok(()) | Err(TrySendError::Full(_)) => {}
                        Err(TrySendError::Disconnected(_)) => {
                            debug!("Preview side gone");
                        }
                    }

                    let oriented = orient_capture(raw);
                    if let Some(sink) = &sink_for_processing {
                        sink.on_frame(&oriented);
                    }
                    buffer_for_processing.push(oriented);
                    LoopAction::Continue
                }
                Err(RecvTimeoutError::Timeout) => LoopAction::Continue,
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("Capture side gone, processing loop stopping");
                    LoopAction::Stop
                }
            }
        });

        let sink_for_preview = sink;
        let preview_loop = LoopController::start("booth-preview", move || {
            match preview_rx.recv_timeout(consts::QUEUE_RECV_TIMEOUT) {
                Ok(raw) => {
                    let preview = orient_preview(raw);
                    if let Some(sink) = &sink_for_preview {
                        sink.on_preview_frame(&preview);
                    }
                    LoopAction::Continue
                }
                Err(RecvTimeoutError::Timeout) => LoopAction::Continue,
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("Processing side gone, preview loop stopping");
                    LoopAction::Stop
                }
            }
        });

        Ok(Self {
            frame_buffer,
            capture_loop,
            processing_loop,
            preview_loop,
        })
    }

    /// Shared handle to the processed-frame buffer
    pub fn frame_buffer(&self) -> Arc<FrameBuffer> {
        Arc::clone(&self.frame_buffer)
    }

    /// True while any worker loop is alive
    pub fn is_running(&self) -> bool {
        self.capture_loop.is_running()
            || self.processing_loop.is_running()
            || self.preview_loop.is_running()
    }

    /// Stop all loops and wait (bounded) for them to finish
    ///
    /// Consumes the pipeline; the capture source is released on its own
    /// thread as the capture loop unwinds.
    pub fn shutdown(mut self) {
        info!("Shutting down capture pipeline");

        // Flag everything first so the loops stop concurrently
        self.capture_loop.request_stop();
        self.processing_loop.request_stop();
        self.preview_loop.request_stop();

        self.capture_loop.join_timeout(consts::THREAD_JOIN_TIMEOUT);
        self.processing_loop.join_timeout(consts::THREAD_JOIN_TIMEOUT);
        self.preview_loop.join_timeout(consts::THREAD_JOIN_TIMEOUT);

        if self.is_running() {
            warn!("Pipeline shutdown left a worker running");
        }
    }
}
