// SPDX-License-Identifier: GPL-3.0-only

//! Bounded ring of the most recent processed frames
//!
//! The processing loop pushes, the shutter reads. Depth stays small (3 by
//! default) so a shot is always near-live; anything older is worthless to
//! the guest standing in front of the booth.

use crate::pipeline::frame::Frame;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Mutex-guarded frame ring with drop-oldest semantics
#[derive(Debug)]
pub struct FrameBuffer {
    frames: Mutex<VecDeque<Frame>>,
    capacity: usize,
}

impl FrameBuffer {
    /// Create a buffer holding at most `capacity` frames (minimum 1)
    pub fn new(capacity: usize) -> Self {
        Self {
            frames: Mutex::new(VecDeque::with_capacity(capacity.max(1))),
            capacity: capacity.max(1),
        }
    }

    /// Push a frame, evicting the oldest when full. Never blocks on
    /// capacity, only on the lock.
    pub fn push(&self, frame: Frame) {
        let mut frames = match self.frames.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if frames.len() == self.capacity {
            frames.pop_front();
        }
        frames.push_back(frame);
    }

    /// Deep copy of the newest frame, or None before first push
    pub fn latest(&self) -> Option<Frame> {
        let frames = match self.frames.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        frames.back().cloned()
    }

    /// Number of buffered frames
    pub fn len(&self) -> usize {
        match self.frames.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    /// True before the first push
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
