// SPDX-License-Identifier: GPL-3.0-only

//! Unattended photo-booth kiosk core
//!
//! Everything between the camera and the printer: the real-time capture
//! pipeline, the tick-driven session state machine and the collage
//! compositing engine. The rendering layer (whatever draws the booth
//! screen) plugs in through [`pipeline::DisplaySink`]; QR encoding and
//! printing are external collaborators behind traits.

pub mod backends;
pub mod compositing;
pub mod config;
pub mod constants;
pub mod errors;
pub mod pipeline;
pub mod session;

pub use backends::{CaptureSource, SyntheticSource, V4l2Source};
pub use compositing::{CompositingEngine, FilterType, FrameTemplate, QrEncoder};
pub use config::BoothConfig;
pub use errors::{BoothError, BoothResult};
pub use pipeline::{DisplaySink, Frame, FrameBuffer, Pipeline};
pub use session::{
    LprPrintService, PhotoSession, PrintService, SessionController, SessionEvent, SessionPhase,
    SessionRegistry,
};
