// SPDX-License-Identifier: GPL-3.0-only

//! Photo session flow
//!
//! One guest, one session: camera comes up, a countdown runs, six shots
//! land on disk, the guest picks four and a filter, the collage is
//! rendered, printed and handed off as a QR download. The controller is
//! tick-driven; the coordinating layer calls `tick()` once per second and
//! forwards shutter presses.

pub mod delivery;
pub mod registry;

pub use delivery::{LprPrintService, PrintService, session_hash};
pub use registry::{SessionRecord, SessionRegistry};

use crate::backends::CaptureSource;
use crate::compositing::{CompositingEngine, FilterType, FrameTemplate, QrEncoder};
use crate::config::BoothConfig;
use crate::constants::session as consts;
use crate::errors::{BoothError, BoothResult, SessionError};
use crate::pipeline::{DisplaySink, Pipeline};
use chrono::{DateTime, Local};
use image::codecs::jpeg::JpegEncoder;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Which countdown is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownKind {
    /// Guest pressed the shutter
    Manual,
    /// Idle timer fired the countdown on its own
    Auto,
}

/// Where the session is in its flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No session; camera released
    Idle,
    /// Between shots, shutter re-arming
    AwaitingShutter,
    /// Counting down to a shot
    Countdown { kind: CountdownKind, remaining: u32 },
    /// A shot is being saved
    Capturing,
    /// All shots taken, pipeline coming down
    AllCaptured,
    /// Guest is picking photos and a filter
    Selecting,
    /// Collage render in progress
    Composing,
    /// Final image written; printing and QR display
    Delivering,
}

/// One guest's session
#[derive(Debug, Clone)]
pub struct PhotoSession {
    /// Numeric id, the digits of the folder timestamp
    pub id: u64,
    /// Public lookup hash
    pub hash: String,
    /// Per-session photo folder
    pub folder: PathBuf,
    /// Saved shots in capture order
    pub photos: Vec<PathBuf>,
    /// Indices into `photos`, in pick order
    pub selected: Vec<usize>,
    /// Filter applied to every selected photo
    pub filter: FilterType,
    /// Frame template image for the collage
    pub template_path: PathBuf,
    /// Session start time
    pub created_at: DateTime<Local>,
}

/// Result of a shutter press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutterResponse {
    /// Manual countdown started with this many ticks
    Started(u32),
    /// Press ignored (capture in progress or wrong phase)
    Ignored,
}

/// Result of toggling a photo on the selection screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    Selected,
    Deselected,
    /// Already at the selection cap; nothing changed
    LimitReached,
    InvalidIndex,
}

/// What a tick produced, for the coordinating layer to display
#[derive(Debug)]
pub enum SessionEvent {
    None,
    CountdownTick { kind: CountdownKind, remaining: u32 },
    ShotCaptured { index: usize, remaining: usize },
    /// The shot failed; no file was written, the counter did not advance
    ShotFailed(BoothError),
    AllCaptured,
}

/// Tick-driven session state machine
pub struct SessionController {
    config: BoothConfig,
    registry: Arc<SessionRegistry>,
    sink: Option<Arc<dyn DisplaySink>>,
    phase: SessionPhase,
    session: Option<PhotoSession>,
    pipeline: Option<Pipeline>,
    /// Re-entrancy guard; set from manual countdown start until the shot
    /// is saved or fails
    capture_in_progress: bool,
    /// Ticks left until the shutter re-arms after a shot
    rearm_ticks: u32,
}

impl SessionController {
    pub fn new(
        config: BoothConfig,
        registry: Arc<SessionRegistry>,
        sink: Option<Arc<dyn DisplaySink>>,
    ) -> Self {
        Self {
            config,
            registry,
            sink,
            phase: SessionPhase::Idle,
            session: None,
            pipeline: None,
            capture_in_progress: false,
            rearm_ticks: 0,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn session(&self) -> Option<&PhotoSession> {
        self.session.as_ref()
    }

    /// Start a session over the given capture source
    ///
    /// Runs the open protocol (settle + probe) synchronously so camera
    /// failures surface here, with the controller still Idle. On success
    /// the pipeline is running and the idle auto-countdown is armed.
    pub fn start_session(&mut self, mut source: Box<dyn CaptureSource>) -> BoothResult<()> {
        if self.phase != SessionPhase::Idle {
            return Err(SessionError::InvalidPhase { expected: "Idle" }.into());
        }

        source.open()?;

        let created_at = Local::now();
        let folder_name = created_at
            .format(consts::FOLDER_TIMESTAMP_FORMAT)
            .to_string();
        let folder = self.config.photos_dir.join(&folder_name);
        fs::create_dir_all(&folder)?;

        // Numeric id = the digits of the folder timestamp
        let digits: String = folder_name.chars().filter(|c| c.is_ascii_digit()).collect();
        let id: u64 = digits
            .parse()
            .map_err(|e| BoothError::Config(format!("session id from {}: {}", folder_name, e)))?;
        let hash = session_hash(id);

        self.registry.register(&hash, folder.clone(), created_at);

        let pipeline =
            Pipeline::start(source, self.config.frame_buffer_depth, self.sink.clone())?;

        info!(session_id = id, hash = %hash, folder = %folder.display(), "Session started");

        self.session = Some(PhotoSession {
            id,
            hash,
            folder,
            photos: Vec::new(),
            selected: Vec::new(),
            filter: FilterType::None,
            template_path: self.config.frame_path.clone(),
            created_at,
        });
        self.pipeline = Some(pipeline);
        self.capture_in_progress = false;
        self.rearm_ticks = 0;
        self.phase = SessionPhase::Countdown {
            kind: CountdownKind::Auto,
            remaining: self.config.default_countdown,
        };

        Ok(())
    }

    /// Guest pressed the shutter
    ///
    /// Replaces whichever countdown is running with the short manual one.
    /// Ignored while a shot is in flight or outside the capture phases.
    pub fn press_shutter(&mut self) -> ShutterResponse {
        if self.capture_in_progress {
            return ShutterResponse::Ignored;
        }

        match self.phase {
            SessionPhase::Countdown { .. } | SessionPhase::AwaitingShutter => {
                self.capture_in_progress = true;
                self.rearm_ticks = 0;
                self.phase = SessionPhase::Countdown {
                    kind: CountdownKind::Manual,
                    remaining: self.config.countdown_time,
                };
                ShutterResponse::Started(self.config.countdown_time)
            }
            _ => ShutterResponse::Ignored,
        }
    }

    /// Advance timers by one tick (one second)
    pub fn tick(&mut self) -> SessionEvent {
        match self.phase {
            SessionPhase::AwaitingShutter => {
                if self.rearm_ticks > 0 {
                    self.rearm_ticks -= 1;
                    if self.rearm_ticks == 0 {
                        self.phase = SessionPhase::Countdown {
                            kind: CountdownKind::Auto,
                            remaining: self.config.default_countdown,
                        };
                    }
                }
                SessionEvent::None
            }
            SessionPhase::Countdown { kind, remaining } => {
                let remaining = remaining.saturating_sub(1);
                if remaining == 0 {
                    // Auto shots take the guard now; manual ones took it
                    // at countdown start
                    self.capture_in_progress = true;
                    self.capture_photo()
                } else {
                    self.phase = SessionPhase::Countdown { kind, remaining };
                    SessionEvent::CountdownTick { kind, remaining }
                }
            }
            _ => SessionEvent::None,
        }
    }

    /// Take the shot: newest buffered frame to disk
    fn capture_photo(&mut self) -> SessionEvent {
        self.phase = SessionPhase::Capturing;

        let (Some(pipeline), Some(session)) = (&self.pipeline, &mut self.session) else {
            // Full teardown, so a half-initialized controller never keeps
            // worker threads alive without an owning session
            self.abandon();
            return SessionEvent::ShotFailed(SessionError::NoSession.into());
        };

        let Some(frame) = pipeline.frame_buffer().latest() else {
            warn!("Shutter fired with an empty frame buffer");
            self.capture_in_progress = false;
            self.rearm_ticks = consts::SHUTTER_REARM_TICKS;
            self.phase = SessionPhase::AwaitingShutter;
            return SessionEvent::ShotFailed(SessionError::FrameUnavailable.into());
        };

        let index = session.photos.len();
        let path = session.folder.join(format!("photo_{}.jpg", index));

        if let Err(e) = save_jpeg(&frame.image, &path) {
            warn!(path = %path.display(), error = %e, "Failed to save shot");
            self.capture_in_progress = false;
            self.rearm_ticks = consts::SHUTTER_REARM_TICKS;
            self.phase = SessionPhase::AwaitingShutter;
            return SessionEvent::ShotFailed(e);
        }

        session.photos.push(path.clone());
        self.registry.append_photo(&session.hash, path);
        self.capture_in_progress = false;

        let taken = session.photos.len();
        let total = self.config.total_photos;
        info!(session_id = session.id, index, taken, total, "Shot saved");

        if taken >= total {
            self.phase = SessionPhase::AllCaptured;
            // Camera work is done; release it before the guest starts
            // browsing
            if let Some(pipeline) = self.pipeline.take() {
                pipeline.shutdown();
            }
            self.phase = SessionPhase::Selecting;
            SessionEvent::AllCaptured
        } else {
            self.rearm_ticks = consts::SHUTTER_REARM_TICKS;
            self.phase = SessionPhase::AwaitingShutter;
            SessionEvent::ShotCaptured {
                index,
                remaining: total - taken,
            }
        }
    }

    /// Toggle a photo on the selection screen
    pub fn toggle_select(&mut self, index: usize) -> BoothResult<SelectionOutcome> {
        if self.phase != SessionPhase::Selecting {
            return Err(SessionError::InvalidPhase {
                expected: "Selecting",
            }
            .into());
        }
        let session = self.session.as_mut().ok_or(SessionError::NoSession)?;

        if index >= session.photos.len() {
            return Ok(SelectionOutcome::InvalidIndex);
        }
        if let Some(pos) = session.selected.iter().position(|&i| i == index) {
            session.selected.remove(pos);
            return Ok(SelectionOutcome::Deselected);
        }
        if session.selected.len() >= self.config.selected_photos {
            return Ok(SelectionOutcome::LimitReached);
        }
        session.selected.push(index);
        Ok(SelectionOutcome::Selected)
    }

    /// True once the guest has picked exactly the required number
    pub fn selection_complete(&self) -> bool {
        self.session
            .as_ref()
            .map(|s| s.selected.len() == self.config.selected_photos)
            .unwrap_or(false)
    }

    /// Set the collage filter (selection screen)
    pub fn set_filter(&mut self, filter: FilterType) -> BoothResult<()> {
        if self.phase != SessionPhase::Selecting {
            return Err(SessionError::InvalidPhase {
                expected: "Selecting",
            }
            .into());
        }
        let session = self.session.as_mut().ok_or(SessionError::NoSession)?;
        session.filter = filter;
        Ok(())
    }

    /// Set the frame template (selection screen)
    pub fn set_template(&mut self, path: PathBuf) -> BoothResult<()> {
        if self.phase != SessionPhase::Selecting {
            return Err(SessionError::InvalidPhase {
                expected: "Selecting",
            }
            .into());
        }
        let session = self.session.as_mut().ok_or(SessionError::NoSession)?;
        session.template_path = path;
        Ok(())
    }

    /// Render the final collage
    ///
    /// A compositing failure abandons the session: the controller returns
    /// to Idle and no partial output file exists. The saved shots stay on
    /// disk.
    pub fn compose_final(
        &mut self,
        engine: &mut CompositingEngine,
        qr: &dyn QrEncoder,
    ) -> BoothResult<PathBuf> {
        if self.phase != SessionPhase::Selecting || !self.selection_complete() {
            return Err(SessionError::InvalidPhase {
                expected: "Selecting with a complete selection",
            }
            .into());
        }
        let session = self.session.as_ref().ok_or(SessionError::NoSession)?;

        self.phase = SessionPhase::Composing;

        let template = FrameTemplate::load(&session.template_path)?;
        let picked: Vec<PathBuf> = session
            .selected
            .iter()
            .map(|&i| session.photos[i].clone())
            .collect();

        match engine.generate_final_image(session.id, &picked, session.filter, &template, qr) {
            Ok(path) => {
                self.phase = SessionPhase::Delivering;
                Ok(path)
            }
            Err(e) => {
                warn!(session_id = session.id, error = %e, "Compositing failed, abandoning session");
                self.abandon();
                Err(e)
            }
        }
    }

    /// Hand the final image to the printer
    ///
    /// A failure here is reported but does not abandon anything; the QR
    /// download on the image still works.
    pub fn print_final(&self, service: &dyn PrintService, final_image: &Path) -> BoothResult<()> {
        service.print(&self.config.printer_name, final_image)
    }

    /// Finish a delivered session and return to Idle
    pub fn complete(&mut self) -> BoothResult<()> {
        if self.phase != SessionPhase::Delivering {
            return Err(SessionError::InvalidPhase {
                expected: "Delivering",
            }
            .into());
        }
        let id = self.session.as_ref().map(|s| s.id);
        info!(session_id = ?id, "Session complete");
        self.abandon();
        Ok(())
    }

    /// Cancel whatever is in flight and return to Idle
    ///
    /// Already-saved shots stay on disk (orphaned) and the registry entry
    /// survives; only the live state is torn down.
    pub fn cancel(&mut self) {
        if self.phase != SessionPhase::Idle {
            info!(phase = ?self.phase, "Session cancelled");
        }
        self.abandon();
    }

    fn abandon(&mut self) {
        if let Some(pipeline) = self.pipeline.take() {
            pipeline.shutdown();
        }
        self.session = None;
        self.capture_in_progress = false;
        self.rearm_ticks = 0;
        self.phase = SessionPhase::Idle;
    }
}

/// Save a frame as JPEG at the booth's print quality
fn save_jpeg(image: &image::RgbImage, path: &Path) -> BoothResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let mut encoder = JpegEncoder::new_with_quality(&mut writer, consts::JPEG_QUALITY);
    encoder
        .encode_image(image)
        .map_err(|e| BoothError::Storage(e.to_string()))?;
    Ok(())
}
