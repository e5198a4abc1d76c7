//! Media-device capability seam.
//!
//! Hardware camera/microphone acquisition (`getUserMedia`-style) sits
//! behind the [`MediaDevices`] trait so every capture state machine can
//! run against injected fake hardware in tests. A [`MediaStream`] models
//! what the browser hands back: a set of stoppable tracks plus, for
//! video-capable streams, the camera's current frame buffer.
//!
//! Track release is observable from outside the stream (shared liveness
//! flags), which is what lets tests prove the no-leaked-stream invariant.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use uuid::Uuid;

// ═══════════════════════════════════════════════════════════
// Constraints
// ═══════════════════════════════════════════════════════════

/// Which camera the video track should come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraFacing {
    /// Front-facing (selfie) camera.
    User,
    /// Rear camera.
    Environment,
}

impl CameraFacing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Environment => "environment",
        }
    }
}

/// Video half of a stream request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoConstraints {
    pub facing: CameraFacing,
}

/// What a capture mode asks the hardware for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConstraints {
    pub audio: bool,
    pub video: Option<VideoConstraints>,
}

impl StreamConstraints {
    /// Microphone only.
    pub fn audio_only() -> Self {
        Self {
            audio: true,
            video: None,
        }
    }

    /// Camera only.
    pub fn video_only(facing: CameraFacing) -> Self {
        Self {
            audio: false,
            video: Some(VideoConstraints { facing }),
        }
    }

    /// Camera and microphone together.
    pub fn audio_video(facing: CameraFacing) -> Self {
        Self {
            audio: true,
            video: Some(VideoConstraints { facing }),
        }
    }

    pub fn wants_video(&self) -> bool {
        self.video.is_some()
    }
}

// ═══════════════════════════════════════════════════════════
// Tracks and frames
// ═══════════════════════════════════════════════════════════

/// Kind of hardware track inside a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Audio,
    Video,
}

/// One hardware track. Clones share the same liveness flag, so a
/// device fake can observe stops performed by the capture sessions.
#[derive(Debug, Clone)]
pub struct MediaTrack {
    kind: TrackKind,
    live: Arc<AtomicBool>,
}

impl MediaTrack {
    fn new(kind: TrackKind) -> Self {
        Self {
            kind,
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    /// Stop the track. Idempotent.
    pub fn stop(&self) {
        self.live.store(false, Ordering::SeqCst);
    }
}

/// One uncompressed camera frame, RGBA8 row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl VideoFrame {
    /// A frame filled with a single color. Handy for fakes.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..width * height {
            pixels.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            pixels,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// MediaStream
// ═══════════════════════════════════════════════════════════

/// An acquired hardware stream: tracks plus the current camera frame
/// (when video was requested and the sensor has produced one).
///
/// Every stream ends with all tracks stopped: explicitly on the stop
/// and cancel paths, and through `Drop` otherwise.
#[derive(Debug)]
pub struct MediaStream {
    id: Uuid,
    tracks: Vec<MediaTrack>,
    frame: Option<VideoFrame>,
}

impl MediaStream {
    /// Build a stream carrying one track per requested capability.
    pub fn for_constraints(constraints: &StreamConstraints) -> Self {
        let mut tracks = Vec::new();
        if constraints.audio {
            tracks.push(MediaTrack::new(TrackKind::Audio));
        }
        if constraints.video.is_some() {
            tracks.push(MediaTrack::new(TrackKind::Video));
        }
        Self {
            id: Uuid::new_v4(),
            tracks,
            frame: None,
        }
    }

    /// Attach the camera's current frame buffer.
    pub fn with_frame(mut self, frame: VideoFrame) -> Self {
        self.frame = Some(frame);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    pub fn has_audio(&self) -> bool {
        self.tracks.iter().any(|t| t.kind() == TrackKind::Audio)
    }

    pub fn has_video(&self) -> bool {
        self.tracks.iter().any(|t| t.kind() == TrackKind::Video)
    }

    /// The most recent camera frame, `None` while the sensor warms up.
    pub fn latest_frame(&self) -> Option<&VideoFrame> {
        self.frame.as_ref()
    }

    /// Stop every track. Idempotent.
    pub fn stop_all(&self) {
        for track in &self.tracks {
            track.stop();
        }
    }

    /// Have all tracks been stopped?
    pub fn is_released(&self) -> bool {
        self.tracks.iter().all(|t| !t.is_live())
    }
}

impl Drop for MediaStream {
    /// Dropping a stream stops all of its tracks. Teardown of a capture
    /// surface releases the hardware even without an explicit stop.
    fn drop(&mut self) {
        self.stop_all();
    }
}

// ═══════════════════════════════════════════════════════════
// MediaDevices — the acquisition seam
// ═══════════════════════════════════════════════════════════

/// Errors from hardware acquisition.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DeviceError {
    #[error("Media device access denied")]
    PermissionDenied,

    #[error("Media device unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Hardware acquisition capability.
///
/// The embedding shell provides the real implementation; tests and
/// headless callers inject [`FakeMediaDevices`].
#[allow(async_fn_in_trait)]
pub trait MediaDevices {
    async fn get_user_media(
        &self,
        constraints: StreamConstraints,
    ) -> Result<MediaStream, DeviceError>;
}

// ═══════════════════════════════════════════════════════════
// FakeMediaDevices
// ═══════════════════════════════════════════════════════════

#[derive(Default)]
struct FakeDeviceState {
    deny_access: bool,
    frame: Option<VideoFrame>,
    requests: Vec<StreamConstraints>,
    issued_tracks: Vec<MediaTrack>,
}

/// Fake hardware for testing — hands out streams with a configurable
/// frame buffer, or denies access entirely. Clones share state, so a
/// test can keep a handle for assertions after moving one into a
/// capture controller.
#[derive(Clone, Default)]
pub struct FakeMediaDevices {
    state: Arc<Mutex<FakeDeviceState>>,
}

impl FakeMediaDevices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every acquisition with a permission error.
    pub fn deny_access(self) -> Self {
        self.lock().deny_access = true;
        self
    }

    /// Serve this frame on video-capable streams. Without one, the
    /// camera reports no frame yet (warming up).
    pub fn with_frame(self, frame: VideoFrame) -> Self {
        self.lock().frame = Some(frame);
        self
    }

    /// Every constraint set requested so far, in order.
    pub fn requests(&self) -> Vec<StreamConstraints> {
        self.lock().requests.clone()
    }

    /// Tracks handed out that are still live.
    pub fn open_track_count(&self) -> usize {
        self.lock().issued_tracks.iter().filter(|t| t.is_live()).count()
    }

    /// Has every track ever handed out been stopped?
    pub fn all_tracks_stopped(&self) -> bool {
        self.lock().issued_tracks.iter().all(|t| !t.is_live())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeDeviceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MediaDevices for FakeMediaDevices {
    async fn get_user_media(
        &self,
        constraints: StreamConstraints,
    ) -> Result<MediaStream, DeviceError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.requests.push(constraints);

        if state.deny_access {
            return Err(DeviceError::PermissionDenied);
        }

        let mut stream = MediaStream::for_constraints(&constraints);
        if constraints.wants_video() {
            if let Some(frame) = state.frame.clone() {
                stream = stream.with_frame(frame);
            }
        }
        state.issued_tracks.extend(stream.tracks().iter().cloned());
        Ok(stream)
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
