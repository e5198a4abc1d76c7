//! Media capture subsystem.
//!
//! Three capture modes — photo ([`photo`]), audio ([`audio`]), video
//! ([`video`]) — each a small state machine over the hardware
//! acquisition seam in [`device`], plus a file-picker intake path for
//! pre-existing files. Captured and picked files become
//! [`MediaFile`]s with local URLs minted by the [`urls`] registry.
//!
//! The [`CaptureController`] enforces the shared-hardware rule: at most
//! one mode holds the camera/microphone at a time. A mode's session
//! releases the hardware deterministically on stop, cancel, or drop;
//! only then may another mode acquire it.

pub mod audio;
pub mod device;
pub mod photo;
pub mod urls;
pub mod video;

pub use audio::AudioRecording;
pub use device::{
    CameraFacing, DeviceError, FakeMediaDevices, MediaDevices, MediaStream, StreamConstraints,
    VideoFrame,
};
pub use photo::PhotoCapture;
pub use urls::ObjectUrlRegistry;
pub use video::{VideoPreview, VideoRecording};

use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::models::{MediaFile, MediaKind};

const CAMERA_NOTICE: &str = "Unable to access camera. Please check permissions.";
const MIC_NOTICE: &str = "Unable to access microphone. Please check permissions.";
const CAMERA_MIC_NOTICE: &str = "Unable to access camera/microphone.";

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Which capture mode holds the hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    Photo,
    Audio,
    Video,
}

impl std::fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Photo => write!(f, "photo capture"),
            Self::Audio => write!(f, "audio recording"),
            Self::Video => write!(f, "video recording"),
        }
    }
}

/// Errors from the capture subsystem.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// Hardware access was denied or unavailable. The message is the
    /// user-facing notice for the mode that requested access.
    #[error("{message}")]
    PermissionDenied {
        message: String,
        source: DeviceError,
    },

    #[error("Another capture is already in progress ({holder})")]
    CaptureBusy { holder: CaptureMode },

    #[error("Camera is not ready. Please wait a moment and try again.")]
    CameraNotReady,

    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    #[error("Internal lock error")]
    LockPoisoned,
}

/// A file handed over by the platform's file picker.
#[derive(Debug, Clone)]
pub struct FilePick {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl FilePick {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: None,
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// The picker filter hint for a media slot. A hint, not a hard
/// constraint — selected files are accepted as-is.
pub fn accept_filter(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Image => "image/*,.pdf",
        MediaKind::Audio => "audio/*",
        MediaKind::Video => "video/*",
    }
}

// ═══════════════════════════════════════════════════════════
// CaptureController
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Default)]
struct Hardware {
    /// Which mode currently holds the camera/microphone, if any.
    active: Mutex<Option<CaptureMode>>,
}

/// Capture entry point: opens the three capture modes, takes picked
/// files in, and owns the hardware-exclusivity latch.
///
/// # Example
/// ```ignore
/// let controller = CaptureController::new(devices);
/// let mut camera = controller.open_photo_camera().await?;
/// let photo = camera.capture()?;
/// // camera released; photo.local_url resolvable via controller.urls()
/// ```
pub struct CaptureController<D: MediaDevices> {
    devices: D,
    urls: ObjectUrlRegistry,
    hardware: Arc<Hardware>,
}

impl<D: MediaDevices> CaptureController<D> {
    pub fn new(devices: D) -> Self {
        Self {
            devices,
            urls: ObjectUrlRegistry::new(),
            hardware: Arc::new(Hardware::default()),
        }
    }

    /// The registry issuing local URLs for files produced here.
    pub fn urls(&self) -> &ObjectUrlRegistry {
        &self.urls
    }

    /// Which mode currently holds the hardware, `None` when idle.
    pub fn active_mode(&self) -> Option<CaptureMode> {
        *self.hardware.active.lock().ok()?
    }

    /// Open the front-facing camera for a photo.
    pub async fn open_photo_camera(&self) -> Result<PhotoCapture, CaptureError> {
        let guard = self.acquire(CaptureMode::Photo)?;
        let stream = self
            .devices
            .get_user_media(StreamConstraints::video_only(CameraFacing::User))
            .await
            .map_err(|source| CaptureError::PermissionDenied {
                message: CAMERA_NOTICE.to_string(),
                source,
            })?;
        tracing::debug!(stream = %stream.id(), "photo camera opened");
        Ok(PhotoCapture::new(stream, self.urls.clone(), guard))
    }

    /// Open the microphone and start recording immediately.
    pub async fn start_audio_recording(&self) -> Result<AudioRecording, CaptureError> {
        let guard = self.acquire(CaptureMode::Audio)?;
        let stream = self
            .devices
            .get_user_media(StreamConstraints::audio_only())
            .await
            .map_err(|source| CaptureError::PermissionDenied {
                message: MIC_NOTICE.to_string(),
                source,
            })?;
        tracing::debug!(stream = %stream.id(), "audio recording started");
        Ok(AudioRecording::new(stream, self.urls.clone(), guard))
    }

    /// Open camera and microphone for a framing preview; recording
    /// starts later from the preview.
    pub async fn open_video_camera(&self) -> Result<VideoPreview, CaptureError> {
        let guard = self.acquire(CaptureMode::Video)?;
        let stream = self
            .devices
            .get_user_media(StreamConstraints::audio_video(CameraFacing::User))
            .await
            .map_err(|source| CaptureError::PermissionDenied {
                message: CAMERA_MIC_NOTICE.to_string(),
                source,
            })?;
        tracing::debug!(stream = %stream.id(), "video camera opened");
        Ok(VideoPreview::new(stream, self.urls.clone(), guard))
    }

    /// Turn picker selections into media files, one per pick.
    ///
    /// The kind comes from the slot the picker was opened for, not from
    /// the file itself; the content type is taken from the pick or
    /// guessed from the file name.
    pub fn pick_files(&self, kind: MediaKind, picks: Vec<FilePick>) -> Vec<MediaFile> {
        picks
            .into_iter()
            .map(|pick| {
                let content_type = pick.content_type.unwrap_or_else(|| {
                    mime_guess::from_path(&pick.name)
                        .first_or_octet_stream()
                        .essence_str()
                        .to_string()
                });
                MediaFile {
                    id: Uuid::new_v4(),
                    name: pick.name,
                    kind,
                    content_type,
                    bytes: pick.bytes,
                    local_url: self.urls.create(),
                }
            })
            .collect()
    }

    fn acquire(&self, mode: CaptureMode) -> Result<HardwareGuard, CaptureError> {
        let mut active = self
            .hardware
            .active
            .lock()
            .map_err(|_| CaptureError::LockPoisoned)?;
        if let Some(holder) = *active {
            return Err(CaptureError::CaptureBusy { holder });
        }
        *active = Some(mode);
        Ok(HardwareGuard {
            hardware: Arc::clone(&self.hardware),
        })
    }
}

// ═══════════════════════════════════════════════════════════
// HardwareGuard — exclusive hardware token
// ═══════════════════════════════════════════════════════════

/// RAII token for exclusive camera/microphone ownership. Held by the
/// active capture session; dropping it frees the hardware for the next
/// mode.
#[derive(Debug)]
pub struct HardwareGuard {
    hardware: Arc<Hardware>,
}

impl Drop for HardwareGuard {
    fn drop(&mut self) {
        if let Ok(mut active) = self.hardware.active.lock() {
            *active = None;
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hardware_is_exclusive_across_modes() {
        let devices = FakeMediaDevices::new().with_frame(VideoFrame::solid(4, 4, [0, 0, 0, 255]));
        let controller = CaptureController::new(devices.clone());

        let camera = controller.open_photo_camera().await.unwrap();
        assert_eq!(controller.active_mode(), Some(CaptureMode::Photo));

        let err = controller.start_audio_recording().await.unwrap_err();
        assert!(matches!(
            err,
            CaptureError::CaptureBusy {
                holder: CaptureMode::Photo,
            },
        ));
        assert!(err.to_string().contains("photo capture"));
        // The blocked mode never reached the hardware.
        assert_eq!(devices.requests().len(), 1);

        camera.cancel();
        assert_eq!(controller.active_mode(), None);
        let recording = controller.start_audio_recording().await.unwrap();
        assert_eq!(controller.active_mode(), Some(CaptureMode::Audio));
        drop(recording);
    }

    #[tokio::test]
    async fn video_blocks_photo_until_stopped() {
        let devices = FakeMediaDevices::new();
        let controller = CaptureController::new(devices);

        let preview = controller.open_video_camera().await.unwrap();
        let recording = preview.start_recording();
        assert_eq!(controller.active_mode(), Some(CaptureMode::Video));

        let err = controller.open_photo_camera().await.unwrap_err();
        assert!(matches!(
            err,
            CaptureError::CaptureBusy {
                holder: CaptureMode::Video,
            },
        ));

        let _file = recording.stop();
        assert_eq!(controller.active_mode(), None);
    }

    #[test]
    fn picked_files_get_distinct_ids_and_urls() {
        let controller = CaptureController::new(FakeMediaDevices::new());
        let files = controller.pick_files(
            MediaKind::Image,
            vec![
                FilePick::new("scan.png", b"png-bytes".to_vec()),
                FilePick::new("report.pdf", b"pdf-bytes".to_vec())
                    .with_content_type("application/pdf"),
            ],
        );

        assert_eq!(files.len(), 2);
        assert_ne!(files[0].id, files[1].id);
        assert_ne!(files[0].local_url, files[1].local_url);
        assert_eq!(files[0].content_type, "image/png");
        assert_eq!(files[1].content_type, "application/pdf");
        assert!(files.iter().all(|f| controller.urls().is_live(&f.local_url)));
    }

    #[test]
    fn picked_files_take_the_slot_kind_not_the_file_kind() {
        let controller = CaptureController::new(FakeMediaDevices::new());
        let files = controller.pick_files(
            MediaKind::Video,
            vec![FilePick::new("voice-note.mp3", b"mp3".to_vec())],
        );

        // The slot decides the bucket even when the file says otherwise.
        assert_eq!(files[0].kind, MediaKind::Video);
        assert_eq!(files[0].content_type, "audio/mpeg");
    }

    #[test]
    fn unknown_extension_falls_back_to_octet_stream() {
        let controller = CaptureController::new(FakeMediaDevices::new());
        let files = controller.pick_files(
            MediaKind::Image,
            vec![FilePick::new("mystery.zzz", b"??".to_vec())],
        );
        assert_eq!(files[0].content_type, "application/octet-stream");
    }

    #[test]
    fn accept_filters_cover_the_three_slots() {
        assert_eq!(accept_filter(MediaKind::Image), "image/*,.pdf");
        assert_eq!(accept_filter(MediaKind::Audio), "audio/*");
        assert_eq!(accept_filter(MediaKind::Video), "video/*");
    }
}
