//! Video recording: `Idle → CameraPreview → Recording → Idle`.
//!
//! Opening the camera requests a combined audio+video front-facing
//! stream and shows a mirrored live preview so the user can frame
//! themselves. Recording starts only on explicit action from the
//! preview; cancel from the preview releases the stream without
//! producing anything. The preview→recording transition is encoded in
//! the types: a [`VideoPreview`] is consumed to start a
//! [`VideoRecording`], and the stream moves with it.

use chrono::Utc;
use uuid::Uuid;

use crate::models::{MediaFile, MediaKind};

use super::device::MediaStream;
use super::urls::ObjectUrlRegistry;
use super::HardwareGuard;

// ═══════════════════════════════════════════════════════════
// VideoPreview
// ═══════════════════════════════════════════════════════════

/// A framing preview with the camera and microphone open but nothing
/// recorded yet. Obtained from
/// [`CaptureController::open_video_camera`](super::CaptureController::open_video_camera).
#[derive(Debug)]
pub struct VideoPreview {
    stream: MediaStream,
    urls: ObjectUrlRegistry,
    guard: HardwareGuard,
}

impl VideoPreview {
    pub(super) fn new(stream: MediaStream, urls: ObjectUrlRegistry, guard: HardwareGuard) -> Self {
        Self {
            stream,
            urls,
            guard,
        }
    }

    /// The live preview is horizontally mirrored.
    pub fn preview_mirrored(&self) -> bool {
        true
    }

    /// Begin recording on the already-open stream.
    pub fn start_recording(self) -> VideoRecording {
        tracing::debug!(stream = %self.stream.id(), "video recording started");
        VideoRecording {
            stream: self.stream,
            chunks: Vec::new(),
            urls: self.urls,
            _guard: self.guard,
        }
    }

    /// Close the camera without recording.
    pub fn cancel(self) {
        self.stream.stop_all();
    }
}

// ═══════════════════════════════════════════════════════════
// VideoRecording
// ═══════════════════════════════════════════════════════════

/// An in-progress video recording. Feed encoder output in with
/// [`push_chunk`](Self::push_chunk), then [`stop`](Self::stop) to get
/// the assembled file. Dropping it discards the chunks and releases
/// the stream.
pub struct VideoRecording {
    stream: MediaStream,
    chunks: Vec<Vec<u8>>,
    urls: ObjectUrlRegistry,
    _guard: HardwareGuard,
}

impl VideoRecording {
    /// Append one encoded chunk.
    pub fn push_chunk(&mut self, chunk: Vec<u8>) {
        self.chunks.push(chunk);
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Stop recording: assemble the chunks into one blob, mint a local
    /// URL, and tear down the stream.
    pub fn stop(mut self) -> MediaFile {
        let bytes: Vec<u8> = self.chunks.drain(..).flatten().collect();
        let file = MediaFile {
            id: Uuid::new_v4(),
            name: format!("video-{}.webm", Utc::now().timestamp_millis()),
            kind: MediaKind::Video,
            content_type: "video/webm".to_string(),
            bytes,
            local_url: self.urls.create(),
        };
        self.stream.stop_all();
        tracing::info!(name = %file.name, bytes = file.size(), "video recording stopped");
        file
    }
}
