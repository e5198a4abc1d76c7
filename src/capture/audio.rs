//! Audio recording: `Idle → Recording → Idle`.
//!
//! Starting a recording requests a microphone-only stream and buffers
//! encoded chunks as they arrive. Stopping assembles the chunks into a
//! single WebM blob and releases the microphone.

use chrono::Utc;
use uuid::Uuid;

use crate::models::{MediaFile, MediaKind};

use super::device::MediaStream;
use super::urls::ObjectUrlRegistry;
use super::HardwareGuard;

/// A live microphone recording. Obtained from
/// [`CaptureController::start_audio_recording`](super::CaptureController::start_audio_recording).
///
/// Feed encoder output in with [`push_chunk`](Self::push_chunk), then
/// [`stop`](Self::stop) to get the assembled file. Dropping a recording
/// without stopping discards the chunks and releases the microphone.
#[derive(Debug)]
pub struct AudioRecording {
    stream: MediaStream,
    chunks: Vec<Vec<u8>>,
    urls: ObjectUrlRegistry,
    _guard: HardwareGuard,
}

impl AudioRecording {
    pub(super) fn new(stream: MediaStream, urls: ObjectUrlRegistry, guard: HardwareGuard) -> Self {
        Self {
            stream,
            chunks: Vec::new(),
            urls,
            _guard: guard,
        }
    }

    /// Append one encoded chunk.
    pub fn push_chunk(&mut self, chunk: Vec<u8>) {
        self.chunks.push(chunk);
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Stop recording: assemble the chunks into one blob, mint a local
    /// URL, and release the microphone.
    pub fn stop(mut self) -> MediaFile {
        let bytes: Vec<u8> = self.chunks.drain(..).flatten().collect();
        let file = MediaFile {
            id: Uuid::new_v4(),
            name: format!("recording-{}.webm", Utc::now().timestamp_millis()),
            kind: MediaKind::Audio,
            content_type: "audio/webm".to_string(),
            bytes,
            local_url: self.urls.create(),
        };
        self.stream.stop_all();
        tracing::info!(name = %file.name, bytes = file.size(), "audio recording stopped");
        file
    }
}
