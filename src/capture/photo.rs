//! Photo capture: `Idle → CameraOpen → Idle`.
//!
//! Opening the camera requests a front-facing video-only stream. The
//! live preview renders mirrored, selfie-style, and a captured photo is
//! flipped back horizontally before encoding so the saved image matches
//! what the user saw rather than the sensor's raw orientation.

use std::io::Cursor;

use chrono::Utc;
use image::{DynamicImage, ImageFormat, RgbaImage};
use uuid::Uuid;

use crate::models::{MediaFile, MediaKind};

use super::device::{MediaStream, VideoFrame};
use super::urls::ObjectUrlRegistry;
use super::{CaptureError, HardwareGuard};

/// An open photo camera. Obtained from
/// [`CaptureController::open_photo_camera`](super::CaptureController::open_photo_camera).
///
/// Ends by [`capture`](Self::capture) (photo saved, camera released) or
/// [`cancel`](Self::cancel); dropping it releases the camera too.
#[derive(Debug)]
pub struct PhotoCapture {
    stream: MediaStream,
    urls: ObjectUrlRegistry,
    _guard: HardwareGuard,
}

impl PhotoCapture {
    pub(super) fn new(stream: MediaStream, urls: ObjectUrlRegistry, guard: HardwareGuard) -> Self {
        Self {
            stream,
            urls,
            _guard: guard,
        }
    }

    /// The live preview is horizontally mirrored.
    pub fn preview_mirrored(&self) -> bool {
        true
    }

    /// Has the sensor produced a usable frame yet?
    pub fn frame_ready(&self) -> bool {
        !self.stream.is_released()
            && self
                .stream
                .latest_frame()
                .is_some_and(|f| f.width > 0 && f.height > 0)
    }

    /// Capture the current frame as a JPEG and release the camera.
    ///
    /// While the sensor is still warming up this fails with
    /// [`CaptureError::CameraNotReady`] and the camera stays open, so
    /// the user can simply try again.
    pub fn capture(&mut self) -> Result<MediaFile, CaptureError> {
        if self.stream.is_released() {
            return Err(CaptureError::CameraNotReady);
        }
        let frame = match self.stream.latest_frame() {
            Some(frame) if frame.width > 0 && frame.height > 0 => frame,
            _ => return Err(CaptureError::CameraNotReady),
        };

        let jpeg = encode_mirrored_jpeg(frame)?;
        let file = MediaFile {
            id: Uuid::new_v4(),
            name: format!("photo-{}.jpg", Utc::now().timestamp_millis()),
            kind: MediaKind::Image,
            content_type: "image/jpeg".to_string(),
            bytes: jpeg,
            local_url: self.urls.create(),
        };
        self.stream.stop_all();
        tracing::info!(name = %file.name, bytes = file.size(), "photo captured");
        Ok(file)
    }

    /// Close the camera without capturing.
    pub fn cancel(self) {
        self.stream.stop_all();
    }
}

/// Flip the frame horizontally and encode it as JPEG.
///
/// Sensor frames arrive unmirrored; the flip makes the saved photo
/// match the mirrored preview.
fn encode_mirrored_jpeg(frame: &VideoFrame) -> Result<Vec<u8>, CaptureError> {
    let rgba = RgbaImage::from_raw(frame.width, frame.height, frame.pixels.clone()).ok_or_else(
        || {
            CaptureError::ImageProcessing(format!(
                "frame buffer is {} bytes, expected {} for {}x{}",
                frame.pixels.len(),
                frame.width as usize * frame.height as usize * 4,
                frame.width,
                frame.height,
            ))
        },
    )?;

    let mirrored = DynamicImage::ImageRgba8(rgba).fliph().to_rgb8();
    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(mirrored)
        .write_to(&mut cursor, ImageFormat::Jpeg)
        .map_err(|e| CaptureError::ImageProcessing(format!("JPEG encoding failed: {e}")))?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use image::GenericImageView;

    use crate::capture::device::{CameraFacing, FakeMediaDevices, StreamConstraints, VideoFrame};
    use crate::capture::{CaptureController, CaptureError};
    use crate::models::MediaKind;

    /// A 16x16 frame, left half red, right half blue.
    fn half_red_half_blue() -> VideoFrame {
        let mut pixels = Vec::new();
        for _row in 0..16 {
            for col in 0..16 {
                if col < 8 {
                    pixels.extend_from_slice(&[255, 0, 0, 255]);
                } else {
                    pixels.extend_from_slice(&[0, 0, 255, 255]);
                }
            }
        }
        VideoFrame {
            width: 16,
            height: 16,
            pixels,
        }
    }

    #[tokio::test]
    async fn open_requests_front_facing_video_only_stream() {
        let devices = FakeMediaDevices::new().with_frame(VideoFrame::solid(4, 4, [0, 0, 0, 255]));
        let controller = CaptureController::new(devices.clone());

        let camera = controller.open_photo_camera().await.unwrap();
        assert!(camera.preview_mirrored());
        assert!(camera.frame_ready());
        assert_eq!(
            devices.requests(),
            vec![StreamConstraints::video_only(CameraFacing::User)],
        );
    }

    #[tokio::test]
    async fn capture_yields_jpeg_and_releases_camera() {
        let devices = FakeMediaDevices::new().with_frame(VideoFrame::solid(8, 8, [200, 10, 10, 255]));
        let controller = CaptureController::new(devices.clone());

        let mut camera = controller.open_photo_camera().await.unwrap();
        let file = camera.capture().unwrap();

        assert!(file.name.starts_with("photo-"));
        assert!(file.name.ends_with(".jpg"));
        assert_eq!(file.kind, MediaKind::Image);
        assert_eq!(file.content_type, "image/jpeg");
        // JPEG magic bytes
        assert_eq!(&file.bytes[..3], &[0xFF, 0xD8, 0xFF]);
        assert!(controller.urls().is_live(&file.local_url));

        assert!(devices.all_tracks_stopped());
        drop(camera);
        assert!(controller.active_mode().is_none());
    }

    #[tokio::test]
    async fn captured_photo_is_flipped_back_to_match_the_preview() {
        let devices = FakeMediaDevices::new().with_frame(half_red_half_blue());
        let controller = CaptureController::new(devices);

        let mut camera = controller.open_photo_camera().await.unwrap();
        let file = camera.capture().unwrap();

        let decoded = image::load_from_memory(&file.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (16, 16));
        // The sensor's red left half lands on the right after the flip.
        let left = decoded.get_pixel(2, 8).0;
        let right = decoded.get_pixel(13, 8).0;
        assert!(left[2] > 150 && left[0] < 100, "left pixel {left:?} should be blue");
        assert!(right[0] > 150 && right[2] < 100, "right pixel {right:?} should be red");
    }

    #[tokio::test]
    async fn capture_before_first_frame_is_rejected_and_camera_stays_open() {
        // No frame configured: the fake camera is still warming up.
        let devices = FakeMediaDevices::new();
        let controller = CaptureController::new(devices.clone());

        let mut camera = controller.open_photo_camera().await.unwrap();
        assert!(!camera.frame_ready());

        let err = camera.capture().unwrap_err();
        assert!(matches!(err, CaptureError::CameraNotReady));
        assert_eq!(
            err.to_string(),
            "Camera is not ready. Please wait a moment and try again.",
        );

        // Still open: the user can retry or cancel.
        assert_eq!(devices.open_track_count(), 1);
        camera.cancel();
        assert!(devices.all_tracks_stopped());
    }

    #[tokio::test]
    async fn dropping_an_open_camera_releases_the_stream() {
        let devices = FakeMediaDevices::new().with_frame(VideoFrame::solid(4, 4, [0, 0, 0, 255]));
        let controller = CaptureController::new(devices.clone());

        let camera = controller.open_photo_camera().await.unwrap();
        assert_eq!(devices.open_track_count(), 1);

        drop(camera);
        assert!(devices.all_tracks_stopped());
        assert!(controller.active_mode().is_none());
    }

    #[tokio::test]
    async fn permission_denial_maps_to_camera_notice() {
        let devices = FakeMediaDevices::new().deny_access();
        let controller = CaptureController::new(devices);

        let err = controller.open_photo_camera().await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unable to access camera. Please check permissions.",
        );
        // The failed open must not leave the hardware marked busy.
        assert!(controller.active_mode().is_none());
    }
}
