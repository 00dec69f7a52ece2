//! Integration tests for still capture at native stream resolution.

mod common;

use std::sync::Arc;

use nutri_lens_app::CaptureController;
use nutri_lens_camera::{CameraBackend, SyntheticCameraBackend};
use nutri_lens_core::{JPEG_MEDIA_TYPE, PhotoSource};

#[test]
fn capture_still_tests_encodes_native_resolution_jpeg() {
    let backend = Arc::new(SyntheticCameraBackend::with_frame_size(320, 240));
    let mut controller = CaptureController::new(backend as Arc<dyn CameraBackend>);
    controller.start_camera().expect("camera should start");

    controller.capture_photo().expect("capture should work");

    let photo = controller.view().photo.as_ref().expect("photo presented");
    assert_eq!((photo.width, photo.height), (320, 240));
    assert_eq!(photo.source, PhotoSource::CameraStill);
    assert_eq!(photo.data_url.media_type, JPEG_MEDIA_TYPE);

    let jpeg = photo.data_url.decode_bytes().expect("payload should decode");
    let reloaded = image::load_from_memory(&jpeg).expect("jpeg should decode");
    assert_eq!(image::GenericImageView::dimensions(&reloaded), (320, 240));
}

#[test]
fn capture_still_tests_stream_keeps_running_after_capture() {
    let (backend, mut controller) = common::controller_with_synthetic_camera();
    controller.start_camera().expect("camera should start");
    controller.capture_photo().expect("capture should work");

    // Capturing freezes the view, not the hardware.
    assert!(controller.session().has_active_stream());
    assert!(
        !backend
            .events()
            .iter()
            .any(|event| matches!(event, nutri_lens_camera::CameraEvent::StreamStopped { .. }))
    );
}
