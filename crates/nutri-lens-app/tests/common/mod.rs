//! Shared fixtures for app integration tests.

use std::sync::Arc;

use nutri_lens_app::CaptureController;
use nutri_lens_camera::{CameraBackend, SyntheticCameraBackend};
use nutri_lens_upload::{TransportReply, UploadClient, UploadError, UploadTransport};

/// Transport that always answers with one canned HTTP reply.
#[allow(dead_code)]
pub struct CannedTransport {
    pub status: u16,
    pub body: String,
}

impl UploadTransport for CannedTransport {
    fn send(&self, _endpoint: &str, _body_json: &[u8]) -> Result<TransportReply, UploadError> {
        Ok(TransportReply {
            status: self.status,
            body: self.body.clone(),
        })
    }
}

/// Creates a controller over a synthetic camera, keeping backend access for
/// permission and event assertions.
#[allow(dead_code)]
pub fn controller_with_synthetic_camera() -> (Arc<SyntheticCameraBackend>, CaptureController) {
    let backend = Arc::new(SyntheticCameraBackend::new());
    let controller = CaptureController::new(Arc::clone(&backend) as Arc<dyn CameraBackend>);
    (backend, controller)
}

/// Creates a controller already holding a reviewed photo from a live capture.
#[allow(dead_code)]
pub fn reviewed_controller() -> CaptureController {
    let (_backend, mut controller) = controller_with_synthetic_camera();
    controller.start_camera().expect("camera should start");
    controller.capture_photo().expect("capture should work");
    controller
}

/// Creates an upload client whose transport returns the canned reply.
#[allow(dead_code)]
pub fn canned_client(status: u16, body: &str) -> UploadClient {
    let transport = Arc::new(CannedTransport {
        status,
        body: body.to_string(),
    });
    UploadClient::new(
        "https://scan.nutri-lens.test/api/upload",
        transport as Arc<dyn UploadTransport>,
    )
    .expect("canned client endpoint should validate")
}

/// Encodes a solid-color PNG of the given size for import tests.
#[allow(dead_code)]
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let pixels = image::RgbImage::from_pixel(width, height, image::Rgb([40, 180, 90]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(pixels)
        .write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .expect("png fixture should encode");
    bytes
}
