//! Integration tests for file import sizing through the controller.

mod common;

use common::{controller_with_synthetic_camera, png_bytes};
use nutri_lens_core::PhotoSource;
use nutri_lens_ui::ViewStage;

#[test]
fn import_downscale_tests_shrinks_oversized_images_to_bound() {
    let (_backend, mut controller) = controller_with_synthetic_camera();

    controller
        .import_photo(&png_bytes(2_048, 1_024))
        .expect("import should work");

    let photo = controller.view().photo.as_ref().expect("photo presented");
    assert_eq!((photo.width, photo.height), (1_024, 512));
    assert_eq!(photo.source, PhotoSource::FileImport);

    // The encoded payload really is the downscaled image, not a relabel.
    let jpeg = photo.data_url.decode_bytes().expect("payload should decode");
    let reloaded = image::load_from_memory(&jpeg).expect("jpeg should decode");
    assert_eq!(
        image::GenericImageView::dimensions(&reloaded),
        (1_024, 512)
    );
}

#[test]
fn import_downscale_tests_keeps_images_inside_bound_untouched() {
    let (_backend, mut controller) = controller_with_synthetic_camera();

    controller
        .import_photo(&png_bytes(640, 480))
        .expect("import should work");

    let photo = controller.view().photo.as_ref().expect("photo presented");
    assert_eq!((photo.width, photo.height), (640, 480));
}

#[test]
fn import_downscale_tests_undecodable_bytes_fail_silently() {
    let (_backend, mut controller) = controller_with_synthetic_camera();

    controller
        .import_photo(b"definitely not an image")
        .expect_err("import should fail");

    // Silent for the user: still live, no banner, nothing presented.
    assert_eq!(controller.view().stage, ViewStage::Live);
    assert!(controller.view().error_banner.is_none());
    assert!(controller.view().photo.is_none());
}
