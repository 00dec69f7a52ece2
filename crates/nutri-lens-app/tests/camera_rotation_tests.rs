//! Integration tests for camera rotation and facing persistence.

mod common;

use common::controller_with_synthetic_camera;
use nutri_lens_camera::Facing;

#[test]
fn camera_rotation_tests_alternates_between_facings() {
    let (_backend, mut controller) = controller_with_synthetic_camera();

    let report = controller.start_camera().expect("camera should start");
    assert_eq!(report.facing, Facing::Environment);

    let report = controller.rotate_camera().expect("rotate should work");
    assert_eq!(report.facing, Facing::User);

    let report = controller.rotate_camera().expect("rotate should work");
    assert_eq!(report.facing, Facing::Environment);
}

#[test]
fn camera_rotation_tests_failed_rotate_keeps_requested_facing() {
    let (backend, mut controller) = controller_with_synthetic_camera();
    controller.start_camera().expect("camera should start");

    backend.deny_access("denied while rotating");
    controller
        .rotate_camera()
        .expect_err("rotate should fail while denied");

    // The user asked for the front camera; the preference sticks so the next
    // successful start lands there.
    assert_eq!(controller.session().facing(), Facing::User);
    assert!(!controller.session().has_active_stream());

    backend.allow_access();
    let report = controller.start_camera().expect("retry should work");
    assert_eq!(report.facing, Facing::User);
}
