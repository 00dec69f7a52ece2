//! Integration tests for the navigation path of a successful analysis.

mod common;

use common::{canned_client, reviewed_controller};
use nutri_lens_app::AnalysisResolution;
use nutri_lens_ui::ViewStage;

#[test]
fn analysis_redirect_tests_success_resolves_to_navigation() {
    let mut controller = reviewed_controller();
    let client = canned_client(200, r#"{"success": true, "redirect_url": "/results/42"}"#);

    let resolution = controller
        .analyze_photo(&client, 0)
        .expect("analysis should run");

    assert_eq!(
        resolution,
        AnalysisResolution::Navigate {
            redirect_url: "/results/42".to_string(),
            narrative_cleared: true,
        }
    );

    // The loader stays up until navigation replaces the view.
    assert_eq!(controller.view().stage, ViewStage::Uploading);
    assert!(controller.view().control_set().loader_visible);
    assert!(controller.view().status_line().is_none());
    assert!(controller.view().error_banner.is_none());
}

#[test]
fn analysis_redirect_tests_success_without_destination_is_a_failure() {
    let mut controller = reviewed_controller();
    let client = canned_client(200, r#"{"success": true}"#);

    let resolution = controller
        .analyze_photo(&client, 0)
        .expect("analysis should run");

    // A success verdict with nowhere to go violates the contract and must
    // never leave the user stranded on the loader.
    assert!(matches!(
        resolution,
        AnalysisResolution::Failed { .. }
    ));
    assert_eq!(controller.view().stage, ViewStage::Review);
}

#[test]
fn analysis_redirect_tests_requires_a_reviewed_photo() {
    let (_backend, mut controller) = common::controller_with_synthetic_camera();
    let client = canned_client(200, r#"{"success": true, "redirect_url": "/results/1"}"#);

    controller
        .analyze_photo(&client, 0)
        .expect_err("analysis without a photo should be rejected");
}
