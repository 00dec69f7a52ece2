//! Integration tests for analysis failures returning control to review.

mod common;

use common::{canned_client, reviewed_controller};
use nutri_lens_app::AnalysisResolution;
use nutri_lens_analysis_contract::GENERIC_FAILURE_MESSAGE;
use nutri_lens_ui::ViewStage;

#[test]
fn analysis_failure_tests_server_message_reaches_the_banner() {
    let mut controller = reviewed_controller();
    let client = canned_client(
        422,
        r#"{"success": false, "error": "Could not identify product"}"#,
    );

    let resolution = controller
        .analyze_photo(&client, 0)
        .expect("analysis should run");

    assert_eq!(
        resolution,
        AnalysisResolution::Failed {
            message: "Could not identify product".to_string(),
            narrative_cleared: true,
        }
    );
    assert_eq!(controller.view().stage, ViewStage::Review);
    assert_eq!(
        controller.view().error_banner.as_deref(),
        Some("Could not identify product")
    );

    // Review controls come back and the photo stays, so the user can retry
    // or retake without re-capturing.
    let controls = controller.view().control_set();
    assert!(controls.review_controls_enabled);
    assert!(!controls.loader_visible);
    assert!(controller.view().photo.is_some());
}

#[test]
fn analysis_failure_tests_blank_server_error_falls_back_to_generic() {
    let mut controller = reviewed_controller();
    let client = canned_client(500, r#"{"success": false, "error": "  "}"#);

    let resolution = controller
        .analyze_photo(&client, 0)
        .expect("analysis should run");

    assert_eq!(
        resolution,
        AnalysisResolution::Failed {
            message: GENERIC_FAILURE_MESSAGE.to_string(),
            narrative_cleared: true,
        }
    );
}

#[test]
fn analysis_failure_tests_http_failure_ignores_success_body() {
    let mut controller = reviewed_controller();
    let client = canned_client(502, r#"{"success": true, "redirect_url": "/results/9"}"#);

    let resolution = controller
        .analyze_photo(&client, 0)
        .expect("analysis should run");

    assert!(matches!(resolution, AnalysisResolution::Failed { .. }));
    assert_eq!(controller.view().stage, ViewStage::Review);
}

#[test]
fn analysis_failure_tests_second_attempt_clears_previous_banner() {
    let mut controller = reviewed_controller();
    let failing = canned_client(422, r#"{"success": false, "error": "Could not identify product"}"#);
    let succeeding = canned_client(200, r#"{"success": true, "redirect_url": "/results/3"}"#);

    controller
        .analyze_photo(&failing, 0)
        .expect("first attempt should run");
    assert!(controller.view().error_banner.is_some());

    let resolution = controller
        .analyze_photo(&succeeding, 1_000)
        .expect("second attempt should run");
    assert!(matches!(resolution, AnalysisResolution::Navigate { .. }));
    assert!(controller.view().error_banner.is_none());
}
