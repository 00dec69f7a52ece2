//! Integration tests for log redaction of encoded image payloads.

use nutri_lens_app::redact_image_data;

#[test]
fn log_redaction_tests_hides_payload_but_keeps_context() {
    let raw = "source=CameraStill data=data:image/jpeg;base64,aGVsbG8gd29ybGQ=";
    let redacted = redact_image_data(raw);

    assert!(redacted.starts_with("source=CameraStill data=data:<redacted"));
    assert!(!redacted.contains("base64"));
    assert!(!redacted.contains("aGVsbG8"));
}

#[test]
fn log_redaction_tests_passes_plain_text_through() {
    let raw = "facing=environment frame=1920x1080";
    assert_eq!(redact_image_data(raw), raw);
}
