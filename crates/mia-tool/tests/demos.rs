use mia_test_example::{demo_dir, demo_names, testcase_path};
use mia_tool::assert_case;

#[test]
fn every_demo_script_passes_its_testcase() {
    let names = demo_names();
    assert!(!names.is_empty(), "expected demo scripts");

    for name in names {
        let report = assert_case(&demo_dir(&name), &testcase_path(&name))
            .unwrap_or_else(|error| panic!("demo {} failed: {}", name, error));
        assert!(
            report.accepted_responses > 0,
            "demo {} should submit at least one response",
            name
        );
    }
}

#[test]
fn enrollment_demo_records_follow_up_and_rejections() {
    let report = assert_case(
        &demo_dir("03-enrollment-form"),
        &testcase_path("03-enrollment-form"),
    )
    .expect("enrollment demo should pass");
    assert!(report.consent_complete);
    assert_eq!(report.follow_up_count, 1);
    assert_eq!(report.rejected_responses, 3);
}
