use dlq_core::{Job, QueueDocument};
use pretty_assertions::assert_eq;
use serde_json::json;

fn init_logging() {
    dlq_logging::initialize_for_tests();
}

#[test]
fn document_uses_queue_downloading_finished_keys() {
    init_logging();
    let mut doc = QueueDocument::with_pending(["u2", "u3"]);
    doc.dispatch().unwrap();

    let value = serde_json::to_value(&doc).unwrap();
    assert_eq!(
        value,
        json!({ "queue": ["u3"], "downloading": ["u2"], "finished": [] })
    );
}

#[test]
fn empty_document_matches_setup_layout() {
    let value = serde_json::to_value(QueueDocument::empty()).unwrap();
    assert_eq!(value, json!({ "queue": [], "downloading": [], "finished": [] }));
}

#[test]
fn missing_bucket_is_rejected() {
    let result = serde_json::from_str::<QueueDocument>(r#"{"queue": [], "finished": []}"#);
    assert!(result.is_err());
}

#[test]
fn non_string_job_is_rejected() {
    let result = serde_json::from_str::<QueueDocument>(
        r#"{"queue": [1], "downloading": [], "finished": []}"#,
    );
    assert!(result.is_err());
}

#[test]
fn parsed_document_keeps_bucket_contents() {
    let doc: QueueDocument = serde_json::from_str(
        r#"{"queue": ["u2"], "downloading": ["u1"], "finished": ["u0"]}"#,
    )
    .unwrap();
    assert_eq!(doc.pending().collect::<Vec<_>>(), vec![&Job::from("u2")]);
    assert_eq!(doc.in_flight(), &[Job::from("u1")]);
    assert_eq!(doc.finished(), &[Job::from("u0")]);
}
