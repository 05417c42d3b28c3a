use dlq_core::{Job, QueueDocument, TransitionError};
use pretty_assertions::assert_eq;

fn urls(jobs: impl IntoIterator<Item = impl AsRef<str>>) -> Vec<String> {
    jobs.into_iter().map(|j| j.as_ref().to_string()).collect()
}

fn pending(doc: &QueueDocument) -> Vec<String> {
    urls(doc.pending().map(Job::as_str))
}

fn in_flight(doc: &QueueDocument) -> Vec<String> {
    urls(doc.in_flight().iter().map(Job::as_str))
}

fn finished(doc: &QueueDocument) -> Vec<String> {
    urls(doc.finished().iter().map(Job::as_str))
}

#[test]
fn dispatch_follows_fifo_order() {
    let mut doc = QueueDocument::with_pending(["A", "B", "C"]);
    let mut order = Vec::new();
    while doc.has_pending() {
        let job = doc.dispatch().unwrap();
        order.push(job.to_string());
        doc.complete(&job).unwrap();
    }
    assert_eq!(order, vec!["A", "B", "C"]);
    assert_eq!(finished(&doc), vec!["A", "B", "C"]);
}

#[test]
fn dispatch_on_empty_queue_fails() {
    let mut doc = QueueDocument::empty();
    assert_eq!(doc.dispatch(), Err(TransitionError::EmptyQueue));
    assert!(doc.is_drained());
}

#[test]
fn complete_requires_job_in_flight() {
    let mut doc = QueueDocument::with_pending(["u1"]);
    let stranger = Job::from("u1");
    assert_eq!(
        doc.complete(&stranger),
        Err(TransitionError::NotInFlight(stranger.clone()))
    );
    assert_eq!(pending(&doc), vec!["u1"]);
    assert!(doc.finished().is_empty());
}

#[test]
fn match_by_substring_of_url() {
    let mut doc = QueueDocument::with_pending(["https://x/report-2024.pdf"]);
    doc.dispatch().unwrap();

    let matched = doc.match_in_flight("report-2024.pdf").cloned();
    assert_eq!(matched, Some(Job::from("https://x/report-2024.pdf")));

    assert_eq!(doc.match_in_flight("unrelated.pdf"), None);
    assert_eq!(in_flight(&doc), vec!["https://x/report-2024.pdf"]);
}

#[test]
fn empty_token_never_matches() {
    let mut doc = QueueDocument::with_pending(["https://x/a"]);
    doc.dispatch().unwrap();
    assert_eq!(doc.match_in_flight(""), None);
}

#[test]
fn match_returns_first_in_flight_hit() {
    let mut doc = QueueDocument::with_pending(["https://x/a.pdf?v=1", "https://x/a.pdf?v=2"]);
    doc.dispatch().unwrap();
    doc.dispatch().unwrap();
    assert_eq!(
        doc.match_in_flight("a.pdf").map(Job::as_str),
        Some("https://x/a.pdf?v=1")
    );
}

#[test]
fn complete_removes_first_exact_match_only() {
    let mut doc = QueueDocument::with_pending(["dup", "dup"]);
    let job = doc.dispatch().unwrap();
    doc.dispatch().unwrap();
    doc.complete(&job).unwrap();
    assert_eq!(in_flight(&doc), vec!["dup"]);
    assert_eq!(finished(&doc), vec!["dup"]);
}

#[test]
fn drain_scenario_ends_with_everything_finished() {
    let mut doc = QueueDocument::with_pending(["u1", "u2"]);
    for _ in 0..2 {
        let job = doc.dispatch().unwrap();
        doc.complete(&job).unwrap();
    }
    assert!(pending(&doc).is_empty());
    assert!(in_flight(&doc).is_empty());
    assert_eq!(finished(&doc), vec!["u1", "u2"]);
    assert!(doc.is_drained());
}

#[test]
fn no_job_is_created_or_lost_across_transitions() {
    let enqueued = ["a", "b", "c", "d", "e"];
    let mut doc = QueueDocument::with_pending(enqueued);
    let all = |doc: &QueueDocument| {
        let mut every: Vec<String> = pending(doc);
        every.extend(in_flight(doc));
        every.extend(finished(doc));
        every.sort();
        every
    };
    let expected = urls(enqueued);

    let first = doc.dispatch().unwrap();
    assert_eq!(all(&doc), expected);
    let second = doc.dispatch().unwrap();
    assert_eq!(all(&doc), expected);
    doc.complete(&second).unwrap();
    assert_eq!(all(&doc), expected);
    doc.recover_in_flight();
    assert_eq!(all(&doc), expected);
    assert_eq!(pending(&doc)[0], first.to_string());
    assert_eq!(doc.total_jobs(), enqueued.len());
}

#[test]
fn recovery_prepends_in_flight_in_order() {
    let mut doc = QueueDocument::with_pending(["u1", "u2", "u3"]);
    doc.dispatch().unwrap();
    doc.dispatch().unwrap();

    assert_eq!(doc.recover_in_flight(), 2);
    assert_eq!(pending(&doc), vec!["u1", "u2", "u3"]);
    assert!(in_flight(&doc).is_empty());

    // A second pass has nothing left to move.
    assert_eq!(doc.recover_in_flight(), 0);
    assert_eq!(pending(&doc), vec!["u1", "u2", "u3"]);
}
