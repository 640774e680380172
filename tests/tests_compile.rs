//! End-to-end orchestrator behavior: reference counting with cache
//! reuse, focused completion, diagnostics, and batch lifetimes.

mod helpers;

use javelin::syntax::CursorContext;
use javelin::{RefCount, Severity, Tier};

use helpers::source_fixtures::{A_RENAMED, BROKEN_JAVA, C_JAVA, FOCUS_JAVA, WILDCARD_IMPORT_JAVA};
use helpers::{ab_service, foo_ptr, pos, service};

#[test]
fn counts_every_call_site() {
    let (service, a, _) = ab_service();
    service.open("C.java", C_JAVA);

    assert_eq!(service.count_references(a, &foo_ptr()).unwrap(), RefCount::Exact(3));
}

#[test]
fn second_count_is_served_from_the_index() {
    let (service, a, _) = ab_service();

    assert_eq!(service.count_references(a, &foo_ptr()).unwrap(), RefCount::Exact(3));
    // No edits in between: the cached per-file index answers this one.
    assert_eq!(service.count_references(a, &foo_ptr()).unwrap(), RefCount::Exact(3));
}

#[test]
fn renaming_the_target_invalidates_counts() {
    let (service, a, _) = ab_service();
    assert_eq!(service.count_references(a, &foo_ptr()).unwrap(), RefCount::Exact(3));

    service.open("A.java", A_RENAMED);
    // The callers still say foo, but nothing declares it anymore.
    assert_eq!(service.count_references(a, &foo_ptr()).unwrap(), RefCount::Exact(0));
}

#[test]
fn finds_reference_locations() {
    let (service, _, b) = ab_service();

    let result = service
        .find_references(b, pos(6, 11))
        .expect("request must succeed");
    assert!(!result.saturated);
    assert_eq!(result.locations.len(), 3);
    let lines: Vec<usize> = result
        .locations
        .iter()
        .map(|(file, span)| {
            assert_eq!(*file, b);
            span.start.line
        })
        .collect();
    assert_eq!(lines, vec![6, 7, 8]);
}

#[test]
fn resolves_definition_from_a_call_site() {
    let (service, a, b) = ab_service();

    let target = service
        .find_definition(b, pos(6, 11))
        .expect("request must succeed")
        .expect("call site must resolve");
    assert_eq!(target.0, a);
    assert_eq!(target.1.start, pos(3, 23));
}

#[test]
fn nothing_under_the_cursor_is_not_an_error() {
    let (service, _, b) = ab_service();

    // Whitespace on a blank line.
    let result = service.find_references(b, pos(1, 0)).unwrap();
    assert!(result.locations.is_empty());
}

#[test]
fn focused_compile_reports_the_cursor_context() {
    let service = service();
    let file = service.open("C.java", FOCUS_JAVA);

    let batch = service
        .compile_focus(file, pos(5, 15))
        .expect("focused compile must succeed");
    assert_eq!(batch.tier(), Tier::Focused);
    assert_eq!(batch.cursor_context(), Some(CursorContext::MemberSelect));
    // The field is visible for completion even though the statement at
    // the cursor was left unterminated.
    assert!(batch.declarations_in(file).iter().any(|d| d.name == "field"));
}

#[test]
fn batches_release_on_drop() {
    let (service, a, _) = ab_service();
    assert_eq!(service.live_batches(), 0);

    let batch = service.compile_file(a).unwrap();
    assert_eq!(service.live_batches(), 1);
    drop(batch);
    assert_eq!(service.live_batches(), 0);
}

#[test]
fn diagnostics_surface_lexical_errors() {
    let service = service();
    let good = service.open("C.java", C_JAVA);
    let bad = service.open("D.java", BROKEN_JAVA);

    let diagnostics = service.report_errors(&[good, bad]).unwrap();
    assert!(diagnostics.iter().any(|d| d.file == bad && d.is_error()));
    assert!(!diagnostics.iter().any(|d| d.file == good && d.is_error()));
}

#[test]
fn lints_run_only_in_the_diagnostics_tier() {
    let service = service();
    let file = service.open("W.java", WILDCARD_IMPORT_JAVA);

    let diagnostics = service.report_errors(&[file]).unwrap();
    assert!(
        diagnostics
            .iter()
            .any(|d| d.severity == Severity::Warning && d.message.contains("wildcard"))
    );

    // The whole-file tier must not pay for lints.
    let batch = service.compile_file(file).unwrap();
    assert!(batch.output().diagnostics.is_empty());
}

#[test]
fn unknown_file_reports_not_found_without_stalling() {
    let service = service();
    let ghost = javelin::FileId::new(7);

    // Both the read-lock path and the write-lock (focused) path must
    // surface the error straight from the guard they already hold.
    let err = service.compile_file(ghost).unwrap_err();
    assert!(matches!(err, javelin::Error::FileNotFound(_)));
    let err = service.compile_focus(ghost, pos(0, 0)).unwrap_err();
    assert!(matches!(err, javelin::Error::FileNotFound(_)));

    // The failed requests leaked no batches.
    assert_eq!(service.live_batches(), 0);
}

#[test]
fn missing_file_fails_the_request_only() {
    let (service, a, _) = ab_service();
    service.close("B.java");

    // B is gone; a fresh request against A must still work even though
    // the candidate walk can no longer see B.
    assert_eq!(service.count_references(a, &foo_ptr()).unwrap(), RefCount::Exact(0));
}
