//! Saving a class's subject checklist as a batch of membership calls.

mod common;

use std::collections::BTreeSet;

use serde_json::json;

use school::screens::classes::{
    ClassSubjectsState, SelectClassReq, ToggleSubjectReq, CANCEL_SUBJECTS, CONFIRM_SUBJECTS, SAVE_SUBJECTS,
    SELECT_CLASS, SUBJECTS, SUBJECTS_CONFIRM, TOGGLE_SUBJECT,
};
use school::{ConfirmState, Level, Outcome, Phase};

const MEMBERS: &[&str] = &[
    "view_classsubject",
    "add_classsubject",
    "delete_classsubject",
];

fn seed_class(h: &common::Harness) {
    h.seed(
        "class-subjects",
        vec![
            json!({ "id": 101, "student_class": 1, "subject": 10 }),
            json!({ "id": 102, "student_class": 1, "subject": 11 }),
            json!({ "id": 103, "student_class": 2, "subject": 10 }),
        ],
    );
}

fn subjects(h: &common::Harness) -> ClassSubjectsState {
    h.admin.get_as(SUBJECTS).unwrap()
}

fn flow(h: &common::Harness) -> ConfirmState {
    h.admin.get_as(SUBJECTS_CONFIRM).unwrap()
}

async fn toggle(h: &common::Harness, subject: i64) {
    h.admin.emit(TOGGLE_SUBJECT, ToggleSubjectReq { subject }).await;
}

#[tokio::test]
async fn selecting_a_class_loads_its_rows() {
    let h = common::signed_in(MEMBERS).await;
    seed_class(&h);
    h.clear_calls();

    h.admin.emit(SELECT_CLASS, SelectClassReq { class_id: 1 }).await;

    let state = subjects(&h);
    assert_eq!(state.class_id, Some(1));
    assert_eq!(state.rows.len(), 2);
    assert_eq!(state.selected, BTreeSet::from([10, 11]));
    assert!(!state.loading);

    let calls = h.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].path, "/api/class-subjects/");
    assert_eq!(calls[0].query.as_deref(), Some("student_class=1"));
}

#[tokio::test]
async fn save_stages_the_diff_and_confirm_runs_it() {
    let h = common::signed_in(MEMBERS).await;
    seed_class(&h);
    h.admin.emit(SELECT_CLASS, SelectClassReq { class_id: 1 }).await;

    toggle(&h, 11).await;
    toggle(&h, 12).await;
    toggle(&h, 13).await;
    h.admin.emit(SAVE_SUBJECTS, ()).await;

    let staged = flow(&h);
    assert_eq!(staged.phase, Phase::Staged);
    assert_eq!(
        staged.summary.as_deref(),
        Some("Update subjects of class #1: add 2, remove 1")
    );
    assert!(h.writes().is_empty());

    h.admin.emit(CONFIRM_SUBJECTS, ()).await;

    let mut writes = h.writes();
    writes.sort();
    assert_eq!(
        writes,
        vec![
            "DELETE /api/class-subjects/102/",
            "POST /api/class-subjects/",
            "POST /api/class-subjects/",
        ]
    );
    assert_eq!(flow(&h).phase, Phase::Settled(Outcome::Success));

    let state = subjects(&h);
    assert_eq!(state.selected, BTreeSet::from([10, 12, 13]));
    assert_eq!(state.rows.len(), 3);
    assert!(h
        .notifications()
        .iter()
        .any(|n| n.level == Level::Success && n.message == "Class subjects updated"));

    // Other classes are untouched.
    assert!(h.rows("class-subjects").iter().any(|r| r["id"] == json!(103)));
}

#[tokio::test]
async fn unchanged_checklist_stages_nothing() {
    let h = common::signed_in(MEMBERS).await;
    seed_class(&h);
    h.admin.emit(SELECT_CLASS, SelectClassReq { class_id: 1 }).await;

    toggle(&h, 11).await;
    toggle(&h, 11).await;
    h.admin.emit(SAVE_SUBJECTS, ()).await;

    assert_eq!(flow(&h).phase, Phase::Idle);
    assert!(h.notifications().iter().any(|n| n.level == Level::Info));
    h.admin.emit(CONFIRM_SUBJECTS, ()).await;
    assert!(h.writes().is_empty());
}

#[tokio::test]
async fn removal_needs_delete_permission() {
    let h = common::signed_in(&["view_classsubject", "add_classsubject"]).await;
    seed_class(&h);
    h.admin.emit(SELECT_CLASS, SelectClassReq { class_id: 1 }).await;

    toggle(&h, 10).await;
    h.admin.emit(SAVE_SUBJECTS, ()).await;

    assert_eq!(flow(&h).phase, Phase::Idle);
    assert!(h.notifications().iter().any(|n| n.level == Level::Warning));
    assert!(h.writes().is_empty());
}

#[tokio::test]
async fn cancel_drops_the_plan() {
    let h = common::signed_in(MEMBERS).await;
    seed_class(&h);
    h.admin.emit(SELECT_CLASS, SelectClassReq { class_id: 1 }).await;

    toggle(&h, 12).await;
    h.admin.emit(SAVE_SUBJECTS, ()).await;
    h.admin.emit(CANCEL_SUBJECTS, ()).await;
    h.admin.emit(CONFIRM_SUBJECTS, ()).await;

    assert_eq!(flow(&h).phase, Phase::Idle);
    assert!(h.writes().is_empty());
}

#[tokio::test]
async fn failed_batch_reports_and_reloads() {
    let h = common::signed_in(MEMBERS).await;
    seed_class(&h);
    h.admin.emit(SELECT_CLASS, SelectClassReq { class_id: 1 }).await;
    h.fail_writes(403, json!({ "detail": "You do not have permission to perform this action." }));

    toggle(&h, 12).await;
    h.admin.emit(SAVE_SUBJECTS, ()).await;
    h.clear_calls();
    h.admin.emit(CONFIRM_SUBJECTS, ()).await;

    assert_eq!(h.writes(), vec!["POST /api/class-subjects/"]);
    assert_eq!(h.count("GET", "/api/class-subjects/"), 1);

    let state = flow(&h);
    assert_eq!(state.phase, Phase::Idle);
    assert_eq!(state.last_outcome, Some(Outcome::Error));

    let error = h
        .notifications()
        .into_iter()
        .find(|n| n.level == Level::Error)
        .unwrap();
    assert_eq!(error.status, Some(403));
    assert_eq!(subjects(&h).selected, BTreeSet::from([10, 11]));
}

#[tokio::test]
async fn checklist_needs_view_permission() {
    let h = common::signed_in(&["add_classsubject"]).await;
    seed_class(&h);
    h.clear_calls();

    h.admin.emit(SELECT_CLASS, SelectClassReq { class_id: 1 }).await;

    assert!(h.calls().is_empty());
    let state = subjects(&h);
    assert_eq!(state.class_id, Some(1));
    assert!(state.rows.is_empty());
    assert!(!state.loading);
    assert!(state.error.unwrap().contains("view_classsubject"));
}

#[tokio::test]
async fn reverted_checklist_drops_the_staged_plan() {
    let h = common::signed_in(MEMBERS).await;
    seed_class(&h);
    h.admin.emit(SELECT_CLASS, SelectClassReq { class_id: 1 }).await;

    toggle(&h, 12).await;
    h.admin.emit(SAVE_SUBJECTS, ()).await;
    assert_eq!(flow(&h).phase, Phase::Staged);

    toggle(&h, 12).await;
    h.admin.emit(SAVE_SUBJECTS, ()).await;
    assert_eq!(flow(&h).phase, Phase::Idle);

    h.admin.emit(CONFIRM_SUBJECTS, ()).await;
    assert!(h.writes().is_empty());
}
