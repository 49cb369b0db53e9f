//! Student list filters, spreadsheet upload and notice attachments.

mod common;

use std::time::Duration;

use serde_json::json;

use school::model::{Notice, Student};
use school::screens::students::{
    UploadState, CURRENT_FILTER, FILTER, PAGE, UPLOAD, UPLOAD_CANCEL, UPLOAD_CONFIRM, UPLOAD_CONFIRM_REQ,
    UPLOAD_SELECT, UPLOAD_SUBMIT,
};
use school::screens::notices::ATTACH;
use school::{ConfirmState, Level, ListInfo, PageReq, Phase, SelectFileReq, StudentFilter, UpdateFieldReq};

const STUDENTS: &[&str] = &["view_student", "add_student"];

fn xlsx(name: &str, size: usize) -> SelectFileReq {
    SelectFileReq {
        file_name: name.into(),
        mime: "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".into(),
        bytes: vec![0x50; size],
    }
}

fn student_gets(h: &common::Harness) -> Vec<Option<String>> {
    h.calls()
        .into_iter()
        .filter(|c| c.method == "GET" && c.path == "/api/students/")
        .map(|c| c.query)
        .collect()
}

#[tokio::test]
async fn filters_are_debounced() {
    let h = common::signed_in(STUDENTS).await;
    h.clear_calls();

    let typing = StudentFilter {
        search: "ra".into(),
        ..Default::default()
    };
    let typed = StudentFilter {
        search: "ram".into(),
        ..Default::default()
    };
    tokio::join!(h.admin.emit(FILTER, typing), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        h.admin.emit(FILTER, typed.clone()).await;
    });

    assert_eq!(
        student_gets(&h),
        vec![Some("search=ram&page=1&page_size=25".to_string())]
    );
    assert_eq!(h.admin.get_as::<StudentFilter>(CURRENT_FILTER), Some(typed));
}

#[tokio::test]
async fn class_filter_and_paging_reach_the_server() {
    let h = common::signed_in(STUDENTS).await;
    h.seed(
        "students",
        vec![
            json!({ "first_name": "Asha", "last_name": "Rai", "student_class": 1, "section": 1 }),
            json!({ "first_name": "Bikash", "last_name": "Lama", "student_class": 2, "section": 1 }),
        ],
    );
    h.clear_calls();

    let by_class = StudentFilter {
        student_class: Some(1),
        ..Default::default()
    };
    h.admin.emit(FILTER, by_class).await;

    let rows: Vec<Student> = h.admin.get_as("students/list").unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].first_name, "Asha");
    assert_eq!(
        h.admin.get_as::<ListInfo>("students/list-info"),
        Some(ListInfo { total: 1, has_next: false })
    );

    h.admin.emit(PAGE, PageReq { page: 2 }).await;
    assert_eq!(
        student_gets(&h),
        vec![
            Some("student_class=1&page=1&page_size=25".to_string()),
            Some("student_class=1&page=2&page_size=25".to_string()),
        ]
    );
}

#[tokio::test]
async fn only_spreadsheets_can_be_selected() {
    let h = common::signed_in(STUDENTS).await;

    h.admin.emit(UPLOAD_SELECT, xlsx("intake.csv", 10)).await;
    let state: UploadState = h.admin.get_as(UPLOAD).unwrap();
    assert!(state.file.is_none());
    assert!(state.error.unwrap().contains("intake.csv"));

    h.admin.emit(UPLOAD_SUBMIT, ()).await;
    let flow: ConfirmState = h.admin.get_as(UPLOAD_CONFIRM).unwrap();
    assert_eq!(flow.phase, Phase::Idle);
    assert!(h.writes().is_empty());
}

#[tokio::test]
async fn bulk_upload_after_confirm() {
    let h = common::signed_in(STUDENTS).await;

    h.admin.emit(UPLOAD_SELECT, xlsx("intake.xlsx", 64)).await;
    h.admin.emit(UPLOAD_SUBMIT, ()).await;

    let flow: ConfirmState = h.admin.get_as(UPLOAD_CONFIRM).unwrap();
    assert_eq!(flow.phase, Phase::Staged);
    assert_eq!(
        flow.summary.as_deref(),
        Some("Upload students from intake.xlsx (64 bytes)")
    );
    assert!(h.writes().is_empty());

    h.clear_calls();
    h.admin.emit(UPLOAD_CONFIRM_REQ, ()).await;

    assert_eq!(h.writes(), vec!["POST /api/students/bulk-upload/"]);
    assert_eq!(
        h.backend.lock().unwrap().uploads,
        vec![("intake.xlsx".to_string(), 64)]
    );
    assert_eq!(student_gets(&h).len(), 1);

    let state: UploadState = h.admin.get_as(UPLOAD).unwrap();
    assert!(state.file.is_none());
    let result = state.last_result.unwrap();
    assert_eq!(result.created, 2);
    assert_eq!(result.errors.len(), 1);

    let rows: Vec<Student> = h.admin.get_as("students/list").unwrap();
    assert_eq!(rows.len(), 2);

    let notes = h.notifications();
    assert_eq!(notes[0].level, Level::Success);
    assert_eq!(notes[0].message, "2 students uploaded, 1 rows rejected");
}

#[tokio::test]
async fn upload_needs_add_permission() {
    let h = common::signed_in(&["view_student"]).await;

    h.admin.emit(UPLOAD_SELECT, xlsx("intake.xlsx", 64)).await;
    h.admin.emit(UPLOAD_SUBMIT, ()).await;
    h.admin.emit(UPLOAD_CONFIRM_REQ, ()).await;

    assert!(h.writes().is_empty());
    assert!(h.notifications().iter().any(|n| n.level == Level::Warning));
}

#[tokio::test]
async fn cancelled_upload_keeps_the_file() {
    let h = common::signed_in(STUDENTS).await;

    h.admin.emit(UPLOAD_SELECT, xlsx("intake.xlsx", 64)).await;
    h.admin.emit(UPLOAD_SUBMIT, ()).await;
    h.admin.emit(UPLOAD_CANCEL, ()).await;
    h.admin.emit(UPLOAD_CONFIRM_REQ, ()).await;

    assert!(h.writes().is_empty());
    let state: UploadState = h.admin.get_as(UPLOAD).unwrap();
    assert_eq!(state.file.unwrap().file_name, "intake.xlsx");
}

#[tokio::test]
async fn notice_attachment_goes_as_multipart() {
    let h = common::signed_in(&["view_notice", "add_notice"]).await;

    for (field, value) in [("title", "Sports day"), ("notice_date", "2026-10-20")] {
        h.admin
            .emit("notices/update-field", UpdateFieldReq::new(field, value))
            .await;
    }
    h.admin
        .emit(
            ATTACH,
            SelectFileReq {
                file_name: "circular.pdf".into(),
                mime: "application/pdf".into(),
                bytes: vec![7; 10],
            },
        )
        .await;
    h.admin.emit("notices/submit", ()).await;

    let flow: ConfirmState = h.admin.get_as("notices/confirm").unwrap();
    assert_eq!(flow.summary.as_deref(), Some("Create Notice with 1 attachment(s)"));

    h.admin.emit("notices/confirm", ()).await;
    assert_eq!(h.writes(), vec!["POST /api/notices/"]);

    let stored = &h.rows("notices")[0];
    assert_eq!(stored["title"], "Sports day");
    assert_eq!(stored["notice_date"], "2026-10-20");
    assert_eq!(stored["attachment"], "circular.pdf:10");

    let list: Vec<Notice> = h.admin.get_as("notices/list").unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].attachment.as_deref(), Some("circular.pdf:10"));
}

#[tokio::test]
async fn rejected_file_drops_the_staged_upload() {
    let h = common::signed_in(STUDENTS).await;

    h.admin.emit(UPLOAD_SELECT, xlsx("intake.xlsx", 64)).await;
    h.admin.emit(UPLOAD_SUBMIT, ()).await;
    assert_eq!(h.admin.get_as::<ConfirmState>(UPLOAD_CONFIRM).unwrap().phase, Phase::Staged);

    h.admin.emit(UPLOAD_SELECT, xlsx("intake.csv", 64)).await;
    h.admin.emit(UPLOAD_SUBMIT, ()).await;
    assert_eq!(h.admin.get_as::<ConfirmState>(UPLOAD_CONFIRM).unwrap().phase, Phase::Idle);

    h.admin.emit(UPLOAD_CONFIRM_REQ, ()).await;
    assert!(h.writes().is_empty());
    assert!(h.backend.lock().unwrap().uploads.is_empty());
}
