use news_harvest::AppError;
use news_harvest::models::{DateParsePolicy, RunOutcome, StopReason};

use super::*;

fn pages_with_relative_timestamp() -> Vec<FakePage> {
    vec![
        FakePage::from_rows(&[
            ("April 10, 2024", "First page", "kept", None),
            ("April 9, 2024", "Also first page", "kept", None),
        ]),
        FakePage::from_rows(&[
            ("April 8, 2024", "Before the bad one", "read", None),
            ("2 hours ago", "Relative timestamp", "unparseable", None),
            ("April 7, 2024", "After the bad one", "read", None),
        ]),
    ]
}

#[tokio::test]
async fn test_unparseable_date_aborts_by_default() {
    let tmp = tempfile::tempdir().unwrap();
    let config = test_config(tmp.path());
    assert_eq!(config.output.date_parse_policy, DateParsePolicy::Abort);
    let export_path = config.output.export_path.clone();

    let (session, log) = FakeSession::new(pages_with_relative_timestamp(), &export_path);
    let result = test_harvester(config).run(session).await;

    match result {
        Err(AppError::DateParse { text }) => assert_eq!(text, "2 hours ago"),
        other => panic!("expected a date parse error, got {:?}", other),
    }

    // Only the fully processed first page reached the file
    let rows = read_rows(&export_path);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1][1], "Also first page");
    assert_eq!(log.borrow().close_calls, 1);
}

#[tokio::test]
async fn test_unparseable_date_skipped_when_configured() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = test_config(tmp.path());
    config.output.date_parse_policy = DateParsePolicy::Skip;
    let export_path = config.output.export_path.clone();

    let (session, log) = FakeSession::new(pages_with_relative_timestamp(), &export_path);
    let report = test_harvester(config).run(session).await.unwrap();

    assert_eq!(
        report.outcome,
        RunOutcome::Completed {
            stop: StopReason::NoMorePages
        }
    );
    assert_eq!(report.entries_kept, 4);

    let titles: Vec<String> = read_rows(&export_path).into_iter().map(|row| row[1].clone()).collect();
    assert_eq!(
        titles,
        vec!["First page", "Also first page", "Before the bad one", "After the bad one"]
    );
    assert_eq!(log.borrow().close_calls, 1);
}

#[tokio::test]
async fn test_rerun_overwrites_previous_export() {
    let tmp = tempfile::tempdir().unwrap();
    let config = test_config(tmp.path());
    let export_path = config.output.export_path.clone();

    let pages = vec![FakePage::from_rows(&[
        ("April 10, 2024", "Only story", "kept", None),
    ])];

    for _ in 0..2 {
        let (session, _log) = FakeSession::new(pages.clone(), &export_path);
        test_harvester(config.clone()).run(session).await.unwrap();
    }

    assert_eq!(data_rows(&export_path), 1);
}

#[tokio::test]
async fn test_export_failure_is_returned_and_session_released() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = test_config(tmp.path());
    // A directory where the export file should go
    let blocked = tmp.path().join("blocked");
    std::fs::create_dir_all(&blocked).unwrap();
    config.output.export_path = blocked.clone();

    let pages = vec![
        FakePage::from_rows(&[("April 10, 2024", "First page", "kept", None)]),
        FakePage::from_rows(&[("April 9, 2024", "Second page", "never reached", None)]),
    ];

    let (session, log) = FakeSession::new(pages, &blocked);
    let result = test_harvester(config).run(session).await;

    assert!(matches!(result, Err(AppError::Io(_))), "got {:?}", result);

    let log = log.borrow();
    assert_eq!(log.pages_read, vec![0]);
    assert!(log.rows_at_page_turn.is_empty());
    assert_eq!(log.close_calls, 1);
    assert!(blocked.is_dir());
}
