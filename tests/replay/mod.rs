use mirakle::host::{HostVersion, select_hook};
use mirakle::replay::{Event, load, parse, run};
use mirakle::timer::{MirakleTask, TaskKind};
use tempfile::tempdir;

const EVENTS: &str = r#"
# recorded from a remote build
{"event":"build_started","at":0}
{"event":"before_task","task":":uploadToRemote","at":100,"mirakle":true}
{"event":"after_task","task":":uploadToRemote","did_work":true,"at":2100,"mirakle":true}
{"event":"before_task","task":":app:lint","at":2100}
{"event":"after_task","task":":app:lint","did_work":false,"at":2200}
{"event":"before_task","task":":app:assemble","at":2200}
{"event":"after_task","task":":app:assemble","did_work":true,"at":64200}
{"event":"build_finished","at":65000}
"#;

fn replay(events: &[Event], watch: &[String]) -> String {
    let mut out = Vec::new();
    let summary = run(events, watch, select_hook(HostVersion::new(4, 0, 0)), &mut out)
        .expect("replay");
    assert!(summary.finished);
    String::from_utf8(out).expect("utf8")
}

#[test]
fn parse_tags_plugin_tasks() {
    let events = parse(EVENTS).expect("parse events");
    assert_eq!(events.len(), 8);

    match &events[1] {
        Event::BeforeTask { task, at } => {
            assert_eq!(*at, 100);
            assert_eq!(task.kind, TaskKind::Mirakle(MirakleTask::UploadToRemote));
        }
        other => panic!("unexpected event {other:?}"),
    }

    match &events[3] {
        Event::BeforeTask { task, .. } => assert_eq!(task.kind, TaskKind::External),
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn parse_rejects_unknown_plugin_task() {
    let err = parse(r#"{"event":"before_task","task":":deploy","at":1,"mirakle":true}"#)
        .expect_err("unknown task");
    assert!(err.starts_with("line 1:"));
}

#[test]
fn parse_rejects_bad_json() {
    assert!(parse("{\"event\":\"nope\"}").is_err());
}

#[test]
fn replay_prints_total_then_tasks_in_completion_order() {
    let events = parse(EVENTS).expect("parse events");
    assert_eq!(
        replay(&events, &[]),
        "Total time : 1 mins 5.0 secs\n\
         Task uploadToRemote took : 2.0 secs\n\
         Task app:assemble took : 1 mins 2.0 secs\n"
    );
}

#[test]
fn replay_only_watches_requested_tasks() {
    let events = parse(EVENTS).expect("parse events");
    let out = replay(&events, &[":app:assemble".to_string()]);
    assert!(out.contains("Task app:assemble took"));
    assert!(!out.contains("uploadToRemote"));
}

#[test]
fn replay_without_finish_reports_nothing() {
    let events = parse(
        r#"{"event":"before_task","task":":app:assemble","at":0}
{"event":"after_task","task":":app:assemble","did_work":true,"at":10}"#,
    )
    .expect("parse events");

    let mut out = Vec::new();
    let summary = run(&events, &[], select_hook(HostVersion::new(3, 3, 0)), &mut out)
        .expect("replay");
    assert!(!summary.finished);
    assert_eq!(summary.watched, 1);
    assert!(out.is_empty());
}

#[test]
fn load_missing_file() {
    let dir = tempdir().expect("tempdir");
    let err = load(&dir.path().join("missing.jsonl")).expect_err("expected missing");
    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
}

#[test]
fn task_identity_follows_path_not_tag() {
    let events = parse(
        r#"{"event":"before_task","task":":uploadToRemote","at":0,"mirakle":true}
{"event":"after_task","task":":uploadToRemote","did_work":true,"at":3000}
{"event":"build_finished","at":3500}"#,
    )
    .expect("parse events");

    let mut out = Vec::new();
    let summary = run(&events, &[], select_hook(HostVersion::new(4, 0, 0)), &mut out)
        .expect("replay");
    assert_eq!(summary.watched, 1);
    assert_eq!(
        String::from_utf8(out).expect("utf8"),
        "Task uploadToRemote took : 3.0 secs\n"
    );
}

#[test]
fn repeated_build_start_reports_one_total() {
    let events = parse(
        r#"{"event":"build_started","at":0}
{"event":"build_started","at":500}
{"event":"build_finished","at":2000}"#,
    )
    .expect("parse events");

    assert_eq!(replay(&events, &[]), "Total time : 2.0 secs\n");
}
