use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn literal_sync(cwd: &Path) -> Command {
    let mut cmd = Command::cargo_bin("literal-sync").expect("Binary exists");
    cmd.current_dir(cwd)
        .env_remove("LITERAL_SYNC_PAGES_DIR")
        .env_remove("LITERAL_SYNC_VIRTUAL_DOMAINS_DIR");
    cmd
}

fn seed_documents(root: &Path) {
    fs::create_dir_all(root.join("pages")).unwrap();
    fs::create_dir_all(root.join("virtualDomains")).unwrap();
    fs::write(
        root.join("pages/home.json"),
        json!({
            "constantName": "home",
            "modelView": { "components": [
                { "type": "literal", "name": "banner", "value": "<div>Hello</div>" },
                { "type": "block", "components": [
                    { "type": "literal", "name": "styles", "value": "<style>p{}</style>" }
                ]}
            ]}
        })
        .to_string(),
    )
    .unwrap();
    fs::write(
        root.join("virtualDomains/virtualDomains.people.json"),
        json!({ "serviceName": "people", "codeGet": "select * from people" }).to_string(),
    )
    .unwrap();
}

#[test]
fn extract_then_check_succeeds() {
    let tmp = tempdir().unwrap();
    seed_documents(tmp.path());

    literal_sync(tmp.path())
        .arg("extract")
        .assert()
        .success()
        .stdout(predicate::str::contains("✅ Extracted 2 file(s)"));

    assert!(tmp.path().join("extracted_literals/home/banner.html").exists());
    assert!(tmp.path().join("extracted_literals/home/styles.css").exists());
    assert!(tmp.path().join("extracted_virtual_domains/people/codeget.sql").exists());

    literal_sync(tmp.path())
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("✅ home: in sync").and(predicate::str::contains("✅ people: in sync")));
}

#[test]
fn check_fails_after_an_extracted_file_is_edited() {
    let tmp = tempdir().unwrap();
    seed_documents(tmp.path());
    literal_sync(tmp.path()).arg("extract").assert().success();

    fs::write(
        tmp.path().join("extracted_virtual_domains/people/codeget.sql"),
        "select id from people",
    )
    .unwrap();

    literal_sync(tmp.path())
        .args(["check", "--kind", "virtual-domains"])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("❌ people [codeGet]").and(predicate::str::contains("modified")));

    // Pages are untouched.
    literal_sync(tmp.path())
        .args(["check", "--kind", "pages"])
        .assert()
        .success();

    literal_sync(tmp.path()).arg("rebuild").assert().success();
    literal_sync(tmp.path()).arg("check").assert().success();

    let rebuilt: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(tmp.path().join("virtualDomains/virtualDomains.people.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(rebuilt["codeGet"], "select id from people");
}

#[test]
fn explicit_paths_and_config_file_are_honoured() {
    let tmp = tempdir().unwrap();
    seed_documents(tmp.path());
    fs::write(
        tmp.path().join("literal-sync.yaml"),
        "output:\n  pages_dir: custom_pages\n",
    )
    .unwrap();

    literal_sync(tmp.path())
        .args(["--config", "literal-sync.yaml", "extract", "--kind", "pages", "pages/home.json"])
        .assert()
        .success();

    assert!(tmp.path().join("custom_pages/home/banner.html").exists());
    assert!(!tmp.path().join("extracted_literals").exists());
    assert!(!tmp.path().join("extracted_virtual_domains").exists());
}

#[test]
fn missing_document_makes_extract_fail() {
    let tmp = tempdir().unwrap();

    literal_sync(tmp.path())
        .args(["extract", "--kind", "pages", "nowhere.json"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("source document not found"));
}

#[test]
fn output_root_requires_a_single_kind() {
    let tmp = tempdir().unwrap();

    literal_sync(tmp.path())
        .args(["check", "--output-root", "somewhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--output-root needs"));
}

#[test]
fn invalid_config_is_reported() {
    let tmp = tempdir().unwrap();
    fs::write(tmp.path().join("bad.yaml"), "output: [").unwrap();

    literal_sync(tmp.path())
        .args(["--config", "bad.yaml", "check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config YAML"));
}

#[test]
fn virtual_domain_without_sql_is_reported_as_empty() {
    let tmp = tempdir().unwrap();
    fs::write(
        tmp.path().join("blank.json"),
        json!({ "serviceName": "blank", "codeGet": "  " }).to_string(),
    )
    .unwrap();

    literal_sync(tmp.path())
        .args(["extract", "--kind", "virtual-domains", "blank.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("blank.json: no SQL content found"));

    assert!(!tmp.path().join("extracted_virtual_domains/blank").join("_extraction_map.json").exists());
}

#[test]
fn extract_only_flags_are_rejected_elsewhere() {
    let tmp = tempdir().unwrap();
    seed_documents(tmp.path());

    for args in [
        vec!["check", "pages/home.json"],
        vec!["check", "--root", "pages"],
        vec!["rebuild", "--pattern", "home"],
    ] {
        literal_sync(tmp.path()).args(&args).assert().failure().code(2);
    }

    literal_sync(tmp.path())
        .args(["extract", "--kind", "pages", "--root", "pages", "pages/home.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("only apply when no document paths are given"));
    assert!(!tmp.path().join("extracted_literals").exists());
}

use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{layer::Context, Layer, Registry};

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        use std::fmt::Write as FmtWrite;
        let mut msg = String::new();
        let _ = write!(&mut msg, "{:?}", event);
        self.events.lock().unwrap().push(msg);
    }
}

#[test]
fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use literal_sync::cli::{run, Cli, Commands, KindSelection, TargetArgs};

    let tmp = tempdir().unwrap();
    let cli = Cli {
        config: None,
        command: Commands::Check(TargetArgs {
            kind: KindSelection::Pages,
            output_root: Some(tmp.path().join("empty")),
            ..TargetArgs::default()
        }),
    };

    let _ = run(cli);

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}
