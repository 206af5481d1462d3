use indoc::indoc;
use resultguard::commands::check::analyze_tree;
use resultguard::{create_writer, OutputFormat, ResultguardConfig};
use std::fs;

fn write_tree(dir: &std::path::Path) {
    fs::write(
        dir.join("good.rs"),
        indoc! {r#"
            fn guarded(result: Outcome) {
                if result.is_failure {
                    return;
                }
                consume(result.value);
            }
        "#},
    )
    .unwrap();
    fs::create_dir(dir.join("nested")).unwrap();
    fs::write(
        dir.join("nested/bad.rs"),
        indoc! {r#"
            fn unguarded(result: Outcome) {
                if result.is_failure {
                    log_it();
                }
                consume(result.value);
            }
        "#},
    )
    .unwrap();
    fs::write(dir.join("notes.txt"), "not rust").unwrap();
}

#[test]
fn analyze_tree_aggregates_findings_across_files() {
    let dir = tempfile::tempdir().unwrap();
    write_tree(dir.path());

    let config = ResultguardConfig::default();
    let report = analyze_tree(&dir.path().to_path_buf(), &config).unwrap();

    assert_eq!(report.files_scanned, 2);
    assert_eq!(report.findings.len(), 1);
    assert!(report.findings[0].file.ends_with("nested/bad.rs"));
    assert_eq!(report.findings[0].line, 5);
    assert!(report.has_findings());
}

#[test]
fn unparsable_files_are_skipped_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("broken.rs"), "fn oops( {").unwrap();
    fs::write(
        dir.path().join("fine.rs"),
        indoc! {r#"
            fn fine(result: Outcome) {
                if result.is_failure {
                    log_it();
                }
                consume(result.value);
            }
        "#},
    )
    .unwrap();

    let config = ResultguardConfig::default();
    let report = analyze_tree(&dir.path().to_path_buf(), &config).unwrap();

    assert_eq!(report.files_scanned, 2);
    assert_eq!(report.findings.len(), 1);
}

#[test]
fn json_report_can_be_written_to_a_file() {
    let dir = tempfile::tempdir().unwrap();
    write_tree(dir.path());

    let config = ResultguardConfig::default();
    let report = analyze_tree(&dir.path().to_path_buf(), &config).unwrap();

    let out_path = dir.path().join("report.json");
    let out = std::fs::File::create(&out_path).unwrap();
    create_writer(Box::new(out), OutputFormat::Json)
        .write_report(&report)
        .unwrap();

    let parsed: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out_path).unwrap()).unwrap();
    assert_eq!(parsed["files_scanned"], 2);
    assert_eq!(parsed["findings"][0]["rule"], "RG0001");
}

#[test]
fn config_file_at_the_root_is_discovered() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("resultguard.toml"),
        indoc! {r#"
            [protocol]
            value_accessor = "payload"
        "#},
    )
    .unwrap();

    let config = ResultguardConfig::discover(dir.path());
    assert_eq!(config.protocol.value_accessor, "payload");
    assert_eq!(config.protocol.success_flag, "is_success");
}
