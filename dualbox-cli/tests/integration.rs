// dualbox-cli/tests/integration.rs
use predicates::prelude::*;
use serde_json::{json, Value};
use std::io::Write;
use tempfile::NamedTempFile;

const SCHEMA: &str = r#"{
    "type": "object",
    "properties": {
        "idevent": {"type": "number"},
        "eventname": {"type": "string"},
        "level2": {
            "type": "array",
            "items": {
                "type": "object",
                "properties": {
                    "idsession": {"type": "number"},
                    "linkname": {"type": "string"},
                    "inproduct": {"type": "number"}
                }
            }
        }
    }
}"#;

const FEED: &str = r#"[
    [[{"idevent": 1, "eventname": "A", "idsession": 10, "linkname": "S1", "inproduct": 0}]],
    [[{"idevent": 1, "eventname": "A", "idsession": 11, "linkname": "S2", "inproduct": 1}]],
    [[{"idevent": 2, "eventname": "B", "idsession": 20, "linkname": "S3", "inproduct": 0}]]
]"#;

fn temp_json(content: &str) -> NamedTempFile {
    let mut temp = NamedTempFile::new().expect("Failed to create temp file");
    temp.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    temp
}

fn dualbox() -> assert_cmd::Command {
    assert_cmd::Command::cargo_bin("dualbox").unwrap()
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn test_reshape_with_inferred_keys() {
    let schema = temp_json(SCHEMA);
    let data = temp_json(FEED);

    let output = dualbox()
        .arg("--schema")
        .arg(schema.path())
        .arg(data.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Built 2 group(s)"))
        .get_output()
        .clone();

    let tree = stdout_json(&output);
    assert_eq!(tree.as_array().unwrap().len(), 2);
    assert_eq!(tree[0]["idevent"], json!(1));
    assert_eq!(
        tree[0]["level2"],
        json!([
            {"idsession": 10, "linkname": "S1", "inproduct": 0},
            {"idsession": 11, "linkname": "S2", "inproduct": 1}
        ])
    );
}

#[test]
fn test_reshape_reads_stdin() {
    let schema = temp_json(SCHEMA);
    dualbox()
        .arg("--schema")
        .arg(schema.path())
        .write_stdin(FEED)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"level2\""));
}

#[test]
fn test_group_by_without_schema() {
    let data = temp_json(r#"[{"cat": "x", "n": 1}, {"cat": "y", "n": 2}, {"cat": "x", "n": 3}]"#);
    let output = dualbox()
        .args(["--group-by", "cat"])
        .arg(data.path())
        .assert()
        .success()
        .get_output()
        .clone();
    assert_eq!(
        stdout_json(&output),
        json!([
            {"cat": "x", "level2": [{"n": 1}, {"n": 3}]},
            {"cat": "y", "level2": [{"n": 2}]}
        ])
    );
}

#[test]
fn test_merge_with_previous_tree() {
    let schema = temp_json(SCHEMA);
    let data = temp_json(FEED);
    let previous = temp_json(
        r#"[{"idevent": 2, "eventname": "B", "level2": [{"idsession": 21, "linkname": "S4"}]},
            {"idevent": 3, "eventname": "C", "level2": []}]"#,
    );

    let output = dualbox()
        .arg("--schema")
        .arg(schema.path())
        .arg("--merge")
        .arg(previous.path())
        .arg(data.path())
        .assert()
        .success()
        .get_output()
        .clone();

    let tree = stdout_json(&output);
    let ids: Vec<i64> = tree
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["idevent"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(tree[1]["level2"].as_array().unwrap().len(), 2);
}

#[test]
fn test_skeleton_and_fill() {
    let schema = temp_json(SCHEMA);
    let output = dualbox()
        .arg("--schema")
        .arg(schema.path())
        .arg("--skeleton")
        .assert()
        .success()
        .get_output()
        .clone();
    assert_eq!(
        stdout_json(&output),
        json!({
            "idevent": null,
            "eventname": null,
            "level2": [{"idsession": null, "linkname": null, "inproduct": null}]
        })
    );

    let data = temp_json(FEED);
    let output = dualbox()
        .arg("--schema")
        .arg(schema.path())
        .arg("--fill")
        .arg(data.path())
        .assert()
        .success()
        .get_output()
        .clone();
    let filled = stdout_json(&output);
    assert_eq!(filled["idevent"], json!(1));
    assert_eq!(filled["level2"].as_array().unwrap().len(), 3);
}

#[test]
fn test_check_passes_and_fails() {
    let schema = temp_json(SCHEMA);
    let data = temp_json(FEED);
    dualbox()
        .arg("--schema")
        .arg(schema.path())
        .arg("--check")
        .arg(data.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("true"));

    let missing_name = temp_json(r#"[{"idevent": 1, "idsession": 10, "linkname": "S1", "inproduct": 0}]"#);
    dualbox()
        .arg("--schema")
        .arg(schema.path())
        .arg("--check")
        .arg(missing_name.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("false"))
        .stderr(predicate::str::contains("eventname"))
        .stderr(predicate::str::contains("panicked").not());
}

#[test]
fn test_invalid_schema_is_reported() {
    let schema = temp_json(r#"{"type": "object", "properties": {"idevent": {}}}"#);
    let data = temp_json(FEED);
    dualbox()
        .arg("--schema")
        .arg(schema.path())
        .arg(data.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid schema"))
        .stderr(predicate::str::contains("$.properties.idevent"))
        .stderr(predicate::str::contains("panicked").not());
}

#[test]
fn test_invalid_json() {
    let schema = temp_json(SCHEMA);
    let cases = vec![
        (r#"[{"idevent": 1,}]"#, "trailing comma"),
        (r#"[{"idevent": 1"#, "unterminated array"),
        (r#"{invalid: "json"}"#, "unquoted key"),
    ];

    for (invalid_json, description) in cases {
        println!("Testing: {}", description);
        let data = temp_json(invalid_json);
        dualbox()
            .arg("--schema")
            .arg(schema.path())
            .arg(data.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid JSON input"))
            .stderr(predicate::str::contains("panicked").not());
    }
}

#[test]
fn test_malformed_data_is_reported() {
    let schema = temp_json(SCHEMA);
    let data = temp_json(r#"[[1, 2]]"#);
    dualbox()
        .arg("--schema")
        .arg(schema.path())
        .arg(data.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Malformed input at $[0][0]"));
}

#[test]
fn test_lowercase_keys_and_debug_output() {
    let schema = temp_json(SCHEMA);
    let data = temp_json(r#"[{"IdEvent": 7, "EventName": "Mixed", "IdSession": 70}]"#);
    let output = dualbox()
        .arg("--schema")
        .arg(schema.path())
        .arg("--lowercase-keys")
        .arg("--debug")
        .arg(data.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Grouping by"))
        .get_output()
        .clone();
    assert_eq!(
        stdout_json(&output),
        json!([{"idevent": 7, "eventname": "Mixed", "level2": [{"idsession": 70}]}])
    );
}

#[test]
fn test_help_and_missing_inputs() {
    dualbox()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("USAGE:"));

    dualbox()
        .write_stdin(FEED)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--schema or --group-by"));

    dualbox()
        .arg("--skeleton")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--skeleton requires --schema"));
}
