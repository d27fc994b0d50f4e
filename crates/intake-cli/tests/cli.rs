use assert_cmd::Command;
use assert_fs::TempDir;
use serde_json::{Value, json};
use std::fs;
use std::path::PathBuf;

fn three_step_registry() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../intake-spec/tests/fixtures/three_step.json")
}

fn intake(workdir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("intake").expect("intake binary");
    cmd.current_dir(workdir.path())
        .env("INTAKE_COMPLETION_DELAY_MS", "0")
        .env_remove("INTAKE_SUBMISSIONS_DIR")
        .env_remove("INTAKE_REGISTRY")
        .env_remove("INTAKE_CLIENT_REF")
        .env_remove("INTAKE_CHANNEL")
        .env_remove("RUST_LOG");
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(output).expect("utf8 stdout")
}

#[test]
fn describe_lists_built_in_questionnaire() {
    let workdir = TempDir::new().expect("temp dir");
    let stdout = stdout_of(intake(&workdir).arg("describe"));
    assert!(stdout.contains("Medical Questionnaire"));
    assert!(stdout.contains("[Allergies]"));
    assert_eq!(stdout.matches("[Medical history]").count(), 1);
    assert!(stdout.contains("required"));
}

#[test]
fn describe_json_round_trips_registry() {
    let workdir = TempDir::new().expect("temp dir");
    let stdout = stdout_of(
        intake(&workdir)
            .arg("describe")
            .arg("--registry")
            .arg(three_step_registry())
            .arg("--format")
            .arg("json"),
    );
    let value: Value = serde_json::from_str(&stdout).expect("json");
    assert_eq!(value["id"], "three-step");
    assert_eq!(value["questions"].as_array().map(Vec::len), Some(3));
}

#[test]
fn schema_prints_json_schema() {
    let workdir = TempDir::new().expect("temp dir");
    let stdout = stdout_of(intake(&workdir).arg("schema"));
    let value: Value = serde_json::from_str(&stdout).expect("json");
    assert!(value["properties"]["questions"].is_object());
}

#[test]
fn validate_accepts_complete_answers() {
    let workdir = TempDir::new().expect("temp dir");
    let answers = workdir.path().join("answers.json");
    fs::write(&answers, json!({ "a": "Yes", "c": 3 }).to_string()).expect("write answers");

    let stdout = stdout_of(
        intake(&workdir)
            .arg("validate")
            .arg("--registry")
            .arg(three_step_registry())
            .arg("--answers")
            .arg(&answers),
    );
    assert!(stdout.contains("Validation result: valid"));
}

#[test]
fn validate_fails_on_missing_required() {
    let workdir = TempDir::new().expect("temp dir");
    let answers = workdir.path().join("answers.json");
    fs::write(&answers, json!({ "a": "No" }).to_string()).expect("write answers");

    let output = intake(&workdir)
        .arg("validate")
        .arg("--registry")
        .arg(three_step_registry())
        .arg("--answers")
        .arg(&answers)
        .assert()
        .failure()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8(output).expect("utf8");
    assert!(stdout.contains("Missing required answers: c"));
}

#[test]
fn run_walks_through_and_submits() {
    let workdir = TempDir::new().expect("temp dir");
    let stdout = stdout_of(
        intake(&workdir)
            .arg("run")
            .arg("--registry")
            .arg(three_step_registry())
            .write_stdin("\ny\n\n4\n"),
    );
    assert!(stdout.contains("This question requires an answer."));
    assert!(stdout.contains("3/3 Question C *"));
    assert!(stdout.contains("Done ✅"));
    assert!(stdout.contains("Reference: three-step@1.0:2"));
}

#[test]
fn run_back_keeps_previous_answer() {
    let workdir = TempDir::new().expect("temp dir");
    let stdout = stdout_of(
        intake(&workdir)
            .arg("run")
            .arg("--registry")
            .arg(three_step_registry())
            .write_stdin("no\n:back\n\n\n5\n"),
    );
    assert!(stdout.contains("Current answer: No (press Enter to keep)"));
    assert!(stdout.contains("Done ✅"));
}

#[test]
fn run_quit_abandons_without_submitting() {
    let workdir = TempDir::new().expect("temp dir");
    let submissions = workdir.path().join("submissions");
    let stdout = stdout_of(
        intake(&workdir)
            .arg("run")
            .arg("--registry")
            .arg(three_step_registry())
            .arg("--submissions-dir")
            .arg(&submissions)
            .write_stdin("yes\n:quit\n"),
    );
    assert!(stdout.contains("Questionnaire abandoned"));
    assert!(!submissions.exists());
}

#[test]
fn run_writes_submission_file() {
    let workdir = TempDir::new().expect("temp dir");
    let submissions = workdir.path().join("submissions");
    let stdout = stdout_of(
        intake(&workdir)
            .arg("run")
            .arg("--registry")
            .arg(three_step_registry())
            .arg("--submissions-dir")
            .arg(&submissions)
            .write_stdin("1\nfeeling fine\n2\n"),
    );
    assert!(stdout.contains("Saved to:"));

    let entries = fs::read_dir(&submissions)
        .expect("submissions dir")
        .collect::<Result<Vec<_>, _>>()
        .expect("entries");
    assert_eq!(entries.len(), 1);
    let written = fs::read_to_string(entries[0].path()).expect("read submission");
    let value: Value = serde_json::from_str(&written).expect("json");
    assert_eq!(value["answers"]["a"], "Yes");
    assert_eq!(value["answers"]["b"], "feeling fine");
    assert_eq!(value["answers"]["c"], 2);
}

#[test]
fn run_attaches_submission_meta() {
    let workdir = TempDir::new().expect("temp dir");
    let submissions = workdir.path().join("submissions");
    fs::write(workdir.path().join("intake.toml"), "channel = \"phone\"\n")
        .expect("write config");

    intake(&workdir)
        .arg("run")
        .arg("--registry")
        .arg(three_step_registry())
        .arg("--submissions-dir")
        .arg(&submissions)
        .arg("--client-ref")
        .arg("client-42")
        .write_stdin("yes\n\n3\n")
        .assert()
        .success();

    let entry = fs::read_dir(&submissions)
        .expect("submissions dir")
        .next()
        .expect("one submission")
        .expect("entry");
    let written = fs::read_to_string(entry.path()).expect("read submission");
    let value: Value = serde_json::from_str(&written).expect("json");
    assert_eq!(value["meta"]["client_ref"], "client-42");
    assert_eq!(value["meta"]["channel"], "phone");
}

#[test]
fn run_without_meta_omits_it() {
    let workdir = TempDir::new().expect("temp dir");
    let submissions = workdir.path().join("submissions");
    intake(&workdir)
        .arg("run")
        .arg("--registry")
        .arg(three_step_registry())
        .arg("--submissions-dir")
        .arg(&submissions)
        .write_stdin("no\n\n1\n")
        .assert()
        .success();

    let entry = fs::read_dir(&submissions)
        .expect("submissions dir")
        .next()
        .expect("one submission")
        .expect("entry");
    let value: Value =
        serde_json::from_str(&fs::read_to_string(entry.path()).expect("read")).expect("json");
    assert!(value.get("meta").is_none());
}

#[test]
fn run_prefills_answers_from_file() {
    let workdir = TempDir::new().expect("temp dir");
    let answers = workdir.path().join("answers.json");
    fs::write(&answers, json!({ "a": "No", "c": 1 }).to_string()).expect("write answers");

    let stdout = stdout_of(
        intake(&workdir)
            .arg("run")
            .arg("--registry")
            .arg(three_step_registry())
            .arg("--answers")
            .arg(&answers)
            .write_stdin("\n\n\n"),
    );
    assert!(stdout.contains("Done ✅"));
}

#[test]
fn run_fails_when_input_ends_early() {
    let workdir = TempDir::new().expect("temp dir");
    intake(&workdir)
        .arg("run")
        .arg("--registry")
        .arg(three_step_registry())
        .write_stdin("yes\n")
        .assert()
        .failure();
}

#[test]
fn config_file_selects_registry() {
    let workdir = TempDir::new().expect("temp dir");
    let config = workdir.path().join("custom.toml");
    fs::write(
        &config,
        format!("registry = {:?}\n", three_step_registry().display().to_string()),
    )
    .expect("write config");

    let stdout = stdout_of(intake(&workdir).arg("--config").arg(&config).arg("describe"));
    assert!(stdout.contains("Three Step"));
}
