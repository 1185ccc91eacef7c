use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

fn tsar(dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tsar").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("TSAR_DICTIONARY")
        .env_remove("TSAR_BACKEND")
        .env_remove("TSAR_INTERPRETER");
    cmd
}

#[test]
fn no_command_exits_non_zero() {
    let dir = tempfile::tempdir().unwrap();
    tsar(&dir).assert().failure();
}

#[test]
fn translate_inline_with_builtin_dictionary() {
    let dir = tempfile::tempdir().unwrap();
    tsar(&dir)
        .args(["translate", "короче x\nвыведи(истина)"])
        .assert()
        .success()
        .stdout(predicate::str::contains("# x\nprint(True)"));
}

#[test]
fn translate_file_with_custom_dictionary() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("dictionary.json"), r#"{"скажи": "print"}"#).unwrap();
    fs::write(dir.path().join("hello.tsar"), "скажи('скажи')\n").unwrap();

    tsar(&dir)
        .args(["translate", "hello.tsar", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""translated": "print('скажи')\n""#));
}

#[test]
fn broken_dictionary_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("dictionary.json"), "[1, 2]").unwrap();

    tsar(&dir)
        .args(["translate", "x"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Dictionary error"));
}

#[test]
fn words_lists_builtin_keywords() {
    let dir = tempfile::tempdir().unwrap();
    tsar(&dir)
        .args(["words", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""keyword": "иначе_ежели""#));
}

#[test]
fn unavailable_boundary_exits_non_zero() {
    let dir = tempfile::tempdir().unwrap();
    tsar(&dir)
        .args(["run", "выведи(1)", "--backend", "host", "--interpreter", "no-such-interpreter-tsar"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Isolation boundary unavailable"));
}

#[test]
fn missing_source_file_exits_non_zero() {
    let dir = tempfile::tempdir().unwrap();
    tsar(&dir)
        .args(["file", "missing.tsar", "--backend", "host", "--interpreter", "sh"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to read missing.tsar"));
}

#[cfg(unix)]
#[test]
fn run_on_host_backend_prints_sections() {
    let dir = tempfile::tempdir().unwrap();
    // `sh -u script.py` runs the untranslated shell text
    tsar(&dir)
        .args(["run", "echo привет", "--backend", "host", "--interpreter", "sh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("STDOUT:\nпривет\n"))
        .stdout(predicate::str::contains("Status: exited with code 0"));
}

#[cfg(unix)]
#[test]
fn timeout_is_reported_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    tsar(&dir)
        .args(["run", "sleep 30", "--backend", "host", "--interpreter", "sh", "--timeout", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ERROR: Execution timed out after 1 s"));
}

#[test]
fn translate_bundled_demo() {
    let dir = tempfile::tempdir().unwrap();
    let root = env!("CARGO_MANIFEST_DIR");
    let dictionary = format!("{}/dictionary.json", root);
    let demo = format!("{}/demos/hello.tsar", root);

    tsar(&dir)
        .args(["translate", demo.as_str(), "--dictionary", dictionary.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("if имя == \"Петр\":"))
        .stdout(predicate::str::contains("elif len(имя) == 0:"))
        .stdout(predicate::str::contains("def квадрат(x):"))
        .stdout(predicate::str::contains("for шаг in range(3):"))
        .stdout(predicate::str::contains("print(f\"Здравствуй, {имя}!\")"));
}
