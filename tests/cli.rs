use std::process::Command;

#[test]
fn missing_url_exits_with_usage() {
    let output = Command::new(env!("CARGO_BIN_EXE_sitesource"))
        .output()
        .expect("run sitesource");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage"), "no usage in: {stderr}");
}

#[test]
fn unparsable_wait_exits_with_usage() {
    let output = Command::new(env!("CARGO_BIN_EXE_sitesource"))
        .args(["https://example.com", "soon"])
        .output()
        .expect("run sitesource");
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn help_exits_cleanly() {
    let output = Command::new(env!("CARGO_BIN_EXE_sitesource"))
        .arg("--help")
        .output()
        .expect("run sitesource");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--out-dir"));
}
