use std::process::Command;

#[test]
fn prints_version() {
    let exe = env!("CARGO_BIN_EXE_modtube");
    let output = Command::new(exe)
        .arg("--version")
        .output()
        .expect("run modtube --version");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("stdout utf8");
    assert!(
        stdout.contains(env!("CARGO_PKG_VERSION")),
        "stdout was: {}",
        stdout.trim()
    );
}

#[test]
fn prints_help() {
    let exe = env!("CARGO_BIN_EXE_modtube");
    let output = Command::new(exe)
        .arg("--help")
        .output()
        .expect("run modtube --help");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("stdout utf8");
    assert!(stdout.contains("modtube"));
    assert!(stdout.contains("--version"));
}

#[test]
fn rejects_unknown_flags() {
    let exe = env!("CARGO_BIN_EXE_modtube");
    let output = Command::new(exe)
        .arg("--bogus")
        .output()
        .expect("run modtube --bogus");
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8(output.stderr).expect("stderr utf8");
    assert!(stderr.contains("unknown flag"));
}
