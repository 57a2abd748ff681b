use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// `act --root <root>` with a no-op editor.
fn act(root: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_act"));
    cmd.arg("--root")
        .arg(root)
        .env("EDITOR", "true")
        .env_remove("RUST_LOG");
    cmd
}

fn run(cmd: &mut Command) -> Output {
    cmd.output().expect("failed to run act")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn write_script(root: &Path, namespace: &str, name: &str, command: &str, body: &str) -> PathBuf {
    let dir = root.join(namespace);
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(format!("{name}.py"));
    fs::write(
        &path,
        format!(
            "# /// script\n# command = \"{command}\"\n# description = \"The {command} tool\"\n# author = \"jane\"\n# ///\n{body}"
        ),
    )
    .unwrap();
    path
}

/// Runs scripts with `sh`, whose comment syntax matches the header.
fn use_sh_runner(root: &Path) {
    fs::create_dir_all(root).unwrap();
    fs::write(root.join("config.yml"), "runner: [sh]\n").unwrap();
}

#[test]
fn test_list_empty_root() {
    let root = tempfile::tempdir().unwrap();
    let output = run(act(root.path()).arg("list"));
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "No scripts found.\n");
    assert!(root.path().join("local").is_dir());
    assert!(root.path().join("community").is_dir());
    assert!(root.path().join("quarantine").is_dir());
}

#[test]
fn test_create_list_and_meta() {
    let root = tempfile::tempdir().unwrap();
    let output = run(act(root.path()).args(["create", "deploy"]));
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(root.path().join("local/deploy.py").is_file());

    let output = run(act(root.path()).args(["create", "deploy"]));
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).starts_with("error: script already exists"));

    write_script(root.path(), "community", "weather", "weather", "");
    let output = run(act(root.path()).arg("list"));
    assert_eq!(
        stdout(&output),
        "Local scripts:\n  deploy\nCommunity scripts:\n  weather - The weather tool\n"
    );

    let output = run(act(root.path()).args(["meta", "deploy"]));
    assert_eq!(
        stdout(&output),
        "command: deploy\naliases: ['deploy']\nauthor: your_name_here\ndependencies: []\n"
    );

    let output = run(act(root.path()).args(["meta", "community:weather", "--json"]));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["author"], "jane");
}

#[test]
fn test_unknown_script_is_reported() {
    let root = tempfile::tempdir().unwrap();
    let output = run(act(root.path()).args(["run", "nope"]));
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stderr(&output), "error: script 'nope' not found\n");
}

#[test]
fn test_list_skips_deeply_nested_header() {
    let root = tempfile::tempdir().unwrap();
    fs::create_dir_all(root.path().join("local")).unwrap();
    fs::write(
        root.path().join("local/a.py"),
        format!("# /// script\n# junk = {}{}\n# ///\n", "[".repeat(1000), "]".repeat(1000)),
    )
    .unwrap();
    write_script(root.path(), "local", "b", "tool", "");

    let output = run(act(root.path()).arg("list"));
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "Local scripts:\n  tool - The tool tool\nCommunity scripts:\n"
    );
}

#[test]
fn test_link_and_delete() {
    let root = tempfile::tempdir().unwrap();
    let output = run(act(root.path()).arg("link"));
    assert!(stdout(&output).starts_with("No installed scripts found to link."));

    write_script(root.path(), "local", "build", "build", "");
    write_script(root.path(), "community", "weather", "weather", "");
    let output = run(act(root.path()).arg("link"));
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).starts_with("Successfully recreated shims for 2 scripts"));

    let shim = fs::read_to_string(root.path().join("bin/weather")).unwrap();
    assert!(shim.starts_with("#!/bin/sh\nexec '"));
    assert!(shim.ends_with(" run -- 'weather' \"$@\"\n"));

    let output = run(act(root.path()).args(["delete", "weather"]));
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(!root.path().join("community/weather.py").exists());
    assert!(!root.path().join("bin/weather").exists());
    assert!(root.path().join("bin/build").exists());
}

#[cfg(unix)]
#[test]
fn test_run_passes_exit_code_through() {
    let root = tempfile::tempdir().unwrap();
    use_sh_runner(root.path());
    write_script(root.path(), "local", "ok", "ok", "echo \"args: $*\"\n");
    write_script(root.path(), "local", "fail", "fail", "exit 3\n");

    let output = run(act(root.path()).args(["run", "ok", "--flag", "x"]));
    assert!(output.status.success(), "{}", stderr(&output));
    let out = stdout(&output);
    assert!(out.starts_with("args: --flag x\nDone in "), "{out}");

    let output = run(act(root.path()).args(["run", "-q", "ok"]));
    assert_eq!(stdout(&output), "args: \n");

    let output = run(act(root.path()).args(["run", "fail"]));
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("Failed with exit code 3."));
}

#[cfg(unix)]
#[test]
fn test_shim_invokes_script() {
    let root = tempfile::tempdir().unwrap();
    use_sh_runner(root.path());
    write_script(root.path(), "local", "code", "code", "exit \"$1\"\n");
    let output = run(act(root.path()).arg("link"));
    assert!(output.status.success(), "{}", stderr(&output));

    let status = Command::new(root.path().join("bin/code"))
        .arg("4")
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(4));
}

#[test]
fn test_install_from_directory() {
    let root = tempfile::tempdir().unwrap();
    let provider = tempfile::tempdir().unwrap();
    write_script(provider.path(), ".", "weather", "weather", "print('sunny')\n");
    fs::write(
        provider.path().join("anon.py"),
        "# /// script\n# command = \"anon\"\n# ///\n",
    )
    .unwrap();

    let install = |name: &str, extra: &[&str]| {
        run(act(root.path())
            .args(["install", name, "--yes", "--from"])
            .arg(provider.path())
            .args(extra))
    };

    let output = install("weather", &[]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).starts_with("Community script 'weather' installed successfully."));
    assert!(root.path().join("community/weather.py").is_file());
    assert!(root.path().join("bin/weather").is_file());

    let output = install("weather", &[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("already exists"));

    let output = install("weather", &["--force"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let output = install("anon", &[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("missing required field 'author'"));
    assert!(root.path().join("quarantine/anon.py").is_file());
    assert!(!root.path().join("community/anon.py").exists());
}

#[test]
fn test_install_declined_on_stdin() {
    use std::io::Write;
    use std::process::Stdio;

    let root = tempfile::tempdir().unwrap();
    let provider = tempfile::tempdir().unwrap();
    write_script(provider.path(), ".", "weather", "weather", "");

    let mut child = act(root.path())
        .args(["install", "weather", "--from"])
        .arg(provider.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(b"n\n").unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success(), "{}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("'weather' is a community script by jane."), "{out}");
    assert!(out.contains("Installation aborted."));
    assert!(root.path().join("quarantine/weather.py").is_file());
    assert!(!root.path().join("community/weather.py").exists());
}

#[test]
fn test_index_and_readme() {
    let scripts = tempfile::tempdir().unwrap();
    write_script(scripts.path(), ".", "weather", "weather", "");
    let readme = scripts.path().join("README.md");
    fs::write(&readme, "<!-- ACT_SCRIPTS_START -->\n<!-- ACT_SCRIPTS_END -->\n").unwrap();

    let output = run(Command::new(env!("CARGO_BIN_EXE_act"))
        .arg("index")
        .arg(scripts.path())
        .arg("--readme")
        .arg(&readme));
    assert!(output.status.success(), "{}", stderr(&output));

    let index: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(scripts.path().join("index")).unwrap()).unwrap();
    assert_eq!(index["scripts"][0]["command"], "weather");
    assert_eq!(index["scripts"][0]["author"], "jane");

    let text = fs::read_to_string(&readme).unwrap();
    assert!(text.contains("| **weather** | The weather tool |"));
}
