use serde_json::Value;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

struct TempDirGuard {
    path: PathBuf,
}

impl TempDirGuard {
    fn new(prefix: &str) -> Self {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "patchscope-cli-{prefix}-{}-{unique}",
            std::process::id()
        ));
        fs::create_dir_all(&path).expect("temp dir should be created");
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

const SAMPLE_POOL: &[&str] = &[
    r#"{"kind":"repo","alias":"repo-update","name":"Update Repository","url":"https://download.example.org/update","priority":90}"#,
    r#"{"kind":"package","name":"openssl","edition":"3.1.4-1","arch":"x86_64","installed":true}"#,
    r#"{"kind":"package","name":"openssl","edition":"3.1.4-2","arch":"x86_64","repo":"repo-update"}"#,
    r#"{"kind":"patch","name":"SUSE-2024-1001","edition":"1","repo":"repo-update","status":"broken","category":"security","severity":"critical","summary":"Security update for openssl","references":[{"type":"cve","id":"CVE-2024-0001"},{"type":"bugzilla","id":"99999"}]}"#,
    r#"{"kind":"patch","name":"SUSE-2024-1004","edition":"1","repo":"repo-update","status":"broken","category":"recommended","severity":"moderate","summary":"Recommended update for vim","description":"Fixes a crash reported upstream as 424242."}"#,
    r#"{"kind":"patch","name":"SUSE-2024-0900","edition":"1","repo":"repo-update","status":"satisfied","category":"security","severity":"important","summary":"Security update for bash"}"#,
];

fn write_sample_pool(path: &Path) {
    fs::write(path, format!("{}\n", SAMPLE_POOL.join("\n"))).expect("sample pool should be written");
}

/// Run in `dir` with no inherited config file.
fn run_patchscope<I, S>(dir: &Path, args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = env!("CARGO_BIN_EXE_patchscope");
    Command::new(bin)
        .args(args)
        .current_dir(dir)
        .env_remove("PATCHSCOPE_CONFIG")
        .env_remove("RUST_LOG")
        .output()
        .expect("patchscope command should execute")
}

fn assert_success(output: &Output) {
    if !output.status.success() {
        panic!(
            "command failed with status {:?}\nstdout:\n{}\nstderr:\n{}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn assert_failure(output: &Output) {
    if output.status.success() {
        panic!(
            "command unexpectedly succeeded\nstdout:\n{}\nstderr:\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn stdout_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn parse_json_stdout(output: &Output) -> Value {
    serde_json::from_slice::<Value>(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "expected valid JSON stdout, got error: {e}\nstdout:\n{}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

fn setup(prefix: &str) -> (TempDirGuard, String) {
    let tmp = TempDirGuard::new(prefix);
    let pool = tmp.path().join("pool.jsonl");
    write_sample_pool(&pool);
    let pool = pool.display().to_string();
    (tmp, pool)
}

#[test]
fn list_patches_json_smoke() {
    let (tmp, pool) = setup("list-patches-json");
    let output = run_patchscope(tmp.path(), ["list-patches", "--json", "--pool", &pool]);
    assert_success(&output);

    let payload = parse_json_stdout(&output);
    assert_eq!(payload["action"], "list-patches");
    assert_eq!(payload["count"], 2);
    assert!(
        payload["snapshotRef"]
            .as_str()
            .is_some_and(|r| r.starts_with("pool1_"))
    );
    let names: Vec<&str> = payload["patches"]["other"]
        .as_array()
        .expect("other patches should be an array")
        .iter()
        .filter_map(|p| p["name"].as_str())
        .collect();
    assert_eq!(names, vec!["SUSE-2024-1001", "SUSE-2024-1004"]);
    assert_eq!(payload["patches"]["other"][0]["status"], "needed");
}

#[test]
fn issues_flag_conflicts_with_tracker_flags() {
    let (tmp, pool) = setup("conflict");
    let output = run_patchscope(
        tmp.path(),
        ["list-patches", "--issues=1", "--cve=CVE-1", "--pool", &pool],
    );
    assert_failure(&output);
}

#[test]
fn list_patches_by_issue_falls_back_to_descriptions() {
    let (tmp, pool) = setup("fallback");
    let output = run_patchscope(tmp.path(), ["list-patches", "--issues=424242", "--pool", &pool]);
    assert_success(&output);

    let stdout = stdout_text(&output);
    assert!(stdout.contains("Matches in patch descriptions of the following patches have been found:"));
    assert!(stdout.contains("SUSE-2024-1004"));
    assert!(!stdout.contains('\x1b'));
}

#[test]
fn list_patches_by_cve_json_reports_matches() {
    let (tmp, pool) = setup("by-cve");
    let output = run_patchscope(
        tmp.path(),
        ["list-patches", "--cve", "--json", "--pool", &pool],
    );
    assert_success(&output);

    let payload = parse_json_stdout(&output);
    assert_eq!(payload["issues"][0], "cve#*");
    assert_eq!(payload["matches"][0]["refId"], "CVE-2024-0001");
    assert_eq!(payload["matches"][0]["patchName"], "SUSE-2024-1001");
    assert_eq!(payload["matches"].as_array().map(Vec::len), Some(1));
}

#[test]
fn patch_check_exit_code_reports_security_updates() {
    let (tmp, pool) = setup("patch-check");
    let output = run_patchscope(tmp.path(), ["patch-check", "--pool", &pool]);
    assert_eq!(output.status.code(), Some(101));
    assert!(stdout_text(&output).contains("2 patches needed (1 security patch)"));
}

#[test]
fn patch_reports_missing_fix_with_exit_104() {
    let (tmp, pool) = setup("patch-missing");
    let output = run_patchscope(tmp.path(), ["patch", "--bugzilla=1", "--pool", &pool]);
    assert_eq!(output.status.code(), Some(104));
    assert!(
        stdout_text(&output)
            .contains("Fix for bugzilla issue number 1 was not found or is not needed.")
    );
}

#[test]
fn patch_marks_the_fix_for_a_cve() {
    let (tmp, pool) = setup("patch-cve");
    let output = run_patchscope(tmp.path(), ["patch", "--cve=cve-2024-0001", "--pool", &pool]);
    assert_success(&output);
    assert!(
        stdout_text(&output)
            .contains("Patch 'patch:SUSE-2024-1001-1.noarch' marked for installation.")
    );
}

#[test]
fn list_updates_xml_includes_old_edition() {
    let (tmp, pool) = setup("list-updates-xml");
    let output = run_patchscope(tmp.path(), ["list-updates", "--xml", "--pool", &pool]);
    assert_success(&output);

    let stdout = stdout_text(&output);
    assert!(stdout.contains("<update-status version=\"0.6\">"));
    assert!(stdout.contains("name=\"openssl\" edition=\"3.1.4-2\""));
    assert!(stdout.contains("edition-old=\"3.1.4-1\""));
    assert!(!stdout.contains("blocked-update-list"));
}

#[test]
fn config_file_supplies_pool_and_output() {
    let (tmp, _) = setup("config");
    fs::write(
        tmp.path().join("patchscope.toml"),
        "pool = \"pool.jsonl\"\noutput = \"json\"\n",
    )
    .expect("config should be written");

    let output = run_patchscope(tmp.path(), ["patch-check"]);
    assert_eq!(output.status.code(), Some(101));
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["counts"]["needed"], 2);
    assert_eq!(payload["counts"]["security"], 1);
    assert_eq!(payload["exitCode"], 101);
}

#[test]
fn explicit_config_path_must_exist() {
    let (tmp, pool) = setup("config-missing");
    let output = Command::new(env!("CARGO_BIN_EXE_patchscope"))
        .args(["patch-check", "--pool", &pool])
        .current_dir(tmp.path())
        .env("PATCHSCOPE_CONFIG", tmp.path().join("missing.toml"))
        .output()
        .expect("patchscope command should execute");
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to read config"));
}

#[test]
fn unknown_repo_is_an_error() {
    let (tmp, pool) = setup("unknown-repo");
    let output = run_patchscope(
        tmp.path(),
        ["list-updates", "--repo", "nope", "--pool", &pool],
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown repository `nope`"));
}
