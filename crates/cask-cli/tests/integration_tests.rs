//! Integration tests for the `cask` CLI binary.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use sha2::{Digest, Sha256};
use tempfile::TempDir;

/// Test context that sets up a temporary home, cask root and Applications folder
struct TestContext {
    temp_dir: TempDir,
    cask_home: PathBuf,
    appdir: PathBuf,
    casks_dir: PathBuf,
}

impl TestContext {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let cask_home = temp_dir.path().join(".cask");
        let appdir = temp_dir.path().join("Applications");
        let casks_dir = temp_dir.path().join("casks");
        std::fs::create_dir_all(&cask_home).expect("failed to create cask home");
        std::fs::create_dir_all(&casks_dir).expect("failed to create casks dir");
        Self {
            temp_dir,
            cask_home,
            appdir,
            casks_dir,
        }
    }

    fn home(&self) -> &Path {
        self.temp_dir.path()
    }

    fn cask_cmd(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_cask"));
        cmd.env("HOME", self.temp_dir.path());
        cmd.env("CASK_HOME", &self.cask_home);
        cmd.env("CASK_APPDIR", &self.appdir);
        cmd.env("CASK_CASKS_DIR", &self.casks_dir);
        cmd.env_remove("RUST_LOG");
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.cask_cmd().args(args).output().expect("failed to run cask")
    }

    fn write_manifest(&self, name: &str, content: &str) -> PathBuf {
        let path = self.casks_dir.join(name);
        std::fs::write(&path, content).expect("failed to write manifest");
        path
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn bundled_skype() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../casks/skype.toml")
}

fn demo_zip() -> Vec<u8> {
    let mut buf = std::io::Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut buf);
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("Demo.app/Contents/Info.plist", options).unwrap();
        zip.write_all(b"<plist/>").unwrap();
        zip.finish().unwrap();
    }
    buf.into_inner()
}

fn demo_manifest(base: &str, body: &[u8]) -> String {
    let sha256 = hex::encode(Sha256::digest(body));
    format!(
        r#"
[cask]
token = "demo"
name = "Demo"
version = "1.0"
homepage = "https://example.com/"

[source]
url = "{base}/Demo-{{{{version}}}}.zip"
sha256 = "{sha256}"

[install]
app = "Demo.app"

[zap]
delete = [
    "~/Library/Caches/com.example.demo",
    "~/Library/Preferences/com.example.demo.plist",
]
"#
    )
}

#[test]
fn test_help_command() {
    let ctx = TestContext::new();
    let output = ctx.run(&["--help"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Usage:"));
}

#[test]
fn test_version_command() {
    let ctx = TestContext::new();
    assert!(ctx.run(&["--version"]).status.success());
}

#[test]
fn test_validate_bundled_skype_manifest() {
    let ctx = TestContext::new();
    let path = bundled_skype();
    let output = ctx.run(&["validate", path.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("skype"));
}

#[test]
fn test_url_resolves_version() {
    let ctx = TestContext::new();
    let path = bundled_skype();
    let output = ctx.run(&["url", path.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        stdout(&output).trim(),
        "https://endpoint920510.azureedge.net/s4l/s4l/download/mac/Skype-8.34.0.78.dmg"
    );
}

#[test]
fn test_validate_reports_every_problem() {
    let ctx = TestContext::new();
    let path = ctx.write_manifest(
        "broken.toml",
        r#"
[cask]
token = "Bad Token!"
name = "Broken"
version = "1.0"
homepage = "not a url"

[source]
url = "https://example.com/static.dmg"
sha256 = "abc"

[install]
app = "Broken"
"#,
    );
    let output = ctx.run(&["validate", path.to_str().unwrap()]);
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("token"), "stderr: {err}");
    assert!(err.contains("64"), "stderr: {err}");
    assert!(err.contains("placeholder"), "stderr: {err}");
}

#[test]
fn test_validate_missing_field() {
    let ctx = TestContext::new();
    let path = ctx.write_manifest("partial.toml", "[cask]\ntoken = \"partial\"\n");
    let output = ctx.run(&["validate", path.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr(&output).to_lowercase().contains("missing"));
}

#[test]
fn test_validate_rejects_duplicate_tokens() {
    let ctx = TestContext::new();
    let skype = std::fs::read_to_string(bundled_skype()).unwrap();
    ctx.write_manifest("skype.toml", &skype);
    ctx.write_manifest("skype-again.toml", &skype);
    let output = ctx.run(&["validate", ctx.casks_dir.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("skype"));
}

#[test]
fn test_hash_command() {
    let ctx = TestContext::new();
    let file = ctx.home().join("artifact.bin");
    std::fs::write(&file, b"hello").unwrap();
    let output = ctx.run(&["hash", file.to_str().unwrap()]);
    assert!(output.status.success());
    assert!(
        stdout(&output)
            .contains("2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824")
    );
}

#[test]
fn test_list_creates_state_db() {
    let ctx = TestContext::new();
    let output = ctx.run(&["list"]);
    assert!(output.status.success());
    assert!(ctx.cask_home.join("state.db").exists());
}

#[test]
fn test_search_uses_casks_dir() {
    let ctx = TestContext::new();
    let skype = std::fs::read_to_string(bundled_skype()).unwrap();
    ctx.write_manifest("skype.toml", &skype);
    let output = ctx.run(&["search", "skyp"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("skype"));
}

#[test]
fn test_install_is_idempotent_and_zap_skips_missing() {
    let ctx = TestContext::new();
    let body = demo_zip();
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/Demo-1.0.zip")
        .with_body(body.clone())
        .expect(1)
        .create();
    ctx.write_manifest("demo.toml", &demo_manifest(&server.url(), &body));

    let first = ctx.run(&["install", "demo"]);
    assert!(first.status.success(), "stderr: {}", stderr(&first));
    assert!(ctx.appdir.join("Demo.app/Contents/Info.plist").exists());

    let second = ctx.run(&["install", "demo"]);
    assert!(second.status.success(), "stderr: {}", stderr(&second));
    assert!(stdout(&second).contains("already up to date"));
    mock.assert();

    let list = ctx.run(&["list"]);
    assert!(stdout(&list).contains("demo"));

    let cache = ctx.home().join("Library/Caches/com.example.demo");
    std::fs::create_dir_all(&cache).unwrap();

    let zap = ctx.run(&["uninstall", "demo", "--zap"]);
    assert!(zap.status.success(), "stderr: {}", stderr(&zap));
    assert!(!ctx.appdir.join("Demo.app").exists());
    assert!(!cache.exists());
    assert!(stdout(&zap).contains("skipped"));

    let again = ctx.run(&["uninstall", "demo"]);
    assert!(!again.status.success());
}

#[test]
fn test_dry_run_install_changes_nothing() {
    let ctx = TestContext::new();
    let body = demo_zip();
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/Demo-1.0.zip")
        .with_body(body.clone())
        .expect(0)
        .create();
    ctx.write_manifest("demo.toml", &demo_manifest(&server.url(), &body));

    let output = ctx.run(&["--dry-run", "install", "demo"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("dry run"));
    assert!(!ctx.appdir.join("Demo.app").exists());
    mock.assert();
}

#[test]
fn test_completions() {
    let ctx = TestContext::new();
    let output = ctx.run(&["completions", "bash"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("cask"));
}
