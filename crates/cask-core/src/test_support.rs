//! Fixtures shared by the runtime tests.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use cask_schema::{CaskManifest, HashAlgorithm, Token, Version};

use crate::config::Config;
use crate::io::hash::hash_bytes;
use crate::paths::Layout;
use crate::state::{StateDb, StateHandle};
use crate::{Context, Reporter};

/// Records every `done`/`failed` detail for later assertions.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub events: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, s: String) {
        self.events.lock().unwrap().push(s);
    }
}

impl Reporter for RecordingReporter {
    fn section(&self, _: &str) {}
    fn downloading(&self, _: &Token, _: &Version, _: u64, _: Option<u64>) {}
    fn installing(&self, t: &Token, v: &Version) {
        self.push(format!("installing {t} {v}"));
    }
    fn removing(&self, t: &Token, v: &Version) {
        self.push(format!("removing {t} {v}"));
    }
    fn done(&self, t: &Token, v: &Version, detail: &str, _: Option<u64>) {
        self.push(format!("done {t} {v}: {detail}"));
    }
    fn failed(&self, t: &Token, v: &Version, reason: &str) {
        self.push(format!("failed {t} {v}: {reason}"));
    }
    fn info(&self, msg: &str) {
        self.push(format!("info: {msg}"));
    }
    fn success(&self, _: &str) {}
    fn warning(&self, msg: &str) {
        self.push(format!("warning: {msg}"));
    }
    fn error(&self, _: &str) {}
    fn summary(&self, _: usize, _: &str, _: f64) {}
}

/// A sandboxed home with its own cask root, Applications folder and Trash.
pub struct Sandbox {
    pub dir: tempfile::TempDir,
    pub reporter: Arc<RecordingReporter>,
    pub ctx: Context,
}

impl Sandbox {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let home = dir.path().join("home");
        std::fs::create_dir_all(&home).unwrap();

        let config = Config {
            appdir: dir.path().join("Applications"),
            trash_dir: Some(home.join(".Trash")),
            strip_quarantine: false,
            ..Config::default()
        };
        let reporter = Arc::new(RecordingReporter::default());
        let mut ctx = Context::new(
            Layout::at(dir.path().join("cask")),
            config,
            StateHandle::new(StateDb::in_memory().unwrap()),
            reqwest::Client::new(),
            reporter.clone(),
        );
        ctx.home = home;
        Self { dir, reporter, ctx }
    }

    pub fn home(&self) -> &Path {
        &self.ctx.home
    }

    pub fn app_path(&self, app: &str) -> PathBuf {
        self.ctx.config.appdir.join(app)
    }
}

/// An in-memory ZIP holding a minimal `Demo.app` bundle.
pub fn demo_app_zip() -> Vec<u8> {
    let mut buf = std::io::Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut buf);
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("Demo.app/Contents/Info.plist", options).unwrap();
        zip.write_all(b"<plist version=\"1.0\"/>").unwrap();
        zip.start_file("Demo.app/Contents/MacOS/Demo", options).unwrap();
        zip.write_all(b"#!/bin/sh\necho demo\n").unwrap();
        zip.finish().unwrap();
    }
    buf.into_inner()
}

/// A manifest for `demo` served from `base`, matching `body`'s digest.
pub fn demo_manifest(base: &str, version: &str, body: &[u8], zap: &str) -> CaskManifest {
    let sha256 = hash_bytes(HashAlgorithm::Sha256, body);
    CaskManifest::parse(&format!(
        r#"
[cask]
token = "demo"
name = "Demo"
version = "{version}"
homepage = "https://example.com/"

[source]
url = "{base}/Demo-{{{{version}}}}.zip"
sha256 = "{sha256}"

[install]
app = "Demo.app"

{zap}
"#
    ))
    .unwrap()
}
