//! Throwaway upstream repositories for tests.
//!
//! [`Upstream`] builds a parent docs repository with one submodule per
//! product inside a temporary directory, mirroring the layout the content
//! store expects from a real origin. Each product repository has a `main`
//! branch plus one branch per version.
//!
//! Requires the `git` binary. [`Upstream::new`] panics when it is missing,
//! so git-backed tests fail instead of passing vacuously.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Once;

use tempfile::TempDir;

/// Files of one version: `(relative path, contents)`.
pub type Files<'a> = &'a [(&'a str, &'a str)];

static ALLOW_FILE_PROTOCOL: Once = Once::new();

/// Allow `file://` submodule URLs for every `git` child process.
///
/// Recent git refuses local-path submodules by default.
fn allow_file_protocol() {
    ALLOW_FILE_PROTOCOL.call_once(|| {
        // SAFETY: runs once, before any fixture spawns git.
        unsafe {
            std::env::set_var("GIT_CONFIG_COUNT", "1");
            std::env::set_var("GIT_CONFIG_KEY_0", "protocol.file.allow");
            std::env::set_var("GIT_CONFIG_VALUE_0", "always");
        }
    });
}

/// Run git in `dir`, panicking with stderr on failure.
fn git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args([
            "-c",
            "user.name=HD Fixtures",
            "-c",
            "user.email=fixtures@hd.invalid",
            "-c",
            "commit.gpgsign=false",
        ])
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to spawn git");
    assert!(
        output.status.success(),
        "git {} failed in {}: {}",
        args.join(" "),
        dir.display(),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn write_files(dir: &Path, files: Files<'_>) {
    for (path, contents) in files {
        let target = dir.join(path);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(target, contents).unwrap();
    }
}

/// Upstream docs repository with product submodules.
pub struct Upstream {
    temp: TempDir,
}

/// True if a usable `git` binary is on `PATH`.
fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|o| o.status.success())
}

impl Upstream {
    /// Create an upstream parent repository with one commit on `main`.
    ///
    /// # Panics
    ///
    /// Panics if `git` is not on `PATH`.
    #[must_use]
    pub fn new() -> Self {
        assert!(
            git_available(),
            "git binary not found on PATH; git-backed tests require it"
        );
        allow_file_protocol();
        let temp = tempfile::tempdir().unwrap();
        let upstream = Self { temp };

        let root = upstream.upstream_path();
        std::fs::create_dir_all(&root).unwrap();
        git(&root, &["init", "--quiet", "--initial-branch=main"]);
        write_files(&root, &[("README", "documentation mirror\n")]);
        git(&root, &["add", "--all"]);
        git(&root, &["commit", "--quiet", "-m", "Initial commit"]);
        upstream
    }

    /// Parent repository directory.
    #[must_use]
    pub fn upstream_path(&self) -> PathBuf {
        self.temp.path().join("upstream")
    }

    /// Clone URL of the parent repository.
    #[must_use]
    pub fn origin(&self) -> String {
        self.upstream_path().to_string_lossy().into_owned()
    }

    /// Where a mirror of this upstream should live (not created).
    #[must_use]
    pub fn mirror_path(&self) -> PathBuf {
        self.temp.path().join("mirror")
    }

    fn product_path(&self, name: &str) -> PathBuf {
        self.temp.path().join("products").join(name.replace('/', "-"))
    }

    /// Create a product repository and register it as submodule `name`.
    ///
    /// Every `(version, files)` pair becomes a branch forked from `main`.
    pub fn add_product(&self, name: &str, versions: &[(&str, Files<'_>)]) {
        let dir = self.product_path(name);
        std::fs::create_dir_all(&dir).unwrap();
        git(&dir, &["init", "--quiet", "--initial-branch=main"]);
        write_files(&dir, &[("README", name)]);
        git(&dir, &["add", "--all"]);
        git(&dir, &["commit", "--quiet", "-m", "Initial commit"]);

        for &(version, files) in versions {
            git(&dir, &["checkout", "--quiet", "-b", version, "main"]);
            write_files(&dir, files);
            git(&dir, &["add", "--all"]);
            git(&dir, &["commit", "--quiet", "-m", format!("Release {version}").as_str()]);
        }
        git(&dir, &["checkout", "--quiet", "main"]);

        let root = self.upstream_path();
        let url = dir.to_string_lossy().into_owned();
        git(&root, &["submodule", "add", "--quiet", "--name", name, url.as_str(), name]);
        git(&root, &["commit", "--quiet", "-m", format!("Add {name}").as_str()]);
    }

    /// Commit `files` on top of branch `version` of product `name`.
    pub fn commit_to_version(&self, name: &str, version: &str, files: Files<'_>) {
        let dir = self.product_path(name);
        git(&dir, &["checkout", "--quiet", version]);
        write_files(&dir, files);
        git(&dir, &["add", "--all"]);
        git(&dir, &["commit", "--quiet", "-m", format!("Update {version}").as_str()]);
        git(&dir, &["checkout", "--quiet", "main"]);
    }

    /// Commit a metadata file at the root of the parent repository.
    pub fn write_metadata(&self, file_name: &str, json: &str) {
        let root = self.upstream_path();
        write_files(&root, &[(file_name, json)]);
        git(&root, &["add", "--all"]);
        git(&root, &["commit", "--quiet", "-m", "Update product metadata"]);
    }
}

impl Default for Upstream {
    fn default() -> Self {
        Self::new()
    }
}
