//! Working-tree operations through the system `git` binary.
//!
//! Clone, fetch, checkout and submodule plumbing go through `git` so that
//! SSH keys, credential helpers and `~/.gitconfig` apply exactly as they do
//! for an operator. Object reads go through gix instead (see `history`).

use std::path::Path;
use std::process::{Command, Output};

use crate::error::VcsError;

/// Run `git` in `dir` and return the raw output, whatever the exit status.
fn run(dir: &Path, args: &[&str]) -> Result<Output, VcsError> {
    tracing::trace!(dir = %dir.display(), args = ?args, "Running git");
    Command::new("git")
        .args(args)
        .current_dir(dir)
        // Never block a sync pass on an interactive credential prompt
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .map_err(|e| VcsError::Git {
            command: args.join(" "),
            message: e.to_string(),
        })
}

/// Run `git` in `dir`, failing on a non-zero exit status.
///
/// # Returns
///
/// Captured stdout with surrounding whitespace removed.
pub(crate) fn git(dir: &Path, args: &[&str]) -> Result<String, VcsError> {
    let output = run(dir, args)?;
    if !output.status.success() {
        return Err(VcsError::Git {
            command: args.join(" "),
            message: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
}

/// Run a `git` query whose exit status 1 means "nothing found".
///
/// Used for `git config --get-regexp` and `git show-ref --verify`.
fn query(dir: &Path, args: &[&str]) -> Result<Option<String>, VcsError> {
    let output = run(dir, args)?;
    match output.status.code() {
        Some(0) => Ok(Some(
            String::from_utf8_lossy(&output.stdout).trim().to_owned(),
        )),
        Some(1) => Ok(None),
        _ => Err(VcsError::Git {
            command: args.join(" "),
            message: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        }),
    }
}

/// True if `dir` holds a git working tree (plain clone or submodule).
pub(crate) fn is_repository(dir: &Path) -> bool {
    dir.join(".git").exists()
}

/// Clone `origin` into `target` with every branch and every submodule.
pub(crate) fn clone_recursive(origin: &str, target: &Path) -> Result<(), VcsError> {
    let parent = target.parent().unwrap_or(Path::new("."));
    std::fs::create_dir_all(parent)?;
    let target = target.to_string_lossy();
    git(
        parent,
        &[
            "clone",
            "--quiet",
            "--recurse-submodules",
            "--no-single-branch",
            origin,
            target.as_ref(),
        ],
    )?;
    Ok(())
}

/// Submodule declared in `.gitmodules`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SubmoduleEntry {
    /// Submodule name (the product name).
    pub name: String,
    /// Working tree path relative to the parent repository.
    pub path: String,
}

/// List submodules declared in the parent's `.gitmodules`.
pub(crate) fn submodules(root: &Path) -> Result<Vec<SubmoduleEntry>, VcsError> {
    if !root.join(".gitmodules").exists() {
        return Ok(Vec::new());
    }
    let listing = query(
        root,
        &[
            "config",
            "--file",
            ".gitmodules",
            "--get-regexp",
            r"^submodule\..*\.path$",
        ],
    )?;
    Ok(listing
        .as_deref()
        .map(parse_submodule_listing)
        .unwrap_or_default())
}

/// Parse `submodule.<name>.path <path>` lines.
fn parse_submodule_listing(listing: &str) -> Vec<SubmoduleEntry> {
    listing
        .lines()
        .filter_map(|line| {
            let (key, path) = line.split_once(' ')?;
            let name = key.strip_prefix("submodule.")?.strip_suffix(".path")?;
            Some(SubmoduleEntry {
                name: name.to_owned(),
                path: path.trim().to_owned(),
            })
        })
        .collect()
}

/// Short names of all remote-tracking branches (e.g. `origin/2024.1`).
pub(crate) fn remote_branches(dir: &Path) -> Result<Vec<String>, VcsError> {
    let listing = git(dir, &["for-each-ref", "--format=%(refname)", "refs/remotes"])?;
    Ok(listing
        .lines()
        .filter_map(|line| line.strip_prefix("refs/remotes/"))
        .filter(|name| !name.ends_with("/HEAD"))
        .map(str::to_owned)
        .collect())
}

/// True if `refs/heads/<branch>` exists.
pub(crate) fn local_branch_exists(dir: &Path, branch: &str) -> Result<bool, VcsError> {
    let refname = format!("refs/heads/{branch}");
    Ok(query(dir, &["show-ref", "--verify", "--quiet", &refname])?.is_some())
}

/// Name of the checked-out branch, `None` when HEAD is detached.
pub(crate) fn current_branch(dir: &Path) -> Result<Option<String>, VcsError> {
    let head = query(dir, &["symbolic-ref", "--quiet", "--short", "HEAD"])?;
    Ok(head.filter(|h| !h.is_empty()))
}
