//! Build script for mirp-sync
//!
//! Stamps the binary with the metadata printed in its startup line.
//! `MIRP_GIT_COMMIT` is only set when building from a git checkout, so the
//! binary reports no commit rather than a placeholder.

use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let built_at = chrono::Utc::now().format("%Y-%m-%d %H:%M UTC");
    println!("cargo:rustc-env=MIRP_BUILT_AT={}", built_at);

    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "custom".to_string());
    println!("cargo:rustc-env=MIRP_BUILD_PROFILE={}", profile);

    if let Some(commit) = git_commit() {
        println!("cargo:rustc-env=MIRP_GIT_COMMIT={}", commit);
        if let Some(head) = git_head_path() {
            println!("cargo:rerun-if-changed={}", head);
        }
    }
}

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Short commit hash, with `-dirty` when the tree has local changes
fn git_commit() -> Option<String> {
    let hash = git(&["rev-parse", "--short=8", "HEAD"])?;
    let dirty = git(&["status", "--porcelain", "--untracked-files=no"]).is_some();
    Some(if dirty { format!("{}-dirty", hash) } else { hash })
}

/// HEAD file of the enclosing repository, so a new commit re-runs this script
fn git_head_path() -> Option<String> {
    git(&["rev-parse", "--git-path", "HEAD"])
}
