//! Build identification for fair-metrics
//!
//! Exposes `GIT_HASH`, `BUILD_TIMESTAMP` and `BUILD_PROFILE`, plus the
//! `FAIR_USER_AGENT` sent by every outbound request so that harvested sites
//! can tell which build evaluated them.

use std::process::Command;

fn git_short_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8(output.stdout).ok()?;
    let hash = hash.trim();
    (!hash.is_empty()).then(|| hash.to_string())
}

fn main() {
    let version = std::env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".to_string());
    let git_hash = git_short_hash();
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());
    let build_timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);

    let user_agent = match &git_hash {
        Some(hash) => format!("fair-metrics/{version} (build {hash})"),
        None => format!("fair-metrics/{version}"),
    };

    let env = [
        ("GIT_HASH", git_hash.as_deref().unwrap_or("unknown")),
        ("BUILD_TIMESTAMP", build_timestamp.as_str()),
        ("BUILD_PROFILE", profile.as_str()),
        ("FAIR_USER_AGENT", user_agent.as_str()),
    ];
    for (key, value) in env {
        println!("cargo:rustc-env={key}={value}");
    }
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=../.git/HEAD");
}
