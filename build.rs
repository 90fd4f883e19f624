use std::process::Command;

fn normalized_version(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some(without_prefix) = trimmed.strip_prefix('v')
        && without_prefix
            .chars()
            .next()
            .is_some_and(|ch| ch.is_ascii_digit())
    {
        return without_prefix.to_string();
    }
    trimmed.to_string()
}

fn version_from_git() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let value = String::from_utf8(output.stdout).ok()?;
    let normalized = normalized_version(&value);
    (!normalized.is_empty()).then_some(normalized)
}

fn main() {
    println!("cargo:rerun-if-env-changed=TEAMBOARD_VERSION");
    println!("cargo:rerun-if-changed=.git/HEAD");

    let version = std::env::var("TEAMBOARD_VERSION")
        .ok()
        .map(|raw| normalized_version(&raw))
        .filter(|value| !value.is_empty())
        .or_else(version_from_git)
        .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

    println!("cargo:rustc-env=TEAMBOARD_BUILD_VERSION={version}");
}
