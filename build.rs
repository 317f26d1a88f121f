use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");
    println!("cargo:rerun-if-changed=migrations");
    println!("cargo:rerun-if-env-changed=GIT_VERSION");

    println!("cargo:rustc-env=GIT_VERSION={}", resolve_version());
}

/// Version stamp shown on the settings page and the health endpoint.
///
/// An explicit `GIT_VERSION` (container and CI builds) wins over
/// `git describe`; builds outside a checkout report "dev".
fn resolve_version() -> String {
    if let Some(version) = std::env::var("GIT_VERSION")
        .ok()
        .filter(|v| !v.is_empty() && v != "dev")
    {
        return version;
    }

    Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "dev".to_string())
}
