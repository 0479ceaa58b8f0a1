use std::process::Command;

fn main() {
    // DOTLINK_VERSION from the release workflow wins; local builds use git describe.
    if let Ok(version) = std::env::var("DOTLINK_VERSION") {
        println!("cargo:rustc-env=DOTLINK_VERSION={version}");
    } else if let Ok(output) = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        && output.status.success()
    {
        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        println!("cargo:rustc-env=DOTLINK_VERSION={version}");
    }

    println!("cargo:rerun-if-changed=../.git/HEAD");
    println!("cargo:rerun-if-changed=../.git/refs/");
    println!("cargo:rerun-if-env-changed=DOTLINK_VERSION");
}
