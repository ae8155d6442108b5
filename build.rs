use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    // Bundled rate sheet and pinyin table are embedded at compile time.
    println!("cargo:rerun-if-changed=assets");
    println!("cargo:rerun-if-changed=.git/HEAD");
    if let Ok(output) = Command::new("git")
        .args(["describe", "--tags", "--abbrev=0", "--match", "v*"])
        .output()
    {
        if output.status.success() {
            if let Ok(tag) = String::from_utf8(output.stdout) {
                let tag = tag.trim();
                if !tag.is_empty() {
                    println!("cargo:rustc-env=GIT_TAG={tag}");
                }
            }
        }
    }
}
