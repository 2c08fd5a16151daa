fn main() {
    // Rerun when git HEAD changes (commit, checkout, etc.)
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");

    let output = std::process::Command::new("git")
        .args(["describe", "--always", "--dirty", "--tags"])
        .output();

    // git が使えない (tarball からのビルド等) ならクレートのバージョン
    let version = match output {
        Ok(o) if o.status.success() => {
            format!("{} ({})", env!("CARGO_PKG_VERSION"), String::from_utf8_lossy(&o.stdout).trim())
        }
        _ => env!("CARGO_PKG_VERSION").to_string(),
    };

    println!("cargo:rustc-env=GIT_VERSION={}", version);
}
