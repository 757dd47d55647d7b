use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use walkdir::WalkDir;

const BIN: &str = env!("CARGO_BIN_EXE_embundledev");

fn run(exe: impl AsRef<Path>, args: &[&str]) -> Output {
    Command::new(exe.as_ref())
        .args(args)
        .output()
        .expect("spawn")
}

fn stdout(o: &Output) -> String {
    String::from_utf8_lossy(&o.stdout).into_owned()
}

fn assets(root: &Path) {
    fs::write(root.join("index.html"), b"hi").unwrap();
    fs::create_dir_all(root.join("css")).unwrap();
    fs::write(root.join("css/app.css"), b"body{}").unwrap();
    fs::create_dir_all(root.join("img/icons")).unwrap();
    fs::write(root.join("img/icons/a.png"), [0u8, 1, 2, 0, 255]).unwrap();
}

fn files_under(root: &Path) -> Vec<(String, Vec<u8>)> {
    let mut out: Vec<_> = WalkDir::new(root)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(root).unwrap();
            (rel.to_string_lossy().replace('\\', "/"), fs::read(e.path()).unwrap())
        })
        .collect();
    out.sort();
    out
}

#[test]
fn self_contained_executable_serves_its_own_assets() {
    let work = tempfile::tempdir_in(env!("CARGO_TARGET_TMPDIR")).unwrap();
    let src = work.path().join("assets");
    fs::create_dir(&src).unwrap();
    assets(&src);
    let app = work.path().join("app");

    let o = run(BIN, &["bundle", src.to_str().unwrap(), app.to_str().unwrap(), "v1", "--deterministic"]);
    assert!(o.status.success(), "{}", String::from_utf8_lossy(&o.stderr));

    let o = run(BIN, &["check", app.to_str().unwrap()]);
    assert!(o.status.success());
    assert_eq!(stdout(&o).trim(), "yes");

    let o = run(BIN, &["check", BIN]);
    assert_eq!(o.status.code(), Some(1));
    assert_eq!(stdout(&o).trim(), "no");

    // The bundled copy reads the container appended to itself.
    let o = run(&app, &["info", "--json"]);
    assert!(o.status.success(), "{}", String::from_utf8_lossy(&o.stderr));
    let info: serde_json::Value = serde_json::from_str(&stdout(&o)).unwrap();
    assert_eq!(info["header"]["description"], "v1");
    assert_eq!(info["header"]["created_at"], 0);
    assert_eq!(info["entries"], 3);

    let o = run(&app, &["cat", "index.html"]);
    assert_eq!(o.stdout, b"hi");
    let o = run(&app, &["cat", "/css/app.css", "--start", "2", "--len", "3"]);
    assert_eq!(o.stdout, b"dy{");
    let o = run(&app, &["cat", "css/app.css", "--start", "7"]);
    assert!(!o.status.success());
    let o = run(&app, &["cat", "missing.txt"]);
    assert!(!o.status.success());

    let o = run(&app, &["list", "--json", "--hashes"]);
    let rows: serde_json::Value = serde_json::from_str(&stdout(&o)).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r["blake3"].as_str().map(str::len) == Some(64)));

    let dest = work.path().join("out");
    let o = run(&app, &["unbundle", dest.to_str().unwrap()]);
    assert!(o.status.success(), "{}", String::from_utf8_lossy(&o.stderr));
    assert_eq!(files_under(&dest), files_under(&src));
}

#[test]
fn plain_executable_has_nothing_to_unbundle() {
    let work = tempfile::tempdir_in(env!("CARGO_TARGET_TMPDIR")).unwrap();
    let o = run(BIN, &["unbundle", work.path().join("x").to_str().unwrap()]);
    assert!(!o.status.success());
    assert!(String::from_utf8_lossy(&o.stderr).contains("no bundle present"));
}

#[test]
fn bundle_rejects_missing_source() {
    let work = tempfile::tempdir_in(env!("CARGO_TARGET_TMPDIR")).unwrap();
    let missing = work.path().join("nope");
    let out = work.path().join("app");
    let o = run(BIN, &["bundle", missing.to_str().unwrap(), out.to_str().unwrap(), "d"]);
    assert!(!o.status.success());
    assert!(!out.exists());
}
