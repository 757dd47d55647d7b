use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::{BundleError, Result};
use crate::vfs::BundleFs;

/// Write every entry under `dest`, creating intermediate directories.
/// Returns the number of files written.
pub fn extract(bundle: &BundleFs, dest: &Path) -> Result<usize> {
    fs::create_dir_all(dest)?;
    let mut written = 0;
    for e in bundle.walk() {
        let outp = safe_join(dest, &e.name)?;
        if let Some(parent) = outp.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut src = bundle.open_file(&e.name)?;
        let mut out = File::create(&outp)?;
        let n = io::copy(&mut src, &mut out)?;
        if n != e.size {
            return Err(BundleError::Format(format!(
                "{}: extracted {n} of {} bytes",
                e.name, e.size
            )));
        }
        written += 1;
    }
    tracing::info!(dest = %dest.display(), files = written, "extracted");
    Ok(written)
}

fn safe_join(root: &Path, rel: &str) -> Result<PathBuf> {
    let p = Path::new(rel);
    if !p.components().all(|c| matches!(c, Component::Normal(_))) {
        return Err(BundleError::InvalidPath(format!("unsafe path: {rel}")));
    }
    Ok(root.join(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsafe_names_are_refused() {
        let root = Path::new("/tmp/out");
        assert!(safe_join(root, "a/b.txt").is_ok());
        assert!(safe_join(root, "../b.txt").is_err());
        assert!(safe_join(root, "/etc/passwd").is_err());
    }
}
