use std::io;

use rayon::prelude::*;
use serde::Serialize;

use crate::error::Result;
use crate::vfs::BundleFs;

#[derive(Clone, Copy, Debug, Default)]
pub struct ListOptions {
    /// Compute a BLAKE3 digest of every entry.
    pub hashes: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct EntryRow {
    pub name: String,
    pub size: u64,
    pub offset: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blake3: Option<String>,
}

/// Rows in container order. Digests are computed in parallel, each entry
/// through its own view.
pub fn list(bundle: &BundleFs, opts: &ListOptions) -> Result<Vec<EntryRow>> {
    bundle
        .entries()
        .par_iter()
        .map(|e| -> Result<EntryRow> {
            let blake3 = if opts.hashes {
                let mut view = bundle.open_file(&e.name)?;
                let mut hasher = blake3::Hasher::new();
                io::copy(&mut view, &mut hasher)?;
                Some(hasher.finalize().to_hex().to_string())
            } else {
                None
            };
            Ok(EntryRow {
                name: e.name.clone(),
                size: e.size,
                offset: e.offset,
                blake3,
            })
        })
        .collect()
}
