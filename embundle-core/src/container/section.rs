use std::fs::File;

use object::read::ReadCache;
use object::{Object, ObjectSection};

pub const DEFAULT_SECTION: &str = ".embundle-assets";

/// File range `(offset, size)` of the named section, if the host is an
/// object file that carries it with file-backed contents lying wholly
/// inside the file.
pub fn find_section(f: File, name: &str) -> Option<(u64, u64)> {
    let file_len = f.metadata().ok()?.len();
    let cache = ReadCache::new(f);
    let obj = match object::File::parse(&cache) {
        Ok(obj) => obj,
        Err(e) => {
            tracing::debug!(error = %e, "host is not an object file");
            return None;
        }
    };
    let section = obj.section_by_name(name)?;
    let (off, size) = section.file_range()?;
    match off.checked_add(size) {
        Some(end) if end <= file_len => Some((off, size)),
        _ => {
            tracing::warn!(section = name, off, size, file_len, "section range outside host file");
            None
        }
    }
}
