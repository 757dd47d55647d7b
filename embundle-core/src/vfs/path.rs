use crate::error::{BundleError, Result};

/// The name of the virtual root.
pub const ROOT: &str = ".";

/// Strip leading slashes and validate: `.` for the root, otherwise
/// slash-separated elements that are non-empty and neither `.` nor `..`.
pub fn normalize(name: &str) -> Result<String> {
    let trimmed = name.trim_start_matches('/');
    if trimmed.is_empty() || trimmed == ROOT {
        return Ok(ROOT.to_string());
    }
    if !is_valid(trimmed) {
        return Err(BundleError::InvalidPath(name.to_string()));
    }
    Ok(trimmed.to_string())
}

pub fn is_valid(p: &str) -> bool {
    p == ROOT
        || p
            .split('/')
            .all(|el| !el.is_empty() && el != "." && el != ".." && !el.contains('\0'))
}

/// Final element of a slash path.
pub fn base_name(p: &str) -> &str {
    p.rsplit('/').next().unwrap_or(p)
}

/// Parent of a slash path; the root for top-level names.
pub fn parent(p: &str) -> &str {
    match p.rfind('/') {
        Some(i) => &p[..i],
        None => ROOT,
    }
}
