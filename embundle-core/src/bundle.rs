use std::path::Path;

use crate::error::{BundleError, Result};
use crate::index::scan::{IndexOptions, build_index};
use crate::locate::Locator;
use crate::vfs::BundleFs;

/// Open the bundle attached to `path` with a known strategy.
pub fn open_bundle(path: &Path, locator: Locator, opts: &IndexOptions) -> Result<BundleFs> {
    let span = locator.locate(path)?;
    let index = build_index(path, span, opts)?;
    tracing::info!(
        path = %path.display(),
        ?locator,
        entries = index.entries.len(),
        description = %index.header.description,
        "bundle opened"
    );
    Ok(BundleFs::new(path, locator, index))
}

/// Open whichever bundle `path` carries; `NotABundle` when there is none.
pub fn unbundle(path: &Path) -> Result<BundleFs> {
    unbundle_with(path, &IndexOptions::default())
}

pub fn unbundle_with(path: &Path, opts: &IndexOptions) -> Result<BundleFs> {
    let (locator, span) = Locator::detect(path)
        .ok_or_else(|| BundleError::NotABundle(path.display().to_string()))?;
    let index = build_index(path, span, opts)?;
    Ok(BundleFs::new(path, locator, index))
}

pub fn unbundle_current_exe() -> Result<BundleFs> {
    unbundle(&std::env::current_exe()?)
}

/// Never fails: unreadable, empty or plain files are simply not bundles.
pub fn has_bundle(path: &Path) -> bool {
    Locator::detect(path).is_some()
}

pub fn has_bundle_current_exe() -> bool {
    std::env::current_exe()
        .map(|exe| has_bundle(&exe))
        .unwrap_or(false)
}
