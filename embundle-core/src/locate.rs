use std::fs::File;
use std::path::Path;

use crate::container::section::{DEFAULT_SECTION, find_section};
use crate::container::trailer::read_trailer;
use crate::error::{BundleError, Result};

/// Byte range of a container inside its host file: `[start, end)`, where
/// `start` is the first header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerSpan {
    pub start: u64,
    pub end: u64,
}

impl ContainerSpan {
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// How the container was attached to the host executable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Locator {
    /// Appended after the executable, found through the trailing pointer
    #[default]
    Trailer,
    /// Stored as the contents of a named object-file section
    Section { name: String },
}

impl Locator {
    pub fn section() -> Self {
        Locator::Section {
            name: DEFAULT_SECTION.to_string(),
        }
    }

    /// Find the container, or `NotABundle` when this strategy sees none.
    pub fn locate(&self, path: &Path) -> Result<ContainerSpan> {
        let mut f = File::open(path)?;
        let span = match self {
            Locator::Trailer => {
                read_trailer(&mut f)?.map(|hit| ContainerSpan { start: hit.start, end: hit.end })
            }
            Locator::Section { name } => find_section(f, name).map(|(off, size)| ContainerSpan {
                start: off,
                end: off + size,
            }),
        };
        tracing::debug!(locator = ?self, path = %path.display(), ?span, "probe");
        span.ok_or_else(|| BundleError::NotABundle(path.display().to_string()))
    }

    /// Side-effect free presence check; never fails.
    pub fn probe(&self, path: &Path) -> bool {
        self.locate(path).is_ok()
    }

    /// Try the trailer tag first, then the default section.
    pub fn detect(path: &Path) -> Option<(Locator, ContainerSpan)> {
        [Locator::Trailer, Locator::section()]
            .into_iter()
            .find_map(|loc| loc.locate(path).ok().map(|span| (loc, span)))
    }
}
