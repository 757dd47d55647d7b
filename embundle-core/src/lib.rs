#![forbid(unsafe_code)]

pub mod error;

pub mod container {
    pub mod header;
    pub mod record;
    pub mod section;
    pub mod trailer;
}

pub mod locate;

pub mod index {
    pub mod scan;
}

pub mod read {
    pub mod extract;
    pub mod view;
}

pub mod vfs;

pub mod pack {
    pub mod writer;
}

pub mod bundle;
pub mod list;

// Re-exports: stable API surface
pub use bundle::{
    has_bundle, has_bundle_current_exe, open_bundle, unbundle, unbundle_current_exe, unbundle_with,
};
pub use container::header::Header;
pub use container::record::EntryLoc;
pub use error::{BundleError, Result};
pub use index::scan::IndexOptions;
pub use list::{EntryRow, ListOptions, list};
pub use locate::{ContainerSpan, Locator};
pub use pack::writer::{
    BundleOptions, BundleReport, Embedding, ObjcopyInjector, SectionInjector, bundle,
    bundle_with_injector,
};
pub use read::extract::extract;
pub use read::view::BoundedFile;
pub use vfs::{BundleFs, DirEntry, Metadata, Node, NodeKind};
