//! Read-only filesystem over the entries of one opened bundle.

pub mod path;
pub mod tree;

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;

use crate::container::header::Header;
use crate::container::record::EntryLoc;
use crate::error::{BundleError, Result};
use crate::index::scan::ContainerIndex;
use crate::locate::Locator;
use crate::read::view::BoundedFile;

pub use path::{base_name, normalize};
use tree::PlaceholderTree;

pub const READ_ONLY_MODE: u32 = 0o444;
pub const DIR_MODE: u32 = 0o555;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum NodeKind {
    File,
    Dir,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Metadata {
    pub name: String,
    pub kind: NodeKind,
    pub size: u64,
    pub mode: u32,
    /// Bundles store no modification times.
    pub modified: Option<SystemTime>,
}

impl Metadata {
    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Dir
    }

    fn dir(path: &str) -> Self {
        Self {
            name: base_name(path).to_string(),
            kind: NodeKind::Dir,
            size: 0,
            mode: DIR_MODE,
            modified: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DirEntry {
    pub name: String,
    pub kind: NodeKind,
}

/// A directory node from the placeholder tree.
#[derive(Debug)]
pub struct DirHandle {
    path: String,
    entries: Vec<DirEntry>,
}

impl DirHandle {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn entries(&self) -> &[DirEntry] {
        &self.entries
    }

    pub fn stat(&self) -> Metadata {
        Metadata::dir(&self.path)
    }
}

/// Result of [`BundleFs::open`].
#[derive(Debug)]
pub enum Node {
    File(BoundedFile),
    Dir(DirHandle),
}

impl Node {
    pub fn stat(&self) -> Metadata {
        match self {
            Node::File(f) => f.stat(),
            Node::Dir(d) => d.stat(),
        }
    }

    pub fn into_file(self) -> Option<BoundedFile> {
        match self {
            Node::File(f) => Some(f),
            Node::Dir(_) => None,
        }
    }
}

/// Immutable once built; share it by reference (or `Arc`) across threads.
/// Every open hands out a view with its own descriptor.
#[derive(Debug)]
pub struct BundleFs {
    host: PathBuf,
    locator: Locator,
    header: Header,
    entries: Vec<EntryLoc>,
    by_name: HashMap<String, usize>,
    tree: PlaceholderTree,
}

impl BundleFs {
    pub fn new(host: impl Into<PathBuf>, locator: Locator, index: ContainerIndex) -> Self {
        let ContainerIndex { header, entries } = index;
        let mut by_name = HashMap::with_capacity(entries.len());
        for (i, e) in entries.iter().enumerate() {
            if by_name.insert(e.name.clone(), i).is_some() {
                tracing::warn!(name = %e.name, "duplicate entry; later record wins");
            }
        }
        let tree = PlaceholderTree::from_names(entries.iter().map(|e| e.name.as_str()));
        Self {
            host: host.into(),
            locator,
            header,
            entries,
            by_name,
            tree,
        }
    }

    pub fn host(&self) -> &Path {
        &self.host
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Index entries in container order.
    pub fn entries(&self) -> &[EntryLoc] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Exact-match lookup after normalization.
    pub fn lookup(&self, path: &str) -> Result<Option<&EntryLoc>> {
        let name = normalize(path)?;
        Ok(self.by_name.get(&name).map(|&i| &self.entries[i]))
    }

    /// Open a file entry, or a directory node from the placeholder tree.
    pub fn open(&self, path: &str) -> Result<Node> {
        let name = normalize(path)?;
        if let Some(&i) = self.by_name.get(&name) {
            return Ok(Node::File(BoundedFile::open(&self.host, &self.entries[i])?));
        }
        match self.tree.list(&name) {
            Some(entries) => Ok(Node::Dir(DirHandle {
                path: name,
                entries,
            })),
            None => Err(BundleError::NotFound(path.to_string())),
        }
    }

    /// Like [`open`](Self::open) but only accepts files.
    pub fn open_file(&self, path: &str) -> Result<BoundedFile> {
        self.open(path)?
            .into_file()
            .ok_or_else(|| BundleError::NotFound(format!("{path} is a directory")))
    }

    pub fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>> {
        let name = normalize(path)?;
        self.tree
            .list(&name)
            .ok_or_else(|| BundleError::NotFound(path.to_string()))
    }

    pub fn metadata(&self, path: &str) -> Result<Metadata> {
        let name = normalize(path)?;
        if let Some(&i) = self.by_name.get(&name) {
            let e = &self.entries[i];
            return Ok(Metadata {
                name: base_name(&e.name).to_string(),
                kind: NodeKind::File,
                size: e.size,
                mode: READ_ONLY_MODE,
                modified: None,
            });
        }
        if self.tree.is_dir(&name) {
            return Ok(Metadata::dir(&name));
        }
        Err(BundleError::NotFound(path.to_string()))
    }

    pub fn exists(&self, path: &str) -> bool {
        self.metadata(path).is_ok()
    }

    /// All file entries, depth first with siblings in name order.
    pub fn walk(&self) -> Vec<&EntryLoc> {
        let mut out = Vec::with_capacity(self.entries.len());
        self.walk_dir(path::ROOT, &mut out);
        out
    }

    fn walk_dir<'a>(&'a self, dir: &str, out: &mut Vec<&'a EntryLoc>) {
        let Some(listing) = self.tree.list(dir) else {
            return;
        };
        for child in listing {
            let full = if dir == path::ROOT {
                child.name
            } else {
                format!("{dir}/{}", child.name)
            };
            match child.kind {
                NodeKind::Dir => self.walk_dir(&full, out),
                NodeKind::File => {
                    if let Some(&i) = self.by_name.get(&full) {
                        out.push(&self.entries[i]);
                    }
                }
            }
        }
    }

    /// Read a whole entry into memory.
    pub fn read_to_vec(&self, path: &str) -> Result<Vec<u8>> {
        let mut f = self.open_file(path)?;
        let mut buf = Vec::with_capacity(f.size() as usize);
        f.read_to_end(&mut buf)?;
        Ok(buf)
    }
}
