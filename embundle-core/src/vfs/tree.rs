use std::collections::BTreeMap;

use super::path::{ROOT, base_name, is_valid, parent};
use super::{DirEntry, NodeKind};

/// Directory structure implied by the stored file names. Holds no content;
/// reads are always served from the offset table.
#[derive(Clone, Debug)]
pub struct PlaceholderTree {
    dirs: BTreeMap<String, BTreeMap<String, NodeKind>>,
}

impl Default for PlaceholderTree {
    fn default() -> Self {
        let mut dirs = BTreeMap::new();
        dirs.insert(ROOT.to_string(), BTreeMap::new());
        Self { dirs }
    }
}

impl PlaceholderTree {
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut tree = Self::default();
        for name in names {
            tree.insert_file(name);
        }
        tree
    }

    /// Record a file and every directory above it. Invalid names are skipped.
    pub fn insert_file(&mut self, name: &str) -> bool {
        if name == ROOT || !is_valid(name) {
            tracing::warn!(name, "skipping unaddressable entry name");
            return false;
        }
        let mut child = name;
        let mut kind = NodeKind::File;
        loop {
            let dir = parent(child);
            let base = base_name(child);
            let listing = self.dirs.entry(dir.to_string()).or_default();
            match kind {
                NodeKind::Dir => {
                    listing.insert(base.to_string(), NodeKind::Dir);
                }
                NodeKind::File => {
                    listing.entry(base.to_string()).or_insert(NodeKind::File);
                }
            }
            if dir == ROOT {
                return true;
            }
            child = dir;
            kind = NodeKind::Dir;
        }
    }

    pub fn is_dir(&self, path: &str) -> bool {
        self.dirs.contains_key(path)
    }

    pub fn list(&self, path: &str) -> Option<Vec<DirEntry>> {
        self.dirs.get(path).map(|listing| {
            listing
                .iter()
                .map(|(name, kind)| DirEntry {
                    name: name.clone(),
                    kind: *kind,
                })
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intermediate_directories_exist() {
        let tree = PlaceholderTree::from_names(["assets/icons/a.png", "assets/b.css", "index.html"]);

        assert!(tree.is_dir("."));
        assert!(tree.is_dir("assets"));
        assert!(tree.is_dir("assets/icons"));
        assert!(!tree.is_dir("assets/icons/a.png"));

        let icons = tree.list("assets/icons").unwrap();
        assert_eq!(icons, vec![DirEntry { name: "a.png".into(), kind: NodeKind::File }]);

        let root: Vec<_> = tree.list(".").unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(root, ["assets", "index.html"]);
    }

    #[test]
    fn bogus_names_are_not_inserted() {
        let mut tree = PlaceholderTree::default();
        assert!(!tree.insert_file("../escape"));
        assert!(!tree.insert_file("a//b"));
        assert!(tree.list(".").unwrap().is_empty());
    }
}
