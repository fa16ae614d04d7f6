//! Virtual directory tree over the flat TOC
//!
//! The archive only stores full logical paths. [`PathTrie`] rebuilds the
//! directory hierarchy those paths imply so that existence, is-directory and
//! listing queries can be answered without touching any payload.
//!
//! Nodes live in one arena (`Vec<Node>`) and refer to children by index.
//! The trie is immutable after [`PathTrie::build`] and can be shared freely
//! behind an `Arc`.

use crate::error::{ArchiveError, Result};
use std::collections::BTreeMap;
use tracing::warn;

const ROOT: usize = 0;

#[derive(Debug, Clone)]
enum Node {
    Directory(BTreeMap<String, usize>),
    Leaf,
}

/// Directory tree reconstructed from `/`-separated paths
#[derive(Debug, Clone)]
pub struct PathTrie {
    nodes: Vec<Node>,
}

/// Outcome of resolving a path against the trie
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookup {
    Directory(usize),
    Leaf,
    Missing,
}

impl PathTrie {
    /// Build a trie from data-file paths and directory-only paths
    ///
    /// Every file path creates its missing ancestors and a leaf for its last
    /// component. Every `extra_dirs` path creates directories only, so
    /// packages without data files still show up.
    pub fn build<F, D>(files: F, extra_dirs: D) -> Self
    where
        F: IntoIterator,
        F::Item: AsRef<str>,
        D: IntoIterator,
        D::Item: AsRef<str>,
    {
        let mut trie = Self {
            nodes: vec![Node::Directory(BTreeMap::new())],
        };

        for path in files {
            let path = path.as_ref();
            let parts = match components(path) {
                Some(parts) => parts,
                None => {
                    warn!(path, "skipping file path with parent components");
                    continue;
                }
            };
            match parts.split_last() {
                Some((last, parents)) => {
                    if let Some(dir) = trie.walk_create(parents, path) {
                        trie.insert_leaf(dir, last, path);
                    }
                }
                None => warn!(path, "skipping empty file path"),
            }
        }

        for path in extra_dirs {
            let path = path.as_ref();
            match components(path) {
                Some(parts) => {
                    trie.walk_create(&parts, path);
                }
                None => warn!(path, "skipping unusable directory path"),
            }
        }

        trie
    }

    /// Number of nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when nothing but the root exists
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// True iff every component of `path` resolves (to a file or a directory)
    pub fn exists(&self, path: &str) -> bool {
        self.lookup(path) != Lookup::Missing
    }

    /// True iff `path` resolves to a directory. The empty path is the root.
    pub fn is_directory(&self, path: &str) -> bool {
        matches!(self.lookup(path), Lookup::Directory(_))
    }

    /// Immediate child names of the directory at `path`, sorted
    pub fn list(&self, path: &str) -> Result<Vec<String>> {
        match self.lookup(path) {
            Lookup::Directory(index) => match &self.nodes[index] {
                Node::Directory(children) => Ok(children.keys().cloned().collect()),
                Node::Leaf => Err(ArchiveError::NotADirectory(path.to_string())),
            },
            Lookup::Leaf => Err(ArchiveError::NotADirectory(path.to_string())),
            Lookup::Missing => Err(ArchiveError::NotFound(path.to_string())),
        }
    }

    fn lookup(&self, path: &str) -> Lookup {
        let parts = match components(path) {
            Some(parts) => parts,
            None => return Lookup::Missing,
        };

        let mut current = ROOT;
        for part in parts {
            let children = match &self.nodes[current] {
                Node::Directory(children) => children,
                // Descending below a file
                Node::Leaf => return Lookup::Missing,
            };
            match children.get(part) {
                Some(&child) => current = child,
                None => return Lookup::Missing,
            }
        }

        match self.nodes[current] {
            Node::Directory(_) => Lookup::Directory(current),
            Node::Leaf => Lookup::Leaf,
        }
    }

    /// Walk `parts` from the root, creating directories as needed.
    /// Returns the final directory, or `None` if a file blocks the way.
    fn walk_create(&mut self, parts: &[&str], path: &str) -> Option<usize> {
        let mut current = ROOT;
        for part in parts {
            let next = self.nodes.len();
            let children = match &mut self.nodes[current] {
                Node::Directory(children) => children,
                Node::Leaf => {
                    warn!(path, component = *part, "file and directory share a path");
                    return None;
                }
            };
            current = *children.entry(part.to_string()).or_insert(next);
            if current == next {
                self.nodes.push(Node::Directory(BTreeMap::new()));
            }
        }
        Some(current)
    }

    fn insert_leaf(&mut self, dir: usize, name: &str, path: &str) {
        let next = self.nodes.len();
        let existing = match &mut self.nodes[dir] {
            Node::Directory(children) => match children.get(name) {
                Some(&child) => Some(child),
                None => {
                    children.insert(name.to_string(), next);
                    None
                }
            },
            Node::Leaf => return,
        };

        match existing {
            // A directory is never replaced by a file
            Some(child) => {
                if matches!(self.nodes[child], Node::Directory(_)) {
                    warn!(path, "file and directory share a path");
                }
            }
            None => self.nodes.push(Node::Leaf),
        }
    }
}

/// Split a path into components. Empty and `.` components are dropped and
/// both separators are accepted. A `..` component makes the path
/// unresolvable: the trie knows nothing above its root.
fn components(path: &str) -> Option<Vec<&str>> {
    let mut parts = Vec::new();
    for part in path.split(['/', '\\']) {
        match part {
            "" | "." => {}
            ".." => return None,
            _ => parts.push(part),
        }
    }
    Some(parts)
}
