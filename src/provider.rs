//! Resource queries for one module or package
//!
//! A frozen application may ship a package's resources embedded in the
//! archive, unpacked next to the executable, or split between the two.
//! [`ResourceProvider`] answers `has` / `is_directory` / `list` over the union
//! of both views, restricted to the package's own directory.
//!
//! # Example
//!
//! ```no_run
//! use carchive_rs::{ArchiveReader, ProviderConfig, ResourceProvider};
//!
//! let reader = ArchiveReader::open("dist/app.pkg")?;
//! let provider = ResourceProvider::from_reader(
//!     &reader,
//!     "dist",
//!     "pkg.sub",
//!     true,
//!     ProviderConfig::default(),
//! );
//!
//! assert!(provider.is_directory("data"));
//! for name in provider.list("data")? {
//!     println!("{}", name);
//! }
//! // Anything above the package directory is invisible
//! assert!(!provider.has(".."));
//! # Ok::<(), carchive_rs::ArchiveError>(())
//! ```

use crate::archive::{ArchiveReader, TocEntry, TypeCode};
use crate::error::{ArchiveError, Result};
use crate::vfs::PathTrie;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// What `list` does when a path is missing or is a file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingPolicy {
    /// Return an empty listing (zip-style providers)
    #[default]
    Lenient,
    /// Return `NotFound` / `NotADirectory` (filesystem-style providers)
    Strict,
}

/// Provider configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub listing: ListingPolicy,
}

impl ProviderConfig {
    /// Parse a configuration from TOML, e.g. `listing = "strict"`
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }
}

/// One view of the resources under an application root
pub trait ResourceSource {
    fn exists(&self, path: &Path) -> bool;
    fn is_directory(&self, path: &Path) -> bool;
    fn list(&self, path: &Path) -> Result<Vec<String>>;
}

/// Embedded resources: a path trie anchored at the application root
#[derive(Debug, Clone)]
pub struct EmbeddedTree {
    trie: Arc<PathTrie>,
    root: PathBuf,
}

impl EmbeddedTree {
    pub fn new(trie: Arc<PathTrie>, root: impl AsRef<Path>) -> Self {
        Self {
            trie,
            root: absolutize(root.as_ref()),
        }
    }

    /// Tree of every path-like entry and every package in the archive
    pub fn from_toc(toc: &[TocEntry], root: impl AsRef<Path>) -> Self {
        let files = toc
            .iter()
            .filter(|entry| entry.type_code.is_path_like())
            .map(|entry| entry.name.as_str());
        let dirs = toc
            .iter()
            .filter(|entry| entry.type_code == TypeCode::Package)
            .map(|entry| entry.name.replace('.', "/"));
        Self::new(Arc::new(PathTrie::build(files, dirs)), root)
    }

    pub fn trie(&self) -> &Arc<PathTrie> {
        &self.trie
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `path` relative to the root, as a `/`-separated trie path
    fn relative(&self, path: &Path) -> Option<String> {
        let rest = path.strip_prefix(&self.root).ok()?;
        let mut parts = Vec::new();
        for component in rest.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_str()?),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(parts.join("/"))
    }
}

impl ResourceSource for EmbeddedTree {
    fn exists(&self, path: &Path) -> bool {
        self.relative(path)
            .map_or(false, |relative| self.trie.exists(&relative))
    }

    fn is_directory(&self, path: &Path) -> bool {
        self.relative(path)
            .map_or(false, |relative| self.trie.is_directory(&relative))
    }

    fn list(&self, path: &Path) -> Result<Vec<String>> {
        let relative = self
            .relative(path)
            .ok_or_else(|| ArchiveError::NotFound(path.display().to_string()))?;
        self.trie.list(&relative)
    }
}

/// On-disk resources
#[derive(Debug, Clone, Copy, Default)]
pub struct Filesystem;

impl ResourceSource for Filesystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_directory(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn list(&self, path: &Path) -> Result<Vec<String>> {
        if !path.exists() {
            return Err(ArchiveError::NotFound(path.display().to_string()));
        }
        if !path.is_dir() {
            return Err(ArchiveError::NotADirectory(path.display().to_string()));
        }

        let mut names = Vec::new();
        for entry in std::fs::read_dir(path)? {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }
}

/// Merged embedded + on-disk resource view scoped to one package directory
#[derive(Debug, Clone)]
pub struct ResourceProvider {
    package: String,
    package_dir: PathBuf,
    embedded: EmbeddedTree,
    filesystem: Filesystem,
    config: ProviderConfig,
}

impl ResourceProvider {
    /// Provider for `module_name` (dotted) whose files unpack under `root`
    ///
    /// The scope is the package's own directory, or the containing package's
    /// directory for a plain module. The embedded tree holds only the data
    /// files below that directory plus the sub-packages of that package.
    pub fn new(
        toc: &[TocEntry],
        root: impl AsRef<Path>,
        module_name: &str,
        is_package: bool,
        config: ProviderConfig,
    ) -> Self {
        let package = package_name(module_name, is_package);
        let relative_dir = package.replace('.', "/");
        let file_prefix = format!("{}/", relative_dir);
        let package_prefix = format!("{}.", package);

        let files = toc
            .iter()
            .filter(|entry| entry.type_code.is_path_like())
            .filter(|entry| package.is_empty() || entry.name.starts_with(&file_prefix))
            .map(|entry| entry.name.as_str());
        let dirs = toc
            .iter()
            .filter(|entry| entry.type_code == TypeCode::Package)
            .filter(|entry| {
                package.is_empty()
                    || entry.name == package
                    || entry.name.starts_with(&package_prefix)
            })
            .map(|entry| entry.name.replace('.', "/"));

        let trie = Arc::new(PathTrie::build(files, dirs));
        let embedded = EmbeddedTree::new(trie, root);

        debug!(
            module = module_name,
            package = %package,
            nodes = embedded.trie().len(),
            "built embedded resource tree"
        );

        Self::with_tree(embedded, module_name, is_package, config)
    }

    /// Provider over the TOC of an open archive
    pub fn from_reader(
        reader: &ArchiveReader,
        root: impl AsRef<Path>,
        module_name: &str,
        is_package: bool,
        config: ProviderConfig,
    ) -> Self {
        Self::new(reader.entries(), root, module_name, is_package, config)
    }

    /// Provider reusing an existing (possibly shared) embedded tree
    pub fn with_tree(
        embedded: EmbeddedTree,
        module_name: &str,
        is_package: bool,
        config: ProviderConfig,
    ) -> Self {
        let package = package_name(module_name, is_package);
        let mut package_dir = embedded.root().to_path_buf();
        package_dir.extend(package.split('.').filter(|part| !part.is_empty()));

        Self {
            package,
            package_dir,
            embedded,
            filesystem: Filesystem,
            config,
        }
    }

    /// Dotted name of the package this provider is scoped to
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Absolute directory every query must stay within
    pub fn package_dir(&self) -> &Path {
        &self.package_dir
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn embedded(&self) -> &EmbeddedTree {
        &self.embedded
    }

    /// Does `resource` (relative to the package directory) exist in either view
    pub fn has(&self, resource: &str) -> bool {
        self.has_path(self.resolve(resource))
    }

    /// Is `resource` a directory in either view
    pub fn is_directory(&self, resource: &str) -> bool {
        self.is_directory_path(self.resolve(resource))
    }

    /// Contents of the `resource` directory from both views
    pub fn list(&self, resource: &str) -> Result<Vec<String>> {
        self.list_path(self.resolve(resource))
    }

    pub fn has_path(&self, path: impl AsRef<Path>) -> bool {
        match self.scoped(path.as_ref()) {
            Some(path) => self.embedded.exists(&path) || self.filesystem.exists(&path),
            None => false,
        }
    }

    pub fn is_directory_path(&self, path: impl AsRef<Path>) -> bool {
        match self.scoped(path.as_ref()) {
            Some(path) => {
                self.embedded.is_directory(&path) || self.filesystem.is_directory(&path)
            }
            None => false,
        }
    }

    /// Embedded names first, then on-disk names. Duplicates are kept.
    pub fn list_path(&self, path: impl AsRef<Path>) -> Result<Vec<String>> {
        let path = match self.scoped(path.as_ref()) {
            Some(path) => path,
            None => return Ok(Vec::new()),
        };

        let embedded = self.embedded.list(&path);
        let on_disk = if self.filesystem.is_directory(&path) {
            Some(self.filesystem.list(&path))
        } else {
            None
        };

        match self.config.listing {
            ListingPolicy::Lenient => {
                let mut names = embedded.unwrap_or_default();
                if let Some(Ok(disk_names)) = on_disk {
                    names.extend(disk_names);
                }
                Ok(names)
            }
            ListingPolicy::Strict => match (embedded, on_disk) {
                (_, Some(Err(err))) => Err(err),
                (Ok(mut names), Some(Ok(disk_names))) => {
                    names.extend(disk_names);
                    Ok(names)
                }
                (Ok(names), None) => Ok(names),
                (Err(_), Some(Ok(disk_names))) => Ok(disk_names),
                (Err(err), None) => {
                    if self.filesystem.exists(&path) {
                        Err(ArchiveError::NotADirectory(path.display().to_string()))
                    } else {
                        Err(err)
                    }
                }
            },
        }
    }

    /// `resource` joined onto the package directory
    fn resolve(&self, resource: &str) -> PathBuf {
        let mut path = self.package_dir.clone();
        path.extend(resource.split(['/', '\\']).filter(|part| !part.is_empty()));
        path
    }

    /// Normalized `path` if it is the package directory or below it
    fn scoped(&self, path: &Path) -> Option<PathBuf> {
        let path = absolutize(path);
        if path.starts_with(&self.package_dir) {
            Some(path)
        } else {
            debug!(
                path = %path.display(),
                scope = %self.package_dir.display(),
                "query outside package scope"
            );
            None
        }
    }
}

/// Package whose directory scopes a module: the module itself for packages,
/// the containing package otherwise.
fn package_name(module_name: &str, is_package: bool) -> String {
    if is_package {
        module_name.to_string()
    } else {
        match module_name.rsplit_once('.') {
            Some((parent, _)) => parent.to_string(),
            None => String::new(),
        }
    }
}

/// Absolute, lexically normalized form of `path` (no symlink resolution)
fn absolutize(path: &Path) -> PathBuf {
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };
    normalize_lexically(&path)
}

/// Fold `.` and `..` components without touching the filesystem
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `..` at the root stays at the root
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}
