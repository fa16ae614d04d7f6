//! Build manifests
//!
//! A build manifest is a TOML document listing everything that goes into a
//! container, so that builds can be described declaratively and reproduced.
//!
//! ```toml
//! runtime_name = "libpython3.9.so.1.0"
//! compression_level = 6
//! stub = "bootloader/run"
//!
//! [[entry]]
//! name = "pkg/data/a.txt"
//! source = "src/pkg/data/a.txt"
//! compression = "lz4"
//! type = "data"
//!
//! [[entry]]
//! name = "W ignore"
//! type = "option"
//! ```
//!
//! Relative `source` and `stub` paths are resolved against the directory the
//! manifest was loaded from. `compression` defaults to `zstd` and `type` to
//! `data`. Option entries carry no source.
//!
//! # Usage
//!
//! ```no_run
//! use carchive_rs::manifest::BuildManifest;
//! # use carchive_rs::error::Result;
//!
//! # fn main() -> Result<()> {
//! let manifest = BuildManifest::from_file("build/app.toml")?;
//! let summary = manifest.build("dist/app.pkg")?;
//! println!("{} entries, {} bytes", summary.entry_count, summary.archive_length);
//! # Ok(())
//! # }
//! ```

use crate::archive::{
    ArchiveSummary, ArchiveWriter, CompressionMethod, TypeCode, DEFAULT_ZSTD_LEVEL,
    RUNTIME_NAME_LENGTH,
};
use crate::error::{ArchiveError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::info;

/// Declarative description of one container build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildManifest {
    /// Runtime library name recorded in the trailer
    #[serde(default)]
    pub runtime_name: String,

    /// Zstd level for zstd entries
    #[serde(default = "default_compression_level")]
    pub compression_level: i32,

    /// Host executable the container is appended to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stub: Option<PathBuf>,

    #[serde(default, rename = "entry")]
    pub entries: Vec<ManifestEntry>,

    /// Directory relative paths are resolved against
    #[serde(skip)]
    base_dir: PathBuf,
}

/// One `[[entry]]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Logical name inside the container
    pub name: String,

    /// File the payload is streamed from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,

    #[serde(default)]
    pub compression: CompressionMethod,

    #[serde(default = "default_type_code", rename = "type")]
    pub type_code: TypeCode,
}

fn default_compression_level() -> i32 {
    DEFAULT_ZSTD_LEVEL
}

fn default_type_code() -> TypeCode {
    TypeCode::Data
}

impl ManifestEntry {
    /// Data entry with default compression
    pub fn data(name: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source: Some(source.into()),
            compression: CompressionMethod::default(),
            type_code: TypeCode::Data,
        }
    }

    /// Runtime option entry
    pub fn option(option: impl Into<String>) -> Self {
        Self {
            name: option.into(),
            source: None,
            compression: CompressionMethod::None,
            type_code: TypeCode::Option,
        }
    }
}

impl BuildManifest {
    /// Empty manifest whose relative paths resolve against `base_dir`
    pub fn new(runtime_name: impl Into<String>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            runtime_name: runtime_name.into(),
            compression_level: DEFAULT_ZSTD_LEVEL,
            stub: None,
            entries: Vec::new(),
            base_dir: base_dir.into(),
        }
    }

    /// Parse a manifest; relative paths resolve against the current directory
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let manifest: Self = toml::from_str(source)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Load a manifest; relative paths resolve against its directory
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let mut manifest = Self::from_toml_str(&text)?;
        if let Some(parent) = path.parent() {
            manifest.base_dir = parent.to_path_buf();
        }
        Ok(manifest)
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Serialize back to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| ArchiveError::Toml(e.to_string()))
    }

    /// Check the manifest without touching any source file
    pub fn validate(&self) -> Result<()> {
        if self.runtime_name.len() >= RUNTIME_NAME_LENGTH {
            return Err(ArchiveError::InvalidManifest(format!(
                "runtime_name must be shorter than {} bytes",
                RUNTIME_NAME_LENGTH
            )));
        }
        if self.runtime_name.contains('\0') {
            return Err(ArchiveError::InvalidManifest(
                "runtime_name contains a NUL byte".to_string(),
            ));
        }

        if !zstd::compression_level_range().contains(&self.compression_level) {
            return Err(ArchiveError::InvalidManifest(format!(
                "compression_level {} is outside the zstd range",
                self.compression_level
            )));
        }

        let mut seen = HashSet::new();
        for entry in &self.entries {
            if entry.name.is_empty() {
                return Err(ArchiveError::InvalidManifest(
                    "entry with an empty name".to_string(),
                ));
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(ArchiveError::InvalidManifest(format!(
                    "entry {} is listed twice",
                    entry.name
                )));
            }
            match (&entry.source, entry.type_code) {
                (Some(_), TypeCode::Option) => {
                    return Err(ArchiveError::InvalidManifest(format!(
                        "option {} cannot have a source",
                        entry.name
                    )))
                }
                (None, TypeCode::Option) | (Some(_), _) => {}
                (None, _) => return Err(missing_source(&entry.name)),
            }
        }

        Ok(())
    }

    /// Write the described container to `output`
    pub fn build<P: AsRef<Path>>(&self, output: P) -> Result<ArchiveSummary> {
        self.validate()?;

        let writer = match &self.stub {
            Some(stub) => ArchiveWriter::create_with_stub(output.as_ref(), self.resolve(stub))?,
            None => ArchiveWriter::create(output.as_ref())?,
        };
        let mut writer = writer
            .with_runtime_name(&self.runtime_name)?
            .with_compression_level(self.compression_level);

        for entry in &self.entries {
            match (&entry.source, entry.type_code) {
                (None, TypeCode::Option) => writer.add_option(&entry.name)?,
                (Some(source), type_code) => writer.add_file(
                    &entry.name,
                    self.resolve(source),
                    entry.compression,
                    type_code,
                )?,
                (None, _) => return Err(missing_source(&entry.name)),
            }
        }

        let summary = writer.finalize()?;
        info!(
            output = %output.as_ref().display(),
            entries = summary.entry_count,
            "built archive from manifest"
        );
        Ok(summary)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

fn missing_source(name: &str) -> ArchiveError {
    ArchiveError::InvalidManifest(format!("entry {} has no source", name))
}
