//! carchive-rs: embedded application archives with a merged resource view
//!
//! This library provides:
//! - A container format that can be appended to a host executable, with a
//!   table of contents and a fixed trailer at the end of the file
//! - Streaming, per-entry compressed storage (Zstd/LZ4) with 64-bit offsets
//! - A path trie rebuilding the directory tree implied by entry names
//! - A resource provider merging embedded and on-disk resources of a package,
//!   restricted to that package's directory
//!
//! # Example
//!
//! ```no_run
//! use carchive_rs::{ArchiveReader, ArchiveWriter, CompressionMethod, TypeCode};
//!
//! // Create an archive
//! let mut writer = ArchiveWriter::create("app.pkg")?.with_runtime_name("libpython3.9.so.1.0")?;
//! writer.add_bytes("pkg/data/a.txt", b"Hello, World!", CompressionMethod::Zstd, TypeCode::Data)?;
//! writer.add_option("v")?;
//! writer.finalize()?;
//!
//! // Read from archive
//! let reader = ArchiveReader::open("app.pkg")?;
//! let (code, data) = reader.extract("pkg/data/a.txt")?;
//! assert_eq!(code, TypeCode::Data);
//! # Ok::<(), carchive_rs::error::ArchiveError>(())
//! ```

pub mod archive;
pub mod error;
pub mod manifest;
pub mod provider;
pub mod vfs;

pub use archive::{
    write_archive, ArchiveReader, ArchiveSummary, ArchiveWriter, CompressionMethod, EntryData,
    EntrySource, TocEntry, Trailer, TypeCode, FORMAT_VERSION_MAJOR, FORMAT_VERSION_MINOR,
    MAX_NAME_LENGTH, TRAILER_MAGIC, TRAILER_SIZE,
};
pub use error::{ArchiveError, Result};
pub use manifest::{BuildManifest, ManifestEntry};
pub use provider::{
    EmbeddedTree, Filesystem, ListingPolicy, ProviderConfig, ResourceProvider, ResourceSource,
};
pub use vfs::PathTrie;
