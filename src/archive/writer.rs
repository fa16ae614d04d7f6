use crate::archive::compression::{compress_stream, DEFAULT_ZSTD_LEVEL};
use crate::archive::format::{
    normalize_name, CompressionMethod, TocEntry, TypeCode, MAX_NAME_LENGTH,
};
use crate::archive::trailer::{validate_runtime_name, Trailer};
use crate::error::{ArchiveError, Result};
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Payload of one entry handed to [`write_archive`]
#[derive(Debug, Clone)]
pub enum EntryData {
    /// Streamed from a file on disk
    Path(PathBuf),
    /// Already in memory
    Bytes(Vec<u8>),
    /// No payload (runtime options)
    Empty,
}

/// One `(logical_name, source, compression, type_code)` input tuple
#[derive(Debug, Clone)]
pub struct EntrySource {
    pub name: String,
    pub data: EntryData,
    pub compression: CompressionMethod,
    pub type_code: TypeCode,
}

/// Sizes of a finished container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub entry_count: u64,
    /// Bytes of the data region (sum of stored entry lengths)
    pub data_length: u64,
    pub toc_length: u64,
    /// Data region + TOC + trailer
    pub archive_length: u64,
    /// Bytes of host stub preceding the data region
    pub stub_length: u64,
}

/// Archive writer for creating containers
///
/// Everything is written into a temporary file next to the destination and
/// only moved into place by [`ArchiveWriter::finalize`]. A writer that is
/// dropped, or that fails while streaming an entry, never leaves a file a
/// reader would accept.
pub struct ArchiveWriter {
    writer: BufWriter<NamedTempFile>,
    destination: PathBuf,
    entries: Vec<TocEntry>,
    names: HashSet<String>,
    stub_length: u64,
    current_offset: u64,
    runtime_name: String,
    compression_level: i32,
    poisoned: bool,
}

impl ArchiveWriter {
    /// Start a new container at `path`
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let destination = path.as_ref().to_path_buf();
        let temp = NamedTempFile::new_in(parent_dir(&destination))?;

        Ok(Self {
            writer: BufWriter::new(temp),
            destination,
            entries: Vec::new(),
            names: HashSet::new(),
            stub_length: 0,
            current_offset: 0,
            runtime_name: String::new(),
            compression_level: DEFAULT_ZSTD_LEVEL,
            poisoned: false,
        })
    }

    /// Start a new container appended to a copy of the host executable `stub`
    pub fn create_with_stub<P: AsRef<Path>, S: AsRef<Path>>(path: P, stub: S) -> Result<Self> {
        let mut writer = Self::create(path)?;
        let mut stub_file = File::open(stub.as_ref())?;
        writer.stub_length = io::copy(&mut stub_file, &mut writer.writer)?;
        debug!(
            stub = %stub.as_ref().display(),
            bytes = writer.stub_length,
            "copied host stub"
        );
        Ok(writer)
    }

    /// Name of the runtime library recorded in the trailer
    ///
    /// Fails with `InvalidName` if the name would not survive the fixed
    /// trailer field: 64 bytes or more, or an interior NUL.
    pub fn with_runtime_name(mut self, name: &str) -> Result<Self> {
        validate_runtime_name(name)?;
        self.runtime_name = name.to_string();
        Ok(self)
    }

    /// Zstd level used for `CompressionMethod::Zstd` entries
    pub fn with_compression_level(mut self, level: i32) -> Self {
        self.compression_level = level;
        self
    }

    /// Stream a file from disk into the archive
    pub fn add_file<P: AsRef<Path>>(
        &mut self,
        name: &str,
        source: P,
        compression: CompressionMethod,
        type_code: TypeCode,
    ) -> Result<()> {
        let file = File::open(source.as_ref())?;
        self.add_reader(name, file, compression, type_code)
    }

    /// Add an in-memory payload
    pub fn add_bytes(
        &mut self,
        name: &str,
        data: &[u8],
        compression: CompressionMethod,
        type_code: TypeCode,
    ) -> Result<()> {
        self.add_reader(name, data, compression, type_code)
    }

    /// Add a runtime option entry (no payload)
    pub fn add_option(&mut self, option: &str) -> Result<()> {
        self.add_reader(option, io::empty(), CompressionMethod::None, TypeCode::Option)
    }

    /// Stream an arbitrary reader into the archive in bounded chunks
    pub fn add_reader<R: Read>(
        &mut self,
        name: &str,
        source: R,
        compression: CompressionMethod,
        type_code: TypeCode,
    ) -> Result<()> {
        if self.poisoned {
            return Err(poisoned_error());
        }

        let name = self.validate_name(name, type_code)?;

        let stats = match compress_stream(
            compression,
            self.compression_level,
            source,
            &mut self.writer,
        ) {
            Ok(stats) => stats,
            Err(err) => {
                // The temp file now holds a partial payload; refuse to finalize it
                self.poisoned = true;
                return Err(err);
            }
        };

        let entry = TocEntry {
            name,
            offset: self.current_offset,
            compressed_length: stats.written,
            uncompressed_length: stats.uncompressed,
            crc32: stats.crc32,
            compression,
            type_code,
        };

        debug!(
            name = %entry.name,
            offset = entry.offset,
            compressed = entry.compressed_length,
            uncompressed = entry.uncompressed_length,
            "added entry"
        );

        self.current_offset += stats.written;
        self.names.insert(entry.name.clone());
        self.entries.push(entry);

        Ok(())
    }

    /// Entries written so far, in TOC order
    pub fn entries(&self) -> &[TocEntry] {
        &self.entries
    }

    /// Write the TOC and trailer, then move the container into place
    pub fn finalize(mut self) -> Result<ArchiveSummary> {
        if self.poisoned {
            return Err(poisoned_error());
        }

        let toc_offset = self.current_offset;

        let mut toc = Vec::with_capacity(self.entries.iter().map(TocEntry::record_size).sum());
        for entry in &self.entries {
            entry.write_to(&mut toc)?;
        }
        self.writer.write_all(&toc)?;

        let trailer = Trailer::new(
            toc_offset,
            toc.len() as u64,
            self.entries.len() as u64,
            crc32fast::hash(&toc),
            &self.runtime_name,
        );
        trailer.write_to(&mut self.writer)?;

        let temp = self.writer.into_inner().map_err(|e| e.into_error())?;
        temp.as_file().sync_all()?;
        temp.persist(&self.destination)?;

        let summary = ArchiveSummary {
            entry_count: trailer.entry_count,
            data_length: toc_offset,
            toc_length: trailer.toc_length,
            archive_length: trailer.archive_length,
            stub_length: self.stub_length,
        };

        info!(
            path = %self.destination.display(),
            entries = summary.entry_count,
            bytes = summary.archive_length,
            "archive finalized"
        );

        Ok(summary)
    }

    /// Normalize and check an entry name before anything is written for it
    fn validate_name(&self, name: &str, type_code: TypeCode) -> Result<String> {
        let name = normalize_name(name);

        if name.is_empty() || name.len() > MAX_NAME_LENGTH {
            return Err(ArchiveError::InvalidName(format!(
                "name length {} outside 1..={}",
                name.len(),
                MAX_NAME_LENGTH
            )));
        }

        if type_code.is_path_like()
            && (name.starts_with('/') || name.split('/').any(|part| part == ".."))
        {
            return Err(ArchiveError::InvalidName(format!(
                "{} escapes the application directory",
                name
            )));
        }

        if self.names.contains(&name) {
            return Err(ArchiveError::DuplicateEntry(name));
        }

        Ok(name)
    }
}

/// Write a complete container from a sequence of entry sources
pub fn write_archive<P, I>(path: P, runtime_name: &str, entries: I) -> Result<ArchiveSummary>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = EntrySource>,
{
    let mut writer = ArchiveWriter::create(path)?.with_runtime_name(runtime_name)?;
    for entry in entries {
        match entry.data {
            EntryData::Path(source) => {
                writer.add_file(&entry.name, source, entry.compression, entry.type_code)?
            }
            EntryData::Bytes(data) => {
                writer.add_bytes(&entry.name, &data, entry.compression, entry.type_code)?
            }
            EntryData::Empty => {
                writer.add_reader(&entry.name, io::empty(), entry.compression, entry.type_code)?
            }
        }
    }
    writer.finalize()
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn poisoned_error() -> ArchiveError {
    ArchiveError::Io(io::Error::new(
        io::ErrorKind::Other,
        "an earlier entry failed to stream; the archive cannot be finalized",
    ))
}
