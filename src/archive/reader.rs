use crate::archive::compression::decompress_stream;
use crate::archive::format::{TocEntry, TypeCode};
use crate::archive::io::{read_exact_at, RangeReader, CHUNK_SIZE};
use crate::archive::trailer::{Trailer, TRAILER_SIZE};
use crate::error::{ArchiveError, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Archive reader with O(1) entry lookup
///
/// Only the TOC is held in memory. Every extraction issues its own
/// positioned reads, so one reader can be shared between threads.
#[derive(Debug)]
pub struct ArchiveReader {
    file: File,
    path: PathBuf,
    trailer: Trailer,
    data_start: u64,
    entries: Vec<TocEntry>,
    index: HashMap<String, usize>,
}

impl ArchiveReader {
    /// Open a container, reading its trailer and TOC
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let file_len = file.metadata()?.len();

        if file_len < TRAILER_SIZE as u64 {
            return Err(ArchiveError::corrupt(format!(
                "file is {} bytes, smaller than the {} byte trailer",
                file_len, TRAILER_SIZE
            )));
        }

        let mut raw = [0u8; TRAILER_SIZE];
        read_exact_at(&file, &mut raw, file_len - TRAILER_SIZE as u64)?;
        let trailer = Trailer::from_bytes(&raw)?;
        trailer.validate(file_len)?;
        let data_start = trailer.data_start(file_len);

        let entries = Self::read_toc(&file, &trailer, data_start)?;

        let mut index = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if index.insert(entry.name.clone(), i).is_some() {
                return Err(ArchiveError::corrupt(format!(
                    "duplicate TOC entry {}",
                    entry.name
                )));
            }
        }

        debug!(
            path = %path.display(),
            entries = entries.len(),
            data_start,
            "opened archive"
        );

        Ok(Self {
            file,
            path,
            trailer,
            data_start,
            entries,
            index,
        })
    }

    /// Read and validate every TOC record
    fn read_toc(file: &File, trailer: &Trailer, data_start: u64) -> Result<Vec<TocEntry>> {
        let toc_length = usize::try_from(trailer.toc_length)
            .map_err(|_| ArchiveError::corrupt("TOC does not fit in memory"))?;
        let mut toc = vec![0u8; toc_length];
        read_exact_at(file, &mut toc, data_start + trailer.toc_offset)?;

        let actual = crc32fast::hash(&toc);
        if actual != trailer.toc_crc32 {
            return Err(ArchiveError::corrupt(format!(
                "TOC CRC mismatch: expected {:08x}, got {:08x}",
                trailer.toc_crc32, actual
            )));
        }

        // Every record takes at least the fixed part, which bounds the allocation
        let max_entries = (toc_length / crate::archive::format::TOC_ENTRY_FIXED_SIZE) as u64;
        if trailer.entry_count > max_entries {
            return Err(ArchiveError::corrupt(format!(
                "{} entries cannot fit in a {} byte TOC",
                trailer.entry_count, toc_length
            )));
        }

        let mut cursor = &toc[..];
        let mut entries = Vec::with_capacity(trailer.entry_count as usize);
        for _ in 0..trailer.entry_count {
            let entry = TocEntry::read_from(&mut cursor)?;
            Self::validate_entry(&entry, trailer.toc_offset)?;
            entries.push(entry);
        }

        if !cursor.is_empty() {
            return Err(ArchiveError::corrupt(format!(
                "{} trailing bytes after the last TOC record",
                cursor.len()
            )));
        }

        Ok(entries)
    }

    fn validate_entry(entry: &TocEntry, data_length: u64) -> Result<()> {
        let end = entry
            .offset
            .checked_add(entry.compressed_length)
            .ok_or_else(|| ArchiveError::corrupt(format!("{}: offset overflows", entry.name)))?;
        if end > data_length {
            return Err(ArchiveError::corrupt(format!(
                "{}: payload [{}, {}) extends past the data region ({} bytes)",
                entry.name, entry.offset, end, data_length
            )));
        }
        if !entry.compression.is_compressed() && entry.compressed_length != entry.uncompressed_length
        {
            return Err(ArchiveError::corrupt(format!(
                "{}: stored entry with differing lengths {} and {}",
                entry.name, entry.compressed_length, entry.uncompressed_length
            )));
        }
        Ok(())
    }

    /// Path the archive was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Trailer information
    pub fn trailer(&self) -> &Trailer {
        &self.trailer
    }

    /// Absolute file offset where the data region begins (size of any host stub)
    pub fn data_start(&self) -> u64 {
        self.data_start
    }

    /// Runtime library name recorded at build time
    pub fn runtime_name(&self) -> &str {
        &self.trailer.runtime_name
    }

    /// Get number of entries in archive
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// All entries in TOC order
    pub fn entries(&self) -> &[TocEntry] {
        &self.entries
    }

    /// Entry names in TOC order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    /// Get entry information without reading data
    ///
    /// `name` must match the stored name exactly. Path-like names are
    /// stored with `/` separators.
    pub fn entry(&self, name: &str) -> Option<&TocEntry> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    /// Check if an entry exists in the archive
    pub fn contains(&self, name: &str) -> bool {
        self.entry(name).is_some()
    }

    /// Entries whose name starts with `prefix`
    pub fn list_prefix(&self, prefix: &str) -> Vec<&TocEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.name.starts_with(prefix))
            .collect()
    }

    /// Runtime options, in TOC order
    pub fn options(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|entry| entry.type_code == TypeCode::Option)
            .map(|entry| entry.name.as_str())
            .collect()
    }

    /// Extract an entry into memory
    pub fn extract(&self, name: &str) -> Result<(TypeCode, Vec<u8>)> {
        let entry = self
            .entry(name)
            .ok_or_else(|| ArchiveError::NotFound(name.to_string()))?;

        usize::try_from(entry.uncompressed_length).map_err(|_| {
            ArchiveError::Io(io::Error::new(
                io::ErrorKind::OutOfMemory,
                format!("{} is too large to extract into memory", entry.name),
            ))
        })?;

        // The recorded length is not trusted until the payload inflates to it.
        // The stored length is bounded by the file, so reserve at most that.
        let reserve = entry
            .uncompressed_length
            .min(entry.compressed_length.max(CHUNK_SIZE as u64));
        let mut data = Vec::with_capacity(reserve as usize);
        self.extract_entry(entry, &mut data)?;

        Ok((entry.type_code, data))
    }

    /// Stream an entry into `out` without buffering it whole
    ///
    /// Returns the entry's type code and the number of bytes written. On a
    /// `CorruptArchive` error `out` may already hold a prefix of the payload.
    pub fn extract_to<W: Write>(&self, name: &str, out: W) -> Result<(TypeCode, u64)> {
        let entry = self
            .entry(name)
            .ok_or_else(|| ArchiveError::NotFound(name.to_string()))?;
        self.extract_entry(entry, out)?;
        Ok((entry.type_code, entry.uncompressed_length))
    }

    fn extract_entry<W: Write>(&self, entry: &TocEntry, out: W) -> Result<()> {
        let source = RangeReader::new(
            &self.file,
            self.data_start + entry.offset,
            entry.compressed_length,
        );
        let crc = decompress_stream(entry.compression, source, out, entry.uncompressed_length)?;

        if crc != entry.crc32 {
            return Err(ArchiveError::corrupt(format!(
                "{}: CRC mismatch: expected {:08x}, got {:08x}",
                entry.name, entry.crc32, crc
            )));
        }
        Ok(())
    }

    /// TOC as pretty-printed JSON, one object per entry
    pub fn toc_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }
}
