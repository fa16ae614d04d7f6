use crate::archive::format::{FORMAT_VERSION_MAJOR, FORMAT_VERSION_MINOR};
use crate::error::{ArchiveError, Result};
use std::io::{Read, Write};

/// Trailer magic: "MEI" 0x0C 0x0B 0x0A 0x0B 0x0E
pub const TRAILER_MAGIC: [u8; 8] = [b'M', b'E', b'I', 0x0C, 0x0B, 0x0A, 0x0B, 0x0E];

/// Trailer size in bytes (fixed)
pub const TRAILER_SIZE: usize = 112;

/// Maximum length of the runtime library name stored in the trailer
pub const RUNTIME_NAME_LENGTH: usize = 64;

/// Check that `name` fits the trailer's NUL-terminated runtime name field
pub fn validate_runtime_name(name: &str) -> Result<()> {
    if name.len() >= RUNTIME_NAME_LENGTH {
        return Err(ArchiveError::InvalidName(format!(
            "runtime name is {} bytes (max {})",
            name.len(),
            RUNTIME_NAME_LENGTH - 1
        )));
    }
    if name.contains('\0') {
        return Err(ArchiveError::InvalidName(format!(
            "runtime name {:?} contains a NUL byte",
            name
        )));
    }
    Ok(())
}

/// Container trailer
///
/// Located at the very end of the file (last 112 bytes), so a reader can
/// find the TOC no matter how many bytes of host executable precede the
/// container.
///
/// Structure (112 bytes fixed, big-endian):
/// - Magic: 8 bytes
/// - Version Major: uint16
/// - Version Minor: uint16
/// - TOC CRC32: uint32
/// - Archive Length: uint64 (data region start through end of trailer)
/// - TOC Offset: uint64 (relative to data region start)
/// - TOC Length: uint64
/// - Entry Count: uint64
/// - Runtime Name: 64 bytes, NUL padded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trailer {
    pub version_major: u16,
    pub version_minor: u16,
    pub toc_crc32: u32,
    pub archive_length: u64,
    pub toc_offset: u64,
    pub toc_length: u64,
    pub entry_count: u64,
    pub runtime_name: String,
}

impl Trailer {
    /// Create a trailer for the current format version
    pub fn new(
        toc_offset: u64,
        toc_length: u64,
        entry_count: u64,
        toc_crc32: u32,
        runtime_name: &str,
    ) -> Self {
        Self {
            version_major: FORMAT_VERSION_MAJOR,
            version_minor: FORMAT_VERSION_MINOR,
            toc_crc32,
            archive_length: toc_offset + toc_length + TRAILER_SIZE as u64,
            toc_offset,
            toc_length,
            entry_count,
            runtime_name: runtime_name.to_string(),
        }
    }

    /// Write trailer to a writer
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<usize> {
        validate_runtime_name(&self.runtime_name)?;
        let name = self.runtime_name.as_bytes();

        writer.write_all(&TRAILER_MAGIC)?;
        writer.write_all(&self.version_major.to_be_bytes())?;
        writer.write_all(&self.version_minor.to_be_bytes())?;
        writer.write_all(&self.toc_crc32.to_be_bytes())?;
        writer.write_all(&self.archive_length.to_be_bytes())?;
        writer.write_all(&self.toc_offset.to_be_bytes())?;
        writer.write_all(&self.toc_length.to_be_bytes())?;
        writer.write_all(&self.entry_count.to_be_bytes())?;

        let mut name_buf = [0u8; RUNTIME_NAME_LENGTH];
        name_buf[..name.len()].copy_from_slice(name);
        writer.write_all(&name_buf)?;

        Ok(TRAILER_SIZE)
    }

    /// Parse a trailer from its raw bytes
    pub fn from_bytes(buf: &[u8; TRAILER_SIZE]) -> Result<Self> {
        if buf[..8] != TRAILER_MAGIC {
            return Err(ArchiveError::corrupt("trailer magic not found"));
        }

        let mut reader = &buf[8..];
        let version_major = read_u16(&mut reader)?;
        let version_minor = read_u16(&mut reader)?;
        let toc_crc32 = read_u32(&mut reader)?;
        let archive_length = read_u64(&mut reader)?;
        let toc_offset = read_u64(&mut reader)?;
        let toc_length = read_u64(&mut reader)?;
        let entry_count = read_u64(&mut reader)?;

        let name_end = reader
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| ArchiveError::corrupt("runtime name is not NUL terminated"))?;
        let runtime_name = std::str::from_utf8(&reader[..name_end])
            .map_err(|e| ArchiveError::corrupt(format!("invalid UTF-8 in runtime name: {}", e)))?
            .to_string();

        Ok(Self {
            version_major,
            version_minor,
            toc_crc32,
            archive_length,
            toc_offset,
            toc_length,
            entry_count,
            runtime_name,
        })
    }

    /// Check that the trailer is self-consistent and fits in a file of `file_len` bytes
    pub fn validate(&self, file_len: u64) -> Result<()> {
        if self.version_major != FORMAT_VERSION_MAJOR {
            return Err(ArchiveError::UnsupportedVersion {
                major: self.version_major,
                minor: self.version_minor,
            });
        }

        if self.archive_length < TRAILER_SIZE as u64 || self.archive_length > file_len {
            return Err(ArchiveError::corrupt(format!(
                "archive length {} outside file of {} bytes",
                self.archive_length, file_len
            )));
        }

        let toc_end = self
            .toc_offset
            .checked_add(self.toc_length)
            .and_then(|end| end.checked_add(TRAILER_SIZE as u64))
            .ok_or_else(|| ArchiveError::corrupt("TOC offset overflows"))?;
        if toc_end != self.archive_length {
            return Err(ArchiveError::corrupt(format!(
                "TOC [{}, +{}) does not end at the trailer",
                self.toc_offset, self.toc_length
            )));
        }

        Ok(())
    }

    /// Absolute file offset of the data region
    pub fn data_start(&self, file_len: u64) -> u64 {
        file_len - self.archive_length
    }
}

// Helper functions for reading primitive types
fn read_u16<R: Read>(mut reader: R) -> Result<u16> {
    let mut buf = [0u8; 2];
    reader.read_exact(&mut buf)?;
    Ok(u16::from_be_bytes(buf))
}

fn read_u32<R: Read>(mut reader: R) -> Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

fn read_u64<R: Read>(mut reader: R) -> Result<u64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_be_bytes(buf))
}
