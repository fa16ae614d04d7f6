use crate::error::{ArchiveError, Result};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// Current format version
pub const FORMAT_VERSION_MAJOR: u16 = 1;
pub const FORMAT_VERSION_MINOR: u16 = 0;

/// Size of the fixed part of a TOC record (everything but the name)
pub const TOC_ENTRY_FIXED_SIZE: usize = 36;

/// Maximum entry name length in bytes (UTF-8)
pub const MAX_NAME_LENGTH: usize = 4096;

/// Compression methods supported per entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum CompressionMethod {
    None = 0,
    Zstd = 1,
    Lz4 = 2,
}

impl CompressionMethod {
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Zstd),
            2 => Ok(Self::Lz4),
            _ => Err(ArchiveError::corrupt(format!(
                "invalid compression method {}",
                value
            ))),
        }
    }

    /// The TOC `compression_flag`
    pub fn is_compressed(self) -> bool {
        self != Self::None
    }
}

impl Default for CompressionMethod {
    fn default() -> Self {
        Self::Zstd
    }
}

/// Kind of a packed item. Persisted as a single ASCII byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeCode {
    /// Shared library or extension module
    Binary,
    /// Reference to an entry living in another archive
    Dependency,
    /// Embedded module archive
    Pyz,
    /// Zip file extracted to the application directory at startup
    Zipfile,
    /// Compiled package (`__init__`), named with dots
    Package,
    /// Compiled module, named with dots
    Module,
    /// Entry-point script source
    Source,
    /// Data file
    Data,
    /// Runtime option, no payload
    Option,
    /// Splash screen resources
    Splash,
}

impl TypeCode {
    pub fn to_u8(self) -> u8 {
        match self {
            TypeCode::Binary => b'b',
            TypeCode::Dependency => b'd',
            TypeCode::Pyz => b'z',
            TypeCode::Zipfile => b'Z',
            TypeCode::Package => b'M',
            TypeCode::Module => b'm',
            TypeCode::Source => b's',
            TypeCode::Data => b'x',
            TypeCode::Option => b'o',
            TypeCode::Splash => b'l',
        }
    }

    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            b'b' => Ok(TypeCode::Binary),
            b'd' => Ok(TypeCode::Dependency),
            b'z' => Ok(TypeCode::Pyz),
            b'Z' => Ok(TypeCode::Zipfile),
            b'M' => Ok(TypeCode::Package),
            b'm' => Ok(TypeCode::Module),
            b's' => Ok(TypeCode::Source),
            b'x' => Ok(TypeCode::Data),
            b'o' => Ok(TypeCode::Option),
            b'l' => Ok(TypeCode::Splash),
            _ => Err(ArchiveError::corrupt(format!(
                "invalid type code 0x{:02x}",
                value
            ))),
        }
    }

    /// Entries whose name is a `/`-separated file path rather than a dotted
    /// module name or an option string.
    pub fn is_path_like(self) -> bool {
        matches!(
            self,
            TypeCode::Binary
                | TypeCode::Dependency
                | TypeCode::Zipfile
                | TypeCode::Data
                | TypeCode::Splash
        )
    }
}

/// Normalize an entry name to forward slashes (cross-platform compatibility)
pub fn normalize_name(name: &str) -> String {
    name.replace('\\', "/")
}

/// One TOC record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    pub name: String,
    pub offset: u64,
    pub compressed_length: u64,
    pub uncompressed_length: u64,
    pub crc32: u32,
    pub compression: CompressionMethod,
    pub type_code: TypeCode,
}

impl TocEntry {
    /// Size of this record when serialized
    pub fn record_size(&self) -> usize {
        TOC_ENTRY_FIXED_SIZE + self.name.len()
    }

    /// Write entry to the TOC
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<usize> {
        let name_bytes = self.name.as_bytes();
        if name_bytes.is_empty() || name_bytes.len() > MAX_NAME_LENGTH {
            return Err(ArchiveError::InvalidName(format!(
                "name length {} outside 1..={}",
                name_bytes.len(),
                MAX_NAME_LENGTH
            )));
        }

        let record_size = self.record_size();
        writer.write_all(&(record_size as u32).to_be_bytes())?;
        writer.write_all(&self.offset.to_be_bytes())?;
        writer.write_all(&self.compressed_length.to_be_bytes())?;
        writer.write_all(&self.uncompressed_length.to_be_bytes())?;
        writer.write_all(&self.crc32.to_be_bytes())?;
        writer.write_all(&[self.compression as u8, self.type_code.to_u8()])?;
        writer.write_all(&(name_bytes.len() as u16).to_be_bytes())?;
        writer.write_all(name_bytes)?;

        Ok(record_size)
    }

    /// Read entry from the TOC. Short input is reported as corruption.
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let record_size = read_u32(&mut reader)? as usize;
        let offset = read_u64(&mut reader)?;
        let compressed_length = read_u64(&mut reader)?;
        let uncompressed_length = read_u64(&mut reader)?;
        let crc32 = read_u32(&mut reader)?;

        let mut codes = [0u8; 2];
        read_exact(&mut reader, &mut codes)?;
        let compression = CompressionMethod::from_u8(codes[0])?;
        let type_code = TypeCode::from_u8(codes[1])?;

        let name_len = read_u16(&mut reader)? as usize;
        if name_len == 0 || name_len > MAX_NAME_LENGTH {
            return Err(ArchiveError::corrupt(format!(
                "TOC name length {} outside 1..={}",
                name_len, MAX_NAME_LENGTH
            )));
        }
        if record_size != TOC_ENTRY_FIXED_SIZE + name_len {
            return Err(ArchiveError::corrupt(format!(
                "TOC record length {} does not match name length {}",
                record_size, name_len
            )));
        }

        let mut name_buf = vec![0u8; name_len];
        read_exact(&mut reader, &mut name_buf)?;
        let name = String::from_utf8(name_buf)
            .map_err(|e| ArchiveError::corrupt(format!("invalid UTF-8 in entry name: {}", e)))?;

        Ok(Self {
            name,
            offset,
            compressed_length,
            uncompressed_length,
            crc32,
            compression,
            type_code,
        })
    }
}

// Helper functions for reading primitive types
fn read_exact<R: Read>(mut reader: R, buf: &mut [u8]) -> Result<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            ArchiveError::corrupt("truncated TOC record")
        } else {
            ArchiveError::Io(e)
        }
    })
}

fn read_u16<R: Read>(mut reader: R) -> Result<u16> {
    let mut buf = [0u8; 2];
    read_exact(&mut reader, &mut buf)?;
    Ok(u16::from_be_bytes(buf))
}

fn read_u32<R: Read>(mut reader: R) -> Result<u32> {
    let mut buf = [0u8; 4];
    read_exact(&mut reader, &mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

fn read_u64<R: Read>(mut reader: R) -> Result<u64> {
    let mut buf = [0u8; 8];
    read_exact(&mut reader, &mut buf)?;
    Ok(u64::from_be_bytes(buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entry() -> TocEntry {
        TocEntry {
            name: "pkg/sub/data/entry1.txt".to_string(),
            offset: 5 * 1024 * 1024 * 1024,
            compressed_length: 2000,
            uncompressed_length: 5000,
            crc32: 0xDEADBEEF,
            compression: CompressionMethod::Zstd,
            type_code: TypeCode::Data,
        }
    }

    #[test]
    fn test_compression_method_from_u8() {
        assert_eq!(CompressionMethod::from_u8(0).unwrap(), CompressionMethod::None);
        assert_eq!(CompressionMethod::from_u8(1).unwrap(), CompressionMethod::Zstd);
        assert_eq!(CompressionMethod::from_u8(2).unwrap(), CompressionMethod::Lz4);
        assert!(CompressionMethod::from_u8(99).is_err());
        assert!(!CompressionMethod::None.is_compressed());
        assert!(CompressionMethod::Lz4.is_compressed());
    }

    #[test]
    fn test_type_codes_are_stable() {
        let all = [
            TypeCode::Binary,
            TypeCode::Dependency,
            TypeCode::Pyz,
            TypeCode::Zipfile,
            TypeCode::Package,
            TypeCode::Module,
            TypeCode::Source,
            TypeCode::Data,
            TypeCode::Option,
            TypeCode::Splash,
        ];
        let bytes: Vec<u8> = all.iter().map(|t| t.to_u8()).collect();
        assert_eq!(bytes, b"bdzZMmsxol");
        for code in all {
            assert_eq!(TypeCode::from_u8(code.to_u8()).unwrap(), code);
        }
        assert!(matches!(
            TypeCode::from_u8(b'?'),
            Err(ArchiveError::CorruptArchive(_))
        ));
    }

    #[test]
    fn test_entry_layout_is_big_endian() {
        let entry = sample_entry();
        let mut buf = Vec::new();
        let written = entry.write_to(&mut buf).unwrap();

        assert_eq!(written, buf.len());
        assert_eq!(buf.len(), TOC_ENTRY_FIXED_SIZE + entry.name.len());
        assert_eq!(&buf[0..4], &(buf.len() as u32).to_be_bytes());
        // Offset above 4 GiB survives intact
        assert_eq!(&buf[4..12], &(5u64 << 30).to_be_bytes());
        assert_eq!(buf[32], CompressionMethod::Zstd as u8);
        assert_eq!(buf[33], b'x');
        assert_eq!(&buf[36..], entry.name.as_bytes());

        let parsed = TocEntry::read_from(&buf[..]).unwrap();
        assert_eq!(parsed, entry);
    }

    #[test]
    fn test_truncated_record_is_corrupt() {
        let mut buf = Vec::new();
        sample_entry().write_to(&mut buf).unwrap();
        buf.truncate(buf.len() - 3);

        let result = TocEntry::read_from(&buf[..]);
        assert!(matches!(result, Err(ArchiveError::CorruptArchive(_))));
    }

    #[test]
    fn test_record_length_mismatch_is_corrupt() {
        let mut buf = Vec::new();
        sample_entry().write_to(&mut buf).unwrap();
        buf[3] = buf[3].wrapping_add(1);

        let result = TocEntry::read_from(&buf[..]);
        assert!(matches!(result, Err(ArchiveError::CorruptArchive(_))));
    }

    #[test]
    fn test_empty_name_rejected_on_write() {
        let mut entry = sample_entry();
        entry.name.clear();
        assert!(matches!(
            entry.write_to(Vec::new()),
            Err(ArchiveError::InvalidName(_))
        ));
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("pkg\\data\\a.txt"), "pkg/data/a.txt");
        assert_eq!(normalize_name("pkg/data"), "pkg/data");
    }
}
