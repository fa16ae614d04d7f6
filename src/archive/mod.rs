mod compression;
mod format;
mod io;
mod reader;
mod trailer;
mod writer;

pub use compression::{compress_stream, decompress_stream, CopyStats, DEFAULT_ZSTD_LEVEL};
pub use format::{
    normalize_name, CompressionMethod, TocEntry, TypeCode, FORMAT_VERSION_MAJOR,
    FORMAT_VERSION_MINOR, MAX_NAME_LENGTH, TOC_ENTRY_FIXED_SIZE,
};
pub use io::CHUNK_SIZE;
pub use reader::ArchiveReader;
pub use trailer::{Trailer, RUNTIME_NAME_LENGTH, TRAILER_MAGIC, TRAILER_SIZE};
pub use writer::{write_archive, ArchiveSummary, ArchiveWriter, EntryData, EntrySource};
