use crate::archive::format::CompressionMethod;
use crate::archive::io::{CountingWriter, CHUNK_SIZE};
use crate::error::{ArchiveError, Result};
use std::io::{self, Read, Write};

/// Default Zstd level (balanced compression)
pub const DEFAULT_ZSTD_LEVEL: i32 = 6;

/// Byte counters produced while streaming one entry into the container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyStats {
    /// Bytes read from the source
    pub uncompressed: u64,
    /// Bytes written to the container
    pub written: u64,
    /// CRC32 of the source bytes
    pub crc32: u32,
}

/// Stream `src` into `dst`, compressing with `method`.
///
/// The source is consumed in `CHUNK_SIZE` pieces; memory use does not grow
/// with the entry size.
pub fn compress_stream<R: Read, W: Write>(
    method: CompressionMethod,
    level: i32,
    mut src: R,
    dst: W,
) -> Result<CopyStats> {
    let mut counter = CountingWriter::new(dst);
    let mut hasher = crc32fast::Hasher::new();

    let uncompressed = match method {
        CompressionMethod::None => copy_chunks(&mut src, &mut counter, &mut hasher)?,
        CompressionMethod::Zstd => {
            let mut encoder = zstd::stream::write::Encoder::new(&mut counter, level)
                .map_err(|e| ArchiveError::CompressionFailed(format!("Zstd init failed: {}", e)))?;
            let total = copy_chunks(&mut src, &mut encoder, &mut hasher)?;
            encoder.finish()?;
            total
        }
        CompressionMethod::Lz4 => {
            let mut encoder = lz4_flex::frame::FrameEncoder::new(&mut counter);
            let total = copy_chunks(&mut src, &mut encoder, &mut hasher)?;
            encoder
                .finish()
                .map_err(|e| ArchiveError::CompressionFailed(format!("LZ4 finish failed: {}", e)))?;
            total
        }
    };

    counter.flush()?;

    Ok(CopyStats {
        uncompressed,
        written: counter.count(),
        crc32: hasher.finalize(),
    })
}

/// Stream a stored payload from `src` into `dst`, inflating with `method`.
///
/// Returns the CRC32 of the produced bytes. A decoder failure, or output
/// that is shorter or longer than `expected_len`, is `CorruptArchive`;
/// failures writing to `dst` are reported as `Io`.
pub fn decompress_stream<R: Read, W: Write>(
    method: CompressionMethod,
    src: R,
    dst: W,
    expected_len: u64,
) -> Result<u32> {
    match method {
        CompressionMethod::None => inflate_into(method, src, dst, expected_len),
        CompressionMethod::Zstd => {
            let decoder = zstd::stream::read::Decoder::new(src)
                .map_err(|e| ArchiveError::corrupt(format!("Zstd init failed: {}", e)))?;
            inflate_into(method, decoder, dst, expected_len)
        }
        CompressionMethod::Lz4 => {
            inflate_into(method, lz4_flex::frame::FrameDecoder::new(src), dst, expected_len)
        }
    }
}

fn inflate_into<D: Read, W: Write>(
    method: CompressionMethod,
    decoder: D,
    mut dst: W,
    expected_len: u64,
) -> Result<u32> {
    // One byte past the expected length is enough to detect overlong output
    let mut decoder = decoder.take(expected_len.saturating_add(1));

    let mut hasher = crc32fast::Hasher::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut produced: u64 = 0;

    loop {
        let n = match decoder.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(ArchiveError::corrupt(format!(
                    "{:?} payload unreadable after {} bytes: {}",
                    method, produced, e
                )))
            }
        };
        produced += n as u64;
        if produced > expected_len {
            return Err(ArchiveError::corrupt(format!(
                "payload inflates past its recorded length {}",
                expected_len
            )));
        }
        hasher.update(&buf[..n]);
        dst.write_all(&buf[..n])?;
    }

    if produced != expected_len {
        return Err(ArchiveError::corrupt(format!(
            "payload length mismatch: expected {}, got {}",
            expected_len, produced
        )));
    }

    Ok(hasher.finalize())
}

/// Bounded-buffer copy loop with an exact byte counter
fn copy_chunks<R: Read, W: Write>(
    src: &mut R,
    dst: &mut W,
    hasher: &mut crc32fast::Hasher,
) -> Result<u64> {
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut total: u64 = 0;

    loop {
        let n = match src.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ArchiveError::Io(e)),
        };
        hasher.update(&buf[..n]);
        dst.write_all(&buf[..n])?;
        total += n as u64;
    }

    Ok(total)
}
