//! Low-level I/O helpers shared by the writer and the reader.
//!
//! Reads go through positioned `read_at` calls so that any number of
//! extractions can run against one open handle without a shared cursor.

use std::fs::File;
use std::io::{self, Read, Write};

/// Chunk size for every streaming copy (64KB)
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Fill `buf` from `file` starting at absolute `offset`.
#[cfg(unix)]
pub fn read_exact_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.read_exact_at(buf, offset)
}

/// Fill `buf` from `file` starting at absolute `offset`.
#[cfg(windows)]
pub fn read_exact_at(file: &File, mut buf: &mut [u8], mut offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;
    while !buf.is_empty() {
        match file.seek_read(buf, offset) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "failed to fill whole buffer",
                ))
            }
            Ok(n) => {
                buf = &mut buf[n..];
                offset += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// `Read` over a fixed byte range of a file, backed by positioned reads.
pub struct RangeReader<'a> {
    file: &'a File,
    position: u64,
    remaining: u64,
}

impl<'a> RangeReader<'a> {
    pub fn new(file: &'a File, start: u64, length: u64) -> Self {
        Self {
            file,
            position: start,
            remaining: length,
        }
    }
}

impl Read for RangeReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let want = (buf.len() as u64).min(self.remaining) as usize;
        read_exact_at(self.file, &mut buf[..want], self.position)?;
        self.position += want as u64;
        self.remaining -= want as u64;
        Ok(want)
    }
}

/// Writer adapter that counts bytes passed through to the inner writer
pub struct CountingWriter<W> {
    inner: W,
    count: u64,
}

impl<W: Write> CountingWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, count: 0 }
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
