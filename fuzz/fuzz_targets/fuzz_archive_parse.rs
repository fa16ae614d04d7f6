#![no_main]

use carchive_rs::ArchiveReader;
use libfuzzer_sys::fuzz_target;
use std::io::Write;
use tempfile::NamedTempFile;

fuzz_target!(|data: &[u8]| {
    // Anything shorter than the trailer is rejected before parsing
    if data.len() < carchive_rs::TRAILER_SIZE {
        return;
    }

    let mut temp_file = match NamedTempFile::new() {
        Ok(f) => f,
        Err(_) => return,
    };

    if temp_file.write_all(data).is_err() {
        return;
    }

    if temp_file.flush().is_err() {
        return;
    }

    // Opening reads the trailer and the whole TOC - should never panic
    let reader = match ArchiveReader::open(temp_file.path()) {
        Ok(r) => r,
        Err(_) => return, // Expected for invalid data
    };

    // Recorded lengths are untrusted: neither path may panic or reserve them up front
    let names: Vec<String> = reader.names().map(str::to_string).collect();
    for name in &names {
        let _ = reader.extract_to(name, std::io::sink());
        let _ = reader.extract(name);
    }

    let _ = reader.options();
    let _ = reader.toc_json();
    let _ = reader.contains("");
    let _ = reader.contains("../../../etc/passwd");
});
