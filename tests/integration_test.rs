//! Integration tests for carchive-rs

use carchive_rs::{
    write_archive, ArchiveReader, ArchiveWriter, CompressionMethod, EntryData, EntrySource,
    TypeCode, TRAILER_MAGIC, TRAILER_SIZE,
};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::fs;
use tempfile::{tempdir, NamedTempFile};

#[test]
fn test_basic_archive_roundtrip() {
    let temp_file = NamedTempFile::new().unwrap();
    let archive_path = temp_file.path();

    // Create archive
    {
        let mut writer = ArchiveWriter::create(archive_path)
            .unwrap()
            .with_runtime_name("libpython3.9.so.1.0")
            .unwrap();
        writer
            .add_bytes("test.txt", b"Hello, World!", CompressionMethod::Zstd, TypeCode::Data)
            .unwrap();
        writer
            .add_bytes("data/nested.txt", b"Nested content", CompressionMethod::Lz4, TypeCode::Data)
            .unwrap();
        writer.finalize().unwrap();
    }

    // Read archive
    {
        let reader = ArchiveReader::open(archive_path).unwrap();

        assert_eq!(reader.entry_count(), 2);
        assert_eq!(reader.runtime_name(), "libpython3.9.so.1.0");
        assert!(reader.contains("test.txt"));
        assert!(reader.contains("data/nested.txt"));

        let (_, content1) = reader.extract("test.txt").unwrap();
        assert_eq!(content1, b"Hello, World!");

        let (_, content2) = reader.extract("data/nested.txt").unwrap();
        assert_eq!(content2, b"Nested content");
    }
}

#[test]
fn test_compression_methods() {
    let temp_file = NamedTempFile::new().unwrap();
    let archive_path = temp_file.path();

    let test_data = b"This is test data that should compress well. ".repeat(100);

    {
        let mut writer = ArchiveWriter::create(archive_path).unwrap();
        writer
            .add_bytes("stored.txt", &test_data, CompressionMethod::None, TypeCode::Data)
            .unwrap();
        writer
            .add_bytes("lz4.txt", &test_data, CompressionMethod::Lz4, TypeCode::Data)
            .unwrap();
        writer
            .add_bytes("zstd.txt", &test_data, CompressionMethod::Zstd, TypeCode::Data)
            .unwrap();
        writer.finalize().unwrap();
    }

    let reader = ArchiveReader::open(archive_path).unwrap();

    let stored = reader.entry("stored.txt").unwrap();
    assert_eq!(stored.compression, CompressionMethod::None);
    assert_eq!(stored.compressed_length, test_data.len() as u64);

    for name in ["lz4.txt", "zstd.txt"] {
        let entry = reader.entry(name).unwrap();
        assert!(entry.compression.is_compressed());
        assert!(entry.compressed_length < entry.uncompressed_length);
        assert_eq!(entry.uncompressed_length, test_data.len() as u64);
    }

    for name in ["stored.txt", "lz4.txt", "zstd.txt"] {
        assert_eq!(reader.extract(name).unwrap().1, test_data);
    }
}

#[test]
fn test_file_layout() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("layout.pkg");

    let mut writer = ArchiveWriter::create(&path).unwrap();
    writer
        .add_bytes("a.bin", &[1u8; 1000], CompressionMethod::None, TypeCode::Binary)
        .unwrap();
    writer
        .add_bytes("b.bin", &[2u8; 500], CompressionMethod::None, TypeCode::Binary)
        .unwrap();
    let summary = writer.finalize().unwrap();

    let bytes = fs::read(&path).unwrap();
    assert_eq!(bytes.len() as u64, summary.archive_length);
    assert_eq!(
        summary.archive_length,
        summary.data_length + summary.toc_length + TRAILER_SIZE as u64
    );
    assert_eq!(summary.data_length, 1500);

    // Payloads sit back to back at the start of the data region
    assert!(bytes[..1000].iter().all(|&b| b == 1));
    assert!(bytes[1000..1500].iter().all(|&b| b == 2));

    let trailer_start = bytes.len() - TRAILER_SIZE;
    assert_eq!(&bytes[trailer_start..trailer_start + 8], &TRAILER_MAGIC);

    let reader = ArchiveReader::open(&path).unwrap();
    assert_eq!(reader.entry("a.bin").unwrap().offset, 0);
    assert_eq!(reader.entry("b.bin").unwrap().offset, 1000);
    assert_eq!(reader.trailer().toc_offset, 1500);
}

#[test]
fn test_stub_prefix_is_skipped() {
    let dir = tempdir().unwrap();
    let stub_path = dir.path().join("bootloader");
    let stub: Vec<u8> = (0..12_345u32).map(|i| (i % 256) as u8).collect();
    fs::write(&stub_path, &stub).unwrap();

    let path = dir.path().join("app");
    let mut writer = ArchiveWriter::create_with_stub(&path, &stub_path).unwrap();
    writer
        .add_bytes("pkg/data/a.txt", b"after the stub", CompressionMethod::Zstd, TypeCode::Data)
        .unwrap();
    let summary = writer.finalize().unwrap();
    assert_eq!(summary.stub_length, stub.len() as u64);

    let bytes = fs::read(&path).unwrap();
    assert_eq!(&bytes[..stub.len()], &stub[..]);
    assert_eq!(bytes.len() as u64, summary.stub_length + summary.archive_length);

    let reader = ArchiveReader::open(&path).unwrap();
    assert_eq!(reader.data_start(), stub.len() as u64);
    assert_eq!(reader.extract("pkg/data/a.txt").unwrap().1, b"after the stub");
}

#[test]
fn test_random_order_extraction() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("random.pkg");
    let mut rng = rand::rngs::StdRng::seed_from_u64(7);

    let mut expected = Vec::new();
    let mut writer = ArchiveWriter::create(&path).unwrap();
    for i in 0..60 {
        let len = rng.gen_range(0..20_000);
        let data: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
        let method = match i % 3 {
            0 => CompressionMethod::None,
            1 => CompressionMethod::Zstd,
            _ => CompressionMethod::Lz4,
        };
        let name = format!("dir{}/file{}.bin", i % 5, i);
        writer.add_bytes(&name, &data, method, TypeCode::Data).unwrap();
        expected.push((name, data));
    }
    writer.finalize().unwrap();

    let reader = ArchiveReader::open(&path).unwrap();
    expected.shuffle(&mut rng);
    for (name, data) in &expected {
        let (_, extracted) = reader.extract(name).unwrap();
        assert_eq!(&extracted, data, "mismatch for {}", name);
    }

    println!("✓ Extracted {} entries in random order", expected.len());
}

#[test]
fn test_reopen_is_idempotent() {
    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path();

    let mut writer = ArchiveWriter::create(path).unwrap();
    for i in 0..10 {
        writer
            .add_bytes(&format!("file{}.txt", i), format!("data{}", i).as_bytes(), CompressionMethod::Zstd, TypeCode::Data)
            .unwrap();
    }
    writer.finalize().unwrap();

    let first = ArchiveReader::open(path).unwrap();
    let second = ArchiveReader::open(path).unwrap();

    assert_eq!(first.entries(), second.entries());
    assert_eq!(first.trailer(), second.trailer());
    assert_eq!(
        first.extract("file3.txt").unwrap(),
        second.extract("file3.txt").unwrap()
    );
}

#[test]
fn test_options_keep_toc_order() {
    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path();

    let mut writer = ArchiveWriter::create(path).unwrap();
    writer.add_option("v").unwrap();
    writer
        .add_bytes("pyimod01_archive", b"code", CompressionMethod::Zstd, TypeCode::Module)
        .unwrap();
    writer.add_option("W ignore").unwrap();
    writer.add_option("unbuffered").unwrap();
    writer.finalize().unwrap();

    let reader = ArchiveReader::open(path).unwrap();
    assert_eq!(reader.options(), vec!["v", "W ignore", "unbuffered"]);

    let (code, data) = reader.extract("W ignore").unwrap();
    assert_eq!(code, TypeCode::Option);
    assert!(data.is_empty());
}

#[test]
fn test_write_archive_from_sources() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("libz.so");
    fs::write(&source, b"\x7fELF shared object").unwrap();

    let path = dir.path().join("app.pkg");
    let summary = write_archive(
        &path,
        "libpython3.so",
        vec![
            EntrySource {
                name: "libz.so".to_string(),
                data: EntryData::Path(source.clone()),
                compression: CompressionMethod::Zstd,
                type_code: TypeCode::Binary,
            },
            EntrySource {
                name: "pkg/VERSION".to_string(),
                data: EntryData::Bytes(b"1.2.3".to_vec()),
                compression: CompressionMethod::None,
                type_code: TypeCode::Data,
            },
            EntrySource {
                name: "v".to_string(),
                data: EntryData::Empty,
                compression: CompressionMethod::None,
                type_code: TypeCode::Option,
            },
        ],
    )
    .unwrap();
    assert_eq!(summary.entry_count, 3);

    let reader = ArchiveReader::open(&path).unwrap();
    let names: Vec<&str> = reader.names().collect();
    assert_eq!(names, vec!["libz.so", "pkg/VERSION", "v"]);
    assert_eq!(reader.extract("libz.so").unwrap().1, fs::read(&source).unwrap());
}

#[test]
fn test_empty_archive() {
    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path();

    let summary = ArchiveWriter::create(path).unwrap().finalize().unwrap();
    assert_eq!(summary.entry_count, 0);
    assert_eq!(fs::metadata(path).unwrap().len(), TRAILER_SIZE as u64);

    let reader = ArchiveReader::open(path).unwrap();
    assert_eq!(reader.entry_count(), 0);
    assert!(reader.options().is_empty());
}

#[test]
fn test_zero_length_entries() {
    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path();

    let mut writer = ArchiveWriter::create(path).unwrap();
    for method in [CompressionMethod::None, CompressionMethod::Zstd, CompressionMethod::Lz4] {
        writer
            .add_bytes(&format!("empty-{:?}.txt", method), b"", method, TypeCode::Data)
            .unwrap();
    }
    writer
        .add_bytes("regular.txt", b"Hello, World!", CompressionMethod::Zstd, TypeCode::Data)
        .unwrap();
    writer.finalize().unwrap();

    let reader = ArchiveReader::open(path).unwrap();
    for entry in reader.entries() {
        let (_, data) = reader.extract(&entry.name).unwrap();
        assert_eq!(data.len() as u64, entry.uncompressed_length);
    }
    assert_eq!(reader.extract("regular.txt").unwrap().1, b"Hello, World!");
}

#[test]
fn test_extract_to_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.pkg");
    let payload = b"streamed to disk ".repeat(10_000);

    let mut writer = ArchiveWriter::create(&path).unwrap();
    writer
        .add_bytes("blob.bin", &payload, CompressionMethod::Zstd, TypeCode::Data)
        .unwrap();
    writer.finalize().unwrap();

    let reader = ArchiveReader::open(&path).unwrap();
    let out_path = dir.path().join("blob.out");
    let out = fs::File::create(&out_path).unwrap();
    let (code, written) = reader.extract_to("blob.bin", out).unwrap();

    assert_eq!(code, TypeCode::Data);
    assert_eq!(written, payload.len() as u64);
    assert_eq!(fs::read(&out_path).unwrap(), payload);
}
