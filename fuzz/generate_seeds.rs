//! Generate seed corpus for fuzzing

use carchive_rs::{ArchiveWriter, CompressionMethod, TypeCode};
use std::fs;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let corpus_dir = "fuzz/corpus/fuzz_archive_parse";
    fs::create_dir_all(corpus_dir)?;

    println!("Generating seed corpus...");

    // Seed 1: Empty archive (trailer only)
    {
        let path = format!("{}/seed_empty.pkg", corpus_dir);
        ArchiveWriter::create(&path)?.finalize()?;
        println!("✓ Generated: {}", path);
    }

    // Seed 2: One entry per compression method
    {
        let path = format!("{}/seed_methods.pkg", corpus_dir);
        let mut writer = ArchiveWriter::create(&path)?.with_runtime_name("libpython3.9.so.1.0")?;
        let data = b"This is test data for compression. ".repeat(100);
        writer.add_bytes("stored.txt", &data, CompressionMethod::None, TypeCode::Data)?;
        writer.add_bytes("zstd.txt", &data, CompressionMethod::Zstd, TypeCode::Data)?;
        writer.add_bytes("lz4.txt", &data, CompressionMethod::Lz4, TypeCode::Data)?;
        writer.finalize()?;
        println!("✓ Generated: {}", path);
    }

    // Seed 3: Packages, data and options
    {
        let path = format!("{}/seed_frozen_app.pkg", corpus_dir);
        let mut writer = ArchiveWriter::create(&path)?;
        writer.add_bytes("pkg", b"bytecode", CompressionMethod::Zstd, TypeCode::Package)?;
        writer.add_bytes("pkg/data/a.txt", b"a", CompressionMethod::None, TypeCode::Data)?;
        writer.add_bytes("lib/libz.so", b"\x7fELF", CompressionMethod::Lz4, TypeCode::Binary)?;
        writer.add_option("v")?;
        writer.finalize()?;
        println!("✓ Generated: {}", path);
    }

    println!("\nGenerated 3 seed files in {}", corpus_dir);
    Ok(())
}
