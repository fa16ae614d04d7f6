/// Basic example demonstrating archive creation and reading
///
/// Run with: cargo run --example basic
use anyhow::{Context, Result};
use carchive_rs::{ArchiveReader, ArchiveWriter, CompressionMethod, TypeCode};
use std::fs;
use std::path::Path;

fn main() -> Result<()> {
    println!("=== carchive-rs Basic Example ===\n");

    let dir = tempfile::tempdir()?;
    let stub = dir.path().join("bootloader");
    fs::write(&stub, b"#!/bin/sh\necho 'pretend I am a bootloader'\nexit 0\n")?;
    let app = dir.path().join("app");

    // Create an archive appended to the stub
    println!("1. Creating archive...");
    create_archive(&app, &stub)?;

    // Read from the archive
    println!("\n2. Reading from archive...");
    read_archive(&app)?;

    println!("\n✓ Example complete!");
    Ok(())
}

fn create_archive(app: &Path, stub: &Path) -> Result<()> {
    let mut writer = ArchiveWriter::create_with_stub(app, stub)?
        .with_runtime_name("libpython3.9.so.1.0")?;

    writer.add_bytes(
        "pyiboot01_bootstrap",
        b"print('bootstrapping')",
        CompressionMethod::Zstd,
        TypeCode::Source,
    )?;
    writer.add_bytes(
        "pkg/data/readme.txt",
        b"This is a readme file for the basic example.",
        CompressionMethod::None,
        TypeCode::Data,
    )?;
    writer.add_bytes(
        "pkg/data/config.json",
        br#"{"name": "example", "version": "1.0"}"#,
        CompressionMethod::Lz4,
        TypeCode::Data,
    )?;
    writer.add_option("W ignore")?;

    let summary = writer.finalize()?;
    println!(
        "   ✓ {} entries, {} byte stub + {} byte archive",
        summary.entry_count, summary.stub_length, summary.archive_length
    );

    Ok(())
}

fn read_archive(app: &Path) -> Result<()> {
    let reader = ArchiveReader::open(app)?;

    println!("   Runtime: {}", reader.runtime_name());
    println!("   Data region starts at byte {}", reader.data_start());
    println!("   Entries ({}):", reader.entry_count());
    for entry in reader.entries() {
        println!(
            "     - {:<24} {:?} {:?} {} -> {} bytes",
            entry.name,
            entry.type_code,
            entry.compression,
            entry.uncompressed_length,
            entry.compressed_length
        );
    }

    let (_, readme) = reader.extract("pkg/data/readme.txt")?;
    println!("\n   readme.txt: {}", String::from_utf8_lossy(&readme));

    let (_, config) = reader
        .extract("pkg/data/config.json")
        .context("config.json should be packed")?;
    let config: serde_json::Value = serde_json::from_slice(&config)?;
    println!("   config.json name: {}", config["name"]);

    println!("   Options: {:?}", reader.options());

    Ok(())
}
