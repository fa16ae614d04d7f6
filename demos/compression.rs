/// Example demonstrating different compression methods
///
/// Run with: cargo run --example compression

use anyhow::Result;
use carchive_rs::{ArchiveReader, ArchiveWriter, CompressionMethod, TypeCode};
use std::fs;
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    println!("=== carchive-rs Compression Example ===\n");

    // Create sample data of different sizes
    let small_data = b"Small file content".to_vec();
    let medium_text = "Lorem ipsum ".repeat(500).into_bytes(); // ~6KB
    let large_data = vec![0u8; 100_000]; // 100KB
    let samples = [
        ("small.txt", &small_data),
        ("medium.txt", &medium_text),
        ("large.bin", &large_data),
    ];

    let dir = tempfile::tempdir()?;

    println!("1. Creating archives with different compression methods...\n");
    let mut archives = Vec::new();
    for method in [CompressionMethod::None, CompressionMethod::Lz4, CompressionMethod::Zstd] {
        archives.push((method, create_archive(dir.path(), method, &samples)?));
    }

    // Compare results
    println!("\n2. Comparing compression results:");
    compare_archives(&archives)?;

    println!("\n✓ Example complete!");
    Ok(())
}

fn create_archive(
    dir: &Path,
    method: CompressionMethod,
    samples: &[(&str, &Vec<u8>)],
) -> Result<PathBuf> {
    let path = dir.join(format!("example_{:?}.pkg", method).to_lowercase());
    let mut writer = ArchiveWriter::create(&path)?;

    for (name, data) in samples {
        writer.add_bytes(name, data, method, TypeCode::Data)?;
    }

    writer.finalize()?;
    println!("   ✓ Created: {} ({:?})", path.display(), method);

    Ok(path)
}

fn compare_archives(archives: &[(CompressionMethod, PathBuf)]) -> Result<()> {
    let baseline = fs::metadata(&archives[0].1)?.len();

    println!("\n   Archive sizes:");
    for (method, path) in archives {
        let size = fs::metadata(path)?.len();
        println!(
            "     {:<5} {:>8} bytes ({:.1}% of uncompressed)",
            format!("{:?}:", method),
            size,
            (size as f64 / baseline as f64) * 100.0
        );
    }

    // Verify we can read from compressed archives
    println!("\n   Verifying decompression:");
    let mut restored = Vec::new();
    for (method, path) in archives {
        let reader = ArchiveReader::open(path)?;
        let (_, data) = reader.extract("medium.txt")?;
        println!("     ✓ {:?} decompressed: {} bytes", method, data.len());
        restored.push(data);
    }

    if restored.windows(2).all(|pair| pair[0] == pair[1]) {
        println!("     ✓ Decompressed data matches across methods");
    }

    Ok(())
}
