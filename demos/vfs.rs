/// Example demonstrating the path trie and package-scoped resource queries
///
/// Run with: cargo run --example vfs
use anyhow::Result;
use carchive_rs::{
    ArchiveReader, ArchiveWriter, CompressionMethod, ProviderConfig, ResourceProvider, TypeCode,
};
use std::fs;

fn main() -> Result<()> {
    println!("=== carchive-rs VFS Example ===\n");

    // Application directory with one resource unpacked on disk
    let root = tempfile::tempdir()?;
    fs::create_dir_all(root.path().join("mypkg/data"))?;
    fs::write(root.path().join("mypkg/data/on_disk.txt"), b"unpacked")?;

    // Archive holding the package and two embedded resources
    println!("1. Creating archive...");
    let archive = root.path().join("app.pkg");
    let mut writer = ArchiveWriter::create(&archive)?;
    writer.add_bytes("mypkg", b"bytecode", CompressionMethod::Zstd, TypeCode::Package)?;
    writer.add_bytes("mypkg.plugins", b"bytecode", CompressionMethod::Zstd, TypeCode::Package)?;
    writer.add_bytes("mypkg/data/embedded.txt", b"packed", CompressionMethod::Lz4, TypeCode::Data)?;
    writer.add_bytes("mypkg/data/nested/deep.txt", b"deeper", CompressionMethod::Lz4, TypeCode::Data)?;
    writer.add_bytes("other/private.txt", b"not visible", CompressionMethod::None, TypeCode::Data)?;
    writer.finalize()?;
    println!("   ✓ Created: {}", archive.display());

    // Query through the provider
    println!("\n2. Querying mypkg resources...");
    let reader = ArchiveReader::open(&archive)?;
    let config = ProviderConfig::from_toml_str("listing = \"lenient\"")?;
    let provider = ResourceProvider::from_reader(&reader, root.path(), "mypkg", true, config);

    println!("   Scope: {}", provider.package_dir().display());
    for dir in [".", "data", "data/nested"] {
        let mut names = provider.list(dir)?;
        names.sort();
        println!("   list({:?}) = {:?}", dir, names);
    }

    for resource in ["data/embedded.txt", "data/on_disk.txt", "plugins", "../other/private.txt"] {
        println!(
            "   has({:?}) = {}, is_directory = {}",
            resource,
            provider.has(resource),
            provider.is_directory(resource)
        );
    }

    println!("\n✓ Example complete!");
    Ok(())
}
