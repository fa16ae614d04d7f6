/// Example demonstrating declarative builds from a TOML manifest
///
/// Run with: cargo run --example manifest

use anyhow::Result;
use carchive_rs::{ArchiveReader, BuildManifest};
use std::fs;

const MANIFEST: &str = r#"
runtime_name = "libpython3.9.so.1.0"
compression_level = 9

[[entry]]
name = "pkg/data/a.txt"
source = "assets/a.txt"

[[entry]]
name = "pkg/data/logo.bin"
source = "assets/logo.bin"
compression = "none"

[[entry]]
name = "pyi_rth_pkgres"
source = "hooks/pyi_rth_pkgres.py"
type = "source"

[[entry]]
name = "v"
type = "option"
"#;

fn main() -> Result<()> {
    println!("=== carchive-rs Manifest Example ===\n");

    let dir = tempfile::tempdir()?;
    fs::create_dir_all(dir.path().join("assets"))?;
    fs::create_dir_all(dir.path().join("hooks"))?;
    fs::write(dir.path().join("assets/a.txt"), "resource text\n".repeat(200))?;
    fs::write(dir.path().join("assets/logo.bin"), [0x89u8, b'P', b'N', b'G'])?;
    fs::write(dir.path().join("hooks/pyi_rth_pkgres.py"), b"import pkg_resources\n")?;

    let manifest_path = dir.path().join("app.toml");
    fs::write(&manifest_path, MANIFEST)?;

    // Load (relative sources resolve against the manifest's directory)
    println!("1. Loading manifest...");
    let manifest = BuildManifest::from_file(&manifest_path)?;
    println!("   ✓ {} entries", manifest.entries.len());

    // Build
    println!("\n2. Building archive...");
    let output = dir.path().join("app.pkg");
    let summary = manifest.build(&output)?;
    println!(
        "   ✓ {} entries, {} data bytes, {} TOC bytes",
        summary.entry_count, summary.data_length, summary.toc_length
    );

    // Inspect
    println!("\n3. TOC listing:");
    let reader = ArchiveReader::open(&output)?;
    println!("{}", reader.toc_json()?);

    println!("\n✓ Example complete!");
    Ok(())
}
