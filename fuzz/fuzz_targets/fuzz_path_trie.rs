#![no_main]

use carchive_rs::PathTrie;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let mut lines = text.lines();

    // First line is the probe, the rest are file paths
    let probe = lines.next().unwrap_or("");
    let files: Vec<&str> = lines.collect();
    let trie = PathTrie::build(&files, [probe]);

    for file in &files {
        let _ = trie.exists(file);
        let _ = trie.list(file);
    }
    let _ = trie.is_directory(probe);
    let _ = trie.list(probe);
});
