//! Property tests for the path trie

use carchive_rs::{ArchiveError, PathTrie};
use proptest::prelude::*;

/// `dir/dir/file.txt` style paths; directories never end in `.txt`, so
/// no generated path is both a file and a directory
fn file_path() -> impl Strategy<Value = String> {
    (prop::collection::vec("[a-d]{1,3}", 0..4), "[a-e]{1,4}").prop_map(|(dirs, file)| {
        let mut parts = dirs;
        parts.push(format!("{}.txt", file));
        parts.join("/")
    })
}

fn ancestors(path: &str) -> Vec<String> {
    let parts: Vec<&str> = path.split('/').collect();
    (0..parts.len()).map(|i| parts[..i].join("/")).collect()
}

proptest! {
    #[test]
    fn files_exist_and_ancestors_are_directories(files in prop::collection::vec(file_path(), 0..40)) {
        let trie = PathTrie::build(&files, Vec::<String>::new());

        for file in &files {
            prop_assert!(trie.exists(file));
            prop_assert!(!trie.is_directory(file));
            let is_not_dir = matches!(trie.list(file), Err(ArchiveError::NotADirectory(_)));
            prop_assert!(is_not_dir);

            for ancestor in ancestors(file) {
                prop_assert!(trie.is_directory(&ancestor), "{} of {}", ancestor, file);
            }
        }
    }

    #[test]
    fn listed_children_resolve(files in prop::collection::vec(file_path(), 1..40)) {
        let trie = PathTrie::build(&files, Vec::<String>::new());

        let mut pending = vec![String::new()];
        let mut leaves = 0usize;
        while let Some(dir) = pending.pop() {
            let children = trie.list(&dir).unwrap();
            let mut sorted = children.clone();
            sorted.sort();
            sorted.dedup();
            prop_assert_eq!(&sorted, &children);

            for child in children {
                let path = if dir.is_empty() { child } else { format!("{}/{}", dir, child) };
                prop_assert!(trie.exists(&path));
                if trie.is_directory(&path) {
                    pending.push(path);
                } else {
                    leaves += 1;
                }
            }
        }

        // Every distinct input is reached exactly once by the walk
        let mut distinct = files.clone();
        distinct.sort();
        distinct.dedup();
        prop_assert_eq!(leaves, distinct.len());
    }

    #[test]
    fn unknown_paths_are_missing(files in prop::collection::vec(file_path(), 0..20), probe in "[x-z]{1,3}(/[a-d]{1,2}){0,2}") {
        // Probes start with letters no generated component uses
        let trie = PathTrie::build(&files, Vec::<String>::new());

        prop_assert!(!trie.exists(&probe));
        prop_assert!(!trie.is_directory(&probe));
        let is_not_found = matches!(trie.list(&probe), Err(ArchiveError::NotFound(_)));
        prop_assert!(is_not_found);
    }
}

/// Any path over the generated alphabet, including `.`, `..` and empty parts
fn probe_path() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            Just(String::new()),
            Just(".".to_string()),
            Just("..".to_string()),
            "[a-d]{1,3}",
            "[a-e]{1,4}\\.txt",
        ],
        0..5,
    )
    .prop_map(|parts| parts.join("/"))
}

proptest! {
    #[test]
    fn directories_exist_and_are_not_files(
        files in prop::collection::vec(file_path(), 0..30),
        dirs in prop::collection::vec("[a-d]{1,3}(/[a-d]{1,3}){0,2}", 0..5),
        probes in prop::collection::vec(probe_path(), 1..20),
    ) {
        let trie = PathTrie::build(&files, &dirs);

        for probe in &probes {
            let first = (trie.exists(probe), trie.is_directory(probe), trie.list(probe).ok());
            if first.1 {
                prop_assert!(first.0, "{} is a directory but does not exist", probe);
            }
            let not_a_dir = matches!(trie.list(probe), Err(ArchiveError::NotADirectory(_)));
            prop_assert!(!(first.1 && not_a_dir), "{} is both", probe);

            // Queries on the immutable trie are repeatable
            let again = (trie.exists(probe), trie.is_directory(probe), trie.list(probe).ok());
            prop_assert_eq!(first, again);
        }
    }
}
